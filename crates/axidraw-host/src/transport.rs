//! Byte- and line-oriented serial transport.
//!
//! [`SerialTransport`] talks to a real EBB-class controller over
//! `serialport`, configured raw/8-N-1 with all blocking done via an
//! explicit deadline rather than a VMIN/VTIME kernel timeout, matching the
//! single-threaded cooperative scheduling model the device session expects.
//! [`DryRunTransport`] implements the same trait in-process, for tests and
//! the CLI's `--dry-run` mode.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::time::{Duration, Instant};

use crate::errors::DriverError;

pub trait Transport {
    fn write_bytes(&mut self, bytes: &[u8], deadline_ms: u64) -> Result<usize, DriverError>;
    fn read_bytes(&mut self, buf: &mut [u8], deadline_ms: u64) -> Result<usize, DriverError>;
    fn flush_input(&mut self) -> Result<(), DriverError>;

    fn write_line(&mut self, line: &str, deadline_ms: u64) -> Result<(), DriverError> {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\r');
        self.write_bytes(&bytes, deadline_ms)?;
        Ok(())
    }

    fn read_line(&mut self, max_len: usize, deadline_ms: u64) -> Result<String, DriverError> {
        let deadline = Instant::now() + Duration::from_millis(deadline_ms);
        let mut out = Vec::with_capacity(32);
        let mut byte = [0u8; 1];
        loop {
            if out.len() >= max_len {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let n = self.read_bytes(&mut byte, remaining.as_millis() as u64)?;
            if n == 0 {
                break;
            }
            match byte[0] {
                b'\r' | b'\n' => {
                    if !out.is_empty() {
                        break;
                    }
                    continue;
                }
                b => out.push(b),
            }
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn probe_handshake(&mut self, deadline_ms: u64) -> Result<String, DriverError> {
        self.flush_input()?;
        self.write_line("V", deadline_ms)?;
        let line = self.read_line(128, deadline_ms)?;
        if line.is_empty() {
            return Err(DriverError::Handshake);
        }
        Ok(line)
    }
}

/// Forwards to the boxed transport, preserving any overridden default
/// methods (e.g. [`DryRunTransport::read_line`]) via dynamic dispatch.
impl Transport for Box<dyn Transport> {
    fn write_bytes(&mut self, bytes: &[u8], deadline_ms: u64) -> Result<usize, DriverError> {
        (**self).write_bytes(bytes, deadline_ms)
    }

    fn read_bytes(&mut self, buf: &mut [u8], deadline_ms: u64) -> Result<usize, DriverError> {
        (**self).read_bytes(buf, deadline_ms)
    }

    fn flush_input(&mut self) -> Result<(), DriverError> {
        (**self).flush_input()
    }

    fn write_line(&mut self, line: &str, deadline_ms: u64) -> Result<(), DriverError> {
        (**self).write_line(line, deadline_ms)
    }

    fn read_line(&mut self, max_len: usize, deadline_ms: u64) -> Result<String, DriverError> {
        (**self).read_line(max_len, deadline_ms)
    }

    fn probe_handshake(&mut self, deadline_ms: u64) -> Result<String, DriverError> {
        (**self).probe_handshake(deadline_ms)
    }
}

pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    pub fn open(path: &str, baud: u32, default_timeout_ms: u64) -> Result<Self, DriverError> {
        let port = serialport::new(path, baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(default_timeout_ms))
            .open()
            .map_err(|e| DriverError::SerialOpen(e.to_string()))?;
        Ok(Self { port })
    }

    /// Scans available serial devices for a name matching a known vendor
    /// pattern (EBB-class controllers enumerate as a USB CDC-ACM device).
    pub fn guess_device_port() -> Option<String> {
        serialport::available_ports()
            .ok()?
            .into_iter()
            .find(|p| {
                matches!(
                    &p.port_type,
                    serialport::SerialPortType::UsbPort(info)
                        if info.product.as_deref().unwrap_or("").to_ascii_lowercase().contains("ebb")
                )
            })
            .map(|p| p.port_name)
    }
}

impl Transport for SerialTransport {
    fn write_bytes(&mut self, bytes: &[u8], deadline_ms: u64) -> Result<usize, DriverError> {
        self.port.set_timeout(Duration::from_millis(deadline_ms)).ok();
        match self.port.write(bytes) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn read_bytes(&mut self, buf: &mut [u8], deadline_ms: u64) -> Result<usize, DriverError> {
        self.port.set_timeout(Duration::from_millis(deadline_ms.max(1))).ok();
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn flush_input(&mut self) -> Result<(), DriverError> {
        self.port.clear(serialport::ClearBuffer::Input).map_err(|e| DriverError::SerialOpen(e.to_string()))
    }
}

/// A scripted, in-process transport for tests and `--dry-run`. Every
/// written line is recorded; replies are served from a queue, defaulting to
/// a plain `OK` once the queue is drained.
#[derive(Debug, Default)]
pub struct DryRunTransport {
    pub written: Vec<String>,
    scripted_replies: VecDeque<String>,
}

impl DryRunTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(replies: impl IntoIterator<Item = String>) -> Self {
        Self { written: Vec::new(), scripted_replies: replies.into_iter().collect() }
    }

    pub fn push_reply(&mut self, reply: impl Into<String>) {
        self.scripted_replies.push_back(reply.into());
    }
}

impl Transport for DryRunTransport {
    fn write_bytes(&mut self, bytes: &[u8], _deadline_ms: u64) -> Result<usize, DriverError> {
        let line = String::from_utf8_lossy(bytes).trim_end_matches('\r').to_string();
        self.written.push(line);
        Ok(bytes.len())
    }

    fn read_bytes(&mut self, buf: &mut [u8], _deadline_ms: u64) -> Result<usize, DriverError> {
        let Some(reply) = self.scripted_replies.pop_front() else { return Ok(0) };
        let mut bytes = reply.into_bytes();
        bytes.push(b'\r');
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        Ok(n)
    }

    fn flush_input(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    fn read_line(&mut self, _max_len: usize, _deadline_ms: u64) -> Result<String, DriverError> {
        Ok(self.scripted_replies.pop_front().unwrap_or_else(|| "OK".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_records_written_lines() {
        let mut t = DryRunTransport::new();
        t.write_line("V", 10).unwrap();
        assert_eq!(t.written, vec!["V".to_string()]);
    }

    #[test]
    fn dry_run_serves_scripted_replies_then_ok() {
        let mut t = DryRunTransport::with_script(["EBBv13".to_string()]);
        assert_eq!(t.read_line(64, 10).unwrap(), "EBBv13");
        assert_eq!(t.read_line(64, 10).unwrap(), "OK");
    }
}
