//! Typed commands for the EBB-class controller's ASCII dialect, and parsing
//! of the reply shapes the driver needs.

use crate::Error;

/// A command destined for the controller. `encode` produces the bare ASCII
/// line (no trailing CR — the transport appends that).
#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    /// `V` — version query.
    Version,
    /// `SP,<up>[,<delay>]` — pen up (true) or down (false).
    SetPen { up: bool, delay_ms: Option<u32> },
    /// `SM,<dur_ms>,<steps_a>,<steps_b>` — simple timed move.
    SimpleMove { dur_ms: u32, steps_a: i32, steps_b: i32 },
    /// `XM,<dur_ms>,<steps_a>,<steps_b>` — mixed-axis (CoreXY-native) move.
    MixedMove { dur_ms: u32, steps_a: i32, steps_b: i32 },
    /// `LM,<rate1>,<steps1>,<accel1>,<rate2>,<steps2>,<accel2>,<clear>` —
    /// low-level step-limited move.
    LowLevelMove {
        rate1: u32,
        steps1: i32,
        accel1: i32,
        rate2: u32,
        steps2: i32,
        accel2: i32,
        clear: u8,
    },
    /// `LT,<intervals>,<rate1>,<accel1>,<rate2>,<accel2>,<clear>` —
    /// low-level time-limited move.
    LowLevelTimedMove {
        intervals: u32,
        rate1: u32,
        accel1: i32,
        rate2: u32,
        accel2: i32,
        clear: u8,
    },
    /// `HM,<step_rate>[,<pos1>,<pos2>]` — home/absolute move.
    Home { step_rate: u32, pos1: Option<i32>, pos2: Option<i32> },
    /// `QM` — motion status query.
    QueryMotion,
    /// `ES` — emergency stop.
    EmergencyStop,
    /// `EM,<mode1>,<mode2>` — enable motors with a microstep mode.
    EnableMotors { mode1: u8, mode2: u8 },
    /// `CS` — clear step counters.
    ClearStepCounters,
    /// `SC,<param>,<value>` — configure.
    Configure { param: u8, value: i32 },
    /// `SR,<timeout_ms>,<state>` — servo power timeout.
    ServoTimeout { timeout_ms: u32, state: u8 },
}

impl Command {
    /// Encodes this command into its ASCII wire form, without a trailing CR.
    pub fn encode(&self) -> String {
        match self {
            Command::Version => "V".to_string(),
            Command::SetPen { up, delay_ms } => match delay_ms {
                Some(d) => format!("SP,{},{}", *up as u8, d),
                None => format!("SP,{}", *up as u8),
            },
            Command::SimpleMove { dur_ms, steps_a, steps_b } => {
                format!("SM,{dur_ms},{steps_a},{steps_b}")
            }
            Command::MixedMove { dur_ms, steps_a, steps_b } => {
                format!("XM,{dur_ms},{steps_a},{steps_b}")
            }
            Command::LowLevelMove { rate1, steps1, accel1, rate2, steps2, accel2, clear } => {
                format!("LM,{rate1},{steps1},{accel1},{rate2},{steps2},{accel2},{clear}")
            }
            Command::LowLevelTimedMove { intervals, rate1, accel1, rate2, accel2, clear } => {
                format!("LT,{intervals},{rate1},{accel1},{rate2},{accel2},{clear}")
            }
            Command::Home { step_rate, pos1, pos2 } => match (pos1, pos2) {
                (Some(p1), Some(p2)) => format!("HM,{step_rate},{p1},{p2}"),
                _ => format!("HM,{step_rate}"),
            },
            Command::QueryMotion => "QM".to_string(),
            Command::EmergencyStop => "ES".to_string(),
            Command::EnableMotors { mode1, mode2 } => format!("EM,{mode1},{mode2}"),
            Command::ClearStepCounters => "CS".to_string(),
            Command::Configure { param, value } => format!("SC,{param},{value}"),
            Command::ServoTimeout { timeout_ms, state } => format!("SR,{timeout_ms},{state}"),
        }
    }
}

/// Parsed reply to `QM`: controller and per-motor activity plus the
/// controller's own FIFO depth estimate.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct MotionStatus {
    pub command_active: bool,
    pub motor1_active: bool,
    pub motor2_active: bool,
    pub fifo_pending: u32,
}

fn is_error_line(line: &str) -> bool {
    line.starts_with('!') || line.eq_ignore_ascii_case("NAK")
}

/// Parses the reply to a `V` command into the controller's version string.
pub fn parse_version(line: &str) -> Result<String, Error> {
    if is_error_line(line) {
        return Err(Error::ControllerError(line.to_string()));
    }
    if line.is_empty() {
        return Err(Error::MalformedReply("empty version reply".to_string()));
    }
    Ok(line.to_string())
}

/// Parses the reply to `QM`, expected as `QM,<cmd>,<m1>,<m2>,<fifo>`.
pub fn parse_motion_status(line: &str) -> Result<MotionStatus, Error> {
    if is_error_line(line) {
        return Err(Error::ControllerError(line.to_string()));
    }
    let mut fields = line.split(',');
    let tag = fields.next().ok_or_else(|| Error::MalformedReply(line.to_string()))?;
    if tag != "QM" {
        return Err(Error::MalformedReply(line.to_string()));
    }
    let mut next_u32 = || -> Result<u32, Error> {
        fields
            .next()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .ok_or_else(|| Error::MalformedReply(line.to_string()))
    };
    let command_active = next_u32()? != 0;
    let motor1_active = next_u32()? != 0;
    let motor2_active = next_u32()? != 0;
    let fifo_pending = next_u32()?;
    Ok(MotionStatus { command_active, motor1_active, motor2_active, fifo_pending })
}

/// Accepts a plain `OK` acknowledgment, rejecting anything else including
/// the controller's own error tokens.
pub fn expect_ack(line: &str) -> Result<(), Error> {
    if is_error_line(line) {
        return Err(Error::ControllerError(line.to_string()));
    }
    if line.trim().eq_ignore_ascii_case("OK") {
        Ok(())
    } else {
        Err(Error::MalformedReply(line.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_pen_commands() {
        assert_eq!(Command::SetPen { up: true, delay_ms: None }.encode(), "SP,1");
        assert_eq!(Command::SetPen { up: false, delay_ms: Some(200) }.encode(), "SP,0,200");
    }

    #[test]
    fn encodes_low_level_move() {
        let cmd = Command::LowLevelMove {
            rate1: 1000,
            steps1: 800,
            accel1: 5,
            rate2: 0,
            steps2: 0,
            accel2: 0,
            clear: 0,
        };
        assert_eq!(cmd.encode(), "LM,1000,800,5,0,0,0,0");
    }

    #[test]
    fn parses_motion_status() {
        let status = parse_motion_status("QM,1,1,0,3").unwrap();
        assert_eq!(
            status,
            MotionStatus { command_active: true, motor1_active: true, motor2_active: false, fifo_pending: 3 }
        );
    }

    #[test]
    fn rejects_controller_error_tokens() {
        assert!(matches!(parse_motion_status("!0 Err"), Err(Error::ControllerError(_))));
        assert!(matches!(expect_ack("!0 Err: bad parameter"), Err(Error::ControllerError(_))));
    }

    #[test]
    fn accepts_plain_ack() {
        assert!(expect_ack("OK").is_ok());
        assert!(expect_ack("garbage").is_err());
    }
}
