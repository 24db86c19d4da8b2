//! Device session: serial handshake, exclusivity, rate limiting, FIFO
//! accounting, and the pen/move/home/status operations.

use std::thread::sleep;
use std::time::{Duration, Instant};

use ebb_proto::commands::{expect_ack, parse_motion_status, Command, MotionStatus};
use tracing::{debug, info, warn};

use crate::errors::DriverError;
use crate::lock::LockHandle;
use crate::settings::Settings;
use crate::transport::Transport;

const FIFO_POLL_INTERVAL_MS: u64 = 5;
const IDLE_POLL_INTERVAL_MS: u64 = 20;
const COMMAND_DEADLINE_MS: u64 = 2000;

/// EBB servo-pulse range (SC,4 / SC,5 ticks) a 0..100 pen-position percent
/// is interpolated across.
const PEN_POS_TICKS_MIN: f64 = 6000.0;
const PEN_POS_TICKS_MAX: f64 = 24000.0;

/// EBB servo-rate range (SC,11 / SC,12 ticks-per-interval) a 0..100
/// pen-speed percent is interpolated across.
const PEN_RATE_MIN: f64 = 1.0;
const PEN_RATE_MAX: f64 = 1200.0;

fn percent_to_ticks(pct: u8) -> i32 {
    let pct = (pct as f64).min(100.0);
    (PEN_POS_TICKS_MIN + (PEN_POS_TICKS_MAX - PEN_POS_TICKS_MIN) * pct / 100.0).round() as i32
}

fn percent_to_rate(pct: u8) -> i32 {
    let pct = (pct as f64).min(100.0);
    (PEN_RATE_MIN + (PEN_RATE_MAX - PEN_RATE_MIN) * pct / 100.0).round() as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unconfigured,
    Configured,
    Connected,
}

pub struct Session<T: Transport> {
    state: State,
    settings: Settings,
    transport: Option<T>,
    lock: Option<LockHandle>,
    last_cmd_at: Option<Instant>,
    pending_commands: u32,
    session_timeout_ms: u64,
    /// Set by `emergency_stop()`, cleared by `resume()`. While set, every
    /// operation requiring `Connected` is rejected with `EmergencyStopped`.
    stopped: bool,
}

impl<T: Transport> Session<T> {
    pub fn new() -> Self {
        Self {
            state: State::Unconfigured,
            settings: Settings::default(),
            transport: None,
            lock: None,
            last_cmd_at: None,
            pending_commands: 0,
            session_timeout_ms: 5000,
            stopped: false,
        }
    }

    pub fn configure(&mut self, settings: Settings) {
        self.settings = settings;
        self.state = State::Configured;
    }

    /// Acquires the exclusivity lock, opens the transport, performs the `V`
    /// handshake, and best-effort syncs pen/servo settings onto the
    /// controller.
    pub fn connect(&mut self, transport: T) -> Result<(), DriverError> {
        if self.state == State::Unconfigured {
            return Err(DriverError::InvalidInput("connect() called before configure()".into()));
        }
        let lock = LockHandle::acquire()?;
        let mut transport = transport;
        let version = transport.probe_handshake(COMMAND_DEADLINE_MS)?;
        info!(version = %version, "controller handshake succeeded");

        self.lock = Some(lock);
        self.transport = Some(transport);
        self.state = State::Connected;
        self.pending_commands = 0;
        self.last_cmd_at = None;
        self.stopped = false;

        self.sync_settings();
        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.transport = None;
        self.lock = None;
        self.state = State::Configured;
        self.stopped = false;
    }

    fn sync_settings(&mut self) {
        let settings = self.settings.clone();
        if let Err(e) = self.dispatch(Command::Configure { param: 10, value: 1 }) {
            warn!(error = %e, "failed to enable servo");
        }
        if let Some(pos) = settings.pen_up_pos {
            if let Err(e) = self.dispatch(Command::Configure { param: 4, value: percent_to_ticks(pos) }) {
                warn!(error = %e, "failed to configure pen-up position");
            }
        }
        if let Some(pos) = settings.pen_down_pos {
            if let Err(e) = self.dispatch(Command::Configure { param: 5, value: percent_to_ticks(pos) }) {
                warn!(error = %e, "failed to configure pen-down position");
            }
        }
        if let Some(speed) = settings.pen_up_speed {
            if let Err(e) = self.dispatch(Command::Configure { param: 11, value: percent_to_rate(speed) }) {
                warn!(error = %e, "failed to configure pen-up speed");
            }
        }
        if let Some(speed) = settings.pen_down_speed {
            if let Err(e) = self.dispatch(Command::Configure { param: 12, value: percent_to_rate(speed) }) {
                warn!(error = %e, "failed to configure pen-down speed");
            }
        }
        if let Some(timeout_s) = settings.servo_timeout_s {
            if let Err(e) = self.dispatch(Command::ServoTimeout { timeout_ms: timeout_s * 1000, state: 1 }) {
                warn!(error = %e, "failed to configure servo timeout");
            }
        }
    }

    fn require_connected(&self) -> Result<(), DriverError> {
        if self.state != State::Connected {
            return Err(DriverError::NotConnected);
        }
        if self.stopped {
            return Err(DriverError::EmergencyStopped);
        }
        Ok(())
    }

    fn wait_interval(&mut self) {
        if let Some(last) = self.last_cmd_at {
            let min = Duration::from_millis(self.settings.min_cmd_interval_ms);
            let elapsed = last.elapsed();
            if elapsed < min {
                sleep(min - elapsed);
            }
        }
    }

    fn wait_slot(&mut self) -> Result<(), DriverError> {
        if self.settings.fifo_cap == 0 {
            return Ok(());
        }
        let deadline = Instant::now() + Duration::from_millis(self.session_timeout_ms);
        while self.pending_commands >= self.settings.fifo_cap {
            if Instant::now() >= deadline {
                return Err(DriverError::FifoTimeout);
            }
            let status = self.query_motion_status()?;
            self.pending_commands = status.fifo_pending + status.command_active as u32;
            sleep(Duration::from_millis(FIFO_POLL_INTERVAL_MS));
        }
        Ok(())
    }

    /// Low-level dispatch used for ordinary motion/config commands: applies
    /// FIFO and rate-limit gating, then sends and awaits an `OK`.
    fn dispatch(&mut self, cmd: Command) -> Result<(), DriverError> {
        self.require_connected()?;
        self.wait_slot()?;
        self.wait_interval();

        let line = cmd.encode();
        let transport = self.transport.as_mut().ok_or(DriverError::NotConnected)?;
        transport.write_line(&line, COMMAND_DEADLINE_MS)?;
        let reply = transport.read_line(128, COMMAND_DEADLINE_MS)?;
        debug!(command = %line, reply = %reply, "dispatched command");
        expect_ack(&reply)?;

        self.last_cmd_at = Some(Instant::now());
        self.pending_commands = self.pending_commands.saturating_add(1);
        Ok(())
    }

    /// Bypasses FIFO/rate gating: used for status polling itself.
    fn query_motion_status(&mut self) -> Result<MotionStatus, DriverError> {
        let transport = self.transport.as_mut().ok_or(DriverError::NotConnected)?;
        transport.write_line(&Command::QueryMotion.encode(), COMMAND_DEADLINE_MS)?;
        let reply = transport.read_line(128, COMMAND_DEADLINE_MS)?;
        Ok(parse_motion_status(&reply)?)
    }

    pub fn pen_up(&mut self) -> Result<(), DriverError> {
        let delay = self.settings.pen_up_delay_ms;
        self.dispatch(Command::SetPen { up: true, delay_ms: Some(delay) })
    }

    pub fn pen_down(&mut self) -> Result<(), DriverError> {
        let delay = self.settings.pen_down_delay_ms;
        self.dispatch(Command::SetPen { up: false, delay_ms: Some(delay) })
    }

    pub fn move_xy(&mut self, dur_ms: u32, steps_x: i32, steps_y: i32) -> Result<(), DriverError> {
        self.dispatch(Command::SimpleMove { dur_ms, steps_a: steps_x, steps_b: steps_y })
    }

    pub fn move_corexy(&mut self, dur_ms: u32, steps_a: i32, steps_b: i32) -> Result<(), DriverError> {
        self.dispatch(Command::MixedMove { dur_ms, steps_a, steps_b })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn move_ll_steps(
        &mut self,
        rate1: u32,
        steps1: i32,
        accel1: i32,
        rate2: u32,
        steps2: i32,
        accel2: i32,
        clear: u8,
    ) -> Result<(), DriverError> {
        self.dispatch(Command::LowLevelMove { rate1, steps1, accel1, rate2, steps2, accel2, clear })
    }

    pub fn move_ll_time(
        &mut self,
        intervals: u32,
        rate1: u32,
        accel1: i32,
        rate2: u32,
        accel2: i32,
        clear: u8,
    ) -> Result<(), DriverError> {
        self.dispatch(Command::LowLevelTimedMove { intervals, rate1, accel1, rate2, accel2, clear })
    }

    pub fn home(&mut self, step_rate: u32, pos1: Option<i32>, pos2: Option<i32>) -> Result<(), DriverError> {
        self.dispatch(Command::Home { step_rate, pos1, pos2 })
    }

    /// Reads the controller's motion status without FIFO/rate gating, the
    /// same bypass `wait_idle` and `wait_slot` use internally.
    pub fn status(&mut self) -> Result<MotionStatus, DriverError> {
        self.require_connected()?;
        self.query_motion_status()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Direct access to the underlying transport, e.g. to inspect
    /// [`DryRunTransport::written`] in tests.
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    /// Sends `ES` and resets runtime accounting; stays connected but blocks
    /// every subsequent operation with `EmergencyStopped` until [`Self::resume`]
    /// is called explicitly. Callable even while already stopped.
    pub fn emergency_stop(&mut self) -> Result<(), DriverError> {
        if self.state != State::Connected {
            return Err(DriverError::NotConnected);
        }
        let transport = self.transport.as_mut().ok_or(DriverError::NotConnected)?;
        transport.write_line(&Command::EmergencyStop.encode(), COMMAND_DEADLINE_MS)?;
        let _ = transport.read_line(128, COMMAND_DEADLINE_MS);
        self.pending_commands = 0;
        self.last_cmd_at = None;
        self.stopped = true;
        Ok(())
    }

    /// Clears the emergency-stop latch so operations may resume. Requires
    /// the session still be connected; does not re-home or otherwise touch
    /// the controller.
    pub fn resume(&mut self) -> Result<(), DriverError> {
        if self.state != State::Connected {
            return Err(DriverError::NotConnected);
        }
        self.stopped = false;
        Ok(())
    }

    pub fn wait_idle(&mut self, max_attempts: u32) -> Result<(), DriverError> {
        self.require_connected()?;
        for _ in 0..max_attempts {
            let status = self.query_motion_status()?;
            if !status.command_active && !status.motor1_active && !status.motor2_active && status.fifo_pending == 0 {
                return Ok(());
            }
            sleep(Duration::from_millis(IDLE_POLL_INTERVAL_MS));
        }
        Err(DriverError::FifoTimeout)
    }

    /// Enables motors, computes a safe homing step rate from settings, and
    /// homes to the origin, waiting for the controller to go idle.
    pub fn home_default(&mut self) -> Result<(), DriverError> {
        self.dispatch(Command::EnableMotors { mode1: 2, mode2: 2 })?;
        let step_rate = (self.settings.working_speed_mm_s * self.settings.steps_per_mm)
            .round()
            .clamp(100.0, 25000.0) as u32;
        self.home(step_rate, Some(0), Some(0))?;
        self.wait_idle(200)?;
        self.dispatch(Command::ClearStepCounters)
    }
}

impl<T: Transport> Default for Session<T> {
    fn default() -> Self {
        Self::new()
    }
}
