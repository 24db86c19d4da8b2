//! Command-line driver for an AxiDraw-class pen plotter over an
//! EBB-compatible serial link.
//!
//! Every subcommand but `plan` opens a session, runs one operation, and
//! disconnects; `plan` is a pure, device-free dry run over a JSON polyline
//! document.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use axidraw_host::profile::{self, DeviceProfile};
use axidraw_host::session::Session;
use axidraw_host::settings::Settings;
use axidraw_host::transport::{DryRunTransport, SerialTransport, Transport};
use axidraw_host::{plan, ukrainian_message, DriverError};

const DEFAULT_BAUD: u32 = 9600;
const SERIAL_OPEN_TIMEOUT_MS: u64 = 1000;

/// Host driver for an AxiDraw-class two-axis pen plotter.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial device path (e.g. /dev/ttyACM0). Guessed from USB enumeration
    /// if omitted.
    #[arg(long, global = true)]
    port: Option<String>,

    /// Serial baud rate.
    #[arg(long, global = true, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// Device profile name (`default`, `mini`, `se_a3`, `v3`).
    #[arg(long, global = true, default_value = "default")]
    profile: String,

    /// Path to a JSON settings file. Falls back to profile-derived defaults.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Use the in-process emulator instead of a real serial port.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lift the pen.
    PenUp,
    /// Lower the pen.
    PenDown,
    /// Enable the motors and home both axes.
    Home,
    /// Move in a straight line, in millimeters, at a constant speed.
    Move {
        dx_mm: f64,
        dy_mm: f64,
        /// Defaults to the session's configured working speed.
        #[arg(long)]
        speed_mm_s: Option<f64>,
    },
    /// Plan a JSON polyline document and print the resulting blocks. Does
    /// not open a connection to the device.
    Plan {
        /// Path to a `{"polylines": [[[x, y], ...], ...]}` document.
        path: PathBuf,
    },
    /// Print the controller's current motion status.
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        error!(error = ?err, "command failed");
        eprintln!("{}", ukrainian_message(&err));
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), DriverError> {
    let device_profile =
        profile::lookup(&cli.profile).ok_or_else(|| DriverError::InvalidInput(format!("unknown profile: {}", cli.profile)))?;

    if let Commands::Plan { path } = &cli.command {
        let blocks = plan::plan_file(path, &device_profile)?;
        for block in &blocks {
            println!("{}", serde_json::to_string(block).map_err(|e| DriverError::InvalidInput(e.to_string()))?);
        }
        return Ok(());
    }

    let mut session = connect(cli, &device_profile)?;
    match &cli.command {
        Commands::PenUp => session.pen_up()?,
        Commands::PenDown => session.pen_down()?,
        Commands::Home => session.home_default()?,
        Commands::Move { dx_mm, dy_mm, speed_mm_s } => {
            let speed = speed_mm_s.unwrap_or(session.settings().working_speed_mm_s);
            let (dur_ms, steps_x, steps_y) =
                axidraw_host::encoder::simple_move(*dx_mm, *dy_mm, speed, session.settings().steps_per_mm);
            session.move_xy(dur_ms, steps_x, steps_y)?;
        }
        Commands::Status => {
            let status = session.status()?;
            println!(
                "command_active={} motor1_active={} motor2_active={} fifo_pending={}",
                status.command_active, status.motor1_active, status.motor2_active, status.fifo_pending
            );
        }
        Commands::Plan { .. } => unreachable!("handled above"),
    }
    session.disconnect();
    Ok(())
}

fn connect(cli: &Cli, device_profile: &DeviceProfile) -> Result<Session<Box<dyn Transport>>, DriverError> {
    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings {
            working_speed_mm_s: device_profile.nominal_speed_mm_s,
            working_accel_mm_s2: device_profile.nominal_accel_mm_s2,
            steps_per_mm: device_profile.steps_per_mm,
            ..Settings::default()
        },
    };

    let transport: Box<dyn Transport> = if cli.dry_run {
        info!("using the in-process dry-run transport");
        let mut t = DryRunTransport::new();
        t.push_reply("EBBv13_and_above EB Firmware Version 2.8.0");
        Box::new(t)
    } else {
        let port = cli
            .port
            .clone()
            .or_else(SerialTransport::guess_device_port)
            .ok_or_else(|| DriverError::InvalidInput("no serial port specified and none could be guessed".into()))?;
        info!(port = %port, baud = cli.baud, "opening serial port");
        Box::new(SerialTransport::open(&port, cli.baud, SERIAL_OPEN_TIMEOUT_MS)?)
    };

    let mut session = Session::new();
    session.configure(settings);
    session.connect(transport)?;
    Ok(session)
}
