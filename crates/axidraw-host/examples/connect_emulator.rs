//! In-process host and controller emulator.
//!
//! Runs a session against [`DryRunTransport`] instead of real hardware,
//! useful for exercising the command sequencing without an AxiDraw attached.

use axidraw_host::session::Session;
use axidraw_host::settings::Settings;
use axidraw_host::transport::DryRunTransport;
use tracing::info;

fn main() {
    tracing_subscriber::fmt::init();

    let mut session: Session<DryRunTransport> = Session::new();
    session.configure(Settings { fifo_cap: 3, min_cmd_interval_ms: 5, ..Settings::default() });

    let mut transport = DryRunTransport::new();
    transport.push_reply("EBBv13_and_above EB Firmware Version 2.8.0");
    session.connect(transport).expect("handshake with the emulator failed");
    info!("connected to the in-process emulator");

    session.pen_up().expect("pen_up failed");
    session.pen_down().expect("pen_down failed");
    session.move_xy(200, 800, 0).expect("move_xy failed");

    let status = session.status().expect("status query failed");
    info!(?status, "final motion status");

    session.disconnect();
    info!("disconnected");
}
