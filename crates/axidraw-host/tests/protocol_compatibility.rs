//! Confirms the session dispatches the exact ASCII wire commands an
//! EBB-compatible controller expects, by inspecting [`DryRunTransport::written`]
//! after each operation.

use axidraw_host::session::Session;
use axidraw_host::settings::Settings;
use axidraw_host::transport::DryRunTransport;

fn connect(settings: Settings) -> Session<DryRunTransport> {
    let mut session = Session::new();
    session.configure(settings);
    let mut transport = DryRunTransport::new();
    transport.push_reply("EBBv13_and_above EB Firmware Version 2.8.0");
    session.connect(transport).unwrap();
    session
}

fn written(session: &Session<DryRunTransport>) -> &[String] {
    &session.transport().unwrap().written
}

#[test]
fn handshake_sends_v() {
    let session = connect(Settings::default());
    assert_eq!(written(&session), ["V", "SC,10,1"]);
}

#[test]
fn pen_up_and_pen_down_send_sp_with_configured_delays() {
    let mut session = connect(Settings { pen_up_delay_ms: 200, pen_down_delay_ms: 400, ..Settings::default() });
    session.pen_up().unwrap();
    session.pen_down().unwrap();
    assert_eq!(written(&session), ["V", "SC,10,1", "SP,1,200", "SP,0,400"]);
}

#[test]
fn move_xy_sends_sm_with_duration_and_steps() {
    let mut session = connect(Settings::default());
    session.move_xy(100, 800, -400).unwrap();
    assert_eq!(written(&session), ["V", "SC,10,1", "SM,100,800,-400"]);
}

#[test]
fn home_default_enables_motors_homes_waits_idle_then_clears_counters() {
    let mut session = Session::new();
    session.configure(Settings { working_speed_mm_s: 150.0, steps_per_mm: 80.0, ..Settings::default() });
    let transport = DryRunTransport::with_script(
        ["EBBv13_and_above EB Firmware Version 2.8.0", "OK", "OK", "OK", "QM,0,0,0,0", "OK"].map(String::from),
    );
    session.connect(transport).unwrap();
    session.home_default().unwrap();
    assert_eq!(written(&session), ["V", "SC,10,1", "EM,2,2", "HM,12000,0,0", "QM", "CS"]);
}

#[test]
fn sync_settings_configures_pen_parameters_on_connect() {
    let mut session = Session::new();
    session.configure(Settings {
        pen_up_pos: Some(60),
        pen_down_pos: Some(30),
        pen_up_speed: Some(75),
        servo_timeout_s: Some(60),
        ..Settings::default()
    });
    let transport = DryRunTransport::with_script(
        ["EBBv13_and_above EB Firmware Version 2.8.0", "OK", "OK", "OK", "OK", "OK"].map(String::from),
    );
    session.connect(transport).unwrap();
    // pen_up_pos=60% -> ticks 16800, pen_down_pos=30% -> ticks 11400,
    // pen_up_speed=75% -> rate 900 (percent->ticks/percent->rate conversion).
    assert_eq!(written(&session), ["V", "SC,10,1", "SC,4,16800", "SC,5,11400", "SC,11,900", "SR,60000,1"]);
}

#[test]
fn emergency_stop_sends_es() {
    let mut session = connect(Settings::default());
    session.emergency_stop().unwrap();
    assert_eq!(written(&session), ["V", "SC,10,1", "ES"]);
}
