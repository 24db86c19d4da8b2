//! Integration tests for command encoding and reply parsing.

use ebb_proto::commands::{expect_ack, parse_motion_status, parse_version, Command, MotionStatus};
use ebb_proto::Error;

#[test]
fn version_handshake_roundtrip() {
    let cmd = Command::Version;
    assert_eq!(cmd.encode(), "V");
    assert_eq!(parse_version("EBBv13_and_above EB Firmware Version 2.8.0").unwrap(),
        "EBBv13_and_above EB Firmware Version 2.8.0");
}

#[test]
fn home_with_and_without_target_positions() {
    assert_eq!(Command::Home { step_rate: 2000, pos1: None, pos2: None }.encode(), "HM,2000");
    assert_eq!(
        Command::Home { step_rate: 2000, pos1: Some(0), pos2: Some(0) }.encode(),
        "HM,2000,0,0"
    );
}

#[test]
fn motion_status_parses_all_fields() {
    let status = parse_motion_status("QM,0,0,0,0").unwrap();
    assert_eq!(status, MotionStatus::default());
}

#[test]
fn malformed_and_error_replies_are_distinguished() {
    assert!(matches!(parse_version("!0 Err: bad"), Err(Error::ControllerError(_))));
    assert!(matches!(expect_ack("huh?"), Err(Error::MalformedReply(_))));
}
