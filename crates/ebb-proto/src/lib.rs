#![deny(clippy::all)]
#![deny(warnings)]

//! # EBB controller protocol
//!
//! A small, dependency-light implementation of the plain-ASCII command
//! dialect spoken by EBB-class (EggBot Board) stepper-servo controllers over
//! a serial link.
//!
//! ## Key components
//!
//! - **[`commands`]**: typed `Command` values and their CR-terminated ASCII
//!   encoding, plus parsing of the handful of reply shapes the driver cares
//!   about (version string, `QM` motion status, plain `OK`/error acks).
//!
//! Unlike a binary, checksum-framed protocol, there is no length prefix and
//! no CRC here: every command is one line, case-sensitive, comma-separated,
//! terminated by a single CR byte.

pub mod commands;

/// Common error type for the protocol crate.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// The controller's reply did not match the shape expected for the
    /// command that was sent.
    #[error("malformed reply: {0}")]
    MalformedReply(String),
    /// The controller replied with an explicit error token.
    #[error("controller reported an error: {0}")]
    ControllerError(String),
}
