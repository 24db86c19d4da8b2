//! # AxiDraw host driver
//!
//! A host-side driver stack for an AxiDraw-class two-axis pen plotter over
//! an EBB-compatible serial link. Turns planned motion blocks (see the
//! [`motion`] crate) and polyline canvases into timed low-level motor
//! commands dispatched over [`ebb_proto`]'s ASCII dialect, while mediating
//! exclusive access to the device.
//!
//! The binary target (`src/main.rs`) is a thin `clap` CLI over this library.

pub mod encoder;
pub mod errors;
pub mod lock;
pub mod plan;
pub mod profile;
pub mod session;
pub mod settings;
pub mod transport;

pub use errors::{ukrainian_message, DriverError};
pub use profile::DeviceProfile;
pub use session::Session;
pub use settings::Settings;
pub use transport::{DryRunTransport, SerialTransport, Transport};
