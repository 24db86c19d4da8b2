//! Error taxonomy for the device driver, plus a CLI-facing renderer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("could not open serial port: {0}")]
    SerialOpen(String),
    #[error("controller did not respond to handshake")]
    Handshake,
    #[error("protocol error: {0}")]
    Protocol(#[from] ebb_proto::Error),
    #[error("planner error: {0}")]
    Planner(#[from] motion::PlannerError),
    #[error("no FIFO slot became available before the session timeout")]
    FifoTimeout,
    #[error("device is locked by another process")]
    Busy,
    #[error("session is not connected")]
    NotConnected,
    #[error("session is emergency-stopped; resume explicitly before issuing moves")]
    EmergencyStopped,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A single Ukrainian-language line suitable for ERROR-level CLI output;
/// the full error chain (including the controller's raw reply, when any)
/// still goes to DEBUG logs via `tracing`.
pub fn ukrainian_message(err: &DriverError) -> String {
    match err {
        DriverError::InvalidInput(_) => "Некоректні вхідні дані.".to_string(),
        DriverError::SerialOpen(_) => "Не вдалося відкрити послідовний порт.".to_string(),
        DriverError::Handshake => "Пристрій не відповів на рукостискання.".to_string(),
        DriverError::Protocol(_) => "Помилка протоколу контролера.".to_string(),
        DriverError::Planner(_) => "Помилка планувальника руху.".to_string(),
        DriverError::FifoTimeout => "Черга контролера не звільнилася вчасно.".to_string(),
        DriverError::Busy => "Пристрій зайнятий іншим процесом.".to_string(),
        DriverError::NotConnected => "Сеанс не підключено до пристрою.".to_string(),
        DriverError::EmergencyStopped => "Сеанс зупинено аварійно; потрібне відновлення.".to_string(),
        DriverError::Io(_) => "Помилка вводу-виводу.".to_string(),
    }
}
