//! Session tunables, persisted as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::DriverError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub min_cmd_interval_ms: u64,
    pub fifo_cap: u32,
    pub pen_up_delay_ms: u32,
    pub pen_down_delay_ms: u32,
    /// Percent 0..100, or `None` if unset (leave the controller's own default).
    pub pen_up_pos: Option<u8>,
    pub pen_down_pos: Option<u8>,
    pub pen_up_speed: Option<u8>,
    pub pen_down_speed: Option<u8>,
    pub servo_timeout_s: Option<u32>,
    pub working_speed_mm_s: f64,
    pub working_accel_mm_s2: f64,
    pub steps_per_mm: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_cmd_interval_ms: 5,
            fifo_cap: 3,
            pen_up_delay_ms: 200,
            pen_down_delay_ms: 200,
            pen_up_pos: None,
            pen_down_pos: None,
            pen_up_speed: None,
            pen_down_speed: None,
            servo_timeout_s: None,
            working_speed_mm_s: 150.0,
            working_accel_mm_s2: 1500.0,
            steps_per_mm: 80.0,
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| DriverError::InvalidInput(e.to_string()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DriverError> {
        let text = serde_json::to_string_pretty(self).map_err(|e| DriverError::InvalidInput(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
