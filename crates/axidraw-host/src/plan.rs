//! Dry-run planning: reads a small JSON polyline document and prints the
//! planned block sequence, without opening a connection to the device. The
//! `plan` CLI subcommand's analogue of a batch processor that runs without a
//! live printer connection.

use std::path::Path;

use motion::{PlanBlock, PlannerLimits, Point2};
use serde::Deserialize;

use crate::errors::DriverError;
use crate::profile::DeviceProfile;

#[derive(Debug, Deserialize)]
struct PolylineDocument {
    polylines: Vec<Vec<(f64, f64)>>,
    /// Optional override of the planner limits; falls back to the profile.
    #[serde(default)]
    limits: Option<PlannerLimits>,
}

fn default_limits(profile: &DeviceProfile) -> PlannerLimits {
    PlannerLimits {
        max_speed_mm_s: profile.nominal_speed_mm_s,
        max_accel_mm_s2: profile.nominal_accel_mm_s2,
        cornering_mm: 0.5,
        min_segment_mm: 0.1,
    }
}

/// Loads a polyline document and plans it, returning the block sequence for
/// the caller to print or otherwise inspect.
pub fn plan_file(path: &Path, profile: &DeviceProfile) -> Result<Vec<PlanBlock>, DriverError> {
    let text = std::fs::read_to_string(path)?;
    let doc: PolylineDocument =
        serde_json::from_str(&text).map_err(|e| DriverError::InvalidInput(e.to_string()))?;

    let polylines: Vec<Vec<Point2>> = doc
        .polylines
        .iter()
        .map(|p| p.iter().map(|&(x, y)| Point2::new(x, y)).collect())
        .collect();

    let limits = doc.limits.unwrap_or_else(|| default_limits(profile));
    motion::lower(&polylines, &limits, profile.nominal_speed_mm_s, None).map_err(DriverError::Planner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> DeviceProfile {
        crate::profile::lookup("default").unwrap()
    }

    #[test]
    fn plans_a_simple_document() {
        let dir = std::env::temp_dir().join(format!("axidraw-host-plan-test-{}", std::process::id()));
        std::fs::write(&dir, r#"{"polylines": [[[0.0, 0.0], [10.0, 0.0]]]}"#).unwrap();
        let blocks = plan_file(&dir, &profile()).unwrap();
        let _ = std::fs::remove_file(&dir);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].pen_down);
    }

    #[test]
    fn rejects_malformed_json() {
        let dir = std::env::temp_dir().join(format!("axidraw-host-plan-bad-{}", std::process::id()));
        std::fs::write(&dir, "not json").unwrap();
        let result = plan_file(&dir, &profile());
        let _ = std::fs::remove_file(&dir);
        assert!(matches!(result, Err(DriverError::InvalidInput(_))));
    }
}
