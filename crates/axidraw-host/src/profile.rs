//! Static capabilities of a plotter model.
//!
//! This repository ships a small built-in table sufficient to exercise the
//! core driver and its tests end-to-end. A production deployment is expected
//! to supply a richer table from its own configuration layer without
//! changing this type.

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub model: String,
    pub paper_width_mm: f64,
    pub paper_height_mm: f64,
    pub nominal_speed_mm_s: f64,
    pub nominal_accel_mm_s2: f64,
    pub steps_per_mm: f64,
}

const BUILTIN: &[(&str, f64, f64, f64, f64, f64)] = &[
    // model, width_mm, height_mm, speed_mm_s, accel_mm_s2, steps_per_mm
    ("default", 300.0, 218.0, 150.0, 1500.0, 80.0),
    ("mini", 160.0, 113.0, 150.0, 1500.0, 80.0),
    ("se_a3", 450.0, 320.0, 150.0, 1200.0, 80.0),
    ("v3", 300.0, 218.0, 200.0, 2000.0, 80.0),
];

/// Looks up a profile by case-insensitive model name.
pub fn lookup(name: &str) -> Option<DeviceProfile> {
    BUILTIN
        .iter()
        .find(|(model, ..)| model.eq_ignore_ascii_case(name))
        .map(|&(model, paper_width_mm, paper_height_mm, nominal_speed_mm_s, nominal_accel_mm_s2, steps_per_mm)| {
            DeviceProfile {
                model: model.to_string(),
                paper_width_mm,
                paper_height_mm,
                nominal_speed_mm_s,
                nominal_accel_mm_s2,
                steps_per_mm,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_exists_and_is_case_insensitive() {
        assert!(lookup("default").is_some());
        assert!(lookup("DEFAULT").is_some());
        assert!(lookup("Se_A3").is_some());
        assert!(lookup("nonexistent-model").is_none());
    }
}
