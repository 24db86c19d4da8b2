//! Look-ahead trapezoidal motion planner.
//!
//! Converts an ordered sequence of absolute-target line segments into a
//! sequence of [`PlanBlock`]s with realizable start/cruise/end speeds,
//! honoring a global speed/acceleration cap and a cornering-deviation
//! junction-speed heuristic: a reverse feasibility pass followed by a
//! forward acceleration pass, the same two-pass shape used by most hobby
//! CNC firmwares.

use crate::{PlannerError, Point2};

/// Global caps applied while planning a batch of segments.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct PlannerLimits {
    pub max_speed_mm_s: f64,
    pub max_accel_mm_s2: f64,
    /// Permitted cornering deviation, in mm. Zero disables corner smoothing:
    /// every junction falls back to `min(prev_feed, curr_feed)`.
    pub cornering_mm: f64,
    /// Segments shorter than this are merged into the following segment.
    pub min_segment_mm: f64,
}

impl PlannerLimits {
    fn validate(&self) -> Result<(), PlannerError> {
        if self.max_speed_mm_s <= 0.0 {
            return Err(PlannerError::InvalidLimits("max_speed_mm_s must be positive"));
        }
        if self.max_accel_mm_s2 <= 0.0 {
            return Err(PlannerError::InvalidLimits("max_accel_mm_s2 must be positive"));
        }
        if self.cornering_mm < 0.0 {
            return Err(PlannerError::InvalidLimits("cornering_mm must be non-negative"));
        }
        if self.min_segment_mm < 0.0 {
            return Err(PlannerError::InvalidLimits("min_segment_mm must be non-negative"));
        }
        Ok(())
    }
}

/// One planner input: an absolute target position, a nominal feed rate, and
/// whether the pen is down for the move into this target.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct PlannerSegment {
    pub target: Point2,
    pub feed_mm_s: f64,
    pub pen_down: bool,
}

/// One planner output block: a straight-line move with a realizable
/// trapezoidal (or triangular) speed profile.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanBlock {
    pub seq: usize,
    pub dx_mm: f64,
    pub dy_mm: f64,
    pub length_mm: f64,
    pub start_speed_mm_s: f64,
    pub cruise_speed_mm_s: f64,
    pub end_speed_mm_s: f64,
    pub nominal_speed_mm_s: f64,
    pub accel_mm_s2: f64,
    pub accel_distance_mm: f64,
    pub cruise_distance_mm: f64,
    pub decel_distance_mm: f64,
    pub pen_down: bool,
}

struct NormSegment {
    dx: f64,
    dy: f64,
    length: f64,
    unit: Point2,
    feed: f64,
    pen_down: bool,
}

/// Plans a batch of absolute-target segments starting from `start_position_mm`
/// (defaults to the origin when `None`).
///
/// Returns an empty vector, not an error, for empty input.
pub fn plan(
    limits: &PlannerLimits,
    start_position_mm: Option<Point2>,
    segments: &[PlannerSegment],
) -> Result<Vec<PlanBlock>, PlannerError> {
    limits.validate()?;
    if segments.is_empty() {
        return Ok(Vec::new());
    }

    let norm = normalize(limits, start_position_mm.unwrap_or_default(), segments);
    if norm.is_empty() {
        return Ok(Vec::new());
    }

    let n = norm.len();
    let a = limits.max_accel_mm_s2;

    // junction[i] is the speed cap at the boundary before block i (i=0..=n).
    // junction[0] and junction[n] are the start/end-of-path caps (zero).
    let mut junction = vec![0.0_f64; n + 1];
    for i in 1..n {
        junction[i] = junction_speed(&norm[i - 1], &norm[i], limits);
    }

    // Reverse pass: feasible[i] is the fastest entry speed into block i that
    // still allows decelerating to feasible[i+1] by its end.
    let mut feasible = vec![0.0_f64; n + 1];
    for i in (0..n).rev() {
        let reachable = (feasible[i + 1].powi(2) + 2.0 * a * norm[i].length).sqrt();
        feasible[i] = junction[i].min(reachable);
    }

    // Forward pass: accelerate as much as the reverse pass allows.
    let mut blocks = Vec::with_capacity(n);
    let mut start_speed = feasible[0];
    for (i, seg) in norm.iter().enumerate() {
        let nominal = seg.feed.min(limits.max_speed_mm_s);
        let end_feasible = (start_speed.powi(2) + 2.0 * a * seg.length).sqrt();
        let end_speed = feasible[i + 1].min(end_feasible).min(nominal);

        let (accel_d, cruise_d, decel_d, cruise_speed) =
            trapezoid(seg.length, start_speed, end_speed, nominal, a);

        blocks.push(PlanBlock {
            seq: i,
            dx_mm: seg.dx,
            dy_mm: seg.dy,
            length_mm: seg.length,
            start_speed_mm_s: start_speed,
            cruise_speed_mm_s: cruise_speed,
            end_speed_mm_s: end_speed,
            nominal_speed_mm_s: nominal,
            accel_mm_s2: a,
            accel_distance_mm: accel_d,
            cruise_distance_mm: cruise_d,
            decel_distance_mm: decel_d,
            pen_down: seg.pen_down,
        });

        start_speed = end_speed;
    }

    Ok(blocks)
}

fn trapezoid(length: f64, start: f64, end: f64, nominal: f64, accel: f64) -> (f64, f64, f64, f64) {
    if length <= 0.0 {
        return (0.0, 0.0, 0.0, nominal.max(start).max(end));
    }
    let mut accel_d = ((nominal * nominal - start * start) / (2.0 * accel)).max(0.0);
    let mut decel_d = ((nominal * nominal - end * end) / (2.0 * accel)).max(0.0);

    if accel_d + decel_d > length {
        let v_peak_sq = accel * length + (start * start + end * end) / 2.0;
        accel_d = ((v_peak_sq - start * start) / (2.0 * accel)).clamp(0.0, length);
        decel_d = length - accel_d;
        (accel_d, 0.0, decel_d, v_peak_sq.max(0.0).sqrt())
    } else {
        let cruise_d = length - accel_d - decel_d;
        (accel_d, cruise_d, decel_d, nominal)
    }
}

fn junction_speed(prev: &NormSegment, curr: &NormSegment, limits: &PlannerLimits) -> f64 {
    let cap = prev.feed.min(curr.feed).min(limits.max_speed_mm_s);
    if prev.pen_down != curr.pen_down {
        return 0.0;
    }
    if limits.cornering_mm <= 0.0 {
        return cap;
    }
    let cos_theta = (prev.unit.x * curr.unit.x + prev.unit.y * curr.unit.y).clamp(-1.0, 1.0);
    if cos_theta <= -0.999 || cos_theta >= 0.999 {
        return cap;
    }
    let sin_half = ((1.0 - cos_theta) / 2.0).max(0.0).sqrt();
    if sin_half >= 1.0 {
        return cap;
    }
    let r = limits.cornering_mm * sin_half / (1.0 - sin_half);
    (limits.max_accel_mm_s2 * r).max(0.0).sqrt().min(cap)
}

fn normalize(limits: &PlannerLimits, start: Point2, segments: &[PlannerSegment]) -> Vec<NormSegment> {
    let mut out = Vec::with_capacity(segments.len());
    let mut cursor = start;

    for (i, seg) in segments.iter().enumerate() {
        let dx = seg.target.x - cursor.x;
        let dy = seg.target.y - cursor.y;
        let length = (dx * dx + dy * dy).sqrt();

        // A literal zero-length segment (duplicate consecutive target) is
        // never emitted, regardless of min_segment_mm (which may itself be
        // 0.0, legally disabling the merge-short-segments filter below): it
        // has no direction, and feeding a (0,0) unit vector into the next
        // junction's cos_theta would spuriously read as a right-angle turn.
        if length <= 0.0 {
            continue;
        }

        let is_last = i == segments.len() - 1;
        if length < limits.min_segment_mm && (!out.is_empty() || !is_last) {
            // Merge into whatever segment eventually covers this ground
            // (interior) or drop a short trailing tail (last, non-sole):
            // keep the cursor where it is so the next segment (if any)
            // absorbs this distance, and emit nothing for it.
            continue;
        }

        let unit = Point2::new(dx / length, dy / length);

        out.push(NormSegment {
            dx,
            dy,
            length,
            unit,
            feed: seg.feed_mm_s.min(limits.max_speed_mm_s).max(0.0),
            pen_down: seg.pen_down,
        });
        cursor = seg.target;
    }

    out
}
