//! LowLevel phase encoder: translates a planner block's phases into the
//! controller's fixed-point step-rate/acceleration units for `LM`, with
//! CoreXY kinematic mapping.

use ebb_proto::commands::Command;
use motion::PlanBlock;

/// Controller tick interval.
const INTERVAL_S: f64 = 40e-6;
/// Fixed-point scale for step rates: `rate_fixed = round(steps_per_sec * SCALE)`.
const RATE_SCALE: f64 = (1u64 << 31) as f64 * INTERVAL_S;

/// Converts millimeters to a signed step count at the given steps/mm.
///
/// Returns 0 (rather than panicking or producing UB) for a non-positive
/// `steps_per_mm`, a non-finite `mm`, or a magnitude beyond a sane working
/// envelope.
pub fn mm_to_steps(mm: f64, steps_per_mm: f64) -> i32 {
    if steps_per_mm <= 0.0 || !mm.is_finite() || mm.abs() >= 1e300 {
        return 0;
    }
    let steps = (mm * steps_per_mm).round();
    if steps >= i32::MAX as f64 {
        i32::MAX
    } else if steps <= i32::MIN as f64 {
        i32::MIN
    } else {
        steps as i32
    }
}

/// The controller's `SM`/`XM` duration field is a 24-bit millisecond count.
const MAX_MOVE_MS: f64 = 0xFF_FFFF as f64;

/// Computes the `SM` parameters for a simple, constant-speed straight-line
/// move: duration in ms (ceiled, clamped to the controller's 24-bit field)
/// and the per-axis step counts.
pub fn simple_move(dx_mm: f64, dy_mm: f64, speed_mm_s: f64, steps_per_mm: f64) -> (u32, i32, i32) {
    let length_mm = (dx_mm * dx_mm + dy_mm * dy_mm).sqrt();
    let dur_ms = if speed_mm_s > 0.0 { (length_mm / speed_mm_s * 1000.0).ceil() } else { 0.0 };
    let dur_ms = dur_ms.clamp(0.0, MAX_MOVE_MS) as u32;
    (dur_ms, mm_to_steps(dx_mm, steps_per_mm), mm_to_steps(dy_mm, steps_per_mm))
}

struct Phase {
    distance_mm: f64,
    start_v: f64,
    end_v: f64,
}

/// Encodes one planner block into up to three `LM` commands (accel, cruise,
/// decel), whichever phases have non-zero length.
pub fn encode_block(block: &PlanBlock, steps_per_mm_a: f64, steps_per_mm_b: f64) -> Vec<Command> {
    let phases = [
        Phase { distance_mm: block.accel_distance_mm, start_v: block.start_speed_mm_s, end_v: block.cruise_speed_mm_s },
        Phase { distance_mm: block.cruise_distance_mm, start_v: block.cruise_speed_mm_s, end_v: block.cruise_speed_mm_s },
        Phase { distance_mm: block.decel_distance_mm, start_v: block.cruise_speed_mm_s, end_v: block.end_speed_mm_s },
    ];

    let mut commands = Vec::with_capacity(3);
    for phase in phases {
        if phase.distance_mm <= 0.0 || block.length_mm <= 0.0 {
            continue;
        }
        let frac = phase.distance_mm / block.length_mm;
        let dx = block.dx_mm * frac;
        let dy = block.dy_mm * frac;
        let steps_x = mm_to_steps(dx, steps_per_mm_a.max(steps_per_mm_b));
        // steps_per_mm is shared between X/Y in practice (single belt pitch);
        // kept as two parameters to mirror the CoreXY motor-pair symmetry.
        let steps_y = mm_to_steps(dy, steps_per_mm_a.max(steps_per_mm_b));
        let (steps_a, steps_b) = motion::kinematics::corexy_steps_from_xy(steps_x, steps_y);

        let avg_v = (phase.start_v + phase.end_v) / 2.0;
        let duration_s = if avg_v > 0.0 { phase.distance_mm / avg_v } else { 0.0 };
        let intervals = (duration_s / INTERVAL_S).round().max(1.0);

        let (rate1, accel1) = encode_axis(steps_a, phase.distance_mm, phase.start_v, phase.end_v, intervals);
        let (rate2, accel2) = encode_axis(steps_b, phase.distance_mm, phase.start_v, phase.end_v, intervals);

        commands.push(Command::LowLevelMove {
            rate1,
            steps1: steps_a,
            accel1,
            rate2,
            steps2: steps_b,
            accel2,
            clear: 0,
        });
    }
    commands
}

fn encode_axis(steps: i32, distance_mm: f64, start_v: f64, end_v: f64, intervals: f64) -> (u32, i32) {
    if steps == 0 || distance_mm <= 0.0 {
        return (0, 0);
    }
    let steps_per_mm = steps as f64 / distance_mm;
    let start_rate = (start_v * steps_per_mm).abs();
    let end_rate = (end_v * steps_per_mm).abs();

    let rate_start_fixed = clamp_u31(start_rate * RATE_SCALE);
    let rate_end_fixed = clamp_u31(end_rate * RATE_SCALE);

    let mut accel_fixed = (((rate_end_fixed as i64) - (rate_start_fixed as i64)) as f64 / intervals).round();
    if accel_fixed == 0.0 && rate_end_fixed != rate_start_fixed {
        accel_fixed = if rate_end_fixed > rate_start_fixed { 1.0 } else { -1.0 };
    }

    (rate_start_fixed, clamp_i32(accel_fixed))
}

fn clamp_u31(v: f64) -> u32 {
    if !v.is_finite() || v <= 0.0 {
        0
    } else if v >= (i32::MAX as f64) {
        i32::MAX as u32
    } else {
        v.round() as u32
    }
}

fn clamp_i32(v: f64) -> i32 {
    if !v.is_finite() {
        0
    } else if v >= i32::MAX as f64 {
        i32::MAX
    } else if v <= i32::MIN as f64 {
        i32::MIN
    } else {
        v as i32
    }
}
