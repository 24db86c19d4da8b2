//! Tests for the motion planner's determinism and correctness.

use motion::{plan, PlanBlock, Point2, PlannerLimits, PlannerSegment};

fn limits() -> PlannerLimits {
    PlannerLimits { max_speed_mm_s: 150.0, max_accel_mm_s2: 1500.0, cornering_mm: 0.5, min_segment_mm: 0.1 }
}

fn plan_twice(segs: &[PlannerSegment]) -> (Vec<PlanBlock>, Vec<PlanBlock>) {
    let a = plan(&limits(), None, segs).unwrap();
    let b = plan(&limits(), None, segs).unwrap();
    (a, b)
}

#[test]
fn planning_is_deterministic_across_runs() {
    let segs = [
        PlannerSegment { target: Point2::new(10.0, 0.0), feed_mm_s: 120.0, pen_down: true },
        PlannerSegment { target: Point2::new(10.0, 10.0), feed_mm_s: 120.0, pen_down: true },
        PlannerSegment { target: Point2::new(0.0, 0.0), feed_mm_s: 90.0, pen_down: false },
    ];
    let (a, b) = plan_twice(&segs);
    assert_eq!(a.len(), b.len());
    for (ba, bb) in a.iter().zip(b.iter()) {
        assert_eq!(ba, bb);
    }
}

#[test]
fn diagonal_move_profile_is_consistent() {
    let segs = [PlannerSegment { target: Point2::new(10.0, 10.0), feed_mm_s: 100.0, pen_down: true }];
    let blocks = plan(&limits(), None, &segs).unwrap();
    assert_eq!(blocks.len(), 1);
    let b = blocks[0];
    let expected_len = (10.0_f64 * 10.0 + 10.0 * 10.0).sqrt();
    assert!((b.length_mm - expected_len).abs() < 1e-9);
    assert!((b.accel_distance_mm + b.cruise_distance_mm + b.decel_distance_mm - b.length_mm).abs() < 1e-6);
    assert!(b.cruise_speed_mm_s >= b.start_speed_mm_s);
    assert!(b.cruise_speed_mm_s >= b.end_speed_mm_s);
}
