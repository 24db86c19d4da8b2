#![cfg(test)]

use motion::{plan, Point2, PlannerLimits, PlannerSegment};

fn limits() -> PlannerLimits {
    PlannerLimits { max_speed_mm_s: 150.0, max_accel_mm_s2: 2500.0, cornering_mm: 0.5, min_segment_mm: 0.1 }
}

#[test]
fn high_speed_move_never_produces_non_finite_fields() {
    let segs = [PlannerSegment { target: Point2::new(200.0, 0.0), feed_mm_s: 150.0, pen_down: true }];
    let blocks = plan(&limits(), None, &segs).unwrap();
    let b = blocks[0];
    for v in [b.start_speed_mm_s, b.cruise_speed_mm_s, b.end_speed_mm_s, b.accel_distance_mm, b.cruise_distance_mm, b.decel_distance_mm] {
        assert!(v.is_finite());
        assert!(v >= 0.0);
    }
}

#[test]
fn many_small_segments_mostly_avoid_full_stops() {
    let radius = 50.0;
    let segments_count = 200;
    let mut segs = Vec::with_capacity(segments_count);
    for i in 1..=segments_count {
        let angle = (i as f64 / segments_count as f64) * 2.0 * std::f64::consts::PI;
        segs.push(PlannerSegment {
            target: Point2::new(radius * angle.cos(), radius * angle.sin()),
            feed_mm_s: 100.0,
            pen_down: true,
        });
    }

    let blocks = plan(&limits(), Some(Point2::new(radius, 0.0)), &segs).unwrap();

    let stops = blocks.iter().filter(|b| b.start_speed_mm_s < 1.0).count();
    assert!(stops < 5, "planner stopped {stops} times between small segments on a smooth arc");
}

#[test]
fn queue_of_many_segments_completes_without_error() {
    let mut segs = Vec::with_capacity(5000);
    let mut x = 0.0;
    for i in 0..5000 {
        x += if i % 2 == 0 { 1.0 } else { -1.0 };
        segs.push(PlannerSegment { target: Point2::new(x, 0.0), feed_mm_s: 80.0, pen_down: true });
    }
    let blocks = plan(&limits(), None, &segs).unwrap();
    assert!(!blocks.is_empty());
}
