//! Canvas-to-plan lowering: turns an ordered collection of polylines (mm)
//! into planner segments, inserting pen-up traversals between disjoint
//! paths and pen-down moves within a path.

use crate::planner::{plan, PlanBlock, PlannerLimits, PlannerSegment};
use crate::{PlannerError, Point2};

/// Vertices are tolerated as identical within this distance (mm).
const POSITION_EPSILON_MM: f64 = 1e-6;
/// Duplicate consecutive vertices within a polyline are skipped below this.
const DEGENERATE_EPSILON_MM: f64 = 1e-9;

/// Lowers a set of polylines into a planned block sequence.
///
/// `start_position_mm` seeds the initial pen position; it defaults to the
/// origin when `None` (see the open question on canvas-supplied start
/// positions recorded in the design notes).
pub fn lower(
    polylines: &[Vec<Point2>],
    limits: &PlannerLimits,
    travel_speed_mm_s: f64,
    start_position_mm: Option<Point2>,
) -> Result<Vec<PlanBlock>, PlannerError> {
    let start = start_position_mm.unwrap_or_default();
    let mut cursor = start;
    let mut segments = Vec::new();

    for polyline in polylines {
        let mut verts = polyline.iter();
        let Some(&first) = verts.next() else { continue };

        if cursor.distance_to(first) > POSITION_EPSILON_MM {
            segments.push(PlannerSegment { target: first, feed_mm_s: travel_speed_mm_s, pen_down: false });
            cursor = first;
        }

        for &v in verts {
            if cursor.distance_to(v) < DEGENERATE_EPSILON_MM {
                continue;
            }
            segments.push(PlannerSegment { target: v, feed_mm_s: limits.max_speed_mm_s, pen_down: true });
            cursor = v;
        }
    }

    plan(limits, Some(start), &segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> PlannerLimits {
        PlannerLimits { max_speed_mm_s: 100.0, max_accel_mm_s2: 1000.0, cornering_mm: 0.5, min_segment_mm: 0.1 }
    }

    #[test]
    fn single_path_from_origin_has_no_leading_pen_up() {
        let polylines = vec![vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)]];
        let blocks = lower(&polylines, &limits(), 150.0, None).unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].pen_down);
    }

    #[test]
    fn disjoint_paths_insert_pen_up_travel() {
        let polylines = vec![
            vec![Point2::new(0.0, 0.0), Point2::new(5.0, 0.0)],
            vec![Point2::new(20.0, 20.0), Point2::new(25.0, 20.0)],
        ];
        let blocks = lower(&polylines, &limits(), 150.0, None).unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(!blocks[1].pen_down, "travel between disjoint paths must be pen-up");
        assert!(blocks[0].pen_down);
        assert!(blocks[2].pen_down);
    }

    #[test]
    fn degenerate_duplicate_vertex_is_skipped() {
        let polylines = vec![vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
        ]];
        let blocks = lower(&polylines, &limits(), 150.0, None).unwrap();
        assert_eq!(blocks.len(), 1);
    }
}
