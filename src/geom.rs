//! Shared geometry utilities.
//!
//! Everything here works in image pixel coordinates (y down), but none
//! of the predicates depend on the axis direction.

use kurbo::{Point, Rect};

/// Whether the turn a → b → c is counter-clockwise.
///
/// Sign of the cross product `(c - a) × (b - a)` with a strict comparison:
/// collinear triples are never counter-clockwise.
pub fn orientation(a: Point, b: Point, c: Point) -> bool {
    (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
}

/// Whether segment p1-p2 crosses segment q1-q2.
///
/// Plain orientation test. Touching endpoints and collinear overlaps are
/// decided by the strict comparison in [`orientation`], not special-cased.
pub fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    orientation(p1, q1, q2) != orientation(p2, q1, q2)
        && orientation(p1, p2, q1) != orientation(p1, p2, q2)
}

/// Axis-aligned bounds of a point set. `None` if there are no points.
pub fn bounding_box<I>(points: I) -> Option<Rect>
where
    I: IntoIterator<Item = Point>,
{
    let mut points = points.into_iter();
    let first = points.next()?;
    Some(points.fold(Rect::from_points(first, first), |rect, p| rect.union_pt(p)))
}

/// Even-odd point-in-polygon test (ray cast towards -x).
///
/// The ring is implicitly closed: the last vertex connects back to the
/// first. Horizontal edges never satisfy the straddle test, so the
/// intercept division is never by zero.
pub fn point_in_polygon(point: Point, ring: &[Point]) -> bool {
    let n = ring.len();
    if n == 0 {
        return false;
    }
    let (x, y) = (point.x, point.y);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn orientation_is_strict() {
        assert!(orientation(pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)));
        assert!(!orientation(pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, -10.0)));
        // Collinear resolves to "not counter-clockwise".
        assert!(!orientation(pt(0.0, 0.0), pt(5.0, 5.0), pt(10.0, 10.0)));
    }

    #[test]
    fn orientation_translation_invariant() {
        let triples = [
            (pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)),
            (pt(3.0, -2.0), pt(-7.0, 4.0), pt(1.0, 1.0)),
            (pt(1.0, 1.0), pt(2.0, 2.0), pt(3.0, 3.0)),
        ];
        for (a, b, c) in triples {
            for (dx, dy) in [(5.0, 5.0), (-12.0, 40.0), (256.0, -1024.0)] {
                let d = kurbo::Vec2::new(dx, dy);
                assert_eq!(orientation(a, b, c), orientation(a + d, b + d, c + d));
            }
        }
    }

    #[test]
    fn crossing_segments_intersect() {
        assert!(segments_intersect(
            pt(0.0, 0.0),
            pt(10.0, 10.0),
            pt(0.0, 10.0),
            pt(10.0, 0.0),
        ));
        assert!(segments_intersect(
            pt(50.0, -10.0),
            pt(50.0, 110.0),
            pt(0.0, 50.0),
            pt(100.0, 50.0),
        ));
    }

    #[test]
    fn disjoint_segments_do_not_intersect() {
        assert!(!segments_intersect(
            pt(0.0, 0.0),
            pt(1.0, 0.0),
            pt(5.0, 5.0),
            pt(6.0, 5.0),
        ));
        // Parallel, boxes apart.
        assert!(!segments_intersect(
            pt(0.0, 0.0),
            pt(10.0, 10.0),
            pt(20.0, 0.0),
            pt(30.0, 10.0),
        ));
    }

    #[test]
    fn shared_endpoint_follows_turn_direction() {
        // Consecutive segments: reported as crossing only for a left turn.
        let (a, b) = (pt(0.0, 0.0), pt(10.0, 0.0));
        assert!(segments_intersect(a, b, b, pt(10.0, 10.0)));
        assert!(!segments_intersect(a, b, b, pt(10.0, -10.0)));
    }

    #[test]
    fn bounding_box_of_points() {
        let rect = bounding_box([pt(3.0, 7.0), pt(-1.0, 2.0), pt(5.0, 4.0)]).unwrap();
        assert_eq!(rect, Rect::new(-1.0, 2.0, 5.0, 7.0));
        assert_eq!(rect.area(), 30.0);
        assert!(bounding_box(std::iter::empty()).is_none());
    }

    #[test]
    fn point_in_square() {
        let square = [pt(0.0, 0.0), pt(100.0, 0.0), pt(100.0, 100.0), pt(0.0, 100.0)];
        assert!(point_in_polygon(pt(50.0, 50.0), &square));
        assert!(point_in_polygon(pt(1.0, 99.0), &square));
        assert!(!point_in_polygon(pt(150.0, 50.0), &square));
        assert!(!point_in_polygon(pt(50.0, -1.0), &square));
    }

    #[test]
    fn point_in_polygon_reflection_symmetric() {
        let square = [pt(-10.0, -10.0), pt(10.0, -10.0), pt(10.0, 10.0), pt(-10.0, 10.0)];
        let probes = [
            pt(3.0, 4.0),
            pt(9.5, -9.5),
            pt(12.0, 1.0),
            pt(-4.0, 15.0),
            pt(0.25, 0.75),
        ];
        for p in probes {
            let reflected = pt(-p.x, -p.y);
            assert_eq!(
                point_in_polygon(p, &square),
                point_in_polygon(reflected, &square),
                "{:?} vs {:?}",
                p,
                reflected
            );
        }
    }

    #[test]
    fn point_in_concave_polygon() {
        // U shape: the notch between the arms is outside.
        let u = [
            pt(0.0, 0.0),
            pt(30.0, 0.0),
            pt(30.0, 30.0),
            pt(20.0, 30.0),
            pt(20.0, 10.0),
            pt(10.0, 10.0),
            pt(10.0, 30.0),
            pt(0.0, 30.0),
        ];
        assert!(point_in_polygon(pt(5.0, 20.0), &u));
        assert!(point_in_polygon(pt(25.0, 20.0), &u));
        assert!(!point_in_polygon(pt(15.0, 20.0), &u));
    }

    #[test]
    fn degenerate_rings_are_empty() {
        assert!(!point_in_polygon(pt(0.0, 0.0), &[]));
        let line = [pt(0.0, 0.0), pt(10.0, 10.0)];
        assert!(!point_in_polygon(pt(5.0, 5.0), &line));
        assert!(!point_in_polygon(pt(2.0, 5.0), &line));
    }
}
