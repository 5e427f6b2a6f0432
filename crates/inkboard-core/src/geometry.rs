//! Geometry helpers shared by hit-testing, handles and binding.

use kurbo::{Affine, Point, Rect};

/// Map a world point into an element's local, unrotated frame.
pub fn to_local(point: Point, center: Point, angle: f64) -> Point {
    if angle == 0.0 {
        return point;
    }
    Affine::rotate_about(-angle, center) * point
}

/// Map a point from an element's local, unrotated frame back to world space.
pub fn to_world(point: Point, center: Point, angle: f64) -> Point {
    if angle == 0.0 {
        return point;
    }
    Affine::rotate_about(angle, center) * point
}

/// Normalize an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
    angle.rem_euclid(std::f64::consts::TAU)
}

/// Axis-aligned bounds of `rect` rotated by `angle` about its center.
pub fn rotated_bounds(rect: Rect, angle: f64) -> Rect {
    if angle == 0.0 {
        return rect;
    }
    let center = rect.center();
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    points_bounds(corners.iter().map(|&p| to_world(p, center, angle))).unwrap_or(rect)
}

/// Bounding box of a set of points, or `None` when empty.
pub fn points_bounds(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    points.into_iter().fold(None, |acc: Option<Rect>, p| {
        Some(match acc {
            Some(r) => Rect::new(r.x0.min(p.x), r.y0.min(p.y), r.x1.max(p.x), r.y1.max(p.y)),
            None => Rect::from_points(p, p),
        })
    })
}

/// Inclusive containment (kurbo's `Rect::contains` excludes the far edges).
pub fn rect_contains(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Whether two rectangles overlap or touch.
pub fn rects_intersect(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn approx(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn test_local_world_roundtrip() {
        let center = Point::new(50.0, 50.0);
        let p = Point::new(80.0, 10.0);
        let local = to_local(p, center, 0.7);
        assert!(approx(to_world(local, center, 0.7), p));
    }

    #[test]
    fn test_quarter_turn() {
        let center = Point::new(0.0, 0.0);
        let p = to_world(Point::new(10.0, 0.0), center, FRAC_PI_2);
        assert!(approx(p, Point::new(0.0, 10.0)));
    }

    #[test]
    fn test_rotated_bounds_quarter_turn_swaps_extent() {
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        let b = rotated_bounds(rect, FRAC_PI_2);
        assert!((b.width() - 50.0).abs() < 1e-9);
        assert!((b.height() - 100.0).abs() < 1e-9);
        assert!(approx(b.center(), rect.center()));
    }

    #[test]
    fn test_segment_distance() {
        let d = point_to_segment_dist(Point::new(5.0, 5.0), Point::ZERO, Point::new(10.0, 0.0));
        assert!((d - 5.0).abs() < 1e-9);
        let d = point_to_segment_dist(Point::new(-3.0, 4.0), Point::ZERO, Point::new(10.0, 0.0));
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(-FRAC_PI_2) - 3.0 * FRAC_PI_2).abs() < 1e-9);
        assert!(normalize_angle(std::f64::consts::TAU).abs() < 1e-9);
    }
}
