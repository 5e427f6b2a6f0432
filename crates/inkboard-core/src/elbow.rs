//! Orthogonal ("elbow") routing for arrows.
//!
//! Routes are built for a start leaving horizontally; vertical starts are
//! handled by transposing the problem, routing, and transposing back.

use kurbo::{Point, Vec2};

/// Distance a route travels past a point before turning back.
pub const ELBOW_PADDING: f64 = 20.0;

const EDGE_EPSILON: f64 = 1e-6;

/// Axis-aligned direction. `Up` is towards negative y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    Left,
    Right,
    Up,
    Down,
}

impl Heading {
    pub fn vector(self) -> Vec2 {
        match self {
            Heading::Left => Vec2::new(-1.0, 0.0),
            Heading::Right => Vec2::new(1.0, 0.0),
            Heading::Up => Vec2::new(0.0, -1.0),
            Heading::Down => Vec2::new(0.0, 1.0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Heading::Left | Heading::Right)
    }

    pub fn opposite(self) -> Self {
        match self {
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
        }
    }

    /// Mirror across the diagonal (swap x and y).
    fn transposed(self) -> Self {
        match self {
            Heading::Left => Heading::Up,
            Heading::Up => Heading::Left,
            Heading::Right => Heading::Down,
            Heading::Down => Heading::Right,
        }
    }
}

/// Side of a shape a normalized fixed point sits on. Interior points have no
/// heading.
pub fn heading_from_fixed_point(fixed_point: Point) -> Option<Heading> {
    if fixed_point.x.abs() < EDGE_EPSILON {
        Some(Heading::Left)
    } else if (fixed_point.x - 1.0).abs() < EDGE_EPSILON {
        Some(Heading::Right)
    } else if fixed_point.y.abs() < EDGE_EPSILON {
        Some(Heading::Up)
    } else if (fixed_point.y - 1.0).abs() < EDGE_EPSILON {
        Some(Heading::Down)
    } else {
        None
    }
}

/// Dominant-axis direction from `from` towards `to`. Ties go horizontal.
pub fn infer_heading(from: Point, to: Point) -> Heading {
    let d = to - from;
    if d.x.abs() >= d.y.abs() {
        if d.x >= 0.0 { Heading::Right } else { Heading::Left }
    } else if d.y >= 0.0 {
        Heading::Down
    } else {
        Heading::Up
    }
}

/// Orthogonal polyline from `start` to `end`.
///
/// `start_heading` is the direction the path leaves `start`; `end_heading` is
/// the side of `end` the path arrives from. Missing headings are inferred
/// from the relative position of the endpoints. Both endpoints are preserved
/// exactly and every consecutive pair of points shares an x or a y.
pub fn route(
    start: Point,
    end: Point,
    start_heading: Option<Heading>,
    end_heading: Option<Heading>,
) -> Vec<Point> {
    let start_heading = start_heading.unwrap_or_else(|| infer_heading(start, end));
    let end_heading = end_heading.unwrap_or_else(|| infer_heading(end, start));

    let points = if start_heading.is_horizontal() {
        route_horizontal(start, end, start_heading, end_heading)
    } else {
        route_horizontal(
            transpose(start),
            transpose(end),
            start_heading.transposed(),
            end_heading.transposed(),
        )
        .into_iter()
        .map(transpose)
        .collect()
    };
    simplify(&points, 0.0)
}

fn transpose(p: Point) -> Point {
    Point::new(p.y, p.x)
}

fn route_horizontal(start: Point, end: Point, start_heading: Heading, end_heading: Heading) -> Vec<Point> {
    let dir = start_heading.vector().x;

    if !end_heading.is_horizontal() {
        // L: one bend at the implied corner.
        return vec![start, Point::new(end.x, start.y), end];
    }

    if end_heading == start_heading.opposite() {
        if dir * (end.x - start.x) > 0.0 {
            // Z through the vertical midline.
            let mid_x = (start.x + end.x) / 2.0;
            return vec![
                start,
                Point::new(mid_x, start.y),
                Point::new(mid_x, end.y),
                end,
            ];
        }
        // End is behind the start: S through the horizontal midline.
        let out_x = start.x + dir * ELBOW_PADDING;
        let in_x = end.x - dir * ELBOW_PADDING;
        let mid_y = (start.y + end.y) / 2.0;
        return vec![
            start,
            Point::new(out_x, start.y),
            Point::new(out_x, mid_y),
            Point::new(in_x, mid_y),
            Point::new(in_x, end.y),
            end,
        ];
    }

    // U: overshoot past both points, then come back.
    let x = if dir > 0.0 {
        start.x.max(end.x) + ELBOW_PADDING
    } else {
        start.x.min(end.x) - ELBOW_PADDING
    };
    vec![start, Point::new(x, start.y), Point::new(x, end.y), end]
}

/// Drop duplicate and exactly-collinear interior points, and merge interior
/// segments shorter than `min_length`. The first and last points are kept, so
/// a path of two or more points never shrinks below two.
pub fn simplify(points: &[Point], min_length: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let first = points[0];
    let last = points[points.len() - 1];
    let too_short = |a: Point, b: Point| a == b || (b - a).hypot() < min_length;

    let mut merged = vec![first];
    for &p in &points[1..points.len() - 1] {
        let prev = merged[merged.len() - 1];
        if !too_short(prev, p) {
            merged.push(p);
        }
    }
    while merged.len() > 1 && too_short(merged[merged.len() - 1], last) {
        merged.pop();
    }
    merged.push(last);

    let mut result = vec![first];
    for i in 1..merged.len() - 1 {
        let a = result[result.len() - 1];
        let b = merged[i];
        let c = merged[i + 1];
        if (b - a).cross(c - b) == 0.0 {
            continue;
        }
        result.push(b);
    }
    result.push(last);
    result
}
