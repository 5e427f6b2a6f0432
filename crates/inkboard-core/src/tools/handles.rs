//! Selection handles and the resize/rotate math behind them.

use crate::element::Element;
use crate::geometry::{normalize_angle, to_local, to_world};
use kurbo::{Point, Rect};
use std::f64::consts::PI;

/// Distance from the top edge to the rotation handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// Rotation snap increment when shift is held.
const ROTATION_SNAP: f64 = PI / 12.0;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// A point of a line or arrow.
    Vertex(usize),
    Corner(Corner),
    Edge(Edge),
    Rotate,
}

impl HandleKind {
    /// Which sides of the box this handle drags: (left, top, right, bottom).
    fn sides(self) -> (bool, bool, bool, bool) {
        match self {
            HandleKind::Corner(Corner::TopLeft) => (true, true, false, false),
            HandleKind::Corner(Corner::TopRight) => (false, true, true, false),
            HandleKind::Corner(Corner::BottomLeft) => (true, false, false, true),
            HandleKind::Corner(Corner::BottomRight) => (false, false, true, true),
            HandleKind::Edge(Edge::Top) => (false, true, false, false),
            HandleKind::Edge(Edge::Right) => (false, false, true, false),
            HandleKind::Edge(Edge::Bottom) => (false, false, false, true),
            HandleKind::Edge(Edge::Left) => (true, false, false, false),
            HandleKind::Vertex(_) | HandleKind::Rotate => (false, false, false, false),
        }
    }
}

/// A selection handle with its world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

/// Handle positions in the element's unrotated frame.
fn local_handles(bounds: Rect, rotate_offset: f64) -> [(Point, HandleKind); 9] {
    let c = bounds.center();
    [
        (Point::new(c.x, bounds.y0 - rotate_offset), HandleKind::Rotate),
        (Point::new(bounds.x0, bounds.y0), HandleKind::Corner(Corner::TopLeft)),
        (Point::new(bounds.x1, bounds.y0), HandleKind::Corner(Corner::TopRight)),
        (Point::new(bounds.x0, bounds.y1), HandleKind::Corner(Corner::BottomLeft)),
        (Point::new(bounds.x1, bounds.y1), HandleKind::Corner(Corner::BottomRight)),
        (Point::new(c.x, bounds.y0), HandleKind::Edge(Edge::Top)),
        (Point::new(bounds.x1, c.y), HandleKind::Edge(Edge::Right)),
        (Point::new(c.x, bounds.y1), HandleKind::Edge(Edge::Bottom)),
        (Point::new(bounds.x0, c.y), HandleKind::Edge(Edge::Left)),
    ]
}

/// Handles of a selected element in world coordinates.
pub fn get_handles(element: &Element, zoom: f64) -> Vec<Handle> {
    if element.is_linear() {
        return element
            .absolute_points()
            .into_iter()
            .enumerate()
            .map(|(i, position)| Handle {
                position,
                kind: HandleKind::Vertex(i),
            })
            .collect();
    }
    let center = element.center();
    local_handles(element.bounds(), ROTATE_HANDLE_OFFSET / zoom)
        .into_iter()
        .map(|(p, kind)| Handle {
            position: to_world(p, center, element.angle),
            kind,
        })
        .collect()
}

/// Find the handle under `point`. Box handles are tested in the element's
/// unrotated frame.
pub fn hit_test_handles(element: &Element, point: Point, tolerance: f64, zoom: f64) -> Option<HandleKind> {
    if element.is_linear() {
        return element
            .absolute_points()
            .into_iter()
            .position(|p| (p - point).hypot() <= tolerance)
            .map(HandleKind::Vertex);
    }
    let local = to_local(point, element.center(), element.angle);
    local_handles(element.bounds(), ROTATE_HANDLE_OFFSET / zoom)
        .into_iter()
        .find(|(p, _)| (*p - local).hypot() <= tolerance)
        .map(|(_, kind)| kind)
}

/// Resize `original` by dragging `handle` to the world point `pointer`.
///
/// The dragged sides follow the pointer in the element's local frame and are
/// clamped to `min_size`. The opposite sides stay fixed in world space.
pub fn apply_resize(original: &Element, handle: HandleKind, pointer: Point, min_size: f64) -> Element {
    let bounds = original.bounds();
    let center = bounds.center();
    let local = to_local(pointer, center, original.angle);
    let (left, top, right, bottom) = handle.sides();

    let mut b = bounds;
    if left {
        b.x0 = local.x.min(b.x1 - min_size);
    }
    if right {
        b.x1 = local.x.max(b.x0 + min_size);
    }
    if top {
        b.y0 = local.y.min(b.y1 - min_size);
    }
    if bottom {
        b.y1 = local.y.max(b.y0 + min_size);
    }

    // The new center, expressed in the old frame, lands where the fixed
    // sides stay put.
    let world_center = to_world(b.center(), center, original.angle);
    let mut resized = original.clone();
    resized.set_bounds(Rect::from_center_size(world_center, b.size()));
    resized
}

/// Rotate `original` by the angle swept from `start` to `pointer` about its
/// center. With `snap` the result is rounded to 15 degree steps.
pub fn apply_rotation(original: &Element, start: Point, pointer: Point, snap: bool) -> Element {
    let center = original.center();
    let from = start - center;
    let to = pointer - center;
    let delta = to.y.atan2(to.x) - from.y.atan2(from.x);
    let mut angle = normalize_angle(original.angle + delta);
    if snap {
        angle = normalize_angle((angle / ROTATION_SNAP).round() * ROTATION_SNAP);
    }
    let mut rotated = original.clone();
    rotated.angle = angle;
    rotated
}
