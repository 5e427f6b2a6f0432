//! Viewport: scroll offset and zoom.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_ZOOM: f64 = 0.1;
pub const DEFAULT_MAX_ZOOM: f64 = 10.0;

/// View transform of the canvas.
///
/// `offset` is a scroll in world units: `screen = (world + offset) * zoom`.
/// Zoom is always clamped to `[min_zoom, max_zoom]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub offset: Vec2,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A viewport with a custom zoom range. The range is normalized so
    /// `min <= max`.
    pub fn with_zoom_range(min_zoom: f64, max_zoom: f64) -> Self {
        let (min_zoom, max_zoom) = if min_zoom <= max_zoom {
            (min_zoom, max_zoom)
        } else {
            (max_zoom, min_zoom)
        };
        Self {
            zoom: 1.0_f64.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
            ..Self::default()
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_range(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    /// Set the zoom, clamped to the allowed range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// World-to-screen transform for rendering.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::translate(self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        Point::new(
            screen_point.x / self.zoom - self.offset.x,
            screen_point.y / self.zoom - self.offset.y,
        )
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        Point::new(
            (world_point.x + self.offset.x) * self.zoom,
            (world_point.y + self.offset.y) * self.zoom,
        )
    }

    /// Convert a screen-space length into world units.
    pub fn screen_to_world_len(&self, length: f64) -> f64 {
        length / self.zoom
    }

    /// Pan by a delta in screen coordinates.
    pub fn panned(&self, screen_delta: Vec2) -> Self {
        let mut next = *self;
        next.offset += screen_delta / self.zoom;
        next
    }

    /// Zoom by `factor`, keeping the given screen point fixed.
    pub fn zoomed_at(&self, screen_point: Point, factor: f64) -> Self {
        let mut next = *self;
        let world_point = self.screen_to_world(screen_point);
        next.set_zoom(self.zoom * factor);
        if (next.zoom - self.zoom).abs() < f64::EPSILON {
            return next;
        }
        // Keep world_point under screen_point.
        next.offset = Vec2::new(
            screen_point.x / next.zoom - world_point.x,
            screen_point.y / next.zoom - world_point.y,
        );
        next
    }

    /// Fit the view to show `bounds` inside a screen of size `viewport`.
    pub fn fitted_to(&self, bounds: Rect, viewport: Size, padding: f64) -> Self {
        let mut next = *self;
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            next.offset = Vec2::new(
                viewport.width / (2.0 * next.zoom) - bounds.center().x,
                viewport.height / (2.0 * next.zoom) - bounds.center().y,
            );
            return next;
        }

        let padded = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let scale_x = padded.width / bounds.width();
        let scale_y = padded.height / bounds.height();
        next.set_zoom(scale_x.min(scale_y));

        // Center the bounds in the viewport
        let center = bounds.center();
        next.offset = Vec2::new(
            viewport.width / (2.0 * next.zoom) - center.x,
            viewport.height / (2.0 * next.zoom) - center.y,
        );
        next
    }

    /// World-space point at the middle of a screen of the given size.
    pub fn visible_center(&self, viewport: Size) -> Point {
        self.screen_to_world(Point::new(viewport.width / 2.0, viewport.height / 2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::new();
        assert_eq!(viewport.offset, Vec2::ZERO);
        assert!((viewport.zoom() - 1.0).abs() < f64::EPSILON);
        assert_eq!(viewport.zoom_range(), (0.1, 10.0));
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut viewport = Viewport::new();
        viewport.offset = Vec2::new(30.0, -20.0);
        viewport.set_zoom(1.5);

        let original = Point::new(123.0, 456.0);
        let world = viewport.screen_to_world(original);
        let back = viewport.world_to_screen(world);

        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_transform_matches_world_to_screen() {
        let mut viewport = Viewport::new();
        viewport.offset = Vec2::new(5.0, 7.0);
        viewport.set_zoom(2.0);
        let p = Point::new(10.0, 20.0);
        let a = viewport.transform() * p;
        let b = viewport.world_to_screen(p);
        assert!((a - b).hypot() < 1e-10);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut viewport = Viewport::new();
        viewport.set_zoom(0.001);
        assert!((viewport.zoom() - 0.1).abs() < f64::EPSILON);
        viewport.set_zoom(1000.0);
        assert!((viewport.zoom() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let viewport = Viewport::new();
        let anchor = Point::new(200.0, 100.0);
        let world = viewport.screen_to_world(anchor);
        let zoomed = viewport.zoomed_at(anchor, 2.0);
        let back = zoomed.world_to_screen(world);
        assert!((back - anchor).hypot() < 1e-9);
    }

    #[test]
    fn test_pan_divides_by_zoom() {
        let mut viewport = Viewport::new();
        viewport.set_zoom(2.0);
        let panned = viewport.panned(Vec2::new(10.0, 20.0));
        assert!((panned.offset.x - 5.0).abs() < f64::EPSILON);
        assert!((panned.offset.y - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_bounds_centers() {
        let viewport = Viewport::new();
        let fitted = viewport.fitted_to(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Size::new(400.0, 400.0),
            0.0,
        );
        assert!((fitted.zoom() - 4.0).abs() < 1e-9);
        let center = fitted.world_to_screen(Point::new(50.0, 50.0));
        assert!((center - Point::new(200.0, 200.0)).hypot() < 1e-9);
    }
}
