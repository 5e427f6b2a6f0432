//! Drawable element values.
//!
//! Elements are plain values. Edits produce a replacement with a bumped version;
//! deletion sets a tombstone flag so an older scene snapshot can bring the exact
//! value back.

mod freedraw;
mod image;
mod linear;
mod style;
mod text;

pub use freedraw::{DEFAULT_PRESSURE, FreedrawData};
pub use self::image::{ImageData, ImageFormat};
pub use linear::{ArrowBinding, Arrowhead, Endpoint, LinearData};
pub use style::{FillStyle, ROUGHNESS_ARCHITECT, ROUGHNESS_ARTIST, ROUGHNESS_CARTOONIST, Rgba, StrokeStyle, Style};
pub use text::{DEFAULT_FONT_SIZE, FontFamily, TextAlign, TextData, VerticalAlign};

use crate::files::FileId;
use crate::geometry::{
    points_bounds, point_to_polyline_dist, rect_contains,
    rects_intersect, rotated_bounds, to_local, to_world,
};
use crate::order_key::OrderKey;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Type tag of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Rectangle,
    Ellipse,
    Diamond,
    Line,
    Arrow,
    Freedraw,
    Text,
    Image,
}

impl ElementType {
    /// Arrows may attach to these.
    pub fn is_bindable(self) -> bool {
        matches!(self, Self::Rectangle | Self::Ellipse | Self::Diamond)
    }

    /// Line-family types edited through vertex handles.
    pub fn is_linear(self) -> bool {
        matches!(self, Self::Line | Self::Arrow)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Diamond => "diamond",
            Self::Line => "line",
            Self::Arrow => "arrow",
            Self::Freedraw => "freedraw",
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// Type-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Rectangle,
    Ellipse,
    Diamond,
    Line(LinearData),
    Arrow(LinearData),
    Freedraw(FreedrawData),
    Text(TextData),
    Image(ImageData),
}

impl ElementKind {
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementKind::Rectangle => ElementType::Rectangle,
            ElementKind::Ellipse => ElementType::Ellipse,
            ElementKind::Diamond => ElementType::Diamond,
            ElementKind::Line(_) => ElementType::Line,
            ElementKind::Arrow(_) => ElementType::Arrow,
            ElementKind::Freedraw(_) => ElementType::Freedraw,
            ElementKind::Text(_) => ElementType::Text,
            ElementKind::Image(_) => ElementType::Image,
        }
    }
}

/// Back-reference from a container to something bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundElement {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub element_type: ElementType,
}

/// A drawable element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub(crate) id: ElementId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in radians about the bounding-box center.
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub style: Style,
    /// Strictly increases on every content change.
    pub version: u32,
    #[serde(default)]
    pub is_deleted: bool,
    /// Ordering key; assigned by the scene when missing.
    #[serde(default)]
    pub index: Option<OrderKey>,
    #[serde(default)]
    pub bound_elements: Vec<BoundElement>,
    /// Container of a bound text label.
    #[serde(default)]
    pub container_id: Option<ElementId>,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// Create an element with a fresh id occupying `bounds`.
    pub fn new(kind: ElementKind, bounds: Rect) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: bounds.x0,
            y: bounds.y0,
            width: bounds.width(),
            height: bounds.height(),
            angle: 0.0,
            style: Style::default(),
            version: 1,
            is_deleted: false,
            index: None,
            bound_elements: Vec::new(),
            container_id: None,
            kind,
        }
    }

    pub fn rectangle(bounds: Rect) -> Self {
        Self::new(ElementKind::Rectangle, bounds)
    }

    pub fn ellipse(bounds: Rect) -> Self {
        Self::new(ElementKind::Ellipse, bounds)
    }

    pub fn diamond(bounds: Rect) -> Self {
        Self::new(ElementKind::Diamond, bounds)
    }

    /// A line through absolute points.
    pub fn line(points: Vec<Point>) -> Self {
        let mut element = Self::new(ElementKind::Line(LinearData::default()), Rect::ZERO);
        element.set_absolute_points(points);
        element
    }

    /// An arrow through absolute points.
    pub fn arrow(points: Vec<Point>) -> Self {
        let data = LinearData {
            end_arrowhead: Some(Arrowhead::Arrow),
            ..Default::default()
        };
        let mut element = Self::new(ElementKind::Arrow(data), Rect::ZERO);
        element.set_absolute_points(points);
        element
    }

    /// A freehand stroke from absolute samples.
    pub fn freedraw(points: Vec<Point>, pressures: Vec<f64>) -> Self {
        let data = FreedrawData::new(points.clone(), pressures);
        let mut element = Self::new(ElementKind::Freedraw(data), Rect::ZERO);
        element.set_absolute_points(points);
        element
    }

    /// A text element with its top-left corner at `position`.
    pub fn text(position: Point, text: impl Into<String>) -> Self {
        let data = TextData::new(text);
        let size = data.estimated_size();
        Self::new(
            ElementKind::Text(data),
            Rect::from_origin_size(position, size),
        )
    }

    /// An image element showing the file `file_id`.
    pub fn image(file_id: FileId, bounds: Rect) -> Self {
        Self::new(ElementKind::Image(ImageData::new(file_id)), bounds)
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    /// Give the element another identity (duplicate/paste).
    pub(crate) fn set_id(&mut self, id: ElementId) {
        self.id = id;
    }

    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    pub fn is_linear(&self) -> bool {
        self.element_type().is_linear()
    }

    pub fn is_bindable(&self) -> bool {
        self.element_type().is_bindable()
    }

    /// Text attached to a container.
    pub fn is_bound_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text(_)) && self.container_id.is_some()
    }

    /// Not tombstoned.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Unrotated bounds.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Axis-aligned bounds in world space, including rotation.
    pub fn world_bounds(&self) -> Rect {
        match self.point_list() {
            Some(_) => points_bounds(self.absolute_points()).unwrap_or_else(|| self.bounds()),
            None => rotated_bounds(self.bounds(), self.angle),
        }
    }

    pub fn linear(&self) -> Option<&LinearData> {
        match &self.kind {
            ElementKind::Line(data) | ElementKind::Arrow(data) => Some(data),
            _ => None,
        }
    }

    pub fn linear_mut(&mut self) -> Option<&mut LinearData> {
        match &mut self.kind {
            ElementKind::Line(data) | ElementKind::Arrow(data) => Some(data),
            _ => None,
        }
    }

    pub fn text_data(&self) -> Option<&TextData> {
        match &self.kind {
            ElementKind::Text(data) => Some(data),
            _ => None,
        }
    }

    pub fn freedraw_data(&self) -> Option<&FreedrawData> {
        match &self.kind {
            ElementKind::Freedraw(data) => Some(data),
            _ => None,
        }
    }

    fn point_list(&self) -> Option<&[Point]> {
        match &self.kind {
            ElementKind::Line(data) | ElementKind::Arrow(data) => Some(&data.points),
            ElementKind::Freedraw(data) => Some(&data.points),
            _ => None,
        }
    }

    fn point_list_mut(&mut self) -> Option<&mut Vec<Point>> {
        match &mut self.kind {
            ElementKind::Line(data) | ElementKind::Arrow(data) => Some(&mut data.points),
            ElementKind::Freedraw(data) => Some(&mut data.points),
            _ => None,
        }
    }

    /// Points of a line, arrow or freedraw in world coordinates.
    pub fn absolute_points(&self) -> Vec<Point> {
        let center = self.center();
        let origin = Vec2::new(self.x, self.y);
        self.point_list()
            .map(|points| {
                points
                    .iter()
                    .map(|&p| to_world(p + origin, center, self.angle))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace the points with absolute ones and re-origin the element so every
    /// stored coordinate is relative and non-negative. Rotation is baked in.
    pub fn set_absolute_points(&mut self, points: Vec<Point>) {
        let Some(bounds) = points_bounds(points.iter().copied()) else {
            return;
        };
        let origin = Vec2::new(bounds.x0, bounds.y0);
        if let Some(list) = self.point_list_mut() {
            *list = points.into_iter().map(|p| p - origin).collect();
        } else {
            return;
        }
        self.x = bounds.x0;
        self.y = bounds.y0;
        self.width = bounds.width();
        self.height = bounds.height();
        self.angle = 0.0;
    }

    /// Fit the element into `bounds` (unrotated frame), scaling any stored
    /// points with it.
    pub fn set_bounds(&mut self, bounds: Rect) {
        let sx = if self.width > 0.0 { bounds.width() / self.width } else { 1.0 };
        let sy = if self.height > 0.0 { bounds.height() / self.height } else { 1.0 };
        if let Some(points) = self.point_list_mut() {
            for p in points.iter_mut() {
                *p = Point::new(p.x * sx, p.y * sy);
            }
        }
        self.x = bounds.x0;
        self.y = bounds.y0;
        self.width = bounds.width();
        self.height = bounds.height();
    }

    /// Move by `delta` in place.
    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// A copy moved by `delta`.
    pub fn translated(&self, delta: Vec2) -> Self {
        let mut moved = self.clone();
        moved.translate(delta);
        moved
    }

    /// Whether `point` (world) hits the element within `tolerance`.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if self.point_list().is_some() {
            let reach = tolerance + self.style.stroke_width / 2.0;
            return point_to_polyline_dist(point, &self.absolute_points()) <= reach;
        }

        let local = to_local(point, self.center(), self.angle);
        let half_w = self.width / 2.0 + tolerance;
        let half_h = self.height / 2.0 + tolerance;
        let d = local - self.center();
        match self.kind {
            ElementKind::Ellipse => {
                if half_w <= 0.0 || half_h <= 0.0 {
                    return false;
                }
                (d.x / half_w).powi(2) + (d.y / half_h).powi(2) <= 1.0
            }
            ElementKind::Diamond => {
                if half_w <= 0.0 || half_h <= 0.0 {
                    return false;
                }
                d.x.abs() / half_w + d.y.abs() / half_h <= 1.0
            }
            _ => rect_contains(self.bounds().inflate(tolerance, tolerance), local),
        }
    }

    /// Whether the element's world bounds overlap a world-space rectangle.
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        rects_intersect(self.world_bounds(), rect)
    }

    pub fn has_bound_element(&self, id: ElementId) -> bool {
        self.bound_elements.iter().any(|b| b.id == id)
    }

    /// Add a back-reference. Returns false if it was already present.
    pub fn add_bound_element(&mut self, id: ElementId, element_type: ElementType) -> bool {
        if self.has_bound_element(id) {
            return false;
        }
        self.bound_elements.push(BoundElement { id, element_type });
        true
    }

    /// Remove a back-reference. Returns false if it was absent.
    pub fn remove_bound_element(&mut self, id: ElementId) -> bool {
        let before = self.bound_elements.len();
        self.bound_elements.retain(|b| b.id != id);
        before != self.bound_elements.len()
    }

    /// Ids of bound children of one type.
    pub fn bound_ids(&self, element_type: ElementType) -> impl Iterator<Item = ElementId> + '_ {
        self.bound_elements
            .iter()
            .filter(move |b| b.element_type == element_type)
            .map(|b| b.id)
    }
}
