//! Freehand drawing.

use super::{Key, Overlay, Tool, ToolContext};
use crate::element::Element;
use crate::state::ToolResult;
use kurbo::{Point, Vec2};

/// Records a stroke while the pointer is held and commits it on release.
/// The tool stays active afterwards.
#[derive(Debug, Clone, Default)]
pub struct FreedrawTool {
    drawing: bool,
    points: Vec<Point>,
    pressures: Vec<f64>,
}

impl FreedrawTool {
    pub fn new() -> Self {
        Self::default()
    }

    fn sample(&mut self, point: Point, pressure: f64) {
        self.points.push(point);
        self.pressures.push(pressure.clamp(0.0, 1.0));
    }
}

impl Tool for FreedrawTool {
    fn on_pointer_down(&mut self, point: Point, ctx: &ToolContext, _shift: bool) -> Option<ToolResult> {
        self.reset();
        self.drawing = true;
        self.sample(point, ctx.pressure);
        None
    }

    fn on_pointer_move(&mut self, point: Point, ctx: &ToolContext, _screen_delta: Vec2) -> Option<ToolResult> {
        if self.drawing {
            self.sample(point, ctx.pressure);
        }
        None
    }

    fn on_pointer_up(&mut self, point: Point, ctx: &ToolContext, _is_double_click: bool) -> Option<ToolResult> {
        if !self.drawing {
            return None;
        }
        self.sample(point, ctx.pressure);
        let points = std::mem::take(&mut self.points);
        let pressures = std::mem::take(&mut self.pressures);
        self.drawing = false;

        log::debug!("freedraw stroke with {} samples", points.len());
        let mut element = Element::freedraw(points, pressures);
        element.style = ctx.style.reseeded();
        Some(ToolResult::AddElement(element))
    }

    fn on_key_event(&mut self, key: Key, _shift: bool, _ctrl: bool, _ctx: &ToolContext) -> Option<ToolResult> {
        if key == Key::Escape {
            self.reset();
        }
        None
    }

    fn reset(&mut self) {
        self.drawing = false;
        self.points.clear();
        self.pressures.clear();
    }

    fn overlay(&self) -> Overlay {
        Overlay {
            points: self.points.clone(),
            ..Default::default()
        }
    }
}
