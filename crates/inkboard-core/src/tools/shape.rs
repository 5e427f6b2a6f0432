//! Rectangle, ellipse and diamond creation.

use super::{Key, Overlay, Tool, ToolContext, ToolType};
use crate::element::{Element, ElementKind};
use crate::state::ToolResult;
use kurbo::{Point, Rect, Vec2};

/// Drags out a box-shaped element.
#[derive(Debug, Clone)]
pub struct ShapeTool {
    tool: ToolType,
    start: Option<Point>,
    current: Point,
    /// Shift was held at pointer down.
    square: bool,
}

impl ShapeTool {
    pub fn new(tool: ToolType) -> Self {
        Self {
            tool,
            start: None,
            current: Point::ZERO,
            square: false,
        }
    }

    pub fn tool_type(&self) -> ToolType {
        self.tool
    }

    fn kind(&self) -> ElementKind {
        match self.tool {
            ToolType::Ellipse => ElementKind::Ellipse,
            ToolType::Diamond => ElementKind::Diamond,
            _ => ElementKind::Rectangle,
        }
    }

    fn drag_bounds(&self, start: Point) -> Rect {
        let mut end = self.current;
        if self.square {
            let d = end - start;
            let side = d.x.abs().max(d.y.abs());
            end = start + Vec2::new(side.copysign(d.x), side.copysign(d.y));
        }
        Rect::from_points(start, end)
    }
}

impl Tool for ShapeTool {
    fn on_pointer_down(&mut self, point: Point, _ctx: &ToolContext, shift: bool) -> Option<ToolResult> {
        self.start = Some(point);
        self.current = point;
        self.square = shift;
        None
    }

    fn on_pointer_move(&mut self, point: Point, _ctx: &ToolContext, _screen_delta: Vec2) -> Option<ToolResult> {
        if self.start.is_some() {
            self.current = point;
        }
        None
    }

    fn on_pointer_up(&mut self, point: Point, ctx: &ToolContext, _is_double_click: bool) -> Option<ToolResult> {
        let start = self.start.take()?;
        self.current = point;
        let bounds = self.drag_bounds(start);

        let min = ctx.config.min_element_size;
        if bounds.width() < min && bounds.height() < min {
            log::debug!("{:?} click without drag, nothing created", self.tool);
            return None;
        }

        let mut element = Element::new(self.kind(), bounds);
        element.style = ctx.style.reseeded();
        let id = element.id();
        ToolResult::compound(vec![
            ToolResult::AddElement(element),
            ToolResult::SetSelection(vec![id]),
            ToolResult::SwitchTool(ToolType::Select),
        ])
    }

    fn on_key_event(&mut self, key: Key, _shift: bool, _ctrl: bool, _ctx: &ToolContext) -> Option<ToolResult> {
        if key == Key::Escape {
            self.reset();
        }
        None
    }

    fn reset(&mut self) {
        self.start = None;
        self.square = false;
    }

    fn overlay(&self) -> Overlay {
        Overlay {
            creation_bounds: self.start.map(|start| self.drag_bounds(start)),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::element::{ElementType, Style};
    use crate::state::{EditorState, apply_result};

    fn run(tool: &mut ShapeTool, state: &EditorState, shift: bool, from: Point, to: Point) -> Option<ToolResult> {
        let style = Style::default();
        let config = EditorConfig::default();
        let ctx = ToolContext::new(state, &style, &config, 0.5);
        tool.on_pointer_down(from, &ctx, shift);
        tool.on_pointer_move(to, &ctx, Vec2::ZERO);
        tool.on_pointer_up(to, &ctx, false)
    }

    #[test]
    fn test_drag_creates_rectangle_and_returns_to_select() {
        let state = EditorState {
            active_tool: ToolType::Rectangle,
            ..Default::default()
        };
        let mut tool = ShapeTool::new(ToolType::Rectangle);
        let result = run(&mut tool, &state, false, Point::new(10.0, 20.0), Point::new(110.0, 70.0));
        let next = apply_result(&state, result.as_ref());

        let elements = next.scene.active_elements();
        assert_eq!(elements.len(), 1);
        let rect = elements[0];
        assert_eq!(rect.element_type(), ElementType::Rectangle);
        assert_eq!(rect.bounds(), Rect::new(10.0, 20.0, 110.0, 70.0));
        assert_eq!(next.selection.iter().copied().collect::<Vec<_>>(), vec![rect.id()]);
        assert_eq!(next.active_tool, ToolType::Select);
    }

    #[test]
    fn test_click_without_drag_creates_nothing() {
        let state = EditorState::default();
        let mut tool = ShapeTool::new(ToolType::Ellipse);
        let p = Point::new(40.0, 40.0);
        assert!(run(&mut tool, &state, false, p, p).is_none());
        assert!(tool.overlay().creation_bounds.is_none());
    }

    #[test]
    fn test_shift_constrains_to_square() {
        let state = EditorState::default();
        let mut tool = ShapeTool::new(ToolType::Diamond);
        let result = run(&mut tool, &state, true, Point::new(0.0, 0.0), Point::new(-30.0, 10.0));
        let next = apply_result(&state, result.as_ref());
        let diamond = next.scene.active_elements()[0];
        assert_eq!(diamond.element_type(), ElementType::Diamond);
        assert_eq!(diamond.bounds(), Rect::new(-30.0, 0.0, 0.0, 30.0));
    }

    #[test]
    fn test_locked_tool_stays_active() {
        let state = EditorState {
            active_tool: ToolType::Rectangle,
            tool_locked: true,
            ..Default::default()
        };
        let mut tool = ShapeTool::new(ToolType::Rectangle);
        let result = run(&mut tool, &state, false, Point::ZERO, Point::new(20.0, 20.0));
        let next = apply_result(&state, result.as_ref());
        assert_eq!(next.active_tool, ToolType::Rectangle);
        assert_eq!(next.scene.active_elements().len(), 1);
    }

    #[test]
    fn test_up_without_down_is_noop() {
        let state = EditorState::default();
        let style = Style::default();
        let config = EditorConfig::default();
        let ctx = ToolContext::new(&state, &style, &config, 0.5);
        let mut tool = ShapeTool::new(ToolType::Rectangle);
        assert!(tool.on_pointer_up(Point::new(5.0, 5.0), &ctx, false).is_none());
    }
}
