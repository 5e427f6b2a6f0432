//! Panning.

use super::{Key, Overlay, Tool, ToolContext};
use crate::state::ToolResult;
use kurbo::{Point, Vec2};

/// Pans the viewport while the pointer is held. Never touches the scene.
#[derive(Debug, Clone, Default)]
pub struct HandTool {
    panning: bool,
}

impl HandTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for HandTool {
    fn on_pointer_down(&mut self, _point: Point, _ctx: &ToolContext, _shift: bool) -> Option<ToolResult> {
        self.panning = true;
        None
    }

    fn on_pointer_move(&mut self, _point: Point, ctx: &ToolContext, screen_delta: Vec2) -> Option<ToolResult> {
        if !self.panning || screen_delta == Vec2::ZERO {
            return None;
        }
        Some(ToolResult::UpdateViewport(ctx.viewport.panned(screen_delta)))
    }

    fn on_pointer_up(&mut self, _point: Point, _ctx: &ToolContext, _is_double_click: bool) -> Option<ToolResult> {
        self.panning = false;
        None
    }

    fn on_key_event(&mut self, _key: Key, _shift: bool, _ctrl: bool, _ctx: &ToolContext) -> Option<ToolResult> {
        None
    }

    fn reset(&mut self) {
        self.panning = false;
    }

    fn overlay(&self) -> Overlay {
        Overlay::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::element::Style;
    use crate::state::{EditorState, apply_result};

    #[test]
    fn test_pan_scales_by_zoom() {
        let mut state = EditorState::default();
        state.viewport.set_zoom(2.0);
        let style = Style::default();
        let config = EditorConfig::default();
        let mut tool = HandTool::new();

        let ctx = ToolContext::new(&state, &style, &config, 0.5);
        assert!(tool.on_pointer_move(Point::ZERO, &ctx, Vec2::new(10.0, 0.0)).is_none());
        tool.on_pointer_down(Point::ZERO, &ctx, false);
        let result = tool.on_pointer_move(Point::ZERO, &ctx, Vec2::new(10.0, -4.0));
        assert!(!result.as_ref().is_some_and(|r| r.is_scene_changing()));

        let next = apply_result(&state, result.as_ref());
        assert!((next.viewport.offset.x - 5.0).abs() < f64::EPSILON);
        assert!((next.viewport.offset.y + 2.0).abs() < f64::EPSILON);
        assert!(next.scene.ptr_eq(&state.scene));
    }
}
