//! Line and arrow creation.

use super::{Key, Overlay, Tool, ToolContext, ToolType};
use crate::binding::{bind_arrow_endpoint, find_bind_target, route_elbowed};
use crate::element::{Element, ElementId, Endpoint};
use crate::state::ToolResult;
use kurbo::{Point, Vec2};

/// Multi-click polyline builder.
///
/// Every click appends a vertex; double-click or Enter finishes. A single
/// press-drag-release creates a one-segment element. Arrows bind their ends
/// to shapes under or near them.
#[derive(Debug, Clone)]
pub struct LinearTool {
    tool: ToolType,
    points: Vec<Point>,
    /// Pointer position following the cursor.
    live: Option<Point>,
    /// Where the first press happened, until its release.
    press_origin: Option<Point>,
    bind_target: Option<ElementId>,
}

impl LinearTool {
    pub fn new(tool: ToolType) -> Self {
        Self {
            tool,
            points: Vec::new(),
            live: None,
            press_origin: None,
            bind_target: None,
        }
    }

    pub fn tool_type(&self) -> ToolType {
        self.tool
    }

    fn is_arrow(&self) -> bool {
        self.tool == ToolType::Arrow
    }

    fn track_bind_target(&mut self, point: Point, ctx: &ToolContext) {
        self.bind_target = if self.is_arrow() {
            find_bind_target(ctx.scene, point, ctx.config.bind_snap_radius, &[]).map(|e| e.id())
        } else {
            None
        };
    }

    fn finish(&mut self, ctx: &ToolContext) -> Option<ToolResult> {
        let points = std::mem::take(&mut self.points);
        self.reset();
        if points.len() < 2 {
            log::debug!("{:?} finished with {} point(s), nothing created", self.tool, points.len());
            return None;
        }
        self.build(points, ctx)
    }

    fn build(&self, points: Vec<Point>, ctx: &ToolContext) -> Option<ToolResult> {
        let first = *points.first()?;
        let last = *points.last()?;
        let mut element = if self.is_arrow() {
            Element::arrow(points)
        } else {
            Element::line(points)
        };
        element.style = ctx.style.reseeded();

        let mut targets: Vec<Element> = Vec::new();
        if self.is_arrow() {
            for (end, point) in [(Endpoint::Start, first), (Endpoint::End, last)] {
                let Some(found) = find_bind_target(ctx.scene, point, ctx.config.bind_snap_radius, &[])
                else {
                    continue;
                };
                let mut target = match targets.iter().position(|t| t.id() == found.id()) {
                    Some(i) => targets.remove(i),
                    None => found.clone(),
                };
                bind_arrow_endpoint(&mut element, end, &mut target, point);
                targets.push(target);
            }

            if ctx.config.elbowed_arrows {
                route_elbowed(&mut element);
            }
        }

        let id = element.id();
        let mut results = vec![ToolResult::AddElement(element)];
        results.extend(targets.into_iter().map(ToolResult::UpdateElement));
        results.push(ToolResult::SetSelection(vec![id]));
        results.push(ToolResult::SwitchTool(ToolType::Select));
        ToolResult::compound(results)
    }
}

impl Tool for LinearTool {
    fn on_pointer_down(&mut self, point: Point, ctx: &ToolContext, _shift: bool) -> Option<ToolResult> {
        if self.points.is_empty() {
            self.points.push(point);
            self.press_origin = Some(point);
        }
        self.live = Some(point);
        self.track_bind_target(point, ctx);
        None
    }

    fn on_pointer_move(&mut self, point: Point, ctx: &ToolContext, _screen_delta: Vec2) -> Option<ToolResult> {
        if self.points.is_empty() {
            return None;
        }
        self.live = Some(point);
        self.track_bind_target(point, ctx);
        None
    }

    fn on_pointer_up(&mut self, point: Point, ctx: &ToolContext, is_double_click: bool) -> Option<ToolResult> {
        let last = *self.points.last()?;
        let min = ctx.config.min_element_size;

        if let Some(origin) = self.press_origin.take() {
            if (point - origin).hypot() >= min {
                self.points.push(point);
                return self.finish(ctx);
            }
            return None;
        }

        if (point - last).hypot() >= min {
            self.points.push(point);
        }
        if is_double_click {
            return self.finish(ctx);
        }
        None
    }

    fn on_key_event(&mut self, key: Key, _shift: bool, _ctrl: bool, ctx: &ToolContext) -> Option<ToolResult> {
        match key {
            Key::Enter => self.finish(ctx),
            Key::Escape => {
                self.reset();
                None
            }
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.points.clear();
        self.live = None;
        self.press_origin = None;
        self.bind_target = None;
    }

    fn overlay(&self) -> Overlay {
        let mut points = self.points.clone();
        if let Some(live) = self.live {
            if points.last() != Some(&live) {
                points.push(live);
            }
        }
        Overlay {
            points,
            bind_target: self.bind_target,
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
    use kurbo::Rect;

    struct Fixture {
        state: EditorState,
        style: Style,
        config: EditorConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                state: EditorState::default(),
                style: Style::default(),
                config: EditorConfig::default(),
            }
        }

        fn ctx(&self) -> ToolContext<'_> {
            ToolContext::new(&self.state, &self.style, &self.config, 0.5)
        }

        fn click(&self, tool: &mut LinearTool, p: Point, double: bool) -> Option<ToolResult> {
            let ctx = self.ctx();
            tool.on_pointer_down(p, &ctx, false);
            tool.on_pointer_up(p, &ctx, double)
        }

        fn drag(&self, tool: &mut LinearTool, from: Point, to: Point) -> Option<ToolResult> {
            let ctx = self.ctx();
            tool.on_pointer_down(from, &ctx, false);
            tool.on_pointer_move(to, &ctx, Vec2::ZERO);
            tool.on_pointer_up(to, &ctx, false)
        }
    }

    #[test]
    fn test_multi_click_line() {
        let fx = Fixture::new();
        let mut tool = LinearTool::new(ToolType::Line);
        assert!(fx.click(&mut tool, Point::new(0.0, 0.0), false).is_none());
        assert!(fx.click(&mut tool, Point::new(50.0, 0.0), false).is_none());
        assert!(fx.click(&mut tool, Point::new(50.0, 50.0), false).is_none());
        assert_eq!(tool.overlay().points.len(), 3);
        let result = fx.click(&mut tool, Point::new(50.0, 50.0), true);

        let next = apply_result(&fx.state, result.as_ref());
        let line = next.scene.active_elements()[0];
        assert_eq!(line.element_type(), ElementType::Line);
        assert_eq!(
            line.absolute_points(),
            vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0), Point::new(50.0, 50.0)]
        );
        assert_eq!(next.active_tool, ToolType::Select);
        assert!(tool.overlay().points.is_empty());
    }

    #[test]
    fn test_drag_creates_single_segment() {
        let fx = Fixture::new();
        let mut tool = LinearTool::new(ToolType::Arrow);
        let result = fx.drag(&mut tool, Point::new(0.0, 0.0), Point::new(100.0, 40.0));
        let next = apply_result(&fx.state, result.as_ref());
        let arrow = next.scene.active_elements()[0];
        assert_eq!(arrow.element_type(), ElementType::Arrow);
        assert_eq!(arrow.linear().unwrap().points.len(), 2);
        assert!(arrow.linear().unwrap().start_binding.is_none());
    }

    #[test]
    fn test_escape_cancels() {
        let fx = Fixture::new();
        let mut tool = LinearTool::new(ToolType::Line);
        fx.click(&mut tool, Point::new(0.0, 0.0), false);
        fx.click(&mut tool, Point::new(30.0, 0.0), false);
        assert!(tool.on_key_event(Key::Escape, false, false, &fx.ctx()).is_none());
        assert!(tool.overlay().points.is_empty());
        assert!(tool.on_key_event(Key::Enter, false, false, &fx.ctx()).is_none());
    }

    #[test]
    fn test_enter_finishes() {
        let fx = Fixture::new();
        let mut tool = LinearTool::new(ToolType::Line);
        fx.click(&mut tool, Point::new(0.0, 0.0), false);
        fx.click(&mut tool, Point::new(30.0, 0.0), false);
        let result = tool.on_key_event(Key::Enter, false, false, &fx.ctx());
        assert!(result.is_some_and(|r| r.is_scene_changing()));
    }

    #[test]
    fn test_arrow_binds_both_ends() {
        let mut fx = Fixture::new();
        let a = fx.state.scene.add_element(Element::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
        let b = fx.state.scene.add_element(Element::rectangle(Rect::new(200.0, 0.0, 250.0, 50.0)));
        let mut tool = LinearTool::new(ToolType::Arrow);

        {
            let ctx = fx.ctx();
            tool.on_pointer_down(Point::new(55.0, 25.0), &ctx, false);
            tool.on_pointer_move(Point::new(195.0, 25.0), &ctx, Vec2::ZERO);
        }
        assert_eq!(tool.overlay().bind_target, Some(b));
        let result = tool.on_pointer_up(Point::new(195.0, 25.0), &fx.ctx(), false);

        let next = apply_result(&fx.state, result.as_ref());
        let arrow_id = *next.selection.iter().next().unwrap();
        let arrow = next.scene.get_by_id(arrow_id).unwrap();
        let data = arrow.linear().unwrap();
        assert_eq!(data.start_binding.map(|b| b.element_id), Some(a));
        assert_eq!(data.end_binding.map(|b| b.element_id), Some(b));
        assert_eq!(
            arrow.absolute_points(),
            vec![Point::new(50.0, 25.0), Point::new(200.0, 25.0)]
        );
        assert!(next.scene.get_by_id(a).unwrap().has_bound_element(arrow_id));
        assert!(next.scene.get_by_id(b).unwrap().has_bound_element(arrow_id));
    }

    #[test]
    fn test_elbowed_arrow_is_orthogonal() {
        let mut fx = Fixture::new();
        fx.config.elbowed_arrows = true;
        fx.state.scene.add_element(Element::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
        fx.state.scene.add_element(Element::rectangle(Rect::new(200.0, 200.0, 250.0, 250.0)));
        let mut tool = LinearTool::new(ToolType::Arrow);
        let result = fx.drag(&mut tool, Point::new(55.0, 25.0), Point::new(225.0, 195.0));

        let next = apply_result(&fx.state, result.as_ref());
        let arrow_id = *next.selection.iter().next().unwrap();
        let arrow = next.scene.get_by_id(arrow_id).unwrap();
        assert!(arrow.linear().unwrap().elbowed);
        let points = arrow.absolute_points();
        assert_eq!(points.first(), Some(&Point::new(50.0, 25.0)));
        assert_eq!(points.last(), Some(&Point::new(225.0, 200.0)));
        for w in points.windows(2) {
            assert!((w[0].x - w[1].x).abs() < 1e-9 || (w[0].y - w[1].y).abs() < 1e-9);
        }
    }
}
