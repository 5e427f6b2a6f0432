//! Editor: routes input to the active tool and applies what it returns.

use crate::clipboard::{ClipboardContent, ClipboardService, parse_clipboard, paste_result, serialize_elements};
use crate::config::EditorConfig;
use crate::element::{DEFAULT_PRESSURE, Element, ElementId, ElementKind, ElementType, Style};
use crate::history::History;
use crate::image::{ImageDecoder, ImageError, insert_image};
use crate::scene::Scene;
use crate::state::{EditorState, ToolResult, apply_result};
use crate::tools::{ActiveTool, Key, Overlay, Tool, ToolContext, ToolType, center_label};
use crate::viewport::Viewport;
use kurbo::{Point, Size, Vec2};
use std::collections::BTreeSet;

/// Padding around content when fitting the view, in screen pixels.
const FIT_PADDING: f64 = 40.0;

/// The editing core behind one open document.
///
/// Pointer positions are in screen coordinates; the editor converts them
/// through the viewport before handing them to the tool. History is recorded
/// once per gesture (pointer down to pointer up) and once per scene-changing
/// key command.
pub struct Editor {
    state: EditorState,
    history: History,
    tool: ActiveTool,
    config: EditorConfig,
    style: Style,
    pressure: f64,
    viewport_size: Size,
    pointer_held: bool,
    gesture_recorded: bool,
    last_pointer: Option<Point>,
    clipboard: Option<Box<dyn ClipboardService>>,
}

impl Editor {
    /// Create an editor for `scene`.
    pub fn new(scene: Scene, config: EditorConfig) -> Self {
        let mut state = EditorState::new(scene);
        state.viewport = Viewport::with_zoom_range(config.min_zoom, config.max_zoom);
        Self {
            history: History::new(config.max_history),
            tool: ActiveTool::new(state.active_tool),
            state,
            config,
            style: Style::default(),
            pressure: DEFAULT_PRESSURE,
            viewport_size: Size::new(1280.0, 800.0),
            pointer_held: false,
            gesture_recorded: false,
            last_pointer: None,
            clipboard: None,
        }
    }

    /// Mirror copies to a system clipboard and read pastes from it.
    pub fn with_clipboard(mut self, service: Box<dyn ClipboardService>) -> Self {
        self.clipboard = Some(service);
        self
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn scene(&self) -> &Scene {
        &self.state.scene
    }

    pub fn selection(&self) -> &BTreeSet<ElementId> {
        &self.state.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.state.viewport
    }

    pub fn active_tool(&self) -> ToolType {
        self.state.active_tool
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Preview state of the active tool.
    pub fn overlay(&self) -> Overlay {
        self.tool.overlay()
    }

    /// Switch tools, dropping any gesture in progress.
    pub fn set_tool(&mut self, tool: ToolType) {
        self.tool.reset();
        self.state.active_tool = tool;
        self.tool = ActiveTool::new(tool);
        log::debug!("tool: {:?}", tool);
    }

    pub fn set_tool_locked(&mut self, locked: bool) {
        self.state.tool_locked = locked;
    }

    /// Style given to newly created elements.
    pub fn set_style(&mut self, style: Style) {
        self.style = style;
    }

    /// Pressure of the next pointer samples, `0.0..=1.0`.
    pub fn set_pressure(&mut self, pressure: f64) {
        self.pressure = pressure.clamp(0.0, 1.0);
    }

    /// Size of the drawing surface in screen pixels.
    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport_size = size;
    }

    pub fn pointer_down(&mut self, screen: Point, shift: bool) {
        self.pointer_held = true;
        self.gesture_recorded = false;
        self.last_pointer = Some(screen);
        let world = self.state.viewport.screen_to_world(screen);
        let ctx = ToolContext::new(&self.state, &self.style, &self.config, self.pressure);
        let result = self.tool.on_pointer_down(world, &ctx, shift);
        self.dispatch(result, true);
    }

    pub fn pointer_move(&mut self, screen: Point) {
        let delta = self.last_pointer.map_or(Vec2::ZERO, |last| screen - last);
        self.last_pointer = Some(screen);
        let world = self.state.viewport.screen_to_world(screen);
        let ctx = ToolContext::new(&self.state, &self.style, &self.config, self.pressure);
        let result = self.tool.on_pointer_move(world, &ctx, delta);
        self.dispatch(result, self.pointer_held);
    }

    pub fn pointer_up(&mut self, screen: Point, is_double_click: bool) {
        self.last_pointer = Some(screen);
        let world = self.state.viewport.screen_to_world(screen);
        let ctx = ToolContext::new(&self.state, &self.style, &self.config, self.pressure);
        let result = self.tool.on_pointer_up(world, &ctx, is_double_click);
        self.dispatch(result, true);
        self.pointer_held = false;
        self.gesture_recorded = false;
    }

    pub fn key(&mut self, key: Key, shift: bool, ctrl: bool) {
        if ctrl && !self.pointer_held {
            if key.is_char('z') && !shift {
                self.undo();
                return;
            }
            if (key.is_char('z') && shift) || key.is_char('y') {
                self.redo();
                return;
            }
            if key.is_char('v') && self.paste_from_service() {
                return;
            }
        }

        let ctx = ToolContext::new(&self.state, &self.style, &self.config, self.pressure);
        let result = self.tool.on_key_event(key, shift, ctrl, &ctx);

        if key == Key::Escape && self.pointer_held {
            self.cancel_gesture();
            return;
        }
        if result.is_none() && !ctrl {
            if let Key::Char(c) = key {
                if let Some(tool) = ToolType::from_shortcut(c) {
                    self.set_tool(tool);
                    return;
                }
            }
        }
        self.dispatch(result, self.pointer_held);
    }

    /// Restore the scene from before the current gesture.
    fn cancel_gesture(&mut self) {
        if self.gesture_recorded {
            if let Some(scene) = self.history.discard_last() {
                self.state.scene = scene;
            }
        }
        self.gesture_recorded = false;
        log::debug!("gesture cancelled");
    }

    /// Returns false when nothing was undone.
    pub fn undo(&mut self) -> bool {
        self.tool.reset();
        match self.history.undo(self.state.scene.clone()) {
            Some(scene) => {
                self.state.scene = scene;
                true
            }
            None => false,
        }
    }

    /// Returns false when nothing was redone.
    pub fn redo(&mut self) -> bool {
        self.tool.reset();
        match self.history.redo(self.state.scene.clone()) {
            Some(scene) => {
                self.state.scene = scene;
                true
            }
            None => false,
        }
    }

    /// Apply a result produced outside the tools as one history step.
    pub fn apply(&mut self, result: ToolResult) {
        self.dispatch(Some(result), false);
    }

    /// Put `text` on a shape, replacing the text of an existing label.
    pub fn add_label(&mut self, container_id: ElementId, text: &str) -> Option<ElementId> {
        let container = self.state.scene.get_active(container_id)?;
        if !container.is_bindable() {
            return None;
        }

        if let Some(existing) = self.state.scene.find_bound_child(container_id) {
            let mut label = existing.clone();
            let size = match &mut label.kind {
                ElementKind::Text(data) => {
                    data.text = text.to_string();
                    data.estimated_size()
                }
                _ => return None,
            };
            label.width = size.width;
            label.height = size.height;
            let label = center_label(&label, container);
            let id = label.id();
            self.apply(ToolResult::UpdateElement(label));
            return Some(id);
        }

        let mut container = container.clone();
        let mut label = Element::text(Point::ZERO, text);
        label.style = self.style.reseeded();
        label.container_id = Some(container_id);
        let label = center_label(&label, &container);
        let id = label.id();
        container.add_bound_element(id, ElementType::Text);
        self.apply(ToolResult::Compound(vec![
            ToolResult::AddElement(label),
            ToolResult::UpdateElement(container),
        ]));
        Some(id)
    }

    /// Insert an image at the middle of the view.
    pub fn insert_image(
        &mut self,
        bytes: &[u8],
        mime_type: Option<&str>,
        decoder: &dyn ImageDecoder,
    ) -> Result<(), ImageError> {
        let center = self.state.viewport.visible_center(self.viewport_size);
        let result = insert_image(bytes, mime_type, center, decoder, self.config.max_image_size)?;
        self.set_tool(ToolType::Select);
        self.apply(result);
        Ok(())
    }

    /// Zoom by `factor` around a screen point.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        self.state.viewport = self.state.viewport.zoomed_at(screen, factor);
    }

    /// Pan by a screen-space delta.
    pub fn pan(&mut self, screen_delta: Vec2) {
        self.state.viewport = self.state.viewport.panned(screen_delta);
    }

    /// Frame every element. Does nothing on an empty scene.
    pub fn fit_to_content(&mut self) {
        if let Some(bounds) = self.state.scene.scene_bounds() {
            self.state.viewport = self.state.viewport.fitted_to(bounds, self.viewport_size, FIT_PADDING);
        }
    }

    /// Paste from the system clipboard. Returns false when the service is
    /// missing, empty or unreadable so the in-editor clipboard is used.
    fn paste_from_service(&mut self) -> bool {
        let Some(service) = self.clipboard.as_mut() else {
            return false;
        };
        let text = match service.read_text() {
            Ok(Some(text)) => text,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("clipboard read failed: {}", e);
                return false;
            }
        };
        let content = match parse_clipboard(&text) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("ignoring clipboard contents: {}", e);
                return false;
            }
        };

        let anchor = self.last_pointer.map(|p| self.state.viewport.screen_to_world(p));
        let result = match content {
            ClipboardContent::Elements { elements, files } => {
                let bounds = elements.iter().map(|e| e.world_bounds()).reduce(|a, b| a.union(b));
                let offset = match (anchor, bounds) {
                    (Some(anchor), Some(bounds)) => anchor - bounds.center(),
                    _ => Vec2::splat(self.config.duplicate_offset),
                };
                paste_result(&elements, files, offset)
            }
            ClipboardContent::Text(text) => {
                if text.trim().is_empty() {
                    return false;
                }
                let at = anchor.unwrap_or_else(|| self.state.viewport.visible_center(self.viewport_size));
                let mut element = Element::text(at, text);
                element.style = self.style.reseeded();
                let id = element.id();
                ToolResult::compound(vec![
                    ToolResult::AddElement(element),
                    ToolResult::SetSelection(vec![id]),
                ])
            }
        };
        self.dispatch(result, false);
        true
    }

    /// Record history if needed, reduce, and follow tool switches.
    fn dispatch(&mut self, result: Option<ToolResult>, in_gesture: bool) {
        let Some(result) = result else {
            return;
        };
        if result.is_scene_changing() {
            if !in_gesture || !self.gesture_recorded {
                self.history.push(self.state.scene.clone());
            }
            if in_gesture {
                self.gesture_recorded = true;
            }
        }

        let previous_tool = self.state.active_tool;
        self.state = apply_result(&self.state, Some(&result));

        if result.sets_clipboard() {
            self.mirror_clipboard();
        }
        if self.state.active_tool != previous_tool {
            self.tool = ActiveTool::new(self.state.active_tool);
            log::debug!("tool: {:?} -> {:?}", previous_tool, self.state.active_tool);
        }
    }

    fn mirror_clipboard(&mut self) {
        let Some(service) = self.clipboard.as_mut() else {
            return;
        };
        let copied = serialize_elements(&self.state.clipboard, &self.state.scene)
            .and_then(|text| service.copy_text(&text));
        if let Err(e) = copied {
            log::warn!("clipboard write failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use kurbo::Rect;

    fn editor() -> Editor {
        Editor::new(Scene::new(), EditorConfig::default())
    }

    fn drag(editor: &mut Editor, from: Point, to: Point) {
        editor.pointer_down(from, false);
        editor.pointer_move(Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0));
        editor.pointer_move(to);
        editor.pointer_up(to, false);
    }

    #[test]
    fn test_rectangle_scenario() {
        let mut editor = editor();
        editor.set_tool(ToolType::Rectangle);
        drag(&mut editor, Point::new(10.0, 20.0), Point::new(110.0, 70.0));

        let elements = editor.scene().active_elements();
        assert_eq!(elements.len(), 1);
        let rect = elements[0];
        assert_eq!(rect.element_type(), ElementType::Rectangle);
        assert_eq!(rect.bounds(), Rect::new(10.0, 20.0, 110.0, 70.0));
        assert_eq!(editor.selection(), &BTreeSet::from([rect.id()]));
        assert_eq!(editor.active_tool(), ToolType::Select);
        assert_eq!(editor.history().undo_len(), 1);
    }

    #[test]
    fn test_drag_scenario_records_one_step() {
        let mut editor = editor();
        let id = editor.state.scene.add_element(Element::rectangle(Rect::new(10.0, 20.0, 110.0, 70.0)));
        let before = editor.scene().clone();
        editor.pointer_down(Point::new(50.0, 40.0), false);
        for i in 1..=10 {
            let t = i as f64 / 10.0;
            editor.pointer_move(Point::new(50.0 + 30.0 * t, 40.0 + 20.0 * t));
        }
        editor.pointer_up(Point::new(80.0, 60.0), false);

        let moved = editor.scene().get_by_id(id).unwrap();
        assert!((moved.x - 40.0).abs() < 1e-9);
        assert!((moved.y - 40.0).abs() < 1e-9);
        assert_eq!(editor.history().undo_len(), 1);

        assert!(editor.undo());
        assert!(editor.scene().ptr_eq(&before));
        assert!(editor.redo());
        assert!((editor.scene().get_by_id(id).unwrap().x - 40.0).abs() < 1e-9);
        assert!(!editor.redo());
    }

    #[test]
    fn test_delete_with_label_and_undo() {
        let mut editor = editor();
        let shape = editor.state.scene.add_element(Element::rectangle(Rect::new(0.0, 0.0, 100.0, 50.0)));
        let label = editor.add_label(shape, "hello").unwrap();
        assert_eq!(editor.scene().find_bound_child(shape).map(|e| e.id()), Some(label));

        editor.pointer_down(Point::new(3.0, 3.0), false);
        editor.pointer_up(Point::new(3.0, 3.0), false);
        editor.key(Key::Delete, false, false);
        assert!(editor.scene().active_elements().is_empty());
        assert!(editor.scene().get_active(label).is_none());

        editor.key(Key::Char('z'), false, true);
        assert!(editor.scene().get_active(shape).is_some());
        assert!(editor.scene().get_active(label).is_some());
        assert!(editor.scene().get_by_id(shape).unwrap().has_bound_element(label));
    }

    #[test]
    fn test_add_label_replaces_text() {
        let mut editor = editor();
        let shape = editor.state.scene.add_element(Element::ellipse(Rect::new(0.0, 0.0, 200.0, 100.0)));
        let first = editor.add_label(shape, "a").unwrap();
        let second = editor.add_label(shape, "a much longer label").unwrap();
        assert_eq!(first, second);
        let label = editor.scene().get_by_id(first).unwrap();
        assert_eq!(label.text_data().unwrap().text, "a much longer label");
        assert!((label.center() - Point::new(100.0, 50.0)).hypot() < 1e-9);

        let line = editor.state.scene.add_element(Element::line(vec![Point::ZERO, Point::new(5.0, 5.0)]));
        assert!(editor.add_label(line, "nope").is_none());
    }

    #[test]
    fn test_undo_redo_shortcuts() {
        let mut editor = editor();
        editor.set_tool(ToolType::Ellipse);
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(40.0, 40.0));
        assert_eq!(editor.scene().active_elements().len(), 1);
        editor.key(Key::Char('z'), false, true);
        assert!(editor.scene().active_elements().is_empty());
        editor.key(Key::Char('z'), true, true);
        assert_eq!(editor.scene().active_elements().len(), 1);
        editor.key(Key::Char('z'), false, true);
        editor.key(Key::Char('y'), false, true);
        assert_eq!(editor.scene().active_elements().len(), 1);
    }

    #[test]
    fn test_escape_cancels_drag() {
        let mut editor = editor();
        let id = editor.state.scene.add_element(Element::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
        editor.state.selection = BTreeSet::from([id]);
        let before = editor.scene().clone();
        editor.pointer_down(Point::new(25.0, 25.0), false);
        editor.pointer_move(Point::new(60.0, 60.0));
        editor.key(Key::Escape, false, false);
        editor.pointer_up(Point::new(60.0, 60.0), false);
        assert!(editor.scene().ptr_eq(&before));
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_tool_shortcuts_and_lock() {
        let mut editor = editor();
        editor.key(Key::Char('r'), false, false);
        assert_eq!(editor.active_tool(), ToolType::Rectangle);
        editor.set_tool_locked(true);
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        assert_eq!(editor.active_tool(), ToolType::Rectangle);
        drag(&mut editor, Point::new(20.0, 0.0), Point::new(30.0, 10.0));
        assert_eq!(editor.scene().active_elements().len(), 2);
    }

    #[test]
    fn test_pointer_goes_through_viewport() {
        let mut editor = editor();
        editor.zoom_at(Point::ZERO, 2.0);
        editor.set_tool(ToolType::Rectangle);
        drag(&mut editor, Point::new(20.0, 20.0), Point::new(60.0, 40.0));
        let rect = editor.scene().active_elements()[0];
        assert_eq!(rect.bounds(), Rect::new(10.0, 10.0, 30.0, 20.0));
    }

    #[test]
    fn test_hand_tool_pans_without_history() {
        let mut editor = editor();
        editor.set_tool(ToolType::Hand);
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(30.0, -10.0));
        assert!((editor.viewport().offset.x - 30.0).abs() < 1e-9);
        assert!((editor.viewport().offset.y + 10.0).abs() < 1e-9);
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn test_copy_mirrors_to_service_and_pastes_back() {
        let mut editor = editor().with_clipboard(Box::new(MemoryClipboard::new()));
        let id = editor.state.scene.add_element(Element::rectangle(Rect::new(0.0, 0.0, 20.0, 20.0)));
        editor.state.selection = BTreeSet::from([id]);
        editor.key(Key::Char('c'), false, true);
        editor.pointer_move(Point::new(200.0, 200.0));
        editor.key(Key::Char('v'), false, true);

        let elements = editor.scene().active_elements();
        assert_eq!(elements.len(), 2);
        let pasted = elements.iter().find(|e| e.id() != id).unwrap();
        assert!((pasted.center() - Point::new(200.0, 200.0)).hypot() < 1e-9);
        assert_eq!(editor.selection(), &BTreeSet::from([pasted.id()]));
    }

    #[test]
    fn test_paste_plain_text() {
        let mut clipboard = MemoryClipboard::new();
        clipboard.copy_text("note to self").unwrap();
        let mut editor = editor().with_clipboard(Box::new(clipboard));
        editor.key(Key::Char('v'), false, true);
        let elements = editor.scene().active_elements();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].text_data().unwrap().text, "note to self");
        assert!(editor.history().can_undo());
    }

    #[test]
    fn test_insert_image_and_fit() {
        struct Square;
        impl ImageDecoder for Square {
            fn natural_size(&self, _: &[u8], _: &str) -> Result<(u32, u32), ImageError> {
                Ok((100, 100))
            }
        }
        let mut editor = editor();
        editor.set_viewport_size(Size::new(400.0, 300.0));
        let png_magic = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        editor.insert_image(&png_magic, None, &Square).unwrap();
        let image = editor.scene().active_elements()[0];
        assert!((image.center() - Point::new(200.0, 150.0)).hypot() < 1e-9);
        assert_eq!(editor.scene().files().count(), 1);

        editor.fit_to_content();
        assert!((editor.viewport().zoom() - 2.2).abs() < 1e-9);
    }
}
