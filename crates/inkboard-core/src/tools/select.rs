//! Selection tool: picking, moving, handles, marquee and keyboard editing.

use super::handles::{HandleKind, apply_resize, apply_rotation, hit_test_handles};
use super::{Key, Overlay, Tool, ToolContext, center_label};
use crate::binding::{find_bind_target, rebind_endpoint, refresh_arrows_for, route_elbowed, unbind_arrow_endpoint};
use crate::clipboard::paste_result;
use crate::element::{Element, ElementId, ElementType, Endpoint};
use crate::scene::Scene;
use crate::state::ToolResult;
use kurbo::{Point, Rect, Vec2};
use std::collections::{BTreeSet, HashMap};

/// Gesture in progress.
#[derive(Debug, Clone, Default)]
enum SelectState {
    #[default]
    Idle,
    Moving {
        start: Point,
        /// Moved elements (selection plus labels) as they were at press time.
        originals: Vec<Element>,
        moved: bool,
        /// Already-selected element pressed inside a multi-selection; a click
        /// without a drag narrows the selection to it.
        clicked: Option<ElementId>,
    },
    Resizing {
        original: Element,
        handle: HandleKind,
    },
    Rotating {
        original: Element,
        start: Point,
        snap: bool,
    },
    DraggingPoint {
        original: Element,
        index: usize,
    },
    Marquee {
        start: Point,
        current: Point,
        extend: bool,
    },
}

/// Default tool. Picks, moves, resizes and rotates elements and edits the
/// selection from the keyboard.
#[derive(Debug, Clone, Default)]
pub struct SelectTool {
    state: SelectState,
    bind_target: Option<ElementId>,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, SelectState::Idle)
    }

    fn press_handle(&mut self, point: Point, ctx: &ToolContext, shift: bool) -> bool {
        let tolerance = ctx.handle_tolerance();
        let zoom = ctx.viewport.zoom();
        let selected: Vec<&Element> = ctx
            .selection
            .iter()
            .filter_map(|&id| ctx.scene.get_active(id))
            .collect();

        for element in selected.iter().filter(|e| e.is_linear()) {
            if let Some(HandleKind::Vertex(index)) = hit_test_handles(element, point, tolerance, zoom) {
                let elbowed = element.linear().is_some_and(|l| l.elbowed);
                let is_end = element.linear().and_then(|l| l.endpoint_at(index)).is_some();
                if elbowed && !is_end {
                    continue;
                }
                self.state = SelectState::DraggingPoint {
                    original: (*element).clone(),
                    index,
                };
                return true;
            }
        }

        if let [element] = selected.as_slice() {
            if !element.is_linear() {
                match hit_test_handles(element, point, tolerance, zoom) {
                    Some(HandleKind::Rotate) => {
                        self.state = SelectState::Rotating {
                            original: (*element).clone(),
                            start: point,
                            snap: shift,
                        };
                        return true;
                    }
                    Some(handle) => {
                        self.state = SelectState::Resizing {
                            original: (*element).clone(),
                            handle,
                        };
                        return true;
                    }
                    None => {}
                }
            }
        }
        false
    }
}

/// Selected live elements plus their bound labels, back to front.
fn moving_set(scene: &Scene, selection: &BTreeSet<ElementId>) -> Vec<Element> {
    let mut ids: BTreeSet<ElementId> = BTreeSet::new();
    for &id in selection {
        let Some(element) = scene.get_active(id) else {
            continue;
        };
        ids.insert(id);
        if let Some(label) = scene.find_bound_child(element.id()) {
            ids.insert(label.id());
        }
    }
    scene
        .ordered_elements()
        .into_iter()
        .filter(|e| e.is_active() && ids.contains(&e.id()))
        .cloned()
        .collect()
}

/// `originals` moved by `delta`, followed by refreshed arrows bound to them
/// that are not moving themselves.
fn translate(scene: &Scene, originals: &[Element], delta: Vec2) -> Vec<Element> {
    let mut scratch = scene.clone();
    let moved: Vec<Element> = originals.iter().map(|e| e.translated(delta)).collect();
    for element in &moved {
        scratch.update_element(element.clone());
    }
    let ids: Vec<ElementId> = moved.iter().map(|e| e.id()).collect();
    let arrows = refresh_arrows_for(&scratch, &ids)
        .into_iter()
        .filter(|a| !ids.contains(&a.id()));
    moved.into_iter().chain(arrows).collect()
}

/// A reshaped element with its label re-centered and its arrows refreshed.
fn shape_update(scene: &Scene, updated: Element) -> Option<ToolResult> {
    let mut scratch = scene.clone();
    let mut results = vec![ToolResult::UpdateElement(updated.clone())];
    if let Some(label) = scene.find_bound_child(updated.id()) {
        let label = center_label(label, &updated);
        scratch.update_element(label.clone());
        results.push(ToolResult::UpdateElement(label));
    }
    scratch.update_element(updated.clone());
    results.extend(
        refresh_arrows_for(&scratch, &[updated.id()])
            .into_iter()
            .map(ToolResult::UpdateElement),
    );
    ToolResult::compound(results)
}

/// `original` with one vertex moved to `point`.
fn drag_vertex(original: &Element, index: usize, point: Point) -> Element {
    let mut points = original.absolute_points();
    if let Some(p) = points.get_mut(index) {
        *p = point;
    }
    let mut updated = original.clone();
    updated.set_absolute_points(points);
    if original.linear().is_some_and(|l| l.elbowed) {
        route_elbowed(&mut updated);
    }
    updated
}

/// Element edits merged by id, emitted in first-touch order.
struct Pending<'a> {
    scene: &'a Scene,
    order: Vec<ElementId>,
    edited: HashMap<ElementId, Element>,
}

impl<'a> Pending<'a> {
    fn new(scene: &'a Scene) -> Self {
        Self {
            scene,
            order: Vec::new(),
            edited: HashMap::new(),
        }
    }

    fn put(&mut self, element: Element) {
        let id = element.id();
        if self.edited.insert(id, element).is_none() {
            self.order.push(id);
        }
    }

    fn get(&self, id: ElementId) -> Option<&Element> {
        self.edited.get(&id).or_else(|| self.scene.get_by_id(id))
    }

    fn edit(&mut self, id: ElementId, f: impl FnOnce(&mut Element)) {
        if !self.edited.contains_key(&id) {
            let Some(element) = self.scene.get_by_id(id) else {
                return;
            };
            self.put(element.clone());
        }
        if let Some(element) = self.edited.get_mut(&id) {
            f(element);
        }
    }

    fn into_results(mut self) -> Vec<ToolResult> {
        self.order
            .iter()
            .filter_map(|id| self.edited.remove(id))
            .map(ToolResult::UpdateElement)
            .collect()
    }
}

/// Unbind moved arrows from targets that stayed behind.
fn detach_unmoved(pending: &mut Pending, moved: &[ElementId]) {
    for &id in moved {
        let Some(data) = pending.get(id).and_then(|e| e.linear()) else {
            continue;
        };
        let stale: Vec<(Endpoint, ElementId)> = [Endpoint::Start, Endpoint::End]
            .into_iter()
            .filter_map(|end| data.binding(end).map(|b| (end, b.element_id)))
            .filter(|(_, target)| !moved.contains(target))
            .collect();
        for (end, target) in stale {
            pending.edit(id, |arrow| {
                unbind_arrow_endpoint(arrow, end);
            });
            let still_bound = pending
                .get(id)
                .and_then(|e| e.linear())
                .is_some_and(|l| l.is_bound_to(target));
            if !still_bound {
                pending.edit(target, |t| {
                    t.remove_bound_element(id);
                });
            }
            log::debug!("arrow {} detached from {}", id, target);
        }
    }
}

/// Move the selection by `delta` as one committed step.
fn nudge(ctx: &ToolContext, delta: Vec2) -> Option<ToolResult> {
    let originals = moving_set(ctx.scene, ctx.selection);
    if originals.is_empty() {
        return None;
    }
    let ids: Vec<ElementId> = originals.iter().map(|e| e.id()).collect();
    let mut pending = Pending::new(ctx.scene);
    for element in translate(ctx.scene, &originals, delta) {
        pending.put(element);
    }
    detach_unmoved(&mut pending, &ids);
    ToolResult::compound(pending.into_results())
}

/// Remove the selection and keep every relation that touched it consistent.
fn delete_selection(ctx: &ToolContext) -> Option<ToolResult> {
    let doomed: Vec<Element> = moving_set(ctx.scene, ctx.selection);
    if doomed.is_empty() {
        return None;
    }
    let doomed_ids: BTreeSet<ElementId> = doomed.iter().map(|e| e.id()).collect();
    let mut pending = Pending::new(ctx.scene);

    for element in &doomed {
        let id = element.id();
        if let Some(container) = element.container_id {
            if !doomed_ids.contains(&container) {
                pending.edit(container, |c| {
                    c.remove_bound_element(id);
                });
            }
        }
        if let Some(data) = element.linear() {
            for binding in [data.start_binding, data.end_binding].into_iter().flatten() {
                if !doomed_ids.contains(&binding.element_id) {
                    pending.edit(binding.element_id, |t| {
                        t.remove_bound_element(id);
                    });
                }
            }
        }
        for arrow in ctx.scene.bound_arrows(id) {
            if doomed_ids.contains(&arrow.id()) {
                continue;
            }
            pending.edit(arrow.id(), |a| {
                for end in [Endpoint::Start, Endpoint::End] {
                    if a.linear().and_then(|l| l.binding(end)).is_some_and(|b| b.element_id == id) {
                        unbind_arrow_endpoint(a, end);
                    }
                }
            });
        }
    }

    log::debug!("deleting {} elements", doomed_ids.len());
    let mut results = pending.into_results();
    results.extend(doomed_ids.into_iter().map(ToolResult::RemoveElement));
    results.push(ToolResult::SetSelection(Vec::new()));
    ToolResult::compound(results)
}

impl Tool for SelectTool {
    fn on_pointer_down(&mut self, point: Point, ctx: &ToolContext, shift: bool) -> Option<ToolResult> {
        self.state = SelectState::Idle;
        self.bind_target = None;

        if self.press_handle(point, ctx, shift) {
            return None;
        }

        let Some(hit) = ctx.scene.hit_test(point, ctx.hit_tolerance()) else {
            self.state = SelectState::Marquee {
                start: point,
                current: point,
                extend: shift,
            };
            return (!shift && !ctx.selection.is_empty()).then(|| ToolResult::SetSelection(Vec::new()));
        };
        let id = hit.id();

        let mut selection = ctx.selection.clone();
        let mut clicked = None;
        if shift {
            if !selection.insert(id) {
                selection.remove(&id);
                return Some(ToolResult::SetSelection(selection.into_iter().collect()));
            }
        } else if selection.contains(&id) {
            if selection.len() > 1 {
                clicked = Some(id);
            }
        } else {
            selection = BTreeSet::from([id]);
        }

        self.state = SelectState::Moving {
            start: point,
            originals: moving_set(ctx.scene, &selection),
            moved: false,
            clicked,
        };
        (selection != *ctx.selection).then(|| ToolResult::SetSelection(selection.into_iter().collect()))
    }

    fn on_pointer_move(&mut self, point: Point, ctx: &ToolContext, _screen_delta: Vec2) -> Option<ToolResult> {
        match &mut self.state {
            SelectState::Idle => None,
            SelectState::Moving {
                start,
                originals,
                moved,
                ..
            } => {
                let delta = point - *start;
                if delta == Vec2::ZERO && !*moved {
                    return None;
                }
                *moved = true;
                let updates = translate(ctx.scene, originals, delta);
                ToolResult::compound(updates.into_iter().map(ToolResult::UpdateElement).collect())
            }
            SelectState::Resizing { original, handle } => {
                let resized = apply_resize(original, *handle, point, ctx.config.min_element_size);
                shape_update(ctx.scene, resized)
            }
            SelectState::Rotating { original, start, snap } => {
                let rotated = apply_rotation(original, *start, point, *snap);
                shape_update(ctx.scene, rotated)
            }
            SelectState::DraggingPoint { original, index } => {
                let is_arrow_end = original.element_type() == ElementType::Arrow
                    && original.linear().and_then(|l| l.endpoint_at(*index)).is_some();
                self.bind_target = if is_arrow_end {
                    find_bind_target(ctx.scene, point, ctx.config.bind_snap_radius, &[original.id()])
                        .map(|e| e.id())
                } else {
                    None
                };
                Some(ToolResult::UpdateElement(drag_vertex(original, *index, point)))
            }
            SelectState::Marquee { current, .. } => {
                *current = point;
                None
            }
        }
    }

    fn on_pointer_up(&mut self, point: Point, ctx: &ToolContext, _is_double_click: bool) -> Option<ToolResult> {
        let state = std::mem::take(&mut self.state);
        self.bind_target = None;
        match state {
            SelectState::Idle | SelectState::Resizing { .. } | SelectState::Rotating { .. } => None,
            SelectState::Moving {
                originals,
                moved,
                clicked,
                ..
            } => {
                if !moved {
                    return clicked.map(|id| ToolResult::SetSelection(vec![id]));
                }
                let ids: Vec<ElementId> = originals.iter().map(|e| e.id()).collect();
                let mut pending = Pending::new(ctx.scene);
                detach_unmoved(&mut pending, &ids);
                ToolResult::compound(pending.into_results())
            }
            SelectState::DraggingPoint { original, index } => {
                if original.element_type() != ElementType::Arrow {
                    return None;
                }
                let end = original.linear().and_then(|l| l.endpoint_at(index))?;
                let current = ctx.scene.get_active(original.id())?;
                let mut changed =
                    rebind_endpoint(ctx.scene, current, end, point, ctx.config.bind_snap_radius);
                if let Some(arrow) = changed.first_mut() {
                    if arrow.linear().is_some_and(|l| l.elbowed) {
                        route_elbowed(arrow);
                    }
                }
                ToolResult::compound(changed.into_iter().map(ToolResult::UpdateElement).collect())
            }
            SelectState::Marquee { start, current, extend } => {
                let rect = Rect::from_points(start, current);
                let min = ctx.config.min_element_size;
                if rect.width() < min && rect.height() < min {
                    return None;
                }
                let mut ids: BTreeSet<ElementId> = ctx.scene.elements_in_rect(rect).into_iter().collect();
                if extend {
                    ids.extend(ctx.selection.iter().copied());
                }
                Some(ToolResult::SetSelection(ids.into_iter().collect()))
            }
        }
    }

    fn on_key_event(&mut self, key: Key, shift: bool, ctrl: bool, ctx: &ToolContext) -> Option<ToolResult> {
        if key == Key::Escape {
            let state = std::mem::take(&mut self.state);
            self.bind_target = None;
            return match state {
                SelectState::Idle => {
                    (!ctx.selection.is_empty()).then(|| ToolResult::SetSelection(Vec::new()))
                }
                SelectState::Moving { originals, moved, .. } => moved
                    .then(|| translate(ctx.scene, &originals, Vec2::ZERO))
                    .and_then(|updates| {
                        ToolResult::compound(updates.into_iter().map(ToolResult::UpdateElement).collect())
                    }),
                SelectState::Resizing { original, .. } | SelectState::Rotating { original, .. } => {
                    shape_update(ctx.scene, original)
                }
                SelectState::DraggingPoint { original, .. } => Some(ToolResult::UpdateElement(original)),
                SelectState::Marquee { .. } => None,
            };
        }
        if self.is_active() {
            return None;
        }

        let step = if shift {
            ctx.config.nudge_step_large
        } else {
            ctx.config.nudge_step
        };
        match key {
            Key::Delete | Key::Backspace => delete_selection(ctx),
            Key::ArrowLeft => nudge(ctx, Vec2::new(-step, 0.0)),
            Key::ArrowRight => nudge(ctx, Vec2::new(step, 0.0)),
            Key::ArrowUp => nudge(ctx, Vec2::new(0.0, -step)),
            Key::ArrowDown => nudge(ctx, Vec2::new(0.0, step)),
            Key::Char(_) if ctrl => {
                let offset = Vec2::new(ctx.config.duplicate_offset, ctx.config.duplicate_offset);
                if key.is_char('a') {
                    let all = ctx.scene.active_elements().iter().map(|e| e.id()).collect();
                    Some(ToolResult::SetSelection(all))
                } else if key.is_char('d') {
                    paste_result(&moving_set(ctx.scene, ctx.selection), Vec::new(), offset)
                } else if key.is_char('c') {
                    let copied = moving_set(ctx.scene, ctx.selection);
                    (!copied.is_empty()).then_some(ToolResult::SetClipboard(copied))
                } else if key.is_char('x') {
                    let copied = moving_set(ctx.scene, ctx.selection);
                    if copied.is_empty() {
                        return None;
                    }
                    let mut results = vec![ToolResult::SetClipboard(copied)];
                    results.extend(delete_selection(ctx));
                    ToolResult::compound(results)
                } else if key.is_char('v') {
                    paste_result(ctx.clipboard, Vec::new(), offset)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.state = SelectState::Idle;
        self.bind_target = None;
    }

    fn overlay(&self) -> Overlay {
        let marquee = match &self.state {
            SelectState::Marquee { start, current, .. } => Some(Rect::from_points(*start, *current)),
            _ => None,
        };
        Overlay {
            marquee,
            bind_target: self.bind_target,
            ..Default::default()
        }
    }
}
