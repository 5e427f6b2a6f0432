//! Editor state and the reducer that applies edit operations to it.

use crate::element::{Element, ElementId};
use crate::files::{FileBlob, FileId};
use crate::scene::Scene;
use crate::tools::ToolType;
use crate::viewport::Viewport;
use std::collections::BTreeSet;
use std::sync::Arc;

/// An edit operation produced by a tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    AddElement(Element),
    UpdateElement(Element),
    RemoveElement(ElementId),
    SetSelection(Vec<ElementId>),
    UpdateViewport(Viewport),
    SwitchTool(ToolType),
    SetClipboard(Vec<Element>),
    AddFile(FileId, FileBlob),
    /// Applied in order as one step.
    Compound(Vec<ToolResult>),
}

impl ToolResult {
    /// Bundle results. Empty lists give `None` and single results are not
    /// wrapped; nested compounds are flattened.
    pub fn compound(results: Vec<ToolResult>) -> Option<ToolResult> {
        let mut flat = Vec::with_capacity(results.len());
        for result in results {
            match result {
                ToolResult::Compound(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(ToolResult::Compound(flat)),
        }
    }

    /// Whether applying this result changes the scene.
    pub fn is_scene_changing(&self) -> bool {
        match self {
            ToolResult::AddElement(_)
            | ToolResult::UpdateElement(_)
            | ToolResult::RemoveElement(_) => true,
            ToolResult::SetSelection(_)
            | ToolResult::UpdateViewport(_)
            | ToolResult::SwitchTool(_)
            | ToolResult::SetClipboard(_)
            | ToolResult::AddFile(_, _) => false,
            ToolResult::Compound(results) => results.iter().any(ToolResult::is_scene_changing),
        }
    }

    /// Whether this result writes the clipboard.
    pub fn sets_clipboard(&self) -> bool {
        match self {
            ToolResult::SetClipboard(_) => true,
            ToolResult::Compound(results) => results.iter().any(ToolResult::sets_clipboard),
            _ => false,
        }
    }
}

/// Free-function form of [`ToolResult::is_scene_changing`].
pub fn is_scene_changing(result: &ToolResult) -> bool {
    result.is_scene_changing()
}

/// Everything the editor core knows at one instant.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub scene: Scene,
    pub viewport: Viewport,
    /// May reference tombstoned elements after an undo.
    pub selection: BTreeSet<ElementId>,
    /// Detached element snapshots.
    pub clipboard: Arc<[Element]>,
    pub active_tool: ToolType,
    /// Creation tools stay active after a commit.
    pub tool_locked: bool,
}

impl EditorState {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            ..Self::default()
        }
    }
}

/// Apply `result` to `state`, returning the new state. `None` returns a
/// state sharing the same scene.
pub fn apply_result(state: &EditorState, result: Option<&ToolResult>) -> EditorState {
    let mut next = state.clone();
    if let Some(result) = result {
        apply_in_place(&mut next, result);
    }
    next
}

fn apply_in_place(state: &mut EditorState, result: &ToolResult) {
    match result {
        ToolResult::AddElement(element) => {
            let id = state.scene.add_element(element.clone());
            log::debug!("add {} {}", element.element_type().name(), id);
        }
        ToolResult::UpdateElement(element) => {
            state.scene.update_element(element.clone());
        }
        ToolResult::RemoveElement(id) => {
            if state.scene.remove_element(*id) {
                log::debug!("remove {}", id);
            }
        }
        ToolResult::SetSelection(ids) => {
            state.selection = ids.iter().copied().collect();
        }
        ToolResult::UpdateViewport(viewport) => {
            state.viewport = *viewport;
        }
        ToolResult::SwitchTool(tool) => {
            if *tool == ToolType::Select && state.tool_locked {
                log::debug!("tool locked, staying on {:?}", state.active_tool);
            } else {
                state.active_tool = *tool;
            }
        }
        ToolResult::SetClipboard(elements) => {
            state.clipboard = Arc::from(elements.as_slice());
        }
        ToolResult::AddFile(id, blob) => {
            state.scene.add_file(id.clone(), blob.clone());
        }
        ToolResult::Compound(results) => {
            for result in results {
                apply_in_place(state, result);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Rect, Vec2};

    fn rect() -> Element {
        Element::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_none_is_identity() {
        let mut state = EditorState::default();
        state.scene.add_element(rect());
        let next = apply_result(&state, None);
        assert!(next.scene.ptr_eq(&state.scene));
        assert_eq!(next.selection, state.selection);
    }

    #[test]
    fn test_compound_applies_in_order() {
        let state = EditorState::default();
        let element = rect();
        let id = element.id();
        let moved = element.translated(Vec2::new(5.0, 0.0));
        let result = ToolResult::compound(vec![
            ToolResult::AddElement(element),
            ToolResult::UpdateElement(moved),
            ToolResult::SetSelection(vec![id]),
        ])
        .unwrap();
        let next = apply_result(&state, Some(&result));
        let stored = next.scene.get_by_id(id).unwrap();
        assert!((stored.x - 5.0).abs() < f64::EPSILON);
        assert!(next.selection.contains(&id));
        assert!(state.scene.is_empty());
    }

    #[test]
    fn test_tool_lock_suppresses_switch_to_select() {
        let mut state = EditorState {
            active_tool: ToolType::Rectangle,
            tool_locked: true,
            ..Default::default()
        };
        let switch = ToolResult::SwitchTool(ToolType::Select);
        state = apply_result(&state, Some(&switch));
        assert_eq!(state.active_tool, ToolType::Rectangle);

        state.tool_locked = false;
        state = apply_result(&state, Some(&switch));
        assert_eq!(state.active_tool, ToolType::Select);
    }

    #[test]
    fn test_is_scene_changing_recurses() {
        let selection_only = ToolResult::SetSelection(vec![]);
        assert!(!selection_only.is_scene_changing());
        let nested = ToolResult::Compound(vec![
            ToolResult::SetSelection(vec![]),
            ToolResult::Compound(vec![ToolResult::RemoveElement(rect().id())]),
        ]);
        assert!(is_scene_changing(&nested));
    }

    #[test]
    fn test_compound_builder_flattens() {
        assert!(ToolResult::compound(vec![]).is_none());
        let single = ToolResult::compound(vec![ToolResult::SwitchTool(ToolType::Hand)]);
        assert_eq!(single, Some(ToolResult::SwitchTool(ToolType::Hand)));
        let nested = ToolResult::compound(vec![
            ToolResult::Compound(vec![
                ToolResult::SwitchTool(ToolType::Hand),
                ToolResult::SetSelection(vec![]),
            ]),
            ToolResult::SetClipboard(vec![]),
        ]);
        assert!(matches!(nested, Some(ToolResult::Compound(ref v)) if v.len() == 3));
    }

    #[test]
    fn test_remove_keeps_prior_state() {
        let mut state = EditorState::default();
        let id = state.scene.add_element(rect());
        let next = apply_result(&state, Some(&ToolResult::RemoveElement(id)));
        assert!(next.scene.active_elements().is_empty());
        assert_eq!(state.scene.active_elements().len(), 1);
    }
}
