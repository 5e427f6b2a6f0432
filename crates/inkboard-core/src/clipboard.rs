//! Clipboard payloads.
//!
//! Copied elements travel as text: a marker line followed by JSON holding the
//! element snapshots and the files their images reference. Anything without
//! the marker is plain text.

use crate::document::StoredFile;
use crate::element::{ArrowBinding, BoundElement, Element, ElementId, ElementKind, Endpoint};
use crate::files::{FileBlob, FileId};
use crate::scene::Scene;
use crate::state::ToolResult;
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use uuid::Uuid;

/// First line of the private clipboard format.
pub const CLIPBOARD_MARKER: &str = "inkboard/clipboard";

/// Clipboard errors.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("Malformed clipboard payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid file in clipboard payload: {0}")]
    InvalidFile(#[from] base64::DecodeError),
}

/// System clipboard access, text only.
pub trait ClipboardService {
    fn copy_text(&mut self, text: &str) -> Result<(), ClipboardError>;

    /// Current clipboard text, `None` when empty.
    fn read_text(&mut self) -> Result<Option<String>, ClipboardError>;
}

/// In-process clipboard used by tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardService for MemoryClipboard {
    fn copy_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.text = Some(text.to_string());
        Ok(())
    }

    fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
        Ok(self.text.clone())
    }
}

/// Parsed clipboard text.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardContent {
    Elements {
        elements: Vec<Element>,
        files: Vec<(FileId, FileBlob)>,
    },
    Text(String),
}

#[derive(Serialize, Deserialize)]
struct Payload {
    elements: Vec<Element>,
    #[serde(default)]
    files: BTreeMap<FileId, StoredFile>,
}

/// Serialize elements plus the scene files their images reference.
pub fn serialize_elements(elements: &[Element], scene: &Scene) -> Result<String, ClipboardError> {
    let files = elements
        .iter()
        .filter_map(|e| match &e.kind {
            ElementKind::Image(image) => Some(&image.file_id),
            _ => None,
        })
        .filter_map(|id| scene.get_file(id).map(|blob| (id.clone(), StoredFile::from_blob(blob))))
        .collect();
    let payload = Payload {
        elements: elements.to_vec(),
        files,
    };
    let json = serde_json::to_string(&payload)?;
    Ok(format!("{}\n{}", CLIPBOARD_MARKER, json))
}

/// Recognize the private format; anything else is plain text.
pub fn parse_clipboard(text: &str) -> Result<ClipboardContent, ClipboardError> {
    let Some(body) = text.strip_prefix(CLIPBOARD_MARKER) else {
        return Ok(ClipboardContent::Text(text.to_string()));
    };
    let payload: Payload = serde_json::from_str(body.trim_start())?;
    let files = payload
        .files
        .into_iter()
        .map(|(id, stored)| Ok((id, stored.to_blob()?)))
        .collect::<Result<Vec<_>, ClipboardError>>()?;
    Ok(ClipboardContent::Elements {
        elements: payload.elements,
        files,
    })
}

/// Copies with new ids, shifted by `offset`.
///
/// Relations inside the set (labels, arrow bindings) are remapped to the new
/// ids; relations to elements outside the set are dropped.
pub fn clone_with_fresh_ids(elements: &[Element], offset: Vec2) -> Vec<Element> {
    let ids: HashMap<ElementId, ElementId> = elements.iter().map(|e| (e.id(), Uuid::new_v4())).collect();

    elements
        .iter()
        .map(|original| {
            let mut copy = original.translated(offset);
            copy.set_id(ids[&original.id()]);
            copy.version = 1;
            copy.is_deleted = false;
            copy.index = None;
            copy.style = original.style.reseeded();
            copy.container_id = original.container_id.and_then(|c| ids.get(&c).copied());
            copy.bound_elements = original
                .bound_elements
                .iter()
                .filter_map(|b| ids.get(&b.id).map(|&id| BoundElement { id, ..*b }))
                .collect();
            if let Some(data) = copy.linear_mut() {
                for end in [Endpoint::Start, Endpoint::End] {
                    let remapped = data.binding(end).and_then(|b| {
                        ids.get(&b.element_id).map(|&element_id| ArrowBinding {
                            element_id,
                            ..*b
                        })
                    });
                    data.set_binding(end, remapped);
                }
            }
            copy
        })
        .collect()
}

/// Insert copies of `elements` (plus their files) and select the top-level ones.
pub fn paste_result(elements: &[Element], files: Vec<(FileId, FileBlob)>, offset: Vec2) -> Option<ToolResult> {
    if elements.is_empty() {
        return None;
    }
    let copies = clone_with_fresh_ids(elements, offset);
    let selection: Vec<ElementId> = copies.iter().filter(|e| !e.is_bound_text()).map(|e| e.id()).collect();
    log::debug!("pasting {} elements", copies.len());

    let mut results: Vec<ToolResult> = files
        .into_iter()
        .map(|(id, blob)| ToolResult::AddFile(id, blob))
        .collect();
    results.extend(copies.into_iter().map(ToolResult::AddElement));
    results.push(ToolResult::SetSelection(selection));
    ToolResult::compound(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use crate::state::{EditorState, apply_result};
    use kurbo::{Point, Rect};

    fn labelled_pair() -> Vec<Element> {
        let mut shape = Element::rectangle(Rect::new(0.0, 0.0, 100.0, 50.0));
        let mut label = Element::text(Point::new(30.0, 15.0), "hi");
        label.container_id = Some(shape.id());
        shape.add_bound_element(label.id(), ElementType::Text);
        vec![shape, label]
    }

    #[test]
    fn test_fresh_ids_remap_internal_refs() {
        let originals = labelled_pair();
        let copies = clone_with_fresh_ids(&originals, Vec2::new(10.0, 10.0));
        assert_eq!(copies.len(), 2);
        assert_ne!(copies[0].id(), originals[0].id());
        assert_ne!(copies[1].id(), originals[1].id());
        assert_eq!(copies[1].container_id, Some(copies[0].id()));
        assert!(copies[0].has_bound_element(copies[1].id()));
        assert!((copies[0].x - 10.0).abs() < f64::EPSILON);
        assert_eq!(copies[0].version, 1);
        assert!(copies[0].index.is_none());
    }

    #[test]
    fn test_fresh_ids_drop_external_refs() {
        let target = Element::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut arrow = Element::arrow(vec![Point::new(10.0, 5.0), Point::new(50.0, 5.0)]);
        if let Some(data) = arrow.linear_mut() {
            data.start_binding = Some(ArrowBinding::new(target.id(), Point::new(1.0, 0.5)));
        }
        let mut label = Element::text(Point::ZERO, "orphan");
        label.container_id = Some(target.id());

        let copies = clone_with_fresh_ids(&[arrow, label], Vec2::ZERO);
        assert!(copies[0].linear().unwrap().start_binding.is_none());
        assert!(copies[1].container_id.is_none());
    }

    #[test]
    fn test_serialize_parse_with_files() {
        let mut scene = Scene::new();
        let blob = FileBlob::new("image/png", vec![1u8, 2, 3]);
        let file_id = blob.id();
        scene.add_file(file_id.clone(), blob.clone());
        let image = Element::image(file_id.clone(), Rect::new(0.0, 0.0, 20.0, 20.0));

        let text = serialize_elements(std::slice::from_ref(&image), &scene).unwrap();
        assert!(text.starts_with(CLIPBOARD_MARKER));
        match parse_clipboard(&text).unwrap() {
            ClipboardContent::Elements { elements, files } => {
                assert_eq!(elements, vec![image]);
                assert_eq!(files, vec![(file_id, blob)]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_and_malformed() {
        assert_eq!(
            parse_clipboard("hello").unwrap(),
            ClipboardContent::Text("hello".to_string())
        );
        let broken = format!("{}\n{{not json", CLIPBOARD_MARKER);
        assert!(matches!(parse_clipboard(&broken), Err(ClipboardError::Malformed(_))));
    }

    #[test]
    fn test_memory_clipboard() {
        let mut clipboard = MemoryClipboard::new();
        assert_eq!(clipboard.read_text().unwrap(), None);
        clipboard.copy_text("abc").unwrap();
        assert_eq!(clipboard.read_text().unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_paste_selects_top_level_copies() {
        let state = EditorState::default();
        let result = paste_result(&labelled_pair(), Vec::new(), Vec2::new(10.0, 0.0));
        let next = apply_result(&state, result.as_ref());
        assert_eq!(next.scene.len(), 2);
        assert_eq!(next.selection.len(), 1);
        let id = *next.selection.iter().next().unwrap();
        assert_eq!(next.scene.get_by_id(id).unwrap().element_type(), ElementType::Rectangle);
        assert!(paste_result(&[], Vec::new(), Vec2::ZERO).is_none());
    }
}
