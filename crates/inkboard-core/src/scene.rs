//! The scene: every element of a drawing plus its attached files.
//!
//! `Scene` is a persistent value backed by `imbl` maps. Cloning is O(1) and an
//! edit copies only the path to the changed entry, so a snapshot taken before
//! an edit stays untouched and can be handed back by undo.

use crate::element::{Element, ElementId, ElementType};
use crate::files::{FileBlob, FileId};
use crate::order_key::OrderKey;
use imbl::{HashMap, OrdMap};
use kurbo::{Point, Rect};
use std::sync::Arc;

/// Id-indexed elements plus content-addressed file blobs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    elements: HashMap<ElementId, Arc<Element>>,
    files: OrdMap<FileId, FileBlob>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether both values share the same underlying storage.
    pub fn ptr_eq(&self, other: &Scene) -> bool {
        self.elements.ptr_eq(&other.elements) && self.files.ptr_eq(&other.files)
    }

    /// Add an element, giving it a trailing ordering key if it has none.
    pub fn add_element(&mut self, mut element: Element) -> ElementId {
        if element.index.is_none() {
            element.index = Some(OrderKey::after(self.max_key()));
        }
        let id = element.id();
        if self.elements.contains_key(&id) {
            log::warn!("add_element: replacing existing element {}", id);
        }
        self.elements.insert(id, Arc::new(element));
        id
    }

    /// Replace an element by id, bumping its version past the stored one.
    /// Returns false (and changes nothing) if the id is unknown.
    pub fn update_element(&mut self, mut element: Element) -> bool {
        let id = element.id();
        let Some(previous) = self.elements.get(&id) else {
            log::warn!("update_element: unknown element {}", id);
            return false;
        };
        element.version = previous.version.max(element.version) + 1;
        if element.index.is_none() {
            element.index = previous.index.clone();
        }
        self.elements.insert(id, Arc::new(element));
        true
    }

    /// Tombstone an element. Its key and back-references are retained.
    pub fn remove_element(&mut self, id: ElementId) -> bool {
        let Some(previous) = self.elements.get(&id) else {
            log::warn!("remove_element: unknown element {}", id);
            return false;
        };
        if previous.is_deleted {
            return false;
        }
        let mut tombstone = Element::clone(previous);
        tombstone.is_deleted = true;
        tombstone.version += 1;
        self.elements.insert(id, Arc::new(tombstone));
        true
    }

    /// Attach a file blob.
    pub fn add_file(&mut self, id: FileId, blob: FileBlob) {
        self.files.insert(id, blob);
    }

    /// Look up an element, tombstoned or not.
    pub fn get_by_id(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id).map(|e| e.as_ref())
    }

    /// Look up an element that is not tombstoned.
    pub fn get_active(&self, id: ElementId) -> Option<&Element> {
        self.get_by_id(id).filter(|e| e.is_active())
    }

    pub fn get_file(&self, id: &FileId) -> Option<&FileBlob> {
        self.files.get(id)
    }

    pub fn files(&self) -> impl Iterator<Item = (&FileId, &FileBlob)> {
        self.files.iter()
    }

    /// The live text label bound to `parent_id`, if any.
    pub fn find_bound_child(&self, parent_id: ElementId) -> Option<&Element> {
        let parent = self.get_by_id(parent_id)?;
        parent
            .bound_ids(ElementType::Text)
            .filter_map(|id| self.get_active(id))
            .find(|child| child.container_id == Some(parent_id))
    }

    /// Live arrows with an endpoint attached to `target`.
    pub fn bound_arrows(&self, target: ElementId) -> Vec<&Element> {
        self.ordered_elements()
            .into_iter()
            .filter(|e| e.is_active() && e.linear().is_some_and(|l| l.is_bound_to(target)))
            .collect()
    }

    /// Every element (tombstones included) back to front.
    pub fn ordered_elements(&self) -> Vec<&Element> {
        let mut all: Vec<&Element> = self.elements.values().map(|e| e.as_ref()).collect();
        all.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.id().cmp(&b.id())));
        all
    }

    /// Top-level live elements back to front. Bound text is reached through
    /// its container, not enumerated here.
    pub fn active_elements(&self) -> Vec<&Element> {
        self.ordered_elements()
            .into_iter()
            .filter(|e| e.is_active() && !e.is_bound_text())
            .collect()
    }

    /// Union of the world bounds of all active elements.
    pub fn scene_bounds(&self) -> Option<Rect> {
        self.active_elements()
            .into_iter()
            .map(|e| e.world_bounds())
            .reduce(|a, b| a.union(b))
    }

    /// Topmost active element containing `point`.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> Option<&Element> {
        self.active_elements()
            .into_iter()
            .rev()
            .find(|e| e.hit_test(point, tolerance))
    }

    /// Active top-level elements overlapping `rect`, back to front.
    pub fn elements_in_rect(&self, rect: Rect) -> Vec<ElementId> {
        self.active_elements()
            .into_iter()
            .filter(|e| e.intersects_rect(rect))
            .map(|e| e.id())
            .collect()
    }

    /// Highest ordering key in use, tombstones included.
    pub fn max_key(&self) -> Option<&OrderKey> {
        self.elements.values().filter_map(|e| e.index.as_ref()).max()
    }

    /// Number of stored elements, tombstones included.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
