//! Persisted document form of a scene.
//!
//! A [`Document`] is the JSON shape written to disk: live elements in paint
//! order plus the file map with base64 payloads. Loading is forgiving:
//! problems that leave a usable scene are reported as [`LoadWarning`]s rather
//! than errors.

use crate::element::{Element, ElementId, Endpoint};
use crate::files::{FileBlob, FileId};
use crate::order_key::OrderKey;
use crate::scene::Scene;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Value of the `type` field of every document.
pub const DOCUMENT_TYPE: &str = "inkboard";
/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

const ELEMENT_TYPES: [&str; 8] = [
    "rectangle", "ellipse", "diamond", "line", "arrow", "freedraw", "text", "image",
];

/// Codec errors.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),
    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(u32),
}

/// A file blob as stored in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub mime_type: String,
    /// Base64 of the bytes.
    pub data: String,
}

impl StoredFile {
    pub fn from_blob(blob: &FileBlob) -> Self {
        Self {
            mime_type: blob.mime_type.clone(),
            data: BASE64.encode(&blob.bytes),
        }
    }

    pub fn to_blob(&self) -> Result<FileBlob, base64::DecodeError> {
        let bytes = BASE64.decode(self.data.as_bytes())?;
        Ok(FileBlob::new(self.mime_type.clone(), bytes))
    }
}

/// Serialized scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "type", default = "default_document_type")]
    pub kind: String,
    #[serde(default = "default_version")]
    pub version: u32,
    /// Raw element objects, kept untyped so unknown kinds survive parsing.
    #[serde(default)]
    pub elements: Vec<serde_json::Value>,
    #[serde(default)]
    pub files: BTreeMap<String, StoredFile>,
}

fn default_document_type() -> String {
    DOCUMENT_TYPE.to_string()
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

impl Default for Document {
    fn default() -> Self {
        Self {
            kind: default_document_type(),
            version: DOCUMENT_VERSION,
            elements: Vec::new(),
            files: BTreeMap::new(),
        }
    }
}

/// Non-fatal problem found while loading.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadWarning {
    /// Element with a `type` this version does not know; skipped.
    UnknownElementType { index: usize, element_type: String },
    /// Element that could not be read; skipped.
    MalformedElement { index: usize, message: String },
    /// Second element with an id already seen; skipped.
    DuplicateId { id: ElementId },
    /// Ordering key missing or invalid; a new one was generated.
    InvalidOrderKey { id: ElementId, key: String },
    /// Reference to an element that is not in the document; dropped.
    DanglingReference { id: ElementId, missing: ElementId },
    /// One-sided binding or container relation; made consistent.
    RepairedReference { id: ElementId, other: ElementId },
    /// File payload that is not valid base64; skipped.
    InvalidFile { file_id: String, message: String },
    /// Image referencing a file that is not in the document.
    MissingFile { id: ElementId, file_id: FileId },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::UnknownElementType { index, element_type } => {
                write!(f, "element #{} has unknown type {:?}, skipped", index, element_type)
            }
            LoadWarning::MalformedElement { index, message } => {
                write!(f, "element #{} is malformed ({}), skipped", index, message)
            }
            LoadWarning::DuplicateId { id } => write!(f, "duplicate element id {}, skipped", id),
            LoadWarning::InvalidOrderKey { id, key } => {
                write!(f, "element {} has invalid ordering key {:?}, regenerated", id, key)
            }
            LoadWarning::DanglingReference { id, missing } => {
                write!(f, "element {} references missing element {}, dropped", id, missing)
            }
            LoadWarning::RepairedReference { id, other } => {
                write!(f, "relation between {} and {} was one-sided, repaired", id, other)
            }
            LoadWarning::InvalidFile { file_id, message } => {
                write!(f, "file {} could not be decoded ({}), skipped", file_id, message)
            }
            LoadWarning::MissingFile { id, file_id } => {
                write!(f, "image {} references missing file {}", id, file_id)
            }
        }
    }
}

impl Scene {
    /// Live elements in paint order plus every file.
    pub fn to_document(&self) -> Document {
        let elements = self
            .ordered_elements()
            .into_iter()
            .filter(|e| e.is_active())
            .filter_map(|e| match serde_json::to_value(e) {
                Ok(value) => Some(value),
                Err(err) => {
                    log::warn!("could not serialize element {}: {}", e.id(), err);
                    None
                }
            })
            .collect();
        let files = self
            .files()
            .map(|(id, blob)| (id.as_str().to_string(), StoredFile::from_blob(blob)))
            .collect();
        Document {
            elements,
            files,
            ..Document::default()
        }
    }

    /// Build a scene from a document, repairing what can be repaired.
    pub fn from_document(document: &Document) -> (Scene, Vec<LoadWarning>) {
        let mut warnings = Vec::new();
        let mut elements = read_elements(&document.elements, &mut warnings);
        assign_missing_keys(&mut elements, &mut warnings);
        repair_references(&mut elements, &mut warnings);

        let mut scene = Scene::new();
        for (key, stored) in &document.files {
            match stored.to_blob() {
                Ok(blob) => scene.add_file(FileId::new(key.clone()), blob),
                Err(err) => warnings.push(LoadWarning::InvalidFile {
                    file_id: key.clone(),
                    message: err.to_string(),
                }),
            }
        }
        for element in elements {
            if let crate::element::ElementKind::Image(image) = &element.kind {
                if scene.get_file(&image.file_id).is_none() {
                    warnings.push(LoadWarning::MissingFile {
                        id: element.id(),
                        file_id: image.file_id.clone(),
                    });
                }
            }
            scene.add_element(element);
        }
        (scene, warnings)
    }
}

/// Parse raw element objects, pulling ordering keys out for validation.
fn read_elements(values: &[serde_json::Value], warnings: &mut Vec<LoadWarning>) -> Vec<Element> {
    let mut seen = HashSet::new();
    let mut elements = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        let mut value = value.clone();
        let element_type = value.get("type").and_then(|t| t.as_str()).map(str::to_string);
        if let Some(element_type) = &element_type {
            if !ELEMENT_TYPES.contains(&element_type.as_str()) {
                warnings.push(LoadWarning::UnknownElementType {
                    index,
                    element_type: element_type.clone(),
                });
                continue;
            }
        }

        let raw_key = value.as_object_mut().and_then(|o| o.remove("index"));
        let mut element: Element = match serde_json::from_value(value) {
            Ok(element) => element,
            Err(err) => {
                warnings.push(LoadWarning::MalformedElement {
                    index,
                    message: err.to_string(),
                });
                continue;
            }
        };
        if !seen.insert(element.id()) {
            warnings.push(LoadWarning::DuplicateId { id: element.id() });
            continue;
        }

        element.index = match raw_key {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(key)) => match OrderKey::parse(&key) {
                Ok(key) => Some(key),
                Err(_) => {
                    warnings.push(LoadWarning::InvalidOrderKey { id: element.id(), key });
                    None
                }
            },
            Some(other) => {
                warnings.push(LoadWarning::InvalidOrderKey {
                    id: element.id(),
                    key: other.to_string(),
                });
                None
            }
        };
        elements.push(element);
    }
    elements
}

/// Give keyless elements keys that keep the array order. Falls back to
/// renumbering everything when existing keys are out of order.
fn assign_missing_keys(elements: &mut [Element], warnings: &mut Vec<LoadWarning>) {
    let in_order = elements
        .iter()
        .filter_map(|e| e.index.as_ref())
        .collect::<Vec<_>>()
        .windows(2)
        .all(|w| w[0] < w[1]);

    if in_order && fill_key_gaps(elements) {
        return;
    }

    log::warn!("ordering keys out of order, renumbering {} elements", elements.len());
    for element in elements.iter() {
        if let Some(key) = &element.index {
            warnings.push(LoadWarning::InvalidOrderKey {
                id: element.id(),
                key: key.as_str().to_string(),
            });
        }
    }
    if let Ok(keys) = OrderKey::n_keys_between(elements.len(), None, None) {
        for (element, key) in elements.iter_mut().zip(keys) {
            element.index = Some(key);
        }
    }
}

/// Fill each run of keyless elements between its neighbours' keys.
fn fill_key_gaps(elements: &mut [Element]) -> bool {
    let mut i = 0;
    while i < elements.len() {
        if elements[i].index.is_some() {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < elements.len() && elements[i].index.is_none() {
            i += 1;
        }
        let lower = run_start.checked_sub(1).and_then(|j| elements[j].index.clone());
        let upper = elements.get(i).and_then(|e| e.index.clone());
        let Ok(keys) = OrderKey::n_keys_between(i - run_start, lower.as_ref(), upper.as_ref()) else {
            return false;
        };
        for (element, key) in elements[run_start..i].iter_mut().zip(keys) {
            element.index = Some(key);
        }
    }
    true
}

/// Drop references to absent elements and make one-sided relations
/// two-sided again.
fn repair_references(elements: &mut [Element], warnings: &mut Vec<LoadWarning>) {
    let ids: HashSet<ElementId> = elements.iter().map(|e| e.id()).collect();

    for element in elements.iter_mut() {
        let id = element.id();
        if let Some(container) = element.container_id {
            if !ids.contains(&container) {
                warnings.push(LoadWarning::DanglingReference { id, missing: container });
                element.container_id = None;
            }
        }
        element.bound_elements.retain(|b| {
            let present = ids.contains(&b.id);
            if !present {
                warnings.push(LoadWarning::DanglingReference { id, missing: b.id });
            }
            present
        });
        if let Some(data) = element.linear_mut() {
            for end in [Endpoint::Start, Endpoint::End] {
                if let Some(binding) = data.binding(end).copied() {
                    if !ids.contains(&binding.element_id) {
                        warnings.push(LoadWarning::DanglingReference {
                            id,
                            missing: binding.element_id,
                        });
                        data.set_binding(end, None);
                    }
                }
            }
        }
    }

    let position: HashMap<ElementId, usize> =
        elements.iter().enumerate().map(|(i, e)| (e.id(), i)).collect();

    // Children pointing at a parent that does not list them.
    let mut missing_backrefs = Vec::new();
    for element in elements.iter() {
        let mut parents: Vec<ElementId> = element.container_id.into_iter().collect();
        if let Some(data) = element.linear() {
            parents.extend([data.start_binding, data.end_binding].into_iter().flatten().map(|b| b.element_id));
        }
        for parent in parents {
            if let Some(&p) = position.get(&parent) {
                if !elements[p].has_bound_element(element.id()) {
                    missing_backrefs.push((p, element.id(), element.element_type()));
                }
            }
        }
    }
    for (p, child, child_type) in missing_backrefs {
        if elements[p].add_bound_element(child, child_type) {
            warnings.push(LoadWarning::RepairedReference { id: elements[p].id(), other: child });
        }
    }

    // Parents listing a child that does not point back.
    for p in 0..elements.len() {
        let parent = elements[p].id();
        let stale: Vec<ElementId> = elements[p]
            .bound_elements
            .iter()
            .map(|b| b.id)
            .filter(|child| {
                position.get(child).is_some_and(|&c| {
                    let child = &elements[c];
                    child.container_id != Some(parent)
                        && !child.linear().is_some_and(|l| l.is_bound_to(parent))
                })
            })
            .collect();
        for child in stale {
            elements[p].remove_bound_element(child);
            warnings.push(LoadWarning::RepairedReference { id: parent, other: child });
        }
    }
}

/// Encodes and decodes scenes as bytes.
pub trait DocumentCodec {
    fn encode(&self, scene: &Scene) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<(Scene, Vec<LoadWarning>), CodecError>;
}

/// JSON document codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pub pretty: bool,
}

impl JsonCodec {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl DocumentCodec for JsonCodec {
    fn encode(&self, scene: &Scene) -> Result<Vec<u8>, CodecError> {
        let document = scene.to_document();
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&document)?
        } else {
            serde_json::to_vec(&document)?
        };
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<(Scene, Vec<LoadWarning>), CodecError> {
        let document: Document = serde_json::from_slice(bytes)?;
        if document.kind != DOCUMENT_TYPE {
            return Err(CodecError::UnsupportedType(document.kind));
        }
        if document.version > DOCUMENT_VERSION {
            return Err(CodecError::UnsupportedVersion(document.version));
        }
        let (scene, warnings) = Scene::from_document(&document);
        log::info!(
            "decoded document: {} elements, {} files, {} warnings",
            scene.len(),
            document.files.len(),
            warnings.len()
        );
        Ok((scene, warnings))
    }
}
