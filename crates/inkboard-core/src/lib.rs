//! Inkboard Core Library
//!
//! Platform-agnostic editing core for the Inkboard whiteboard: the scene
//! model, tools, arrow binding, history and persistence.

pub mod binding;
pub mod clipboard;
pub mod config;
pub mod document;
pub mod editor;
pub mod elbow;
pub mod element;
pub mod files;
pub mod geometry;
pub mod history;
pub mod image;
pub mod order_key;
pub mod scene;
pub mod state;
pub mod storage;
pub mod tools;
pub mod viewport;

pub use self::image::{ImageDecoder, ImageError, RasterDecoder};
pub use clipboard::{ClipboardContent, ClipboardError, ClipboardService, MemoryClipboard};
pub use config::{ConfigError, EditorConfig};
pub use document::{CodecError, Document, DocumentCodec, JsonCodec, LoadWarning};
pub use editor::Editor;
pub use element::{Element, ElementId, ElementKind, ElementType, Style};
pub use files::{FileBlob, FileId};
pub use history::History;
pub use order_key::OrderKey;
pub use scene::Scene;
pub use state::{EditorState, ToolResult, apply_result};
pub use storage::{DocumentStore, FileStore, MemoryStore, StorageError, load_scene, save_scene};
pub use tools::{Key, Overlay, ToolType};
pub use viewport::Viewport;
