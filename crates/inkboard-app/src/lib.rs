//! Inkboard Application
//!
//! A headless shell around the editing core: loads a document, replays a
//! script of input events and writes the result back.

mod app;
mod script;
mod shortcuts;

pub use app::{AppArgs, AppError, load_config, load_script, run, run_with_files};
pub use script::{ReplaySummary, ScriptEvent, replay};
pub use shortcuts::{Shortcut, ShortcutRegistry};
