//! Command-line driver: load, replay, save.

use crate::script::{ReplaySummary, ScriptEvent, replay};
use clap::Parser;
use inkboard_core::storage::{DocumentStore, load_scene, save_scene};
use inkboard_core::{ConfigError, Editor, EditorConfig, FileStore, JsonCodec, StorageError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No document given")]
    MissingDocument,
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid script: {0}")]
    Script(#[from] serde_json::Error),
}

/// Load a whiteboard document, replay scripted input and save the result.
#[derive(Parser, Debug, Clone, Default, PartialEq)]
#[command(name = "inkboard", version, about = "Headless whiteboard editor")]
pub struct AppArgs {
    /// Document to load. Created on save when missing.
    #[arg(required_unless_present = "shortcuts")]
    pub document: Option<PathBuf>,

    /// JSON array of input events to replay.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Editor config overrides.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write here instead of over the document.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Print the keyboard shortcuts.
    #[arg(long)]
    pub shortcuts: bool,
}

impl AppArgs {
    pub fn document(&self) -> Result<&Path, AppError> {
        self.document.as_deref().ok_or(AppError::MissingDocument)
    }

    /// Where the result is written.
    pub fn output_path(&self) -> Result<&Path, AppError> {
        match &self.out {
            Some(out) => Ok(out),
            None => self.document(),
        }
    }
}

fn read_file(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the editor config, falling back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<EditorConfig, AppError> {
    match path {
        Some(path) => Ok(EditorConfig::from_json(&read_file(path)?)?),
        None => Ok(EditorConfig::default()),
    }
}

/// Load the script, or an empty one.
pub fn load_script(path: Option<&Path>) -> Result<Vec<ScriptEvent>, AppError> {
    match path {
        Some(path) => Ok(serde_json::from_str(&read_file(path)?)?),
        None => Ok(Vec::new()),
    }
}

/// Run one load-replay-save cycle against `store`.
pub fn run(args: &AppArgs, store: &dyn DocumentStore) -> Result<ReplaySummary, AppError> {
    let config = load_config(args.config.as_deref())?;
    let events = load_script(args.script.as_deref())?;
    let codec = JsonCodec::pretty();
    let document = args.document()?;

    let (scene, warnings) = load_scene(store, &codec, document)?;
    for warning in &warnings {
        log::warn!("{}: {}", document.display(), warning);
    }
    log::info!("loaded {} elements from {}", scene.active_elements().len(), document.display());

    let mut editor = Editor::new(scene, config);
    let summary = replay(&mut editor, &events);
    log::info!(
        "replayed {} events ({} undone, {} redone, {} skipped), {} elements",
        summary.events,
        summary.undone,
        summary.redone,
        summary.skipped,
        editor.scene().active_elements().len()
    );

    save_scene(store, &codec, args.output_path()?, editor.scene())?;
    Ok(summary)
}

/// Run with documents resolved against the working directory.
pub fn run_with_files(args: &AppArgs) -> Result<ReplaySummary, AppError> {
    let store = FileStore::new(".")?;
    run(args, &store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::MemoryStore;
    use inkboard_core::document::DocumentCodec;
    use tempfile::tempdir;

    #[test]
    fn test_parse_args() {
        let args =
            AppArgs::try_parse_from(["inkboard", "doc.json", "--script", "s.json", "--out", "o.json"]).unwrap();
        assert_eq!(args.document, Some(PathBuf::from("doc.json")));
        assert_eq!(args.script, Some(PathBuf::from("s.json")));
        assert_eq!(args.config, None);
        assert_eq!(args.output_path().unwrap(), Path::new("o.json"));

        let args = AppArgs::try_parse_from(["inkboard", "doc.json"]).unwrap();
        assert_eq!(args.output_path().unwrap(), Path::new("doc.json"));
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(AppArgs::try_parse_from(["inkboard"]).is_err());
        assert!(AppArgs::try_parse_from(["inkboard", "doc.json", "--script"]).is_err());
        assert!(AppArgs::try_parse_from(["inkboard", "doc.json", "--bogus"]).is_err());
        assert!(AppArgs::try_parse_from(["inkboard", "a.json", "b.json"]).is_err());

        let args = AppArgs::try_parse_from(["inkboard", "--shortcuts"]).unwrap();
        assert!(args.shortcuts);
        assert!(matches!(args.output_path(), Err(AppError::MissingDocument)));
    }

    #[test]
    fn test_run_replays_into_store() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("events.json");
        fs::write(
            &script,
            r#"[
                {"event": "set-tool", "tool": "rectangle"},
                {"event": "pointer-down", "x": 10, "y": 20},
                {"event": "pointer-move", "x": 110, "y": 70},
                {"event": "pointer-up", "x": 110, "y": 70}
            ]"#,
        )
        .unwrap();

        let store = MemoryStore::new();
        let args = AppArgs {
            document: Some(PathBuf::from("board.json")),
            script: Some(script),
            ..AppArgs::default()
        };
        let summary = run(&args, &store).unwrap();
        assert_eq!(summary.events, 4);

        let bytes = store.read(Path::new("board.json")).unwrap();
        let (scene, warnings) = JsonCodec::default().decode(&bytes).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(scene.active_elements().len(), 1);
    }

    #[test]
    fn test_run_rejects_bad_config() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("cfg.json");
        fs::write(&config, r#"{"min_zoom": 5.0, "max_zoom": 1.0}"#).unwrap();
        let args = AppArgs {
            document: Some(PathBuf::from("board.json")),
            config: Some(config),
            ..AppArgs::default()
        };
        assert!(matches!(run(&args, &MemoryStore::new()), Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_script_file() {
        let args = AppArgs {
            document: Some(PathBuf::from("board.json")),
            script: Some(PathBuf::from("/nonexistent/events.json")),
            ..AppArgs::default()
        };
        assert!(matches!(run(&args, &MemoryStore::new()), Err(AppError::Read { .. })));
    }
}
