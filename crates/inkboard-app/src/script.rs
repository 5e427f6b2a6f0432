//! Scripted input events replayed through the editor.

use inkboard_core::{Editor, Key, ToolType};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// One recorded input event. Pointer positions are screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ScriptEvent {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        shift: bool,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp {
        x: f64,
        y: f64,
        #[serde(default)]
        double: bool,
    },
    Key {
        key: Key,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        ctrl: bool,
    },
    SetTool {
        tool: ToolType,
        #[serde(default)]
        locked: bool,
    },
    Pressure {
        value: f64,
    },
    Label {
        /// Index into the active elements, in paint order.
        element: usize,
        text: String,
    },
    Undo,
    Redo,
}

/// Counts of what a replay did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    pub undone: usize,
    pub redone: usize,
    pub skipped: usize,
}

/// Feed `events` to `editor` in order.
pub fn replay(editor: &mut Editor, events: &[ScriptEvent]) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for event in events {
        summary.events += 1;
        match event {
            ScriptEvent::PointerDown { x, y, shift } => editor.pointer_down(Point::new(*x, *y), *shift),
            ScriptEvent::PointerMove { x, y } => editor.pointer_move(Point::new(*x, *y)),
            ScriptEvent::PointerUp { x, y, double } => editor.pointer_up(Point::new(*x, *y), *double),
            ScriptEvent::Key { key, shift, ctrl } => editor.key(*key, *shift, *ctrl),
            ScriptEvent::SetTool { tool, locked } => {
                editor.set_tool(*tool);
                editor.set_tool_locked(*locked);
            }
            ScriptEvent::Pressure { value } => editor.set_pressure(*value),
            ScriptEvent::Label { element, text } => {
                let target = editor.scene().active_elements().get(*element).map(|e| e.id());
                match target.and_then(|id| editor.add_label(id, text)) {
                    Some(_) => {}
                    None => {
                        log::warn!("event {}: element {} cannot take a label", summary.events, element);
                        summary.skipped += 1;
                    }
                }
            }
            ScriptEvent::Undo => {
                if editor.undo() {
                    summary.undone += 1;
                } else {
                    summary.skipped += 1;
                }
            }
            ScriptEvent::Redo => {
                if editor.redo() {
                    summary.redone += 1;
                } else {
                    summary.skipped += 1;
                }
            }
        }
    }
    summary
}
