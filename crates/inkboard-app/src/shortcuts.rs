//! Keyboard shortcut listing.

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, ctrl: bool, shift: bool, description: &'static str) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Shortcuts the editor core handles.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("V", false, false, "Select tool"),
            Shortcut::new("H", false, false, "Hand tool"),
            Shortcut::new("R", false, false, "Rectangle"),
            Shortcut::new("D", false, false, "Diamond"),
            Shortcut::new("O", false, false, "Ellipse"),
            Shortcut::new("A", false, false, "Arrow"),
            Shortcut::new("L", false, false, "Line"),
            Shortcut::new("P", false, false, "Freedraw"),
            Shortcut::new("A", true, false, "Select all"),
            Shortcut::new("D", true, false, "Duplicate selection"),
            Shortcut::new("C", true, false, "Copy"),
            Shortcut::new("X", true, false, "Cut"),
            Shortcut::new("V", true, false, "Paste"),
            Shortcut::new("Z", true, false, "Undo"),
            Shortcut::new("Z", true, true, "Redo"),
            Shortcut::new("Y", true, false, "Redo"),
            Shortcut::new("Delete", false, false, "Delete selection"),
            Shortcut::new("Backspace", false, false, "Delete selection"),
            Shortcut::new("Arrows", false, false, "Nudge selection"),
            Shortcut::new("Arrows", false, true, "Nudge selection further"),
            Shortcut::new("Enter", false, false, "Finish polyline"),
            Shortcut::new("Escape", false, false, "Cancel current action"),
        ]
    }

    /// Print all shortcuts to stdout.
    pub fn print_all() {
        println!("\n=== Keyboard Shortcuts ===");
        for shortcut in Self::all() {
            println!("  {:20} {}", shortcut.format(), shortcut.description);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkboard_core::ToolType;

    #[test]
    fn test_format() {
        assert_eq!(Shortcut::new("Z", true, true, "Redo").format(), "Ctrl+Shift+Z");
        assert_eq!(Shortcut::new("Delete", false, false, "").format(), "Delete");
    }

    #[test]
    fn test_tool_letters_match_core() {
        for shortcut in ShortcutRegistry::all() {
            if shortcut.ctrl || shortcut.key.len() != 1 {
                continue;
            }
            let c = shortcut.key.chars().next().unwrap();
            assert!(ToolType::from_shortcut(c).is_some(), "{} is not a tool key", c);
        }
    }
}
