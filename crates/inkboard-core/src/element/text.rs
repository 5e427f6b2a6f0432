//! Text payload.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Default font size in world units.
pub const DEFAULT_FONT_SIZE: f64 = 20.0;

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f64 = 1.25;

/// Average glyph advance as a multiple of the font size.
const AVERAGE_ADVANCE: f64 = 0.6;

/// Font family options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    /// Hand-drawn style font.
    #[default]
    Hand,
    Sans,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Text content and typography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    pub text: String,
    pub font_size: f64,
    #[serde(default)]
    pub font_family: FontFamily,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub vertical_align: VerticalAlign,
}

impl TextData {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
            text_align: TextAlign::default(),
            vertical_align: VerticalAlign::default(),
        }
    }

    /// Approximate laid-out size. Exact metrics belong to the renderer.
    pub fn estimated_size(&self) -> Size {
        let lines: Vec<&str> = self.text.split('\n').collect();
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        Size::new(
            (longest.max(1) as f64) * self.font_size * AVERAGE_ADVANCE,
            lines.len() as f64 * self.font_size * LINE_HEIGHT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimated_size_grows_with_lines() {
        let one = TextData::new("hello").estimated_size();
        let two = TextData::new("hello\nworld").estimated_size();
        assert!((one.width - two.width).abs() < f64::EPSILON);
        assert!((two.height - 2.0 * one.height).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_text_has_size() {
        let size = TextData::new("").estimated_size();
        assert!(size.width > 0.0 && size.height > 0.0);
    }
}
