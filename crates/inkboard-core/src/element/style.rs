//! Visual style carried by every element.
//!
//! The core never paints. These fields are stored, copied onto new elements
//! and handed to whatever renders the scene.

use peniko::Color;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An sRGB color with alpha, persisted as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0x1e, 0x1e, 0x1e, 0xff]);
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Rgba([r, g, b, 0xff])
    }

    pub fn alpha(self) -> u8 {
        self.0[3]
    }

    /// Peniko color with the alpha scaled by `opacity`.
    pub fn to_color(self, opacity: f64) -> Color {
        let [r, g, b, a] = self.0;
        let alpha = (f64::from(a) * opacity.clamp(0.0, 1.0)).round() as u8;
        Color::from_rgba8(r, g, b, alpha)
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let c = color.to_rgba8();
        Rgba([c.r, c.g, c.b, c.a])
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 0xff {
            write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }
}

impl FromStr for Rgba {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|h| (h.len() == 6 || h.len() == 8) && h.is_ascii())
            .ok_or_else(|| format!("expected #rrggbb or #rrggbbaa, got {:?}", s))?;
        let mut channels = [0xff; 4];
        for (i, channel) in channels.iter_mut().enumerate().take(hex.len() / 2) {
            *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| format!("invalid hex color {:?}", s))?;
        }
        Ok(Rgba(channels))
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// How closed shapes are filled when they have a background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillStyle {
    #[default]
    Solid,
    Hachure,
    CrossHatch,
}

/// Outline dash pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    /// Dash and gap lengths for a stroke of `width`. `None` for solid.
    pub fn dash_pattern(self, width: f64) -> Option<[f64; 2]> {
        match self {
            StrokeStyle::Solid => None,
            StrokeStyle::Dashed => Some([width * 4.0, width * 4.0]),
            StrokeStyle::Dotted => Some([width, width * 2.0]),
        }
    }
}

/// Preset roughness levels of the hand-drawn look.
pub const ROUGHNESS_ARCHITECT: f64 = 0.0;
pub const ROUGHNESS_ARTIST: f64 = 1.0;
pub const ROUGHNESS_CARTOONIST: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub stroke_color: Rgba,
    /// `None` leaves closed shapes hollow.
    pub background_color: Option<Rgba>,
    pub fill_style: FillStyle,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    pub roughness: f64,
    /// `0.0..=1.0`, applied on top of each color's own alpha.
    pub opacity: f64,
    /// Keeps the hand-drawn jitter stable while the element is edited.
    pub seed: u32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke_color: Rgba::BLACK,
            background_color: None,
            fill_style: FillStyle::default(),
            stroke_width: 2.0,
            stroke_style: StrokeStyle::default(),
            roughness: ROUGHNESS_ARTIST,
            opacity: 1.0,
            seed: generate_seed(),
        }
    }
}

impl Style {
    pub fn stroke_paint(&self) -> Color {
        self.stroke_color.to_color(self.opacity)
    }

    pub fn fill_paint(&self) -> Option<Color> {
        self.background_color
            .filter(|c| c.alpha() > 0)
            .map(|c| c.to_color(self.opacity))
    }

    pub fn is_filled(&self) -> bool {
        self.fill_paint().is_some()
    }

    /// Same style with a fresh seed, for copies of an element.
    pub fn reseeded(&self) -> Self {
        Self {
            seed: generate_seed(),
            ..self.clone()
        }
    }
}

pub(crate) fn generate_seed() -> u32 {
    (uuid::Uuid::new_v4().as_u128() >> 96) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let opaque: Rgba = "#1971c2".parse().unwrap();
        assert_eq!(opaque, Rgba::opaque(0x19, 0x71, 0xc2));
        assert_eq!(opaque.to_string(), "#1971c2");

        let translucent: Rgba = "#ff000080".parse().unwrap();
        assert_eq!(translucent.alpha(), 0x80);
        assert_eq!(translucent.to_string(), "#ff000080");
    }

    #[test]
    fn test_rejects_bad_hex() {
        assert!("1971c2".parse::<Rgba>().is_err());
        assert!("#12345".parse::<Rgba>().is_err());
        assert!("#gg0000".parse::<Rgba>().is_err());
        assert!(serde_json::from_str::<Rgba>("\"red\"").is_err());
    }

    #[test]
    fn test_opacity_scales_alpha() {
        let style = Style {
            opacity: 0.5,
            ..Style::default()
        };
        assert_eq!(style.stroke_paint().to_rgba8().a, 128);
    }

    #[test]
    fn test_transparent_background_is_not_filled() {
        let mut style = Style::default();
        assert!(!style.is_filled());
        style.background_color = Some(Rgba::TRANSPARENT);
        assert!(!style.is_filled());
        style.background_color = Some(Rgba::opaque(255, 236, 153));
        assert!(style.is_filled());
    }

    #[test]
    fn test_partial_style_loads_with_defaults() {
        let style: Style = serde_json::from_str(r##"{"stroke_color":"#e03131","fill_style":"cross-hatch"}"##).unwrap();
        assert_eq!(style.stroke_color, Rgba::opaque(0xe0, 0x31, 0x31));
        assert_eq!(style.fill_style, FillStyle::CrossHatch);
        assert!((style.stroke_width - 2.0).abs() < f64::EPSILON);
        assert!((style.roughness - ROUGHNESS_ARTIST).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reseeded_keeps_everything_else() {
        let style = Style {
            stroke_style: StrokeStyle::Dotted,
            ..Style::default()
        };
        let copy = style.reseeded();
        assert_eq!(copy.stroke_style, StrokeStyle::Dotted);
        assert_eq!(Style { seed: style.seed, ..copy }, style);
        assert_eq!(StrokeStyle::Dotted.dash_pattern(2.0), Some([2.0, 4.0]));
    }
}
