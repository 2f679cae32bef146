//! Per-dataset contour styling.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::contour::Polarity;
use crate::error::{ContourError, Result};
use crate::levels::levels;

/// Stroke settings applied before a contour is walked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: [u8; 4],
    pub width: f64,
}

/// Contour configuration for one dataset, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourStyle {
    /// Lowest contour level (absolute intensity)
    pub base_level: f64,
    /// Ratio between consecutive levels
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Number of levels per polarity
    #[serde(default = "default_n_levels")]
    pub n_levels: usize,
    #[serde(default = "default_positive_color", deserialize_with = "de_color")]
    pub positive_color: [u8; 4],
    #[serde(default = "default_negative_color", deserialize_with = "de_color")]
    pub negative_color: [u8; 4],
    #[serde(default = "default_width")]
    pub positive_width: f64,
    #[serde(default = "default_width")]
    pub negative_width: f64,
    #[serde(default = "default_true")]
    pub draw_positive: bool,
    #[serde(default = "default_true")]
    pub draw_negative: bool,
}

fn default_multiplier() -> f64 {
    1.2
}

fn default_n_levels() -> usize {
    20
}

fn default_positive_color() -> [u8; 4] {
    [0, 0, 0, 255]
}

fn default_negative_color() -> [u8; 4] {
    [255, 0, 0, 255]
}

fn default_width() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

impl Default for ContourStyle {
    fn default() -> Self {
        Self {
            base_level: 1.0,
            multiplier: default_multiplier(),
            n_levels: default_n_levels(),
            positive_color: default_positive_color(),
            negative_color: default_negative_color(),
            positive_width: default_width(),
            negative_width: default_width(),
            draw_positive: true,
            draw_negative: true,
        }
    }
}

impl ContourStyle {
    /// Level magnitudes for this style.
    pub fn levels(&self) -> Vec<f64> {
        levels(self.base_level, self.multiplier, self.n_levels)
    }

    /// Polarities enabled for drawing, positive first.
    pub fn polarities(&self) -> Vec<Polarity> {
        let mut out = Vec::with_capacity(2);
        if self.draw_positive {
            out.push(Polarity::Positive);
        }
        if self.draw_negative {
            out.push(Polarity::Negative);
        }
        out
    }

    pub fn stroke(&self, polarity: Polarity) -> StrokeStyle {
        match polarity {
            Polarity::Positive => StrokeStyle {
                color: self.positive_color,
                width: self.positive_width,
            },
            Polarity::Negative => StrokeStyle {
                color: self.negative_color,
                width: self.negative_width,
            },
        }
    }

    /// Validate a style read from configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n_levels == 0 {
            return Err(ContourError::Style("n_levels must be > 0".to_string()));
        }
        if !(self.multiplier > 0.0) {
            return Err(ContourError::Style("multiplier must be > 0".to_string()));
        }
        if !(self.base_level > 0.0) {
            return Err(ContourError::Style("base_level must be > 0".to_string()));
        }
        if self.positive_width <= 0.0 || self.negative_width <= 0.0 {
            return Err(ContourError::Style("line widths must be > 0".to_string()));
        }
        Ok(())
    }

    /// Load and validate a style from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        let style: Self = serde_json::from_str(json_str)?;
        style.validate()?;
        Ok(style)
    }

    /// Load and validate a style from a JSON file.
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// A file holding several named dataset styles.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleConfig {
    pub version: String,
    pub styles: HashMap<String, ContourStyle>,
}

impl StyleConfig {
    /// Load style configuration from JSON string
    pub fn from_json(json_str: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json_str)?;
        for style in config.styles.values() {
            style.validate()?;
        }
        Ok(config)
    }

    /// Load style configuration from file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Get a specific style definition
    pub fn get_style(&self, name: &str) -> Option<&ContourStyle> {
        self.styles.get(name)
    }
}

/// Colors are written either as `[r, g, b, a]` or as a hex string.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Rgba([u8; 4]),
    Hex(String),
}

fn de_color<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<[u8; 4], D::Error> {
    match ColorRepr::deserialize(deserializer)? {
        ColorRepr::Rgba(rgba) => Ok(rgba),
        ColorRepr::Hex(hex) => hex_to_rgba(&hex)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{}'", hex))),
    }
}

/// Parse hex color string (`#rrggbb` or `#rrggbbaa`) to RGBA
pub fn hex_to_rgba(hex: &str) -> Option<[u8; 4]> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    let a = if hex.len() == 8 {
        u8::from_str_radix(&hex[6..8], 16).ok()?
    } else {
        255
    };

    Some([r, g, b, a])
}
