//! Editor configuration.

use crate::coords::PlacementPolicy;
use crate::error::EditResult;
use crate::operations::HexColor;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Tunable defaults for the interactive editor.
///
/// Every field has a default, so a partial JSON document only overrides
/// what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub default_color: HexColor,
    /// Stroke width for shapes and ink, in page units.
    pub default_stroke_width: f64,
    pub default_font_size: f64,
    pub highlight_color: HexColor,
    pub highlight_opacity: f64,
    /// Size of a rectangle, highlight or eraser placed by a single click.
    pub default_box_size: Size,
    /// Diameter of a circle placed by a single click.
    pub default_circle_size: f64,
    /// Length of a horizontal line placed by a single click.
    pub default_line_length: f64,
    /// Extra page-space margin accepted around hit targets.
    pub hit_tolerance: f64,
    /// Canvas pixels the pointer must travel before a press becomes a drag.
    pub drag_slop: f64,
    /// Canvas pixels between a selected operation and its outline.
    pub selection_padding: f64,
    pub selection_color: HexColor,
    pub placement_policy: PlacementPolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_color: HexColor::BLACK,
            default_stroke_width: 2.0,
            default_font_size: 16.0,
            highlight_color: HexColor::YELLOW,
            highlight_opacity: 0.4,
            default_box_size: Size::new(100.0, 50.0),
            default_circle_size: 80.0,
            default_line_length: 100.0,
            hit_tolerance: 0.0,
            drag_slop: 3.0,
            selection_padding: 4.0,
            selection_color: HexColor::new(0x3b, 0x82, 0xf6),
            placement_policy: PlacementPolicy::Clamp,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> EditResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> EditResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(
            r##"{"default_color": "#ff0000", "placement_policy": "Reject"}"##,
        )
        .unwrap();
        assert_eq!(config.default_color, HexColor::new(255, 0, 0));
        assert_eq!(config.placement_policy, PlacementPolicy::Reject);
        assert!((config.default_font_size - 16.0).abs() < f64::EPSILON);
        assert_eq!(config.highlight_color, HexColor::YELLOW);
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = EditorConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(EditorConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_bad_color_is_an_error() {
        assert!(EditorConfig::from_json(r#"{"default_color": "blue"}"#).is_err());
    }
}
