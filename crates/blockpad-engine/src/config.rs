//! Engine tunables.
//!
//! Every field has a default matching the editor's stock behaviour, so an
//! empty configuration file is valid. The `blockpad-config` crate loads
//! these from TOML.

use serde::{Deserialize, Serialize};

use crate::command::SlashCommand;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub geometry: GeometryConfig,
    pub classification: ClassificationConfig,
    pub commands: CommandConfig,
}

/// Thresholds used by visual-line detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Caret more than this many line-heights below the element top is not on the first line
    pub first_line_tolerance: f64,
    /// Bottom-proximity threshold when the element shows more than one visual line
    pub last_line_threshold_multi: f64,
    /// Bottom-proximity threshold for single-line content
    pub last_line_threshold_single: f64,
    /// Vertical slack when scanning back for the start of a visual line
    pub horizontal_tolerance_px: f64,
    /// Class of form-block title fields, which get a fixed line height
    pub large_label_class: String,
    pub large_label_line_height_px: f64,
    /// Base for `rem` line heights
    pub root_font_size_px: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            first_line_tolerance: 0.5,
            last_line_threshold_multi: 0.6,
            last_line_threshold_single: 0.9,
            horizontal_tolerance_px: 5.0,
            large_label_class: "large-label".to_string(),
            large_label_line_height_px: 30.0,
            root_font_size_px: 16.0,
        }
    }
}

/// Markers used when a block type has to be inferred from the DOM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub heading_classes: Vec<String>,
    /// Exact computed `font-size` that marks a heading
    pub heading_font_size: String,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            heading_classes: vec!["block-heading".to_string()],
            heading_font_size: "24px".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Character that opens command mode when typed at offset 0
    pub trigger: String,
    pub placeholder: String,
    /// Query length from which an unmatched query leaves command mode
    pub auto_exit_query_len: usize,
    pub catalogue: Vec<SlashCommand>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            trigger: "/".to_string(),
            placeholder: "Type a command".to_string(),
            auto_exit_query_len: 5,
            catalogue: SlashCommand::defaults(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_behaviour() {
        let config = EditorConfig::default();
        assert_eq!(config.geometry.last_line_threshold_multi, 0.6);
        assert_eq!(config.geometry.last_line_threshold_single, 0.9);
        assert_eq!(config.geometry.large_label_line_height_px, 30.0);
        assert_eq!(config.commands.trigger, "/");
        assert_eq!(config.commands.auto_exit_query_len, 5);
        assert_eq!(config.commands.catalogue.len(), 5);
    }
}
