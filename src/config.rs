use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Horizontal gap between sibling class boxes in the tree.
    pub node_spacing: f32,
    /// Vertical gap between hierarchy ranks.
    pub rank_spacing: f32,
    pub node_padding_x: f32,
    pub node_padding_y: f32,
    pub label_line_height: f32,
    /// Fixed column holding the visibility glyph at the start of each
    /// member row.
    pub visibility_column_width: f32,
    /// Gap between the laid-out hierarchy and the row of classes that are
    /// not attached to any generalization link.
    pub detached_row_gap: f32,
    pub margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: 30.0,
            rank_spacing: 60.0,
            node_padding_x: 10.0,
            node_padding_y: 6.0,
            label_line_height: 1.35,
            visibility_column_width: 12.0,
            detached_row_gap: 100.0,
            margin: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

/// On-disk config shape: a theme preset name plus individual overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutVariables>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    header_font_size: Option<f32>,
    class_fill: Option<String>,
    class_border: Option<String>,
    text_color: Option<String>,
    line_color: Option<String>,
    arrow_fill: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutVariables {
    node_spacing: Option<f32>,
    rank_spacing: Option<f32>,
    detached_row_gap: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;
    apply_config_file(&mut config, parsed);
    Ok(config)
}

fn apply_config_file(config: &mut Config, parsed: ConfigFile) {
    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "classic" || theme_name == "default" {
            config.theme = Theme::classic();
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.header_font_size {
            config.theme.header_font_size = v;
        }
        if let Some(v) = vars.class_fill {
            config.theme.class_fill = v;
        }
        if let Some(v) = vars.class_border {
            config.theme.class_border = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.arrow_fill {
            config.theme.arrow_fill = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.node_spacing {
            config.layout.node_spacing = v;
        }
        if let Some(v) = layout.rank_spacing {
            config.layout.rank_spacing = v;
        }
        if let Some(v) = layout.detached_row_gap {
            config.layout.detached_row_gap = v;
        }
    }
}
