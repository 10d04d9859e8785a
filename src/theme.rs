use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub header_font_size: f32,
    pub class_fill: String,
    pub class_border: String,
    pub text_color: String,
    pub line_color: String,
    /// Arrowhead interior; generalization and aggregation heads are hollow.
    pub arrow_fill: String,
    pub background: String,
}

impl Theme {
    /// The look of the original documentation page: light yellow class
    /// boxes and a monospace face.
    pub fn classic() -> Self {
        Self {
            font_family: "\"Ubuntu Mono\", monospace".to_string(),
            font_size: 13.0,
            header_font_size: 16.0,
            class_fill: "lightyellow".to_string(),
            class_border: "#333333".to_string(),
            text_color: "#000000".to_string(),
            line_color: "#333333".to_string(),
            arrow_fill: "#FFFFFF".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            header_font_size: 15.0,
            class_fill: "#F8FAFF".to_string(),
            class_border: "#C7D2E5".to_string(),
            text_color: "#1C2430".to_string(),
            line_color: "#7A8AA6".to_string(),
            arrow_fill: "#FFFFFF".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
