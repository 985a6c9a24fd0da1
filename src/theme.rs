use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub line_color: String,
    pub line_width: f32,
    pub icon_fill: String,
    pub icon_border: String,
    pub icon_border_width: f32,
    pub text_color: String,
    pub tooltip_background: String,
    pub tooltip_text_color: String,
    pub tab_background: String,
    pub tab_active_background: String,
}

impl Theme {
    /// Colors of the original web page: grey connectors, white icons.
    pub fn classic() -> Self {
        Self {
            font_family: "\"Hiragino Sans\", \"Noto Sans JP\", Meiryo, sans-serif".to_string(),
            font_size: 12.0,
            background: "#FFFFFF".to_string(),
            line_color: "#888888".to_string(),
            line_width: 2.0,
            icon_fill: "#F4F4F4".to_string(),
            icon_border: "#4A90E2".to_string(),
            icon_border_width: 3.0,
            text_color: "#333333".to_string(),
            tooltip_background: "rgba(0, 0, 0, 0.85)".to_string(),
            tooltip_text_color: "#FFFFFF".to_string(),
            tab_background: "#E8E8E8".to_string(),
            tab_active_background: "#4A90E2".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            background: "#FFFFFF".to_string(),
            line_color: "#7A8AA6".to_string(),
            line_width: 1.6,
            icon_fill: "#F8FAFF".to_string(),
            icon_border: "#C7D2E5".to_string(),
            icon_border_width: 2.0,
            text_color: "#1C2430".to_string(),
            tooltip_background: "#1C2430".to_string(),
            tooltip_text_color: "#F8FAFF".to_string(),
            tab_background: "#EEF2F8".to_string(),
            tab_active_background: "#7A8AA6".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "classic" | "default" => Some(Self::classic()),
            "modern" => Some(Self::modern()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
