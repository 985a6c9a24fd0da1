use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry used by auto-layout and connector routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// x of every auto-placed root.
    pub root_x: i32,
    /// y of the first auto-placed root.
    pub root_y: i32,
    /// Vertical distance between consecutive roots.
    pub root_gap: i32,
    /// Horizontal distance from a parent to its children.
    pub level_step: i32,
    /// Vertical distance between consecutive siblings.
    pub sibling_step: i32,
    pub node_width: f32,
    pub node_height: f32,
    pub icon_size: f32,
    /// Directory that relative icon references resolve against.
    pub image_dir: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root_x: 100,
            root_y: 100,
            root_gap: 200,
            level_step: 250,
            sibling_step: 150,
            node_width: 90.0,
            node_height: 60.0,
            icon_size: 60.0,
            image_dir: "images".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Hover shows the tooltip, click opens the link.
    #[default]
    Pc,
    /// First tap shows the tooltip, second tap opens the link.
    Sp,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Pc => Self::Sp,
            Self::Sp => Self::Pc,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Viewport width in CSS pixels; narrow viewports start zoomed out.
    pub width: f32,
    pub height: f32,
    pub view_mode: ViewMode,
    pub narrow_width: f32,
    pub narrow_zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_in_factor: f32,
    pub zoom_out_factor: f32,
    /// Canvas padding around the outermost node boxes.
    pub margin: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            view_mode: ViewMode::Pc,
            narrow_width: 768.0,
            narrow_zoom: 0.8,
            min_zoom: 0.3,
            max_zoom: 3.0,
            zoom_in_factor: 1.2,
            zoom_out_factor: 0.8,
            margin: 40.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutOverrides>,
    view_mode: Option<ViewMode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    line_color: Option<String>,
    line_width: Option<f32>,
    icon_fill: Option<String>,
    icon_border: Option<String>,
    text_color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOverrides {
    root_x: Option<i32>,
    root_y: Option<i32>,
    root_gap: Option<i32>,
    level_step: Option<i32>,
    sibling_step: Option<i32>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    icon_size: Option<f32>,
    image_dir: Option<String>,
}

/// Loads a JSON5 config file on top of the defaults. `None` yields defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match Theme::by_name(theme_name) {
            Some(theme) => config.theme = theme,
            None => log::warn!("unknown theme '{theme_name}', keeping the default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.line_width {
            config.theme.line_width = v;
        }
        if let Some(v) = vars.icon_fill {
            config.theme.icon_fill = v;
        }
        if let Some(v) = vars.icon_border {
            config.theme.icon_border = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
    }

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.root_x {
            target.root_x = v;
        }
        if let Some(v) = layout.root_y {
            target.root_y = v;
        }
        if let Some(v) = layout.root_gap {
            target.root_gap = v;
        }
        if let Some(v) = layout.level_step {
            target.level_step = v;
        }
        if let Some(v) = layout.sibling_step {
            target.sibling_step = v;
        }
        if let Some(v) = layout.node_width {
            target.node_width = v.max(1.0);
        }
        if let Some(v) = layout.node_height {
            target.node_height = v.max(1.0);
        }
        if let Some(v) = layout.icon_size {
            target.icon_size = v.max(0.0);
        }
        if let Some(v) = layout.image_dir {
            target.image_dir = v;
        }
    }

    if let Some(mode) = parsed.view_mode {
        config.render.view_mode = mode;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_geometry() {
        let layout = LayoutConfig::default();
        assert_eq!((layout.root_x, layout.root_y), (100, 100));
        assert_eq!(layout.root_gap, 200);
        assert_eq!(layout.level_step, 250);
        assert_eq!(layout.sibling_step, 150);
        assert_eq!(layout.icon_size, 60.0);
    }

    #[test]
    fn json5_overrides_apply() {
        let config = parse_config(
            r##"{
                // comments are allowed
                theme: "modern",
                themeVariables: { lineColor: "#ff0000" },
                layout: { siblingStep: 120, imageDir: "assets/icons" },
                viewMode: "sp",
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.line_color, "#ff0000");
        assert_eq!(config.theme.font_size, Theme::modern().font_size);
        assert_eq!(config.layout.sibling_step, 120);
        assert_eq!(config.layout.level_step, 250);
        assert_eq!(config.layout.image_dir, "assets/icons");
        assert_eq!(config.render.view_mode, ViewMode::Sp);
    }

    #[test]
    fn background_lives_on_the_theme() {
        let config = parse_config(r##"{ themeVariables: { background: "#101820" } }"##).unwrap();
        assert_eq!(config.theme.background, "#101820");
        assert_eq!(Config::default().theme.background, Theme::classic().background);
    }

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout, LayoutConfig::default());
    }
}
