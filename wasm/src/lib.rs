use progress_tree::layout_dump::layout_dump_json;
use progress_tree::parser::{Delimiter, parse_sheet, sheet_name_from_path};
use progress_tree::{
    Config, RenderOptions, ShareLink, Sheet, Theme, ViewMode, compute_layout, render_svg, share_url,
};
use serde::Deserialize;
use std::path::Path;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    zoom: Option<f32>,
    mode: Option<String>,
    image_dir: Option<String>,
}

fn build_options(options: TreeRenderOptions) -> (Config, RenderOptions) {
    let mut config = Config::default();
    if let Some(theme) = options.theme.as_deref().and_then(Theme::by_name) {
        config.theme = theme;
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(image_dir) = options.image_dir {
        config.layout.image_dir = image_dir;
    }
    let render_options = RenderOptions {
        zoom: options.zoom.unwrap_or(1.0).clamp(config.render.min_zoom, config.render.max_zoom),
        view_mode: match options.mode.as_deref() {
            Some("sp") => ViewMode::Sp,
            _ => ViewMode::Pc,
        },
        margin: config.render.margin,
        share_url: None,
    };
    (config, render_options)
}

fn parse_options(options_json: Option<String>) -> Result<TreeRenderOptions, JsValue> {
    match options_json {
        Some(raw) => {
            serde_json::from_str(&raw).map_err(|error| JsValue::from_str(&error.to_string()))
        }
        None => Ok(TreeRenderOptions::default()),
    }
}

fn parse_file(file_name: &str, text: &str) -> Result<Sheet, JsValue> {
    let path = Path::new(file_name);
    let delimiter = Delimiter::from_path(path).unwrap_or_else(|| Delimiter::sniff(text));
    parse_sheet(&sheet_name_from_path(path), text, delimiter)
        .map_err(|error| JsValue::from_str(&format!("{file_name}: {error}")))
}

/// Renders an uploaded CSV/TSV file to SVG.
#[wasm_bindgen]
pub fn render_goal_tree_svg(
    file_name: &str,
    text: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    let (config, render_options) = build_options(parse_options(options_json)?);
    let sheet = parse_file(file_name, text)?;
    let layout = compute_layout(&sheet, &config.layout);
    Ok(render_svg(&layout, &config.theme, &render_options))
}

/// Renders the tree carried by a share link's query string.
#[wasm_bindgen]
pub fn render_share_link_svg(query: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let (config, render_options) = build_options(parse_options(options_json)?);
    let link =
        ShareLink::from_url(query).ok_or_else(|| JsValue::from_str("link has no tree data"))?;
    let sheet = link.restore().map_err(|error| JsValue::from_str(&error.to_string()))?;
    let layout = compute_layout(&sheet, &config.layout);
    Ok(render_svg(&layout, &config.theme, &render_options))
}

/// Builds the share link for an uploaded file, with positions filled in.
#[wasm_bindgen]
pub fn goal_tree_share_url(file_name: &str, text: &str, base: &str) -> Result<String, JsValue> {
    let mut sheet = parse_file(file_name, text)?;
    progress_tree::auto_layout(&mut sheet, &Config::default().layout);
    share_url(base, &sheet).map_err(|error| JsValue::from_str(&error.to_string()))
}

/// Node positions and connector segments as JSON, for hosts that draw
/// the tree themselves.
#[wasm_bindgen]
pub fn goal_tree_layout_json(file_name: &str, text: &str) -> Result<String, JsValue> {
    let sheet = parse_file(file_name, text)?;
    let layout = compute_layout(&sheet, &Config::default().layout);
    layout_dump_json(&layout).map_err(|error| JsValue::from_str(&error.to_string()))
}
