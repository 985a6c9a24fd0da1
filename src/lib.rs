pub mod app;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod hierarchy;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod share;
pub mod theme;

pub use app::{App, DisplayState, Notice, NoticeLevel};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, ViewMode};
pub use hierarchy::Hierarchy;
pub use ir::{GoalNode, Sheet, Workbook};
pub use layout::{Connector, NodeBox, TreeLayout, auto_layout, compute_layout, route_connectors};
pub use parser::{Delimiter, ParseError, parse_sheet};
pub use render::{RenderOptions, render_html, render_svg};
pub use share::{ShareError, ShareLink, decode_payload, encode_sheet, share_url};
pub use theme::Theme;

/// Parses delimited text and renders its tree to SVG in one call.
pub fn render_text_svg(
    name: &str,
    text: &str,
    delimiter: Delimiter,
    config: &Config,
    options: &RenderOptions,
) -> Result<String, ParseError> {
    let sheet = parse_sheet(name, text, delimiter)?;
    let layout = compute_layout(&sheet, &config.layout);
    Ok(render_svg(&layout, &config.theme, options))
}
