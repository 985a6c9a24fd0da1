use crate::config::ViewMode;
#[cfg(feature = "png")]
use crate::config::RenderConfig;
use crate::layout::{Connector, NodeLayout, TreeLayout};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub zoom: f32,
    pub view_mode: ViewMode,
    /// Padding added right of and below the furthest node.
    pub margin: f32,
    /// Link shown in the HTML page so the active sheet can be shared.
    pub share_url: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            view_mode: ViewMode::Pc,
            margin: 40.0,
            share_url: None,
        }
    }
}

pub fn render_svg(layout: &TreeLayout, theme: &Theme, options: &RenderOptions) -> String {
    let zoom = options.zoom;
    let width = ((layout.width + options.margin) * zoom).max(200.0);
    let height = ((layout.height + options.margin) * zoom).max(200.0);
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<defs>");
    for node in layout.nodes.iter().filter(|node| node.icon.is_some()) {
        let (cx, cy) = node.center();
        svg.push_str(&format!(
            "<clipPath id=\"icon-clip-{}\"><circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{:.2}\"/></clipPath>",
            node.index,
            node.icon_size / 2.0
        ));
    }
    svg.push_str("</defs>");

    svg.push_str(&format!("<g transform=\"scale({zoom})\">"));
    for connector in &layout.connectors {
        svg.push_str(&connector_svg(connector, theme));
    }
    for node in &layout.nodes {
        svg.push_str(&node_svg(node, theme));
    }
    svg.push_str("</g></svg>");
    svg
}

fn connector_svg(connector: &Connector, theme: &Theme) -> String {
    format!(
        "<line class=\"tree-line\" x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\"/>",
        connector.start.0,
        connector.start.1,
        connector.end.0,
        connector.end.1,
        theme.line_color,
        theme.line_width
    )
}

fn node_svg(node: &NodeLayout, theme: &Theme) -> String {
    let (cx, cy) = node.center();
    let r = node.icon_size / 2.0;
    let mut out = String::new();

    out.push_str(&format!(
        "<g class=\"goal\" data-id=\"{}\">",
        escape_xml(&node.id)
    ));
    if let Some(link) = &node.link {
        out.push_str(&format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">",
            escape_xml(link)
        ));
    }
    out.push_str(&format!("<title>{}</title>", escape_xml(&tooltip_text(node))));
    out.push_str(&format!(
        "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{r:.2}\" fill=\"{}\"/>",
        theme.icon_fill
    ));
    if let Some(icon) = &node.icon {
        out.push_str(&format!(
            "<image href=\"{href}\" xlink:href=\"{href}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" preserveAspectRatio=\"xMidYMid slice\" clip-path=\"url(#icon-clip-{})\"/>",
            cx - r,
            cy - r,
            node.icon_size,
            node.icon_size,
            node.index,
            href = escape_xml(icon),
        ));
    }
    out.push_str(&format!(
        "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{r:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
        theme.icon_border,
        theme.icon_border_width
    ));
    let caption = truncate_caption(&node.name, node.width, theme.font_size);
    if !caption.is_empty() {
        let text_y = node.y + node.height + theme.font_size + 4.0;
        out.push_str(&format!(
            "<text x=\"{cx:.2}\" y=\"{text_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            escape_xml(&theme.font_family),
            theme.font_size,
            theme.text_color,
            escape_xml(&caption)
        ));
    }
    if node.link.is_some() {
        out.push_str("</a>");
    }
    out.push_str("</g>");
    out
}

fn tooltip_text(node: &NodeLayout) -> String {
    if node.description.is_empty() {
        node.name.clone()
    } else {
        format!("{}\n{}", node.name, node.description)
    }
}

/// Shortens `name` to roughly fit under a node box of `width`.
fn truncate_caption(name: &str, width: f32, font_size: f32) -> String {
    let per_char = (font_size * 0.6).max(1.0);
    let max_chars = ((width * 1.6) / per_char).floor().max(1.0) as usize;
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let mut out: String = name.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// A standalone page in the shape of the web viewer: a tab per sheet, goals
/// as absolutely positioned icons and connectors as rotated line divs.
/// Tabs switch through URL fragments.
pub fn render_html(
    layouts: &[TreeLayout],
    active: usize,
    theme: &Theme,
    options: &RenderOptions,
) -> String {
    let mut html = String::new();
    let title = layouts
        .get(active)
        .map(|layout| layout.sheet.as_str())
        .unwrap_or("progress tree");

    html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    html.push_str(&format!("<title>{}</title>", escape_xml(title)));
    html.push_str(&format!("<style>{}</style>", page_css(theme, options)));
    html.push_str("</head><body>");

    if layouts.len() > 1 {
        html.push_str("<nav class=\"tabs\">");
        for (idx, layout) in layouts.iter().enumerate() {
            let class = if idx == active { "tab active" } else { "tab" };
            html.push_str(&format!(
                "<a class=\"{class}\" href=\"#sheet-{idx}\">{}</a>",
                escape_xml(&layout.sheet)
            ));
        }
        html.push_str("</nav>");
    }

    if let Some(url) = &options.share_url {
        html.push_str(&format!(
            "<div class=\"share-url\"><input readonly value=\"{}\" onfocus=\"this.select()\"></div>",
            escape_xml(url)
        ));
    }

    html.push_str("<main class=\"sheets\">");
    for (idx, layout) in layouts.iter().enumerate() {
        let class = if idx == active { "sheet active" } else { "sheet" };
        html.push_str(&format!("<section id=\"sheet-{idx}\" class=\"{class}\">"));
        if layout.is_empty() {
            html.push_str("<div class=\"loading\">This sheet has no goals.</div>");
        } else {
            html.push_str(&tree_canvas_html(layout, options));
        }
        html.push_str("</section>");
    }
    html.push_str("</main></body></html>\n");
    html
}

fn tree_canvas_html(layout: &TreeLayout, options: &RenderOptions) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<div class=\"tree-container\"><div class=\"tree-canvas\" style=\"width:{:.0}px;height:{:.0}px;transform:scale({});transform-origin:0 0\">",
        layout.width + options.margin,
        layout.height + options.margin,
        options.zoom
    ));
    for connector in &layout.connectors {
        out.push_str(&format!(
            "<div class=\"tree-line\" style=\"width:{:.2}px;left:{:.2}px;top:{:.2}px;transform:rotate({:.6}rad)\"></div>",
            connector.length(),
            connector.start.0,
            connector.start.1,
            connector.angle()
        ));
    }
    for node in &layout.nodes {
        out.push_str(&node_html(node, options.view_mode));
    }
    out.push_str("</div></div>");
    out
}

fn node_html(node: &NodeLayout, mode: ViewMode) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<div class=\"tree-node\" data-id=\"{}\" style=\"left:{:.0}px;top:{:.0}px;width:{:.0}px;height:{:.0}px\">",
        escape_xml(&node.id),
        node.x,
        node.y,
        node.width,
        node.height
    ));
    let background = node
        .icon
        .as_deref()
        .map(|icon| format!(" style=\"background-image:url('{}')\"", escape_xml(&css_url(icon))))
        .unwrap_or_default();
    let tooltip = format!(
        "<b>{}</b><br>{}",
        escape_xml(&node.name),
        escape_xml(&node.description)
    );

    match (mode, &node.link) {
        (ViewMode::Pc, Some(link)) => {
            out.push_str(&format!(
                "<a class=\"tree-node-icon\" href=\"{}\" target=\"_blank\" rel=\"noopener\"{background}><span class=\"tooltip\">{tooltip}</span></a>",
                escape_xml(link)
            ));
        }
        (ViewMode::Pc, None) => {
            out.push_str(&format!(
                "<div class=\"tree-node-icon\"{background}><span class=\"tooltip\">{tooltip}</span></div>"
            ));
        }
        // First tap focuses the icon and shows the tooltip; the link inside
        // the tooltip is the second tap.
        (ViewMode::Sp, link) => {
            let open = link
                .as_ref()
                .map(|link| {
                    format!(
                        "<br><a href=\"{}\" target=\"_blank\" rel=\"noopener\">open</a>",
                        escape_xml(link)
                    )
                })
                .unwrap_or_default();
            out.push_str(&format!(
                "<div class=\"tree-node-icon\" tabindex=\"0\"{background}><span class=\"tooltip\">{tooltip}{open}</span></div>"
            ));
        }
    }
    out.push_str("</div>");
    out
}

fn page_css(theme: &Theme, options: &RenderOptions) -> String {
    let reveal = match options.view_mode {
        ViewMode::Pc => ".tree-node-icon:hover .tooltip",
        ViewMode::Sp => ".tree-node-icon:focus .tooltip,.tree-node-icon:focus-within .tooltip",
    };
    format!(
        "body{{margin:0;font-family:{font};background:{bg};color:{text}}}\
         .tabs{{display:flex;gap:4px;padding:8px}}\
         .tab{{padding:6px 14px;border-radius:6px 6px 0 0;background:{tab};color:{text};text-decoration:none}}\
         .tab.active{{background:{tab_active};color:#fff}}\
         .share-url{{padding:0 8px 8px}}.share-url input{{width:100%;box-sizing:border-box}}\
         .sheet{{display:none}}.sheet.active{{display:block}}\
         .sheets:has(.sheet:target) .sheet.active{{display:none}}.sheets .sheet:target{{display:block}}\
         .tree-container{{overflow:auto;position:relative}}\
         .tree-canvas{{position:relative}}\
         .tree-line{{position:absolute;height:{line_w}px;background:{line};transform-origin:0 0}}\
         .tree-node{{position:absolute;display:flex;align-items:center;justify-content:center}}\
         .tree-node-icon{{position:relative;display:block;width:60px;height:60px;border-radius:50%;\
         border:{border_w}px solid {border};background-color:{fill};background-size:cover;background-position:center;cursor:pointer;box-sizing:border-box}}\
         .tooltip{{display:none;position:absolute;left:70px;top:0;z-index:10;min-width:160px;padding:8px;\
         border-radius:6px;background:{tip_bg};color:{tip_text};font-size:{font_size}px}}\
         .tooltip a{{color:{tip_text}}}\
         {reveal}{{display:block}}\
         .loading{{padding:24px}}",
        font = theme.font_family,
        bg = theme.background,
        text = theme.text_color,
        tab = theme.tab_background,
        tab_active = theme.tab_active_background,
        line = theme.line_color,
        line_w = theme.line_width,
        border = theme.icon_border,
        border_w = theme.icon_border_width,
        fill = theme.icon_fill,
        tip_bg = theme.tooltip_background,
        tip_text = theme.tooltip_text_color,
        font_size = theme.font_size,
    )
}

/// Escapes the characters that would end a quoted CSS `url('...')`.
fn css_url(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\'' => out.push_str("%27"),
            '"' => out.push_str("%22"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            '\\' => out.push_str("%5C"),
            '\n' | '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

pub fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .unwrap_or(usvg::Size::from_wh(800.0, 600.0).unwrap());

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
