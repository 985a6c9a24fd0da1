mod routing;
mod tree;
mod types;

pub use routing::{route_connectors, trim_segment};
pub use tree::{auto_layout, tree_positions};
pub use types::*;

use crate::config::LayoutConfig;
use crate::hierarchy::Hierarchy;
use crate::ir::Sheet;

/// Lays out a copy of `sheet` and routes its connectors. The input is left
/// untouched.
pub fn compute_layout(sheet: &Sheet, config: &LayoutConfig) -> TreeLayout {
    let mut sheet = sheet.clone();
    layout_sheet(&mut sheet, config)
}

/// Runs the whole pipeline on `sheet`, keeping auto-assigned coordinates in
/// it. Connectors are routed only after every position is final.
pub fn layout_sheet(sheet: &mut Sheet, config: &LayoutConfig) -> TreeLayout {
    let auto_placed = auto_layout(sheet, config);
    let node_box = NodeBox::from_config(config);
    let hierarchy = Hierarchy::build(sheet);
    let connectors = route_connectors(&hierarchy, &node_box);
    build_layout(sheet, connectors, auto_placed, &node_box, config)
}

/// Re-routes connectors for an already positioned sheet, e.g. after a
/// viewport resize.
pub fn reroute(layout: &mut TreeLayout, sheet: &Sheet, config: &LayoutConfig) {
    let node_box = NodeBox::from_config(config);
    let hierarchy = Hierarchy::build(sheet);
    layout.connectors = route_connectors(&hierarchy, &node_box);
}

fn build_layout(
    sheet: &Sheet,
    connectors: Vec<Connector>,
    auto_placed: bool,
    node_box: &NodeBox,
    config: &LayoutConfig,
) -> TreeLayout {
    let nodes: Vec<NodeLayout> = sheet
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| NodeLayout {
            index,
            id: node.id.clone(),
            x: node.x as f32,
            y: node.y as f32,
            width: node_box.width,
            height: node_box.height,
            icon_size: node_box.icon_size,
            name: node.name.clone(),
            description: node.description.clone(),
            icon: node.icon_href(&config.image_dir),
            link: node.link().map(str::to_string),
        })
        .collect();

    let mut width: f32 = 0.0;
    let mut height: f32 = 0.0;
    for node in &nodes {
        width = width.max(node.x + node.width);
        height = height.max(node.y + node.height);
    }

    log::debug!(
        "layout '{}': {} goals, {} connectors",
        sheet.name,
        nodes.len(),
        connectors.len()
    );

    TreeLayout {
        sheet: sheet.name.clone(),
        nodes,
        connectors,
        auto_placed,
        width,
        height,
    }
}
