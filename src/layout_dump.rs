use crate::layout::TreeLayout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub sheet: String,
    pub auto_placed: bool,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub connectors: Vec<ConnectorDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub icon: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConnectorDump {
    pub parent: String,
    pub child: String,
    pub start: [f32; 2],
    pub end: [f32; 2],
    pub length: f32,
    pub angle: f32,
}

impl LayoutDump {
    pub fn from_layout(layout: &TreeLayout) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                name: node.name.clone(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                icon: node.icon.clone(),
                link: node.link.clone(),
            })
            .collect();

        let connectors = layout
            .connectors
            .iter()
            .map(|connector| ConnectorDump {
                parent: connector.parent_id.clone(),
                child: connector.child_id.clone(),
                start: [connector.start.0, connector.start.1],
                end: [connector.end.0, connector.end.1],
                length: connector.length(),
                angle: connector.angle(),
            })
            .collect();

        LayoutDump {
            sheet: layout.sheet.clone(),
            auto_placed: layout.auto_placed,
            width: layout.width,
            height: layout.height,
            nodes,
            connectors,
        }
    }
}

pub fn layout_dump_json(layout: &TreeLayout) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&LayoutDump::from_layout(layout))?)
}

pub fn write_layout_dump(path: &Path, layout: &TreeLayout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::{GoalNode, Sheet};
    use crate::layout::compute_layout;

    #[test]
    fn dump_lists_nodes_and_connectors() {
        let sheet = Sheet::new(
            "s",
            vec![GoalNode::new("1", "", "A"), GoalNode::new("2", "1", "B")],
        );
        let layout = compute_layout(&sheet, &LayoutConfig::default());
        let json: serde_json::Value =
            serde_json::from_str(&layout_dump_json(&layout).unwrap()).unwrap();
        assert_eq!(json["nodes"].as_array().map(Vec::len), Some(2));
        assert_eq!(json["connectors"][0]["parent"], "1");
        assert_eq!(json["connectors"][0]["start"][0], 175.0);
        assert_eq!(json["auto_placed"], true);
    }
}
