use crate::config::LayoutConfig;

/// Fixed node geometry: every goal is a `width x height` box with a round
/// icon of diameter `icon_size` centered inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBox {
    pub width: f32,
    pub height: f32,
    pub icon_size: f32,
}

impl NodeBox {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            width: config.node_width,
            height: config.node_height,
            icon_size: config.icon_size,
        }
    }

    pub fn icon_radius(&self) -> f32 {
        self.icon_size / 2.0
    }

    pub fn center(&self, x: i32, y: i32) -> (f32, f32) {
        (x as f32 + self.width / 2.0, y as f32 + self.height / 2.0)
    }
}

impl Default for NodeBox {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct NodeLayout {
    /// Row index in the sheet.
    pub index: usize,
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub icon_size: f32,
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub link: Option<String>,
}

impl NodeLayout {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Straight parent-to-child line, already trimmed to the icon outlines.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub parent: usize,
    pub child: usize,
    pub parent_id: String,
    pub child_id: String,
    pub start: (f32, f32),
    pub end: (f32, f32),
}

impl Connector {
    pub fn length(&self) -> f32 {
        (self.end.0 - self.start.0).hypot(self.end.1 - self.start.1)
    }

    /// Direction of the line in radians, as used by a `rotate()` transform.
    pub fn angle(&self) -> f32 {
        (self.end.1 - self.start.1).atan2(self.end.0 - self.start.0)
    }
}

#[derive(Debug, Clone)]
pub struct TreeLayout {
    pub sheet: String,
    pub nodes: Vec<NodeLayout>,
    pub connectors: Vec<Connector>,
    /// Whether positions came from auto-layout rather than the input.
    pub auto_placed: bool,
    /// Right and bottom edge of the furthest node box.
    pub width: f32,
    pub height: f32,
}

impl TreeLayout {
    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().rev().find(|node| node.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
