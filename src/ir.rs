use once_cell::sync::Lazy;
use regex::Regex;

static SCHEME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:https?:|data:|//)").unwrap());

/// One goal in a tree. Coordinates are canvas pixels of the node box's
/// top-left corner; `(0, 0)` means "not placed yet".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalNode {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub description: String,
    pub icon_url: String,
    pub url: String,
    pub x: i32,
    pub y: i32,
}

impl GoalNode {
    pub fn new(id: &str, parent_id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn is_unplaced(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    pub fn has_parent(&self) -> bool {
        !self.parent_id.is_empty()
    }

    /// Where the icon image should be loaded from. `http(s):`, `data:` and
    /// protocol-relative `//host` references are kept as is, anything else is
    /// looked up inside `image_dir`.
    pub fn icon_href(&self, image_dir: &str) -> Option<String> {
        let icon = self.icon_url.trim();
        if icon.is_empty() {
            return None;
        }
        if SCHEME_RE.is_match(icon) {
            return Some(icon.to_string());
        }
        if image_dir.is_empty() {
            return Some(icon.to_string());
        }
        let dir = image_dir.trim_end_matches('/');
        Some(format!("{dir}/{}", icon.trim_start_matches('/')))
    }

    pub fn link(&self) -> Option<&str> {
        let url = self.url.trim();
        (!url.is_empty()).then_some(url)
    }
}

/// A complete tree loaded from one file or one share link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub nodes: Vec<GoalNode>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, nodes: Vec<GoalNode>) -> Self {
        Self {
            name: name.into(),
            nodes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A single unplaced node puts the whole sheet through auto-layout.
    pub fn needs_layout(&self) -> bool {
        self.nodes.iter().any(GoalNode::is_unplaced)
    }
}

/// Sheets in load order. Loading a sheet under an existing name replaces it
/// without moving its tab.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sheet: Sheet) -> usize {
        if let Some(idx) = self.position(&sheet.name) {
            self.sheets[idx] = sheet;
            return idx;
        }
        self.sheets.push(sheet);
        self.sheets.len() - 1
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|sheet| sheet.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|sheet| sheet.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str())
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_href_resolves_relative_names() {
        let mut node = GoalNode::new("1", "", "Root");
        assert_eq!(node.icon_href("images"), None);

        node.icon_url = "star.png".to_string();
        assert_eq!(node.icon_href("images/").as_deref(), Some("images/star.png"));

        node.icon_url = "https://cdn.example.com/a.png".to_string();
        assert_eq!(
            node.icon_href("images").as_deref(),
            Some("https://cdn.example.com/a.png")
        );

        node.icon_url = "//cdn.example.com/a.png".to_string();
        assert_eq!(
            node.icon_href("images").as_deref(),
            Some("//cdn.example.com/a.png")
        );

        node.icon_url = "data:image/png;base64,AAAA".to_string();
        assert!(node.icon_href("images").unwrap().starts_with("data:"));

        node.icon_url = "HTTPS://cdn.example.com/b.png".to_string();
        assert_eq!(
            node.icon_href("images").as_deref(),
            Some("HTTPS://cdn.example.com/b.png")
        );
    }

    #[test]
    fn colon_names_stay_in_image_dir() {
        let mut node = GoalNode::new("1", "", "Root");
        node.icon_url = "goal:1.png".to_string();
        assert_eq!(node.icon_href("images").as_deref(), Some("images/goal:1.png"));

        node.icon_url = "C:\\x.png".to_string();
        assert_eq!(node.icon_href("images").as_deref(), Some("images/C:\\x.png"));
    }

    #[test]
    fn sentinel_marks_sheet_for_layout() {
        let sheet = Sheet::new(
            "s",
            vec![GoalNode::new("1", "", "A").at(100, 100), GoalNode::new("2", "1", "B")],
        );
        assert!(sheet.needs_layout());

        let placed = Sheet::new("s", vec![GoalNode::new("1", "", "A").at(0, 40)]);
        assert!(!placed.needs_layout());
    }

    #[test]
    fn workbook_replaces_sheet_in_place() {
        let mut book = Workbook::new();
        book.insert(Sheet::new("a", vec![]));
        book.insert(Sheet::new("b", vec![]));
        let idx = book.insert(Sheet::new("a", vec![GoalNode::new("1", "", "x")]));
        assert_eq!(idx, 0);
        assert_eq!(book.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(book.get("a").map(|s| s.nodes.len()), Some(1));
    }
}
