//! Application state for one viewer session.
//!
//! Event handlers of a host (CLI, browser binding) call into [`App`]; it owns
//! the loaded sheets, the active one, its current layout and the viewport
//! state. Each display rebuilds the hierarchy and connectors from scratch.

use crate::config::{Config, ViewMode};
use crate::ir::{Sheet, Workbook};
use crate::layout::{TreeLayout, layout_sheet, reroute};
use crate::parser::{self, Delimiter, ParseError};
use crate::share::{ShareError, ShareLink, share_url};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Empty,
    Loaded,
    Displayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient message for the user; it disappears after `ttl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub ttl: Duration,
}

impl Notice {
    pub const SUCCESS_TTL: Duration = Duration::from_secs(3);
    pub const ERROR_TTL: Duration = Duration::from_secs(5);

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            ttl: Self::SUCCESS_TTL,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            ttl: Self::ERROR_TTL,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            ttl: Self::SUCCESS_TTL,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: ParseError,
    },
    #[error("{file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no CSV/TSV file among the selected files")]
    NoDataFiles,
    #[error(transparent)]
    Share(#[from] ShareError),
}

#[derive(Debug)]
pub struct App {
    config: Config,
    workbook: Workbook,
    active: Option<String>,
    layout: Option<TreeLayout>,
    zoom: f32,
    view_mode: ViewMode,
    viewport_width: f32,
    notices: Vec<Notice>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let view_mode = config.render.view_mode;
        let viewport_width = config.render.width;
        let mut app = Self {
            config,
            workbook: Workbook::new(),
            active: None,
            layout: None,
            zoom: 1.0,
            view_mode,
            viewport_width,
            notices: Vec::new(),
        };
        app.reset_zoom();
        app
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn state(&self) -> DisplayState {
        match (&self.layout, self.workbook.is_empty()) {
            (Some(_), _) => DisplayState::Displayed,
            (None, false) => DisplayState::Loaded,
            (None, true) => DisplayState::Empty,
        }
    }

    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.active.as_deref().and_then(|name| self.workbook.get(name))
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn layout(&self) -> Option<&TreeLayout> {
        self.layout.as_ref()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Drops notices older than their ttl, given the time since they were
    /// posted.
    pub fn expire_notices(&mut self, elapsed: Duration) {
        self.notices.retain(|notice| notice.ttl > elapsed);
    }

    /// Adds one parsed sheet. The first sheet loaded into an empty session
    /// becomes active. A parse failure leaves the session untouched.
    pub fn load_text(
        &mut self,
        name: &str,
        content: &str,
        delimiter: Delimiter,
    ) -> Result<(), LoadError> {
        match parser::parse_sheet(name, content, delimiter) {
            Ok(sheet) => {
                log::info!("loaded sheet '{}' with {} goals", name, sheet.nodes.len());
                self.workbook.insert(sheet);
                if self.workbook.len() == 1 || self.active.as_deref() == Some(name) {
                    self.switch_tab(name);
                }
                Ok(())
            }
            Err(source) => {
                let err = LoadError::Parse {
                    file: name.to_string(),
                    source,
                };
                log::warn!("{err}");
                self.notices.push(Notice::error(format!("failed to load {err}")));
                Err(err)
            }
        }
    }

    /// Loads every `.csv`/`.tsv` path; other paths are ignored. Files fail
    /// independently: one bad file does not stop the rest.
    pub fn load_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Vec<LoadError> {
        let data_files: Vec<&Path> = paths
            .iter()
            .map(AsRef::as_ref)
            .filter(|path| parser::is_data_file(path))
            .collect();
        if data_files.is_empty() {
            self.notices.push(Notice::error("select a CSV/TSV file"));
            return vec![LoadError::NoDataFiles];
        }

        let mut errors = Vec::new();
        for path in data_files {
            let name = parser::sheet_name_from_path(path);
            let delimiter = Delimiter::from_path(path).unwrap_or(Delimiter::Comma);
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(source) => {
                    let err = LoadError::Io {
                        file: path.display().to_string(),
                        source,
                    };
                    self.notices.push(Notice::error(format!("error while reading {err}")));
                    errors.push(err);
                    continue;
                }
            };
            if let Err(err) = self.load_text(&name, &content, delimiter) {
                errors.push(err);
            }
        }
        errors
    }

    /// Restores the sheet carried by a share link query. Returns `Ok(false)`
    /// when the query holds no tree at all.
    pub fn restore_link(&mut self, query: &str) -> Result<bool, LoadError> {
        let Some(link) = ShareLink::from_url(query) else {
            return Ok(false);
        };
        match link.restore() {
            Ok(sheet) => {
                let name = sheet.name.clone();
                self.workbook.insert(sheet);
                self.switch_tab(&name);
                self.notices.push(Notice::success(format!("loaded '{name}'")));
                Ok(true)
            }
            Err(err) => {
                log::warn!("share link restore failed: {err}");
                self.notices.push(Notice::error("could not load the shared link"));
                Err(err.into())
            }
        }
    }

    /// Makes `name` the displayed sheet: drops the previous layout, places
    /// unplaced goals and routes connectors. An unknown name returns false and
    /// leaves the current display as it was.
    pub fn switch_tab(&mut self, name: &str) -> bool {
        let Some(sheet) = self.workbook.get_mut(name) else {
            log::warn!("no sheet named '{name}'");
            return false;
        };
        self.layout = None;
        self.active = Some(name.to_string());
        if sheet.is_empty() {
            self.notices.push(Notice::info(format!("'{name}' has no goals")));
        }
        let layout = layout_sheet(sheet, &self.config.layout);
        self.layout = Some(layout);
        if self.is_narrow() {
            self.zoom = self.config.render.narrow_zoom;
        }
        true
    }

    /// Re-displays the active sheet from scratch.
    pub fn redisplay(&mut self) {
        if let Some(name) = self.active.clone() {
            self.switch_tab(&name);
        }
    }

    /// Viewport resize: connectors are rebuilt and narrow screens are zoomed
    /// out to at most the narrow zoom level.
    pub fn resize(&mut self, width: f32) {
        self.viewport_width = width;
        if let (Some(layout), Some(name)) = (self.layout.as_mut(), self.active.as_deref()) {
            if let Some(sheet) = self.workbook.get(name) {
                reroute(layout, sheet, &self.config.layout);
            }
        }
        if self.active.is_some() && self.is_narrow() && self.zoom > self.config.render.narrow_zoom
        {
            self.zoom = self.config.render.narrow_zoom;
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(self.config.render.zoom_in_factor);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(self.config.render.zoom_out_factor);
    }

    pub fn zoom_by(&mut self, factor: f32) {
        let render = &self.config.render;
        self.zoom = (self.zoom * factor).clamp(render.min_zoom, render.max_zoom);
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        let render = &self.config.render;
        self.zoom = zoom.clamp(render.min_zoom, render.max_zoom);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = if self.is_narrow() {
            self.config.render.narrow_zoom
        } else {
            1.0
        };
    }

    pub fn toggle_view_mode(&mut self) -> ViewMode {
        self.set_view_mode(self.view_mode.toggled());
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
        self.redisplay();
    }

    pub fn share_url(&self, base: &str) -> Option<Result<String, ShareError>> {
        self.active_sheet().map(|sheet| share_url(base, sheet))
    }

    fn is_narrow(&self) -> bool {
        self.viewport_width <= self.config.render.narrow_width
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::GoalNode;
    use crate::share::encode_sheet;

    const CSV: &str = "目標ID,親目標ID,目標名,説明,アイコンURL,URL,X座標,Y座標\n\
                       1,,Root,d1,icon1.png,http://a,100,100\n\
                       2,1,Child,d2,icon2.png,,0,0\n";

    #[test]
    fn first_sheet_becomes_active() {
        let mut app = App::default();
        assert_eq!(app.state(), DisplayState::Empty);
        app.load_text("basic", CSV, Delimiter::Comma).unwrap();
        assert_eq!(app.state(), DisplayState::Displayed);
        assert_eq!(app.active_name(), Some("basic"));
        let layout = app.layout().unwrap();
        assert_eq!(layout.node("2").map(|n| (n.x, n.y)), Some((350.0, 100.0)));
        assert_eq!(layout.connectors.len(), 1);

        app.load_text("second", CSV, Delimiter::Comma).unwrap();
        assert_eq!(app.active_name(), Some("basic"));
        assert_eq!(app.workbook().len(), 2);
    }

    #[test]
    fn parse_failure_keeps_session_and_posts_notice() {
        let mut app = App::default();
        let err = app.load_text("bad", "id,name\n1,x\n", Delimiter::Comma).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert_eq!(app.state(), DisplayState::Empty);
        assert_eq!(app.notices().len(), 1);
        assert_eq!(app.notices()[0].level, NoticeLevel::Error);
    }

    #[test]
    fn switching_tabs_rebuilds_connectors() {
        let mut app = App::default();
        app.load_text("a", CSV, Delimiter::Comma).unwrap();
        app.load_text(
            "b",
            "id,parent,name,description,icon,url\nx,,X,,,\ny,x,Y,,,\nz,x,Z,,,\n",
            Delimiter::Comma,
        )
        .unwrap();
        assert!(app.switch_tab("b"));
        let layout = app.layout().unwrap();
        assert_eq!(layout.sheet, "b");
        assert_eq!(layout.connectors.len(), 2);
    }

    #[test]
    fn unknown_tab_keeps_current_display() {
        let mut app = App::default();
        app.load_text("a", CSV, Delimiter::Comma).unwrap();
        assert!(!app.switch_tab("missing"));
        assert_eq!(app.state(), DisplayState::Displayed);
        assert_eq!(app.active_name(), Some("a"));
        assert_eq!(app.layout().map(|layout| layout.sheet.as_str()), Some("a"));

        app.resize(600.0);
        assert_eq!(app.zoom(), 0.8);
        assert_eq!(app.layout().unwrap().connectors.len(), 1);
    }

    #[test]
    fn auto_positions_persist_in_the_sheet() {
        let mut app = App::default();
        app.load_text("a", CSV, Delimiter::Comma).unwrap();
        let sheet = app.active_sheet().unwrap();
        assert!(!sheet.needs_layout());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut app = App::default();
        assert_eq!(app.zoom(), 1.0);
        for _ in 0..20 {
            app.zoom_in();
        }
        assert_eq!(app.zoom(), 3.0);
        for _ in 0..40 {
            app.zoom_out();
        }
        assert_eq!(app.zoom(), 0.3);
        app.reset_zoom();
        assert_eq!(app.zoom(), 1.0);
    }

    #[test]
    fn narrow_viewport_zooms_out() {
        let mut app = App::default();
        app.load_text("a", CSV, Delimiter::Comma).unwrap();
        app.zoom_in();
        app.resize(600.0);
        assert_eq!(app.zoom(), 0.8);
        app.reset_zoom();
        assert_eq!(app.zoom(), 0.8);
        assert_eq!(app.layout().unwrap().connectors.len(), 1);
    }

    #[test]
    fn restores_share_links() {
        let sheet = Sheet::new(
            "shared",
            vec![GoalNode::new("1", "", "A"), GoalNode::new("2", "1", "B")],
        );
        let payload = encode_sheet(&sheet).unwrap();
        let mut app = App::default();
        assert!(app.restore_link(&format!("?data={payload}&name=shared")).unwrap());
        assert_eq!(app.active_name(), Some("shared"));
        assert_eq!(app.notices()[0].level, NoticeLevel::Success);

        let url = app.share_url("https://example.com/").unwrap().unwrap();
        assert!(url.contains("name=shared"));
    }

    #[test]
    fn broken_links_leave_the_app_usable() {
        let mut app = App::default();
        assert!(!app.restore_link("https://example.com/").unwrap());
        assert!(app.restore_link("?data=%7Bnot-json").is_err());
        assert_eq!(app.state(), DisplayState::Empty);
        app.expire_notices(Duration::from_secs(6));
        assert!(app.notices().is_empty());
        app.load_text("a", CSV, Delimiter::Comma).unwrap();
        assert_eq!(app.state(), DisplayState::Displayed);
    }

    #[test]
    fn view_mode_toggles() {
        let mut app = App::default();
        assert_eq!(app.toggle_view_mode(), ViewMode::Sp);
        assert_eq!(app.toggle_view_mode(), ViewMode::Pc);
    }
}
