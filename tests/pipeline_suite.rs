use std::path::Path;

use progress_tree::{
    App, Config, Delimiter, DisplayState, Hierarchy, LayoutConfig, RenderOptions, ShareLink,
    Theme, compute_layout, parse_sheet, render_html, render_svg, share_url,
};

fn fixture_path(rel: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel)
}

fn load_fixture(rel: &str) -> progress_tree::Sheet {
    let path = fixture_path(rel);
    let text = std::fs::read_to_string(&path).expect("fixture read failed");
    let delimiter = Delimiter::from_path(&path).expect("fixture must be csv/tsv");
    parse_sheet(rel, &text, delimiter).expect("parse failed")
}

fn positions(layout: &progress_tree::TreeLayout) -> Vec<(String, f32, f32)> {
    layout
        .nodes
        .iter()
        .map(|n| (n.id.clone(), n.x, n.y))
        .collect()
}

#[test]
fn basic_sheet_matches_documented_example() {
    let sheet = load_fixture("basic.csv");
    let layout = compute_layout(&sheet, &LayoutConfig::default());
    assert!(layout.auto_placed);
    assert_eq!(
        positions(&layout),
        vec![
            ("1".to_string(), 100.0, 100.0),
            ("2".to_string(), 350.0, 100.0)
        ]
    );
    assert_eq!(layout.connectors.len(), 1);
}

#[test]
fn advanced_tsv_stacks_siblings() {
    let sheet = load_fixture("advanced.tsv");
    assert_eq!(sheet.nodes.len(), 5);
    assert_eq!(sheet.nodes[2].description, "Write the \"core\"");
    let layout = compute_layout(&sheet, &LayoutConfig::default());
    let ys: Vec<f32> = layout.nodes[1..4].iter().map(|n| n.y).collect();
    assert_eq!(ys, vec![100.0, 250.0, 400.0]);
    assert!(layout.nodes[1..4].iter().all(|n| n.x == 350.0));
    assert_eq!(layout.node("unit").map(|n| (n.x, n.y)), Some((600.0, 400.0)));
    assert_eq!(layout.connectors.len(), 4);
    assert_eq!(layout.nodes[0].icon.as_deref(), Some("images/rocket.png"));
    assert_eq!(
        layout.nodes[2].icon.as_deref(),
        Some("https://cdn.example.com/gear.png")
    );
}

#[test]
fn special_sheet_degrades_gracefully() {
    let sheet = load_fixture("special.csv");
    // "broken,row" is dropped, the blank line is skipped.
    assert_eq!(sheet.nodes.len(), 7);

    let hierarchy = Hierarchy::build(&sheet);
    assert_eq!(hierarchy.id_count(), 6);
    assert_eq!(hierarchy.get("dup").map(|n| n.name.as_str()), Some("Second dup"));
    assert_eq!(hierarchy.walk().len(), sheet.nodes.len());

    let layout = compute_layout(&sheet, &LayoutConfig::default());
    // b->a, a->b and dup->kid; the self-parented goal has no line.
    assert_eq!(layout.connectors.len(), 3);
    assert!(layout.nodes.iter().all(|n| !(n.x == 0.0 && n.y == 0.0)));

    let kid = layout.node("kid").unwrap();
    let second_dup = &layout.nodes[5];
    assert_eq!(kid.y, second_dup.y);
    assert_eq!(kid.x, second_dup.x + 250.0);
}

#[test]
fn explicit_positions_are_respected() {
    let sheet = load_fixture("placed.csv");
    let layout = compute_layout(&sheet, &LayoutConfig::default());
    assert!(!layout.auto_placed);
    assert_eq!(
        positions(&layout),
        vec![
            ("1".to_string(), 40.0, 60.0),
            ("2".to_string(), 10.0, 300.0),
            ("3".to_string(), 400.0, 300.0)
        ]
    );
    for connector in &layout.connectors {
        let parent = &layout.nodes[connector.parent];
        let child = &layout.nodes[connector.child];
        let (pc, cc) = (parent.center(), child.center());
        let full = (cc.0 - pc.0).hypot(cc.1 - pc.1);
        let start_gap = (connector.start.0 - pc.0).hypot(connector.start.1 - pc.1);
        let end_gap = (connector.end.0 - cc.0).hypot(connector.end.1 - cc.1);
        assert!((start_gap - 30.0).abs() < 1e-3);
        assert!((end_gap - 30.0).abs() < 1e-3);
        assert!((connector.length() - (full - 60.0)).abs() < 1e-3);
    }
}

#[test]
fn render_all_fixtures() {
    let theme = Theme::classic();
    for rel in ["basic.csv", "advanced.tsv", "special.csv", "placed.csv"] {
        let sheet = load_fixture(rel);
        let layout = compute_layout(&sheet, &LayoutConfig::default());
        let svg = render_svg(&layout, &theme, &RenderOptions::default());
        assert!(svg.contains("<svg"), "{rel}: missing <svg tag");
        assert!(svg.contains("</svg>"), "{rel}: missing </svg tag");
        assert!(!svg.contains("<script>"), "{rel}: unescaped markup");

        let html = render_html(&[layout], 0, &theme, &RenderOptions::default());
        assert!(html.starts_with("<!DOCTYPE html>"), "{rel}: missing doctype");
        assert!(!html.contains("<script>"), "{rel}: unescaped markup");
    }
}

#[test]
fn share_link_round_trip_restores_fixture() {
    let sheet = load_fixture("advanced.tsv");
    let url = share_url("https://goals.example/", &sheet).unwrap();
    let restored = ShareLink::from_url(&url).unwrap().restore().unwrap();
    assert_eq!(restored.nodes, sheet.nodes);
    assert_eq!(restored.name, sheet.name);
}

#[test]
fn app_loads_files_and_switches_tabs() {
    let mut app = App::new(Config::default());
    let errors = app.load_files(&[
        fixture_path("basic.csv"),
        fixture_path("advanced.tsv"),
        fixture_path("notes.txt"),
    ]);
    assert!(errors.is_empty());
    assert_eq!(
        app.workbook().names().collect::<Vec<_>>(),
        vec!["basic", "advanced"]
    );
    assert_eq!(app.active_name(), Some("basic"));
    assert_eq!(app.state(), DisplayState::Displayed);

    assert!(app.switch_tab("advanced"));
    assert_eq!(app.layout().unwrap().connectors.len(), 4);

    let url = app.share_url("https://goals.example/").unwrap().unwrap();
    let mut other = App::default();
    assert!(other.restore_link(&url).unwrap());
    assert_eq!(other.active_sheet().unwrap().nodes, app.active_sheet().unwrap().nodes);
}

#[test]
fn only_non_data_files_is_an_error() {
    let mut app = App::default();
    let errors = app.load_files(&[fixture_path("notes.txt")]);
    assert_eq!(errors.len(), 1);
    assert_eq!(app.state(), DisplayState::Empty);
}
