use crate::app::{App, NoticeLevel};
use crate::config::{ViewMode, load_config};
use crate::layout::{TreeLayout, compute_layout};
use crate::layout_dump::{layout_dump_json, write_layout_dump};
use crate::parser::Delimiter;
use crate::render::{RenderOptions, render_html, render_svg, write_output};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "ptree", version, about = "Goal tree renderer (CSV/TSV or share links to SVG/HTML)")]
pub struct Args {
    /// Data files (.csv/.tsv); each becomes a sheet. '-' reads stdin.
    pub inputs: Vec<PathBuf>,

    /// Share link (full URL or query string) to restore a sheet from
    #[arg(short = 'l', long = "link")]
    pub link: Option<String>,

    /// Sheet to display; defaults to the first one loaded
    #[arg(short = 's', long = "sheet")]
    pub sheet: Option<String>,

    /// Output file. Defaults to stdout for text formats if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON5 file (theme, themeVariables, layout, viewMode)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Viewport width; at 768 or less the tree starts zoomed out
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Zoom factor (clamped to 0.3..=3)
    #[arg(short = 'z', long = "zoom")]
    pub zoom: Option<f32>,

    /// Interaction mode for HTML output
    #[arg(short = 'm', long = "mode", value_enum)]
    pub mode: Option<Mode>,

    /// Base URL for the share link; prints the link to stderr
    #[arg(long = "shareBase")]
    pub share_base: Option<String>,

    /// Name used for stdin input
    #[arg(long = "name", default_value = "stdin")]
    pub name: String,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Html,
    Json,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Mode {
    Pc,
    Sp,
}

impl From<Mode> for ViewMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Pc => ViewMode::Pc,
            Mode::Sp => ViewMode::Sp,
        }
    }
}

pub fn run() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(mode) = args.mode {
        config.render.view_mode = mode.into();
    }

    let mut app = App::new(config);
    load_inputs(&mut app, &args)?;
    report_notices(&mut app);

    if app.workbook().is_empty() {
        return Err(anyhow::anyhow!("No goal tree loaded"));
    }
    if let Some(name) = args.sheet.as_deref() {
        if !app.switch_tab(name) {
            return Err(anyhow::anyhow!("No sheet named '{}'", name));
        }
    }
    if let Some(zoom) = args.zoom {
        app.set_zoom(zoom);
    }

    let share_url = args
        .share_base
        .as_deref()
        .and_then(|base| app.share_url(base))
        .transpose()?;
    if let Some(url) = &share_url {
        eprintln!("{url}");
    }

    let Some(layout) = app.layout() else {
        return Err(anyhow::anyhow!("Nothing to display"));
    };
    let options = RenderOptions {
        zoom: app.zoom(),
        view_mode: app.view_mode(),
        margin: app.config().render.margin,
        share_url,
    };
    let theme = &app.config().theme;

    match args.output_format {
        OutputFormat::Svg => {
            let svg = render_svg(layout, theme, &options);
            write_output(&svg, args.output.as_deref())?;
        }
        OutputFormat::Html => {
            let (layouts, active) = all_layouts(&app, layout);
            let html = render_html(&layouts, active, theme, &options);
            write_output(&html, args.output.as_deref())?;
        }
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_layout_dump(path, layout)?,
            None => println!("{}", layout_dump_json(layout)?),
        },
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&render_svg(layout, theme, &options), &output, &app)?;
        }
    }
    Ok(())
}

fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("progress_tree=warn");
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn load_inputs(app: &mut App, args: &Args) -> Result<()> {
    if let Some(link) = args.link.as_deref() {
        // Failures are reported as notices; other inputs may still load.
        let _ = app.restore_link(link);
    }

    let (stdin_inputs, files): (Vec<&PathBuf>, Vec<&PathBuf>) = args
        .inputs
        .iter()
        .partition(|path| path.as_path() == Path::new("-"));

    if !stdin_inputs.is_empty() || (args.inputs.is_empty() && args.link.is_none()) {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        let delimiter = Delimiter::sniff(&buf);
        let _ = app.load_text(&args.name, &buf, delimiter);
    }

    if !files.is_empty() {
        let _ = app.load_files(&files);
    }
    Ok(())
}

fn report_notices(app: &mut App) {
    for notice in app.take_notices() {
        match notice.level {
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
            NoticeLevel::Success | NoticeLevel::Info => log::info!("{}", notice.message),
        }
    }
}

/// Layouts of every sheet for the tabbed page; the displayed sheet reuses
/// the app's layout.
fn all_layouts(app: &App, active_layout: &TreeLayout) -> (Vec<TreeLayout>, usize) {
    let mut active = 0;
    let layouts = app
        .workbook()
        .sheets()
        .iter()
        .enumerate()
        .map(|(idx, sheet)| {
            if app.active_name() == Some(sheet.name.as_str()) {
                active = idx;
                active_layout.clone()
            } else {
                compute_layout(sheet, &app.config().layout)
            }
        })
        .collect();
    (layouts, active)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!(
        "Output path required for {} output",
        ext
    ))
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, app: &App) -> Result<()> {
    crate::render::write_output_png(svg, output, &app.config().render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _app: &App) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the 'png' feature"))
}
