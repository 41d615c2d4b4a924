use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::executor::LocalPool;
use futures::task::LocalSpawn;
use pdf_engine::{default_engine, LopdfEngine, OpenSource, PdfEngine};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use viewer_core::{
    fetch_file, open_view, EngineRasterizer, EngineSource, Intent, MemorySurface, OpenedView,
    SlotState, ViewConfig,
};

#[derive(Debug, Parser)]
#[command(name = "pageview-cli")]
#[command(about = "Render PDF pages through the live page view")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Open a view, apply intents, and write every page as PNG.
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Comma-separated intents applied back-to-back after the first render
        /// (zoom-in, zoom-out, rotate-cw, rotate-ccw, blur-more, blur-less).
        #[arg(long, value_delimiter = ',')]
        intents: Vec<Intent>,
        /// Zoom of the first render pass; overrides the config file.
        #[arg(long)]
        zoom: Option<f64>,
        /// Directory for page-<n>.png files.
        #[arg(long)]
        output: Option<PathBuf>,
        /// JSON view configuration.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    pages: Vec<PageInfoOutput>,
}

#[derive(Debug, Serialize)]
struct PageInfoOutput {
    index: u32,
    width_pt: f32,
    height_pt: f32,
}

#[derive(Debug, Serialize)]
struct RenderOutput {
    path: String,
    output_dir: String,
    zoom: f64,
    rotation: f64,
    blur: f64,
    transform: String,
    filter: String,
    pages: Vec<PageRenderOutput>,
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PageRenderOutput {
    page: usize,
    width: u32,
    height: u32,
    state: &'static str,
    scale: Option<f64>,
    file: Option<String>,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Render { file, intents, zoom, output, config } => {
            run_render(&file, &intents, zoom, output.as_deref(), config.as_deref())
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_info(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let mut engine = default_engine();
    let handle = engine.open(OpenSource::from(file)).context("failed to open PDF")?;

    let page_count = engine.page_count(handle)?;
    let pages = (0..page_count)
        .map(|index| {
            let size = engine.page_size(handle, index)?;
            Ok(PageInfoOutput { index: index + 1, width_pt: size.width_pt, height_pt: size.height_pt })
        })
        .collect::<Result<Vec<_>>>()?;

    let payload = InfoOutput { path: file.display().to_string(), page_count, pages };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    engine.close(handle)?;

    Ok(())
}

fn run_render(
    file: &Path,
    intents: &[Intent],
    zoom: Option<f64>,
    output: Option<&Path>,
    config: Option<&Path>,
) -> Result<()> {
    ensure_pdf_exists(file)?;

    let mut config = match config {
        Some(path) => ViewConfig::from_json_file(path)?,
        None => ViewConfig::default(),
    };
    if let Some(zoom) = zoom {
        config = config.with_initial_zoom(zoom);
        config.validate().context("invalid --zoom")?;
    }

    let mut pool = LocalPool::new();
    let spawner: Rc<dyn LocalSpawn> = Rc::new(pool.spawner());

    let opening = open_view(
        EngineSource::new(default_engine()),
        EngineRasterizer::<LopdfEngine>::new(),
        fetch_file(file),
        |_| MemorySurface::new(),
        spawner,
        config,
    );
    let OpenedView { mut controller, initial_render } =
        pool.run_until(opening).context("failed to open PDF")?;

    let mut passes = vec![initial_render];
    for intent in intents {
        log::info!("applying {intent}");
        if let Some(pass) = controller.apply(*intent).into_rendering() {
            passes.push(pass);
        }
    }

    pool.run_until_stalled();

    let mut errors = Vec::new();
    for pass in passes {
        if let Err(failure) = pool.run_until(pass) {
            log::warn!("render pass failed: {failure}");
            errors.push(failure.to_string());
        }
    }

    let output = output.map(ToOwned::to_owned).unwrap_or_else(|| default_render_output(file));
    fs::create_dir_all(&output)
        .with_context(|| format!("failed to create output directory {}", output.display()))?;

    let mut pages = Vec::with_capacity(controller.page_count());
    for slot in controller.slots() {
        let page = slot.page_number();
        let target = output.join(format!("page-{page}.png"));

        let written = slot.with_surface(|surface| {
            surface
                .visible()
                .map(|bitmap| {
                    bitmap
                        .save(&target)
                        .with_context(|| format!("failed to write image to {}", target.display()))
                })
                .transpose()
        })?;

        let (width, height) = slot.with_surface(MemorySurface::size);
        pages.push(PageRenderOutput {
            page,
            width,
            height,
            state: state_name(slot.state()),
            scale: slot.committed_scale(),
            file: written.map(|()| target.display().to_string()),
        });
    }

    let state = controller.state();
    let transform = state.transform();
    let payload = RenderOutput {
        path: file.display().to_string(),
        output_dir: output.display().to_string(),
        zoom: state.zoom,
        rotation: state.rotation,
        blur: state.blur,
        transform: transform.css_transform(),
        filter: transform.css_filter(),
        pages,
        errors,
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

fn state_name(state: SlotState) -> &'static str {
    match state {
        SlotState::Idle => "idle",
        SlotState::Rendering { .. } => "rendering",
        SlotState::Committed { .. } => "committed",
        SlotState::Failed { .. } => "failed",
        SlotState::Cancelled { .. } => "cancelled",
    }
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn default_render_output(file: &Path) -> PathBuf {
    let stem = file.file_stem().and_then(|name| name.to_str()).unwrap_or("document");

    file.with_file_name(format!("{stem}-pages"))
}
