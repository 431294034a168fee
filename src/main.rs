// main.rs for gewog-hazard-mapper with ratatui TUI
mod app;
mod event;
mod ui;

use std::fs;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::process;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{Level, error, info};

use gewog_hazard_mapper::config::{DEFAULT_BUILDINGS_DIR, DEFAULT_DATA_PATH, OUTPUT_DIR, Settings};
use gewog_hazard_mapper::export::{BatchExport, ExportContext, export_view, today};
use gewog_hazard_mapper::features::load_features;
use gewog_hazard_mapper::plot::PngCapture;
use gewog_hazard_mapper::region_index::RegionIndex;
use gewog_hazard_mapper::render::RenderCoordinator;
use gewog_hazard_mapper::schema::{ATTRIBUTES, attribute_by_key};
use gewog_hazard_mapper::state::{DisplayMode, ViewAction, ViewState};

use crate::app::App;
use crate::event::{Event, EventHandler};

/// Seismic-hazard choropleth maps of gewogs by dzongkhag.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Gewog GeoJSON FeatureCollection
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,

    /// Directory holding dzongkhag_<name>.geojson building footprints
    #[arg(long, default_value = DEFAULT_BUILDINGS_DIR)]
    buildings_dir: PathBuf,

    /// Where exported images (and the TUI log) are written
    #[arg(long, default_value = OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Exported image width in pixels
    #[arg(long, default_value_t = 1600)]
    width: u32,

    /// Exported image height in pixels
    #[arg(long, default_value_t = 1200)]
    height: u32,

    /// Export every dzongkhag x attribute combination, then exit
    #[arg(long, conflicts_with = "export")]
    export_all: bool,

    /// Export a single dzongkhag, then exit
    #[arg(long, value_name = "DZONGKHAG")]
    export: Option<String>,

    /// Attribute key for --export
    #[arg(long, requires = "export", value_name = "KEY")]
    attribute: Option<String>,

    /// Render gewog outlines only (with --export)
    #[arg(long, requires = "export")]
    outline_only: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings {
            data_path: self.data.clone(),
            buildings_dir: self.buildings_dir.clone(),
            output_dir: self.output_dir.clone(),
            image_width: self.width,
            image_height: self.height,
        }
    }

    fn headless(&self) -> bool {
        self.export_all || self.export.is_some()
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let settings = args.settings();

    fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            settings.output_dir.display()
        )
    })?;
    init_logging(&settings, args.headless(), args.verbose)?;

    let features = match load_features(&settings.data_path) {
        Ok(features) => features,
        Err(err) => {
            error!(error = %err, "could not load gewog data");
            bail!(
                "Could not load {}: {err}\nPlace the gewog GeoJSON there or pass --data <PATH>.",
                settings.data_path.display()
            );
        }
    };
    let index = RegionIndex::build(features);
    info!(
        gewogs = index.feature_count(),
        dzongkhags = index.regions().len(),
        "loaded gewog data"
    );

    if args.export_all {
        return export_all(&settings, &index);
    }
    if let Some(region) = &args.export {
        return export_one(&settings, &index, region, args.attribute.as_deref(), args.outline_only);
    }
    run_tui(settings, index)
}

fn init_logging(settings: &Settings, headless: bool, verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let installed = if headless {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(io::stderr)
            .try_init()
    } else {
        // The TUI owns the terminal, so logs go to a file.
        let log_path = settings.log_path();
        let file = fs::File::create(&log_path)
            .with_context(|| format!("failed to create log file {}", log_path.display()))?;
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    };
    installed.map_err(|err| anyhow!("failed to install logger: {err}"))
}

fn export_all(settings: &Settings, index: &RegionIndex) -> Result<()> {
    let mut coordinator = RenderCoordinator::default();
    let mut capture = PngCapture {
        width: settings.image_width,
        height: settings.image_height,
    };
    let mut ctx = ExportContext {
        index,
        coordinator: &mut coordinator,
        capture: &mut capture,
        buildings_dir: &settings.buildings_dir,
        output_dir: &settings.output_dir,
    };

    let regions = index.regions();
    let batch = BatchExport::new(&regions, &ATTRIBUTES, ViewState::default(), today());
    let (report, _) = batch.run(&mut ctx);

    println!(
        "Exported {} images to {}",
        report.written.len(),
        settings.output_dir.display()
    );
    for (job, err) in &report.failed {
        eprintln!("Failed: {} / {}: {}", job.region, job.attribute.label, err);
    }
    Ok(())
}

fn export_one(
    settings: &Settings,
    index: &RegionIndex,
    region: &str,
    attribute: Option<&str>,
    outline_only: bool,
) -> Result<()> {
    if !index.contains(region) {
        bail!(
            "unknown dzongkhag '{region}'; known: {}",
            index.regions().join(", ")
        );
    }
    let mut view = ViewState::default().apply(ViewAction::SelectRegion(Some(region.to_string())));
    if let Some(key) = attribute {
        if attribute_by_key(key).is_none() {
            bail!("unknown attribute '{key}'");
        }
        view = view.apply(ViewAction::SelectAttribute(key.to_string()));
    }
    if outline_only {
        view = view.apply(ViewAction::SetDisplayMode(DisplayMode::OutlineOnly));
    }

    let mut coordinator = RenderCoordinator::default();
    let mut capture = PngCapture {
        width: settings.image_width,
        height: settings.image_height,
    };
    let mut ctx = ExportContext {
        index,
        coordinator: &mut coordinator,
        capture: &mut capture,
        buildings_dir: &settings.buildings_dir,
        output_dir: &settings.output_dir,
    };
    let path = export_view(&mut ctx, &view, today()).context("export failed")?;
    println!("Map generated to {}", path.display());
    Ok(())
}

fn run_tui(settings: Settings, index: RegionIndex) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings, index);
    app.select_first_region();
    let events = EventHandler::new(Duration::from_millis(100));

    let result = run_loop(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, app))?;

        if let Some(request) = app.take_overlay_request() {
            events.load_overlay(request, app.settings.buildings_dir.clone());
        }

        let Some(event) = events.next(Duration::from_millis(250))? else {
            continue;
        };
        match event {
            Event::Tick => app.on_tick(),
            Event::Input(key) => app.on_key(key),
            Event::Mouse(mouse) => app.on_mouse(mouse, terminal.size()?.width),
            Event::Resize => {}
            Event::OverlayLoaded { generation, layer } => app.apply_overlay(generation, layer),
        }
    }
    info!("quit");
    Ok(())
}
