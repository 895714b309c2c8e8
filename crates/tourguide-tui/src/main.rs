use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tourguide_core::{Config, GeminiClient, GuideService, IpLocator};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "tourguide")]
#[command(version, about = "Chat with an AI local guide from your terminal")]
struct Cli {
    /// Gemini model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Remember --model as the default for future runs
    #[arg(long, requires = "model")]
    save_model: bool,

    /// Start at this location instead of detecting one
    #[arg(short, long)]
    location: Option<String>,

    /// Skip IP-based location detection
    #[arg(long)]
    no_detect: bool,

    /// Write logs here (defaults to the config directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the known Gemini models and exit
    #[arg(long)]
    list_models: bool,
}

fn init_logging(path: Option<PathBuf>) -> Result<PathBuf> {
    let path = match path {
        Some(path) => path,
        None => Config::config_dir()?.join("tourguide.log"),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    // The terminal belongs to the TUI, so logs only go to the file
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_models {
        for model in GeminiClient::list_models() {
            println!("{}", model);
        }
        return Ok(());
    }

    let log_path = init_logging(cli.log_file)?;
    info!("Starting tourguide v{}, logging to {}", env!("CARGO_PKG_VERSION"), log_path.display());

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Could not load config, using defaults: {}", e);
        Config::new()
    });

    if let Some(model) = cli.model.as_deref().filter(|_| cli.save_model) {
        match Config::save_default_model(model) {
            Ok(()) => info!("Saved {} as the default model", model),
            Err(e) => warn!("Could not save default model: {}", e),
        }
    }

    let model = cli.model.as_deref().unwrap_or(config.model()).to_string();
    let guide = match config.resolve_api_key() {
        Some(key) => {
            info!("Using Gemini model {}", model);
            GuideService::new(Arc::new(
                GeminiClient::new(&key)
                    .with_model(&model)
                    .with_base_url(config.base_url()),
            ))
        }
        None => {
            warn!("No Gemini API key configured, guide answers are unavailable");
            GuideService::unconfigured()
        }
    };
    let configured = guide.is_configured();

    let mut app = App::new(guide);

    let start_location = cli.location.or_else(|| config.start_location.clone());
    match start_location {
        Some(address) if !address.trim().is_empty() => {
            app.session.set_manual_location(&address);
        }
        _ if !cli.no_detect && config.detect_location() => {
            app.spawn_location_detection(Arc::new(IpLocator::new()));
        }
        _ => {}
    }

    if !configured {
        app.set_status("No API key: set GEMINI_API_KEY to chat with your guide");
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    app.shutdown();
    tui::restore()?;
    info!("Exiting tourguide");

    result
}

async fn run(
    terminal: &mut tui::Tui,
    app: &mut App,
    events: &mut tui::EventHandler,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
