mod renderer;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use danmaku_core::{DanmakuEngine, EngineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "danmaku",
    about = "Play a danmaku comment track over the terminal",
    version
)]
struct Cli {
    /// JSON array of comments.
    path: PathBuf,

    /// Engine config JSON. Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Let a faster comment follow a slower one into the same lane.
    #[arg(long)]
    no_avoid_overlap: bool,

    /// Show the fps and lane overlay.
    #[arg(long)]
    debug: bool,

    /// Write logs to this file, filtered by `DANMAKU_LOG` (default "warn").
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let filter = EnvFilter::try_from_env("DANMAKU_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            EngineConfig::from_json(&data).with_context(|| format!("parsing {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if cli.no_avoid_overlap {
        config.avoid_overlap = false;
    }
    if cli.debug {
        config.show_debug_info = true;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let config = load_config(&cli)?;
    let data = std::fs::read(&cli.path).with_context(|| format!("reading {}", cli.path.display()))?;
    let comments = danmaku_core::parse_json(&data)
        .with_context(|| format!("parsing {}", cli.path.display()))?;
    tracing::info!(comments = comments.len(), ?config, "starting playback");

    let mut engine = DanmakuEngine::new(config, renderer::CellMetrics)?;
    engine.set_source(comments);
    renderer::run_tui(engine)
}
