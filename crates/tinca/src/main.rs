//! tinca - Game score and leaderboard service

mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tinca_core::{AppConfig, AppContext, CacheBackend, ScoreStore, SqliteCache};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tinca",
    version,
    about = "Game score and leaderboard service",
    long_about = "Serves score uploads and a global top-100 leaderboard over HTTP.\n\
                  \n\
                  Examples:\n\
                    tinca                            # Run the HTTP API (default)\n\
                    tinca serve --port 8080          # Custom port\n\
                    tinca leaderboard                # Print the current leaderboard\n\
                    tinca leaderboard --json         # Same, as JSON\n\
                    tinca clear-cache                # Drop the persisted leaderboard snapshot\n\
                  \n\
                  Environment Variables:\n\
                    TINCA_CONFIG                     # Path to a TOML config file\n\
                    TINCA_DATA_DIR                   # Override the data directory\n\
                    TINCA_CACHE_BACKEND              # memory|sqlite\n\
                    TINCA_JWT_SECRET                 # Token signing secret\n\
                    RUST_LOG                         # Log filter (default: info)"
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// Path to a TOML config file
    #[arg(long, env = "TINCA_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the score database and the persisted cache
    #[arg(long, env = "TINCA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Where the leaderboard snapshot is cached
    #[arg(long, env = "TINCA_CACHE_BACKEND", value_enum)]
    cache_backend: Option<BackendArg>,

    /// Token signing secret
    #[arg(long, env = "TINCA_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, env = "TINCA_NO_COLOR")]
    no_color: bool,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the HTTP API (default)
    Serve {
        /// Port for the web server
        #[arg(long, env = "TINCA_PORT")]
        port: Option<u16>,
    },
    /// Print the current leaderboard and exit
    Leaderboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the cached leaderboard snapshot and exit
    ClearCache,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Memory,
    Sqlite,
}

impl From<BackendArg> for CacheBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Memory => CacheBackend::Memory,
            BackendArg::Sqlite => CacheBackend::Sqlite,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let no_color = cli.no_color;

    match cli.mode.unwrap_or(Mode::Serve { port: None }) {
        Mode::Serve { port } => {
            run_serve(config, port).await?;
        }
        Mode::Leaderboard { json } => {
            run_leaderboard(config, json, no_color)?;
        }
        Mode::ClearCache => {
            run_clear_cache(config)?;
        }
    }

    Ok(())
}

/// Config file first, then flags and environment on top
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to build default config".to_string(),
    })?;

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(backend) = cli.cache_backend {
        config.cache_backend = backend.into();
    }
    if let Some(secret) = &cli.jwt_secret {
        config.jwt_secret = secret.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run_serve(mut config: AppConfig, port: Option<u16>) -> Result<()> {
    if let Some(port) = port {
        config.port = port;
    }
    let port = config.port;

    let ctx = AppContext::open(config)?;
    info!(port, "Starting tinca");
    tinca_web::run(ctx, port).await
}

fn run_leaderboard(config: AppConfig, json: bool, no_color: bool) -> Result<()> {
    let ctx = AppContext::open(config)?;
    let board = ctx
        .scores
        .get_leaderboard()
        .context("Failed to load leaderboard")?;

    println!("{}", cli::format_leaderboard(&board.top_scores, json, no_color));
    if !json && !board.top_scores.is_empty() {
        let total = ctx.store.score_count().context("Failed to count scores")?;
        println!("{}", cli::format_footer(board.top_scores.len(), total));
    }
    Ok(())
}

fn run_clear_cache(config: AppConfig) -> Result<()> {
    if config.cache_backend == CacheBackend::Memory {
        println!("Cache backend is in-memory; nothing persisted to clear.");
        return Ok(());
    }

    let cache = SqliteCache::new(&config.data_dir)?;
    let removed = cache.entry_count().context("Failed to count cache entries")?;
    cache.clear().context("Failed to clear cache")?;

    println!("Cleared {} cache entries ({})", removed, cache.path().display());
    Ok(())
}
