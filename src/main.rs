use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

mod config;
mod error;
mod platform;
mod services;
mod utils;
mod window;

use config::Config;
use platform::SessionEnv;
use window::WindowInfo;

#[derive(Parser, Debug)]
#[command(name = "yawi", version)]
#[command(about = "Yet Another Window Inspector - get active window information across platforms")]
#[command(long_about = "YAWI prints information about the currently focused window. \
By default it outputs just the window class name, which makes it easy to use in scripts.\n\n\
Supported platforms: Hyprland, Sway, GNOME Shell (Linux), macOS")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overrides the configuration file; RUST_LOG wins over both)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Show full window information as JSON
    #[command(visible_alias = "json")]
    Info,
    /// Show a short human-readable description of the window
    Pretty,
    /// Show which compositor is detected
    Compositor,
    /// Show YAWI version
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    if let Some(path) = &args.config {
        anyhow::ensure!(path.exists(), "configuration file {:?} does not exist", path);
    }
    let config_path = args.config.clone().or_else(Config::default_path);
    let mut config = Config::load_optional(config_path.as_deref())?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
        config.validate()?;
    }

    init_tracing(&config.logging.level)?;
    debug!(config = ?config_path, "configuration loaded");

    let env = SessionEnv::from_process();
    let platform = platform::detect(&env);
    debug!(%platform, "platform detected");

    match args.command {
        Some(Command::Version) => {
            println!("YAWI version {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Command::Compositor) => {
            println!("Current compositor: {platform}");
        }
        command => {
            let window = services::get_active_window_info(platform, &env, &config)
                .await
                .map_err(|e| match e {
                    error::YawiError::UnsupportedPlatform { .. } => anyhow::Error::new(e),
                    other => anyhow::Error::new(other).context("failed to get active window"),
                })?;
            println!("{}", render(command, &window)?);
        }
    }

    Ok(())
}

fn render(command: Option<Command>, window: &WindowInfo) -> Result<String> {
    match command {
        Some(Command::Info) => window
            .to_pretty_json()
            .context("failed to create JSON output"),
        Some(Command::Pretty) => Ok(window.to_string()),
        _ => Ok(window.class.clone()),
    }
}

/// Logs go to stderr so stdout stays clean for scripts.
fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(())
}
