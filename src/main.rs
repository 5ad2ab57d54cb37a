// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use photobooth::app::PhotoApp;
use photobooth::backends::camera::{CameraBackendType, FacingMode, get_backend};
use photobooth::constants::app_info;
use photobooth::{Config, assets};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, warn};

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Take photos with your camera and keep them in a local gallery")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Camera backend to use
    #[arg(long, global = true, value_parser = parse_backend)]
    backend: Option<CameraBackendType>,

    /// Photo database file (default: in the user data directory)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive terminal UI (default)
    Terminal,

    /// List available cameras
    List,

    /// Open the camera, take one photo and store it
    Photo {
        /// Camera to use: user (front) or environment (rear)
        #[arg(short, long)]
        facing: Option<FacingMode>,
    },

    /// List stored photos, newest first
    Gallery,

    /// Delete every stored photo
    Clear,
}

fn parse_backend(value: &str) -> Result<CameraBackendType, String> {
    match value.to_ascii_lowercase().as_str() {
        "v4l2" => Ok(CameraBackendType::V4l2),
        "virtual" => Ok(CameraBackendType::Virtual),
        other => Err(format!("unknown backend '{}' (expected v4l2 or virtual)", other)),
    }
}

fn init_logging(to_file: bool) {
    // Set RUST_LOG to control the log level, e.g. RUST_LOG=photobooth=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    if to_file {
        // The terminal UI owns the screen, so logs go to a file
        let dir = Config::cache_dir();
        let file = std::fs::create_dir_all(&dir)
            .and_then(|_| std::fs::File::create(dir.join("photobooth.log")));
        if let Ok(file) = file {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
            return;
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Terminal);
    init_logging(matches!(command, Commands::Terminal));

    info!(version = app_info::version(), "Starting photo booth");

    let mut config = Config::load();
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(database) = cli.database {
        config.database_path = Some(database);
    }

    let backend = get_backend(&config);

    if let Commands::List = command {
        return cli::list_cameras(backend.as_ref());
    }

    if let Commands::Photo {
        facing: Some(facing),
    } = command
    {
        config.default_facing = facing;
    }

    let store = cli::open_store(&config.database_file())?;
    let app = PhotoApp::from_config(&config, backend, store);

    let result = tokio::select! {
        result = run_command(&app, &config, command) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted");
            Ok(())
        }
    };

    app.shutdown().await;
    result
}

async fn run_command(
    app: &PhotoApp,
    config: &Config,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Terminal => {
            if config.install_assets {
                assets::spawn_install(assets::cache_dir());
            }
            photobooth::terminal::run(app.clone()).await
        }
        Commands::Photo { .. } => cli::take_photo(app).await,
        Commands::Gallery => cli::list_gallery(app).await,
        Commands::Clear => cli::clear_gallery(app).await,
        Commands::List => Ok(()),
    }
}
