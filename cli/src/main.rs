//! `tda`: discovers a short, narrates an AI summary over it, renders the
//! result and publishes it.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod app;
mod commands;
mod logging;
mod signals;

use app::App;

/// The Daily Algorithm content generator
#[derive(Parser)]
#[command(name = "tda")]
#[command(about = "The Daily Algorithm content generator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trigger a new video generation
    Generate {
        /// Upload the generated video right away
        #[arg(short, long)]
        upload: bool,

        /// Number of CPU cores to use for rendering (default: all cores)
        #[arg(short = 'n', long)]
        cores: Option<usize>,
    },

    /// Authenticate with Google
    Auth {
        /// Paste the redirect URL instead of running a local callback listener
        #[arg(short, long)]
        manual: bool,

        /// Run the consent flow even if stored credentials are still valid
        #[arg(short, long)]
        force: bool,
    },

    /// Start services
    Start {
        #[command(subcommand)]
        service: commands::start::StartCommand,
    },

    /// Delete video records and their rendered videos based on their status
    Prune {
        /// Delete all video records regardless of status
        #[arg(short, long)]
        all: bool,
    },
}

async fn run(command: Commands, app: App) -> Result<()> {
    match command {
        Commands::Generate { upload, cores } => commands::generate::run(&app, upload, cores).await,
        Commands::Auth { manual, force } => commands::auth::run(&app, manual, force).await,
        Commands::Start { service } => commands::start::run(&app, service).await,
        Commands::Prune { all } => commands::prune::run(&app, all),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let app = App::load();
    let log_format = app
        .as_ref()
        .map(|app| app.config.log_format)
        .unwrap_or_default();
    if let Err(e) = logging::init(log_format) {
        eprintln!("{:#}", e);
    }

    let result = match app {
        Ok(app) => run(cli.command, app).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
