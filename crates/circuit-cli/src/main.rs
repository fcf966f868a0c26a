use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;

use commands::App;

#[derive(Parser)]
#[command(name = "circuit")]
#[command(about = "Circuit - live group-training session coordinator", long_about = None)]
struct Cli {
    /// Keep config, sessions and templates under this directory
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Tracing filter; RUST_LOG wins when set
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session from a stored template or a template file
    #[command(group(ArgGroup::new("source").required(true).args(["template", "file"])))]
    Start {
        #[arg(long)]
        gym: String,
        /// Template ID, looked up in the templates directory
        #[arg(long)]
        template: Option<String>,
        /// Path to a template TOML file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Pause a running session
    Pause { id: String },
    /// Resume a paused session
    Resume { id: String },
    /// Stop a session
    Stop { id: String },
    /// Move to the next step
    NextStep { id: String },
    /// Move to the previous step
    PrevStep { id: String },
    /// Move to the first step of the next block
    NextBlock { id: String },
    /// Move to the first step of the previous block
    PrevBlock { id: String },
    /// Run one auto-advance check
    Tick {
        id: String,
        /// The state_version this client last saw
        #[arg(long)]
        expected_version: u64,
    },
    /// Show the live session of a gym
    Current {
        #[arg(long)]
        gym: String,
    },
    /// List every session of a gym, newest first
    List {
        #[arg(long)]
        gym: String,
    },
    /// Show a session and its display view
    Show { id: String },
    /// Follow a session, printing its view as it changes
    Watch {
        id: String,
        /// Also drive auto-advance from this client
        #[arg(long)]
        auto_advance: bool,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries JSON output only
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (paths, config) = commands::load_config(cli.home.as_deref())?;
    init_tracing(cli.log_level.as_deref().unwrap_or(&config.log_level));
    let app = App::new(paths, config)?;

    match cli.command {
        Commands::Start {
            gym,
            template,
            file,
        } => commands::session::start(&app, &gym, template, file).await?,
        Commands::Pause { id } => commands::session::pause(&app, &id).await?,
        Commands::Resume { id } => commands::session::resume(&app, &id).await?,
        Commands::Stop { id } => commands::session::stop(&app, &id).await?,
        Commands::NextStep { id } => commands::session::next_step(&app, &id).await?,
        Commands::PrevStep { id } => commands::session::prev_step(&app, &id).await?,
        Commands::NextBlock { id } => commands::session::next_block(&app, &id).await?,
        Commands::PrevBlock { id } => commands::session::prev_block(&app, &id).await?,
        Commands::Tick {
            id,
            expected_version,
        } => commands::session::tick(&app, &id, expected_version).await?,
        Commands::Current { gym } => commands::session::current(&app, &gym).await?,
        Commands::List { gym } => commands::session::list(&app, &gym).await?,
        Commands::Show { id } => commands::session::show(&app, &id).await?,
        Commands::Watch { id, auto_advance } => commands::watch::run(&app, id, auto_advance).await?,
    }

    Ok(())
}
