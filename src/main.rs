use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod db;
mod live;
mod models;
mod service;

use commands::{ConfigCommand, ExerciseCommand, WorkoutCommand};
use config::Config;
use db::{init_db, WorkoutRepository};
use service::WorkoutService;

#[derive(Parser)]
#[command(name = "liftplan")]
#[command(version)]
#[command(about = "A workout planning CLI application", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage workout routines
    Workout(WorkoutCommand),

    /// Manage exercises within a workout
    Exercise(ExerciseCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liftplan=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Workout(cmd)) => {
            let (service, repo) = open_store(&config).await?;
            cmd.run(&service, &repo).await?;
            // Drain queued mutations before the process exits
            service.shutdown().await;
        }
        Some(Commands::Exercise(cmd)) => {
            let (service, repo) = open_store(&config).await?;
            cmd.run(&service, &repo).await?;
            service.shutdown().await;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

async fn open_store(
    config: &Config,
) -> Result<(WorkoutService, WorkoutRepository), Box<dyn std::error::Error>> {
    let pool = init_db(Some(config.database_path.value.clone())).await?;
    let repo = WorkoutRepository::new(pool);
    let service = WorkoutService::start(repo.clone()).await?;
    Ok((service, repo))
}
