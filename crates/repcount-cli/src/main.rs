use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use repcount_core::{RepEngine, RepcountConfig};

mod commands;

#[derive(Parser)]
#[command(name = "repcount", about = "Count exercise reps from pose landmark streams")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay JSON-lines commands through one engine
    Replay {
        /// Read commands from FILE instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the supported exercises with the configured calorie weights
    Exercises {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// Explicit file (must exist) or built-in defaults, then `REPCOUNT_*` overrides.
fn load_config(path: Option<&Path>) -> Result<RepcountConfig, repcount_core::ConfigError> {
    match path {
        Some(path) => RepcountConfig::from_file_with_env(path),
        None => RepcountConfig::load_layered(None, None),
    }
}

fn build_engine(path: Option<&Path>) -> Result<RepEngine, repcount_core::EngineError> {
    RepEngine::with_config(load_config(path)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Replay { input, config } => {
            let engine = build_engine(config.as_deref())?;
            let stdout = io::stdout();

            let summary = match input {
                Some(path) => {
                    tracing::info!("Replaying {}", path.display());
                    commands::replay(&engine, BufReader::new(File::open(&path)?), stdout.lock())?
                }
                None => commands::replay(&engine, io::stdin().lock(), stdout.lock())?,
            };
            tracing::info!(
                lines = summary.lines,
                errors = summary.errors,
                sessions = engine.registry().len(),
                "Replay finished"
            );
        }
        Commands::Exercises { config } => {
            let engine = build_engine(config.as_deref())?;
            let catalog = commands::exercise_catalog(&engine);
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(config.to_toml_string()?.as_bytes())?;
        }
    }
    Ok(())
}
