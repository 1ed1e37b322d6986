use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use wl_pattern_analyzer::config::{load_settings, to_toml};
use wl_pattern_analyzer::display;
use wl_pattern_analyzer::engine::{PatternEngine, SessionSummary};
use wl_pattern_analyzer::interactive::Session;
use wl_pattern_analyzer::models::{AdaptiveStats, MatrixStats, PatternStats};
use wl_pattern_analyzer::accuracy::LossStreakEntry;
use wl_pattern_analyzer::{EngineSettings, FileStore, Forecast, ModelKind};

#[derive(Parser)]
#[command(name = "wlpa")]
#[command(version = "0.1.0")]
#[command(about = "Win/loss sequence pattern analyzer and next-outcome predictor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "wlpa.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON output and JSON logs
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print statistics, the next prediction and all model tables
    Analyze {
        /// Results file (space separated W/L tokens)
        #[arg(short, long)]
        file: PathBuf,
        /// Model to predict with (pattern, matrix, adaptive, combined)
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Print only the forecast for the next outcome
    Predict {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Append results to a file
    Add {
        #[arg(short, long)]
        file: PathBuf,
        /// Results to append, e.g. W L W
        #[arg(required = true)]
        tokens: Vec<String>,
    },
    /// Remove the last result from a file
    Undo {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Remove all results from a file
    Clear {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Start an interactive session
    Interactive {
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config,
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    generated_at: DateTime<Utc>,
    settings: &'a EngineSettings,
    summary: SessionSummary,
    prediction: Option<Forecast>,
    patterns: &'a PatternStats,
    matrix: &'a MatrixStats,
    adaptive: &'a AdaptiveStats,
    loss_streaks: &'a [LossStreakEntry],
}

#[derive(Serialize)]
struct PredictionReport {
    generated_at: DateTime<Utc>,
    results: usize,
    prediction: Option<Forecast>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json)?;

    let mut settings = load_settings(Some(&cli.config))?;

    match cli.command {
        Commands::Analyze { file, model } => {
            apply_model(&mut settings, model.as_deref())?;
            let engine = load_engine(settings, &file)?;
            if cli.json {
                let report = AnalysisReport {
                    generated_at: Utc::now(),
                    settings: engine.settings(),
                    summary: engine.get_stats(),
                    prediction: engine.prediction(),
                    patterns: engine.pattern_stats(),
                    matrix: engine.matrix_stats(),
                    adaptive: engine.adaptive_stats(),
                    loss_streaks: engine.loss_streaks(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", display::render_report(&engine));
            }
        }
        Commands::Predict { file, model } => {
            apply_model(&mut settings, model.as_deref())?;
            let engine = load_engine(settings, &file)?;
            if cli.json {
                let report = PredictionReport {
                    generated_at: Utc::now(),
                    results: engine.len(),
                    prediction: engine.prediction(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", display::render_prediction(engine.prediction().as_ref()));
            }
        }
        Commands::Add { file, tokens } => {
            let mut engine = open_engine(settings, &file)?;
            let total = tokens.len();
            let added = engine
                .bulk_add_with_progress(&tokens, |done, total| {
                    info!("Processing {}/{}", done, total);
                })
                .context("Failed to add results")?;
            persist(&engine, &file)?;
            println!("Added {} of {} results. Total: {}", added, total, engine.len());
            println!("{}", display::render_prediction(engine.prediction().as_ref()));
        }
        Commands::Undo { file } => {
            let mut engine = load_engine(settings, &file)?;
            let removed = engine.delete_last()?;
            persist(&engine, &file)?;
            println!("Removed {}. Total: {}", removed, engine.len());
        }
        Commands::Clear { file } => {
            let cleared = FileStore::new(&file)
                .truncate()
                .with_context(|| format!("Failed to clear {}", file.display()))?;
            if cleared {
                info!("Cleared {}", file.display());
                println!("All results cleared");
            } else {
                println!("No results file at {}", file.display());
            }
        }
        Commands::Interactive { file } => {
            let mut engine = match &file {
                Some(path) => open_engine(settings, path)?,
                None => PatternEngine::new(settings)?,
            };
            let stdin = io::stdin();
            Session::new(&mut engine, file).run(stdin.lock(), io::stdout())?;
        }
        Commands::Config => {
            print!("{}", to_toml(&settings)?);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn apply_model(settings: &mut EngineSettings, model: Option<&str>) -> Result<()> {
    if let Some(name) = model {
        settings.active_model = name.parse::<ModelKind>()?;
    }
    Ok(())
}

/// Engine loaded from `file`, which must exist. A blank file gives an empty engine.
fn load_engine(settings: EngineSettings, file: &Path) -> Result<PatternEngine> {
    let store = FileStore::new(file);
    if !store.exists() {
        return Err(anyhow!("Results file {} not found", file.display()));
    }
    let mut engine = PatternEngine::new(settings)?;
    engine
        .restore(&store)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    Ok(engine)
}

/// Engine loaded from `file` when it exists, empty otherwise
fn open_engine(settings: EngineSettings, file: &Path) -> Result<PatternEngine> {
    let store = FileStore::new(file);
    let mut engine = PatternEngine::new(settings)?;
    if store.exists() {
        engine
            .restore(&store)
            .with_context(|| format!("Failed to load {}", file.display()))?;
    }
    Ok(engine)
}

fn persist(engine: &PatternEngine, file: &Path) -> Result<()> {
    engine
        .persist(&FileStore::new(file))
        .with_context(|| format!("Failed to save {}", file.display()))?;
    Ok(())
}
