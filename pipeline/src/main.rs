//! cs2-pipeline: turns exported CS2 demo events into round tables and model-ready features.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;

use pipeline::batch::BatchReport;
use pipeline::extract::CommandExtractor;
use pipeline::source::CsvTableSource;
use pipeline::store::{FileStore, MatchStore};
use pipeline::Config;

#[derive(Parser)]
#[command(name = "cs2-pipeline")]
#[command(about = "Round segmentation and feature extraction for CS2 demo events", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment and aggregate every match into per-match tables
    Parse {
        /// Directory with one folder of event tables per match
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Build the feature tables from the parsed per-match tables
    Features {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Parse, then build the features
    Run {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        tables: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Unpack downloaded demo archives
    Extract {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write the default config
    Init,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let registry = tracing_subscriber::Registry::default()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::filter_fn(move |meta| {
            (meta.target().contains("pipeline") || meta.target().contains("analysis")) && *meta.level() <= level
        }));
    tracing::subscriber::set_global_default(registry)?;

    if let Commands::Init = cli.command {
        Config::default().save(&cli.config)?;
        tracing::info!(path = %cli.config.display(), "Wrote default config");
        return Ok(());
    }

    let mut config = Config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Parse { input, output } => {
            override_path(&mut config.parse.input, input);
            override_path(&mut config.parse.output, output);
            parse(&config)?;
        }
        Commands::Features { input, output } => {
            override_path(&mut config.features.input, input);
            override_path(&mut config.features.output, output);
            features(&config)?;
        }
        Commands::Run { input, tables, output } => {
            override_path(&mut config.parse.input, input);
            if let Some(tables) = tables {
                config.parse.output = tables.clone();
                config.features.input = tables;
            } else {
                config.features.input = config.parse.output.clone();
            }
            override_path(&mut config.features.output, output);

            parse(&config)?;
            features(&config)?;
        }
        Commands::Extract { input, output } => {
            override_path(&mut config.extract.input, input);
            override_path(&mut config.extract.output, output);

            let extractor = CommandExtractor::new(config.extract.tools.clone(), config.extract_timeout());
            let report = pipeline::extract::extract_all(&extractor, &config.extract.input, &config.extract.output)?;
            log_report("extract", &report);
        }
        Commands::Init => {}
    }

    Ok(())
}

fn override_path(target: &mut PathBuf, value: Option<PathBuf>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn parse(config: &Config) -> anyhow::Result<()> {
    if !config.parse.input.is_dir() {
        anyhow::bail!("input directory '{}' does not exist", config.parse.input.display());
    }

    let source = CsvTableSource::new(config.parse.input.clone());
    let store = FileStore::new(config.parse.output.clone());

    let report = pipeline::batch::parse_all(&source, &store, &config.weapons)?;
    store.write_summary(&report.summary("parse"))?;
    log_report("parse", &report);

    Ok(())
}

fn features(config: &Config) -> anyhow::Result<()> {
    if !config.features.input.is_dir() {
        anyhow::bail!("tables directory '{}' does not exist", config.features.input.display());
    }

    let input = FileStore::new(config.features.input.clone());
    let output = FileStore::new(config.features.output.clone());

    let report = pipeline::features::build_all(&input, &output, &config.feature_config(), &config.weapons)?;
    output.write_summary(&report.summary("features"))?;
    log_report("features", &report);

    Ok(())
}

fn log_report(stage: &str, report: &BatchReport) {
    tracing::info!(
        stage,
        processed = report.processed.len(),
        skipped = report.skipped.len(),
        fallback_events = report.fallback_events,
        "Done"
    );
    for (match_id, reason) in report.skipped.iter() {
        tracing::warn!(stage, match_id = %match_id, "Skipped: {}", reason);
    }
}
