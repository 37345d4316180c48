use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use chatlog::{logging, ExportConfig, Pipeline, RunStatus};

#[derive(Parser, Debug)]
#[command(name = "chatlog-export")]
#[command(about = "Filter a conversation export to recent conversations and write size-bounded CSV chunks")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root of the data/, config/ and logs/ tree (default: .)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Directory holding conversations.json and projects.json
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Directory the CSV chunks are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Keep conversations created within this many days (default: 90)
    #[arg(long)]
    days: Option<u32>,

    /// Estimated size budget per CSV file in MiB (default: 18)
    #[arg(long)]
    max_chunk_mb: Option<f64>,

    /// Log progress every N conversations (default: 100)
    #[arg(long)]
    progress_every: Option<u64>,
}

impl Cli {
    fn into_config(self) -> Result<ExportConfig> {
        let mut config = match &self.config {
            Some(path) => ExportConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ExportConfig::default(),
        };
        if let Some(dir) = self.base_dir {
            config.base_dir = dir;
        }
        if let Some(dir) = self.export_dir {
            config.export_dir = Some(dir);
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = Some(dir);
        }
        if let Some(days) = self.days {
            config.lookback_days = days;
        }
        if let Some(mb) = self.max_chunk_mb {
            config.max_chunk_mb = mb;
        }
        if let Some(every) = self.progress_every {
            config.progress_interval = every;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<ExitCode> {
    let config = Cli::parse().into_config()?;

    let pipeline = Pipeline::new(config);
    let layout = pipeline.layout();
    std::fs::create_dir_all(layout.logs_dir())
        .with_context(|| format!("failed to create {}", layout.logs_dir().display()))?;
    if let Some(err) = logging::init(&layout.log_path()) {
        warn!(
            "Could not open log file {}: {err}; logging to stderr only",
            layout.log_path().display()
        );
    }

    info!("Starting conversation export");
    let summary = pipeline.run().context("export failed")?;
    info!(
        "Examined {} conversations, kept {} ({} too old, {} undated, {} unparsable, {} empty, {} failed)",
        summary.stats.examined,
        summary.stats.accepted,
        summary.stats.too_old,
        summary.stats.undated,
        summary.stats.unparsable,
        summary.stats.empty,
        summary.stats.failed,
    );

    match summary.status {
        RunStatus::Completed => Ok(ExitCode::SUCCESS),
        RunStatus::NoConversations => Ok(ExitCode::FAILURE),
    }
}
