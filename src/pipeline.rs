//! One export run, end to end.

use log::{error, info};
use time::PrimitiveDateTime;

use crate::chunk::{partition, CsvChunkWriter, WrittenChunk};
use crate::config::ExportConfig;
use crate::error::Result;
use crate::ingest::{cutoff_from, local_now, FilterStats, StreamFilter};
use crate::layout::ExportLayout;
use crate::projects::sync_projects;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// Nothing survived the filter; no files were written.
    NoConversations,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub projects: usize,
    pub stats: FilterStats,
    pub written: Vec<WrittenChunk>,
    pub status: RunStatus,
}

pub struct Pipeline {
    config: ExportConfig,
    layout: ExportLayout,
    now: Option<PrimitiveDateTime>,
}

impl Pipeline {
    pub fn new(config: ExportConfig) -> Self {
        let layout = config.layout();
        Self {
            config,
            layout,
            now: None,
        }
    }

    /// Pins the clock the lookback window is measured from.
    pub fn with_now(mut self, now: PrimitiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn layout(&self) -> &ExportLayout {
        &self.layout
    }

    /// Runs the export. Missing or corrupt sources end in
    /// `RunStatus::NoConversations`; only directory and chunk write faults
    /// are returned as errors.
    pub fn run(&self) -> Result<RunSummary> {
        self.layout.ensure_dirs()?;

        let projects = sync_projects(
            &self.layout.projects_path(),
            &self.layout.project_mapping_path(),
        );

        let now = self.now.unwrap_or_else(local_now);
        let filter = StreamFilter::new(cutoff_from(now, self.config.lookback_days))
            .with_progress_interval(self.config.progress_interval);
        let outcome = filter.filter_path(&self.layout.conversations_path());

        if outcome.records.is_empty() {
            error!("No conversations found to process");
            return Ok(RunSummary {
                projects: projects.len(),
                stats: outcome.stats,
                written: Vec::new(),
                status: RunStatus::NoConversations,
            });
        }

        let chunks = partition(outcome.records, self.config.budget());
        info!("Partitioned into {} chunks", chunks.len());
        let writer = CsvChunkWriter::new(self.layout.output_dir());
        let written = writer.write_all(&chunks)?;

        info!(
            "Processing complete! Created {} CSV files in {}",
            written.len(),
            writer.dir().display()
        );
        Ok(RunSummary {
            projects: projects.len(),
            stats: outcome.stats,
            written,
            status: RunStatus::Completed,
        })
    }
}
