use std::io::BufRead;
use std::path::Path;

use log::{error, info, warn};
use serde_json::Value;
use time::PrimitiveDateTime;

use crate::ingest::extract::{try_extract, SummaryRecord};
use crate::ingest::raw::RawConversation;
use crate::ingest::stream::{for_each_element, open_source};
use crate::ingest::timestamp::{format_date, parse_created_at};

pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

/// Per-run counters for the filter pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Elements read from the source, whatever happened to them.
    pub examined: u64,
    pub accepted: u64,
    /// No `created_at`.
    pub undated: u64,
    pub unparsable: u64,
    pub too_old: u64,
    /// In the window but without messages.
    pub empty: u64,
    /// Extraction raised an error.
    pub failed: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub records: Vec<SummaryRecord>,
    pub stats: FilterStats,
    /// Set when the source could not be opened or read to the end. The
    /// records are then empty.
    pub source_error: Option<String>,
}

/// Streams an export, keeping conversations created at or after `cutoff`.
#[derive(Debug, Clone)]
pub struct StreamFilter {
    cutoff: PrimitiveDateTime,
    progress_interval: u64,
}

impl StreamFilter {
    pub fn new(cutoff: PrimitiveDateTime) -> Self {
        Self {
            cutoff,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    pub fn filter_path(&self, path: &Path) -> FilterOutcome {
        if !path.exists() {
            error!("Conversations file not found: {}", path.display());
            return FilterOutcome {
                source_error: Some(format!("not found: {}", path.display())),
                ..FilterOutcome::default()
            };
        }
        info!("Processing conversations file: {}", path.display());
        if let Ok(meta) = std::fs::metadata(path) {
            info!("File size: {:.1} MB", meta.len() as f64 / (1024.0 * 1024.0));
        }

        match open_source(path) {
            Ok(reader) => self.filter_reader(reader),
            Err(err) => {
                error!("Error opening conversations file {}: {err}", path.display());
                FilterOutcome {
                    source_error: Some(err.to_string()),
                    ..FilterOutcome::default()
                }
            }
        }
    }

    /// Filters a JSON array of conversations. A source that is not valid
    /// JSON throughout yields no records, whatever was accepted before the
    /// fault.
    pub fn filter_reader<R: BufRead>(&self, reader: R) -> FilterOutcome {
        info!("Filtering conversations since: {}", format_date(self.cutoff));
        let mut outcome = FilterOutcome::default();

        let streamed = for_each_element(reader, |value| self.visit(value, &mut outcome));
        if let Err(err) = streamed {
            error!("Error parsing conversations file: {err}");
            outcome.records.clear();
            outcome.source_error = Some(err.to_string());
            return outcome;
        }

        info!("Found {} conversations in window", outcome.records.len());
        outcome
    }

    fn visit(&self, value: Value, outcome: &mut FilterOutcome) {
        let examined = outcome.stats.examined;
        if examined % self.progress_interval == 0 {
            info!("Processed {examined} conversations...");
        }
        outcome.stats.examined += 1;
        if let Some(record) = self.accept(&RawConversation::new(value), &mut outcome.stats) {
            outcome.records.push(record);
        }
    }

    fn accept(&self, raw: &RawConversation, stats: &mut FilterStats) -> Option<SummaryRecord> {
        let Some(created_at) = raw.created_at() else {
            stats.undated += 1;
            return None;
        };
        let Some(created) = parse_created_at(&created_at) else {
            stats.unparsable += 1;
            return None;
        };
        if created < self.cutoff {
            stats.too_old += 1;
            return None;
        }

        match try_extract(raw) {
            Ok(Some(record)) => {
                stats.accepted += 1;
                Some(record)
            }
            Ok(None) => {
                stats.empty += 1;
                None
            }
            Err(err) => {
                stats.failed += 1;
                warn!("Error processing conversation {}: {err}", raw.id());
                None
            }
        }
    }
}
