//! Run configuration.
//!
//! Defines the lookback window, per-file budget and directory overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunk::ChunkBudget;
use crate::error::{Error, Result};
use crate::layout::ExportLayout;

/// Configuration for one export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Root of the data/config/logs tree.
    /// Default: current directory
    pub base_dir: PathBuf,

    /// Overrides `<base>/data/historical_export`.
    pub export_dir: Option<PathBuf>,

    /// Overrides `<base>/data/filtered_output`.
    pub output_dir: Option<PathBuf>,

    /// Conversations created within this many days of now are kept.
    /// Default: 90
    pub lookback_days: u32,

    /// Estimated budget per output file, in MiB.
    /// Default: 18 (downstream consumer rejects files over ~20 MB)
    pub max_chunk_mb: f64,

    /// Log progress every N records examined.
    /// Default: 100
    pub progress_interval: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            export_dir: None,
            output_dir: None,
            lookback_days: 90,
            max_chunk_mb: 18.0,
            progress_interval: 100,
        }
    }
}

impl ExportConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let config: ExportConfig = serde_json::from_slice(&data)
            .map_err(|err| Error::Config(format!("{}: {err}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.max_chunk_mb.is_finite() || self.max_chunk_mb <= 0.0 {
            return Err(Error::Config(format!(
                "max_chunk_mb must be a positive number, got {}",
                self.max_chunk_mb
            )));
        }
        if self.progress_interval == 0 {
            return Err(Error::Config(
                "progress_interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn budget(&self) -> ChunkBudget {
        ChunkBudget::from_megabytes(self.max_chunk_mb)
    }

    pub fn max_chunk_bytes(&self) -> u64 {
        self.budget().bytes()
    }

    pub fn layout(&self) -> ExportLayout {
        let mut layout = ExportLayout::new(&self.base_dir);
        if let Some(dir) = &self.export_dir {
            layout = layout.with_export_dir(dir);
        }
        if let Some(dir) = &self.output_dir {
            layout = layout.with_output_dir(dir);
        }
        layout
    }
}
