//! Conversation export filtering and chunking.
//!
//! Streams a large conversation export, keeps the conversations created in
//! the lookback window, flattens each into a bounded summary row and writes
//! the rows as date-ordered CSV files that stay under a size budget.

pub mod chunk;
pub mod config;
pub mod error;
pub mod ingest;
pub mod layout;
pub mod logging;
pub mod pipeline;
pub mod projects;

pub use config::ExportConfig;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, RunStatus, RunSummary};
