use thiserror::Error;

use crate::layout::LayoutError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed source: {0}")]
    MalformedSource(String),
    #[error("malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
