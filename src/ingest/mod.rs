//! Export ingestion.
//!
//! Streams the conversation export element by element, drops anything
//! outside the lookback window and flattens the rest into `SummaryRecord`s.
//!
//! ```no_run
//! use chatlog::ingest::{cutoff_from, local_now, StreamFilter};
//! use std::path::Path;
//!
//! let filter = StreamFilter::new(cutoff_from(local_now(), 90));
//! let outcome = filter.filter_path(Path::new("data/historical_export/conversations.json"));
//! println!("kept {} of {}", outcome.stats.accepted, outcome.stats.examined);
//! ```

mod extract;
mod filter;
mod raw;
mod stream;
mod timestamp;

pub use extract::{
    extract, normalize_date, try_extract, SummaryRecord, FULL_TEXT_LIMIT, PREVIEW_LIMIT,
    PREVIEW_SUFFIX, TRUNCATION_MARKER,
};
pub use filter::{FilterOutcome, FilterStats, StreamFilter, DEFAULT_PROGRESS_INTERVAL};
pub use raw::{RawConversation, RawMessage, Role, UNKNOWN_ID, UNTITLED};
pub use stream::{for_each_element, open_source};
pub use timestamp::{cutoff_from, format_date, local_now, parse_created_at};
