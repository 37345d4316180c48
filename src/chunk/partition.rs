//! Greedy, order-preserving partitioning of summaries into size-bounded
//! chunks.
//!
//! Records are stably sorted by date, then scanned once. A record joins the
//! running chunk unless that would push the chunk past the budget, in which
//! case the running chunk is closed first. A record larger than the budget
//! on its own still gets a chunk of its own.

use std::io;

use log::{debug, warn};

use crate::ingest::SummaryRecord;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Byte budget for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBudget(u64);

impl ChunkBudget {
    pub fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub fn from_megabytes(mb: f64) -> Self {
        Self((mb * BYTES_PER_MB) as u64)
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }
}

/// Contiguous, date-ordered run of summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub records: Vec<SummaryRecord>,
    pub start_date: String,
    pub end_date: String,
    pub estimated_bytes: u64,
}

impl Chunk {
    fn close(records: Vec<SummaryRecord>, estimated_bytes: u64) -> Option<Self> {
        let start_date = records.first()?.date.clone();
        let end_date = records.last()?.date.clone();
        Some(Self {
            records,
            start_date,
            end_date,
            estimated_bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// State threaded through the partition scan.
#[derive(Debug, Default)]
pub struct ChunkAccumulator {
    closed: Vec<Chunk>,
    current: Vec<SummaryRecord>,
    current_bytes: u64,
}

impl ChunkAccumulator {
    /// Adds one record, closing the running chunk first when the record
    /// would overflow a non-empty chunk.
    pub fn push(mut self, record: SummaryRecord, budget: ChunkBudget) -> Self {
        let size = estimated_size(&record);
        let overflows = self.current_bytes.saturating_add(size) > budget.bytes();
        if overflows && !self.current.is_empty() {
            self = self.flush();
        }
        if size > budget.bytes() {
            debug!(
                "Conversation {} alone exceeds chunk budget ({size} > {} bytes)",
                record.identifier,
                budget.bytes()
            );
        }
        self.current.push(record);
        self.current_bytes += size;
        self
    }

    fn flush(mut self) -> Self {
        let records = std::mem::take(&mut self.current);
        let bytes = std::mem::replace(&mut self.current_bytes, 0);
        if let Some(chunk) = Chunk::close(records, bytes) {
            self.closed.push(chunk);
        }
        self
    }

    pub fn finish(self) -> Vec<Chunk> {
        self.flush().closed
    }
}

/// Sorts `records` by date (stable) and partitions them under `budget`.
pub fn partition(mut records: Vec<SummaryRecord>, budget: ChunkBudget) -> Vec<Chunk> {
    if records.is_empty() {
        warn!("No conversations to process");
        return Vec::new();
    }
    records.sort_by(|a, b| a.date.cmp(&b.date));
    records
        .into_iter()
        .fold(ChunkAccumulator::default(), |acc, record| {
            acc.push(record, budget)
        })
        .finish()
}

/// Approximate serialized footprint of a record: the byte length of its
/// compact JSON form.
pub fn estimated_size(record: &SummaryRecord) -> u64 {
    let mut counter = ByteCounter(0);
    match serde_json::to_writer(&mut counter, record) {
        Ok(()) => counter.0,
        Err(_) => field_bytes(record),
    }
}

fn field_bytes(record: &SummaryRecord) -> u64 {
    [
        &record.identifier,
        &record.date,
        &record.title,
        &record.preview,
        &record.full_text,
    ]
    .iter()
    .map(|field| field.len() as u64)
    .sum::<u64>()
        // four counters, at most 20 digits each
        + 4 * 20
}

struct ByteCounter(u64);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
