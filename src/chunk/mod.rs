//! Size-bounded chunking of summaries and their CSV output.
//!
//! ```no_run
//! use chatlog::chunk::{partition, ChunkBudget, CsvChunkWriter};
//! # let records = Vec::new();
//!
//! let chunks = partition(records, ChunkBudget::from_megabytes(18.0));
//! let written = CsvChunkWriter::new("data/filtered_output").write_all(&chunks)?;
//! println!("{} files", written.len());
//! # Ok::<(), chatlog::Error>(())
//! ```

mod partition;
mod sink;

pub use partition::{estimated_size, partition, Chunk, ChunkAccumulator, ChunkBudget};
pub use sink::{read_chunk, CsvChunkWriter, WrittenChunk};
