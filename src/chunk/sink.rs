use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::chunk::Chunk;
use crate::error::{Error, Result};
use crate::ingest::SummaryRecord;
use crate::layout::chunk_file_name;

/// A chunk as persisted on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenChunk {
    pub path: PathBuf,
    pub rows: usize,
    pub bytes: u64,
}

/// Writes each chunk to `conversations_<start>_to_<end>.csv` under one
/// directory, replacing any file of the same name.
pub struct CsvChunkWriter {
    dir: PathBuf,
}

impl CsvChunkWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, chunk: &Chunk) -> Result<WrittenChunk> {
        let name = chunk_file_name(&chunk.start_date, &chunk.end_date)?;
        let path = self.dir.join(&name);
        let tmp = self.dir.join(format!("{name}.tmp"));

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        // Header comes from the `SummaryRecord` field names.
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(file);
        for record in &chunk.records {
            writer.serialize(record)?;
        }
        let file = writer
            .into_inner()
            .map_err(|err| Error::Io(err.into_error()))?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp, &path)?;

        let bytes = std::fs::metadata(&path)?.len();
        info!(
            "Created: {name} ({:.1} MB, {} conversations)",
            bytes as f64 / (1024.0 * 1024.0),
            chunk.records.len()
        );

        Ok(WrittenChunk {
            path,
            rows: chunk.records.len(),
            bytes,
        })
    }

    /// Writes every chunk and returns one entry per file left on disk.
    ///
    /// Chunks confined to the same single date share a file name; the later
    /// chunk replaces the earlier one and the lost conversations are logged.
    pub fn write_all(&self, chunks: &[Chunk]) -> Result<Vec<WrittenChunk>> {
        let mut written: Vec<WrittenChunk> = Vec::with_capacity(chunks.len());
        let mut owners: HashMap<PathBuf, (usize, &Chunk)> = HashMap::new();

        for chunk in chunks {
            let file = self.write(chunk)?;
            match owners.get_mut(&file.path) {
                Some((slot, previous)) => {
                    let lost: Vec<&str> = previous
                        .records
                        .iter()
                        .map(|record| record.identifier.as_str())
                        .collect();
                    warn!(
                        "{} overwritten by a later chunk; {} conversations lost: {}",
                        file.path.display(),
                        lost.len(),
                        lost.join(", ")
                    );
                    *previous = chunk;
                    written[*slot] = file;
                }
                None => {
                    owners.insert(file.path.clone(), (written.len(), chunk));
                    written.push(file);
                }
            }
        }
        Ok(written)
    }
}

/// Reads back the summaries of a written chunk.
pub fn read_chunk(path: &Path) -> Result<Vec<SummaryRecord>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
