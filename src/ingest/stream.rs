//! Forward-only decoding of one top-level JSON array.
//!
//! Elements are handed to a callback as the deserializer reaches them, so a
//! single element is held in memory regardless of the export size.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::de::{SeqAccess, Visitor};
use serde::Deserializer as _;
use serde_json::Value;

use crate::error::{Error, Result};

const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

struct ElementVisitor<F> {
    on_element: F,
}

impl<'de, F> Visitor<'de> for ElementVisitor<F>
where
    F: FnMut(Value),
{
    type Value = u64;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON array of conversations")
    }

    fn visit_seq<A: SeqAccess<'de>>(mut self, mut seq: A) -> std::result::Result<u64, A::Error> {
        let mut count = 0;
        while let Some(value) = seq.next_element::<Value>()? {
            count += 1;
            (self.on_element)(value);
        }
        Ok(count)
    }
}

/// Decodes the elements of the array in `reader` one at a time, passing
/// each to `on_element`, and returns how many were decoded.
///
/// Any fault is fatal to the traversal: a source that is not an array, an
/// element that is not valid JSON, truncation or trailing content. Elements
/// decoded before the fault have already been passed on.
pub fn for_each_element<R, F>(mut reader: R, on_element: F) -> Result<u64>
where
    R: BufRead,
    F: FnMut(Value),
{
    if reader.fill_buf()?.starts_with(&BOM) {
        reader.consume(BOM.len());
    }
    let mut de = serde_json::Deserializer::from_reader(reader);
    let count = (&mut de)
        .deserialize_seq(ElementVisitor { on_element })
        .map_err(source_error)?;
    de.end().map_err(source_error)?;
    Ok(count)
}

fn source_error(err: serde_json::Error) -> Error {
    if err.is_io() {
        Error::Io(err.into())
    } else {
        Error::MalformedSource(err.to_string())
    }
}

/// Opens an export for streaming. Paths ending in `.gz` are decompressed on
/// the fly.
pub fn open_source(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if path.extension().and_then(|ext| ext.to_str()) == Some("gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::with_capacity(1 << 20, reader)))
}
