//! Chunked reader over the weather events CSV.
//!
//! The header is validated once, at construction. After that the file is
//! consumed `chunk_size` rows at a time so the input side never holds more
//! than one chunk in memory. A row the CSV layer cannot decode (wrong field
//! count, bad UTF-8) becomes an `Err(RowError::Malformed)` entry in its
//! chunk; I/O failures end the read.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ErrorKind, StringRecord};

use crate::ingest::normalize::{RawEventRow, RowError};
use crate::ingest::schema::validate_headers;
use crate::pipeline::PipelineError;

/// One entry per input row, decoded or not.
pub type RowResult = Result<RawEventRow, RowError>;

pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
    headers: StringRecord,
    rows_read: usize,
}

impl EventReader<File> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let file = File::open(path.as_ref())?;
        Self::new(file)
    }
}

impl<R: Read> EventReader<R> {
    /// Wraps a reader and validates its header row.
    pub fn new(input: R) -> Result<Self, PipelineError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        validate_headers(headers.iter())?;

        Ok(EventReader {
            reader,
            headers,
            rows_read: 0,
        })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Total rows handed out so far, decoded or not.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Reads up to `chunk_size` rows. Returns `None` at end of input.
    pub fn next_chunk(&mut self, chunk_size: usize) -> Result<Option<Vec<RowResult>>, PipelineError> {
        let chunk_size = chunk_size.max(1);
        let mut rows = Vec::with_capacity(chunk_size.min(8192));
        let mut record = StringRecord::new();

        while rows.len() < chunk_size {
            match self.reader.read_record(&mut record) {
                Ok(false) => break,
                Ok(true) => {
                    let row = record
                        .deserialize::<RawEventRow>(Some(&self.headers))
                        .map_err(|e| RowError::Malformed(e.to_string()));
                    rows.push(row);
                }
                Err(e) if is_row_level(&e) => {
                    rows.push(Err(RowError::Malformed(e.to_string())));
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.rows_read += rows.len();

        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows))
        }
    }
}

/// Errors confined to a single record; the reader can continue past them.
fn is_row_level(error: &csv::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::UnequalLengths { .. } | ErrorKind::Utf8 { .. } | ErrorKind::Deserialize { .. }
    )
}
