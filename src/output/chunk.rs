//! Splitting a table into fixed-size delimited files

use tracing::debug;

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::{Error, Result};
use crate::model::Table;

use super::write_delimited;

/// One serialized slice of a table
#[derive(Debug, Clone)]
pub struct Chunk {
    /// `A`, `B`, .. `Z`, `AA`, ..
    pub letter: String,
    /// File name, `Chunk_<letter>_<base>.csv`
    pub name: String,
    /// Index of the first table row in this chunk
    pub start: usize,
    pub row_count: usize,
    /// Complete delimited file, header included
    pub bytes: Vec<u8>,
}

/// Letter for the chunk at `index`: spreadsheet-column style, so `Z` is
/// followed by `AA`, `AB`, ..
pub fn chunk_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Partitions tables into chunks of at most `max_rows` rows
#[derive(Debug, Clone)]
pub struct ChunkWriter {
    max_rows: usize,
    separator: u8,
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_CHUNK_SIZE,
            separator: b';',
        }
    }
}

impl ChunkWriter {
    pub fn new(max_rows: usize, separator: u8) -> Result<Self> {
        if max_rows == 0 {
            return Err(Error::InvalidConfig(
                "chunk size must be a positive number of rows".to_string(),
            ));
        }
        Ok(Self { max_rows, separator })
    }

    /// Serialize `table` as consecutive chunks named after `base_name`.
    ///
    /// Every chunk repeats the header. An empty table yields a single
    /// header-only chunk.
    pub fn write(&self, table: &Table, base_name: &str) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::with_capacity(table.row_count().div_ceil(self.max_rows).max(1));

        let mut start = 0;
        loop {
            let end = (start + self.max_rows).min(table.row_count());
            let letter = chunk_letter(chunks.len());
            let mut bytes = Vec::new();
            write_delimited(table, &table.rows[start..end], self.separator, &mut bytes)?;

            debug!(chunk = %letter, rows = end - start, "serialized chunk");
            chunks.push(Chunk {
                name: format!("Chunk_{letter}_{base_name}.csv"),
                letter,
                start,
                row_count: end - start,
                bytes,
            });

            start = end;
            if start >= table.row_count() {
                break;
            }
        }

        Ok(chunks)
    }
}
