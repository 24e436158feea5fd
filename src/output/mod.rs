//! Delimited output for result tables

mod chunk;

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::model::{Row, Table};

pub use chunk::{chunk_letter, Chunk, ChunkWriter};

/// Write the header of `table` followed by `rows` as delimited text
pub fn write_delimited<W: Write>(
    table: &Table,
    rows: &[Row],
    separator: u8,
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(separator)
        .from_writer(writer);

    csv_writer
        .write_record(table.columns.iter().map(|c| c.name.as_str()))
        .map_err(std::io::Error::from)?;

    for row in rows {
        csv_writer
            .write_record(row.cells.iter().map(|c| c.as_text().into_owned()))
            .map_err(std::io::Error::from)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Serialize a whole table into one delimited blob
pub fn to_delimited_bytes(table: &Table, separator: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    write_delimited(table, &table.rows, separator, &mut bytes)?;
    Ok(bytes)
}

/// An output file as reported to the caller
#[derive(Debug, Clone, Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub rows: usize,
}

/// Summary of a run, printed by the CLI with `--json`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub command: String,
    pub input_rows: usize,
    pub output_rows: usize,
    pub files: Vec<WrittenFile>,
}

/// Write a fully serialized chunk set into `dir`, creating it if needed
pub fn write_chunks_to_dir(chunks: &[Chunk], dir: &Path) -> Result<Vec<WrittenFile>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let path = dir.join(&chunk.name);
        std::fs::write(&path, &chunk.bytes)?;
        written.push(WrittenFile {
            path,
            rows: chunk.row_count,
        });
    }

    info!(dir = %dir.display(), files = written.len(), "wrote chunks");
    Ok(written)
}

/// Write a whole table to a single file
pub fn write_table_to_path(table: &Table, separator: u8, path: &Path) -> Result<WrittenFile> {
    let bytes = to_delimited_bytes(table, separator)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;

    info!(path = %path.display(), rows = table.row_count(), "wrote table");
    Ok(WrittenFile {
        path: path.to_path_buf(),
        rows: table.row_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn sample() -> Table {
        let mut table = Table::with_column_names("t", &["SellerID", "Rejection Message"]);
        table.add_row(vec![CellValue::Int(42), CellValue::Null], 2);
        table.add_row(vec!["a;b".into(), "say \"hi\"".into()], 3);
        table
    }

    #[test]
    fn test_comma_output_renders_null_as_empty() {
        let bytes = to_delimited_bytes(&sample(), b',').unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "SellerID,Rejection Message\n42,\na;b,\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_semicolon_output_quotes_separator() {
        let bytes = to_delimited_bytes(&sample(), b';').unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("SellerID;Rejection Message\n42;\n"));
        assert!(text.contains("\"a;b\""));
    }

    #[test]
    fn test_write_chunks_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("output_run");
        let chunks = ChunkWriter::new(1, b';').unwrap().write(&sample(), "log").unwrap();

        let written = write_chunks_to_dir(&chunks, &target).unwrap();
        assert_eq!(written.len(), 2);
        assert!(target.join("Chunk_A_log.csv").exists());
        let second = std::fs::read_to_string(target.join("Chunk_B_log.csv")).unwrap();
        assert!(second.starts_with("SellerID;Rejection Message\n"));
    }
}
