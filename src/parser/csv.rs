//! Delimited text parser

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::model::{CellValue, Column, Table};

use super::{LoadOptions, Parser, Source};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parser for delimited text files
pub struct CsvParser;

impl Parser for CsvParser {
    fn parse(&self, source: &Source, options: &LoadOptions) -> Result<Table> {
        let bytes = source.bytes.strip_prefix(UTF8_BOM).unwrap_or(&source.bytes[..]);
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(options.separator)
            .from_reader(bytes);

        // Read headers
        let headers = csv_reader
            .headers()
            .map_err(|e| Error::parse(&source.name, format!("failed to read header: {e}")))?
            .clone();

        if headers.is_empty() {
            return Err(Error::format(&source.name, "no header row"));
        }

        let columns: Vec<Column> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| Column::new(name.trim(), i))
            .collect();

        let mut table = Table::new(source.name.clone(), columns);

        // Read rows
        for (line_num, result) in csv_reader.records().enumerate() {
            let record = result.map_err(|e| {
                // +2 for 1-indexing and header
                Error::parse(&source.name, format!("row {}: {e}", line_num + 2))
            })?;

            let cells: Vec<CellValue> = record.iter().map(parse_cell_value).collect();
            table.add_row(cells, line_num + 2);
        }

        Ok(table)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "csv" | "tsv" | "txt")
    }
}

/// Delimited fields stay text so identifiers keep their exact spelling
fn parse_cell_value(s: &str) -> CellValue {
    if s.is_empty() {
        CellValue::Null
    } else {
        CellValue::String(Cow::Owned(s.to_string()))
    }
}
