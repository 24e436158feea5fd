//! Excel file parser (xlsx, xls, ods)

use std::borrow::Cow;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use crate::error::{Error, Result};
use crate::model::{CellValue, Column, Table};

use super::{LoadOptions, Parser, Source};

/// Parser for Excel files
pub struct ExcelParser;

impl Parser for ExcelParser {
    fn parse(&self, source: &Source, options: &LoadOptions) -> Result<Table> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(source.bytes.as_slice()))
            .map_err(|e| Error::parse(&source.name, format!("failed to open workbook: {e}")))?;

        // Get sheet name
        let sheet_name = match options.sheet_name {
            Some(ref name) => name.clone(),
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| Error::format(&source.name, "no sheets found in workbook"))?,
        };

        // Get the sheet range
        let range: Range<Data> = workbook.worksheet_range(&sheet_name).map_err(|e| {
            Error::format(&source.name, format!("failed to read sheet '{sheet_name}': {e}"))
        })?;

        parse_range(&source.name, range)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "xlsx" | "xls" | "ods" | "xlsm")
    }
}

fn parse_range(name: &str, range: Range<Data>) -> Result<Table> {
    let (_, col_count) = range.get_size();

    // First row is header
    let header_row = range
        .rows()
        .next()
        .ok_or_else(|| Error::format(name, "empty sheet"))?;
    let columns: Vec<Column> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let header = cell_to_string(cell);
            let header = header.trim();
            Column::new(
                if header.is_empty() {
                    format!("Column{}", i + 1)
                } else {
                    header.to_string()
                },
                i,
            )
        })
        .collect();

    let mut table = Table::new(name, columns);

    // Read data rows
    for (line_num, row) in range.rows().skip(1).enumerate() {
        let cells: Vec<CellValue> = row.iter().take(col_count).map(convert_cell).collect();
        table.add_row(cells, line_num + 2); // +2 for 1-indexing and header
    }

    Ok(table)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#{:?}", e),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => {
            if s.trim().is_empty() {
                CellValue::Null
            } else {
                CellValue::String(Cow::Owned(s.clone()))
            }
        }
        Data::Float(f) => {
            // Whole numbers (seller ids, quantities) come back as floats
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(ref dt) => {
            let s = format!("{}", dt);
            if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f") {
                CellValue::DateTime(datetime)
            } else if let Ok(datetime) =
                chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
            {
                CellValue::DateTime(datetime)
            } else if let Ok(date) = chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                CellValue::Date(date)
            } else {
                CellValue::String(Cow::Owned(s))
            }
        }
        Data::DateTimeIso(s) => {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                CellValue::DateTime(dt)
            } else if let Ok(d) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                CellValue::Date(d)
            } else {
                CellValue::String(Cow::Owned(s.clone()))
            }
        }
        Data::DurationIso(s) => CellValue::String(Cow::Owned(s.clone())),
        Data::Error(e) => CellValue::String(Cow::Owned(format!("#{:?}", e))),
    }
}
