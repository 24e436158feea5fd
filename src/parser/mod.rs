//! Parser layer for reading delimited and spreadsheet data

mod csv;
mod excel;

use std::path::Path;

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::Table;

pub use self::csv::CsvParser;
pub use self::excel::ExcelParser;

/// A named byte stream handed in by the caller
#[derive(Debug, Clone)]
pub struct Source {
    /// Display name, normally the uploaded file name
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Source {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, naming the source after the file name
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    /// Lowercased extension of the display name, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

/// How a single source is read
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field separator for delimited text
    pub separator: u8,
    /// Sheet to read from a workbook (first sheet when unset)
    pub sheet_name: Option<String>,
    /// Expected columns; the loaded table is restricted to these
    pub columns: Option<Vec<String>>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            separator: b';',
            sheet_name: None,
            columns: None,
        }
    }
}

impl LoadOptions {
    pub fn with_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }
}

impl From<&Config> for LoadOptions {
    fn from(config: &Config) -> Self {
        Self {
            separator: config.separator,
            sheet_name: config.sheet_name.clone(),
            columns: config.columns.clone(),
        }
    }
}

/// Trait for parsing tabular data
pub trait Parser: Send + Sync {
    /// Parse a source and return a Table with every column of the file
    fn parse(&self, source: &Source, options: &LoadOptions) -> Result<Table>;

    /// Check if this parser can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Factory for choosing a parser based on file extension
pub struct ParserFactory {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    /// Create a new parser factory with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(CsvParser), Box::new(ExcelParser)],
        }
    }

    /// Get a parser for the given source
    pub fn get_parser(&self, source: &Source) -> Result<&dyn Parser> {
        let ext = match source.extension() {
            Some(ext) => ext,
            None => detect_format(&source.bytes).to_string(),
        };

        self.parsers
            .iter()
            .find(|p| p.supports_extension(&ext))
            .map(|p| p.as_ref())
            .ok_or_else(|| Error::UnsupportedExtension {
                name: source.name.clone(),
                extension: ext,
            })
    }

    /// Load a source, restricting it to the expected columns when given
    pub fn load(&self, source: &Source, options: &LoadOptions) -> Result<Table> {
        let parser = self.get_parser(source)?;
        let table = parser.parse(source, options)?;

        let table = match options.columns {
            Some(ref columns) => table.select(columns)?,
            None => table,
        };

        debug!(
            source = %source.name,
            rows = table.row_count(),
            columns = table.column_count(),
            "loaded table"
        );
        Ok(table)
    }
}

/// Load a single source with the default parser set
pub fn load_table(source: &Source, options: &LoadOptions) -> Result<Table> {
    ParserFactory::new().load(source, options)
}

/// Detect file format from content (for sources without extension)
pub fn detect_format(bytes: &[u8]) -> &'static str {
    if bytes.len() >= 4 {
        // Excel ZIP format (xlsx, ods)
        if &bytes[0..4] == b"PK\x03\x04" {
            return "xlsx";
        }

        // Old Excel format (xls)
        if &bytes[0..4] == b"\xD0\xCF\x11\xE0" {
            return "xls";
        }
    }

    "csv"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::CellValue;

    #[test]
    fn test_unsupported_extension() {
        let source = Source::new("report.pdf", b"%PDF-1.4".to_vec());
        let err = load_table(&source, &LoadOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedExtension);
        assert!(err.to_string().contains("pdf"));
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(b"PK\x03\x04rest"), "xlsx");
        assert_eq!(detect_format(b"\xD0\xCF\x11\xE0rest"), "xls");
        assert_eq!(detect_format(b"a;b\n1;2\n"), "csv");
        assert_eq!(detect_format(b""), "csv");
    }

    #[test]
    fn test_extensionless_source_is_sniffed() {
        let source = Source::new("upload", b"User;Seller_ID\nbob;7\n".to_vec());
        let table = load_table(&source, &LoadOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["User", "Seller_ID"]);
    }

    #[test]
    fn test_load_restricts_to_expected_columns() {
        let source = Source::new(
            "skus.csv",
            b"Extra;SellerSku;SellerName\nx;sku-1;acme\n".to_vec(),
        );
        let options = LoadOptions::default().with_columns(&["SellerName", "SellerSku"]);
        let table = load_table(&source, &options).unwrap();

        assert_eq!(table.column_names(), vec!["SellerName", "SellerSku"]);
        assert_eq!(table.value(0, "SellerSku"), Some(&CellValue::from("sku-1")));
    }

    #[test]
    fn test_load_missing_expected_column() {
        let source = Source::new("skus.csv", b"SellerName\nacme\n".to_vec());
        let options = LoadOptions::default().with_columns(&["SellerName", "Brand"]);
        let err = load_table(&source, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("Brand"));
    }

    #[test]
    fn test_source_name_parts() {
        let source = Source::new("AuditLogEntry_2024.CSV", Vec::new());
        assert_eq!(source.extension().as_deref(), Some("csv"));
        assert_eq!(source.stem(), "AuditLogEntry_2024");
    }
}
