//! Audit log processing: SKU extraction and seller id lookup

use chrono::NaiveDateTime;
use tracing::info;

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::Result;
use crate::lookup::LookupJoiner;
use crate::model::{CellValue, Table};
use crate::output::{Chunk, ChunkWriter};
use crate::parser::{LoadOptions, ParserFactory, Source};

/// Columns read from the audit log
pub const AUDIT_LOG_COLUMNS: [&str; 2] = ["User", "Description"];

/// Suffix stripped from creation events before the SKU is taken
const CREATED_SUFFIX: &str = ") has been created";

/// Settings for the audit log flow
#[derive(Debug, Clone)]
pub struct AuditLogConfig {
    /// Separator of delimited audit logs and seller lists
    pub separator: u8,
    /// Separator of the written chunks
    pub output_separator: u8,
    pub chunk_size: usize,
}

impl Default for AuditLogConfig {
    fn default() -> Self {
        Self {
            separator: b';',
            output_separator: b';',
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl AuditLogConfig {
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }
}

/// Take the SKU out of an event description such as
/// `"Product (ABC-123) has been created"`.
pub fn extract_sku(description: &str) -> Option<String> {
    description
        .replace(CREATED_SUFFIX, "")
        .split_whitespace()
        .last()
        .map(str::to_string)
}

/// Build the approval table for an audit log.
///
/// Output columns: `SellerID`, `SellerSku`, `Approved`, `Reject Reason Ids`,
/// `Rejection Message`. Users missing from the seller list get an empty id.
pub fn process_audit_log(
    audit: &Source,
    sellers: &Source,
    config: &AuditLogConfig,
) -> Result<Table> {
    let factory = ParserFactory::new();
    let audit_options = LoadOptions {
        separator: config.separator,
        ..Default::default()
    }
    .with_columns(&AUDIT_LOG_COLUMNS);
    let seller_options = LoadOptions {
        separator: config.separator,
        ..Default::default()
    };

    let mut log = factory.load(audit, &audit_options)?;
    let sellers = factory.load(sellers, &seller_options)?;

    let description = log.key_index("Description")?;
    log.push_column("SKU", |row| match &row.cells[description] {
        cell if cell.is_empty() => CellValue::Null,
        cell => extract_sku(&cell.as_text()).into(),
    });

    let joined = LookupJoiner::new("User", vec!["Seller_ID".to_string()]).join(&log, &sellers)?;

    let mut result = joined.select(&["Seller_ID", "SKU"])?;
    result.rename_column("Seller_ID", "SellerID");
    result.rename_column("SKU", "SellerSku");
    result.push_column("Approved", |_| CellValue::from("Yes"));
    result.push_column("Reject Reason Ids", |_| CellValue::Null);
    result.push_column("Rejection Message", |_| CellValue::Null);

    info!(
        audit = %audit.name,
        sellers = %sellers.name,
        rows = result.row_count(),
        "processed audit log"
    );
    Ok(result)
}

/// Chunks for a processed audit log, named after the audit file's stem
pub fn audit_chunks(table: &Table, audit: &Source, config: &AuditLogConfig) -> Result<Vec<Chunk>> {
    ChunkWriter::new(config.chunk_size, config.output_separator)?.write(table, audit.stem())
}

/// Folder name for one run, e.g. `output_2024-03-01_142530`
pub fn output_folder_name(now: NaiveDateTime) -> String {
    format!("output_{}", now.format("%Y-%m-%d_%H%M%S"))
}
