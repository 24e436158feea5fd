//! End-to-end flows: load, combine or join, and prepare output

pub mod audit;

use tracing::info;

use crate::category::CategorySplitter;
use crate::combine::Combiner;
use crate::config::{Config, DedupPolicy};
use crate::error::{Error, Result};
use crate::model::Table;
use crate::parser::{LoadOptions, ParserFactory, Source};

pub use audit::{process_audit_log, AuditLogConfig};

/// Result table of a merge plus the number of rows read
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub table: Table,
    pub input_rows: usize,
}

/// Load every source with the same options, combine them and optionally
/// split the categories column.
///
/// Either every source loads and the merged table is returned, or the first
/// failure is.
pub fn merge_sources(sources: &[Source], config: &Config) -> Result<MergeOutcome> {
    if sources.is_empty() {
        return Err(Error::NoInput);
    }

    let factory = ParserFactory::new();
    let options = LoadOptions::from(config);
    let tables = sources
        .iter()
        .map(|source| factory.load(source, &options))
        .collect::<Result<Vec<_>>>()?;
    let input_rows = tables.iter().map(Table::row_count).sum();

    let combiner = Combiner::new(config.dedup_policy).with_key_columns(config.key_columns.clone());
    let mut table = combiner.combine(tables)?;

    if config.split_categories {
        table = CategorySplitter::new().apply(table);
    }

    info!(
        files = sources.len(),
        input_rows,
        output_rows = table.row_count(),
        policy = %config.dedup_policy,
        "merged files"
    );
    Ok(MergeOutcome { table, input_rows })
}

/// Merge seller SKU exports: `;`-separated files restricted to the SKU
/// columns, keyed on seller name and SKU for field merging
pub fn merge_skus(sources: &[Source], policy: DedupPolicy) -> Result<MergeOutcome> {
    merge_sources(sources, &Config::sku_merge().with_dedup_policy(policy))
}
