//! Table combiner: stable concatenation with optional deduplication

use std::collections::hash_map::Entry;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::config::DedupPolicy;
use crate::error::{Error, Result};
use crate::model::{union_columns, CellValue, KeyBuilder, Row, RowKey, Table};

/// Combines tables under a dedup policy
#[derive(Debug, Clone, Default)]
pub struct Combiner {
    policy: DedupPolicy,
    key_columns: Vec<String>,
}

impl Combiner {
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            policy,
            key_columns: Vec::new(),
        }
    }

    /// Row key used by `DedupPolicy::MergeFields`
    pub fn with_key_columns(mut self, keys: Vec<String>) -> Self {
        self.key_columns = keys;
        self
    }

    /// Concatenate `tables` in order and apply the dedup policy.
    ///
    /// Inputs whose column sets differ are aligned onto the union of their
    /// columns; cells a table does not have are null.
    pub fn combine(&self, tables: Vec<Table>) -> Result<Table> {
        if tables.is_empty() {
            return Err(Error::NoInput);
        }

        if self.policy == DedupPolicy::MergeFields {
            if self.key_columns.is_empty() {
                return Err(Error::InvalidConfig(
                    "merge-fields dedup needs at least one key column".to_string(),
                ));
            }
            for table in &tables {
                for key in &self.key_columns {
                    table.key_index(key)?;
                }
            }
        }

        let input_rows: usize = tables.iter().map(Table::row_count).sum();
        let combined = concat(tables);

        let result = match self.policy {
            DedupPolicy::Append => combined,
            DedupPolicy::Identity => dedup_identity(combined),
            DedupPolicy::MergeFields => {
                let keys = KeyBuilder::for_table(&combined, &self.key_columns)?;
                merge_fields(combined, &keys)
            }
        };

        debug!(
            policy = %self.policy,
            input_rows,
            output_rows = result.row_count(),
            "combined tables"
        );
        Ok(result)
    }
}

/// Stable concatenation onto the union of the input columns
fn concat(tables: Vec<Table>) -> Table {
    let columns = union_columns(tables.iter().map(|t| t.columns.as_slice()));
    let name = tables
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join("+");

    let mut result = Table::new(name, columns);
    result.rows.reserve(tables.iter().map(Table::row_count).sum());

    for table in tables {
        let mapping: Vec<Option<usize>> = table
            .columns
            .iter()
            .map(|c| result.column_index(&c.name))
            .collect();

        // Same layout: move rows over untouched
        if mapping.len() == result.column_count()
            && mapping.iter().enumerate().all(|(i, &m)| m == Some(i))
        {
            result.rows.extend(table.rows);
            continue;
        }

        for row in table.rows {
            let mut cells = vec![CellValue::Null; result.column_count()];
            for (cell, target) in row.cells.into_iter().zip(&mapping) {
                if let Some(&target) = target.as_ref() {
                    cells[target] = cell;
                }
            }
            result.rows.push(Row::new(cells, row.source_line));
        }
    }

    result
}

/// Keep the first occurrence of every distinct row
fn dedup_identity(mut table: Table) -> Table {
    let keys = KeyBuilder::new();
    let mut seen: FxHashSet<RowKey> = FxHashSet::default();
    table.rows.retain(|row| seen.insert(keys.build_key(&row.cells)));
    table
}

/// Single pass grouping by key; later duplicates fill the empty fields of
/// the retained row and are then dropped. Rows with an empty key cell stay
/// on their own.
fn merge_fields(mut table: Table, keys: &KeyBuilder) -> Table {
    let mut merged: Vec<Row> = Vec::with_capacity(table.row_count());
    let mut groups: FxHashMap<RowKey, usize> = FxHashMap::default();

    for row in std::mem::take(&mut table.rows) {
        let Some(key) = keys.build_complete_key(&row.cells) else {
            merged.push(row);
            continue;
        };
        match groups.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(merged.len());
                merged.push(row);
            }
            Entry::Occupied(slot) => {
                let kept = &mut merged[*slot.get()];
                for (target, incoming) in kept.cells.iter_mut().zip(row.cells) {
                    if target.is_empty() && !incoming.is_empty() {
                        *target = incoming;
                    }
                }
            }
        }
    }

    table.rows = merged;
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn table(name: &str, columns: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::with_column_names(name, columns);
        for (i, row) in rows.iter().enumerate() {
            let cells = row
                .iter()
                .map(|v| if v.is_empty() { CellValue::Null } else { CellValue::from(*v) })
                .collect();
            t.add_row(cells, i + 2);
        }
        t
    }

    fn texts(table: &Table, column: &str) -> Vec<String> {
        let idx = table.column_index(column).unwrap();
        table.rows.iter().map(|r| r.cells[idx].as_text().into_owned()).collect()
    }

    #[test]
    fn test_empty_input() {
        let err = Combiner::new(DedupPolicy::Append).combine(Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoInput);
    }

    #[test]
    fn test_append_preserves_order_and_count() {
        let a = table("a.csv", &["k", "v"], &[&["1", "x"], &["2", "y"], &["1", "x"]]);
        let b = table("b.csv", &["k", "v"], &[&["3", "z"], &["1", "x"]]);

        let result = Combiner::new(DedupPolicy::Append).combine(vec![a, b]).unwrap();
        assert_eq!(result.row_count(), 5);
        assert_eq!(texts(&result, "k"), vec!["1", "2", "1", "3", "1"]);
        assert_eq!(result.name, "a.csv+b.csv");
    }

    #[test]
    fn test_identity_dedup_is_idempotent() {
        let a = table("a.csv", &["k", "v"], &[&["1", "x"], &["2", "y"], &["1", "x"]]);
        let combiner = Combiner::new(DedupPolicy::Identity);

        let once = combiner.combine(vec![a.clone()]).unwrap();
        let twice = combiner.combine(vec![a.clone(), a]).unwrap();

        assert_eq!(texts(&once, "k"), vec!["1", "2"]);
        assert_eq!(once.rows, twice.rows);
    }

    #[test]
    fn test_identity_keeps_rows_differing_in_one_field() {
        let a = table("a.csv", &["k", "v"], &[&["1", "x"], &["1", "y"]]);
        let result = Combiner::new(DedupPolicy::Identity).combine(vec![a]).unwrap();
        assert_eq!(result.row_count(), 2);
    }

    #[test]
    fn test_merge_fields_fills_empty_values() {
        let a = table("a.csv", &["k", "x", "y"], &[&["1", "", "first"], &["2", "b", ""]]);
        let b = table("b.csv", &["k", "x", "y"], &[&["1", "V", "second"], &["3", "c", "d"]]);

        let result = Combiner::new(DedupPolicy::MergeFields)
            .with_key_columns(vec!["k".to_string()])
            .combine(vec![a, b])
            .unwrap();

        assert_eq!(texts(&result, "k"), vec!["1", "2", "3"]);
        assert_eq!(texts(&result, "x"), vec!["V", "b", "c"]);
        assert_eq!(texts(&result, "y"), vec!["first", "", "d"]);
        assert_eq!(result.rows[0].source_line, 2);
    }

    #[test]
    fn test_merge_fields_composite_key() {
        let a = table(
            "a.csv",
            &["SellerName", "SellerSku", "Brand"],
            &[&["acme", "1", ""], &["beta", "1", "B"], &["acme", "1", "A"]],
        );
        let result = Combiner::new(DedupPolicy::MergeFields)
            .with_key_columns(vec!["SellerName".to_string(), "SellerSku".to_string()])
            .combine(vec![a])
            .unwrap();

        assert_eq!(texts(&result, "SellerName"), vec!["acme", "beta"]);
        assert_eq!(texts(&result, "Brand"), vec!["A", "B"]);
    }

    #[test]
    fn test_merge_fields_keeps_rows_with_blank_keys() {
        let a = table(
            "a.csv",
            &["SellerName", "SellerSku", "Name"],
            &[&["acme", "", "Phone"], &["acme", "", "Cable"], &["acme", "1", "Case"]],
        );
        let b = table("b.csv", &["SellerName", "SellerSku", "Name"], &[&["acme", "1", "Plug"]]);

        let result = Combiner::new(DedupPolicy::MergeFields)
            .with_key_columns(vec!["SellerName".to_string(), "SellerSku".to_string()])
            .combine(vec![a, b])
            .unwrap();

        assert_eq!(result.row_count(), 3);
        assert_eq!(texts(&result, "Name"), vec!["Phone", "Cable", "Case"]);
    }

    #[test]
    fn test_merge_fields_requires_key() {
        let a = table("a.csv", &["k"], &[&["1"]]);

        let err = Combiner::new(DedupPolicy::MergeFields)
            .combine(vec![a.clone()])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);

        let err = Combiner::new(DedupPolicy::MergeFields)
            .with_key_columns(vec!["missing".to_string()])
            .combine(vec![a])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingKeyColumn);
        assert!(err.to_string().contains("a.csv"));
    }

    #[test]
    fn test_differing_columns_are_aligned() {
        let a = table("a.xlsx", &["x", "y"], &[&["1", "2"]]);
        let b = table("b.xlsx", &["z", "x"], &[&["3", "4"]]);

        let result = Combiner::new(DedupPolicy::Append).combine(vec![a, b]).unwrap();
        assert_eq!(result.column_names(), vec!["x", "y", "z"]);
        assert_eq!(texts(&result, "x"), vec!["1", "4"]);
        assert_eq!(texts(&result, "y"), vec!["2", ""]);
        assert_eq!(texts(&result, "z"), vec!["", "3"]);
    }
}
