//! VLOOKUP-style left join of reference columns onto a primary table

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{CellValue, Column, Row, Table};

/// Suffix for copied columns whose name already exists in the primary table
const COLLISION_SUFFIX: &str = "_ref";

/// Copies columns from a reference table by matching a key column
#[derive(Debug, Clone)]
pub struct LookupJoiner {
    key: String,
    columns: Vec<String>,
}

impl LookupJoiner {
    /// Join on `key`, copying `columns` from the reference table
    pub fn new(key: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            key: key.into(),
            columns,
        }
    }

    /// Left outer join. Every primary row appears once, in order; rows without
    /// a match get nulls in the copied columns. The first reference row wins
    /// when a key repeats.
    pub fn join(&self, primary: &Table, reference: &Table) -> Result<Table> {
        let primary_key = primary.key_index(&self.key)?;
        let reference_key = reference.key_index(&self.key)?;

        let mut requested = FxHashSet::default();
        let copied: Vec<&String> = self
            .columns
            .iter()
            .filter(|c| **c != self.key && requested.insert(c.as_str()))
            .collect();
        let mut copy_indices = Vec::with_capacity(copied.len());
        let mut missing = Vec::new();
        for name in &copied {
            match reference.column_index(name) {
                Some(i) => copy_indices.push(i),
                None => missing.push(name.as_str()),
            }
        }
        if !missing.is_empty() {
            return Err(Error::format(
                &reference.name,
                format!("missing lookup columns: {}", missing.join(", ")),
            ));
        }

        // First occurrence of each key
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        for (i, row) in reference.rows.iter().enumerate() {
            let key = &row.cells[reference_key];
            if !key.is_empty() {
                index.entry(key.as_text().into_owned()).or_insert(i);
            }
        }

        let mut columns = primary.columns.clone();
        let mut taken: FxHashSet<String> = columns.iter().map(|c| c.name.clone()).collect();
        for name in &copied {
            let name = unique_name(name, &taken);
            taken.insert(name.clone());
            columns.push(Column::new(name, columns.len()));
        }

        let mut result = Table::new(primary.name.clone(), columns);
        result.rows.reserve(primary.row_count());

        let mut unmatched = 0usize;
        for row in &primary.rows {
            let mut cells = row.cells.clone();
            let key = &row.cells[primary_key];
            let matched = if key.is_empty() {
                None
            } else {
                index.get(&*key.as_text()).map(|&i| &reference.rows[i])
            };

            match matched {
                Some(found) => cells.extend(copy_indices.iter().map(|&i| found.cells[i].clone())),
                None => {
                    unmatched += 1;
                    cells.extend(std::iter::repeat(CellValue::Null).take(copy_indices.len()));
                }
            }
            result.rows.push(Row::new(cells, row.source_line));
        }

        if unmatched > 0 {
            warn!(
                key = %self.key,
                reference = %reference.name,
                unmatched,
                "rows without a lookup match"
            );
        }
        debug!(
            primary = %primary.name,
            reference = %reference.name,
            rows = result.row_count(),
            "lookup join finished"
        );
        Ok(result)
    }
}

/// `name`, or `name_ref`, `name_ref2`, .. when already taken
fn unique_name(name: &str, taken: &FxHashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    let mut candidate = format!("{name}{COLLISION_SUFFIX}");
    let mut n = 2;
    while taken.contains(&candidate) {
        candidate = format!("{name}{COLLISION_SUFFIX}{n}");
        n += 1;
    }
    candidate
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

    fn sellers() -> Table {
        table(
            "sellers.xlsx",
            &["User", "Seller_ID", "Country"],
            &[&["alice", "100", "SG"], &["bob", "200", "MY"], &["alice", "999", "TH"]],
        )
    }

    #[test]
    fn test_left_join_keeps_every_primary_row() {
        let log = table(
            "audit.csv",
            &["User", "SKU"],
            &[&["bob", "a"], &["carol", "b"], &["alice", "c"], &["", "d"]],
        );

        let joined = LookupJoiner::new("User", vec!["Seller_ID".to_string()])
            .join(&log, &sellers())
            .unwrap();

        assert_eq!(joined.column_names(), vec!["User", "SKU", "Seller_ID"]);
        assert_eq!(joined.row_count(), 4);
        let ids: Vec<_> = (0..4)
            .map(|i| joined.value(i, "Seller_ID").unwrap().as_text().into_owned())
            .collect();
        assert_eq!(ids, vec!["200", "", "100", ""]);
        assert_eq!(joined.value(3, "SKU"), Some(&CellValue::from("d")));
    }

    #[test]
    fn test_first_match_wins() {
        let log = table("audit.csv", &["User"], &[&["alice"]]);
        let joined = LookupJoiner::new("User", vec!["Country".to_string()])
            .join(&log, &sellers())
            .unwrap();
        assert_eq!(joined.value(0, "Country"), Some(&CellValue::from("SG")));
    }

    #[test]
    fn test_missing_key_column() {
        let log = table("audit.csv", &["Username"], &[&["alice"]]);
        let joiner = LookupJoiner::new("User", vec!["Seller_ID".to_string()]);

        let err = joiner.join(&log, &sellers()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingKeyColumn);
        assert!(err.to_string().contains("audit.csv"));

        let err = joiner.join(&sellers(), &log).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingKeyColumn);
    }

    #[test]
    fn test_missing_copy_column() {
        let log = table("audit.csv", &["User"], &[&["alice"]]);
        let err = LookupJoiner::new("User", vec!["Region".to_string()])
            .join(&log, &sellers())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_colliding_and_key_columns() {
        let log = table("audit.csv", &["User", "Country"], &[&["bob", "XX"]]);
        let joined = LookupJoiner::new(
            "User",
            vec!["User".to_string(), "Country".to_string()],
        )
        .join(&log, &sellers())
        .unwrap();

        assert_eq!(joined.column_names(), vec!["User", "Country", "Country_ref"]);
        assert_eq!(joined.value(0, "Country"), Some(&CellValue::from("XX")));
        assert_eq!(joined.value(0, "Country_ref"), Some(&CellValue::from("MY")));
    }

    #[test]
    fn test_suffixed_names_stay_unique() {
        let log = table(
            "audit.csv",
            &["User", "Country", "Country_ref"],
            &[&["bob", "XX", "YY"]],
        );
        let joined = LookupJoiner::new(
            "User",
            vec!["Country".to_string(), "Seller_ID".to_string(), "Country".to_string()],
        )
        .join(&log, &sellers())
        .unwrap();

        assert_eq!(
            joined.column_names(),
            vec!["User", "Country", "Country_ref", "Country_ref2", "Seller_ID"]
        );
        assert_eq!(joined.value(0, "Country_ref"), Some(&CellValue::from("YY")));
        assert_eq!(joined.value(0, "Country_ref2"), Some(&CellValue::from("MY")));
        assert_eq!(joined.value(0, "Seller_ID"), Some(&CellValue::from("200")));
    }
}
