//! Splitting of `"<id> - <label> / <label> / ..."` category strings

use serde::Serialize;

use crate::model::{CellValue, Table};

const ID_SEPARATOR: &str = " - ";
const PATH_SEPARATOR: &str = " / ";

/// Parts of a category string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryParts {
    pub id: String,
    pub label: String,
    pub path: Vec<String>,
}

/// Split a single category string.
///
/// `"12 - Electronics / Phones"` yields id `12`, label `Electronics / Phones`
/// and path `[Electronics, Phones]`. A value without `" - "` keeps the whole
/// string as its only path segment and leaves id and label empty.
pub fn split_category(value: &str) -> CategoryParts {
    match value.split_once(ID_SEPARATOR) {
        Some((id, label)) => CategoryParts {
            id: id.to_string(),
            label: label.to_string(),
            path: label.split(PATH_SEPARATOR).map(str::to_string).collect(),
        },
        None => CategoryParts {
            path: vec![value.to_string()],
            ..Default::default()
        },
    }
}

/// Adds id, label and path columns derived from a categories column
#[derive(Debug, Clone)]
pub struct CategorySplitter {
    source_column: String,
    id_column: String,
    label_column: String,
    path_column: String,
}

impl Default for CategorySplitter {
    fn default() -> Self {
        Self {
            source_column: "Categories".to_string(),
            id_column: "CategoryId".to_string(),
            label_column: "CategoryLabel".to_string(),
            path_column: "CategoryPath".to_string(),
        }
    }
}

impl CategorySplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read categories from another column
    pub fn with_source_column(mut self, name: impl Into<String>) -> Self {
        self.source_column = name.into();
        self
    }

    /// Names of the three added columns
    pub fn with_output_columns(
        mut self,
        id: impl Into<String>,
        label: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        self.id_column = id.into();
        self.label_column = label.into();
        self.path_column = path.into();
        self
    }

    /// Return `table` with the three category columns appended. The path is
    /// stored as a JSON array. Without a source column, or for empty cells,
    /// the added columns are empty.
    pub fn apply(&self, mut table: Table) -> Table {
        let source = table.column_index(&self.source_column);
        let parts: Vec<Option<CategoryParts>> = table
            .rows
            .iter()
            .map(|row| {
                let cell = row.get(source?)?;
                if cell.is_empty() {
                    None
                } else {
                    Some(split_category(&cell.as_text()))
                }
            })
            .collect();

        let mut ids = Vec::with_capacity(parts.len());
        let mut labels = Vec::with_capacity(parts.len());
        let mut paths = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Some(p) => {
                    ids.push(non_empty(p.id));
                    labels.push(non_empty(p.label));
                    paths.push(CellValue::from(path_to_json(&p.path)));
                }
                None => {
                    ids.push(CellValue::Null);
                    labels.push(CellValue::Null);
                    paths.push(CellValue::Null);
                }
            }
        }

        push_values(&mut table, &self.id_column, ids);
        push_values(&mut table, &self.label_column, labels);
        push_values(&mut table, &self.path_column, paths);
        table
    }
}

fn non_empty(s: String) -> CellValue {
    if s.is_empty() {
        CellValue::Null
    } else {
        CellValue::from(s)
    }
}

fn path_to_json(path: &[String]) -> String {
    // A list of strings always serializes
    serde_json::to_string(path).unwrap_or_default()
}

fn push_values(table: &mut Table, name: &str, values: Vec<CellValue>) {
    let mut values = values.into_iter();
    table.push_column(name, |_| values.next().unwrap_or(CellValue::Null));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_well_formed() {
        let parts = split_category("12 - Electronics / Phones");
        assert_eq!(parts.id, "12");
        assert_eq!(parts.label, "Electronics / Phones");
        assert_eq!(parts.path, vec!["Electronics", "Phones"]);
    }

    #[test]
    fn test_split_only_at_first_delimiter() {
        let parts = split_category("7 - Home - Garden / Tools");
        assert_eq!(parts.id, "7");
        assert_eq!(parts.label, "Home - Garden / Tools");
        assert_eq!(parts.path, vec!["Home - Garden", "Tools"]);
    }

    #[test]
    fn test_split_without_delimiter() {
        let parts = split_category("Uncategorised");
        assert!(parts.id.is_empty());
        assert!(parts.label.is_empty());
        assert_eq!(parts.path, vec!["Uncategorised"]);
    }

    #[test]
    fn test_apply_adds_columns() {
        let mut table = Table::with_column_names("skus.csv", &["SellerSku", "Categories"]);
        table.add_row(vec!["a".into(), "12 - Electronics / Phones".into()], 2);
        table.add_row(vec!["b".into(), "Misc".into()], 3);
        table.add_row(vec!["c".into(), CellValue::Null], 4);

        let table = CategorySplitter::new().apply(table);
        assert_eq!(
            table.column_names(),
            vec!["SellerSku", "Categories", "CategoryId", "CategoryLabel", "CategoryPath"]
        );
        assert_eq!(table.value(0, "CategoryId"), Some(&CellValue::from("12")));
        assert_eq!(
            table.value(0, "CategoryPath"),
            Some(&CellValue::from(r#"["Electronics","Phones"]"#))
        );
        assert_eq!(table.value(1, "CategoryId"), Some(&CellValue::Null));
        assert_eq!(table.value(1, "CategoryPath"), Some(&CellValue::from(r#"["Misc"]"#)));
        assert_eq!(table.value(2, "CategoryPath"), Some(&CellValue::Null));
    }

    #[test]
    fn test_apply_without_source_column() {
        let mut table = Table::with_column_names("skus.csv", &["SellerSku"]);
        table.add_row(vec!["a".into()], 2);

        let table = CategorySplitter::new()
            .with_output_columns("Id", "Label", "Path")
            .apply(table);
        assert_eq!(table.column_names(), vec!["SellerSku", "Id", "Label", "Path"]);
        assert!(table.rows[0].cells[1..].iter().all(CellValue::is_null));
    }

    #[test]
    fn test_apply_with_other_source_column() {
        let mut table = Table::with_column_names("tree.xlsx", &["Categories", "Tree"]);
        table.add_row(vec!["1 - Ignored".into(), "5 - Home / Garden".into()], 2);

        let table = CategorySplitter::new().with_source_column("Tree").apply(table);
        assert_eq!(table.value(0, "CategoryId"), Some(&CellValue::from("5")));
        assert_eq!(
            table.value(0, "CategoryPath"),
            Some(&CellValue::from(r#"["Home","Garden"]"#))
        );
    }
}
