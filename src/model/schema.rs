//! Column metadata and column-set alignment

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Column metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (from header)
    pub name: String,
    /// Column index (0-based position)
    pub index: usize,
}

impl Column {
    /// Create a new column with name and index
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

/// Union of several column lists in first-seen order
pub fn union_columns<'a, I>(column_sets: I) -> Vec<Column>
where
    I: IntoIterator<Item = &'a [Column]>,
{
    let mut names: IndexSet<&str> = IndexSet::new();
    for columns in column_sets {
        for col in columns {
            names.insert(col.name.as_str());
        }
    }

    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Column::new(name, i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_keeps_first_seen_order() {
        let a = vec![Column::new("x", 0), Column::new("y", 1)];
        let b = vec![Column::new("z", 0), Column::new("x", 1)];

        let union = union_columns([a.as_slice(), b.as_slice()]);
        let names: Vec<_> = union.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        assert_eq!(union[2].index, 2);
    }
}
