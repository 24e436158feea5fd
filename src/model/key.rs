//! Row key handling

use super::table::{CellValue, Table};
use crate::error::Result;

/// Text form of the key cells of a row
pub type RowKey = Vec<String>;

/// Builder for computing composite row keys
#[derive(Debug, Clone, Default)]
pub struct KeyBuilder {
    column_indices: Vec<usize>,
}

impl KeyBuilder {
    /// Key over every column of the row (row identity)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key columns by index
    pub fn with_columns(mut self, indices: Vec<usize>) -> Self {
        self.column_indices = indices;
        self
    }

    /// Set the key columns by name; every name must exist in `table`
    pub fn for_table<S: AsRef<str>>(table: &Table, names: &[S]) -> Result<Self> {
        let indices = names
            .iter()
            .map(|name| table.key_index(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new().with_columns(indices))
    }

    /// Build a key from cell values
    pub fn build_key(&self, cells: &[CellValue]) -> RowKey {
        if self.column_indices.is_empty() {
            // No key columns: the whole row is the key
            cells.iter().map(|c| c.as_text().into_owned()).collect()
        } else {
            self.column_indices
                .iter()
                .filter_map(|&i| cells.get(i))
                .map(|c| c.as_text().into_owned())
                .collect()
        }
    }

    /// Key of a row whose key cells are all non-empty; `None` when any key
    /// cell is empty, so such rows never group with others
    pub fn build_complete_key(&self, cells: &[CellValue]) -> Option<RowKey> {
        if self
            .column_indices
            .iter()
            .any(|&i| cells.get(i).map_or(true, CellValue::is_empty))
        {
            return None;
        }
        Some(self.build_key(cells))
    }

    /// Get the column indices
    pub fn column_indices(&self) -> &[usize] {
        &self.column_indices
    }

    /// Check if key columns are set
    pub fn has_key_columns(&self) -> bool {
        !self.column_indices.is_empty()
    }
}
