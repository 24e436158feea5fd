//! Configuration handling for tablemerge

use serde::Serialize;

/// Columns kept from every file in the SKU merge flow
pub const SKU_COLUMNS: [&str; 5] = ["SellerName", "SellerSku", "PrimaryCategory", "Name", "Brand"];

/// Row key of the SKU merge flow when merging fields
pub const SKU_KEY_COLUMNS: [&str; 2] = ["SellerName", "SellerSku"];

/// Rows per chunk used by the audit-log flow
pub const DEFAULT_CHUNK_SIZE: usize = 80_000;

/// How duplicate rows are treated when tables are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupPolicy {
    /// Plain concatenation
    #[default]
    Append,
    /// Rows identical across all columns collapse to the first occurrence
    Identity,
    /// Rows sharing a key are unioned field by field, first non-empty value wins
    MergeFields,
}

impl std::str::FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "append" => Ok(DedupPolicy::Append),
            "identity" | "dedup-by-identity" => Ok(DedupPolicy::Identity),
            "merge-fields" | "dedup-merge-fields" => Ok(DedupPolicy::MergeFields),
            _ => Err(format!("Unknown dedup policy: {}", s)),
        }
    }
}

impl std::fmt::Display for DedupPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DedupPolicy::Append => write!(f, "append"),
            DedupPolicy::Identity => write!(f, "identity"),
            DedupPolicy::MergeFields => write!(f, "merge-fields"),
        }
    }
}

/// Configuration for a merge run
#[derive(Debug, Clone)]
pub struct Config {
    /// Field separator of delimited input
    pub separator: u8,
    /// Field separator of the written output
    pub output_separator: u8,
    /// For spreadsheets: which sheet to read (first sheet when unset)
    pub sheet_name: Option<String>,
    /// Columns every input must contain; the tables are restricted to them
    pub columns: Option<Vec<String>>,
    /// Dedup policy used when combining tables
    pub dedup_policy: DedupPolicy,
    /// Row key columns for `DedupPolicy::MergeFields`
    pub key_columns: Vec<String>,
    /// Split the categories column into id, label and path
    pub split_categories: bool,
    /// Maximum rows per output chunk; `None` writes a single file
    pub chunk_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            separator: b';',
            output_separator: b',',
            sheet_name: None,
            columns: None,
            dedup_policy: DedupPolicy::default(),
            key_columns: Vec::new(),
            split_categories: false,
            chunk_size: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for merging seller SKU exports
    pub fn sku_merge() -> Self {
        Self::new()
            .with_columns(SKU_COLUMNS.iter().map(|c| c.to_string()).collect())
            .with_key_columns(SKU_KEY_COLUMNS.iter().map(|c| c.to_string()).collect())
    }

    /// Set the input separator
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Set the output separator
    pub fn with_output_separator(mut self, separator: u8) -> Self {
        self.output_separator = separator;
        self
    }

    /// Set Excel sheet name
    pub fn with_sheet_name(mut self, name: String) -> Self {
        self.sheet_name = Some(name);
        self
    }

    /// Restrict every input to these columns
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_dedup_policy(mut self, policy: DedupPolicy) -> Self {
        self.dedup_policy = policy;
        self
    }

    /// Set key columns for field merging
    pub fn with_key_columns(mut self, keys: Vec<String>) -> Self {
        self.key_columns = keys;
        self
    }

    pub fn with_split_categories(mut self, split: bool) -> Self {
        self.split_categories = split;
        self
    }

    /// Emit chunks of at most `size` rows instead of one file
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_policy_from_str() {
        assert_eq!("append".parse::<DedupPolicy>(), Ok(DedupPolicy::Append));
        assert_eq!("Identity".parse::<DedupPolicy>(), Ok(DedupPolicy::Identity));
        assert_eq!(
            "dedup-merge-fields".parse::<DedupPolicy>(),
            Ok(DedupPolicy::MergeFields)
        );
        assert!("sometimes".parse::<DedupPolicy>().is_err());
    }

    #[test]
    fn test_sku_preset() {
        let config = Config::sku_merge();
        assert_eq!(config.separator, b';');
        assert_eq!(config.output_separator, b',');
        assert_eq!(config.columns.as_ref().map(Vec::len), Some(5));
        assert_eq!(config.key_columns, vec!["SellerName", "SellerSku"]);
        assert_eq!(config.dedup_policy, DedupPolicy::Append);
    }
}
