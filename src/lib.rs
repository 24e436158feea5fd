//! tablemerge - Merge, deduplicate and look up tabular data
//!
//! Loads delimited text and spreadsheets into uniform tables, concatenates
//! them under a configurable dedup policy, enriches them with VLOOKUP-style
//! joins, and writes the result as one file or as lettered chunks.

pub mod category;
pub mod combine;
pub mod config;
pub mod error;
pub mod lookup;
pub mod model;
pub mod output;
pub mod parser;
pub mod workflow;

pub use config::{Config, DedupPolicy};
pub use error::{Error, ErrorKind, Result};
pub use model::Table;
pub use parser::Source;
