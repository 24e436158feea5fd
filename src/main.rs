//! tablemerge - Merge, deduplicate and look up tabular data

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tablemerge::config::{Config, DedupPolicy, DEFAULT_CHUNK_SIZE};
use tablemerge::lookup::LookupJoiner;
use tablemerge::output::{
    write_chunks_to_dir, write_table_to_path, ChunkWriter, RunSummary, WrittenFile,
};
use tablemerge::parser::{LoadOptions, ParserFactory, Source};
use tablemerge::workflow::audit::{audit_chunks, output_folder_name};
use tablemerge::workflow::{merge_sources, process_audit_log, AuditLogConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDedupPolicy {
    Append,
    Identity,
    MergeFields,
}

impl From<CliDedupPolicy> for DedupPolicy {
    fn from(p: CliDedupPolicy) -> Self {
        match p {
            CliDedupPolicy::Append => DedupPolicy::Append,
            CliDedupPolicy::Identity => DedupPolicy::Identity,
            CliDedupPolicy::MergeFields => DedupPolicy::MergeFields,
        }
    }
}

/// Merge, deduplicate and look up tabular data (CSV, Excel)
#[derive(Parser, Debug)]
#[command(name = "tablemerge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print a JSON summary of the written files
    #[arg(long, global = true)]
    json: bool,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge seller SKU exports (SellerName;SellerSku;PrimaryCategory;Name;Brand)
    Skus {
        /// SKU export files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = "Merged_skus_date.csv")]
        output: PathBuf,

        #[command(flatten)]
        dedup: DedupArgs,
    },

    /// Concatenate any delimited or spreadsheet files
    Merge {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file (ignored when --chunk-size is given)
        #[arg(short, long, default_value = "merged_output.csv")]
        output: PathBuf,

        /// Field separator of delimited inputs
        #[arg(long, default_value = ";", value_parser = parse_separator)]
        separator: u8,

        /// Field separator of the output
        #[arg(long, default_value = ",", value_parser = parse_separator)]
        output_separator: u8,

        /// Keep only these columns; every input must have them (comma-separated)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// For Excel files: which sheet to read
        #[arg(long)]
        sheet: Option<String>,

        #[command(flatten)]
        dedup: DedupArgs,

        /// Add CategoryId, CategoryLabel and CategoryPath from a Categories column
        #[arg(long)]
        split_categories: bool,

        /// Write chunks of at most this many rows instead of one file
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Directory for chunks
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Turn an audit log into a seller SKU approval file
    AuditLog {
        /// AuditLogEntry file (csv, xlsx, xls, ods)
        audit_file: PathBuf,

        /// Sellers file with User and Seller_ID columns
        #[arg(long)]
        sellers: PathBuf,

        /// Output directory (default: output_<timestamp>)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Rows per output chunk
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Copy columns from a reference file by matching a key column
    Lookup {
        /// Primary file; every row is kept
        primary: PathBuf,

        /// Reference file
        reference: PathBuf,

        /// Key column present in both files
        #[arg(short, long)]
        key: String,

        /// Reference columns to copy (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        columns: Vec<String>,

        /// Output file
        #[arg(short, long, default_value = "lookup_output.csv")]
        output: PathBuf,

        /// Field separator of delimited inputs
        #[arg(long, default_value = ";", value_parser = parse_separator)]
        separator: u8,

        /// Field separator of the output
        #[arg(long, default_value = ",", value_parser = parse_separator)]
        output_separator: u8,
    },
}

#[derive(Args, Debug)]
struct DedupArgs {
    /// How duplicate rows are handled
    #[arg(long, value_enum, default_value = "append")]
    dedup: CliDedupPolicy,

    /// Row key for --dedup merge-fields (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    key: Vec<String>,
}

fn parse_separator(s: &str) -> std::result::Result<u8, String> {
    match s {
        "\\t" | "tab" => Ok(b'\t'),
        _ if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        _ => Err(format!("separator must be a single ASCII character, got '{}'", s)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let kind = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<tablemerge::Error>())
                .map(|err| err.kind().to_string())
                .unwrap_or_else(|| "error".to_string());
            eprintln!("Error [{}]: {:#}", kind, e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}

fn read_sources(paths: &[PathBuf]) -> Result<Vec<Source>> {
    paths.iter().map(|p| read_source(p)).collect()
}

fn read_source(path: &Path) -> Result<Source> {
    Source::from_path(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

fn run(cli: Cli) -> Result<()> {
    let summary = match cli.command {
        Command::Skus {
            files,
            output,
            dedup,
        } => {
            let sources = read_sources(&files)?;
            let mut config = Config::sku_merge().with_dedup_policy(dedup.dedup.into());
            if !dedup.key.is_empty() {
                config = config.with_key_columns(dedup.key);
            }

            let outcome =
                merge_sources(&sources, &config).context("Failed to merge SKU files")?;

            let written = write_table_to_path(&outcome.table, config.output_separator, &output)?;
            RunSummary {
                command: "skus".to_string(),
                input_rows: outcome.input_rows,
                output_rows: outcome.table.row_count(),
                files: vec![written],
            }
        }

        Command::Merge {
            files,
            output,
            separator,
            output_separator,
            columns,
            sheet,
            dedup,
            split_categories,
            chunk_size,
            out_dir,
        } => {
            let sources = read_sources(&files)?;
            let mut config = Config::new()
                .with_separator(separator)
                .with_output_separator(output_separator)
                .with_dedup_policy(dedup.dedup.into())
                .with_key_columns(dedup.key)
                .with_split_categories(split_categories);
            if !columns.is_empty() {
                config = config.with_columns(columns);
            }
            if let Some(name) = sheet {
                config = config.with_sheet_name(name);
            }
            if let Some(size) = chunk_size {
                config = config.with_chunk_size(size);
            }

            let outcome = merge_sources(&sources, &config).context("Failed to merge files")?;

            let files: Vec<WrittenFile> = match config.chunk_size {
                Some(size) => {
                    let base = output
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "merged_output".to_string());
                    let chunks = ChunkWriter::new(size, config.output_separator)?
                        .write(&outcome.table, &base)?;
                    write_chunks_to_dir(&chunks, &out_dir)?
                }
                None => vec![write_table_to_path(
                    &outcome.table,
                    config.output_separator,
                    &output,
                )?],
            };

            RunSummary {
                command: "merge".to_string(),
                input_rows: outcome.input_rows,
                output_rows: outcome.table.row_count(),
                files,
            }
        }

        Command::AuditLog {
            audit_file,
            sellers,
            out_dir,
            chunk_size,
        } => {
            let audit = read_source(&audit_file)?;
            let sellers = read_source(&sellers)?;
            let config = AuditLogConfig::default().with_chunk_size(chunk_size);

            let table = process_audit_log(&audit, &sellers, &config)
                .with_context(|| format!("Failed to process audit log: {}", audit.name))?;
            let chunks = audit_chunks(&table, &audit, &config)?;

            let dir = out_dir.unwrap_or_else(|| {
                PathBuf::from(output_folder_name(chrono::Local::now().naive_local()))
            });
            let files = write_chunks_to_dir(&chunks, &dir)?;
            info!(dir = %dir.display(), "modified data saved");

            RunSummary {
                command: "audit-log".to_string(),
                input_rows: table.row_count(),
                output_rows: table.row_count(),
                files,
            }
        }

        Command::Lookup {
            primary,
            reference,
            key,
            columns,
            output,
            separator,
            output_separator,
        } => {
            let factory = ParserFactory::new();
            let options = LoadOptions {
                separator,
                ..Default::default()
            };
            let primary = factory.load(&read_source(&primary)?, &options)?;
            let reference = factory.load(&read_source(&reference)?, &options)?;

            let joined = LookupJoiner::new(key, columns)
                .join(&primary, &reference)
                .context("Lookup failed")?;
            let written = write_table_to_path(&joined, output_separator, &output)?;

            RunSummary {
                command: "lookup".to_string(),
                input_rows: primary.row_count(),
                output_rows: joined.row_count(),
                files: vec![written],
            }
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for file in &summary.files {
            println!("{} ({} rows)", file.path.display(), file.rows);
        }
    }

    Ok(())
}
