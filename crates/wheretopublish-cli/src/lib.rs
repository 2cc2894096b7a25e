//! Shared CLI definitions for wheretopublish.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Compression format for dataset files
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Gzip compression (.gz)
    Gzip,
    /// Zstandard compression (.zst)
    Zstd,
    /// Bzip2 compression (.bz2)
    Bzip2,
    /// XZ compression (.xz)
    Xz,
}

impl CompressionFormat {
    /// Detect compression format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            match ext.to_lowercase().as_str() {
                "gz" => Some(Self::Gzip),
                "zst" | "zstd" => Some(Self::Zstd),
                "bz2" | "bz" => Some(Self::Bzip2),
                "xz" => Some(Self::Xz),
                _ => None,
            }
        } else {
            None
        }
    }

    /// Get file extension for this compression format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Zstd => "zst",
            Self::Bzip2 => "bz2",
            Self::Xz => "xz",
        }
    }
}

/// Publisher type choices for `--publisher-type`
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PublisherTypeChoice {
    All,
    ForProfit,
    NonProfit,
    UniversityPress,
}

/// Business model choices for `--business-model`
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum BusinessModelChoice {
    All,
    Subscription,
    Hybrid,
    Oa,
    OaDiamond,
}

/// Command-line arguments for wheretopublish
#[derive(Clone, Parser, Debug)]
#[command(
    name = "wheretopublish",
    version,
    about = "Journal selection from the terminal",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Dataset to open: a source id from the configured catalog, a CSV path, or an http(s) URL.
    /// Defaults to the configured default source.
    #[arg(value_name = "SOURCE")]
    pub source: Option<String>,

    /// Free-text search; every whitespace-separated word must appear somewhere in the row
    #[arg(long = "search", short = 's', value_name = "TEXT")]
    pub search: Option<String>,

    /// Only show journals from this kind of publisher
    #[arg(long = "publisher-type", value_enum)]
    pub publisher_type: Option<PublisherTypeChoice>,

    /// Only show journals with this business model
    #[arg(long = "business-model", value_enum)]
    pub business_model: Option<BusinessModelChoice>,

    /// Only show journals in this subfield (exact match)
    #[arg(long = "field", value_name = "NAME")]
    pub field: Option<String>,

    /// Only show journals whose publisher is based in this country (exact match)
    #[arg(long = "country", value_name = "NAME")]
    pub country: Option<String>,

    /// Only show journals associated with this institution type (exact match)
    #[arg(long = "institution-type", value_name = "NAME")]
    pub institution_type: Option<String>,

    /// Only show journals with this PCI partner value (exact match)
    #[arg(long = "pci-partner", value_name = "VALUE")]
    pub pci_partner: Option<String>,

    /// Lower APC bound in euros. Journals without a known APC are hidden when a range is set.
    #[arg(long = "apc-min", value_name = "EUROS")]
    pub apc_min: Option<u32>,

    /// Upper APC bound in euros. At the histogram ceiling the range is open-ended.
    #[arg(long = "apc-max", value_name = "EUROS")]
    pub apc_max: Option<u32>,

    /// Sort by this column (header name, case-insensitive, or 0-based column index)
    #[arg(long = "sort", value_name = "COLUMN")]
    pub sort: Option<String>,

    /// Sort in descending order (requires --sort)
    #[arg(long = "desc", requires = "sort", action)]
    pub desc: bool,

    /// Comma-separated list of columns to show (mandatory columns are always shown)
    #[arg(long = "columns", value_delimiter = ',', value_name = "COLUMNS")]
    pub columns: Option<Vec<String>>,

    /// Restore the default set of visible columns
    #[arg(long = "reset-columns", action)]
    pub reset_columns: bool,

    /// Print at most this many rows
    #[arg(long = "limit", value_name = "N")]
    pub limit: Option<usize>,

    /// Print the APC histogram of the visible journals
    #[arg(long = "histogram", action)]
    pub histogram: bool,

    /// Print publisher type and business model counts
    #[arg(long = "counts", action)]
    pub counts: bool,

    /// Specify the compression format explicitly (gzip, zstd, bzip2, xz).
    /// If not specified, compression is auto-detected from file extension.
    #[arg(long = "compression", value_enum)]
    pub compression: Option<CompressionFormat>,

    /// Do not save preferences on exit
    #[arg(long = "no-save", action)]
    pub no_save: bool,

    /// List the configured dataset sources and exit
    #[arg(long = "list-sources", action)]
    pub list_sources: bool,

    /// Merge every field-specific catalog source into one deduplicated all-fields CSV
    /// written to FILE, then exit
    #[arg(long = "build-all", value_name = "FILE")]
    pub build_all: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Remove saved preferences and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Generate default configuration file at ~/.config/wheretopublish/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn value_placeholder(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder = value_placeholder(arg);
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                value_placeholder(arg)
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
