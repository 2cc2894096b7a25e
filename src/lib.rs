//! Journal selection engine: parse a journal CSV, filter it, and derive the APC
//! histogram and category counts that drive the selection buttons.

pub mod cache;
pub mod cli;
pub mod config;
pub mod filter;
pub mod merge;
pub mod parser;
pub mod preferences;
pub mod query;
pub mod render;
pub mod row;
pub mod session;
pub mod source;
pub mod statistics;

pub use cache::CacheManager;
pub use cli::Args;
pub use config::{AppConfig, ConfigManager};
pub use filter::{BusinessModelFilter, CategoryFilter, FilterState, OaMatching, PublisherTypeFilter};
pub use merge::{JournalMerger, JournalRecord};
pub use parser::{parse, BinBoundaries, ParseConfig, ParsedDataset};
pub use preferences::{PreferenceSnapshot, PreferenceStore};
pub use query::{ResetScope, SortDirection, SortOrder};
pub use row::{Column, ColumnSet, Row};
pub use session::{LoadResponse, LoadTicket, Session};
pub use source::{DatasetSource, InputSource};
pub use statistics::{CategoryCounts, HistogramBin};

/// Application name used for the config and cache directories
pub const APP_NAME: &str = "wheretopublish";

/// Re-export compression format from CLI module
pub use cli::CompressionFormat;
