//! CSV text → journal rows.
//!
//! Columns are positional (Journal, Field, Publisher, Publisher type, Business model,
//! Institution, Institution type, Country, Website, APC Euros, Scimago Rank, Scimago
//! Quartile, H index, PCI partner); the header line is skipped without being read.
//! Malformed lines are recovered on a best-effort basis and never abort the parse.

use std::collections::BTreeSet;
use std::time::Instant;

use crate::config::HistogramConfig;
use crate::row::Row;

/// Header names of the positional CSV layout, in file order.
pub const CSV_HEADERS: [&str; 14] = [
    "Journal",
    "Field",
    "Publisher",
    "Publisher type",
    "Business model",
    "Institution",
    "Institution type",
    "Country",
    "Website",
    "APC Euros",
    "Scimago Rank",
    "Scimago Quartile",
    "H index",
    "PCI partner",
];

const JOURNAL: usize = 0;
const FIELD: usize = 1;
const PUBLISHER: usize = 2;
const PUBLISHER_TYPE: usize = 3;
const BUSINESS_MODEL: usize = 4;
const INSTITUTION: usize = 5;
const INSTITUTION_TYPE: usize = 6;
const COUNTRY: usize = 7;
const WEBSITE: usize = 8;
const APC: usize = 9;
const SCIMAGO_RANK: usize = 10;
const SCIMAGO_QUARTILE: usize = 11;
const H_INDEX: usize = 12;
const PCI_PARTNER: usize = 13;

/// Histogram layout used while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    pub histogram_bin_count: usize,
    pub histogram_ceiling: u32,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            histogram_bin_count: 16,
            histogram_ceiling: 5000,
        }
    }
}

impl From<&HistogramConfig> for ParseConfig {
    fn from(config: &HistogramConfig) -> Self {
        Self {
            histogram_bin_count: config.bin_count,
            histogram_ceiling: config.ceiling,
        }
    }
}

/// Ascending APC bin boundaries covering `[0, ceiling]` in equal-width segments.
///
/// `n` bins have `n + 1` boundaries; bin `i` spans `boundaries[i]..=boundaries[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinBoundaries(Vec<u32>);

impl BinBoundaries {
    pub fn generate(bin_count: usize, ceiling: u32) -> Self {
        if bin_count == 0 {
            return Self(vec![0]);
        }
        let step = f64::from(ceiling) / bin_count as f64;
        Self(
            (0..=bin_count)
                .map(|i| (i as f64 * step).round() as u32)
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn bin_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn ceiling(&self) -> u32 {
        self.0.last().copied().unwrap_or(0)
    }

    /// First bin whose closed range contains `value`; values beyond the last
    /// boundary land in the final bin. `None` only when there are no bins.
    pub fn bucket_for(&self, value: u32) -> Option<usize> {
        let last = self.bin_count().checked_sub(1)?;
        let found = self
            .0
            .windows(2)
            .position(|w| w[0] <= value && value <= w[1]);
        Some(found.unwrap_or(last))
    }
}

/// Result of parsing one CSV document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDataset {
    pub rows: Vec<Row>,
    /// Distinct non-empty subfield values, sorted.
    pub distinct_field_values: Vec<String>,
    pub bins: BinBoundaries,
}

impl ParsedDataset {
    pub fn empty(config: &ParseConfig) -> Self {
        Self {
            rows: Vec::new(),
            distinct_field_values: Vec::new(),
            bins: BinBoundaries::generate(config.histogram_bin_count, config.histogram_ceiling),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Split one CSV line into fields.
///
/// `""` inside a quoted field is a literal quote and commas inside quotes are not
/// delimiters. An unterminated quote keeps the rest of the line in the last field.
/// Each field is trimmed and loses one leading and one trailing quote, if present.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(clean_field).collect(),
        Ok(false) => vec![String::new()],
        Err(e) => {
            tracing::debug!("unreadable csv line, splitting on commas: {}", e);
            line.split(',').map(clean_field).collect()
        }
    }
}

fn clean_field(field: &str) -> String {
    let trimmed = field.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    trimmed.to_string()
}

/// Digits of the APC cell read as an integer. A cell without digits is absent, not zero.
pub fn parse_apc(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    // Overlong digit runs saturate instead of being dropped.
    Some(digits.parse::<u32>().unwrap_or(u32::MAX))
}

fn parse_number(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn optional(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

fn build_row(cols: &[String], bins: &BinBoundaries) -> Row {
    let col = |i: usize| cols.get(i).map(String::as_str).unwrap_or("");
    let apc_raw = col(APC).to_string();
    let apc = parse_apc(&apc_raw);
    Row {
        journal_name: col(JOURNAL).to_string(),
        field: col(FIELD).to_string(),
        publisher: col(PUBLISHER).to_string(),
        publisher_type: col(PUBLISHER_TYPE).to_string(),
        business_model: col(BUSINESS_MODEL).to_string(),
        apc_bucket: apc.and_then(|v| bins.bucket_for(v)),
        apc,
        apc_raw,
        country: col(COUNTRY).to_string(),
        institution: col(INSTITUTION).to_string(),
        institution_type: col(INSTITUTION_TYPE).to_string(),
        website: optional(col(WEBSITE)),
        scimago_rank: parse_number(col(SCIMAGO_RANK)),
        scimago_quartile: optional(col(SCIMAGO_QUARTILE)),
        h_index: parse_number(col(H_INDEX)),
        pci_partner: optional(col(PCI_PARTNER)),
    }
}

/// Parse raw CSV text into rows, distinct subfields and histogram boundaries.
pub fn parse(raw_text: &str, config: &ParseConfig) -> ParsedDataset {
    let start = Instant::now();
    let bins = BinBoundaries::generate(config.histogram_bin_count, config.histogram_ceiling);
    let mut rows = Vec::new();
    let mut fields = BTreeSet::new();
    let mut dropped = 0usize;

    for line in raw_text.split('\n').skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cols = split_csv_line(line);
        if cols.first().map(|j| j.is_empty()).unwrap_or(true) {
            dropped += 1;
            continue;
        }
        let row = build_row(&cols, &bins);
        if !row.field.is_empty() {
            fields.insert(row.field.clone());
        }
        rows.push(row);
    }

    tracing::debug!(
        rows = rows.len(),
        dropped,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "parsed journal csv"
    );

    ParsedDataset {
        rows,
        distinct_field_values: fields.into_iter().collect(),
        bins,
    }
}
