//! Build the all-fields journal list from the per-field lists.
//!
//! Each field list is cleaned (blank journals dropped, publisher names and types
//! normalized, duplicates merged) and then all of them are concatenated and
//! deduplicated once more. Two records are the same journal when their websites
//! match after normalization, or else when their normalized names match.

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::io::Write;

use crate::config::DataConfig;
use crate::parser::{parse_apc, CSV_HEADERS};
use crate::source::DatasetSource;
use crate::CompressionFormat;

const JOURNAL: usize = 0;
const FIELD: usize = 1;
const PUBLISHER: usize = 2;
const PUBLISHER_TYPE: usize = 3;
const WEBSITE: usize = 8;
const APC: usize = 9;
const SCIMAGO_RANK: usize = 10;
const H_INDEX: usize = 12;

/// Columns where duplicates keep the highest number.
const KEEP_HIGHEST: [usize; 3] = [APC, SCIMAGO_RANK, H_INDEX];

/// Above this many distinct fields a merged journal keeps only the list names.
const MAX_MERGED_FIELDS: usize = 3;

/// One journal in the positional CSV layout, all values kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalRecord {
    values: [String; 14],
}

impl JournalRecord {
    /// Build from positional values; missing trailing values are empty, extras are ignored.
    pub fn from_values<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        let mut record = Self::default();
        for (slot, value) in record.values.iter_mut().zip(values) {
            *slot = value.into();
        }
        record
    }

    /// Value under a CSV header name such as `"APC Euros"`; empty for unknown headers.
    pub fn value(&self, header: &str) -> &str {
        CSV_HEADERS
            .iter()
            .position(|h| *h == header)
            .map(|i| self.values[i].as_str())
            .unwrap_or("")
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn journal(&self) -> &str {
        &self.values[JOURNAL]
    }

    pub fn field(&self) -> &str {
        &self.values[FIELD]
    }

    pub fn website(&self) -> &str {
        &self.values[WEBSITE]
    }
}

/// Read a journal list with a header row. Columns are matched by header name, so
/// reordered files are accepted; columns outside the layout are dropped.
pub fn read_records(text: &str) -> Result<Vec<JournalRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let positions: Vec<Option<usize>> = CSV_HEADERS
        .iter()
        .map(|name| headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(JournalRecord::from_values(positions.iter().map(|p| {
            p.and_then(|i| row.get(i)).unwrap_or("").to_string()
        })));
    }
    Ok(records)
}

/// Write `records` with a header row, every value quoted.
pub fn write_records<W: Write>(records: &[JournalRecord], writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);
    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.write_record(record.values())?;
    }
    writer.flush()?;
    Ok(())
}

fn is_valid_value(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.eq_ignore_ascii_case("nan")
}

/// Lowercased website without scheme, `www.` or trailing slashes.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim().to_lowercase();
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url.as_str());
    let url = url.strip_prefix("www.").unwrap_or(url);
    url.trim_end_matches('/').to_string()
}

/// "general" becomes "Generalist"; other values are trimmed.
pub fn normalize_field(field: &str) -> String {
    let field = field.trim();
    if field.eq_ignore_ascii_case("general") {
        "Generalist".to_string()
    } else {
        field.to_string()
    }
}

/// Map the many spellings of large publishers onto one name.
pub fn normalize_publisher(name: &str) -> String {
    let lower = name.to_lowercase();
    let canonical = if lower.contains("springer")
        || lower == "nature"
        || lower.contains("nature publishing group")
        || lower.contains("nature research")
        || lower.contains("nature portfolio")
    {
        Some("Springer Nature")
    } else if lower.contains("wiley") {
        Some("John Wiley & Sons")
    } else if lower.contains("taylor") && lower.contains("francis") {
        Some("Taylor & Francis Group")
    } else if lower.contains("elsevier") {
        Some("Elsevier")
    } else if lower.contains("frontiers") {
        Some("Frontiers Media SA")
    } else if name.contains("BMC") || lower.contains("biomed central") {
        Some("Springer Nature (BioMed Central)")
    } else if name.contains("BMJ") {
        Some("BMJ Group")
    } else if name == "Cell" || lower.contains("cell press") {
        Some("Elsevier (Cell Press)")
    } else if name.contains("BioOne Complete") {
        Some("BioOne")
    } else if name.contains("OUP") {
        Some("Oxford University Press")
    } else if name.contains("APA") {
        Some("American Psychological Association")
    } else if name.contains("AMA") {
        Some("American Medical Association")
    } else if name.contains("AAAS") {
        Some("American Association for the Advancement of Science")
    } else if lower.contains("public library of science") || lower.contains("plos") {
        Some("Public Library of Science (PLoS)")
    } else if name.contains("PCI") {
        Some("Peer Community In")
    } else {
        None
    };
    match canonical {
        Some(canonical) => canonical.to_string(),
        None => name.replace(" Inc.", "").trim().to_string(),
    }
}

/// Collapse publisher type spellings. Unrecognized values are kept as written.
pub fn normalize_publisher_type(value: &str) -> String {
    let trimmed = value.trim();
    let lower = trimmed.to_lowercase();
    let has = |s: &str| lower.contains(s);
    if lower.is_empty() {
        String::new()
    } else if has("for-profit") && has("society") {
        "For-profit on behalf of a society".to_string()
    } else if has("for-profit") && has("behalf") {
        trimmed.to_string()
    } else if has("for-profit") {
        "For-profit".to_string()
    } else if has("university press") && has("society") {
        "University Press on behalf of a society".to_string()
    } else if has("university press") && has("behalf") {
        trimmed.to_string()
    } else if has("university press") {
        "University Press".to_string()
    } else if lower == "non-profit" {
        "Non-profit".to_string()
    } else {
        tracing::debug!("unknown publisher type: {:?}", trimmed);
        trimmed.to_string()
    }
}

fn numeric_value(column: usize, value: &str) -> Option<f64> {
    if column == APC {
        return parse_apc(value).map(f64::from);
    }
    value.trim().replace(',', ".").parse::<f64>().ok()
}

/// The highest number wins; the first one on ties. Without any number, the first value.
fn highest_number(column: usize, values: &[&str]) -> String {
    let mut best: Option<(f64, &str)> = None;
    for value in values {
        if let Some(n) = numeric_value(column, value) {
            if best.map(|(b, _)| n > b).unwrap_or(true) {
                best = Some((n, *value));
            }
        }
    }
    best.map(|(_, v)| v)
        .or_else(|| values.first().copied())
        .unwrap_or("")
        .to_string()
}

/// The longest text wins; the first one on ties.
fn longest_text(values: &[&str]) -> String {
    let mut best = "";
    for value in values {
        if value.chars().count() > best.chars().count() {
            best = *value;
        }
    }
    best.to_string()
}

/// Distinct fields, sorted and joined with "; ".
fn merged_fields(values: &[&str]) -> String {
    let mut fields: BTreeSet<String> = values.iter().map(|v| v.trim().to_string()).collect();
    if fields.len() > MAX_MERGED_FIELDS {
        fields = fields
            .iter()
            .filter_map(|f| f.split('-').next())
            .map(|f| f.trim().to_string())
            .collect();
    }
    fields.into_iter().collect::<Vec<_>>().join("; ")
}

/// Combine duplicate records into one.
pub fn merge_group(entries: &[JournalRecord], concat_fields: bool) -> JournalRecord {
    if let [single] = entries {
        return single.clone();
    }
    let mut merged = JournalRecord::default();
    for (column, slot) in merged.values.iter_mut().enumerate() {
        let values: Vec<&str> = entries
            .iter()
            .map(|e| e.values[column].as_str())
            .filter(|v| is_valid_value(v))
            .collect();
        *slot = match values.as_slice() {
            [] => String::new(),
            [only] => only.to_string(),
            _ if column == FIELD && concat_fields => merged_fields(&values),
            _ if KEEP_HIGHEST.contains(&column) => highest_number(column, &values),
            _ => longest_text(&values),
        };
    }
    if entries.iter().any(|e| e.values != merged.values) {
        tracing::debug!(
            journal = merged.journal(),
            duplicates = entries.len(),
            "merged conflicting duplicate records"
        );
    }
    merged
}

fn sort_by_journal(records: &mut [JournalRecord]) {
    records.sort_by(|a, b| a.journal().cmp(b.journal()));
}

/// Holds the compiled patterns used for journal name matching.
pub struct JournalMerger {
    parenthesized: Regex,
    non_alphanumeric: Regex,
}

impl JournalMerger {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parenthesized: Regex::new(r"\([^)]*\)")
                .map_err(|e| eyre!("Invalid name pattern: {}", e))?,
            non_alphanumeric: Regex::new(r"[^a-z0-9]+")
                .map_err(|e| eyre!("Invalid name pattern: {}", e))?,
        })
    }

    /// Lowercase alphanumeric words with parenthesized parts removed:
    /// "The EMBO Journal (EMBO J.)" and "the embo journal" are the same name.
    pub fn normalize_name(&self, name: &str) -> String {
        let without_parens = self.parenthesized.replace_all(name, " ");
        let lower = without_parens.to_lowercase();
        self.non_alphanumeric
            .replace_all(&lower, " ")
            .trim()
            .to_string()
    }

    /// Merge records that share a website or, failing that, a name.
    ///
    /// A merged journal takes the position of its first occurrence. With
    /// `concat_fields` the fields of all duplicates are combined instead of
    /// keeping the longest one.
    pub fn dedupe(
        &self,
        records: Vec<JournalRecord>,
        concat_fields: bool,
        source_name: &str,
    ) -> Vec<JournalRecord> {
        let mut by_url: HashMap<String, usize> = HashMap::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<Vec<JournalRecord>> = Vec::new();
        let (mut url_duplicates, mut name_duplicates) = (0usize, 0usize);

        for record in records {
            let name = self.normalize_name(record.journal());
            let url = normalize_url(record.website());

            let url_match = if url.is_empty() {
                None
            } else {
                by_url.get(&url).copied()
            };
            if let Some(group) = url_match {
                tracing::debug!(source = source_name, website = %url, "duplicate by website");
                url_duplicates += 1;
                groups[group].push(record);
                continue;
            }
            if let Some(&group) = by_name.get(&name) {
                tracing::debug!(source = source_name, journal = %name, "duplicate by name");
                name_duplicates += 1;
                groups[group].push(record);
                continue;
            }

            by_name.insert(name, groups.len());
            if !url.is_empty() {
                by_url.insert(url, groups.len());
            }
            groups.push(vec![record]);
        }

        if url_duplicates + name_duplicates > 0 {
            tracing::info!(
                source = source_name,
                by_website = url_duplicates,
                by_name = name_duplicates,
                "merged duplicate journals"
            );
        }
        groups
            .iter()
            .map(|group| merge_group(group, concat_fields))
            .collect()
    }

    /// Clean one field list: drop blank journals, normalize, dedupe and sort.
    pub fn prepare_source(
        &self,
        records: Vec<JournalRecord>,
        source_name: &str,
    ) -> Vec<JournalRecord> {
        let before = records.len();
        let mut records: Vec<JournalRecord> = records
            .into_iter()
            .filter(|r| !r.journal().trim().is_empty())
            .map(|mut r| {
                r.values[JOURNAL] = r.values[JOURNAL].trim().to_string();
                r.values[FIELD] = normalize_field(&r.values[FIELD]);
                r.values[PUBLISHER] = normalize_publisher(&r.values[PUBLISHER]);
                r.values[PUBLISHER_TYPE] = normalize_publisher_type(&r.values[PUBLISHER_TYPE]);
                r
            })
            .collect();
        let removed = before - records.len();
        if removed > 0 {
            tracing::info!(source = source_name, removed, "dropped rows without a journal name");
        }
        records = self.dedupe(records, false, source_name);
        sort_by_journal(&mut records);
        records
    }

    /// Field value as it appears in the all-fields list: the list name, or
    /// "list name - field" when the journal's own field differs from it.
    pub fn prefixed_field(&self, field: &str, list_label: &str) -> String {
        if !is_valid_value(field) {
            return String::new();
        }
        let field = field.trim();
        if self.normalize_name(field) == self.normalize_name(list_label) {
            list_label.to_string()
        } else {
            format!("{} - {}", list_label, field)
        }
    }

    /// Prepare every `(list label, records)` pair and merge them into one sorted list.
    pub fn merge_sources(&self, sources: Vec<(String, Vec<JournalRecord>)>) -> Vec<JournalRecord> {
        let mut all = Vec::new();
        for (label, records) in sources {
            for mut record in self.prepare_source(records, &label) {
                record.values[FIELD] = self.prefixed_field(&record.values[FIELD], &label);
                all.push(record);
            }
        }
        let mut merged = self.dedupe(all, true, "all fields");
        sort_by_journal(&mut merged);
        merged
    }
}

/// Read every catalog source except the all-fields one and merge them.
pub fn build_from_catalog(
    data: &DataConfig,
    compression: Option<CompressionFormat>,
) -> Result<Vec<JournalRecord>> {
    let merger = JournalMerger::new()?;
    let mut sources = Vec::new();
    for entry in data.sources.iter().filter(|s| s.id != data.all_fields_source) {
        let source = DatasetSource::resolve(&entry.id, data);
        let text = source
            .read(compression)
            .wrap_err_with(|| format!("Could not read the \"{}\" dataset", entry.label))?;
        let records = read_records(&text)
            .wrap_err_with(|| format!("Malformed CSV in the \"{}\" dataset", entry.label))?;
        tracing::info!(source = %entry.id, rows = records.len(), "read field list");
        sources.push((entry.label.clone(), records));
    }
    if sources.is_empty() {
        return Err(eyre!("No field-specific sources are configured"));
    }
    Ok(merger.merge_sources(sources))
}
