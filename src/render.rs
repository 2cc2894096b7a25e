//! Plain-text rendering of the table, the APC histogram and the category counts.

use std::fmt::Write;

use crate::filter::FilterState;
use crate::row::{ColumnSet, Row};
use crate::statistics::{count_label, CategoryCounts, HistogramBin};

/// Widest a table cell may get before it is truncated with "…"
pub const MAX_CELL_WIDTH: usize = 40;

/// Widest histogram bar
pub const MAX_BAR_WIDTH: usize = 50;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

/// Left-aligned table of `rows` over the visible `columns`, header first.
pub fn table(rows: &[&Row], columns: &ColumnSet) -> String {
    let columns: Vec<_> = columns.iter().copied().collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| truncate(&row.cell(*c), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.header().chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| pad(c.header(), *w))
        .collect();
    let _ = writeln!(out, "{}", header.join("  ").trim_end());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));
    for row in &cells {
        let line: Vec<String> = row.iter().zip(&widths).map(|(c, w)| pad(c, *w)).collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }
    out
}

/// One line per bin: range, bar scaled to the fullest bin, count.
/// The last bin is labelled open-ended.
pub fn histogram(bins: &[HistogramBin]) -> String {
    let max = bins.iter().map(|b| b.count).max().unwrap_or(0);
    let labels: Vec<String> = bins
        .iter()
        .enumerate()
        .map(|(i, b)| {
            if i + 1 == bins.len() {
                format!("{}+ €", b.lower_bound)
            } else {
                format!("{}-{} €", b.lower_bound, b.upper_bound)
            }
        })
        .collect();
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for (bin, label) in bins.iter().zip(&labels) {
        let bar = if max == 0 {
            0
        } else {
            // Non-empty bins always get at least one mark.
            (bin.count * MAX_BAR_WIDTH).div_ceil(max)
        };
        let _ = writeln!(
            out,
            "{}  {} {}",
            pad(label, label_width),
            pad(&"#".repeat(bar), MAX_BAR_WIDTH),
            bin.count
        );
    }
    out
}

/// Both button groups with their counts; the active selection is marked with `*`.
pub fn counts(counts: &CategoryCounts, filters: &FilterState) -> String {
    let mut out = String::new();

    let publishers: Vec<String> = counts
        .publisher_pairs()
        .into_iter()
        .map(|(f, n)| {
            let mark = if f == filters.publisher_type() { "*" } else { "" };
            format!("{}{}", mark, count_label(f.label(), n))
        })
        .collect();
    let _ = writeln!(out, "Publisher type: {}", publishers.join(" | "));

    let models: Vec<String> = counts
        .business_pairs()
        .into_iter()
        .map(|(f, n)| {
            let mark = if f == filters.business_model() { "*" } else { "" };
            format!("{}{}", mark, count_label(f.label(), n))
        })
        .collect();
    let _ = writeln!(out, "Business model: {}", models.join(" | "));
    let _ = writeln!(out, "APC: {}", filters.apc_range_label());
    out
}
