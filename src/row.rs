//! Journal rows and the fixed column layout shared by the parser, the query engine and renderers.

use std::borrow::Cow;
use std::collections::BTreeSet;

/// Display columns, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Journal,
    Subfield,
    Publisher,
    PublisherType,
    BusinessModel,
    Apc,
    Country,
    Institution,
    InstitutionType,
    Website,
    ScimagoRank,
    ScimagoQuartile,
    HIndex,
    PciPartner,
}

impl Column {
    pub const ALL: [Column; 14] = [
        Column::Journal,
        Column::Subfield,
        Column::Publisher,
        Column::PublisherType,
        Column::BusinessModel,
        Column::Apc,
        Column::Country,
        Column::Institution,
        Column::InstitutionType,
        Column::Website,
        Column::ScimagoRank,
        Column::ScimagoQuartile,
        Column::HIndex,
        Column::PciPartner,
    ];

    /// Columns that can never be hidden.
    pub const MANDATORY: [Column; 3] = [
        Column::Journal,
        Column::PublisherType,
        Column::BusinessModel,
    ];

    /// Columns shown when nothing else was requested or saved.
    pub const DEFAULT_VISIBLE: [Column; 6] = [
        Column::Journal,
        Column::Subfield,
        Column::Publisher,
        Column::PublisherType,
        Column::BusinessModel,
        Column::Apc,
    ];

    /// Columns that take an exact-match value filter besides the free-text search.
    pub const VALUE_FILTERABLE: [Column; 4] = [
        Column::Subfield,
        Column::Country,
        Column::InstitutionType,
        Column::PciPartner,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn header(self) -> &'static str {
        match self {
            Column::Journal => "Journal",
            Column::Subfield => "Subfield",
            Column::Publisher => "Publisher",
            Column::PublisherType => "Publisher Type",
            Column::BusinessModel => "Business Model",
            Column::Apc => "APC (€)",
            Column::Country => "Country (Publisher)",
            Column::Institution => "Institution",
            Column::InstitutionType => "Institution Type",
            Column::Website => "Website",
            Column::ScimagoRank => "Scimago Rank",
            Column::ScimagoQuartile => "Scimago Quartile",
            Column::HIndex => "H Index",
            Column::PciPartner => "PCI Partner",
        }
    }

    /// Parse a header name (case-insensitive) or a 0-based column index.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(index) = s.parse::<usize>() {
            return Self::from_index(index);
        }
        let wanted = s.to_lowercase();
        Self::ALL.iter().copied().find(|c| {
            let header = c.header().to_lowercase();
            header == wanted
                || header
                    .split(" (")
                    .next()
                    .map(|short| short == wanted)
                    .unwrap_or(false)
        })
    }

    pub fn is_mandatory(self) -> bool {
        Self::MANDATORY.contains(&self)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Column::Apc | Column::ScimagoRank | Column::HIndex)
    }

    /// Columns that only exist in the Scimago-enriched CSV layout.
    pub fn is_scimago(self) -> bool {
        matches!(
            self,
            Column::ScimagoRank | Column::ScimagoQuartile | Column::HIndex
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            Column::Journal => {
                "The name of the journal. Official journal names might differ from the name on the list."
            }
            Column::Subfield => {
                "The scientific field of the journal, based on its aims and scope."
            }
            Column::Publisher => {
                "The company or organization that publishes the journal. Societies or institutions may delegate publishing to a for-profit company, which is then reported here."
            }
            Column::PublisherType => {
                "For-profit, Non-profit or University Press, optionally associated with a society or with a university or government institution."
            }
            Column::BusinessModel => {
                "Subscription, Hybrid, OA (open access, usually with an APC) or OA diamond (free for readers and authors)."
            }
            Column::Apc => {
                "Article Processing Charges in euros: the average APC of the last 3 years from the OpenAPC database."
            }
            Column::Country => "The country where the publisher is based.",
            Column::Institution => {
                "The institution associated with the journal, typically the scientific society in charge of it."
            }
            Column::InstitutionType => {
                "The type of institution (e.g., university, research institute)."
            }
            Column::Website => "Link to the journal's website.",
            Column::ScimagoRank => {
                "SCImago Journal Rank (SJR): weighted citations over three years divided by citable publications. Above 1.0 means above-average citation potential."
            }
            Column::ScimagoQuartile => {
                "Q1 (best) to Q4 (lowest), based on the Scimago Journal Rank within its field."
            }
            Column::HIndex => {
                "A journal with an H-index of h has published h papers that have each been cited at least h times."
            }
            Column::PciPartner => "Whether the journal is a Peer Community In partner.",
        }
    }
}

/// One journal record.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub journal_name: String,
    pub field: String,
    pub publisher: String,
    pub publisher_type: String,
    pub business_model: String,
    /// APC cell exactly as it appeared in the source, e.g. `"1,200"`.
    pub apc_raw: String,
    pub apc: Option<u32>,
    /// Histogram bin of `apc`, assigned once at parse time.
    pub apc_bucket: Option<usize>,
    pub country: String,
    pub institution: String,
    pub institution_type: String,
    pub website: Option<String>,
    pub scimago_rank: Option<f64>,
    pub scimago_quartile: Option<String>,
    pub h_index: Option<f64>,
    pub pci_partner: Option<String>,
}

fn format_number(value: Option<f64>) -> Cow<'static, str> {
    match value {
        Some(v) => Cow::Owned(v.to_string()),
        None => Cow::Borrowed(""),
    }
}

impl Row {
    /// Display text of a column.
    pub fn cell(&self, column: Column) -> Cow<'_, str> {
        match column {
            Column::Journal => Cow::Borrowed(&self.journal_name),
            Column::Subfield => Cow::Borrowed(&self.field),
            Column::Publisher => Cow::Borrowed(&self.publisher),
            Column::PublisherType => Cow::Borrowed(&self.publisher_type),
            Column::BusinessModel => Cow::Borrowed(&self.business_model),
            Column::Apc => Cow::Borrowed(&self.apc_raw),
            Column::Country => Cow::Borrowed(&self.country),
            Column::Institution => Cow::Borrowed(&self.institution),
            Column::InstitutionType => Cow::Borrowed(&self.institution_type),
            Column::Website => Cow::Borrowed(self.website.as_deref().unwrap_or("")),
            Column::ScimagoRank => format_number(self.scimago_rank),
            Column::ScimagoQuartile => {
                Cow::Borrowed(self.scimago_quartile.as_deref().unwrap_or(""))
            }
            Column::HIndex => format_number(self.h_index),
            Column::PciPartner => Cow::Borrowed(self.pci_partner.as_deref().unwrap_or("")),
        }
    }

    /// Numeric value of a column, for the columns that have one.
    pub fn numeric(&self, column: Column) -> Option<f64> {
        match column {
            Column::Apc => self.apc.map(f64::from),
            Column::ScimagoRank => self.scimago_rank,
            Column::HIndex => self.h_index,
            _ => None,
        }
    }

    /// Lowercased text of the given columns, joined by spaces. Free-text search runs against this.
    pub fn search_text<'a>(&self, columns: impl IntoIterator<Item = &'a Column>) -> String {
        let mut text = String::new();
        for column in columns {
            let cell = self.cell(*column);
            if cell.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&cell.to_lowercase());
        }
        text
    }
}

/// The set of visible columns. Mandatory columns are always members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    columns: BTreeSet<Column>,
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self::from_columns(Column::DEFAULT_VISIBLE)
    }
}

impl ColumnSet {
    pub fn all() -> Self {
        Self::from_columns(Column::ALL)
    }

    pub fn from_columns(columns: impl IntoIterator<Item = Column>) -> Self {
        let mut columns: BTreeSet<Column> = columns.into_iter().collect();
        columns.extend(Column::MANDATORY);
        Self { columns }
    }

    pub fn contains(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Show or hide a column. Hiding a mandatory column is a no-op.
    pub fn set_visible(&mut self, column: Column, visible: bool) {
        if visible {
            self.columns.insert(column);
        } else if !column.is_mandatory() {
            self.columns.remove(&column);
        }
    }

    /// Hide every column that the configured CSV layout does not provide.
    pub fn without_scimago(mut self) -> Self {
        self.columns.retain(|c| !c.is_scimago());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
