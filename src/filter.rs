//! Composable row predicates: free text, category buttons, exact column values and the APC range.
//!
//! `FilterState` is a value: every `with_*` call returns the updated state and the caller
//! swaps it in, so a half-applied update is never observable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::row::{Column, ColumnSet, Row};

/// How the "OA" business model filter matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OaMatching {
    /// "OA" also matches "OA diamond" and any other "OA…" value
    #[default]
    Prefix,
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublisherTypeFilter {
    #[default]
    All,
    ForProfit,
    NonProfit,
    UniversityPress,
}

impl PublisherTypeFilter {
    /// Selectable categories in button order.
    pub const CHOICES: [PublisherTypeFilter; 3] = [
        PublisherTypeFilter::ForProfit,
        PublisherTypeFilter::NonProfit,
        PublisherTypeFilter::UniversityPress,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PublisherTypeFilter::All => "All Publishers",
            PublisherTypeFilter::ForProfit => "For-profit",
            PublisherTypeFilter::NonProfit => "Non-profit",
            PublisherTypeFilter::UniversityPress => "University Press",
        }
    }

    /// Column search term that selects this category, `None` for "all".
    pub fn search_term(self) -> Option<&'static str> {
        match self {
            PublisherTypeFilter::All => None,
            other => Some(other.label()),
        }
    }

    /// Recover the category from a saved column search term.
    pub fn from_search_term(term: &str) -> Self {
        Self::CHOICES
            .into_iter()
            .find(|choice| term.starts_with(choice.label()))
            .unwrap_or_default()
    }

    /// Filter predicate: prefix match, so society-run variants belong to their base type.
    pub fn matches(self, publisher_type: &str) -> bool {
        match self.search_term() {
            None => true,
            Some(prefix) => publisher_type.starts_with(prefix),
        }
    }

    /// Count predicate. "Non-profit" counts only the exact value.
    pub fn counts(self, publisher_type: &str) -> bool {
        match self {
            PublisherTypeFilter::NonProfit => publisher_type == self.label(),
            other => other.matches(publisher_type),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BusinessModelFilter {
    #[default]
    All,
    Subscription,
    Hybrid,
    Oa,
    OaDiamond,
}

impl BusinessModelFilter {
    /// Selectable categories in button order.
    pub const CHOICES: [BusinessModelFilter; 4] = [
        BusinessModelFilter::OaDiamond,
        BusinessModelFilter::Oa,
        BusinessModelFilter::Hybrid,
        BusinessModelFilter::Subscription,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BusinessModelFilter::All => "All Business Models",
            BusinessModelFilter::Subscription => "Subscription",
            BusinessModelFilter::Hybrid => "Hybrid",
            BusinessModelFilter::Oa => "OA",
            BusinessModelFilter::OaDiamond => "OA diamond",
        }
    }

    pub fn search_term(self) -> Option<&'static str> {
        match self {
            BusinessModelFilter::All => None,
            other => Some(other.label()),
        }
    }

    /// Recover the category from a saved column search term (exact labels only).
    pub fn from_search_term(term: &str) -> Self {
        Self::CHOICES
            .into_iter()
            .find(|choice| term == choice.label())
            .unwrap_or_default()
    }

    /// "OA diamond", "Hybrid" and "Subscription" match exactly; "OA" follows `oa`.
    pub fn matches(self, business_model: &str, oa: OaMatching) -> bool {
        match self {
            BusinessModelFilter::All => true,
            BusinessModelFilter::Oa if oa == OaMatching::Prefix => {
                business_model.starts_with(self.label())
            }
            other => business_model == other.label(),
        }
    }
}

/// A category button selection, for callers that handle both dimensions uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    PublisherType(PublisherTypeFilter),
    BusinessModel(BusinessModelFilter),
}

/// The active filter predicates for one loaded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    text_query: String,
    tokens: Vec<String>,
    publisher_type: PublisherTypeFilter,
    business_model: BusinessModelFilter,
    value_filters: BTreeMap<Column, String>,
    apc_min: u32,
    apc_max: u32,
    apc_ceiling: u32,
    oa_matching: OaMatching,
    search_scope: ColumnSet,
}

impl FilterState {
    /// Unfiltered state whose APC range spans `[0, apc_ceiling]`.
    pub fn new(apc_ceiling: u32) -> Self {
        Self {
            text_query: String::new(),
            tokens: Vec::new(),
            publisher_type: PublisherTypeFilter::All,
            business_model: BusinessModelFilter::All,
            value_filters: BTreeMap::new(),
            apc_min: 0,
            apc_max: apc_ceiling,
            apc_ceiling,
            oa_matching: OaMatching::default(),
            search_scope: ColumnSet::all(),
        }
    }

    pub fn with_oa_matching(mut self, oa_matching: OaMatching) -> Self {
        self.oa_matching = oa_matching;
        self
    }

    /// Restrict free-text search to these columns (the visible ones).
    pub fn with_search_scope(mut self, scope: ColumnSet) -> Self {
        self.search_scope = scope;
        self
    }

    pub fn with_text_query(mut self, query: &str) -> Self {
        self.tokens = query.split_whitespace().map(str::to_lowercase).collect();
        self.text_query = query.to_string();
        self
    }

    pub fn with_publisher_type(mut self, filter: PublisherTypeFilter) -> Self {
        self.publisher_type = filter;
        self
    }

    pub fn with_business_model(mut self, filter: BusinessModelFilter) -> Self {
        self.business_model = filter;
        self
    }

    pub fn with_category_filter(self, filter: CategoryFilter) -> Self {
        match filter {
            CategoryFilter::PublisherType(f) => self.with_publisher_type(f),
            CategoryFilter::BusinessModel(f) => self.with_business_model(f),
        }
    }

    /// Exact-match subfield filter; `None` or an empty string clears it.
    pub fn with_field_filter(self, value: Option<&str>) -> Self {
        self.with_value_filter(Column::Subfield, value)
    }

    /// Exact-match filter on one of `Column::VALUE_FILTERABLE`; other columns are ignored.
    pub fn with_value_filter(mut self, column: Column, value: Option<&str>) -> Self {
        if !Column::VALUE_FILTERABLE.contains(&column) {
            tracing::debug!(column = column.header(), "column does not take a value filter");
            return self;
        }
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => {
                self.value_filters.insert(column, v.to_string());
            }
            None => {
                self.value_filters.remove(&column);
            }
        }
        self
    }

    /// Move the lower bound; a bound above `apc_max` becomes `apc_max`.
    pub fn with_apc_min(mut self, min: u32) -> Self {
        self.apc_min = min.min(self.apc_ceiling).min(self.apc_max);
        self
    }

    /// Move the upper bound; a bound below `apc_min` becomes `apc_min`.
    pub fn with_apc_max(mut self, max: u32) -> Self {
        self.apc_max = max.min(self.apc_ceiling).max(self.apc_min);
        self
    }

    /// Set both bounds. An inverted pair collapses onto the upper bound.
    pub fn with_apc_range(mut self, min: u32, max: u32) -> Self {
        self.apc_max = max.min(self.apc_ceiling);
        self.apc_min = min.min(self.apc_max);
        self
    }

    pub fn with_full_apc_range(mut self) -> Self {
        self.apc_min = 0;
        self.apc_max = self.apc_ceiling;
        self
    }

    /// Drop the subfield filter and widen the APC range, keeping everything else.
    pub fn cleared_field_and_range(self) -> Self {
        self.with_field_filter(None).with_full_apc_range()
    }

    /// Drop every predicate, keeping the ceiling, OA matching and search scope.
    pub fn cleared(self) -> Self {
        Self::new(self.apc_ceiling)
            .with_oa_matching(self.oa_matching)
            .with_search_scope(self.search_scope)
    }

    pub fn text_query(&self) -> &str {
        &self.text_query
    }

    pub fn publisher_type(&self) -> PublisherTypeFilter {
        self.publisher_type
    }

    pub fn business_model(&self) -> BusinessModelFilter {
        self.business_model
    }

    pub fn field_filter(&self) -> Option<&str> {
        self.value_filter(Column::Subfield)
    }

    pub fn value_filter(&self, column: Column) -> Option<&str> {
        self.value_filters.get(&column).map(String::as_str)
    }

    pub fn value_filters(&self) -> &BTreeMap<Column, String> {
        &self.value_filters
    }

    pub fn apc_min(&self) -> u32 {
        self.apc_min
    }

    pub fn apc_max(&self) -> u32 {
        self.apc_max
    }

    pub fn apc_ceiling(&self) -> u32 {
        self.apc_ceiling
    }

    pub fn oa_matching(&self) -> OaMatching {
        self.oa_matching
    }

    pub fn search_scope(&self) -> &ColumnSet {
        &self.search_scope
    }

    /// True when the APC range covers `[0, ceiling]` and so filters nothing.
    pub fn is_full_apc_range(&self) -> bool {
        self.apc_min == 0 && self.apc_max >= self.apc_ceiling
    }

    /// Human-readable APC range, e.g. "All APCs" or "≥ 1000 €".
    pub fn apc_range_label(&self) -> String {
        if self.is_full_apc_range() {
            "All APCs".to_string()
        } else if self.apc_min == 0 {
            format!("≤ {} €", self.apc_max)
        } else if self.apc_max >= self.apc_ceiling {
            format!("≥ {} €", self.apc_min)
        } else {
            format!("{} € - {} €", self.apc_min, self.apc_max)
        }
    }

    /// Every query token occurs somewhere in the searchable columns (case-insensitive).
    pub fn passes_text(&self, row: &Row) -> bool {
        if self.tokens.is_empty() {
            return true;
        }
        let haystack = row.search_text(self.search_scope.iter());
        self.tokens.iter().all(|token| haystack.contains(token))
    }

    pub fn passes_publisher_type(&self, row: &Row) -> bool {
        self.publisher_type.matches(&row.publisher_type)
    }

    pub fn passes_business_model(&self, row: &Row) -> bool {
        self.business_model
            .matches(&row.business_model, self.oa_matching)
    }

    pub fn passes_value_filters(&self, row: &Row) -> bool {
        self.value_filters
            .iter()
            .all(|(column, value)| row.cell(*column) == value.as_str())
    }

    /// Rows without an APC pass only while the range is full. At the ceiling the
    /// upper end is open, so APCs above the ceiling stay in range.
    pub fn passes_apc(&self, row: &Row) -> bool {
        if self.is_full_apc_range() {
            return true;
        }
        let Some(apc) = row.apc else {
            return false;
        };
        if self.apc_max >= self.apc_ceiling {
            apc >= self.apc_min
        } else {
            apc >= self.apc_min && apc <= self.apc_max
        }
    }

    /// Predicates shared by both category count passes: text, column values and APC.
    pub fn passes_non_category(&self, row: &Row) -> bool {
        self.passes_apc(row) && self.passes_value_filters(row) && self.passes_text(row)
    }

    pub fn passes_all(&self, row: &Row) -> bool {
        self.passes_publisher_type(row)
            && self.passes_business_model(row)
            && self.passes_non_category(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, ParseConfig};

    fn row(publisher_type: &str, business_model: &str, apc: &str) -> Row {
        let csv = format!(
            "header\nJournal of Tests,Cancer,Pub,{publisher_type},{business_model},Inst,University,France,,\"{apc}\"\n"
        );
        parse(&csv, &ParseConfig::default()).rows.remove(0)
    }

    #[test]
    fn publisher_type_prefix_matching() {
        let society = row("For-profit Society-Run", "Hybrid", "");
        assert!(PublisherTypeFilter::ForProfit.matches(&society.publisher_type));
        assert!(!PublisherTypeFilter::NonProfit.matches(&society.publisher_type));
        assert!(PublisherTypeFilter::All.matches(&society.publisher_type));
    }

    #[test]
    fn non_profit_counts_exact_only() {
        assert!(PublisherTypeFilter::NonProfit.matches("Non-profit Society-Run"));
        assert!(!PublisherTypeFilter::NonProfit.counts("Non-profit Society-Run"));
        assert!(PublisherTypeFilter::NonProfit.counts("Non-profit"));
        assert!(PublisherTypeFilter::UniversityPress.counts("University Press Society-Run"));
    }

    #[test]
    fn oa_prefix_absorbs_diamond_but_not_the_reverse() {
        let prefix = OaMatching::Prefix;
        assert!(BusinessModelFilter::Oa.matches("OA diamond", prefix));
        assert!(BusinessModelFilter::Oa.matches("OA", prefix));
        assert!(!BusinessModelFilter::OaDiamond.matches("OA", prefix));
        assert!(BusinessModelFilter::OaDiamond.matches("OA diamond", prefix));
        assert!(!BusinessModelFilter::Oa.matches("OA diamond", OaMatching::Exact));
        assert!(!BusinessModelFilter::Hybrid.matches("Hybrid OA", prefix));
    }

    #[test]
    fn search_term_round_trip() {
        for choice in PublisherTypeFilter::CHOICES {
            let term = choice.search_term().unwrap();
            assert_eq!(PublisherTypeFilter::from_search_term(term), choice);
        }
        for choice in BusinessModelFilter::CHOICES {
            let term = choice.search_term().unwrap();
            assert_eq!(BusinessModelFilter::from_search_term(term), choice);
        }
        assert_eq!(
            BusinessModelFilter::from_search_term("OA gold"),
            BusinessModelFilter::All
        );
    }

    #[test]
    fn text_tokens_must_all_match() {
        let mut r = row("Non-profit", "OA", "");
        r.journal_name = "Cancer Research".to_string();
        r.business_model = "Open Access".to_string();
        let state = FilterState::new(5000).with_text_query("cancer open");
        assert!(state.passes_text(&r));
        let state = state.with_text_query("OPEN   cancer");
        assert!(state.passes_text(&r));
        let state = state.with_text_query("cancer closed");
        assert!(!state.passes_text(&r));
    }

    #[test]
    fn text_search_only_covers_scope() {
        let r = row("Non-profit", "OA", "");
        let state = FilterState::new(5000).with_text_query("france");
        assert!(state.passes_text(&r));
        let state = state.with_search_scope(ColumnSet::default());
        assert!(!state.passes_text(&r));
    }

    #[test]
    fn apc_min_above_max_clamps() {
        let state = FilterState::new(5000).with_apc_max(2000).with_apc_min(3000);
        assert_eq!(state.apc_min(), 2000);
        assert_eq!(state.apc_max(), 2000);

        let state = FilterState::new(5000).with_apc_min(3000).with_apc_max(1000);
        assert_eq!(state.apc_min(), 3000);
        assert_eq!(state.apc_max(), 3000);

        let state = FilterState::new(5000).with_apc_range(4000, 1000);
        assert_eq!((state.apc_min(), state.apc_max()), (1000, 1000));

        let state = FilterState::new(5000).with_apc_max(9000);
        assert_eq!(state.apc_max(), 5000);
    }

    #[test]
    fn apc_range_at_ceiling_is_open_ended() {
        let expensive = row("For-profit", "OA", "7,500");
        let unknown = row("For-profit", "OA", "");
        let state = FilterState::new(5000).with_apc_min(1000);
        assert!(state.passes_apc(&expensive));
        assert!(!state.passes_apc(&unknown));

        let state = FilterState::new(5000).with_apc_range(1000, 4000);
        assert!(!state.passes_apc(&expensive));
    }

    #[test]
    fn unknown_apc_passes_full_range() {
        let unknown = row("For-profit", "OA", "n/a");
        assert!(FilterState::new(5000).passes_apc(&unknown));
        assert!(!FilterState::new(5000).with_apc_max(4999).passes_apc(&unknown));
    }

    #[test]
    fn value_filters_are_exact() {
        let r = row("Non-profit", "OA", "");
        let state = FilterState::new(5000).with_field_filter(Some("Cancer"));
        assert!(state.passes_value_filters(&r));
        let state = state.with_field_filter(Some("Canc"));
        assert!(!state.passes_value_filters(&r));
        let state = state
            .with_field_filter(Some(""))
            .with_value_filter(Column::Country, Some("France"));
        assert_eq!(state.field_filter(), None);
        assert!(state.passes_value_filters(&r));
        let ignored = state.clone().with_value_filter(Column::Journal, Some("x"));
        assert_eq!(ignored, state);
    }

    #[test]
    fn apc_labels() {
        let state = FilterState::new(5000);
        assert_eq!(state.apc_range_label(), "All APCs");
        assert_eq!(state.clone().with_apc_max(2000).apc_range_label(), "≤ 2000 €");
        assert_eq!(state.clone().with_apc_min(500).apc_range_label(), "≥ 500 €");
        assert_eq!(
            state.with_apc_range(500, 2000).apc_range_label(),
            "500 € - 2000 €"
        );
    }

    #[test]
    fn cleared_keeps_settings() {
        let state = FilterState::new(10000)
            .with_oa_matching(OaMatching::Exact)
            .with_text_query("x")
            .with_business_model(BusinessModelFilter::Hybrid)
            .with_apc_max(3000)
            .cleared();
        assert_eq!(state.text_query(), "");
        assert_eq!(state.business_model(), BusinessModelFilter::All);
        assert_eq!(state.apc_max(), 10000);
        assert_eq!(state.oa_matching(), OaMatching::Exact);
    }
}
