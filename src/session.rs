//! The query surface a front end drives: load a dataset, adjust filters, read the derived views.
//!
//! A session owns exactly one dataset and one `FilterState`. Loads are tagged with a
//! `LoadTicket`; a response whose ticket is not the latest one is dropped, so a slow
//! fetch can never overwrite a newer selection.

use color_eyre::Result;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Instant;

use crate::config::AppConfig;
use crate::filter::{BusinessModelFilter, CategoryFilter, FilterState};
use crate::parser::{self, ParseConfig, ParsedDataset};
use crate::preferences::PreferenceSnapshot;
use crate::query::{self, SortOrder};
use crate::row::{Column, ColumnSet, Row};
use crate::source::DatasetSource;
use crate::statistics::{self, CategoryCounts, HistogramBin};
use crate::CompressionFormat;

/// Identifies one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// A finished fetch+parse, delivered back to the session.
#[derive(Debug)]
pub struct LoadResponse {
    pub ticket: LoadTicket,
    pub source: DatasetSource,
    pub result: Result<ParsedDataset>,
}

/// Fetch and parse a source. Runs on whichever thread calls it.
pub fn fetch_dataset(
    source: &DatasetSource,
    parse_config: &ParseConfig,
    compression: Option<CompressionFormat>,
) -> Result<ParsedDataset> {
    let start = Instant::now();
    let text = source.read(compression)?;
    let dataset = parser::parse(&text, parse_config);
    tracing::info!(
        source = %source.location.display(),
        rows = dataset.rows.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "loaded dataset"
    );
    Ok(dataset)
}

pub struct Session {
    config: AppConfig,
    parse_config: ParseConfig,
    compression: Option<CompressionFormat>,
    source: Option<DatasetSource>,
    dataset: ParsedDataset,
    filters: FilterState,
    columns: ColumnSet,
    sort: Option<SortOrder>,
    generation: u64,
    status: Option<String>,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        let parse_config = ParseConfig::from(&config.histogram);
        let filters = FilterState::new(config.histogram.ceiling)
            .with_oa_matching(config.filters.oa_matching);
        let mut session = Self {
            dataset: ParsedDataset::empty(&parse_config),
            parse_config,
            compression: None,
            source: None,
            filters,
            columns: ColumnSet::default(),
            sort: None,
            generation: 0,
            status: None,
            config,
        };
        session.set_columns(ColumnSet::default());
        session
    }

    /// Force a decompression format instead of detecting it from the extension.
    pub fn with_compression(mut self, compression: Option<CompressionFormat>) -> Self {
        self.compression = compression;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Resolve a catalog id, path or URL; `None` picks the configured default source.
    pub fn resolve(&self, input: Option<&str>) -> DatasetSource {
        let input = input.unwrap_or(&self.config.data.default_source);
        DatasetSource::resolve(input, &self.config.data)
    }

    /// Start a load of `source`, superseding any load still in flight.
    pub fn begin_load(&mut self, source: &DatasetSource) -> LoadTicket {
        self.generation += 1;
        tracing::debug!(
            ticket = self.generation,
            source = %source.location.display(),
            "loading dataset"
        );
        LoadTicket(self.generation)
    }

    /// Whether `ticket` belongs to the most recent load.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Install the result of a load. Returns `false` (and changes nothing) for a stale ticket.
    ///
    /// A failed fetch installs an empty dataset and sets the status message.
    pub fn complete_load(&mut self, response: LoadResponse) -> bool {
        if !self.is_current(response.ticket) {
            tracing::debug!(
                ticket = response.ticket.0,
                current = self.generation,
                "dropping stale dataset response"
            );
            return false;
        }

        let switching = self
            .source
            .as_ref()
            .map(|previous| previous != &response.source)
            .unwrap_or(false);
        if switching {
            let scope = self.config.filters.reset_scope_on_dataset_switch;
            self.filters = query::reset_for_dataset_switch(self.filters.clone(), scope);
        }

        match response.result {
            Ok(dataset) => {
                self.dataset = dataset;
                self.status = None;
            }
            Err(e) => {
                tracing::warn!(
                    "Could not load {}: {}",
                    response.source.location.display(),
                    e
                );
                self.dataset = ParsedDataset::empty(&self.parse_config);
                self.status = Some(format!(
                    "Could not load the \"{}\" dataset: {}",
                    response.source.label, e
                ));
            }
        }
        self.source = Some(response.source);
        self.reconcile_business_model();
        true
    }

    /// Fetch, parse and install `source` on the calling thread.
    pub fn load_dataset(&mut self, source: DatasetSource) -> &ParsedDataset {
        let ticket = self.begin_load(&source);
        let result = fetch_dataset(&source, &self.parse_config, self.compression);
        self.complete_load(LoadResponse {
            ticket,
            source,
            result,
        });
        &self.dataset
    }

    /// Fetch and parse `source` on a worker thread. The response arrives on `tx` and must be
    /// handed to `complete_load`.
    pub fn spawn_load(&mut self, source: DatasetSource, tx: Sender<LoadResponse>) -> LoadTicket {
        let ticket = self.begin_load(&source);
        let parse_config = self.parse_config;
        let compression = self.compression;
        thread::spawn(move || {
            let result = fetch_dataset(&source, &parse_config, compression);
            if tx
                .send(LoadResponse {
                    ticket,
                    source,
                    result,
                })
                .is_err()
            {
                tracing::debug!("load finished after the session went away");
            }
        });
        ticket
    }

    pub fn set_text_query(&mut self, query: &str) {
        self.update_filters(|f| f.with_text_query(query));
    }

    pub fn set_category_filter(&mut self, filter: CategoryFilter) {
        self.update_filters(|f| f.with_category_filter(filter));
    }

    pub fn set_field_filter(&mut self, value: Option<&str>) {
        self.update_filters(|f| f.with_field_filter(value));
    }

    pub fn set_column_filter(&mut self, column: Column, value: Option<&str>) {
        self.update_filters(|f| f.with_value_filter(column, value));
    }

    pub fn set_apc_range(&mut self, min: u32, max: u32) {
        self.update_filters(|f| f.with_apc_range(min, max));
    }

    pub fn set_apc_min(&mut self, min: u32) {
        self.update_filters(|f| f.with_apc_min(min));
    }

    pub fn set_apc_max(&mut self, max: u32) {
        self.update_filters(|f| f.with_apc_max(max));
    }

    pub fn set_sort(&mut self, sort: Option<SortOrder>) {
        self.sort = sort;
    }

    pub fn set_column_visible(&mut self, column: Column, visible: bool) {
        let mut columns = self.columns.clone();
        columns.set_visible(column, visible);
        self.set_columns(columns);
    }

    /// Show exactly `columns` (plus the mandatory ones). Hidden columns are not searched.
    pub fn set_columns(&mut self, columns: ColumnSet) {
        let columns = if self.config.columns.scimago_columns {
            columns
        } else {
            columns.without_scimago()
        };
        self.columns = columns.clone();
        self.update_filters(|f| f.with_search_scope(columns));
    }

    pub fn reset_columns(&mut self) {
        self.set_columns(ColumnSet::default());
    }

    fn update_filters(&mut self, update: impl FnOnce(FilterState) -> FilterState) {
        self.filters = update(self.filters.clone());
        self.reconcile_business_model();
    }

    /// Drop a business-model selection that no longer matches any row.
    /// Nothing is dropped before the first load completes.
    fn reconcile_business_model(&mut self) {
        if self.source.is_none() {
            return;
        }
        let selected = self.filters.business_model();
        let counts = CategoryCounts::compute(&self.dataset.rows, &self.filters);
        if counts.business_model_needs_reset(selected) {
            tracing::debug!(
                business_model = selected.label(),
                "no journals left for selected business model; showing all"
            );
            self.filters = self
                .filters
                .clone()
                .with_business_model(BusinessModelFilter::All);
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn sort(&self) -> Option<&SortOrder> {
        self.sort.as_ref()
    }

    pub fn dataset(&self) -> &ParsedDataset {
        &self.dataset
    }

    pub fn source(&self) -> Option<&DatasetSource> {
        self.source.as_ref()
    }

    /// Message from the last failed load, if any.
    pub fn status_message(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn visible_rows(&self) -> Vec<&Row> {
        query::visible_rows(&self.dataset.rows, &self.filters, self.sort.as_ref())
    }

    pub fn histogram(&self) -> Vec<HistogramBin> {
        statistics::histogram(self.visible_rows(), &self.dataset.bins)
    }

    pub fn category_counts(&self) -> CategoryCounts {
        CategoryCounts::compute(&self.dataset.rows, &self.filters)
    }

    /// Distinct values offered for a value-filterable column.
    pub fn column_choices(&self, column: Column) -> Vec<String> {
        if column == Column::Subfield {
            return self.dataset.distinct_field_values.clone();
        }
        query::distinct_values(&self.dataset.rows, column)
    }

    /// What to show instead of an empty table.
    pub fn empty_message(&self) -> String {
        if let Some(status) = &self.status {
            return status.clone();
        }
        if self.dataset.is_empty() {
            return "No journal data available".to_string();
        }
        match &self.source {
            Some(source) => source.zero_records_message(),
            None => "No matching journals.".to_string(),
        }
    }

    pub fn snapshot(&self) -> PreferenceSnapshot {
        PreferenceSnapshot::capture(&self.filters, &self.columns, self.sort.as_ref())
    }

    /// Apply saved preferences on top of the current state.
    pub fn restore(&mut self, snapshot: &PreferenceSnapshot) {
        self.filters = snapshot.restore_filters(self.filters.clone());
        if let Some(order) = snapshot.sort_order() {
            self.sort = Some(order);
        }
        let columns = snapshot
            .visible_columns()
            .unwrap_or_else(|| self.columns.clone());
        self.set_columns(columns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InputSource;
    use std::path::PathBuf;

    fn source(id: &str) -> DatasetSource {
        DatasetSource {
            id: Some(id.to_string()),
            label: id.to_string(),
            location: InputSource::Local(PathBuf::from(format!("{id}.csv"))),
            is_all_fields: false,
        }
    }

    fn parsed(csv: &str) -> Result<ParsedDataset> {
        Ok(parser::parse(csv, &ParseConfig::default()))
    }

    #[test]
    fn stale_response_is_dropped() {
        let mut session = Session::new(AppConfig::default());
        let first = session.begin_load(&source("cancer"));
        let second = session.begin_load(&source("plants"));

        let late = LoadResponse {
            ticket: first,
            source: source("cancer"),
            result: parsed("h\nCancer Journal,Cancer\n"),
        };
        let fresh = LoadResponse {
            ticket: second,
            source: source("plants"),
            result: parsed("h\nPlant Journal,Plants\n"),
        };

        assert!(session.complete_load(fresh));
        assert!(!session.complete_load(late));
        assert_eq!(session.source().map(|s| s.label.as_str()), Some("plants"));
        assert_eq!(session.visible_rows()[0].journal_name, "Plant Journal");
    }

    #[test]
    fn selected_business_model_resets_when_empty() {
        let mut session = Session::new(AppConfig::default());
        let ticket = session.begin_load(&source("cancer"));
        session.complete_load(LoadResponse {
            ticket,
            source: source("cancer"),
            result: parsed("h\nA,Cancer,P,For-profit,Hybrid\n"),
        });
        session.set_category_filter(CategoryFilter::BusinessModel(BusinessModelFilter::Hybrid));
        assert_eq!(session.filters().business_model(), BusinessModelFilter::Hybrid);

        let ticket = session.begin_load(&source("plants"));
        session.complete_load(LoadResponse {
            ticket,
            source: source("plants"),
            result: parsed("h\nB,Plants,P,Non-profit,OA\n"),
        });
        assert_eq!(session.filters().business_model(), BusinessModelFilter::All);
        assert_eq!(session.visible_rows().len(), 1);
    }

    #[test]
    fn hiding_a_column_removes_it_from_search() {
        let mut session = Session::new(AppConfig::default());
        let ticket = session.begin_load(&source("cancer"));
        session.complete_load(LoadResponse {
            ticket,
            source: source("cancer"),
            result: parsed("h\nA,Cancer,Springer,For-profit,Hybrid,I,U,Germany\n"),
        });
        session.set_text_query("germany");
        assert!(session.visible_rows().is_empty());
        session.set_column_visible(Column::Country, true);
        assert_eq!(session.visible_rows().len(), 1);
        session.reset_columns();
        assert!(session.visible_rows().is_empty());
    }
}
