//! Derived views over a filtered dataset: the APC histogram and the category button counts.

use crate::filter::{BusinessModelFilter, FilterState, PublisherTypeFilter};
use crate::parser::BinBoundaries;
use crate::row::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramBin {
    pub lower_bound: u32,
    pub upper_bound: u32,
    pub count: usize,
}

/// Distribution of APC values over `subset`, one bin per boundary pair.
///
/// Rows are placed by their precomputed `apc_bucket`; rows without an APC are not counted.
pub fn histogram<'a>(
    subset: impl IntoIterator<Item = &'a Row>,
    bins: &BinBoundaries,
) -> Vec<HistogramBin> {
    let mut out: Vec<HistogramBin> = bins
        .as_slice()
        .windows(2)
        .map(|w| HistogramBin {
            lower_bound: w[0],
            upper_bound: w[1],
            count: 0,
        })
        .collect();
    for row in subset {
        if let Some(bin) = row.apc_bucket.and_then(|i| out.get_mut(i)) {
            bin.count += 1;
        }
    }
    out
}

/// Button counts for both category dimensions.
///
/// Publisher-type counts ignore the publisher-type filter but honor every other
/// filter, and business-model counts ignore only the business-model filter. A
/// selected category therefore never hides the alternatives in its own group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub publisher_total: usize,
    pub for_profit: usize,
    pub non_profit: usize,
    pub university_press: usize,
    pub business_total: usize,
    pub subscription: usize,
    pub hybrid: usize,
    pub oa: usize,
    pub oa_diamond: usize,
}

impl CategoryCounts {
    /// Both count passes in a single scan of the full row set.
    pub fn compute(rows: &[Row], state: &FilterState) -> Self {
        let mut counts = Self::default();
        for row in rows.iter().filter(|row| state.passes_non_category(row)) {
            if state.passes_business_model(row) {
                counts.add_publisher_type(&row.publisher_type);
            }
            if state.passes_publisher_type(row) {
                counts.add_business_model(&row.business_model, state);
            }
        }
        counts
    }

    fn add_publisher_type(&mut self, publisher_type: &str) {
        self.publisher_total += 1;
        if PublisherTypeFilter::NonProfit.counts(publisher_type) {
            self.non_profit += 1;
        } else if PublisherTypeFilter::ForProfit.counts(publisher_type) {
            self.for_profit += 1;
        } else if PublisherTypeFilter::UniversityPress.counts(publisher_type) {
            self.university_press += 1;
        }
    }

    fn add_business_model(&mut self, business_model: &str, state: &FilterState) {
        self.business_total += 1;
        let oa = state.oa_matching();
        if BusinessModelFilter::OaDiamond.matches(business_model, oa) {
            self.oa_diamond += 1;
        }
        if BusinessModelFilter::Oa.matches(business_model, oa) {
            self.oa += 1;
        } else if BusinessModelFilter::Hybrid.matches(business_model, oa) {
            self.hybrid += 1;
        } else if BusinessModelFilter::Subscription.matches(business_model, oa) {
            self.subscription += 1;
        }
    }

    pub fn publisher_count(&self, filter: PublisherTypeFilter) -> usize {
        match filter {
            PublisherTypeFilter::All => self.publisher_total,
            PublisherTypeFilter::ForProfit => self.for_profit,
            PublisherTypeFilter::NonProfit => self.non_profit,
            PublisherTypeFilter::UniversityPress => self.university_press,
        }
    }

    pub fn business_count(&self, filter: BusinessModelFilter) -> usize {
        match filter {
            BusinessModelFilter::All => self.business_total,
            BusinessModelFilter::Subscription => self.subscription,
            BusinessModelFilter::Hybrid => self.hybrid,
            BusinessModelFilter::Oa => self.oa,
            BusinessModelFilter::OaDiamond => self.oa_diamond,
        }
    }

    /// `(category, count)` pairs for the publisher-type buttons, "all" first.
    pub fn publisher_pairs(&self) -> Vec<(PublisherTypeFilter, usize)> {
        std::iter::once(PublisherTypeFilter::All)
            .chain(PublisherTypeFilter::CHOICES)
            .map(|f| (f, self.publisher_count(f)))
            .collect()
    }

    /// `(category, count)` pairs for the business-model buttons, "all" first.
    pub fn business_pairs(&self) -> Vec<(BusinessModelFilter, usize)> {
        std::iter::once(BusinessModelFilter::All)
            .chain(BusinessModelFilter::CHOICES)
            .map(|f| (f, self.business_count(f)))
            .collect()
    }

    /// True when `selected` is a specific business model that no row can satisfy any more.
    /// The caller is expected to reset the filter to "all" and query again.
    pub fn business_model_needs_reset(&self, selected: BusinessModelFilter) -> bool {
        selected != BusinessModelFilter::All && self.business_count(selected) == 0
    }
}

/// Button caption, e.g. "Hybrid (12)".
pub fn count_label(label: &str, count: usize) -> String {
    format!("{} ({})", label, count)
}
