//! Command-line arguments, shared with the build script through the `wheretopublish-cli` crate.

pub use wheretopublish_cli::{
    render_options_markdown, Args, BusinessModelChoice, CompressionFormat, PublisherTypeChoice,
};

use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::filter::{BusinessModelFilter, PublisherTypeFilter};
use crate::query::SortOrder;
use crate::row::{Column, ColumnSet};
use crate::session::Session;

impl From<PublisherTypeChoice> for PublisherTypeFilter {
    fn from(choice: PublisherTypeChoice) -> Self {
        match choice {
            PublisherTypeChoice::All => PublisherTypeFilter::All,
            PublisherTypeChoice::ForProfit => PublisherTypeFilter::ForProfit,
            PublisherTypeChoice::NonProfit => PublisherTypeFilter::NonProfit,
            PublisherTypeChoice::UniversityPress => PublisherTypeFilter::UniversityPress,
        }
    }
}

impl From<BusinessModelChoice> for BusinessModelFilter {
    fn from(choice: BusinessModelChoice) -> Self {
        match choice {
            BusinessModelChoice::All => BusinessModelFilter::All,
            BusinessModelChoice::Subscription => BusinessModelFilter::Subscription,
            BusinessModelChoice::Hybrid => BusinessModelFilter::Hybrid,
            BusinessModelChoice::Oa => BusinessModelFilter::Oa,
            BusinessModelChoice::OaDiamond => BusinessModelFilter::OaDiamond,
        }
    }
}

/// `--sort`/`--desc` as a sort order.
pub fn sort_order(args: &Args) -> Result<Option<SortOrder>> {
    let Some(name) = &args.sort else {
        return Ok(None);
    };
    let column = Column::parse(name).ok_or_else(|| eyre!("Unknown sort column '{}'", name))?;
    Ok(Some(if args.desc {
        SortOrder::descending(column)
    } else {
        SortOrder::ascending(column)
    }))
}

/// `--columns` as a column set.
pub fn column_set(args: &Args) -> Result<Option<ColumnSet>> {
    let Some(names) = &args.columns else {
        return Ok(None);
    };
    let columns = names
        .iter()
        .filter(|n| !n.trim().is_empty())
        .map(|n| Column::parse(n).ok_or_else(|| eyre!("Unknown column '{}'", n)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(ColumnSet::from_columns(columns)))
}

/// Notice for a `--business-model` choice that the session dropped because no journal
/// in the loaded dataset matches it.
pub fn business_model_notice(args: &Args, session: &Session) -> Option<String> {
    let requested = BusinessModelFilter::from(args.business_model?);
    if requested == session.filters().business_model() {
        return None;
    }
    Some(format!(
        "no journals match business model \"{}\"; showing all business models",
        requested.label()
    ))
}
