//! Region and sub-region discovery
//!
//! Both levels of the taxonomy come from `<select>` controls on the listing
//! page. Every `<option>` with a non-empty `value` becomes one entry, in
//! document order.

use crate::harvest::fetcher::{Fetcher, PageRequest};
use scraper::{Html, Selector};

/// A top-level selector item (city)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub display_name: String,
    pub selector_value: String,
}

/// A second-level selector item (area), scoped under one region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRegion {
    pub display_name: String,
    pub selector_value: String,
}

/// Outcome of reading one selection control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery<T> {
    /// The control exists; the list may still be empty
    Found(Vec<T>),

    /// The control is not on the page, usually a site layout change
    ControlMissing { control: String },
}

impl<T> Discovery<T> {
    /// Flattens the outcome, treating a missing control as no items
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Found(items) => items,
            Self::ControlMissing { .. } => Vec::new(),
        }
    }

    pub fn is_control_missing(&self) -> bool {
        matches!(self, Self::ControlMissing { .. })
    }

    fn map<U>(self, f: impl Fn(T) -> U) -> Discovery<U> {
        match self {
            Self::Found(items) => Discovery::Found(items.into_iter().map(f).collect()),
            Self::ControlMissing { control } => Discovery::ControlMissing { control },
        }
    }
}

/// Builds a CSS selector matching `<select id="{control_id}">`
pub(crate) fn control_selector(control_id: &str) -> Option<Selector> {
    Selector::parse(&format!(r#"select[id="{}"]"#, control_id)).ok()
}

/// Extracts `(display name, value)` pairs from `<select id="{control_id}">`
///
/// Options without a value, or with an empty one, are placeholders and skipped.
pub fn extract_options(document: &Html, control_id: &str) -> Discovery<(String, String)> {
    let missing = || Discovery::ControlMissing {
        control: control_id.to_string(),
    };

    let Some(select_selector) = control_selector(control_id) else {
        return missing();
    };
    let Some(select) = document.select(&select_selector).next() else {
        return missing();
    };
    let Ok(option_selector) = Selector::parse("option") else {
        return missing();
    };

    let options = select
        .select(&option_selector)
        .filter_map(|option| {
            let value = option.value().attr("value")?;
            if value.is_empty() {
                return None;
            }
            let name = option.text().collect::<String>().trim().to_string();
            Some((name, value.to_string()))
        })
        .collect();

    Discovery::Found(options)
}

/// Reads the regions offered by the top-level page
pub fn discover_regions(document: &Html, control_id: &str) -> Discovery<Region> {
    let discovery = extract_options(document, control_id).map(|(display_name, selector_value)| {
        Region {
            display_name,
            selector_value,
        }
    });

    if let Discovery::ControlMissing { control } = &discovery {
        tracing::warn!("Failed to locate the region control '{}' on the page", control);
    }

    discovery
}

/// Asks the listing endpoint for the sub-regions of `region`
///
/// The region's selector value is posted as the only form field. Transport
/// failures after retries are returned to the caller, which decides whether
/// the region is skipped; a missing control is an `Ok` outcome.
pub async fn discover_sub_regions(
    fetcher: &Fetcher,
    listing_url: &str,
    region_field: &str,
    sub_region_control: &str,
    region: &Region,
) -> crate::Result<Discovery<SubRegion>> {
    let form = [(region_field, region.selector_value.as_str())];
    let document = fetcher.fetch(listing_url, PageRequest::Post(&form)).await?;

    let discovery = extract_options(&document, sub_region_control).map(
        |(display_name, selector_value)| SubRegion {
            display_name,
            selector_value,
        },
    );

    if let Discovery::ControlMissing { control } = &discovery {
        tracing::warn!(
            "Failed to locate the sub-region control '{}' for {}",
            control,
            region.display_name
        );
    }

    Ok(discovery)
}
