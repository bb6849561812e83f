//! Search strategy selection.

use crate::regrid::models::{SearchInput, SearchStrategy};

/// Parcel id with separator hyphens removed.
pub fn clean_parcel(parcel_id: &str) -> String {
    parcel_id.trim().chars().filter(|c| *c != '-').collect()
}

/// Ordered list of strategies to try for a request.
///
/// An address is only used when it starts with a house number; street-only
/// addresses do not resolve reliably in the suggestion index.
pub fn plan(input: &SearchInput) -> Vec<SearchStrategy> {
    let mut strategies = Vec::with_capacity(3);

    if let Some(address) = input.address.as_deref().map(str::trim) {
        if address.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            strategies.push(SearchStrategy::AddressQuery(address.to_string()));
        }
    }

    let clean = clean_parcel(&input.parcel_id);
    if clean.is_empty() {
        return strategies;
    }

    let stripped = clean.trim_start_matches('0');
    let stripped = (!stripped.is_empty() && stripped != clean).then(|| stripped.to_string());

    strategies.push(SearchStrategy::ParcelQuery(clean));
    if let Some(stripped) = stripped {
        strategies.push(SearchStrategy::ParcelQueryLeadingZeroStripped(stripped));
    }

    strategies
}
