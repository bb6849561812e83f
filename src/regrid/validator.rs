//! Cross-checks an extracted record against the requested jurisdiction.

use crate::regrid::jurisdiction::{BoundsTable, Jurisdiction};
use crate::regrid::models::{LocationDiagnostics, PropertyRecord};
use tracing::debug;

/// Result of a location check.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationCheck {
    pub valid: bool,
    /// False only when both state codes are known and differ
    pub state_valid: bool,
    /// False only when a box and both coordinates are known and disagree
    pub bounds_valid: bool,
    pub reason: Option<String>,
    pub diagnostics: LocationDiagnostics,
}

/// Validates records against jurisdiction state codes and bounding boxes.
#[derive(Debug, Clone, Default)]
pub struct LocationValidator {
    bounds: BoundsTable,
}

impl LocationValidator {
    pub fn new(bounds: BoundsTable) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> &BoundsTable {
        &self.bounds
    }

    /// Checks state code and coordinates. Missing data skips a check.
    pub fn validate(&self, record: &PropertyRecord, expected: &Jurisdiction) -> LocationCheck {
        let expected_bounds = self.bounds.lookup(expected);
        let diagnostics = LocationDiagnostics {
            expected_state: (!expected.state.is_empty()).then(|| expected.state.clone()),
            actual_state: record.state.clone(),
            expected_bounds,
            actual_latitude: record.latitude,
            actual_longitude: record.longitude,
            actual_address: record.address.clone(),
            actual_city: record.city.clone(),
        };

        let mut reasons = Vec::new();

        // Only compared when both codes are known
        let state_valid = match record.state.as_deref().map(str::trim) {
            Some(actual)
                if !expected.state.is_empty()
                    && !actual.is_empty()
                    && !actual.eq_ignore_ascii_case(&expected.state) =>
            {
                reasons.push(format!(
                    "state mismatch: expected {}, found {}",
                    expected.state, actual
                ));
                false
            }
            _ => true,
        };

        let bounds_valid = match (expected_bounds, record.coordinates()) {
            (Some(bbox), Some((lat, lon))) if !bbox.contains(lat, lon) => {
                reasons.push(format!(
                    "coordinates ({:.5}, {:.5}) outside {} ({})",
                    lat, lon, expected, bbox
                ));
                false
            }
            _ => true,
        };

        let valid = state_valid && bounds_valid;
        let reason = (!reasons.is_empty()).then(|| reasons.join("; "));

        debug!(
            "Location check for {}: state_valid={} bounds_valid={}",
            expected, state_valid, bounds_valid
        );

        LocationCheck { valid, state_valid, bounds_valid, reason, diagnostics }
    }
}
