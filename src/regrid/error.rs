//! Failures surfaced by the extraction pipeline.

use crate::regrid::models::{AttemptRecord, LocationDiagnostics, PropertyRecord};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionFailure {
    /// Every strategy was tried and none produced a validated record.
    #[error("all {} search strategies exhausted for parcel {parcel_id}", .attempts.len())]
    StrategiesExhausted {
        parcel_id: String,
        attempts: Vec<AttemptRecord>,
        diagnostics: Option<LocationDiagnostics>,
        /// Best-effort record carrying the reason and diagnostics
        record: Box<PropertyRecord>,
    },

    /// The browser session failed; the request is aborted.
    #[error("browser session error: {0}")]
    Session(#[source] anyhow::Error),
}

impl ExtractionFailure {
    /// Best-effort record, if the failure carries one.
    pub fn record(&self) -> Option<&PropertyRecord> {
        match self {
            ExtractionFailure::StrategiesExhausted { record, .. } => Some(&**record),
            ExtractionFailure::Session(_) => None,
        }
    }

    pub fn into_record(self) -> Option<PropertyRecord> {
        match self {
            ExtractionFailure::StrategiesExhausted { record, .. } => Some(*record),
            ExtractionFailure::Session(_) => None,
        }
    }
}
