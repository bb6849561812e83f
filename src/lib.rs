//! parcel-crawler - Parcel record extraction and jurisdiction validation
//!
//! Locates a parcel in a map-based property viewer, waits for its detail
//! panel, maps the panel's label/value pairs onto a canonical record and
//! checks that the result belongs to the requested jurisdiction, falling
//! back to alternate search strategies when it does not.

pub mod commands;
pub mod config;
pub mod format;
pub mod regrid;

pub use config::Config;
pub use regrid::{
    extract_property, BrowserSession, ExtractionFailure, Extractor, Jurisdiction, PropertyRecord,
    SearchInput, SearchStrategy,
};
