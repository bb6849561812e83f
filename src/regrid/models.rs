//! Data models for search requests, strategies, raw panel fields and property records.

use crate::regrid::jurisdiction::{BoundingBox, Jurisdiction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single extraction request. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchInput {
    /// Parcel identifier as listed by the county (may contain separators)
    pub parcel_id: String,
    /// Jurisdiction the parcel is expected to belong to
    pub jurisdiction: Jurisdiction,
    /// Optional situs address
    pub address: Option<String>,
    /// Requested capture quality, carried through to the record
    #[serde(default)]
    pub quality_mode: QualityMode,
}

impl SearchInput {
    /// Creates a request without an address.
    pub fn new(parcel_id: impl Into<String>, jurisdiction: Jurisdiction) -> Self {
        Self {
            parcel_id: parcel_id.into(),
            jurisdiction,
            address: None,
            quality_mode: QualityMode::default(),
        }
    }

    /// Sets the situs address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Sets the quality mode.
    pub fn with_quality_mode(mut self, mode: QualityMode) -> Self {
        self.quality_mode = mode;
        self
    }
}

/// Capture quality requested by the caller. Not interpreted by the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityMode {
    #[default]
    Standard,
    High,
}

impl std::str::FromStr for QualityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "normal" => Ok(QualityMode::Standard),
            "high" => Ok(QualityMode::High),
            _ => Err(format!("Unknown quality mode: {}. Use: standard, high", s)),
        }
    }
}

/// One concrete (method, query text) pair tried against the search box.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "method", content = "query", rename_all = "snake_case")]
pub enum SearchStrategy {
    AddressQuery(String),
    ParcelQuery(String),
    ParcelQueryLeadingZeroStripped(String),
}

impl SearchStrategy {
    /// Text typed into the search box.
    pub fn query(&self) -> &str {
        match self {
            SearchStrategy::AddressQuery(q)
            | SearchStrategy::ParcelQuery(q)
            | SearchStrategy::ParcelQueryLeadingZeroStripped(q) => q,
        }
    }

    /// Short method name used in logs and output.
    pub fn method(&self) -> &'static str {
        match self {
            SearchStrategy::AddressQuery(_) => "address",
            SearchStrategy::ParcelQuery(_) => "parcel",
            SearchStrategy::ParcelQueryLeadingZeroStripped(_) => "parcel_stripped",
        }
    }

    pub fn is_address(&self) -> bool {
        matches!(self, SearchStrategy::AddressQuery(_))
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.method(), self.query())
    }
}

/// Label/value pairs read from one rendering of the detail panel.
///
/// Document order is preserved; labels are unique (first value wins).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFieldMap {
    entries: Vec<(String, String)>,
}

impl RawFieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair. Returns false if the label was already present.
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) -> bool {
        let label = label.into();
        if self.entries.iter().any(|(l, _)| *l == label) {
            return false;
        }
        self.entries.push((label, value.into()));
        true
    }

    /// Exact label lookup.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.iter().find(|(l, _)| l == label).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<L: Into<String>, V: Into<String>> FromIterator<(L, V)> for RawFieldMap {
    fn from_iter<T: IntoIterator<Item = (L, V)>>(iter: T) -> Self {
        let mut map = RawFieldMap::new();
        for (label, value) in iter {
            map.insert(label, value);
        }
        map
    }
}

/// Why a single strategy attempt did or did not produce an accepted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Panel never rendered enough field entries.
    NotReady { entries_seen: usize },
    /// Record extracted but failed location validation.
    ValidationFailed { reason: String },
    Accepted,
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::NotReady { entries_seen } => {
                write!(f, "panel not ready ({} entries)", entries_seen)
            }
            AttemptOutcome::ValidationFailed { reason } => write!(f, "validation failed: {}", reason),
            AttemptOutcome::Accepted => write!(f, "accepted"),
        }
    }
}

/// One strategy attempt and how it ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub strategy: SearchStrategy,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Expected vs actual location data for a validation decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationDiagnostics {
    pub expected_state: Option<String>,
    pub actual_state: Option<String>,
    pub expected_bounds: Option<BoundingBox>,
    pub actual_latitude: Option<f64>,
    pub actual_longitude: Option<f64>,
    /// Last raw address seen on the panel
    pub actual_address: Option<String>,
    pub actual_city: Option<String>,
}

/// Canonical property record. Every data field is independently optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    // Identifiers
    #[serde(rename = "ll_uuid")]
    pub regrid_uuid: Option<String>,
    pub regrid_id: Option<String>,
    pub parcel_id: Option<String>,
    pub alt_parcel_id: Option<String>,
    pub control_number: Option<String>,
    pub account_number: Option<String>,

    // Situs address
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub county: Option<String>,

    // Owner
    pub owner_name: Option<String>,
    pub mailing_address: Option<String>,

    // Classification
    pub property_type: Option<String>,
    pub property_class: Option<String>,
    pub land_use: Option<String>,
    pub zoning: Option<String>,
    pub zoning_description: Option<String>,

    // Lot
    pub lot_size_acres: Option<f64>,
    pub lot_size_sqft: Option<f64>,
    pub lot_dimensions: Option<String>,
    pub terrain: Option<String>,
    pub elevation_ft: Option<f64>,
    pub flood_zone: Option<String>,

    // Building
    pub building_sqft: Option<f64>,
    pub year_built: Option<u32>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub stories: Option<u32>,
    pub building_count: Option<u32>,

    // Valuation
    pub assessed_value: Option<f64>,
    pub assessed_land_value: Option<f64>,
    pub assessed_improvement_value: Option<f64>,
    pub market_value: Option<f64>,
    pub annual_tax: Option<f64>,
    pub last_sale_price: Option<f64>,
    pub last_sale_date: Option<String>,

    // Geolocation
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    // Utilities
    pub water_service: Option<String>,
    pub sewer_service: Option<String>,
    pub gas_service: Option<String>,
    pub electric_service: Option<String>,
    pub road_type: Option<String>,
    pub utilities: Option<String>,

    // Census / district
    pub census_tract: Option<String>,
    pub census_block: Option<String>,
    pub census_blockgroup: Option<String>,
    pub opportunity_zone: Option<bool>,
    pub school_district: Option<String>,
    pub fips_code: Option<String>,

    // Pennsylvania preferential assessment
    pub clean_green_land_value: Option<f64>,
    pub clean_green_total_value: Option<f64>,
    pub homestead: Option<bool>,

    /// Raw pairs that did not map to any canonical field
    pub additional_fields: BTreeMap<String, String>,

    pub data_quality_score: f64,
    pub location_valid: bool,
    pub validation_reason: Option<String>,
    pub search_strategy: Option<SearchStrategy>,
    pub attempts: Vec<AttemptRecord>,
    pub diagnostics: Option<LocationDiagnostics>,
    pub quality_mode: QualityMode,
    pub scraped_at: DateTime<Utc>,
}

impl Default for PropertyRecord {
    fn default() -> Self {
        Self {
            regrid_uuid: None,
            regrid_id: None,
            parcel_id: None,
            alt_parcel_id: None,
            control_number: None,
            account_number: None,
            address: None,
            city: None,
            state: None,
            zip: None,
            county: None,
            owner_name: None,
            mailing_address: None,
            property_type: None,
            property_class: None,
            land_use: None,
            zoning: None,
            zoning_description: None,
            lot_size_acres: None,
            lot_size_sqft: None,
            lot_dimensions: None,
            terrain: None,
            elevation_ft: None,
            flood_zone: None,
            building_sqft: None,
            year_built: None,
            bedrooms: None,
            bathrooms: None,
            stories: None,
            building_count: None,
            assessed_value: None,
            assessed_land_value: None,
            assessed_improvement_value: None,
            market_value: None,
            annual_tax: None,
            last_sale_price: None,
            last_sale_date: None,
            latitude: None,
            longitude: None,
            water_service: None,
            sewer_service: None,
            gas_service: None,
            electric_service: None,
            road_type: None,
            utilities: None,
            census_tract: None,
            census_block: None,
            census_blockgroup: None,
            opportunity_zone: None,
            school_district: None,
            fips_code: None,
            clean_green_land_value: None,
            clean_green_total_value: None,
            homestead: None,
            additional_fields: BTreeMap::new(),
            data_quality_score: 0.0,
            location_valid: false,
            validation_reason: None,
            search_strategy: None,
            attempts: Vec::new(),
            diagnostics: None,
            quality_mode: QualityMode::default(),
            scraped_at: Utc::now(),
        }
    }
}

impl PropertyRecord {
    /// Minimal record returned when no attempt produced any panel data.
    pub fn failure(input: &SearchInput, reason: impl Into<String>) -> Self {
        Self {
            parcel_id: Some(input.parcel_id.clone()),
            validation_reason: Some(reason.into()),
            diagnostics: Some(LocationDiagnostics {
                expected_state: Some(input.jurisdiction.state.clone()),
                ..LocationDiagnostics::default()
            }),
            quality_mode: input.quality_mode,
            ..Self::default()
        }
    }

    /// Returns (latitude, longitude) when both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    /// One-line situs address, e.g. "123 Main St, Springfield, IL 62701".
    pub fn full_address(&self) -> Option<String> {
        let street = self.address.as_deref()?;
        let mut out = street.to_string();
        if let Some(city) = &self.city {
            out.push_str(", ");
            out.push_str(city);
        }
        match (&self.state, &self.zip) {
            (Some(state), Some(zip)) => out.push_str(&format!(", {} {}", state, zip)),
            (Some(state), None) => out.push_str(&format!(", {}", state)),
            (None, Some(zip)) => out.push_str(&format!(" {}", zip)),
            (None, None) => {}
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blair() -> Jurisdiction {
        Jurisdiction::new("PA", "Blair")
    }

    #[test]
    fn test_strategy_accessors() {
        let s = SearchStrategy::ParcelQueryLeadingZeroStripped("309015000000".to_string());
        assert_eq!(s.query(), "309015000000");
        assert_eq!(s.method(), "parcel_stripped");
        assert!(!s.is_address());
        assert_eq!(s.to_string(), "parcel_stripped(309015000000)");

        assert!(SearchStrategy::AddressQuery("123 Main St".to_string()).is_address());
    }

    #[test]
    fn test_strategy_serde() {
        let s = SearchStrategy::ParcelQuery("0309015000000".to_string());
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"method":"parcel_query","query":"0309015000000"}"#);

        let parsed: SearchStrategy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
    }

    #[test]
    fn test_raw_field_map_keeps_first_value() {
        let mut map = RawFieldMap::new();
        assert!(map.insert("Owner", "SMITH JOHN"));
        assert!(!map.insert("Owner", "DOE JANE"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("Owner"), Some("SMITH JOHN"));
        assert!(map.get("owner").is_none());
    }

    #[test]
    fn test_raw_field_map_preserves_order() {
        let map: RawFieldMap =
            [("B", "2"), ("A", "1"), ("C", "3")].into_iter().collect();
        let labels: Vec<&str> = map.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_quality_mode_parsing() {
        assert_eq!("high".parse::<QualityMode>().unwrap(), QualityMode::High);
        assert_eq!("STANDARD".parse::<QualityMode>().unwrap(), QualityMode::Standard);
        assert!("ultra".parse::<QualityMode>().is_err());
    }

    #[test]
    fn test_search_input_builder() {
        let input = SearchInput::new("01-02-003", blair())
            .with_address("12 Oak Ave")
            .with_quality_mode(QualityMode::High);
        assert_eq!(input.address.as_deref(), Some("12 Oak Ave"));
        assert_eq!(input.quality_mode, QualityMode::High);
    }

    #[test]
    fn test_failure_record() {
        let input = SearchInput::new("01-02-003", blair()).with_address("12 Oak Ave");
        let record = PropertyRecord::failure(&input, "no panel");
        assert_eq!(record.parcel_id.as_deref(), Some("01-02-003"));
        // Request data is not reported as extracted
        assert!(record.address.is_none());
        assert!(record.county.is_none());
        assert!(!record.location_valid);
        assert_eq!(record.validation_reason.as_deref(), Some("no panel"));
        let diag = record.diagnostics.unwrap();
        assert_eq!(diag.expected_state.as_deref(), Some("PA"));
        assert!(diag.actual_state.is_none());
    }

    #[test]
    fn test_full_address() {
        let record = PropertyRecord {
            address: Some("123 Main St".to_string()),
            city: Some("Springfield".to_string()),
            state: Some("IL".to_string()),
            zip: Some("62701".to_string()),
            ..PropertyRecord::default()
        };
        assert_eq!(record.full_address().as_deref(), Some("123 Main St, Springfield, IL 62701"));

        let bare = PropertyRecord::default();
        assert!(bare.full_address().is_none());
    }

    #[test]
    fn test_record_serde_uses_store_column_names() {
        let record = PropertyRecord {
            regrid_uuid: Some("abc-123".to_string()),
            assessed_value: Some(120_000.0),
            ..PropertyRecord::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"ll_uuid\":\"abc-123\""));
        assert!(json.contains("\"assessed_value\":120000.0"));

        let parsed: PropertyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.regrid_uuid, record.regrid_uuid);
    }

    #[test]
    fn test_attempt_outcome_display() {
        assert_eq!(
            AttemptOutcome::NotReady { entries_seen: 3 }.to_string(),
            "panel not ready (3 entries)"
        );
        assert_eq!(
            AttemptOutcome::ValidationFailed { reason: "state OH != PA".to_string() }.to_string(),
            "validation failed: state OH != PA"
        );
    }
}
