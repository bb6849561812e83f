//! Jurisdictions, map URLs and approximate bounding boxes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// State + county pair a parcel is expected to belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Jurisdiction {
    /// Two-letter state code, upper case
    pub state: String,
    /// County name without the "County" suffix
    pub county: String,
}

impl Jurisdiction {
    pub fn new(state: impl AsRef<str>, county: impl AsRef<str>) -> Self {
        let county = county.as_ref().trim();
        let county = county
            .strip_suffix(" County")
            .or_else(|| county.strip_suffix(" county"))
            .unwrap_or(county);
        Self { state: state.as_ref().trim().to_uppercase(), county: county.trim().to_string() }
    }

    /// County path segment used by the map viewer ("St. Marys" -> "st-marys").
    pub fn county_slug(&self) -> String {
        let mut slug = String::new();
        for c in self.county.to_lowercase().chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c);
            } else if (c == ' ' || c == '-') && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        slug.trim_matches('-').to_string()
    }

    /// Default map view for this jurisdiction.
    pub fn map_url(&self, base_url: &str) -> String {
        format!(
            "{}/us/{}/{}",
            base_url.trim_end_matches('/'),
            self.state.to_lowercase(),
            self.county_slug()
        )
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} County, {}", self.county, self.state)
    }
}

impl FromStr for Jurisdiction {
    type Err = JurisdictionParseError;

    /// Parses "PA/Blair", "Blair, PA" or "blair-pa".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let is_state = |p: &str| p.len() == 2 && p.chars().all(|c| c.is_ascii_alphabetic());

        if let Some((state, county)) = s.split_once('/') {
            if is_state(state.trim()) && !county.trim().is_empty() {
                return Ok(Jurisdiction::new(state, county));
            }
        }
        if let Some((county, state)) = s.rsplit_once(',') {
            if is_state(state.trim()) && !county.trim().is_empty() {
                return Ok(Jurisdiction::new(state, county));
            }
        }
        if let Some((county, state)) = s.rsplit_once('-') {
            if is_state(state) && !county.is_empty() {
                return Ok(Jurisdiction::new(state, county.replace('-', " ")));
            }
        }
        Err(JurisdictionParseError(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct JurisdictionParseError(String);

impl fmt::Display for JurisdictionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown jurisdiction '{}'. Use STATE/County (e.g. PA/Blair) or 'County, ST'",
            self.0
        )
    }
}

impl std::error::Error for JurisdictionParseError {}

/// Approximate latitude/longitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self { min_lat, max_lat, min_lon, max_lon }
    }

    /// Inclusive containment check.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lat {:.2}..{:.2}, lon {:.2}..{:.2}",
            self.min_lat, self.max_lat, self.min_lon, self.max_lon
        )
    }
}

/// A bounding box entry. `county: None` marks a whole-state box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundsEntry {
    pub state: String,
    #[serde(default)]
    pub county: Option<String>,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundsEntry {
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.min_lat, self.max_lat, self.min_lon, self.max_lon)
    }

    fn matches(&self, state: &str, county: Option<&str>) -> bool {
        self.state.eq_ignore_ascii_case(state)
            && match (self.county.as_deref(), county) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                (None, None) => true,
                _ => false,
            }
    }
}

// Approximate county boxes, padded by a few hundredths of a degree.
const COUNTY_BOUNDS: &[(&str, &str, BoundingBox)] = &[
    ("PA", "Bedford", BoundingBox::new(39.70, 40.32, -78.82, -78.10)),
    ("PA", "Blair", BoundingBox::new(40.25, 40.75, -78.65, -78.05)),
    ("PA", "Cambria", BoundingBox::new(40.25, 40.75, -79.05, -78.40)),
    ("PA", "Centre", BoundingBox::new(40.65, 41.25, -78.40, -77.15)),
    ("PA", "Clearfield", BoundingBox::new(40.80, 41.35, -78.82, -78.05)),
    ("PA", "Huntingdon", BoundingBox::new(40.10, 40.75, -78.22, -77.65)),
    ("PA", "Somerset", BoundingBox::new(39.70, 40.25, -79.45, -78.75)),
];

const STATE_BOUNDS: &[(&str, BoundingBox)] = &[
    ("MD", BoundingBox::new(37.88, 39.73, -79.49, -75.04)),
    ("NJ", BoundingBox::new(38.92, 41.36, -75.56, -73.89)),
    ("NY", BoundingBox::new(40.49, 45.02, -79.77, -71.85)),
    ("OH", BoundingBox::new(38.40, 41.98, -84.82, -80.51)),
    ("PA", BoundingBox::new(39.71, 42.27, -80.53, -74.68)),
    ("WV", BoundingBox::new(37.20, 40.64, -82.65, -77.71)),
];

/// Lookup table of jurisdiction bounding boxes.
#[derive(Debug, Clone)]
pub struct BoundsTable {
    entries: Vec<BoundsEntry>,
}

impl BoundsTable {
    /// Empty table; every bounding-box check is skipped.
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Built-in county and state boxes.
    pub fn builtin() -> Self {
        let counties = COUNTY_BOUNDS.iter().map(|(state, county, b)| BoundsEntry {
            state: state.to_string(),
            county: Some(county.to_string()),
            min_lat: b.min_lat,
            max_lat: b.max_lat,
            min_lon: b.min_lon,
            max_lon: b.max_lon,
        });
        let states = STATE_BOUNDS.iter().map(|(state, b)| BoundsEntry {
            state: state.to_string(),
            county: None,
            min_lat: b.min_lat,
            max_lat: b.max_lat,
            min_lon: b.min_lon,
            max_lon: b.max_lon,
        });
        Self { entries: counties.chain(states).collect() }
    }

    /// Built-in boxes with configured entries layered on top.
    pub fn with_overrides(overrides: &[BoundsEntry]) -> Self {
        let mut table = Self::builtin();
        for entry in overrides {
            table.insert(entry.clone());
        }
        table
    }

    /// Adds an entry, replacing any existing one for the same state/county.
    pub fn insert(&mut self, entry: BoundsEntry) {
        self.entries.retain(|e| !e.matches(&entry.state, entry.county.as_deref()));
        self.entries.push(entry);
    }

    /// County box if known, else the state box.
    pub fn lookup(&self, jurisdiction: &Jurisdiction) -> Option<BoundingBox> {
        self.entries
            .iter()
            .find(|e| e.matches(&jurisdiction.state, Some(&jurisdiction.county)))
            .or_else(|| self.entries.iter().find(|e| e.matches(&jurisdiction.state, None)))
            .map(BoundsEntry::bbox)
    }

    pub fn entries(&self) -> &[BoundsEntry] {
        &self.entries
    }
}

impl Default for BoundsTable {
    fn default() -> Self {
        Self::builtin()
    }
}
