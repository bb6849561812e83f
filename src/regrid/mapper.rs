//! Maps raw panel label/value pairs onto the canonical property record.
//!
//! Labels are matched by case-insensitive substring against ordered fragment
//! lists (see [`DEFAULT_RULES`]). Supporting a county with different label
//! wording means extending the table, not adding branches.

use crate::regrid::models::{PropertyRecord, RawFieldMap};
use regex_lite::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, trace};

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

static FULL_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+),\s*([^,]+?),\s*([A-Za-z]{2})\s+(\d{5}(?:-\d{4})?)$").unwrap()
});

/// Values the viewer shows for an empty field.
const PLACEHOLDERS: &[&str] = &["--", "-", "n/a", "na", "none", "null", "unknown"];

/// Canonical targets a raw label can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    RegridUuid,
    RegridId,
    ParcelId,
    AltParcelId,
    ControlNumber,
    AccountNumber,
    /// Composite "street, City, ST ZIP"
    FullAddress,
    City,
    State,
    Zip,
    County,
    OwnerName,
    MailingAddress,
    PropertyType,
    PropertyClass,
    LandUse,
    Zoning,
    ZoningDescription,
    LotSizeAcres,
    LotSizeSqft,
    LotDimensions,
    Terrain,
    ElevationFt,
    FloodZone,
    BuildingSqft,
    YearBuilt,
    Bedrooms,
    Bathrooms,
    Stories,
    BuildingCount,
    AssessedValue,
    AssessedLandValue,
    AssessedImprovementValue,
    MarketValue,
    AnnualTax,
    LastSalePrice,
    LastSaleDate,
    Latitude,
    Longitude,
    /// Combined "lat, lon" pair, used when explicit coordinates are missing
    Centroid,
    WaterService,
    SewerService,
    GasService,
    ElectricService,
    RoadType,
    Utilities,
    CensusTract,
    CensusBlock,
    CensusBlockgroup,
    OpportunityZone,
    SchoolDistrict,
    FipsCode,
    CleanGreenLandValue,
    CleanGreenTotalValue,
    Homestead,
}

/// Label fragments accepted for one canonical field, in preference order.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    pub fragments: &'static [&'static str],
    /// A label containing any of these never matches the rule
    pub excludes: &'static [&'static str],
}

const fn rule(field: Field, fragments: &'static [&'static str]) -> FieldRule {
    FieldRule { field, fragments, excludes: &[] }
}

const fn rule_excluding(
    field: Field,
    fragments: &'static [&'static str],
    excludes: &'static [&'static str],
) -> FieldRule {
    FieldRule { field, fragments, excludes }
}

/// Default label table for the parcel detail panel.
///
/// Order matters where fields share a source: the composite address runs
/// before the explicit city/state/zip rules, explicit coordinates before the
/// centroid.
pub const DEFAULT_RULES: &[FieldRule] = &[
    // Identifiers
    rule(Field::RegridUuid, &["regrid uuid", "ll_uuid", "uuid"]),
    rule(Field::RegridId, &["regrid parcel id", "ll_stable_id", "stable id"]),
    rule_excluding(
        Field::ParcelId,
        &["parcel id", "parcel number", "parcelnumb", "map number"],
        &["alternate", "alt ", "regrid", "state parcel"],
    ),
    rule(Field::AltParcelId, &["alternate parcel", "alt parcel", "alt_parcelnumb", "state parcel"]),
    rule(Field::ControlNumber, &["control number", "control no", "control #"]),
    rule(Field::AccountNumber, &["account number", "account no", "tax account"]),
    // Situs address
    rule_excluding(
        Field::FullAddress,
        &["full address", "parcel address", "situs address", "property address", "address"],
        &["mailing", "city", "state", "zip", "county", "owner"],
    ),
    rule_excluding(
        Field::City,
        &["parcel address city", "situs city", "city"],
        &["mailing", "owner", "county", "electric", "capacity"],
    ),
    rule_excluding(
        Field::State,
        &["parcel address state", "situs state", "state abbreviation", "state"],
        &["mailing", "owner", "estate", "statement", "interstate", "state parcel", "parcel id"],
    ),
    rule_excluding(
        Field::Zip,
        &["parcel address zip", "situs zip", "zip code", "zip"],
        &["mailing", "owner"],
    ),
    rule_excluding(
        Field::County,
        &["parcel address county", "county name", "county"],
        &["mailing", "fips", "code"],
    ),
    // Owner
    rule_excluding(
        Field::OwnerName,
        &["owner name", "owner"],
        &["mailing", "address", "city", "state", "zip", "type", "occupied"],
    ),
    rule_excluding(
        Field::MailingAddress,
        &["mailing address", "owner address", "mail address"],
        &["city", "state", "zip", "country"],
    ),
    // Classification
    rule(Field::PropertyType, &["property type", "structure style", "parcel type"]),
    rule_excluding(
        Field::PropertyClass,
        &["property class", "class code", "class"],
        &["land use", "school"],
    ),
    rule(
        Field::LandUse,
        &[
            "land use description",
            "standardized land use",
            "land use",
            "parcel use",
            "use description",
            "use code",
        ],
    ),
    rule_excluding(Field::Zoning, &["zoning code", "zoning"], &["description", "type"]),
    rule(Field::ZoningDescription, &["zoning description"]),
    // Lot
    rule(Field::LotSizeAcres, &["deeded acres", "calculated acres", "acreage", "acres"]),
    rule(
        Field::LotSizeSqft,
        &["parcel sq ft", "parcel square feet", "lot sq ft", "lot square feet", "lot area"],
    ),
    rule(Field::LotDimensions, &["lot dimensions", "dimensions", "frontage"]),
    rule(Field::Terrain, &["terrain", "topography"]),
    rule(Field::ElevationFt, &["elevation"]),
    rule(Field::FloodZone, &["flood zone", "fema"]),
    // Building
    rule(
        Field::BuildingSqft,
        &[
            "building sq ft",
            "building square",
            "building area",
            "living area",
            "finished area",
            "footprint",
        ],
    ),
    rule(Field::YearBuilt, &["year built", "yearbuilt", "built"]),
    rule(Field::Bedrooms, &["bedrooms", "beds"]),
    rule(Field::Bathrooms, &["bathrooms", "baths"]),
    rule_excluding(Field::Stories, &["stories", "story"], &["history"]),
    rule(Field::BuildingCount, &["building count", "number of buildings", "buildings"]),
    // Valuation
    rule_excluding(
        Field::AssessedValue,
        &["total parcel value", "total assessed", "assessed value", "total value", "parcel value"],
        &["land", "improvement", "building", "clean"],
    ),
    rule_excluding(
        Field::AssessedLandValue,
        &["land value", "assessed land"],
        &["clean", "green", "improvement"],
    ),
    rule(Field::AssessedImprovementValue, &["improvement value", "building value", "improvements"]),
    rule_excluding(Field::MarketValue, &["market value", "fair market"], &["clean", "green"]),
    rule_excluding(
        Field::AnnualTax,
        &["tax amount", "annual tax", "taxes"],
        &["account", "year"],
    ),
    rule(Field::LastSalePrice, &["last sale price", "sale price", "sale amount"]),
    rule(Field::LastSaleDate, &["last sale date", "sale date"]),
    // Geolocation
    rule(Field::Latitude, &["latitude"]),
    rule(Field::Longitude, &["longitude"]),
    rule(Field::Centroid, &["centroid", "coordinates"]),
    // Utilities
    rule_excluding(
        Field::WaterService,
        &["water service", "water source", "water"],
        &["waterfront", "watershed"],
    ),
    rule(Field::SewerService, &["sewer service", "sewer"]),
    rule(Field::GasService, &["gas service", "gas"]),
    rule(Field::ElectricService, &["electric service", "electricity", "electric"]),
    rule_excluding(
        Field::RoadType,
        &["road type", "street type", "road"],
        &["railroad", "broadband"],
    ),
    rule(Field::Utilities, &["utilities", "utility"]),
    // Census / district
    rule(Field::CensusTract, &["census tract", "tract"]),
    rule_excluding(Field::CensusBlock, &["census block"], &["group"]),
    rule(Field::CensusBlockgroup, &["census blockgroup", "census block group", "block group"]),
    rule(Field::OpportunityZone, &["opportunity zone"]),
    rule(Field::SchoolDistrict, &["school district", "school"]),
    rule(Field::FipsCode, &["fips"]),
    // Pennsylvania preferential assessment
    rule(
        Field::CleanGreenLandValue,
        &["clean and green land", "clean & green land", "clean green land", "c&g land"],
    ),
    rule(
        Field::CleanGreenTotalValue,
        &[
            "clean and green total",
            "clean & green total",
            "clean green total",
            "clean and green value",
            "clean & green value",
            "clean green value",
        ],
    ),
    rule(Field::Homestead, &["homestead"]),
];

/// Turns a [`RawFieldMap`] into a [`PropertyRecord`].
#[derive(Debug, Clone)]
pub struct FieldMapper {
    rules: &'static [FieldRule],
}

impl FieldMapper {
    /// Creates a mapper over the default label table.
    pub fn new() -> Self {
        Self { rules: DEFAULT_RULES }
    }

    /// Maps every raw pair. Each pair feeds at most one canonical field;
    /// pairs no rule consumed land in `additional_fields`.
    pub fn map(&self, raw: &RawFieldMap) -> PropertyRecord {
        let entries: Vec<(&str, &str)> = raw.iter().collect();
        let lowered: Vec<String> = entries.iter().map(|(l, _)| l.to_lowercase()).collect();
        let mut consumed: HashSet<usize> = HashSet::new();
        let mut record = PropertyRecord::default();

        for rule in self.rules {
            if let Some(idx) = find_entry(&lowered, &consumed, rule) {
                let (label, value) = entries[idx];
                trace!("{:?} <- {:?} = {:?}", rule.field, label, value);
                consumed.insert(idx);
                assign(&mut record, rule.field, value);
            }
        }

        for (idx, (label, value)) in entries.iter().enumerate() {
            if !consumed.contains(&idx) {
                record.additional_fields.insert(label.to_string(), value.to_string());
            }
        }

        debug!(
            "Mapped {} raw fields ({} unmapped)",
            entries.len(),
            record.additional_fields.len()
        );

        record
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of the first unconsumed entry matching the rule; fragments are
/// tried in order. `lowered` holds the lower-cased labels.
fn find_entry(lowered: &[String], consumed: &HashSet<usize>, rule: &FieldRule) -> Option<usize> {
    rule.fragments.iter().find_map(|fragment| {
        lowered
            .iter()
            .enumerate()
            .find(|(idx, label)| {
                !consumed.contains(idx)
                    && label.contains(fragment)
                    && !rule.excludes.iter().any(|ex| label.contains(ex))
            })
            .map(|(idx, _)| idx)
    })
}

fn assign(record: &mut PropertyRecord, field: Field, value: &str) {
    fn set<T>(slot: &mut Option<T>, value: Option<T>) {
        if slot.is_none() {
            *slot = value;
        }
    }

    match field {
        Field::RegridUuid => set(&mut record.regrid_uuid, parse_text(value)),
        Field::RegridId => set(&mut record.regrid_id, parse_text(value)),
        Field::ParcelId => set(&mut record.parcel_id, parse_text(value)),
        Field::AltParcelId => set(&mut record.alt_parcel_id, parse_text(value)),
        Field::ControlNumber => set(&mut record.control_number, parse_text(value)),
        Field::AccountNumber => set(&mut record.account_number, parse_text(value)),
        Field::FullAddress => {
            if let Some(parsed) = parse_text(value).map(|v| parse_address(&v)) {
                set(&mut record.address, Some(parsed.street));
                set(&mut record.city, parsed.city);
                set(&mut record.state, parsed.state);
                set(&mut record.zip, parsed.zip);
            }
        }
        Field::City => set(&mut record.city, parse_text(value)),
        Field::State => set(&mut record.state, parse_text(value).map(|s| s.to_uppercase())),
        Field::Zip => set(&mut record.zip, parse_text(value)),
        Field::County => set(&mut record.county, parse_text(value)),
        Field::OwnerName => set(&mut record.owner_name, parse_text(value)),
        Field::MailingAddress => set(&mut record.mailing_address, parse_text(value)),
        Field::PropertyType => set(&mut record.property_type, parse_text(value)),
        Field::PropertyClass => set(&mut record.property_class, parse_text(value)),
        Field::LandUse => set(&mut record.land_use, parse_text(value)),
        Field::Zoning => set(&mut record.zoning, parse_text(value)),
        Field::ZoningDescription => set(&mut record.zoning_description, parse_text(value)),
        Field::LotSizeAcres => set(&mut record.lot_size_acres, parse_number(value)),
        Field::LotSizeSqft => set(&mut record.lot_size_sqft, parse_number(value)),
        Field::LotDimensions => set(&mut record.lot_dimensions, parse_text(value)),
        Field::Terrain => set(&mut record.terrain, parse_text(value)),
        Field::ElevationFt => set(&mut record.elevation_ft, parse_number(value)),
        Field::FloodZone => set(&mut record.flood_zone, parse_text(value)),
        Field::BuildingSqft => set(&mut record.building_sqft, parse_number(value)),
        Field::YearBuilt => set(&mut record.year_built, parse_integer(value)),
        Field::Bedrooms => set(&mut record.bedrooms, parse_integer(value)),
        Field::Bathrooms => set(&mut record.bathrooms, parse_number(value)),
        Field::Stories => set(&mut record.stories, parse_integer(value)),
        Field::BuildingCount => set(&mut record.building_count, parse_integer(value)),
        Field::AssessedValue => set(&mut record.assessed_value, parse_number(value)),
        Field::AssessedLandValue => set(&mut record.assessed_land_value, parse_number(value)),
        Field::AssessedImprovementValue => {
            set(&mut record.assessed_improvement_value, parse_number(value))
        }
        Field::MarketValue => set(&mut record.market_value, parse_number(value)),
        Field::AnnualTax => set(&mut record.annual_tax, parse_number(value)),
        Field::LastSalePrice => set(&mut record.last_sale_price, parse_number(value)),
        Field::LastSaleDate => set(&mut record.last_sale_date, parse_text(value)),
        Field::Latitude => set(&mut record.latitude, parse_number(value)),
        Field::Longitude => set(&mut record.longitude, parse_number(value)),
        Field::Centroid => {
            if record.latitude.is_none() && record.longitude.is_none() {
                if let Some((lat, lon)) = parse_centroid(value) {
                    record.latitude = Some(lat);
                    record.longitude = Some(lon);
                }
            }
        }
        Field::WaterService => set(&mut record.water_service, parse_text(value)),
        Field::SewerService => set(&mut record.sewer_service, parse_text(value)),
        Field::GasService => set(&mut record.gas_service, parse_text(value)),
        Field::ElectricService => set(&mut record.electric_service, parse_text(value)),
        Field::RoadType => set(&mut record.road_type, parse_text(value)),
        Field::Utilities => set(&mut record.utilities, parse_text(value)),
        Field::CensusTract => set(&mut record.census_tract, parse_text(value)),
        Field::CensusBlock => set(&mut record.census_block, parse_text(value)),
        Field::CensusBlockgroup => set(&mut record.census_blockgroup, parse_text(value)),
        Field::OpportunityZone => set(&mut record.opportunity_zone, parse_flag(value)),
        Field::SchoolDistrict => set(&mut record.school_district, parse_text(value)),
        Field::FipsCode => set(&mut record.fips_code, parse_text(value)),
        Field::CleanGreenLandValue => set(&mut record.clean_green_land_value, parse_number(value)),
        Field::CleanGreenTotalValue => {
            set(&mut record.clean_green_total_value, parse_number(value))
        }
        Field::Homestead => set(&mut record.homestead, parse_flag(value)),
    }
}

/// Trimmed, whitespace-collapsed text; placeholders and blanks are `None`.
pub fn parse_text(raw: &str) -> Option<String> {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() || PLACEHOLDERS.contains(&text.to_lowercase().as_str()) {
        return None;
    }
    Some(text)
}

/// Parses the first number in a value after dropping currency symbols and
/// thousands separators. "$1,234.50 deposit" -> 1234.5, "N/A" -> None.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String =
        raw.chars().filter(|c| !matches!(c, ',' | '$' | '€' | '£' | '¥')).collect();

    NUMBER.find(&cleaned)?.as_str().parse().ok()
}

/// Non-negative whole number, truncating any fraction.
pub fn parse_integer(raw: &str) -> Option<u32> {
    let n = parse_number(raw)?;
    if n.is_finite() && n >= 0.0 && n <= u32::MAX as f64 {
        Some(n.trunc() as u32)
    } else {
        None
    }
}

/// "yes" (any case) is true, any other non-blank value is false.
pub fn parse_flag(raw: &str) -> Option<bool> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.eq_ignore_ascii_case("yes"))
}

/// Result of splitting a one-line situs address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub street: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

/// Splits "123 Main St, Springfield, IL 62701". Unrecognised shapes keep the
/// whole value as the street.
pub fn parse_address(raw: &str) -> ParsedAddress {
    let raw = raw.trim();
    match FULL_ADDRESS.captures(raw) {
        Some(caps) => ParsedAddress {
            street: caps[1].trim().to_string(),
            city: Some(caps[2].trim().to_string()),
            state: Some(caps[3].to_uppercase()),
            zip: Some(caps[4].to_string()),
        },
        None => ParsedAddress { street: raw.to_string(), city: None, state: None, zip: None },
    }
}

/// Parses a "lat, lon" or "lat lon" pair. WKT points ("POINT(lon lat)") and
/// pairs whose first value cannot be a latitude are read as lon/lat.
pub fn parse_centroid(raw: &str) -> Option<(f64, f64)> {
    let numbers: Vec<f64> =
        NUMBER.find_iter(raw).filter_map(|m| m.as_str().parse().ok()).take(2).collect();
    let (a, b) = match numbers.as_slice() {
        [a, b] => (*a, *b),
        _ => return None,
    };

    let lon_first = raw.trim_start().to_lowercase().starts_with("point") || a.abs() > 90.0;
    let (lat, lon) = if lon_first { (b, a) } else { (a, b) };

    if lat.abs() > 90.0 || lon.abs() > 180.0 {
        return None;
    }
    Some((lat, lon))
}
