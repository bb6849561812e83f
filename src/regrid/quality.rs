//! Completeness scoring for property records.

use crate::regrid::models::PropertyRecord;

/// Key fields counted by [`score`].
pub const KEY_FIELDS: [&str; 14] = [
    "regrid_uuid",
    "parcel_id",
    "address",
    "city",
    "state",
    "zip",
    "owner_name",
    "land_use",
    "lot_size_acres",
    "assessed_value",
    "latitude",
    "longitude",
    "water_service",
    "sewer_service",
];

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Presence of each key field, in [`KEY_FIELDS`] order.
pub fn key_field_presence(record: &PropertyRecord) -> [bool; 14] {
    [
        has_text(&record.regrid_uuid),
        has_text(&record.parcel_id),
        has_text(&record.address),
        has_text(&record.city),
        has_text(&record.state),
        has_text(&record.zip),
        has_text(&record.owner_name),
        has_text(&record.land_use),
        record.lot_size_acres.is_some(),
        record.assessed_value.is_some(),
        record.latitude.is_some(),
        record.longitude.is_some(),
        has_text(&record.water_service),
        has_text(&record.sewer_service),
    ]
}

/// Share of key fields present, rounded to two decimals.
pub fn score(record: &PropertyRecord) -> f64 {
    let present = key_field_presence(record).iter().filter(|p| **p).count();
    let raw = present as f64 / KEY_FIELDS.len() as f64;
    (raw * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_scores_zero() {
        let record = PropertyRecord::default();
        assert_eq!(score(&record), 0.0);
        assert!(key_field_presence(&record).iter().all(|p| !p));
    }

    #[test]
    fn test_full_record_scores_one() {
        let text = |s: &str| Some(s.to_string());
        let record = PropertyRecord {
            regrid_uuid: text("uuid"),
            parcel_id: text("0309015"),
            address: text("815 3RD AVE"),
            city: text("ALTOONA"),
            state: text("PA"),
            zip: text("16602"),
            owner_name: text("SMITH JOHN"),
            land_use: text("Residential"),
            lot_size_acres: Some(0.25),
            assessed_value: Some(120400.0),
            latitude: Some(40.51),
            longitude: Some(-78.40),
            water_service: text("Public"),
            sewer_service: text("Public"),
            ..PropertyRecord::default()
        };
        assert_eq!(score(&record), 1.0);
        assert!(key_field_presence(&record).iter().all(|p| *p));
    }

    #[test]
    fn test_rounding_and_blank_text() {
        let record = PropertyRecord {
            parcel_id: Some("0309015".to_string()),
            owner_name: Some("   ".to_string()),
            ..PropertyRecord::default()
        };
        // 1/14 = 0.0714...
        assert_eq!(score(&record), 0.07);
        let owner = KEY_FIELDS.iter().position(|f| *f == "owner_name").unwrap();
        assert!(!key_field_presence(&record)[owner]);
    }

    #[test]
    fn test_monotonic_in_key_fields() {
        let mut record = PropertyRecord::default();
        let mut scores = vec![score(&record)];

        record.regrid_uuid = Some("u".to_string());
        scores.push(score(&record));
        record.latitude = Some(40.5);
        scores.push(score(&record));
        record.longitude = Some(-78.4);
        scores.push(score(&record));
        record.zoning = Some("R1".to_string());
        scores.push(score(&record));
        record.assessed_value = Some(1.0);
        scores.push(score(&record));
        record.sewer_service = Some("Public".to_string());
        scores.push(score(&record));

        assert!(scores.windows(2).all(|w| w[1] >= w[0]), "{:?}", scores);
        assert_eq!(scores[3], scores[4]);
        assert_eq!(scores.last().copied(), Some(0.36));
    }
}
