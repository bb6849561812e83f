//! Output formatting for property records (table, JSON, markdown, CSV).

use crate::config::OutputFormat;
use crate::regrid::error::ExtractionFailure;
use crate::regrid::models::{AttemptRecord, LocationDiagnostics, PropertyRecord, SearchStrategy};

/// Formats records, failures and strategy plans for output.
pub struct Formatter {
    format: OutputFormat,
}

fn text(label: &'static str, value: &Option<String>) -> Option<(&'static str, String)> {
    value.as_ref().map(|v| (label, v.clone()))
}

fn number(label: &'static str, value: Option<f64>) -> Option<(&'static str, String)> {
    value.map(|v| (label, format_number(v)))
}

fn money(label: &'static str, value: Option<f64>) -> Option<(&'static str, String)> {
    value.map(|v| (label, format!("${:.2}", v)))
}

fn integer(label: &'static str, value: Option<u32>) -> Option<(&'static str, String)> {
    value.map(|v| (label, v.to_string()))
}

fn flag(label: &'static str, value: Option<bool>) -> Option<(&'static str, String)> {
    value.map(|v| (label, if v { "Yes" } else { "No" }.to_string()))
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        v.to_string()
    }
}

/// Present canonical fields in display order.
fn record_fields(record: &PropertyRecord) -> Vec<(&'static str, String)> {
    [
        text("Parcel ID", &record.parcel_id),
        text("Alt Parcel ID", &record.alt_parcel_id),
        text("Regrid UUID", &record.regrid_uuid),
        text("Regrid ID", &record.regrid_id),
        text("Control No", &record.control_number),
        text("Account No", &record.account_number),
        record.full_address().map(|a| ("Address", a)),
        text("County", &record.county),
        text("Owner", &record.owner_name),
        text("Mailing", &record.mailing_address),
        text("Type", &record.property_type),
        text("Class", &record.property_class),
        text("Land Use", &record.land_use),
        text("Zoning", &record.zoning),
        text("Zoning Desc", &record.zoning_description),
        number("Acres", record.lot_size_acres),
        number("Lot Sq Ft", record.lot_size_sqft),
        text("Dimensions", &record.lot_dimensions),
        text("Terrain", &record.terrain),
        number("Elevation", record.elevation_ft),
        text("Flood Zone", &record.flood_zone),
        number("Bldg Sq Ft", record.building_sqft),
        integer("Year Built", record.year_built),
        integer("Bedrooms", record.bedrooms),
        number("Bathrooms", record.bathrooms),
        integer("Stories", record.stories),
        integer("Buildings", record.building_count),
        money("Assessed", record.assessed_value),
        money("Land Value", record.assessed_land_value),
        money("Improvements", record.assessed_improvement_value),
        money("Market Value", record.market_value),
        money("Annual Tax", record.annual_tax),
        money("Last Sale", record.last_sale_price),
        text("Sale Date", &record.last_sale_date),
        record.coordinates().map(|(lat, lon)| ("Location", format!("{:.6}, {:.6}", lat, lon))),
        text("Water", &record.water_service),
        text("Sewer", &record.sewer_service),
        text("Gas", &record.gas_service),
        text("Electric", &record.electric_service),
        text("Road", &record.road_type),
        text("Utilities", &record.utilities),
        text("Census Tract", &record.census_tract),
        text("Census Block", &record.census_block),
        text("Block Group", &record.census_blockgroup),
        flag("Opp. Zone", record.opportunity_zone),
        text("School Dist.", &record.school_district),
        text("FIPS", &record.fips_code),
        money("C&G Land", record.clean_green_land_value),
        money("C&G Total", record.clean_green_total_value),
        flag("Homestead", record.homestead),
    ]
    .into_iter()
    .flatten()
    .collect()
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a single record.
    pub fn format_record(&self, record: &PropertyRecord) -> String {
        match self.format {
            OutputFormat::Json => self.json_single(record),
            OutputFormat::Table => self.table_single(record),
            OutputFormat::Markdown => self.markdown_single(record),
            OutputFormat::Csv => self.csv_records(std::slice::from_ref(record)),
        }
    }

    /// Formats multiple records.
    pub fn format_records(&self, records: &[PropertyRecord]) -> String {
        if records.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_header(),
                _ => "No records extracted.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.table_records(records),
            OutputFormat::Markdown => self.markdown_records(records),
            OutputFormat::Csv => self.csv_records(records),
        }
    }

    /// Formats an extraction failure. Exhausted searches render their
    /// best-effort record followed by the attempt log.
    pub fn format_failure(&self, failure: &ExtractionFailure) -> String {
        let (record, attempts, diagnostics) = match failure {
            ExtractionFailure::StrategiesExhausted { record, attempts, diagnostics, .. } => {
                (&**record, attempts, diagnostics)
            }
            ExtractionFailure::Session(e) => {
                return match self.format {
                    OutputFormat::Json => serde_json::json!({ "error": format!("{:#}", e) })
                        .to_string(),
                    _ => format!("Error: {:#}", e),
                };
            }
        };

        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "error": failure.to_string(),
                "attempts": attempts,
                "diagnostics": diagnostics,
                "record": record,
            }))
            .unwrap_or_else(|_| "{}".to_string()),
            OutputFormat::Csv => self.csv_records(std::slice::from_ref(record)),
            OutputFormat::Table => {
                let mut lines = vec![format!("FAILED: {}", failure), String::new()];
                lines.push(self.table_single(record));
                if let Some(d) = diagnostics {
                    lines.push(String::new());
                    lines.extend(Self::diagnostic_lines(d));
                }
                lines.join("\n")
            }
            OutputFormat::Markdown => {
                let mut lines = vec![format!("> **Failed:** {}", failure), String::new()];
                lines.push(self.markdown_single(record));
                if let Some(d) = diagnostics {
                    lines.push(String::new());
                    lines.push("### Diagnostics".to_string());
                    lines.push(String::new());
                    lines.extend(Self::diagnostic_lines(d).into_iter().map(|l| format!("- {}", l)));
                }
                lines.join("\n")
            }
        }
    }

    /// Formats an ordered strategy plan.
    pub fn format_strategies(&self, strategies: &[SearchStrategy]) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(strategies).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Csv => {
                let mut lines = vec!["order,method,query".to_string()];
                for (i, s) in strategies.iter().enumerate() {
                    lines.push(format!("{},{},{}", i + 1, s.method(), Self::csv_escape(s.query())));
                }
                lines.join("\n")
            }
            OutputFormat::Markdown => {
                let mut lines =
                    vec!["| # | Method | Query |".to_string(), "|---|--------|-------|".to_string()];
                for (i, s) in strategies.iter().enumerate() {
                    lines.push(format!("| {} | {} | `{}` |", i + 1, s.method(), s.query()));
                }
                lines.join("\n")
            }
            OutputFormat::Table => {
                if strategies.is_empty() {
                    return "No search strategies (empty parcel id and no usable address).".to_string();
                }
                strategies
                    .iter()
                    .enumerate()
                    .map(|(i, s)| format!("{}. {:<16} {}", i + 1, s.method(), s.query()))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    }

    // JSON formatting

    fn json_single(&self, record: &PropertyRecord) -> String {
        serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string())
    }

    // Table formatting

    fn table_single(&self, record: &PropertyRecord) -> String {
        let mut lines: Vec<String> = record_fields(record)
            .into_iter()
            .map(|(label, value)| format!("{:<13} {}", format!("{}:", label), value))
            .collect();

        lines.push(format!(
            "{:<13} {}",
            "Valid:",
            if record.location_valid { "yes" } else { "no" }
        ));
        if let Some(reason) = &record.validation_reason {
            lines.push(format!("{:<13} {}", "Reason:", reason));
        }
        lines.push(format!("{:<13} {:.2}", "Quality:", record.data_quality_score));
        if let Some(strategy) = &record.search_strategy {
            lines.push(format!("{:<13} {}", "Strategy:", strategy));
        }
        if !record.attempts.is_empty() {
            lines.push(format!("{:<13} {}", "Attempts:", Self::attempt_summary(&record.attempts)));
        }
        if !record.additional_fields.is_empty() {
            lines.push(format!("{:<13} {}", "Other fields:", record.additional_fields.len()));
        }

        lines.join("\n")
    }

    fn table_records(&self, records: &[PropertyRecord]) -> String {
        let parcel_width = 20;
        let state_width = 5;
        let valid_width = 5;
        let quality_width = 7;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<parcel_width$}  {:<state_width$}  {:<valid_width$}  {:>quality_width$}  {}",
            "Parcel", "State", "Valid", "Quality", "Address"
        ));
        lines.push(format!(
            "{:-<parcel_width$}  {:-<state_width$}  {:-<valid_width$}  {:-<quality_width$}  {:-<40}",
            "", "", "", "", ""
        ));

        for record in records {
            let parcel = Self::truncate(record.parcel_id.as_deref().unwrap_or("N/A"), parcel_width);
            let address = Self::truncate(&record.full_address().unwrap_or_default(), 40);

            lines.push(format!(
                "{:<parcel_width$}  {:<state_width$}  {:<valid_width$}  {:>quality_width$.2}  {}",
                parcel,
                record.state.as_deref().unwrap_or("-"),
                if record.location_valid { "yes" } else { "no" },
                record.data_quality_score,
                address
            ));
        }

        let valid = records.iter().filter(|r| r.location_valid).count();
        lines.push(String::new());
        lines.push(format!("Total: {} records ({} valid)", records.len(), valid));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_single(&self, record: &PropertyRecord) -> String {
        let title = record
            .full_address()
            .or_else(|| record.parcel_id.clone())
            .unwrap_or_else(|| "Unknown parcel".to_string());

        let mut lines = vec![format!("## {}", title), String::new()];

        for (label, value) in record_fields(record) {
            lines.push(format!("- **{}:** {}", label, value));
        }

        let status = if record.location_valid { "✓ valid" } else { "✗ invalid" };
        lines.push(format!(
            "- **Validation:** {} (quality {:.2})",
            status, record.data_quality_score
        ));
        if let Some(reason) = &record.validation_reason {
            lines.push(format!("- **Reason:** {}", reason));
        }
        if let Some(strategy) = &record.search_strategy {
            lines.push(format!("- **Strategy:** `{}`", strategy));
        }

        if !record.additional_fields.is_empty() {
            lines.push(String::new());
            lines.push("### Other fields".to_string());
            lines.push(String::new());
            lines.push("| Label | Value |".to_string());
            lines.push("|-------|-------|".to_string());
            for (label, value) in &record.additional_fields {
                lines.push(format!("| {} | {} |", label, value.replace('|', "\\|")));
            }
        }

        lines.join("\n")
    }

    fn markdown_records(&self, records: &[PropertyRecord]) -> String {
        let mut lines = Vec::new();

        lines.push("| Parcel | State | Valid | Quality | Address |".to_string());
        lines.push("|--------|-------|-------|---------|---------|".to_string());

        for record in records {
            lines.push(format!(
                "| {} | {} | {} | {:.2} | {} |",
                record.parcel_id.as_deref().unwrap_or("N/A"),
                record.state.as_deref().unwrap_or(""),
                if record.location_valid { "✓" } else { "" },
                record.data_quality_score,
                record.full_address().unwrap_or_default()
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} records*", records.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        "parcel_id,ll_uuid,address,city,state,zip,county,owner_name,land_use,lot_size_acres,assessed_value,latitude,longitude,water_service,sewer_service,data_quality_score,location_valid,search_method,search_query,validation_reason"
            .to_string()
    }

    fn csv_records(&self, records: &[PropertyRecord]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        let t = |v: &Option<String>| v.as_deref().map(Self::csv_escape).unwrap_or_default();
        let n = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();

        for record in records {
            let (method, query) = record
                .search_strategy
                .as_ref()
                .map(|s| (s.method().to_string(), Self::csv_escape(s.query())))
                .unwrap_or_default();

            let fields = [
                t(&record.parcel_id),
                t(&record.regrid_uuid),
                t(&record.address),
                t(&record.city),
                t(&record.state),
                t(&record.zip),
                t(&record.county),
                t(&record.owner_name),
                t(&record.land_use),
                n(record.lot_size_acres),
                n(record.assessed_value),
                n(record.latitude),
                n(record.longitude),
                t(&record.water_service),
                t(&record.sewer_service),
                format!("{:.2}", record.data_quality_score),
                record.location_valid.to_string(),
                method,
                query,
                t(&record.validation_reason),
            ];
            lines.push(fields.join(","));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }

    // Shared helpers

    fn truncate(s: &str, width: usize) -> String {
        if s.chars().count() > width {
            format!("{}...", s.chars().take(width - 3).collect::<String>())
        } else {
            s.to_string()
        }
    }

    fn attempt_summary(attempts: &[AttemptRecord]) -> String {
        attempts
            .iter()
            .map(|a| format!("{} -> {}", a.strategy, a.outcome))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn diagnostic_lines(d: &LocationDiagnostics) -> Vec<String> {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        let coord = |v: Option<f64>| v.map(|x| format!("{:.6}", x)).unwrap_or_else(|| "-".into());

        let mut lines = vec![
            format!("Expected state: {}", show(&d.expected_state)),
            format!("Actual state:   {}", show(&d.actual_state)),
        ];
        if let Some(bbox) = &d.expected_bounds {
            lines.push(format!("Expected box:   {}", bbox));
        }
        lines.push(format!(
            "Actual coords:  {}, {}",
            coord(d.actual_latitude),
            coord(d.actual_longitude)
        ));
        lines.push(format!("Last address:   {}", show(&d.actual_address)));
        lines.push(format!("Last city:      {}", show(&d.actual_city)));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regrid::jurisdiction::BoundingBox;
    use crate::regrid::models::AttemptOutcome;

    fn make_record() -> PropertyRecord {
        let mut record = PropertyRecord {
            parcel_id: Some("0309015000000".to_string()),
            regrid_uuid: Some("6c0d1e0a".to_string()),
            address: Some("815 3RD AVE".to_string()),
            city: Some("ALTOONA".to_string()),
            state: Some("PA".to_string()),
            zip: Some("16602".to_string()),
            owner_name: Some("SMITH, JOHN \"JACK\"".to_string()),
            assessed_value: Some(120400.0),
            lot_size_acres: Some(0.25),
            latitude: Some(40.5123),
            longitude: Some(-78.4012),
            homestead: Some(true),
            data_quality_score: 0.64,
            location_valid: true,
            search_strategy: Some(SearchStrategy::ParcelQuery("0309015000000".to_string())),
            attempts: vec![AttemptRecord {
                strategy: SearchStrategy::ParcelQuery("0309015000000".to_string()),
                outcome: AttemptOutcome::Accepted,
            }],
            ..PropertyRecord::default()
        };
        record.additional_fields.insert("Deed Book".to_string(), "1234|56".to_string());
        record
    }

    fn make_failure() -> ExtractionFailure {
        let mut record = make_record();
        record.location_valid = false;
        record.state = Some("OH".to_string());
        record.validation_reason = Some("state mismatch: expected PA, found OH".to_string());
        ExtractionFailure::StrategiesExhausted {
            parcel_id: "03-09-015-000-00-000".to_string(),
            attempts: vec![AttemptRecord {
                strategy: SearchStrategy::ParcelQuery("0309015000000".to_string()),
                outcome: AttemptOutcome::ValidationFailed {
                    reason: "state mismatch: expected PA, found OH".to_string(),
                },
            }],
            diagnostics: Some(LocationDiagnostics {
                expected_state: Some("PA".to_string()),
                actual_state: Some("OH".to_string()),
                expected_bounds: Some(BoundingBox::new(40.25, 40.75, -78.65, -78.05)),
                ..LocationDiagnostics::default()
            }),
            record: Box::new(record),
        }
    }

    #[test]
    fn test_json_single_record() {
        let output = Formatter::new(OutputFormat::Json).format_record(&make_record());
        assert!(output.contains("\"ll_uuid\": \"6c0d1e0a\""));
        assert!(output.contains("\"assessed_value\": 120400.0"));
        assert!(output.contains("\"location_valid\": true"));
        assert!(output.contains("Deed Book"));
    }

    #[test]
    fn test_table_single_record() {
        let output = Formatter::new(OutputFormat::Table).format_record(&make_record());
        assert!(output.contains("Parcel ID:"));
        assert!(output.contains("815 3RD AVE, ALTOONA, PA 16602"));
        assert!(output.contains("$120400.00"));
        assert!(output.contains("40.512300, -78.401200"));
        assert!(output.contains("Homestead:    Yes"));
        assert!(output.contains("Quality:      0.64"));
        assert!(output.contains("Strategy:     parcel(0309015000000)"));
        assert!(output.contains("Other fields: 1"));
        assert!(!output.contains("Zoning"));
    }

    #[test]
    fn test_table_multiple_records() {
        let mut second = make_record();
        second.location_valid = false;
        second.parcel_id = Some("A-VERY-LONG-PARCEL-IDENTIFIER-0001".to_string());
        let output = Formatter::new(OutputFormat::Table).format_records(&[make_record(), second]);
        assert!(output.contains("Parcel"));
        assert!(output.contains("A-VERY-LONG-PARCE..."));
        assert!(output.contains("Total: 2 records (1 valid)"));
    }

    #[test]
    fn test_empty_records() {
        assert_eq!(Formatter::new(OutputFormat::Json).format_records(&[]), "[]");
        assert_eq!(
            Formatter::new(OutputFormat::Table).format_records(&[]),
            "No records extracted."
        );
        assert!(Formatter::new(OutputFormat::Csv).format_records(&[]).starts_with("parcel_id,"));
    }

    #[test]
    fn test_markdown_single_record() {
        let output = Formatter::new(OutputFormat::Markdown).format_record(&make_record());
        assert!(output.starts_with("## 815 3RD AVE, ALTOONA, PA 16602"));
        assert!(output.contains("- **Owner:** SMITH, JOHN \"JACK\""));
        assert!(output.contains("✓ valid"));
        assert!(output.contains("| Deed Book | 1234\\|56 |"));
    }

    #[test]
    fn test_csv_escaping() {
        let output = Formatter::new(OutputFormat::Csv).format_record(&make_record());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("0309015000000,6c0d1e0a,815 3RD AVE,ALTOONA,PA,16602,"));
        assert!(lines[1].contains("\"SMITH, JOHN \"\"JACK\"\"\""));
        assert!(lines[1].contains(",0.64,true,parcel,0309015000000,"));
    }

    #[test]
    fn test_failure_table_includes_diagnostics() {
        let output = Formatter::new(OutputFormat::Table).format_failure(&make_failure());
        assert!(output.starts_with("FAILED: all 1 search strategies exhausted"));
        assert!(output.contains("Reason:       state mismatch"));
        assert!(output.contains("Expected state: PA"));
        assert!(output.contains("Actual state:   OH"));
        assert!(output.contains("Expected box:   lat 40.25..40.75"));
    }

    #[test]
    fn test_failure_json() {
        let output = Formatter::new(OutputFormat::Json).format_failure(&make_failure());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["attempts"][0]["outcome"], "validation_failed");
        assert_eq!(value["attempts"][0]["strategy"]["method"], "parcel_query");
        assert_eq!(value["diagnostics"]["actual_state"], "OH");
        assert_eq!(value["record"]["location_valid"], false);
    }

    #[test]
    fn test_session_failure() {
        let failure = ExtractionFailure::Session(anyhow::anyhow!("browser closed"));
        let output = Formatter::new(OutputFormat::Table).format_failure(&failure);
        assert_eq!(output, "Error: browser closed");
    }

    #[test]
    fn test_strategies() {
        let strategies = vec![
            SearchStrategy::AddressQuery("123 Main St".to_string()),
            SearchStrategy::ParcelQuery("0309015".to_string()),
        ];
        let table = Formatter::new(OutputFormat::Table).format_strategies(&strategies);
        assert!(table.contains("1. address"));
        assert!(table.contains("2. parcel"));

        let csv = Formatter::new(OutputFormat::Csv).format_strategies(&strategies);
        assert_eq!(csv, "order,method,query\n1,address,123 Main St\n2,parcel,0309015");

        let empty = Formatter::new(OutputFormat::Table).format_strategies(&[]);
        assert!(empty.starts_with("No search strategies"));
    }
}
