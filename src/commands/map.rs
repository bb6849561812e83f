//! Offline mapping of saved detail panel HTML.

use crate::config::Config;
use crate::format::Formatter;
use crate::regrid::panel::parse_field_entries;
use crate::regrid::quality;
use crate::regrid::{FieldMapper, Jurisdiction, LocationValidator, PropertyRecord};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

/// Maps, validates and scores a saved panel without a browser.
pub struct MapCommand {
    config: Config,
}

impl MapCommand {
    /// Creates a new map command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Reads panel HTML from `path` and returns formatted output.
    pub fn execute(&self, path: &Path, jurisdiction: &Jurisdiction) -> Result<String> {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read panel HTML: {}", path.display()))?;

        info!("Mapping panel {} for {}", path.display(), jurisdiction);
        let record = self.map_html(&html, jurisdiction)?;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_record(&record))
    }

    /// Builds a validated, scored record from panel HTML.
    pub fn map_html(&self, html: &str, jurisdiction: &Jurisdiction) -> Result<PropertyRecord> {
        let raw = parse_field_entries(html);
        if raw.is_empty() {
            anyhow::bail!("No field entries found in panel HTML");
        }
        debug!("Found {} field entries", raw.len());

        let mut record = FieldMapper::new().map(&raw);
        let check =
            LocationValidator::new(self.config.bounds_table()).validate(&record, jurisdiction);

        record.data_quality_score = quality::score(&record);
        record.location_valid = check.valid;
        record.validation_reason = check.reason;
        record.diagnostics = Some(check.diagnostics);

        Ok(record)
    }
}
