//! Parcel extraction command implementation.

use crate::config::Config;
use crate::format::Formatter;
use crate::regrid::{
    BrowserSession, ExtractionFailure, Extractor, PropertyRecord, SearchInput, SnapshotSession,
};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Runs the full extraction pipeline for one or more parcels.
pub struct ExtractCommand {
    config: Config,
}

impl ExtractCommand {
    /// Creates a new extract command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Extracts a parcel by replaying recorded panels from `snapshots`.
    pub async fn execute(&self, snapshots: &Path, input: &SearchInput) -> Result<String> {
        let session = SnapshotSession::new(snapshots).context("Failed to open snapshot session")?;

        self.execute_with_session(&session, input).await
    }

    /// Extracts a parcel with a provided session (for testing).
    ///
    /// Exhausted searches still produce output (the best-effort record with
    /// diagnostics); session failures are returned as errors.
    pub async fn execute_with_session<S: BrowserSession + ?Sized>(
        &self,
        session: &S,
        input: &SearchInput,
    ) -> Result<String> {
        info!("Extracting parcel {} ({})", input.parcel_id, input.jurisdiction);

        let extractor = Extractor::from_config(&self.config);
        let formatter = Formatter::new(self.config.format);

        match extractor.extract_property(session, input).await {
            Ok(record) => Ok(formatter.format_record(&record)),
            Err(ExtractionFailure::Session(e)) => {
                Err(e.context(format!("Extraction aborted for parcel {}", input.parcel_id)))
            }
            Err(failure) => Ok(formatter.format_failure(&failure)),
        }
    }

    /// Extracts several parcels by replaying recorded panels.
    pub async fn execute_batch(&self, snapshots: &Path, inputs: &[SearchInput]) -> Result<String> {
        let session = SnapshotSession::new(snapshots).context("Failed to open snapshot session")?;

        self.execute_batch_with_session(&session, inputs).await
    }

    /// Extracts several parcels with a provided session (for testing).
    pub async fn execute_batch_with_session<S: BrowserSession + ?Sized>(
        &self,
        session: &S,
        inputs: &[SearchInput],
    ) -> Result<String> {
        let extractor = Extractor::from_config(&self.config);
        let mut records: Vec<PropertyRecord> = Vec::with_capacity(inputs.len());

        for input in inputs {
            match extractor.extract_property(session, input).await {
                Ok(record) => records.push(record),
                Err(ExtractionFailure::Session(e)) => {
                    eprintln!("Failed to extract {}: {:#}", input.parcel_id, e);
                }
                Err(failure) => {
                    warn!("{}", failure);
                    records.extend(failure.into_record());
                }
            }
        }

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_records(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::regrid::{Jurisdiction, RawFieldMap, ScrollDirection};
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Session whose browser has gone away.
    struct DeadSession;

    #[async_trait]
    impl BrowserSession for DeadSession {
        async fn navigate_to(&self, _url: &str) -> Result<()> {
            anyhow::bail!("Simulated browser crash")
        }

        async fn type_text(&self, _text: &str) -> Result<()> {
            Ok(())
        }

        async fn click_first_suggestion(&self) -> Result<bool> {
            Ok(false)
        }

        async fn press_arrow_down_then_confirm(&self) -> Result<()> {
            Ok(())
        }

        async fn read_document_text(&self) -> Result<String> {
            Ok(String::new())
        }

        async fn query_field_entries(&self) -> Result<RawFieldMap> {
            Ok(RawFieldMap::new())
        }

        async fn expand_collapsed_sections(&self) -> Result<()> {
            Ok(())
        }

        async fn scroll_panel(&self, _direction: ScrollDirection) -> Result<()> {
            Ok(())
        }
    }

    fn make_test_config(format: OutputFormat) -> Config {
        Config {
            format,
            navigation_settle_ms: 0,
            suggestion_wait_ms: 0,
            panel_settle_ms: 0,
            readiness_interval_ms: 0,
            ..Config::default()
        }
    }

    fn make_panel_html(state: &str, lat: f64, lon: f64) -> String {
        format!(
            r#"<html><body><div class="panel">
                <div class="field"><span class="field-label">Parcel ID</span><span class="field-value">0309015000000</span></div>
                <div class="field"><span class="field-label">Owner</span><span class="field-value">SMITH JOHN</span></div>
                <div class="field"><span class="field-label">Parcel Address</span><span class="field-value">815 3RD AVE</span></div>
                <div class="field"><span class="field-label">Parcel Address City</span><span class="field-value">ALTOONA</span></div>
                <div class="field"><span class="field-label">Parcel Address State</span><span class="field-value">{}</span></div>
                <div class="field"><span class="field-label">Latitude</span><span class="field-value">{}</span></div>
                <div class="field"><span class="field-label">Longitude</span><span class="field-value">{}</span></div>
            </div></body></html>"#,
            state, lat, lon
        )
    }

    fn blair(parcel: &str) -> SearchInput {
        SearchInput::new(parcel, Jurisdiction::new("PA", "Blair"))
    }

    #[tokio::test]
    async fn test_extract_from_snapshots() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("0309015000000.html"), make_panel_html("PA", 40.51, -78.40))
            .unwrap();

        let cmd = ExtractCommand::new(make_test_config(OutputFormat::Table));
        let output = cmd.execute(dir.path(), &blair("03-09-015-000-00-000")).await.unwrap();

        assert!(output.contains("815 3RD AVE, ALTOONA, PA"));
        assert!(output.contains("Valid:        yes"));
    }

    #[tokio::test]
    async fn test_exhausted_search_still_renders() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("0309015000000.html"), make_panel_html("OH", 39.96, -82.99))
            .unwrap();

        let cmd = ExtractCommand::new(make_test_config(OutputFormat::Table));
        let output = cmd.execute(dir.path(), &blair("03-09-015-000-00-000")).await.unwrap();

        assert!(output.starts_with("FAILED:"));
        assert!(output.contains("Actual state:   OH"));
    }

    #[tokio::test]
    async fn test_session_failure_is_error() {
        let cmd = ExtractCommand::new(make_test_config(OutputFormat::Table));
        let err = cmd.execute_with_session(&DeadSession, &blair("12-345")).await.unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.contains("Extraction aborted for parcel 12-345"));
        assert!(message.contains("Simulated browser crash"));
    }

    #[tokio::test]
    async fn test_missing_snapshot_dir() {
        let cmd = ExtractCommand::new(make_test_config(OutputFormat::Table));
        let result = cmd.execute(Path::new("/nonexistent/snapshots"), &blair("12-345")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_batch_mixes_success_and_failure() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("12345.html"), make_panel_html("PA", 40.51, -78.40))
            .unwrap();

        let cmd = ExtractCommand::new(make_test_config(OutputFormat::Csv));
        let output = cmd
            .execute_batch(dir.path(), &[blair("12-345"), blair("99-999")])
            .await
            .unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(",true,parcel,12345,"));
        assert!(lines[2].starts_with("99-999,"));
        assert!(lines[2].contains(",false,"));
    }

    #[tokio::test]
    async fn test_batch_skips_session_failures() {
        let cmd = ExtractCommand::new(make_test_config(OutputFormat::Json));
        let output = cmd.execute_batch_with_session(&DeadSession, &[blair("12-345")]).await;
        assert_eq!(tokio_test::assert_ok!(output), "[]");
    }
}
