//! Retry/fallback state machine driving one extraction request.

use crate::config::Config;
use crate::regrid::error::ExtractionFailure;
use crate::regrid::jurisdiction::BoundsTable;
use crate::regrid::mapper::FieldMapper;
use crate::regrid::models::{
    AttemptOutcome, AttemptRecord, LocationDiagnostics, PropertyRecord, SearchInput,
    SearchStrategy,
};
use crate::regrid::panel::{self, PanelReadiness, ReadinessSettings};
use crate::regrid::quality;
use crate::regrid::session::BrowserSession;
use crate::regrid::strategy;
use crate::regrid::validator::LocationValidator;
use anyhow::{Context, Result};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timing and endpoint settings for an [`Extractor`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSettings {
    /// Map viewer root, e.g. `https://app.regrid.com`
    pub base_url: String,
    /// Wait after loading the jurisdiction map view
    pub navigation_settle: Duration,
    /// Wait for autocomplete suggestions after typing
    pub suggestion_wait: Duration,
    /// Wait after selecting a suggestion
    pub panel_settle: Duration,
    pub readiness: ReadinessSettings,
}

impl ExtractionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            navigation_settle: Duration::from_millis(config.navigation_settle_ms),
            suggestion_wait: Duration::from_millis(config.suggestion_wait_ms),
            panel_settle: Duration::from_millis(config.panel_settle_ms),
            readiness: ReadinessSettings {
                attempts: config.readiness_attempts,
                interval: Duration::from_millis(config.readiness_interval_ms),
                min_entries: config.readiness_min_entries,
            },
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Where a request currently is in the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionState {
    Pending,
    Searching(SearchStrategy),
    Extracting,
    Validating,
    Accepted,
    Rejected,
}

impl fmt::Display for ExtractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionState::Pending => write!(f, "pending"),
            ExtractionState::Searching(strategy) => write!(f, "searching {}", strategy),
            ExtractionState::Extracting => write!(f, "extracting"),
            ExtractionState::Validating => write!(f, "validating"),
            ExtractionState::Accepted => write!(f, "accepted"),
            ExtractionState::Rejected => write!(f, "rejected"),
        }
    }
}

fn transition(state: &mut ExtractionState, next: ExtractionState) {
    debug!("{} -> {}", state, next);
    *state = next;
}

/// Runs search strategies against a session until one yields a record that
/// passes location validation.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    settings: ExtractionSettings,
    mapper: FieldMapper,
    validator: LocationValidator,
}

impl Extractor {
    pub fn new(settings: ExtractionSettings, bounds: BoundsTable) -> Self {
        Self { settings, mapper: FieldMapper::new(), validator: LocationValidator::new(bounds) }
    }

    /// Builds an extractor from configuration, layering configured
    /// bounding boxes over the built-in ones.
    pub fn from_config(config: &Config) -> Self {
        Self::new(ExtractionSettings::from_config(config), config.bounds_table())
    }

    /// Extracts and validates one parcel.
    ///
    /// Strategies run strictly in order and each is tried once. Every attempt
    /// starts from the jurisdiction's default map view, so a retry always
    /// follows a fresh navigation. Session failures abort immediately.
    pub async fn extract_property<S: BrowserSession + ?Sized>(
        &self,
        session: &S,
        input: &SearchInput,
    ) -> Result<PropertyRecord, ExtractionFailure> {
        let strategies = strategy::plan(input);
        let map_url = input.jurisdiction.map_url(&self.settings.base_url);

        info!(
            "Extracting parcel {} in {} ({} strategies)",
            input.parcel_id,
            input.jurisdiction,
            strategies.len()
        );

        let mut state = ExtractionState::Pending;
        let mut attempts: Vec<AttemptRecord> = Vec::with_capacity(strategies.len());
        let mut best: Option<PropertyRecord> = None;
        let mut last_diagnostics: Option<LocationDiagnostics> = None;

        for (index, strategy) in strategies.iter().enumerate() {
            if index > 0 {
                debug!("Resetting to default map view before {}", strategy);
            }
            transition(&mut state, ExtractionState::Searching(strategy.clone()));

            self.search(session, &map_url, strategy).await.map_err(ExtractionFailure::Session)?;

            transition(&mut state, ExtractionState::Extracting);
            let raw = match self.read_panel(session).await.map_err(ExtractionFailure::Session)? {
                PanelReadiness::Ready(raw) => raw,
                PanelReadiness::NotReady { entries_seen } => {
                    warn!("Panel not ready for {} ({} entries)", strategy, entries_seen);
                    attempts.push(AttemptRecord {
                        strategy: strategy.clone(),
                        outcome: AttemptOutcome::NotReady { entries_seen },
                    });
                    continue;
                }
            };

            transition(&mut state, ExtractionState::Validating);
            let mut record = self.mapper.map(&raw);
            let check = self.validator.validate(&record, &input.jurisdiction);

            record.data_quality_score = quality::score(&record);
            record.quality_mode = input.quality_mode;
            record.search_strategy = Some(strategy.clone());
            record.diagnostics = Some(check.diagnostics.clone());
            last_diagnostics = Some(check.diagnostics);

            if check.valid {
                attempts.push(AttemptRecord {
                    strategy: strategy.clone(),
                    outcome: AttemptOutcome::Accepted,
                });
                record.location_valid = true;
                record.validation_reason = None;
                record.attempts = attempts;
                transition(&mut state, ExtractionState::Accepted);

                info!(
                    "Accepted parcel {} via {} (quality {:.2})",
                    input.parcel_id, strategy, record.data_quality_score
                );
                return Ok(record);
            }

            let reason = check.reason.unwrap_or_else(|| "location validation failed".to_string());
            warn!("Rejected result for {}: {}", strategy, reason);
            attempts.push(AttemptRecord {
                strategy: strategy.clone(),
                outcome: AttemptOutcome::ValidationFailed { reason: reason.clone() },
            });
            record.validation_reason = Some(reason);

            let better = match &best {
                Some(current) => record.data_quality_score > current.data_quality_score,
                None => true,
            };
            if better {
                best = Some(record);
            }
        }

        transition(&mut state, ExtractionState::Rejected);

        let mut record = match best {
            Some(record) => record,
            None => PropertyRecord::failure(input, exhausted_reason(&attempts)),
        };
        record.location_valid = false;
        record.data_quality_score = quality::score(&record);
        record.attempts = attempts.clone();
        let diagnostics = last_diagnostics.or_else(|| record.diagnostics.clone());

        warn!(
            "No validated record for parcel {} after {} attempt(s)",
            input.parcel_id,
            attempts.len()
        );

        Err(ExtractionFailure::StrategiesExhausted {
            parcel_id: input.parcel_id.clone(),
            attempts,
            diagnostics,
            record: Box::new(record),
        })
    }

    /// Resets the map view, types the query and opens the first match.
    async fn search<S: BrowserSession + ?Sized>(
        &self,
        session: &S,
        map_url: &str,
        strategy: &SearchStrategy,
    ) -> Result<()> {
        session
            .navigate_to(map_url)
            .await
            .with_context(|| format!("Failed to navigate to {}", map_url))?;
        tokio::time::sleep(self.settings.navigation_settle).await;

        session
            .type_text(strategy.query())
            .await
            .with_context(|| format!("Failed to type query '{}'", strategy.query()))?;
        tokio::time::sleep(self.settings.suggestion_wait).await;

        if !session.click_first_suggestion().await.context("Failed to click suggestion")? {
            debug!("No suggestion to click, falling back to keyboard selection");
            session
                .press_arrow_down_then_confirm()
                .await
                .context("Failed to select suggestion with keyboard")?;
        }
        tokio::time::sleep(self.settings.panel_settle).await;

        Ok(())
    }

    /// Gates extraction on panel readiness. The no-results marker is only
    /// consulted while the panel shows no entries at all.
    async fn read_panel<S: BrowserSession + ?Sized>(&self, session: &S) -> Result<PanelReadiness> {
        let entries = session.query_field_entries().await.context("Failed to read panel")?;
        if entries.is_empty() {
            let text =
                session.read_document_text().await.context("Failed to read document text")?;
            if panel::shows_no_results(&text) {
                debug!("Search returned no results");
                return Ok(PanelReadiness::NotReady { entries_seen: 0 });
            }
        }

        panel::detect_readiness(session, &self.settings.readiness).await
    }
}

fn exhausted_reason(attempts: &[AttemptRecord]) -> String {
    if attempts.is_empty() {
        return "no search strategy available: parcel id and address are empty".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.strategy, a.outcome))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Extracts one parcel with an extractor built from `config`.
pub async fn extract_property<S: BrowserSession + ?Sized>(
    session: &S,
    input: &SearchInput,
    config: &Config,
) -> Result<PropertyRecord, ExtractionFailure> {
    Extractor::from_config(config).extract_property(session, input).await
}
