//! Detail panel parsing and readiness detection.

use crate::regrid::models::RawFieldMap;
use crate::regrid::selectors::{panel, results};
use crate::regrid::session::{BrowserSession, ScrollDirection};
use anyhow::Result;
use regex_lite::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Polling parameters for [`detect_readiness`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadinessSettings {
    /// Number of polls before giving up
    pub attempts: u32,
    /// Wait before each poll
    pub interval: Duration,
    /// Panel is ready once it shows more entries than this
    pub min_entries: usize,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self { attempts: 5, interval: Duration::from_millis(1000), min_entries: 5 }
    }
}

/// Outcome of polling the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelReadiness {
    /// Enough entries rendered; carries the last polled map
    Ready(RawFieldMap),
    NotReady { entries_seen: usize },
}

impl PanelReadiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, PanelReadiness::Ready(_))
    }
}

/// Waits for the detail panel to render enough field entries.
///
/// Section expansion and scrolling are best effort. A panel that never
/// fills is reported as [`PanelReadiness::NotReady`], not as an error;
/// only session failures while reading entries are returned as errors.
pub async fn detect_readiness<S: BrowserSession + ?Sized>(
    session: &S,
    settings: &ReadinessSettings,
) -> Result<PanelReadiness> {
    if let Err(e) = session.expand_collapsed_sections().await {
        warn!("Failed to expand panel sections: {}", e);
    }

    for direction in [ScrollDirection::Bottom, ScrollDirection::Top] {
        if let Err(e) = session.scroll_panel(direction).await {
            warn!("Failed to scroll panel ({:?}): {}", direction, e);
        }
    }

    let mut entries_seen = 0;
    for attempt in 1..=settings.attempts {
        tokio::time::sleep(settings.interval).await;

        let entries = session.query_field_entries().await?;
        entries_seen = entries.len();
        trace!("Readiness poll {}/{}: {} entries", attempt, settings.attempts, entries_seen);

        if entries_seen > settings.min_entries {
            debug!("Panel ready after {} poll(s) with {} entries", attempt, entries_seen);
            return Ok(PanelReadiness::Ready(entries));
        }
    }

    debug!("Panel not ready after {} polls ({} entries)", settings.attempts, entries_seen);
    Ok(PanelReadiness::NotReady { entries_seen })
}

static NO_RESULTS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let phrases: Vec<String> = results::NO_RESULTS.iter().map(|p| regex_lite::escape(p)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", phrases.join("|"))).unwrap()
});

/// True if the document text shows an empty search result.
///
/// Markers match as whole phrases, so "10 results" is not "0 results".
pub fn shows_no_results(document_text: &str) -> bool {
    NO_RESULTS_PATTERN.is_match(document_text)
}

/// Parses label/value pairs out of detail panel HTML.
///
/// Field containers come first in document order, then definition lists.
/// Labels lose surrounding whitespace and a trailing colon; empty labels are
/// skipped and duplicate labels keep their first value.
pub fn parse_field_entries(html: &str) -> RawFieldMap {
    let document = Html::parse_document(html);
    let mut map = RawFieldMap::new();

    for field in document.select(&panel::FIELD) {
        let Some(label) = field.select(&panel::LABEL).next().map(normalized_text) else {
            continue;
        };
        let value = field.select(&panel::VALUE).next().map(normalized_text).unwrap_or_default();
        insert_entry(&mut map, &label, value);
    }

    for list in document.select(&panel::DEFINITION_LIST) {
        let terms = list.select(&panel::TERM).map(normalized_text);
        let definitions = list.select(&panel::DEFINITION).map(normalized_text);
        for (label, value) in terms.zip(definitions) {
            insert_entry(&mut map, &label, value);
        }
    }

    trace!("Parsed {} field entries from panel HTML", map.len());
    map
}

/// Number of collapsed sections present in panel HTML.
pub fn count_collapsed_sections(html: &str) -> usize {
    Html::parse_document(html).select(&panel::COLLAPSED_SECTION).count()
}

fn insert_entry(map: &mut RawFieldMap, label: &str, value: String) {
    let label = label.trim_end_matches(':').trim_end();
    if label.is_empty() {
        return;
    }
    if !map.insert(label, value) {
        trace!("Duplicate panel label ignored: {}", label);
    }
}

fn normalized_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Session whose panel grows by a fixed number of entries per poll.
    struct GrowingPanel {
        per_poll: usize,
        polls: AtomicUsize,
        fail_expand: bool,
        fail_query: bool,
        scrolls: Mutex<Vec<ScrollDirection>>,
    }

    impl GrowingPanel {
        fn new(per_poll: usize) -> Self {
            Self {
                per_poll,
                polls: AtomicUsize::new(0),
                fail_expand: false,
                fail_query: false,
                scrolls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BrowserSession for GrowingPanel {
        async fn navigate_to(&self, _url: &str) -> Result<()> {
            Ok(())
        }

        async fn type_text(&self, _text: &str) -> Result<()> {
            Ok(())
        }

        async fn click_first_suggestion(&self) -> Result<bool> {
            Ok(true)
        }

        async fn press_arrow_down_then_confirm(&self) -> Result<()> {
            Ok(())
        }

        async fn read_document_text(&self) -> Result<String> {
            Ok(String::new())
        }

        async fn query_field_entries(&self) -> Result<RawFieldMap> {
            if self.fail_query {
                anyhow::bail!("page crashed");
            }
            let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok((0..polls * self.per_poll).map(|i| (format!("Field {}", i), "x")).collect())
        }

        async fn expand_collapsed_sections(&self) -> Result<()> {
            if self.fail_expand {
                anyhow::bail!("no toggles");
            }
            Ok(())
        }

        async fn scroll_panel(&self, direction: ScrollDirection) -> Result<()> {
            self.scrolls.lock().unwrap().push(direction);
            Ok(())
        }
    }

    fn fast(attempts: u32) -> ReadinessSettings {
        ReadinessSettings { attempts, interval: Duration::ZERO, min_entries: 5 }
    }

    #[tokio::test]
    async fn test_ready_once_threshold_exceeded() {
        let session = GrowingPanel::new(2);
        let readiness = detect_readiness(&session, &fast(5)).await.unwrap();

        // 2, 4, 6 entries: ready on the third poll
        match readiness {
            PanelReadiness::Ready(map) => assert_eq!(map.len(), 6),
            other => panic!("expected ready, got {:?}", other),
        }
        assert_eq!(session.polls.load(Ordering::SeqCst), 3);
        assert_eq!(
            *session.scrolls.lock().unwrap(),
            vec![ScrollDirection::Bottom, ScrollDirection::Top]
        );
    }

    #[tokio::test]
    async fn test_exactly_threshold_is_not_ready() {
        let session = GrowingPanel::new(0);
        let readiness = detect_readiness(&session, &fast(5)).await.unwrap();
        assert_eq!(readiness, PanelReadiness::NotReady { entries_seen: 0 });
        assert_eq!(session.polls.load(Ordering::SeqCst), 5);

        let mut settings = fast(1);
        settings.min_entries = 5;
        let session = GrowingPanel::new(5);
        let readiness = detect_readiness(&session, &settings).await.unwrap();
        assert_eq!(readiness, PanelReadiness::NotReady { entries_seen: 5 });
    }

    #[tokio::test]
    async fn test_expand_failure_is_ignored() {
        let mut session = GrowingPanel::new(10);
        session.fail_expand = true;
        let readiness = detect_readiness(&session, &fast(5)).await.unwrap();
        assert!(readiness.is_ready());
    }

    #[tokio::test]
    async fn test_query_failure_propagates() {
        let mut session = GrowingPanel::new(10);
        session.fail_query = true;
        let err = detect_readiness(&session, &fast(5)).await.unwrap_err();
        assert!(err.to_string().contains("page crashed"));
    }

    #[test]
    fn test_parse_field_entries() {
        let html = r#"
            <div class="panel">
                <div class="field">
                    <span class="field-label">  Parcel
                        ID: </span>
                    <span class="field-value"> 03-09-015 </span>
                </div>
                <div class="field">
                    <span class="field-label">Owner</span>
                    <span class="field-value">SMITH   JOHN</span>
                </div>
                <div class="field">
                    <span class="field-label">Owner</span>
                    <span class="field-value">DOE JANE</span>
                </div>
                <div class="field">
                    <span class="field-label"> </span>
                    <span class="field-value">orphan</span>
                </div>
                <div class="field"><span class="field-label">Zoning</span></div>
                <dl>
                    <dt>Census Tract</dt><dd>42013100400</dd>
                    <dt>School District</dt><dd>Altoona Area</dd>
                </dl>
            </div>"#;

        let map = parse_field_entries(html);
        let pairs: Vec<(&str, &str)> = map.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("Parcel ID", "03-09-015"),
                ("Owner", "SMITH JOHN"),
                ("Zoning", ""),
                ("Census Tract", "42013100400"),
                ("School District", "Altoona Area"),
            ]
        );
    }

    #[test]
    fn test_parse_empty_document() {
        assert!(parse_field_entries("<html><body></body></html>").is_empty());
        assert!(parse_field_entries("").is_empty());
    }

    #[test]
    fn test_shows_no_results() {
        assert!(shows_no_results("Search\nNo results found for 999"));
        assert!(shows_no_results("NO MATCHING PARCELS"));
        assert!(shows_no_results("0 results"));
        assert!(!shows_no_results("Parcel 03-09-015 Owner SMITH JOHN"));
    }

    #[test]
    fn test_result_counts_are_not_markers() {
        assert!(!shows_no_results("Showing 10 results for 815 3RD AVE"));
        assert!(!shows_no_results("20 results nearby"));
        assert!(!shows_no_results("no results foundry"));
    }

    #[test]
    fn test_count_collapsed_sections() {
        let html = r#"<div class="section collapsed"><div class="section-header">Tax</div></div>
                      <div class="section"><div class="section-header">Owner</div></div>"#;
        assert_eq!(count_collapsed_sections(html), 1);
    }
}
