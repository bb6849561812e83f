//! Offline browser session replaying recorded panel HTML.

use crate::regrid::models::RawFieldMap;
use crate::regrid::panel;
use crate::regrid::session::{BrowserSession, ScrollDirection};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct PageState {
    url: Option<String>,
    query: Option<String>,
    /// HTML of the currently open detail panel
    panel_html: Option<String>,
}

/// Session over a directory of `<query>.html` snapshots.
///
/// Selecting a suggestion opens the snapshot recorded for the typed query;
/// navigating anywhere closes it again.
#[derive(Debug)]
pub struct SnapshotSession {
    dir: PathBuf,
    state: Mutex<PageState>,
}

impl SnapshotSession {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            anyhow::bail!("Snapshot directory not found: {}", dir.display());
        }
        Ok(Self { dir, state: Mutex::new(PageState::default()) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot path for a query ("123 Main St" -> "123_Main_St.html").
    pub fn snapshot_path(&self, query: &str) -> PathBuf {
        self.dir.join(format!("{}.html", snapshot_name(query)))
    }

    /// URL of the last navigation, if any.
    pub async fn current_url(&self) -> Option<String> {
        self.state.lock().await.url.clone()
    }

    async fn open_snapshot(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(query) = state.query.clone() else {
            return Ok(false);
        };

        let path = self.snapshot_path(&query);
        if !path.is_file() {
            debug!("No snapshot for '{}' ({})", query, path.display());
            return Ok(false);
        }

        let html = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        debug!("Opened snapshot {}", path.display());
        state.panel_html = Some(html);
        Ok(true)
    }
}

/// File stem for a query; anything but ASCII alphanumerics becomes `_`.
pub fn snapshot_name(query: &str) -> String {
    query.trim().chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect()
}

#[async_trait]
impl BrowserSession for SnapshotSession {
    async fn navigate_to(&self, url: &str) -> Result<()> {
        trace!("navigate {}", url);
        let mut state = self.state.lock().await;
        *state = PageState { url: Some(url.to_string()), ..PageState::default() };
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.query = Some(text.to_string());
        state.panel_html = None;
        Ok(())
    }

    async fn click_first_suggestion(&self) -> Result<bool> {
        self.open_snapshot().await
    }

    async fn press_arrow_down_then_confirm(&self) -> Result<()> {
        self.open_snapshot().await.map(|_| ())
    }

    async fn read_document_text(&self) -> Result<String> {
        let state = self.state.lock().await;
        Ok(match &state.panel_html {
            Some(html) => scraper::Html::parse_document(html).root_element().text().collect(),
            None if state.query.is_some() => "No results found".to_string(),
            None => String::new(),
        })
    }

    async fn query_field_entries(&self) -> Result<RawFieldMap> {
        let state = self.state.lock().await;
        Ok(state.panel_html.as_deref().map(panel::parse_field_entries).unwrap_or_default())
    }

    async fn expand_collapsed_sections(&self) -> Result<()> {
        let state = self.state.lock().await;
        if let Some(html) = &state.panel_html {
            trace!("{} collapsed section(s) in snapshot", panel::count_collapsed_sections(html));
        }
        Ok(())
    }

    async fn scroll_panel(&self, _direction: ScrollDirection) -> Result<()> {
        Ok(())
    }
}
