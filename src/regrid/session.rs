//! Browser session abstraction driven by the extraction pipeline.

use crate::regrid::models::RawFieldMap;
use anyhow::Result;
use async_trait::async_trait;

/// Direction for panel scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Bottom of the detail panel, forces lazy sections to render
    Bottom,
    Top,
}

/// Live map viewer session - enables mocking and offline replay.
///
/// Implementations own any page state behind interior mutability; the
/// extraction pipeline is the only caller issuing navigation and typing.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Loads a URL and resets any open search or panel.
    async fn navigate_to(&self, url: &str) -> Result<()>;

    /// Types text into the viewer's search box.
    async fn type_text(&self, text: &str) -> Result<()>;

    /// Clicks the first autocomplete suggestion. Returns false if none was shown.
    async fn click_first_suggestion(&self) -> Result<bool>;

    /// Keyboard fallback for suggestion selection.
    async fn press_arrow_down_then_confirm(&self) -> Result<()>;

    /// Visible text of the whole document.
    async fn read_document_text(&self) -> Result<String>;

    /// Label/value pairs currently rendered in the detail panel.
    async fn query_field_entries(&self) -> Result<RawFieldMap>;

    /// Opens every collapsed panel section.
    async fn expand_collapsed_sections(&self) -> Result<()>;

    async fn scroll_panel(&self, direction: ScrollDirection) -> Result<()>;
}
