//! CSS selectors for the parcel detail panel.
//!
//! Update this file when the viewer changes its panel markup, and add the
//! captured HTML as a test fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for label/value field entries.
pub mod panel {
    use super::*;

    /// Field entry container holding one label and one value.
    pub static FIELD: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".field, \
             .field-row, \
             .parcel-field, \
             .property-field, \
             tr.field",
        )
        .unwrap()
    });

    /// Label inside a field entry.
    pub static LABEL: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".field-label, \
             .field-name, \
             .key, \
             .label, \
             th",
        )
        .unwrap()
    });

    /// Value inside a field entry.
    pub static VALUE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".field-value, \
             .value, \
             .val, \
             td",
        )
        .unwrap()
    });

    /// Definition lists used by some panel sections.
    pub static DEFINITION_LIST: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("dl").unwrap());

    pub static TERM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dt").unwrap());

    pub static DEFINITION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dd").unwrap());

    /// Collapsed section toggles.
    pub static COLLAPSED_SECTION: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".section.collapsed .section-header, \
             [aria-expanded='false']",
        )
        .unwrap()
    });
}

/// Markers for empty search results.
pub mod results {
    /// Lower-case phrases shown when a search matched nothing.
    pub static NO_RESULTS: &[&str] =
        &["no results found", "no matching parcels", "no results for", "0 results"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_selectors_compile() {
        let _ = &*panel::FIELD;
        let _ = &*panel::LABEL;
        let _ = &*panel::VALUE;
        let _ = &*panel::DEFINITION_LIST;
        let _ = &*panel::TERM;
        let _ = &*panel::DEFINITION;
        let _ = &*panel::COLLAPSED_SECTION;
    }

    #[test]
    fn test_field_entry_matching() {
        let html = Html::parse_document(
            r#"<div class="field">
                <div class="field-label">Owner</div>
                <div class="field-value">SMITH JOHN</div>
            </div>"#,
        );

        let fields: Vec<_> = html.select(&panel::FIELD).collect();
        assert_eq!(fields.len(), 1);

        let label = fields[0].select(&panel::LABEL).next().map(|e| e.text().collect::<String>());
        assert_eq!(label.as_deref(), Some("Owner"));
    }

    #[test]
    fn test_collapsed_section_matching() {
        let html = Html::parse_document(
            r#"<div class="section collapsed"><h3 class="section-header">Tax</h3></div>
               <button aria-expanded="false">Census</button>
               <button aria-expanded="true">Owner</button>"#,
        );
        assert_eq!(html.select(&panel::COLLAPSED_SECTION).count(), 2);
    }
}
