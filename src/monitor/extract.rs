//! Title and description extraction from a video page.
//!
//! The page markup changes between site layouts, so each field is tried
//! against an ordered list of sources until one yields a non-empty value.
//! Adding support for a new layout means adding a line to a list, not
//! touching control flow.

use scraper::{ElementRef, Html, Selector};

use crate::config::GuardConfig;
use crate::protocol::VideoDetails;
use crate::surface::{DocumentSnapshot, TabSurface};

/// Suffix the site appends to the document title on watch pages.
const TITLE_SUFFIX: &str = " - YouTube";
/// Document title shown before the page has rendered a video.
const BARE_SITE_TITLE: &str = "YouTube";

/// One way of getting a field out of the document, in priority order.
#[derive(Debug, Clone, Copy)]
pub enum FieldSource {
    /// The document title minus the site suffix. Unusable while the title
    /// is empty or still the bare site name.
    DocumentTitle,
    /// First element matching a CSS selector; inner text, whitespace
    /// collapsed.
    Css(&'static str),
    /// A `<meta>` tag's `content`, matched by `property` then by `name`.
    Meta(&'static str),
}

pub const TITLE_SOURCES: &[FieldSource] = &[
    FieldSource::DocumentTitle,
    FieldSource::Css("h1.ytd-watch-metadata yt-formatted-string"),
    FieldSource::Css("h1.title.ytd-video-primary-info-renderer"),
    FieldSource::Css("#video-title"),
    FieldSource::Css("#title h1 yt-formatted-string"),
    FieldSource::Meta("og:title"),
    FieldSource::Meta("title"),
];

pub const DESCRIPTION_SOURCES: &[FieldSource] = &[
    FieldSource::Css("#description #content"),
    FieldSource::Css("#description-inline-expander .content"),
    FieldSource::Css("ytd-text-inline-expander"),
    FieldSource::Css("#watch-description-text"),
    FieldSource::Meta("og:description"),
    FieldSource::Meta("description"),
];

enum CompiledSource {
    DocumentTitle,
    Css(Selector),
    Meta { property: Selector, name: Selector },
}

pub struct Extractor {
    title_sources: Vec<CompiledSource>,
    description_sources: Vec<CompiledSource>,
}

impl Extractor {
    /// Compiles the hardcoded source lists. A malformed selector constant
    /// is a bug, so this panics rather than returning an error.
    pub fn new() -> Self {
        Self {
            title_sources: compile(TITLE_SOURCES),
            description_sources: compile(DESCRIPTION_SOURCES),
        }
    }

    /// One synchronous pass over a snapshot. Missing fields come back
    /// empty; the caller decides what that means.
    pub fn extract(&self, doc: &DocumentSnapshot) -> VideoDetails {
        let parsed = Html::parse_document(&doc.html);
        VideoDetails {
            video_title: resolve(&self.title_sources, doc, &parsed).unwrap_or_default(),
            video_description: resolve(&self.description_sources, doc, &parsed)
                .unwrap_or_default(),
        }
    }

    /// Extraction front used by the watch loop. Short descriptions get one
    /// expansion attempt: activate the "show more" control, wait for the
    /// re-render, re-sample, and keep the longer text. A still-empty
    /// description is replaced with a placeholder built from the title,
    /// because the classifier rejects requests without one.
    pub async fn extract_settled(
        &self,
        surface: &dyn TabSurface,
        config: &GuardConfig,
    ) -> VideoDetails {
        let mut details = self.extract(&surface.document());

        if details.video_description.chars().count() < config.min_description_len
            && surface.expand_description()
        {
            tokio::time::sleep(config.expansion_wait).await;
            let expanded = self.extract(&surface.document());
            if expanded.video_description.len() > details.video_description.len() {
                details.video_description = expanded.video_description;
            }
        }

        if details.video_description.is_empty() && !details.video_title.is_empty() {
            details.video_description = format!("Video: {}", details.video_title);
        }
        details
    }
}

fn compile(sources: &[FieldSource]) -> Vec<CompiledSource> {
    sources
        .iter()
        .map(|source| match source {
            FieldSource::DocumentTitle => CompiledSource::DocumentTitle,
            FieldSource::Css(selector) => CompiledSource::Css(parse_selector(selector)),
            FieldSource::Meta(name) => CompiledSource::Meta {
                property: parse_selector(&format!("meta[property=\"{name}\"]")),
                name: parse_selector(&format!("meta[name=\"{name}\"]")),
            },
        })
        .collect()
}

fn parse_selector(selector: &str) -> Selector {
    Selector::parse(selector)
        .unwrap_or_else(|err| panic!("hardcoded selector {selector:?} failed to parse: {err}"))
}

fn resolve(sources: &[CompiledSource], doc: &DocumentSnapshot, parsed: &Html) -> Option<String> {
    sources.iter().find_map(|source| {
        let value = match source {
            CompiledSource::DocumentTitle => document_title(doc),
            CompiledSource::Css(selector) => parsed.select(selector).next().map(element_text),
            CompiledSource::Meta { property, name } => parsed
                .select(property)
                .chain(parsed.select(name))
                .find_map(|element| element.value().attr("content"))
                .map(str::to_owned),
        };
        value
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty())
    })
}

fn document_title(doc: &DocumentSnapshot) -> Option<String> {
    let title = doc.title.trim();
    if title.is_empty() || title == BARE_SITE_TITLE {
        return None;
    }
    Some(title.strip_suffix(TITLE_SUFFIX).unwrap_or(title).to_owned())
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(title: &str, html: &str) -> DocumentSnapshot {
        DocumentSnapshot {
            title: title.into(),
            html: html.into(),
        }
    }

    #[test]
    fn all_hardcoded_selectors_compile() {
        // Constructs both compiled lists; a bad constant panics here.
        let _ = Extractor::new();
    }

    #[test]
    fn document_title_loses_the_site_suffix() {
        let extractor = Extractor::new();
        let details = extractor.extract(&snapshot("Learning Rust - YouTube", "<html></html>"));
        assert_eq!(details.video_title, "Learning Rust");
    }

    #[test]
    fn bare_site_title_defers_to_markup_sources() {
        let extractor = Extractor::new();
        let html = r#"<html><head>
            <meta property="og:title" content="Foo">
        </head><body></body></html>"#;
        let details = extractor.extract(&snapshot("YouTube", html));
        assert_eq!(details.video_title, "Foo");
    }

    #[test]
    fn heading_markup_beats_meta_tags() {
        let extractor = Extractor::new();
        let html = r#"<html><head>
            <meta property="og:title" content="Meta Title">
        </head><body>
            <h1 class="ytd-watch-metadata"><yt-formatted-string> Rendered  Title </yt-formatted-string></h1>
        </body></html>"#;
        let details = extractor.extract(&snapshot("", html));
        assert_eq!(details.video_title, "Rendered Title");
    }

    #[test]
    fn description_comes_from_the_inline_expander() {
        let extractor = Extractor::new();
        let html = r#"<html><body>
            <div id="description-inline-expander">
                <div class="content">A video about borrow checking.</div>
            </div>
        </body></html>"#;
        let details = extractor.extract(&snapshot("", html));
        assert_eq!(details.video_description, "A video about borrow checking.");
    }

    #[test]
    fn meta_description_is_the_fallback() {
        let extractor = Extractor::new();
        let html = r#"<html><head>
            <meta name="description" content="Fallback description.">
        </head><body></body></html>"#;
        let details = extractor.extract(&snapshot("", html));
        assert_eq!(details.video_description, "Fallback description.");
    }

    #[test]
    fn whitespace_only_matches_are_skipped() {
        let extractor = Extractor::new();
        let html = r#"<html><body>
            <div id="description"><div id="content">   </div></div>
            <meta name="description" content="Real text.">
        </body></html>"#;
        let details = extractor.extract(&snapshot("", html));
        assert_eq!(details.video_description, "Real text.");
    }

    #[test]
    fn missing_everything_yields_empty_fields() {
        let extractor = Extractor::new();
        let details = extractor.extract(&snapshot("", "<html><body></body></html>"));
        assert_eq!(details, VideoDetails::default());
    }

    mod settled {
        use super::*;
        use crate::sim::{ScriptedPage, ScriptedTab};
        use crate::protocol::TabId;
        use std::time::Duration;

        fn quick_config() -> GuardConfig {
            GuardConfig {
                expansion_wait: Duration::from_millis(5),
                ..GuardConfig::default()
            }
        }

        #[tokio::test]
        async fn synthesizes_placeholder_description_from_title() {
            let tab = ScriptedTab::new(TabId(1));
            tab.add_page(
                "https://www.youtube.com/watch?v=abc",
                ScriptedPage {
                    title: "Foo - YouTube".into(),
                    html: "<html><body></body></html>".into(),
                    expanded_html: None,
                },
            )
            .unwrap();
            tab.goto("https://www.youtube.com/watch?v=abc").unwrap();

            let extractor = Extractor::new();
            let details = extractor.extract_settled(&tab, &quick_config()).await;
            assert_eq!(details.video_title, "Foo");
            assert_eq!(details.video_description, "Video: Foo");
        }

        #[tokio::test]
        async fn short_description_is_expanded_and_resampled() {
            let tab = ScriptedTab::new(TabId(1));
            tab.add_page(
                "https://www.youtube.com/watch?v=abc",
                ScriptedPage {
                    title: "Foo - YouTube".into(),
                    html: r##"<html><body>
                        <div id="description"><div id="content">Short.</div></div>
                    </body></html>"##
                        .into(),
                    expanded_html: Some(
                        r##"<html><body>
                        <div id="description"><div id="content">The full description, long enough to keep.</div></div>
                    </body></html>"##
                            .into(),
                    ),
                },
            )
            .unwrap();
            tab.goto("https://www.youtube.com/watch?v=abc").unwrap();

            let extractor = Extractor::new();
            let details = extractor.extract_settled(&tab, &quick_config()).await;
            assert_eq!(
                details.video_description,
                "The full description, long enough to keep."
            );
        }

        #[tokio::test]
        async fn long_description_skips_expansion() {
            let tab = ScriptedTab::new(TabId(1));
            tab.add_page(
                "https://www.youtube.com/watch?v=abc",
                ScriptedPage {
                    title: "Foo - YouTube".into(),
                    html: r##"<html><body>
                        <div id="description"><div id="content">Already a description comfortably past the fifty character floor.</div></div>
                    </body></html>"##
                        .into(),
                    expanded_html: Some("<html><body></body></html>".into()),
                },
            )
            .unwrap();
            tab.goto("https://www.youtube.com/watch?v=abc").unwrap();

            let extractor = Extractor::new();
            let details = extractor.extract_settled(&tab, &GuardConfig::default()).await;
            assert!(details.video_description.starts_with("Already a description"));
            assert!(!tab.description_expanded());
        }
    }
}
