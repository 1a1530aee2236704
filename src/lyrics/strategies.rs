//! Extraction strategies for lyrics detail pages.
//!
//! Each strategy looks at an already-parsed document and either returns raw
//! text or `None`. They never mutate anything and never touch the network, so
//! the cascade order in `default_cascade` is the whole policy: most specific
//! markup first, the noisiest heuristic last.

use super::cleanup;
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

static SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script").expect("valid selector"));
static BODY_DESCENDANTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body *").expect("valid selector"));
static INLINE_LYRICS_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{.*"lyrics".*\}"#).expect("valid regex"));
static PRELOADED_STATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)window\.__PRELOADED_STATE__\s*=\s*JSON\.parse\('(.*?)'\);"#)
        .expect("valid regex")
});
static BACKSLASH_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(.)").expect("valid regex"));
static LINE_BREAK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Known section selectors tried after the container heuristics.
const SECTION_SELECTORS: &[&str] = &[
    r#"[class*="SongPage__Section"]"#,
    r#"[class*="lyrics"]"#,
    ".lyrics",
    "#lyrics-root",
    r#"[data-testid="lyrics"]"#,
];

pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn extract(&self, doc: &Html) -> Option<String>;
}

/// Concatenates every element matching a selector, one blank line between
/// containers. Elements nested inside another match are skipped so the same
/// text is not collected twice.
pub struct ContainerStrategy {
    name: String,
    selector: Selector,
    /// Containers at or below this many chars are ignored.
    min_chars: usize,
}

impl ContainerStrategy {
    pub fn new(name: impl Into<String>, css: &str, min_chars: usize) -> anyhow::Result<Self> {
        let selector = Selector::parse(css)
            .map_err(|e| anyhow::anyhow!("{e:?}"))
            .with_context(|| format!("parse selector {css}"))?;
        Ok(Self {
            name: name.into(),
            selector,
            min_chars,
        })
    }
}

impl ExtractionStrategy for ContainerStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, doc: &Html) -> Option<String> {
        let blocks: Vec<String> = doc
            .select(&self.selector)
            .filter(|el| {
                !el.ancestors()
                    .filter_map(ElementRef::wrap)
                    .any(|a| self.selector.matches(&a))
            })
            .map(|el| {
                let mut out = String::new();
                push_text(el, &mut out);
                out.trim().to_string()
            })
            .filter(|text| !text.is_empty() && text.chars().count() > self.min_chars)
            .collect();

        if blocks.is_empty() {
            None
        } else {
            Some(blocks.join("\n\n"))
        }
    }
}

/// Inline script carrying `{"lyrics": {"plain": "..."}}`.
pub struct EmbeddedJsonStrategy;

impl ExtractionStrategy for EmbeddedJsonStrategy {
    fn name(&self) -> &str {
        "embedded-json"
    }

    fn extract(&self, doc: &Html) -> Option<String> {
        doc.select(&SCRIPT).find_map(|script| {
            let content: String = script.text().collect();
            if !content.contains("\"lyrics\"") || !content.contains("\"plain\"") {
                return None;
            }
            let blob = INLINE_LYRICS_JSON.find(&content)?;
            let value: serde_json::Value = serde_json::from_str(blob.as_str()).ok()?;
            let plain = value["lyrics"]["plain"].as_str()?.trim();
            (!plain.is_empty()).then(|| plain.to_string())
        })
    }
}

/// `window.__PRELOADED_STATE__ = JSON.parse('...')` with the lyrics body as
/// an HTML fragment.
pub struct PreloadedStateStrategy;

impl ExtractionStrategy for PreloadedStateStrategy {
    fn name(&self) -> &str {
        "preloaded-state"
    }

    fn extract(&self, doc: &Html) -> Option<String> {
        doc.select(&SCRIPT).find_map(|script| {
            let content: String = script.text().collect();
            let raw = PRELOADED_STATE.captures(&content)?.get(1)?.as_str();
            let unescaped = BACKSLASH_ESCAPE.replace_all(raw, "$1");
            let state: serde_json::Value = serde_json::from_str(&unescaped).ok()?;
            let html = state["songPage"]["lyricsData"]["body"]["html"].as_str()?;
            let with_breaks = LINE_BREAK_TAG.replace_all(html, "\n");
            let text = cleanup::unescape_html(&ANY_TAG.replace_all(&with_breaks, ""));
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
    }
}

/// Last resort: the first element whose text is long, spans several lines,
/// has few child elements and carries none of the boilerplate markers.
pub struct LongTextBlockStrategy {
    pub min_chars: usize,
    pub max_children: usize,
    pub deny_markers: Vec<String>,
}

impl Default for LongTextBlockStrategy {
    fn default() -> Self {
        Self {
            min_chars: 100,
            max_children: 10,
            deny_markers: vec!["©".into(), "cookie".into(), "privacy".into()],
        }
    }
}

impl ExtractionStrategy for LongTextBlockStrategy {
    fn name(&self) -> &str {
        "long-text-block"
    }

    fn extract(&self, doc: &Html) -> Option<String> {
        doc.select(&BODY_DESCENDANTS)
            .filter(|el| !is_non_content(el.value().name()))
            .filter(|el| {
                el.children().filter(|c| c.value().is_element()).count() < self.max_children
            })
            .find_map(|el| {
                let mut text = String::new();
                push_text(el, &mut text);
                let text = text.trim();
                if text.chars().count() <= self.min_chars || !text.contains('\n') {
                    return None;
                }
                let lower = text.to_lowercase();
                if self.deny_markers.iter().any(|m| lower.contains(m.as_str())) {
                    return None;
                }
                Some(text.to_string())
            })
    }
}

/// Build the cascade in the order it must run. `extra_selectors` are tried
/// right after the built-in section selectors.
pub fn default_cascade(extra_selectors: &[String]) -> anyhow::Result<Vec<Box<dyn ExtractionStrategy>>> {
    let mut cascade: Vec<Box<dyn ExtractionStrategy>> = vec![
        Box::new(ContainerStrategy::new(
            "lyrics-container",
            r#"[data-lyrics-container="true"]"#,
            0,
        )?),
        Box::new(ContainerStrategy::new(
            "lyrics-container-class",
            r#"div[class*="Lyrics__Container"]"#,
            0,
        )?),
        Box::new(ContainerStrategy::new(
            "lyrics-class",
            r#"div[class*="lyrics"]"#,
            20,
        )?),
    ];

    for css in SECTION_SELECTORS.iter().copied() {
        cascade.push(Box::new(ContainerStrategy::new(format!("section {css}"), css, 50)?));
    }
    for css in extra_selectors {
        cascade.push(Box::new(ContainerStrategy::new(format!("configured {css}"), css, 50)?));
    }

    cascade.push(Box::new(EmbeddedJsonStrategy));
    cascade.push(Box::new(PreloadedStateStrategy));
    cascade.push(Box::new(LongTextBlockStrategy::default()));
    Ok(cascade)
}

fn is_non_content(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "noscript" | "template" | "svg")
}

/// Text content of an element with `<br>` as a line break and block
/// elements ending their line.
fn push_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) if e.name() == "br" => out.push('\n'),
            Node::Element(e) if is_non_content(e.name()) => {}
            Node::Element(e) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    push_text(child_el, out);
                }
                if matches!(e.name(), "p" | "div" | "li") {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(strategy: &dyn ExtractionStrategy, html: &str) -> Option<String> {
        strategy.extract(&Html::parse_document(html))
    }

    #[test]
    fn test_container_joins_blocks_and_keeps_breaks() {
        let s = ContainerStrategy::new("c", r#"[data-lyrics-container="true"]"#, 0).unwrap();
        let html = r#"<body>
            <div data-lyrics-container="true">Line one<br>Line <a href="/x">two</a></div>
            <div data-lyrics-container="true">Line three</div>
        </body>"#;
        assert_eq!(run(&s, html).unwrap(), "Line one\nLine two\n\nLine three");
    }

    #[test]
    fn test_container_skips_nested_matches() {
        let s = ContainerStrategy::new("c", r#"div[class*="lyrics"]"#, 0).unwrap();
        let html = r#"<div class="lyrics-outer"><div class="lyrics-inner">only once</div></div>"#;
        assert_eq!(run(&s, html).unwrap(), "only once");
    }

    #[test]
    fn test_container_threshold_filters_short_blocks() {
        let s = ContainerStrategy::new("c", r#"div[class*="lyrics"]"#, 20).unwrap();
        let html = r#"<div class="lyrics-nav">Lyrics</div>"#;
        assert_eq!(run(&s, html), None);
    }

    #[test]
    fn test_container_ignores_script_text() {
        let s = ContainerStrategy::new("c", r#"[data-lyrics-container="true"]"#, 0).unwrap();
        let html = r#"<div data-lyrics-container="true"><script>var x = 1;</script>Sing</div>"#;
        assert_eq!(run(&s, html).unwrap(), "Sing");
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        assert!(ContainerStrategy::new("bad", "div[[", 0).is_err());
    }

    #[test]
    fn test_embedded_json() {
        let html = r#"<html><head><script>window.data = {"lyrics": {"plain": "From the script\nline two"}};</script></head><body></body></html>"#;
        assert_eq!(
            run(&EmbeddedJsonStrategy, html).unwrap(),
            "From the script\nline two"
        );
    }

    #[test]
    fn test_embedded_json_ignores_unrelated_scripts() {
        let html = r#"<script>var lyrics = "nothing";</script>"#;
        assert_eq!(run(&EmbeddedJsonStrategy, html), None);
    }

    #[test]
    fn test_preloaded_state() {
        let html = r#"<script>window.__PRELOADED_STATE__ = JSON.parse('{\"songPage\":{\"lyricsData\":{\"body\":{\"html\":\"<p>Rock &amp; roll<br>all night<\/p>\"}}}}');</script>"#;
        assert_eq!(
            run(&PreloadedStateStrategy, html).unwrap(),
            "Rock & roll\nall night"
        );
    }

    #[test]
    fn test_long_block_skips_boilerplate() {
        let legal = "We use cookies to improve your experience.\n".repeat(5);
        let verse = "Walking down the empty road tonight\n".repeat(5);
        let html = format!(
            "<body><footer><p>{legal}</p></footer><section><p>{verse}</p></section></body>"
        );
        let text = run(&LongTextBlockStrategy::default(), &html).unwrap();
        assert!(text.starts_with("Walking down the empty road tonight"));
        assert!(!text.contains("cookies"));
    }

    #[test]
    fn test_long_block_requires_multiple_lines() {
        let html = format!("<body><p>{}</p></body>", "x".repeat(300));
        assert_eq!(run(&LongTextBlockStrategy::default(), &html), None);
    }

    #[test]
    fn test_default_cascade_order() {
        let cascade = default_cascade(&["article.song-text".to_string()]).unwrap();
        let names: Vec<&str> = cascade.iter().map(|s| s.name()).collect();
        assert_eq!(names.first(), Some(&"lyrics-container"));
        assert_eq!(names.last(), Some(&"long-text-block"));
        let configured = names.iter().position(|n| n.starts_with("configured")).unwrap();
        let embedded = names.iter().position(|n| *n == "embedded-json").unwrap();
        assert!(configured < embedded);
    }
}
