//! Markup flattening
//!
//! Parses a session HTML document once and flattens it into an ordered list of
//! block-like elements (tag, classes, emphasis, named anchor, text). Format
//! detection and extraction work on this list only, never on the DOM.

use once_cell::sync::Lazy;
use parla_common::text::normalize_whitespace;
use scraper::{ElementRef, Html, Selector};
use std::path::Path;

use crate::error::IngestResult;

static BLOCK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, h1, h2, blockquote").expect("static selector"));
static BOLD_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("b").expect("static selector"));
static FONT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("font").expect("static selector"));
static NAMED_ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[name]").expect("static selector"));

/// Named anchor (`<a name="…">`) found inside a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub name: String,
    pub text: String,
}

/// One block-level element in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupElement {
    /// Lower-case tag name (`p`, `h1`, `h2`, `blockquote`)
    pub tag: String,
    pub classes: Vec<String>,
    /// Contains both `<b>` and `<font>` descendants
    pub emphasized: bool,
    /// First named anchor inside the element
    pub anchor: Option<Anchor>,
    /// Text nodes trimmed, space-joined and whitespace-normalized
    pub text: String,
}

impl MarkupElement {
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn has_any_class(&self, classes: &[&str]) -> bool {
        classes.iter().any(|c| self.has_class(c))
    }
}

/// Flattened document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupDocument {
    pub elements: Vec<MarkupElement>,
}

impl MarkupDocument {
    /// Parse HTML text
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let elements = document.select(&BLOCK_SELECTOR).map(flatten).collect();
        Self { elements }
    }

    /// Read and parse a document from disk
    pub fn load(path: &Path) -> IngestResult<Self> {
        let html = std::fs::read_to_string(path)?;
        Ok(Self::parse(&html))
    }

    /// Paragraph elements in document order
    pub fn paragraphs(&self) -> impl Iterator<Item = &MarkupElement> {
        self.elements.iter().filter(|e| e.is("p"))
    }

    /// True if any paragraph carries one of the given classes
    pub fn any_paragraph_with_class(&self, classes: &[&str]) -> bool {
        self.paragraphs().any(|p| p.has_any_class(classes))
    }
}

fn flatten(element: ElementRef<'_>) -> MarkupElement {
    let value = element.value();
    let anchor = element.select(&NAMED_ANCHOR_SELECTOR).next().map(|a| Anchor {
        name: a.value().attr("name").unwrap_or_default().trim().to_string(),
        text: element_text(a),
    });

    MarkupElement {
        tag: value.name().to_ascii_lowercase(),
        classes: value.classes().map(str::to_string).collect(),
        emphasized: element.select(&BOLD_SELECTOR).next().is_some()
            && element.select(&FONT_SELECTOR).next().is_some(),
        anchor,
        text: element_text(element),
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    let joined = element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_whitespace(&joined)
}
