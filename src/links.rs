//! Hyperlink extraction over fetched documents.
//!
//! Anchors are re-serialized into one canonical start tag, `<a href="URL">`,
//! whatever quoting or attribute order the page used. [`uri_of`] strips that
//! exact form back down to the bare URL.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::fetcher::Document;

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

const ANCHOR_OPEN: &str = "<a href=\"";
const ANCHOR_CLOSE: &str = "\">";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Visible text, whitespace collapsed.
    pub text: String,
    /// Text exactly as it appears in the markup.
    pub raw_text: String,
    /// Canonical start tag, `<a href="URL">`.
    pub outer_html: String,
}

impl Anchor {
    pub fn href(&self) -> String {
        uri_of(&self.outer_html)
    }
}

/// First anchor of a paragraph, paired with the paragraph's own text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphAnchor {
    pub anchor_html: String,
    pub text: String,
}

impl ParagraphAnchor {
    pub fn href(&self) -> String {
        uri_of(&self.anchor_html)
    }
}

fn canonical_anchor(el: ElementRef<'_>) -> String {
    let href = el.value().attr("href").unwrap_or("").trim();
    format!("{}{}{}", ANCHOR_OPEN, href, ANCHOR_CLOSE)
}

fn visible_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every `<a>` in document order.
pub fn all_anchors(doc: &Document) -> Vec<Anchor> {
    let html = Html::parse_document(&doc.html);
    html.select(&ANCHOR_SELECTOR)
        .map(|a| Anchor {
            text: visible_text(a),
            raw_text: a.text().collect(),
            outer_html: canonical_anchor(a),
        })
        .collect()
}

/// For each `<p>` holding at least one `<a>`, its first anchor and its text.
pub fn paragraph_anchors(doc: &Document) -> Vec<ParagraphAnchor> {
    let html = Html::parse_document(&doc.html);
    html.select(&PARAGRAPH_SELECTOR)
        .filter_map(|p| {
            let first = p.select(&ANCHOR_SELECTOR).next()?;
            Some(ParagraphAnchor {
                anchor_html: canonical_anchor(first),
                text: visible_text(p),
            })
        })
        .collect()
}

/// Bare URL of a canonical anchor start tag.
pub fn uri_of(anchor_outer_html: &str) -> String {
    anchor_outer_html
        .replace(ANCHOR_OPEN, "")
        .replace(ANCHOR_CLOSE, "")
}
