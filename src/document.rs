//! In-memory document model shared by every pipeline stage.
//!
//! A [`Document`] is created once by the loader and is read-only afterwards,
//! with one exception: each [`Page`] owns a write-once slot for the text the
//! grammar engine proposes. The slot is a [`OnceLock`], so "set at most once"
//! holds even when pages are checked concurrently.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// A loaded, paginated document.
#[derive(Debug)]
pub struct Document {
    pages: Vec<Page>,
    profile: StructuralProfile,
}

impl Document {
    pub fn new(pages: Vec<Page>, profile: StructuralProfile) -> Self {
        Self { pages, profile }
    }

    /// Pages in source order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Document-wide structural summary.
    pub fn profile(&self) -> &StructuralProfile {
        &self.profile
    }
}

/// One page of a document.
#[derive(Debug)]
pub struct Page {
    index: usize,
    raw_text: String,
    corrected_text: OnceLock<String>,
}

impl Page {
    /// Create a page from its 0-based index and extracted text.
    pub fn new(index: usize, raw_text: impl Into<String>) -> Self {
        Self {
            index,
            raw_text: raw_text.into(),
            corrected_text: OnceLock::new(),
        }
    }

    /// 0-based position in the document.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based page number used in reports.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn corrected_text(&self) -> Option<&str> {
        self.corrected_text.get().map(String::as_str)
    }

    /// Store the corrected text. Returns `false` if it was already set; the
    /// first value is kept.
    pub fn set_corrected_text(&self, text: String) -> bool {
        self.corrected_text.set(text).is_ok()
    }
}

/// A hyperlink found on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    /// 0-based page index.
    pub page: usize,
    pub uri: String,
}

/// An image drawn on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePlacement {
    /// 0-based page index.
    pub page: usize,
    /// Discovery order within the page.
    pub index: usize,
    pub width: u32,
    pub height: u32,
}

/// A run of text drawn with one font at one size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub font: String,
    pub size: f32,
}

/// Aggregate fonts, links and images across the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralProfile {
    /// Font name → distinct sizes observed, in first-seen order.
    pub fonts: BTreeMap<String, Vec<f32>>,
    /// Page order, then in-page discovery order.
    pub hyperlinks: Vec<Hyperlink>,
    /// Page order, then in-page discovery order.
    pub images: Vec<ImagePlacement>,
}

impl StructuralProfile {
    /// Record one observed span; duplicate sizes collapse.
    pub fn record_font(&mut self, font: &str, size: f32) {
        let sizes = self.fonts.entry(font.to_string()).or_default();
        if !sizes.iter().any(|s| *s == size) {
            sizes.push(size);
        }
    }

    pub fn font_names(&self) -> Vec<String> {
        self.fonts.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrected_text_is_write_once() {
        let page = Page::new(0, "raw");
        assert!(page.corrected_text().is_none());
        assert!(page.set_corrected_text("first".into()));
        assert!(!page.set_corrected_text("second".into()));
        assert_eq!(page.corrected_text(), Some("first"));
        assert_eq!(page.raw_text(), "raw");
    }

    #[test]
    fn page_numbers_are_one_based() {
        assert_eq!(Page::new(2, "raw").number(), 3);
    }

    #[test]
    fn font_sizes_are_unioned() {
        let mut profile = StructuralProfile::default();
        profile.record_font("Arial", 12.0);
        profile.record_font("Arial", 12.0);
        profile.record_font("Arial", 18.0);
        profile.record_font("Georgia", 12.0);
        assert_eq!(profile.fonts["Arial"], vec![12.0, 18.0]);
        assert_eq!(profile.font_names(), vec!["Arial", "Georgia"]);
    }
}
