//! Grammar/spelling detection through a [`GrammarEngine`].
//!
//! The engine is asked twice per page, concurrently: once for candidate
//! issues and once for auto-corrected text. The two answers are reported as
//! they come back; neither is reconciled against the other.

use super::{PageDetection, PageDetector};
use crate::config::AbbreviationSet;
use crate::engine::{char_range_to_bytes, GrammarEngine, GrammarMatch};
use crate::error::CollaboratorError;
use crate::issue::{GrammarIssue, Issue, MAX_SUGGESTIONS};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Characters of context kept on each side of a match.
pub const CONTEXT_RADIUS: usize = 5;

pub struct GrammarDetector {
    engine: Arc<dyn GrammarEngine>,
    abbreviations: AbbreviationSet,
}

impl GrammarDetector {
    pub fn new(engine: Arc<dyn GrammarEngine>, abbreviations: AbbreviationSet) -> Self {
        Self {
            engine,
            abbreviations,
        }
    }

    /// Turn raw engine matches into issues, dropping abbreviation false positives.
    pub fn filter_matches(&self, text: &str, matches: Vec<GrammarMatch>) -> Vec<Issue> {
        matches
            .into_iter()
            .filter_map(|m| {
                let context = context_window(text, m.offset, m.length);
                if let Some(abbr) = self.abbreviations.found_in(context) {
                    debug!("Suppressed '{}' near abbreviation '{}'", m.message, abbr);
                    return None;
                }
                Some(Issue::Grammar(GrammarIssue {
                    context: context.to_string(),
                    suggestions: m.replacements.into_iter().take(MAX_SUGGESTIONS).collect(),
                    message: m.message,
                    offset: m.offset,
                    length: m.length,
                    page: None,
                }))
            })
            .collect()
    }
}

#[async_trait]
impl PageDetector for GrammarDetector {
    fn name(&self) -> &str {
        "grammar"
    }

    async fn detect(&self, text: &str) -> Result<PageDetection, CollaboratorError> {
        let (matches, corrected) =
            futures::try_join!(self.engine.check(text), self.engine.correct(text))?;
        Ok(PageDetection {
            issues: self.filter_matches(text, matches),
            corrected_text: Some(corrected),
        })
    }
}

/// `text[offset-5 .. offset+length+5]` in chars, clamped to the text.
pub fn context_window(text: &str, offset: usize, length: usize) -> &str {
    let start = offset.saturating_sub(CONTEXT_RADIUS);
    let end = offset.saturating_add(length).saturating_add(CONTEXT_RADIUS);
    let (start_byte, end_byte) = char_range_to_bytes(text, start, end);
    &text[start_byte..end_byte]
}
