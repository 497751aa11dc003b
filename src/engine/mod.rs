//! Contracts for the heavyweight external collaborators.
//!
//! The pipeline never implements grammar rules or language models itself.
//! It talks to two engines through the traits below:
//!
//! ```text
//! GrammarEngine    ── check(text)   → [GrammarMatch]   (candidate issues)
//!                  └─ correct(text) → String           (auto-corrected text)
//! LinguisticEngine ── analyze(text) → [Sentence]       (tokens + dependency roles)
//! ```
//!
//! Engines are built once per process, shared as `Arc<dyn …>`, injected into
//! [`crate::correct::Corrector`], and torn down with `shutdown()` when the run
//! ends. Adapters shipped with the crate:
//!
//! * [`languagetool::LanguageToolClient`]: LanguageTool HTTP server
//! * [`heuristic::HeuristicAnalyzer`]: rule-based sentence/passive analysis

pub mod heuristic;
pub mod languagetool;

use crate::error::CollaboratorError;
use async_trait::async_trait;

/// One candidate problem reported by a grammar engine.
///
/// Offsets and lengths count Unicode scalar values (`char`s), not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarMatch {
    pub message: String,
    pub offset: usize,
    pub length: usize,
    /// Ranked replacement candidates, best first.
    pub replacements: Vec<String>,
    pub rule_id: Option<String>,
}

/// A grammar/spelling checking engine.
#[async_trait]
pub trait GrammarEngine: Send + Sync {
    /// Short name used in logs and `detector_unavailable` records.
    fn name(&self) -> &str;

    /// Candidate issues for `text`.
    async fn check(&self, text: &str) -> Result<Vec<GrammarMatch>, CollaboratorError>;

    /// Auto-corrected `text`.
    ///
    /// A separate call from [`GrammarEngine::check`]; the result is not
    /// required to agree with any particular issue list.
    async fn correct(&self, text: &str) -> Result<String, CollaboratorError> {
        let matches = self.check(text).await?;
        Ok(apply_first_replacements(text, &matches))
    }

    /// Release engine resources at the end of a run.
    async fn shutdown(&self) {}
}

/// Syntactic role of a token within its sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyRole {
    /// Auxiliary of a passive construction ("was" in "was written").
    PassiveAuxiliary,
    Auxiliary,
    Punctuation,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub role: DependencyRole,
}

/// A sentence as segmented by a linguistic engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub text: String,
    pub tokens: Vec<Token>,
}

impl Sentence {
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn has_role(&self, role: DependencyRole) -> bool {
        self.tokens.iter().any(|t| t.role == role)
    }
}

/// A sentence segmentation and dependency-tagging engine.
#[async_trait]
pub trait LinguisticEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn analyze(&self, text: &str) -> Result<Vec<Sentence>, CollaboratorError>;

    async fn shutdown(&self) {}
}

/// Apply the first replacement of every match, right to left, skipping
/// matches that overlap one already applied or that have no replacement.
pub fn apply_first_replacements(text: &str, matches: &[GrammarMatch]) -> String {
    let mut ordered: Vec<&GrammarMatch> = matches
        .iter()
        .filter(|m| !m.replacements.is_empty())
        .collect();
    ordered.sort_by_key(|m| std::cmp::Reverse(m.offset));

    let mut out = text.to_string();
    let mut applied_from = usize::MAX;
    for m in ordered {
        let end = m.offset.saturating_add(m.length);
        if end > applied_from {
            continue;
        }
        let (start_byte, end_byte) = char_range_to_bytes(&out, m.offset, end);
        out.replace_range(start_byte..end_byte, &m.replacements[0]);
        applied_from = m.offset;
    }
    out
}

/// Byte range of the char range `[start, end)`, clamped to `text`.
pub(crate) fn char_range_to_bytes(text: &str, start: usize, end: usize) -> (usize, usize) {
    let byte_at = |char_idx: usize| {
        text.char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(text.len())
    };
    let start_byte = byte_at(start);
    let end_byte = byte_at(end.max(start));
    (start_byte, end_byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(offset: usize, length: usize, replacement: &str) -> GrammarMatch {
        GrammarMatch {
            message: "x".into(),
            offset,
            length,
            replacements: if replacement.is_empty() {
                vec![]
            } else {
                vec![replacement.into(), "other".into()]
            },
            rule_id: None,
        }
    }

    #[test]
    fn applies_replacements_right_to_left() {
        let text = "Their going to teh store.";
        let fixed = apply_first_replacements(text, &[m(0, 5, "They're"), m(15, 3, "the")]);
        assert_eq!(fixed, "They're going to the store.");
    }

    #[test]
    fn skips_overlaps_and_empty_replacements() {
        let text = "abcdef";
        let fixed = apply_first_replacements(text, &[m(0, 4, "X"), m(2, 3, "Y"), m(5, 1, "")]);
        assert_eq!(fixed, "abYf");
    }

    #[test]
    fn char_offsets_survive_multibyte_text() {
        let text = "Café sont bon.";
        let fixed = apply_first_replacements(text, &[m(5, 4, "est")]);
        assert_eq!(fixed, "Café est bon.");
        assert_eq!(char_range_to_bytes("é", 0, 10), (0, 2));
    }

    #[test]
    fn huge_match_length_does_not_overflow() {
        let fixed = apply_first_replacements("abcdef", &[m(2, usize::MAX, "X")]);
        assert_eq!(fixed, "abX");
    }

    #[test]
    fn default_correct_applies_check_results() {
        struct Fixed;

        #[async_trait]
        impl GrammarEngine for Fixed {
            fn name(&self) -> &str {
                "fixed"
            }
            async fn check(&self, _text: &str) -> Result<Vec<GrammarMatch>, CollaboratorError> {
                Ok(vec![m(15, 3, "the")])
            }
        }

        let fixed = tokio_test::block_on(Fixed.correct("Their going to teh store.")).unwrap();
        assert_eq!(fixed, "Their going to the store.");
    }

    #[test]
    fn sentence_roles() {
        let s = Sentence {
            text: "It was done.".into(),
            tokens: vec![
                Token { text: "It".into(), role: DependencyRole::Other },
                Token { text: "was".into(), role: DependencyRole::PassiveAuxiliary },
                Token { text: "done".into(), role: DependencyRole::Other },
                Token { text: ".".into(), role: DependencyRole::Punctuation },
            ],
        };
        assert_eq!(s.token_count(), 4);
        assert!(s.has_role(DependencyRole::PassiveAuxiliary));
    }
}
