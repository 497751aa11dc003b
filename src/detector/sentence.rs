//! Readability checks over sentences segmented by a [`LinguisticEngine`].

use super::{PageDetection, PageDetector};
use crate::engine::{DependencyRole, LinguisticEngine};
use crate::error::CollaboratorError;
use crate::issue::{Issue, IssueKind, StructureIssue};
use async_trait::async_trait;
use std::sync::Arc;

/// Sentences with more tokens than this are flagged.
pub const LONG_SENTENCE_TOKENS: usize = 40;

pub const LONG_SENTENCE_SUGGESTION: &str =
    "Consider breaking this sentence into smaller ones for better readability.";
pub const PASSIVE_VOICE_SUGGESTION: &str = "Consider using active voice for clarity.";

/// Flags overlong sentences and passive voice. Both may fire on one sentence.
pub struct SentenceStructureDetector {
    engine: Arc<dyn LinguisticEngine>,
}

impl SentenceStructureDetector {
    pub fn new(engine: Arc<dyn LinguisticEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl PageDetector for SentenceStructureDetector {
    fn name(&self) -> &str {
        "sentence_structure"
    }

    async fn detect(&self, text: &str) -> Result<PageDetection, CollaboratorError> {
        let sentences = self.engine.analyze(text).await?;
        let mut issues = Vec::new();
        for sentence in sentences {
            if sentence.token_count() > LONG_SENTENCE_TOKENS {
                issues.push(Issue::Structure(StructureIssue {
                    kind: IssueKind::LongSentence,
                    sentence: sentence.text.clone(),
                    suggestion: LONG_SENTENCE_SUGGESTION.into(),
                    page: None,
                }));
            }
            if sentence.has_role(DependencyRole::PassiveAuxiliary) {
                issues.push(Issue::Structure(StructureIssue {
                    kind: IssueKind::PassiveVoice,
                    sentence: sentence.text,
                    suggestion: PASSIVE_VOICE_SUGGESTION.into(),
                    page: None,
                }));
            }
        }
        Ok(PageDetection::issues(issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::heuristic::HeuristicAnalyzer;

    fn detector() -> SentenceStructureDetector {
        SentenceStructureDetector::new(Arc::new(HeuristicAnalyzer::default()))
    }

    fn words(n: usize) -> String {
        let mut s = vec!["word"; n].join(" ");
        s.push('.');
        s
    }

    #[tokio::test]
    async fn threshold_is_strictly_greater_than_forty() {
        // 39 words + "." = 40 tokens: not flagged.
        let d = detector().detect(&words(39)).await.unwrap();
        assert!(d.issues.is_empty());

        let d = detector().detect(&words(40)).await.unwrap();
        assert_eq!(d.issues.len(), 1);
        assert_eq!(d.issues[0].kind(), IssueKind::LongSentence);
        assert!(d.corrected_text.is_none());
    }

    #[tokio::test]
    async fn long_passive_sentence_fires_twice() {
        let mut text = "The long report was written by ".to_string();
        text.push_str(&words(40));
        let d = detector().detect(&text).await.unwrap();
        let kinds: Vec<_> = d.issues.iter().map(Issue::kind).collect();
        assert_eq!(kinds, vec![IssueKind::LongSentence, IssueKind::PassiveVoice]);
        assert_eq!(d.issues[1].message(), PASSIVE_VOICE_SUGGESTION);
    }

    #[tokio::test]
    async fn active_short_sentences_are_clean() {
        let d = detector().detect("The committee wrote the report.").await.unwrap();
        assert!(d.issues.is_empty());
    }
}
