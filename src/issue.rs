//! Issue records emitted by detectors.
//!
//! Issues are immutable values. A detector builds them without a page number;
//! the orchestrator stamps the page with [`Issue::on_page`], which consumes
//! the issue and returns a new one rather than mutating it in place.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of replacement suggestions kept per issue.
pub const MAX_SUGGESTIONS: usize = 3;

/// The kind of a flagged problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Grammar,
    LongSentence,
    PassiveVoice,
    TooManyFonts,
    SuspiciousLink,
    DetectorUnavailable,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Grammar => "grammar",
            IssueKind::LongSentence => "long_sentence",
            IssueKind::PassiveVoice => "passive_voice",
            IssueKind::TooManyFonts => "too_many_fonts",
            IssueKind::SuspiciousLink => "suspicious_link",
            IssueKind::DetectorUnavailable => "detector_unavailable",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A grammar or spelling problem reported by the grammar engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarIssue {
    pub message: String,
    /// Source text around the flagged span.
    pub context: String,
    /// Ranked replacements, at most [`MAX_SUGGESTIONS`].
    pub suggestions: Vec<String>,
    /// 0-based character offset into the page text.
    pub offset: usize,
    /// Length of the flagged span in characters.
    pub length: usize,
    pub page: Option<usize>,
}

/// A readability or style problem in one sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureIssue {
    pub kind: IssueKind,
    pub sentence: String,
    pub suggestion: String,
    pub page: Option<usize>,
}

/// A document-level formatting problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattingIssue {
    pub kind: IssueKind,
    pub details: String,
    /// Fonts involved (populated for `too_many_fonts`).
    pub fonts: Vec<String>,
    pub page: Option<usize>,
}

/// A detector that could not run on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableIssue {
    pub detector: String,
    pub details: String,
    pub page: Option<usize>,
}

/// A single flagged problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Issue {
    Grammar(GrammarIssue),
    Structure(StructureIssue),
    Formatting(FormattingIssue),
    Unavailable(UnavailableIssue),
}

impl Issue {
    pub fn kind(&self) -> IssueKind {
        match self {
            Issue::Grammar(_) => IssueKind::Grammar,
            Issue::Structure(s) => s.kind,
            Issue::Formatting(f) => f.kind,
            Issue::Unavailable(_) => IssueKind::DetectorUnavailable,
        }
    }

    /// Human-readable description.
    pub fn message(&self) -> &str {
        match self {
            Issue::Grammar(g) => &g.message,
            Issue::Structure(s) => &s.suggestion,
            Issue::Formatting(f) => &f.details,
            Issue::Unavailable(u) => &u.details,
        }
    }

    /// 1-based page, absent for document-level issues.
    pub fn page(&self) -> Option<usize> {
        match self {
            Issue::Grammar(g) => g.page,
            Issue::Structure(s) => s.page,
            Issue::Formatting(f) => f.page,
            Issue::Unavailable(u) => u.page,
        }
    }

    pub fn context(&self) -> Option<&str> {
        match self {
            Issue::Grammar(g) => Some(&g.context),
            Issue::Structure(s) => Some(&s.sentence),
            Issue::Formatting(_) | Issue::Unavailable(_) => None,
        }
    }

    pub fn suggestions(&self) -> &[String] {
        match self {
            Issue::Grammar(g) => &g.suggestions,
            _ => &[],
        }
    }

    /// Return a copy of this issue attributed to `page` (1-based).
    pub fn on_page(self, page: usize) -> Self {
        match self {
            Issue::Grammar(g) => Issue::Grammar(GrammarIssue {
                page: Some(page),
                ..g
            }),
            Issue::Structure(s) => Issue::Structure(StructureIssue {
                page: Some(page),
                ..s
            }),
            Issue::Formatting(f) => Issue::Formatting(FormattingIssue {
                page: Some(page),
                ..f
            }),
            Issue::Unavailable(u) => Issue::Unavailable(UnavailableIssue {
                page: Some(page),
                ..u
            }),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.page() {
            Some(page) => write!(f, "Page {}: [{}] {}", page, self.kind(), self.message()),
            None => write!(f, "Document: [{}] {}", self.kind(), self.message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar(message: &str) -> Issue {
        Issue::Grammar(GrammarIssue {
            message: message.into(),
            context: "ctx".into(),
            suggestions: vec!["a".into()],
            offset: 0,
            length: 3,
            page: None,
        })
    }

    #[test]
    fn on_page_stamps_without_touching_other_fields() {
        let issue = grammar("Possible Grammar error");
        let stamped = issue.clone().on_page(4);
        assert_eq!(stamped.page(), Some(4));
        assert_eq!(stamped.message(), issue.message());
        assert_eq!(stamped.suggestions(), issue.suggestions());
        assert_eq!(issue.page(), None);
    }

    #[test]
    fn kind_serialises_snake_case() {
        let json = serde_json::to_string(&IssueKind::TooManyFonts).unwrap();
        assert_eq!(json, "\"too_many_fonts\"");
        assert_eq!(IssueKind::PassiveVoice.to_string(), "passive_voice");
    }

    #[test]
    fn display_mentions_page_or_document() {
        let issue = grammar("Spelling mistake").on_page(2);
        assert_eq!(issue.to_string(), "Page 2: [grammar] Spelling mistake");

        let doc_level = Issue::Formatting(FormattingIssue {
            kind: IssueKind::TooManyFonts,
            details: "5 fonts".into(),
            fonts: vec![],
            page: None,
        });
        assert!(doc_level.to_string().starts_with("Document:"));
        assert!(doc_level.context().is_none());
    }
}
