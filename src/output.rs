//! Result types returned by a correction run.

use crate::document::StructuralProfile;
use crate::error::PageError;
use crate::issue::{Issue, IssueKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Run-scoped counters summarising detector output and actions taken.
///
/// Counters only ever grow during a run; the orchestrator is the single
/// mutator and hands out copies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionStats {
    pub pages_processed: usize,
    pub grammar_errors: usize,
    pub spelling_errors: usize,
    pub structure_issues: usize,
    pub formatting_issues: usize,
    pub corrections_made: usize,
}

impl CorrectionStats {
    /// Fold one issue into the counters.
    ///
    /// Grammar issues are bucketed by the literal words `Grammar` and
    /// `Spelling` in their message: both words count twice, neither counts
    /// nowhere. Unavailable-detector records are not counted.
    pub fn record(&mut self, issue: &Issue) {
        match issue {
            Issue::Grammar(g) => {
                if g.message.contains("Grammar") {
                    self.grammar_errors += 1;
                }
                if g.message.contains("Spelling") {
                    self.spelling_errors += 1;
                }
            }
            Issue::Structure(_) => self.structure_issues += 1,
            Issue::Formatting(_) => self.formatting_issues += 1,
            Issue::Unavailable(_) => {}
        }
    }

    /// Total detector findings (excluding pages/corrections counters).
    pub fn total_findings(&self) -> usize {
        self.grammar_errors + self.spelling_errors + self.structure_issues + self.formatting_issues
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Output artifact written.
    Completed,
    /// Operator declined the corrections; nothing was written.
    Aborted,
}

/// Per-page outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Text proposed by the grammar engine, when it ran.
    pub corrected_text: Option<String>,
    /// Issues attributed to this page (including unavailable-detector records).
    pub issue_count: usize,
    /// Detector failures on this page.
    pub errors: Vec<PageError>,
    pub duration_ms: u64,
}

impl PageResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Full report of a correction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionOutput {
    pub outcome: RunOutcome,
    pub stats: CorrectionStats,
    /// Page issues in page-then-discovery order, then document issues.
    pub issues: Vec<Issue>,
    pub pages: Vec<PageResult>,
    pub profile: StructuralProfile,
    /// Where the artifact was written; `None` when aborted or write failed.
    pub output_path: Option<PathBuf>,
    pub duration_ms: u64,
}

impl CorrectionOutput {
    pub fn is_aborted(&self) -> bool {
        self.outcome == RunOutcome::Aborted
    }

    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind() == kind)
    }

    /// Pages where at least one detector failed.
    pub fn failed_pages(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|p| !p.is_clean())
            .map(|p| p.page_num)
            .collect()
    }
}

/// Structure-only summary produced by [`crate::inspect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectReport {
    pub page_count: usize,
    pub profile: StructuralProfile,
    pub formatting_issues: Vec<Issue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{FormattingIssue, GrammarIssue, StructureIssue, UnavailableIssue};

    fn grammar(message: &str) -> Issue {
        Issue::Grammar(GrammarIssue {
            message: message.into(),
            context: String::new(),
            suggestions: vec![],
            offset: 0,
            length: 1,
            page: Some(1),
        })
    }

    #[test]
    fn grammar_bucketing_is_by_literal_word() {
        let mut stats = CorrectionStats::default();
        stats.record(&grammar("Grammar: subject/verb"));
        stats.record(&grammar("Spelling mistake"));
        stats.record(&grammar("Grammar and Spelling"));
        stats.record(&grammar("possible grammar error"));
        assert_eq!(stats.grammar_errors, 2);
        assert_eq!(stats.spelling_errors, 2);
    }

    #[test]
    fn other_categories_are_counted() {
        let mut stats = CorrectionStats::default();
        stats.record(&Issue::Structure(StructureIssue {
            kind: IssueKind::PassiveVoice,
            sentence: "It was done.".into(),
            suggestion: "Use active voice.".into(),
            page: Some(1),
        }));
        stats.record(&Issue::Formatting(FormattingIssue {
            kind: IssueKind::SuspiciousLink,
            details: "ftp://x".into(),
            fonts: vec![],
            page: Some(1),
        }));
        stats.record(&Issue::Unavailable(UnavailableIssue {
            detector: "grammar".into(),
            details: "down".into(),
            page: Some(1),
        }));
        assert_eq!(stats.structure_issues, 1);
        assert_eq!(stats.formatting_issues, 1);
        assert_eq!(stats.total_findings(), 2);
    }

    #[test]
    fn stats_serialise_as_six_counters() {
        let json = serde_json::to_value(CorrectionStats::default()).unwrap();
        assert_eq!(json.as_object().map(|o| o.len()), Some(6));
    }
}
