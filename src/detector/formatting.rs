//! Document-level formatting consistency checks.

use super::DocumentDetector;
use crate::document::StructuralProfile;
use crate::issue::{FormattingIssue, Issue, IssueKind};

/// More distinct fonts than this is flagged.
pub const MAX_FONTS: usize = 4;

/// Accepted URI prefixes. Bare prefix match: `httpx://` passes.
pub const LINK_PREFIXES: &[&str] = &["http", "https", "mailto"];

#[derive(Debug, Default, Clone, Copy)]
pub struct FormattingDetector;

impl DocumentDetector for FormattingDetector {
    fn name(&self) -> &str {
        "formatting"
    }

    fn detect(&self, profile: &StructuralProfile) -> Vec<Issue> {
        let mut issues = Vec::new();

        if profile.fonts.len() > MAX_FONTS {
            issues.push(Issue::Formatting(FormattingIssue {
                kind: IssueKind::TooManyFonts,
                details: format!(
                    "Document uses {} fonts. Consider limiting to 2-3 for consistency.",
                    profile.fonts.len()
                ),
                fonts: profile.font_names(),
                page: None,
            }));
        }

        for link in &profile.hyperlinks {
            if !LINK_PREFIXES.iter().any(|p| link.uri.starts_with(p)) {
                let page = link.page + 1;
                issues.push(Issue::Formatting(FormattingIssue {
                    kind: IssueKind::SuspiciousLink,
                    details: format!("Potentially broken link: {} on page {}", link.uri, page),
                    fonts: Vec::new(),
                    page: Some(page),
                }));
            }
        }

        issues
    }
}
