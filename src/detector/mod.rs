//! Detectors: the units of analysis the orchestrator sequences.
//!
//! Two shapes, two traits:
//!
//! * [`PageDetector`]: runs once per page on its raw text. Async, because
//!   every shipped implementation calls an external engine.
//! * [`DocumentDetector`]: runs once per document on the
//!   [`StructuralProfile`]. Pure and synchronous.
//!
//! The orchestrator holds an ordered registry of each; register more with
//! [`crate::correct::Corrector::register_page_detector`] and
//! [`crate::correct::Corrector::register_document_detector`]. Detectors
//! return issues without a page number; the orchestrator tags them.

pub mod formatting;
pub mod grammar;
pub mod sentence;

pub use formatting::FormattingDetector;
pub use grammar::GrammarDetector;
pub use sentence::SentenceStructureDetector;

use crate::document::StructuralProfile;
use crate::error::CollaboratorError;
use crate::issue::Issue;
use async_trait::async_trait;

/// Output of one page detector on one page.
#[derive(Debug, Clone, Default)]
pub struct PageDetection {
    pub issues: Vec<Issue>,
    /// Proposed replacement for the page text, if this detector makes one.
    pub corrected_text: Option<String>,
}

impl PageDetection {
    pub fn issues(issues: Vec<Issue>) -> Self {
        Self {
            issues,
            corrected_text: None,
        }
    }
}

#[async_trait]
pub trait PageDetector: Send + Sync {
    /// Name used in logs and in `detector_unavailable` records.
    fn name(&self) -> &str;

    async fn detect(&self, text: &str) -> Result<PageDetection, CollaboratorError>;
}

pub trait DocumentDetector: Send + Sync {
    fn name(&self) -> &str;

    fn detect(&self, profile: &StructuralProfile) -> Vec<Issue>;
}
