//! # edgequake-pdfcorrect
//!
//! Find grammar, sentence-structure and formatting problems in PDF documents,
//! optionally confirm with a human, and write a corrected copy.
//!
//! ## Why this crate?
//!
//! Proofreading tools work on plain text; PDFs are not plain text. This
//! crate pulls the text and the structural metadata (fonts, links, images)
//! out of each page, hands the text to a real grammar engine and a
//! sentence analyser, checks the structure against house rules, and writes
//! an artifact with the same pages in the same order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Load       parse with lopdf (spawn_blocking), raw text per page
//!  ├─ 3. Structure  fonts/sizes, hyperlinks, image placements
//!  ├─ 4. Pages      grammar + sentence-structure detectors per page
//!  ├─ 5. Document   formatting consistency detector
//!  ├─ 6. Confirm    issue digest + yes/no (interactive runs only)
//!  └─ 7. Write      atomic artifact + CorrectionStats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfcorrect::{correct, CorrectionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Grammar engine: LanguageTool at $LANGUAGETOOL_URL or localhost:8081
//!     let config = CorrectionConfig::default();
//!     let output = correct("document.pdf", &config).await?;
//!     for issue in &output.issues {
//!         println!("{issue}");
//!     }
//!     eprintln!("{} pages, {} findings",
//!         output.stats.pages_processed,
//!         output.stats.total_findings());
//!     Ok(())
//! }
//! ```
//!
//! ## Bring your own engines
//!
//! [`Corrector`] takes any [`GrammarEngine`] and [`LinguisticEngine`], and
//! accepts extra [`PageDetector`]s and [`DocumentDetector`]s by
//! registration.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfcorrect` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdfcorrect = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod confirm;
pub mod correct;
pub mod detector;
pub mod document;
pub mod engine;
pub mod error;
pub mod issue;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AbbreviationSet, CorrectionConfig, CorrectionConfigBuilder, FormattingStandards};
pub use confirm::{ConfirmationPrompt, FixedAnswer, IssueDigest, TerminalPrompt};
pub use correct::{correct, correct_sync, inspect, Corrector, RunState};
pub use detector::{DocumentDetector, PageDetection, PageDetector};
pub use document::{Document, Page, StructuralProfile};
pub use engine::{GrammarEngine, GrammarMatch, LinguisticEngine};
pub use error::{CollaboratorError, PageError, PdfCorrectError};
pub use issue::{Issue, IssueKind};
pub use output::{CorrectionOutput, CorrectionStats, InspectReport, PageResult, RunOutcome};
pub use progress::{CorrectionProgressCallback, NoopProgressCallback, ProgressCallback};
