//! Run orchestration: load, check every page, check the document, confirm,
//! write.
//!
//! ## State machine
//!
//! ```text
//! Loaded → Extracting → Checking(1..=N) → FormattingCheck
//!        → [AwaitingConfirmation] → Writing → Done
//!                     └──── decline ────→ Aborted
//! ```
//!
//! `AwaitingConfirmation` is entered only for interactive runs that found at
//! least one issue. Every transition is logged at debug level and reported
//! to the progress callback.
//!
//! ## Concurrency
//!
//! Pages are checked with `buffered(concurrency)`: up to `concurrency` pages
//! in flight, results yielded in page order. Statistics and the issue list
//! are reduced afterwards on this task only, so issue order is always page
//! order, then discovery order, whatever the concurrency.

use crate::config::CorrectionConfig;
use crate::confirm::{ConfirmationPrompt, IssueDigest, TerminalPrompt};
use crate::detector::{
    DocumentDetector, FormattingDetector, GrammarDetector, PageDetector, SentenceStructureDetector,
};
use crate::document::Page;
use crate::engine::heuristic::HeuristicAnalyzer;
use crate::engine::languagetool::LanguageToolClient;
use crate::engine::{GrammarEngine, LinguisticEngine};
use crate::error::{PageError, PdfCorrectError};
use crate::issue::{Issue, UnavailableIssue};
use crate::output::{CorrectionOutput, CorrectionStats, InspectReport, PageResult, RunOutcome};
use crate::pipeline::{input, load, write};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Loaded,
    Extracting,
    /// Checking the given 1-based page.
    Checking(usize),
    FormattingCheck,
    AwaitingConfirmation,
    Writing,
    Done,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Loaded => f.write_str("loaded"),
            RunState::Extracting => f.write_str("extracting"),
            RunState::Checking(page) => write!(f, "checking(page {page})"),
            RunState::FormattingCheck => f.write_str("formatting_check"),
            RunState::AwaitingConfirmation => f.write_str("awaiting_confirmation"),
            RunState::Writing => f.write_str("writing"),
            RunState::Done => f.write_str("done"),
            RunState::Aborted => f.write_str("aborted"),
        }
    }
}

// ── Top-level entry points ───────────────────────────────────────────────

/// Check a PDF file or URL and write the output artifact.
///
/// Builds a LanguageTool client for `config.languagetool_url` and the
/// heuristic linguistic engine, runs once, and shuts both down.
///
/// # Returns
/// `Ok(CorrectionOutput)` for completed *and* aborted runs (see
/// [`CorrectionOutput::outcome`]). Detector failures on individual pages are
/// reported inside the output, not as errors.
///
/// # Errors
/// - any load error (missing file, not a PDF, corrupt, encrypted, download)
/// - [`PdfCorrectError::WriteFailed`], carrying the full report
///
/// ```rust,no_run
/// use edgequake_pdfcorrect::{correct, CorrectionConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = CorrectionConfig::builder().output_path("fixed.pdf").build()?;
///     let output = correct("thesis.pdf", &config).await?;
///     println!("{} grammar errors", output.stats.grammar_errors);
///     Ok(())
/// }
/// ```
pub async fn correct(
    input_str: impl AsRef<str>,
    config: &CorrectionConfig,
) -> Result<CorrectionOutput, PdfCorrectError> {
    let grammar = LanguageToolClient::new(
        &config.languagetool_url,
        config.language.clone(),
        config.engine_timeout_secs,
    )
    .map_err(|e| PdfCorrectError::Internal(e.to_string()))?;
    let linguistic = HeuristicAnalyzer::new(config.abbreviations.clone());

    let corrector = Corrector::new(Arc::new(grammar), Arc::new(linguistic), config);
    let result = corrector.run(input_str.as_ref(), config).await;
    corrector.shutdown().await;
    result
}

/// Synchronous wrapper around [`correct`].
///
/// Creates a temporary tokio runtime internally.
pub fn correct_sync(
    input_str: impl AsRef<str>,
    config: &CorrectionConfig,
) -> Result<CorrectionOutput, PdfCorrectError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PdfCorrectError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(correct(input_str, config))
}

/// Page count, structural profile and formatting issues only.
///
/// Needs neither a grammar server nor a linguistic engine.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<InspectReport, PdfCorrectError> {
    let resolved =
        input::resolve_input(input_str.as_ref(), CorrectionConfig::default().download_timeout_secs)
            .await?;
    let pdf = load::open(resolved.path()).await?;
    let document = load::extract(pdf).await?;
    let formatting_issues = FormattingDetector.detect(document.profile());
    Ok(InspectReport {
        page_count: document.page_count(),
        profile: document.profile().clone(),
        formatting_issues,
    })
}

// ── Corrector ────────────────────────────────────────────────────────────

/// Owns the engines and detector registries for one or more runs.
pub struct Corrector {
    grammar: Arc<dyn GrammarEngine>,
    linguistic: Arc<dyn LinguisticEngine>,
    page_detectors: Vec<Arc<dyn PageDetector>>,
    document_detectors: Vec<Arc<dyn DocumentDetector>>,
}

/// What one page produced, before reduction.
struct PageOutcome {
    issues: Vec<Issue>,
    result: PageResult,
}

impl Corrector {
    /// Corrector with the standard detectors registered, in order: grammar,
    /// sentence structure (per page), formatting (per document).
    pub fn new(
        grammar: Arc<dyn GrammarEngine>,
        linguistic: Arc<dyn LinguisticEngine>,
        config: &CorrectionConfig,
    ) -> Self {
        let grammar_detector = GrammarDetector::new(Arc::clone(&grammar), config.abbreviations.clone());
        let sentence_detector = SentenceStructureDetector::new(Arc::clone(&linguistic));

        let mut corrector = Self::without_detectors(grammar, linguistic);
        corrector
            .register_page_detector(Arc::new(grammar_detector))
            .register_page_detector(Arc::new(sentence_detector))
            .register_document_detector(Arc::new(FormattingDetector));
        corrector
    }

    /// Corrector with empty registries.
    pub fn without_detectors(
        grammar: Arc<dyn GrammarEngine>,
        linguistic: Arc<dyn LinguisticEngine>,
    ) -> Self {
        Self {
            grammar,
            linguistic,
            page_detectors: Vec::new(),
            document_detectors: Vec::new(),
        }
    }

    /// Append a page detector; it runs after those already registered.
    pub fn register_page_detector(&mut self, detector: Arc<dyn PageDetector>) -> &mut Self {
        self.page_detectors.push(detector);
        self
    }

    /// Append a document detector; it runs after those already registered.
    pub fn register_document_detector(&mut self, detector: Arc<dyn DocumentDetector>) -> &mut Self {
        self.document_detectors.push(detector);
        self
    }

    pub fn page_detector_names(&self) -> Vec<&str> {
        self.page_detectors.iter().map(|d| d.name()).collect()
    }

    /// Shut down both engines.
    pub async fn shutdown(&self) {
        self.grammar.shutdown().await;
        self.linguistic.shutdown().await;
        debug!(
            "Engines shut down: {}, {}",
            self.grammar.name(),
            self.linguistic.name()
        );
    }

    /// One full run over `input_str`.
    pub async fn run(
        &self,
        input_str: &str,
        config: &CorrectionConfig,
    ) -> Result<CorrectionOutput, PdfCorrectError> {
        let started = Instant::now();
        info!("Starting correction: {}", input_str);

        // ── Load ─────────────────────────────────────────────────────────
        let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
        let pdf = load::open(resolved.path()).await?;
        enter(config, RunState::Loaded);

        // ── Extract ──────────────────────────────────────────────────────
        enter(config, RunState::Extracting);
        let document = load::extract(Arc::clone(&pdf)).await?;
        let total_pages = document.page_count();
        info!("Extracted {} pages", total_pages);
        if let Some(cb) = &config.progress_callback {
            cb.on_run_start(total_pages);
        }

        // ── Check pages ──────────────────────────────────────────────────
        let outcomes: Vec<PageOutcome> = stream::iter(
            document
                .pages()
                .iter()
                .map(|page| self.check_page(page, total_pages, config)),
        )
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

        let mut stats = CorrectionStats::default();
        let mut issues = Vec::new();
        let mut pages = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            stats.pages_processed += 1;
            for issue in &outcome.issues {
                stats.record(issue);
            }
            issues.extend(outcome.issues);
            pages.push(outcome.result);
        }

        // ── Check document ───────────────────────────────────────────────
        enter(config, RunState::FormattingCheck);
        for detector in &self.document_detectors {
            let found = detector.detect(document.profile());
            debug!("{}: {} document issues", detector.name(), found.len());
            for issue in &found {
                stats.record(issue);
            }
            issues.extend(found);
        }
        info!(
            "Detection complete: {} issues over {} pages",
            issues.len(),
            stats.pages_processed
        );

        let report = |outcome: RunOutcome,
                      stats: CorrectionStats,
                      issues: Vec<Issue>,
                      output_path: Option<PathBuf>| CorrectionOutput {
            outcome,
            stats,
            issues,
            pages: pages.clone(),
            profile: document.profile().clone(),
            output_path,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        // ── Confirm ──────────────────────────────────────────────────────
        if config.interactive && !issues.is_empty() {
            enter(config, RunState::AwaitingConfirmation);
            let prompt: Arc<dyn ConfirmationPrompt> = config
                .confirmation
                .clone()
                .unwrap_or_else(|| Arc::new(TerminalPrompt));
            let digest = IssueDigest::new(&issues);
            let approved = tokio::task::spawn_blocking(move || prompt.confirm(&digest))
                .await
                .map_err(|e| PdfCorrectError::Internal(format!("Prompt task panicked: {}", e)))?;

            if !approved {
                enter(config, RunState::Aborted);
                info!("Corrections declined; nothing written");
                if let Some(cb) = &config.progress_callback {
                    cb.on_run_complete(&stats);
                }
                return Ok(report(RunOutcome::Aborted, stats, issues, None));
            }
        }

        // ── Write ────────────────────────────────────────────────────────
        enter(config, RunState::Writing);
        let target = config.resolve_output_path(input_str);
        match write::write_artifact(
            pdf,
            &document,
            config.commit_corrected_text,
            &config.formatting,
            &target,
        )
        .await
        {
            Ok(committed) => stats.corrections_made += committed,
            Err(source) => {
                warn!("Failed to write '{}': {}", target.display(), source);
                if let Some(cb) = &config.progress_callback {
                    cb.on_run_complete(&stats);
                }
                return Err(PdfCorrectError::WriteFailed {
                    report: Box::new(report(RunOutcome::Completed, stats, issues, None)),
                    path: target,
                    source,
                });
            }
        }

        enter(config, RunState::Done);
        if let Some(cb) = &config.progress_callback {
            cb.on_run_complete(&stats);
        }
        info!(
            "Correction complete: {} pages, {} findings, {}ms",
            stats.pages_processed,
            stats.total_findings(),
            started.elapsed().as_millis()
        );
        Ok(report(RunOutcome::Completed, stats, issues, Some(target)))
    }

    /// Run every page detector on `page`, concurrently, keeping registry
    /// order in the result.
    async fn check_page(&self, page: &Page, total_pages: usize, config: &CorrectionConfig) -> PageOutcome {
        let page_num = page.number();
        let started = Instant::now();
        enter(config, RunState::Checking(page_num));
        if let Some(cb) = &config.progress_callback {
            cb.on_page_start(page_num, total_pages);
        }

        let limit = Duration::from_secs(config.engine_timeout_secs);
        let detections = join_all(
            self.page_detectors
                .iter()
                .map(|d| tokio::time::timeout(limit, d.detect(page.raw_text()))),
        )
        .await;

        let mut issues = Vec::new();
        let mut errors = Vec::new();
        for (detector, detection) in self.page_detectors.iter().zip(detections) {
            let failure = match detection {
                Ok(Ok(detection)) => {
                    issues.extend(detection.issues.into_iter().map(|i| i.on_page(page_num)));
                    if let Some(text) = detection.corrected_text {
                        if !page.set_corrected_text(text) {
                            debug!("Page {}: corrected text already set, keeping first", page_num);
                        }
                    }
                    continue;
                }
                Ok(Err(e)) => PageError::DetectorFailed {
                    page: page_num,
                    detector: detector.name().to_string(),
                    detail: e.to_string(),
                },
                Err(_) => PageError::Timeout {
                    page: page_num,
                    detector: detector.name().to_string(),
                    secs: config.engine_timeout_secs,
                },
            };

            warn!("{}", failure);
            if let Some(cb) = &config.progress_callback {
                cb.on_page_error(page_num, total_pages, &failure.to_string());
            }
            issues.push(Issue::Unavailable(UnavailableIssue {
                detector: failure.detector().to_string(),
                details: failure.to_string(),
                page: Some(page_num),
            }));
            errors.push(failure);
        }

        if let Some(cb) = &config.progress_callback {
            cb.on_page_complete(page_num, total_pages, issues.len());
        }
        debug!("Page {}: {} issues", page_num, issues.len());

        PageOutcome {
            result: PageResult {
                page_num,
                corrected_text: page.corrected_text().map(str::to_string),
                issue_count: issues.len(),
                errors,
                duration_ms: started.elapsed().as_millis() as u64,
            },
            issues,
        }
    }
}

fn enter(config: &CorrectionConfig, state: RunState) {
    debug!("state → {}", state);
    if let Some(cb) = &config.progress_callback {
        cb.on_state_change(&state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GrammarMatch;
    use crate::error::CollaboratorError;
    use async_trait::async_trait;

    struct NoGrammar;

    #[async_trait]
    impl GrammarEngine for NoGrammar {
        fn name(&self) -> &str {
            "none"
        }
        async fn check(&self, _text: &str) -> Result<Vec<GrammarMatch>, CollaboratorError> {
            Ok(vec![])
        }
    }

    #[test]
    fn state_display() {
        assert_eq!(RunState::Checking(3).to_string(), "checking(page 3)");
        assert_eq!(RunState::AwaitingConfirmation.to_string(), "awaiting_confirmation");
        assert_eq!(RunState::Aborted.to_string(), "aborted");
    }

    #[test]
    fn standard_registry_order() {
        let corrector = Corrector::new(
            Arc::new(NoGrammar),
            Arc::new(HeuristicAnalyzer::default()),
            &CorrectionConfig::default(),
        );
        assert_eq!(corrector.page_detector_names(), vec!["grammar", "sentence_structure"]);
        assert_eq!(corrector.document_detectors.len(), 1);
    }

    #[tokio::test]
    async fn failing_detector_is_recorded_per_page() {
        struct Broken;

        #[async_trait]
        impl PageDetector for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            async fn detect(&self, _text: &str) -> Result<crate::detector::PageDetection, CollaboratorError> {
                Err(CollaboratorError::Unavailable {
                    engine: "x".into(),
                    detail: "down".into(),
                })
            }
        }

        let mut corrector =
            Corrector::without_detectors(Arc::new(NoGrammar), Arc::new(HeuristicAnalyzer::default()));
        corrector.register_page_detector(Arc::new(Broken));
        let page = Page::new(1, "Some text.");
        let outcome = corrector
            .check_page(&page, 2, &CorrectionConfig::default())
            .await;

        assert_eq!(outcome.result.page_num, 2);
        assert_eq!(outcome.result.errors.len(), 1);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].page(), Some(2));
        assert_eq!(outcome.issues[0].kind(), crate::issue::IssueKind::DetectorUnavailable);
    }
}
