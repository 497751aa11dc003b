//! Configuration types for a correction run.
//!
//! All run behaviour is controlled through [`CorrectionConfig`], built via
//! its [`CorrectionConfigBuilder`]. The static reference data the detectors
//! consult (known abbreviations, house formatting standards) lives here too,
//! so two runs can be diffed by diffing their configs.

use crate::confirm::ConfirmationPrompt;
use crate::error::PdfCorrectError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default LanguageTool server (the stock `languagetool-server` port).
pub const DEFAULT_LANGUAGETOOL_URL: &str = "http://localhost:8081";

/// Configuration for a correction run.
///
/// # Example
/// ```rust
/// use edgequake_pdfcorrect::CorrectionConfig;
///
/// let config = CorrectionConfig::builder()
///     .language("fr-FR")
///     .interactive(false)
///     .commit_corrected_text(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.language, "fr-FR");
/// ```
#[derive(Clone)]
pub struct CorrectionConfig {
    /// Locale handed to the grammar engine. Default: `en-US`.
    pub language: String,

    /// Ask for confirmation before writing. Default: false.
    ///
    /// The prompt is shown only when at least one issue was found.
    pub interactive: bool,

    /// Output artifact path. Default: `<input-basename>_corrected.<ext>`
    /// in the current directory.
    pub output_path: Option<PathBuf>,

    /// Write the grammar engine's corrected text instead of the original
    /// page content. Default: false (original pages are copied unchanged).
    pub commit_corrected_text: bool,

    /// Per-collaborator-call timeout in seconds. Default: 60.
    ///
    /// A timeout fails that detector on that page only.
    pub engine_timeout_secs: u64,

    /// Pages checked at once. Default: 1 (sequential).
    pub concurrency: usize,

    /// Base URL of the LanguageTool server used by [`crate::correct`].
    pub languagetool_url: String,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Abbreviations that suppress grammar false positives.
    pub abbreviations: AbbreviationSet,

    /// House formatting standards.
    pub formatting: FormattingStandards,

    /// Receives per-page and per-stage events.
    pub progress_callback: Option<ProgressCallback>,

    /// Answers the confirmation prompt. Falls back to the terminal prompt
    /// when `interactive` is set and this is `None`.
    pub confirmation: Option<Arc<dyn ConfirmationPrompt>>,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            interactive: false,
            output_path: None,
            commit_corrected_text: false,
            engine_timeout_secs: 60,
            concurrency: 1,
            languagetool_url: std::env::var("LANGUAGETOOL_URL")
                .ok()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_LANGUAGETOOL_URL.to_string()),
            download_timeout_secs: 120,
            abbreviations: AbbreviationSet::default(),
            formatting: FormattingStandards::default(),
            progress_callback: None,
            confirmation: None,
        }
    }
}

impl fmt::Debug for CorrectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrectionConfig")
            .field("language", &self.language)
            .field("interactive", &self.interactive)
            .field("output_path", &self.output_path)
            .field("commit_corrected_text", &self.commit_corrected_text)
            .field("engine_timeout_secs", &self.engine_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("languagetool_url", &self.languagetool_url)
            .field("abbreviations", &self.abbreviations.len())
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn CorrectionProgressCallback>"),
            )
            .field(
                "confirmation",
                &self.confirmation.as_ref().map(|_| "<dyn ConfirmationPrompt>"),
            )
            .finish()
    }
}

impl CorrectionConfig {
    /// Create a new builder for `CorrectionConfig`.
    pub fn builder() -> CorrectionConfigBuilder {
        CorrectionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Output path for `input`: the configured one, or the derived default.
    pub fn resolve_output_path(&self, input: &str) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| default_output_path(input))
    }
}

/// `<basename>_corrected.<ext>` for a path or URL, relative to the current
/// directory. Inputs without an extension get `.pdf`.
pub fn default_output_path(input: &str) -> PathBuf {
    let last_segment = input
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(input);
    let last_segment = last_segment.split(['?', '#']).next().unwrap_or(last_segment);
    let path = Path::new(last_segment);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "pdf".to_string());
    PathBuf::from(format!("{stem}_corrected.{ext}"))
}

/// Builder for [`CorrectionConfig`].
#[derive(Debug)]
pub struct CorrectionConfigBuilder {
    config: CorrectionConfig,
}

impl CorrectionConfigBuilder {
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    pub fn interactive(mut self, v: bool) -> Self {
        self.config.interactive = v;
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = Some(path.into());
        self
    }

    pub fn commit_corrected_text(mut self, v: bool) -> Self {
        self.config.commit_corrected_text = v;
        self
    }

    pub fn engine_timeout_secs(mut self, secs: u64) -> Self {
        self.config.engine_timeout_secs = secs;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn languagetool_url(mut self, url: impl Into<String>) -> Self {
        self.config.languagetool_url = url.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn abbreviations(mut self, set: AbbreviationSet) -> Self {
        self.config.abbreviations = set;
        self
    }

    pub fn formatting(mut self, standards: FormattingStandards) -> Self {
        self.config.formatting = standards;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn confirmation(mut self, prompt: Arc<dyn ConfirmationPrompt>) -> Self {
        self.config.confirmation = Some(prompt);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CorrectionConfig, PdfCorrectError> {
        let c = &self.config;
        if c.language.trim().is_empty() {
            return Err(PdfCorrectError::InvalidConfig(
                "language must not be empty".into(),
            ));
        }
        if c.engine_timeout_secs == 0 {
            return Err(PdfCorrectError::InvalidConfig(
                "engine timeout must be ≥ 1s".into(),
            ));
        }
        if c.formatting.body_font_size <= 0.0 || c.formatting.paragraph_spacing <= 0.0 {
            return Err(PdfCorrectError::InvalidConfig(
                "body font size and paragraph spacing must be positive".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Reference data ───────────────────────────────────────────────────────

/// Known abbreviations, each with an on/off flag.
///
/// A grammar issue whose context window contains an active abbreviation as a
/// substring is treated as a false positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbbreviationSet {
    entries: BTreeMap<String, bool>,
}

impl Default for AbbreviationSet {
    fn default() -> Self {
        [
            "e.g.", "i.e.", "etc.", "vs.", "Mr.", "Mrs.", "Ms.", "Dr.", "Ph.D.", "M.D.", "B.A.",
            "B.S.", "U.S.", "U.K.", "E.U.",
        ]
        .into_iter()
        .collect()
    }
}

impl<'a> FromIterator<&'a str> for AbbreviationSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|a| (a.to_string(), true)).collect(),
        }
    }
}

impl AbbreviationSet {
    /// An empty set (no suppression).
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, abbreviation: impl Into<String>, active: bool) {
        self.entries.insert(abbreviation.into(), active);
    }

    pub fn is_active(&self, abbreviation: &str) -> bool {
        self.entries.get(abbreviation).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First active abbreviation that occurs anywhere inside `window`.
    pub fn found_in(&self, window: &str) -> Option<&str> {
        self.entries
            .iter()
            .filter(|(_, active)| **active)
            .map(|(abbr, _)| abbr.as_str())
            .find(|abbr| window.contains(abbr))
    }
}

/// House formatting standards.
///
/// Only the body settings are enforced, and only when corrected text is
/// committed: rewritten pages are set in `default_font` at `body_font_size`
/// with `paragraph_spacing` as the line-height factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattingStandards {
    pub paragraph_spacing: f32,
    pub default_font: String,
    pub heading_fonts: Vec<String>,
    pub body_font_size: f32,
    pub heading1_font_size: f32,
    pub heading2_font_size: f32,
}

impl Default for FormattingStandards {
    fn default() -> Self {
        Self {
            paragraph_spacing: 1.15,
            default_font: "Times New Roman".to_string(),
            heading_fonts: vec!["Arial".to_string(), "Helvetica".to_string()],
            body_font_size: 12.0,
            heading1_font_size: 18.0,
            heading2_font_size: 16.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = CorrectionConfig::default();
        assert_eq!(c.language, "en-US");
        assert!(!c.interactive);
        assert!(!c.commit_corrected_text);
        assert_eq!(c.concurrency, 1);
        assert_eq!(c.engine_timeout_secs, 60);
        assert_eq!(c.abbreviations.len(), 15);
    }

    #[test]
    fn builder_validates() {
        assert!(CorrectionConfig::builder().language(" ").build().is_err());
        assert!(CorrectionConfig::builder()
            .engine_timeout_secs(0)
            .build()
            .is_err());
        let c = CorrectionConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn default_output_path_derivation() {
        assert_eq!(
            default_output_path("/tmp/docs/report.pdf"),
            PathBuf::from("report_corrected.pdf")
        );
        assert_eq!(
            default_output_path("https://example.com/papers/paper.PDF?dl=1"),
            PathBuf::from("paper_corrected.PDF")
        );
        assert_eq!(
            default_output_path("notes"),
            PathBuf::from("notes_corrected.pdf")
        );
    }

    #[test]
    fn explicit_output_path_wins() {
        let c = CorrectionConfig::builder()
            .output_path("/out/x.pdf")
            .build()
            .unwrap();
        assert_eq!(c.resolve_output_path("in.pdf"), PathBuf::from("/out/x.pdf"));
    }

    #[test]
    fn abbreviation_lookup_respects_flags() {
        let mut set = AbbreviationSet::default();
        assert_eq!(set.found_in("see e.g. the"), Some("e.g."));
        assert!(set.found_in("nothing here").is_none());

        set.insert("e.g.", false);
        assert!(set.found_in("see e.g. the").is_none());
        assert!(!set.is_active("e.g."));
        assert!(AbbreviationSet::empty().found_in("Dr. Who").is_none());
    }
}
