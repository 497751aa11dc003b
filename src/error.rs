//! Error types for the edgequake-pdfcorrect library.
//!
//! Three error types mirror three distinct failure modes:
//!
//! * [`PdfCorrectError`]: **Fatal**: the run cannot proceed (unreadable
//!   source, not a PDF, unwritable target). Returned as `Err(..)` from the
//!   top-level `correct*` functions.
//!
//! * [`PageError`]: **Non-fatal**: one detector failed on one page. Stored
//!   inside [`crate::output::PageResult`] and mirrored as a
//!   `detector_unavailable` issue; the rest of the document is still checked.
//!
//! * [`CollaboratorError`]: what an external engine adapter (grammar,
//!   linguistic, PDF structure accessor) returns. The orchestrator converts it
//!   into a [`PageError`] at the page boundary.
//!
//! Declining the confirmation prompt is not an error at all; it is reported
//! as [`crate::output::RunOutcome::Aborted`].

use crate::output::CorrectionOutput;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdfcorrect library.
#[derive(Debug, Error)]
pub enum PdfCorrectError {
    // ── Load errors ───────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF is encrypted; decryption is not supported.
    #[error("PDF '{path}' is encrypted and cannot be checked")]
    Encrypted { path: PathBuf },

    // ── Write errors ──────────────────────────────────────────────────────
    /// The output artifact could not be written.
    ///
    /// Detection had already finished, so the full report travels with the
    /// error: statistics and issues are never lost to a bad output path.
    #[error("Failed to write output file '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        report: Box<CorrectionOutput>,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PdfCorrectError {
    /// `true` for failures raised before any stage ran (the `LoadError` family).
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. }
                | Self::PermissionDenied { .. }
                | Self::InvalidInput { .. }
                | Self::DownloadFailed { .. }
                | Self::DownloadTimeout { .. }
                | Self::NotAPdf { .. }
                | Self::CorruptPdf { .. }
                | Self::Encrypted { .. }
        )
    }

    /// The report carried by a [`PdfCorrectError::WriteFailed`], if any.
    pub fn report(&self) -> Option<&CorrectionOutput> {
        match self {
            Self::WriteFailed { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// A non-fatal error for a single detector on a single page.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The detector's collaborator failed or was unreachable.
    #[error("Page {page}: {detector} detector failed: {detail}")]
    DetectorFailed {
        page: usize,
        detector: String,
        detail: String,
    },

    /// The detector's collaborator did not answer in time.
    #[error("Page {page}: {detector} detector timed out after {secs}s")]
    Timeout {
        page: usize,
        detector: String,
        secs: u64,
    },
}

impl PageError {
    /// 1-indexed page this error belongs to.
    pub fn page(&self) -> usize {
        match self {
            Self::DetectorFailed { page, .. } | Self::Timeout { page, .. } => *page,
        }
    }

    /// Name of the detector that failed.
    pub fn detector(&self) -> &str {
        match self {
            Self::DetectorFailed { detector, .. } | Self::Timeout { detector, .. } => detector,
        }
    }
}

/// Failure reported by an external collaborator adapter.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    /// The engine could not be reached (connection refused, server down).
    #[error("{engine} unavailable: {detail}")]
    Unavailable { engine: String, detail: String },

    /// The engine answered, but not in a form we understand.
    #[error("{engine} returned an unexpected response: {detail}")]
    Protocol { engine: String, detail: String },

    /// The engine understood the request and refused it.
    #[error("{engine} rejected the request: {detail}")]
    Rejected { engine: String, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_are_classified() {
        let e = PdfCorrectError::NotAPdf {
            path: PathBuf::from("x.txt"),
            magic: *b"abcd",
        };
        assert!(e.is_load_error());
        assert!(!PdfCorrectError::InvalidConfig("x".into()).is_load_error());
    }

    #[test]
    fn page_error_display() {
        let e = PageError::Timeout {
            page: 3,
            detector: "grammar".into(),
            secs: 60,
        };
        let msg = e.to_string();
        assert!(msg.contains("Page 3"), "got: {msg}");
        assert!(msg.contains("60s"), "got: {msg}");
        assert_eq!(e.page(), 3);
        assert_eq!(e.detector(), "grammar");
    }

    #[test]
    fn collaborator_error_display() {
        let e = CollaboratorError::Unavailable {
            engine: "languagetool".into(),
            detail: "connection refused".into(),
        };
        assert!(e.to_string().contains("languagetool"));
        assert!(e.to_string().contains("connection refused"));
    }

    #[test]
    fn corrupt_pdf_display() {
        let e = PdfCorrectError::CorruptPdf {
            path: PathBuf::from("broken.pdf"),
            detail: "no xref".into(),
        };
        assert!(e.to_string().contains("broken.pdf"));
        assert!(e.report().is_none());
    }
}
