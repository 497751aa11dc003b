//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! URLs are downloaded into a `TempDir` owned by the returned
//! [`ResolvedInput`], so the copy disappears when the run ends, on every
//! exit path. Both branches reject non-PDF content by its magic bytes before
//! the parser ever sees it.

use crate::error::PdfCorrectError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A local PDF path, possibly backed by a temporary download.
#[derive(Debug)]
pub enum ResolvedInput {
    Local(PathBuf),
    /// The `TempDir` keeps the download alive until this value is dropped.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a readable local PDF.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, PdfCorrectError> {
    if input.trim().is_empty() {
        return Err(PdfCorrectError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if input.contains("://") {
        Err(PdfCorrectError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        resolve_local(input)
    }
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, PdfCorrectError> {
    let path = PathBuf::from(path_str);
    if !path.exists() {
        return Err(PdfCorrectError::FileNotFound { path });
    }

    let mut file = std::fs::File::open(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => PdfCorrectError::PermissionDenied { path: path.clone() },
        _ => PdfCorrectError::FileNotFound { path: path.clone() },
    })?;
    let mut head = Vec::with_capacity(4);
    (&mut file)
        .take(4)
        .read_to_end(&mut head)
        .map_err(|e| PdfCorrectError::CorruptPdf {
            path: path.clone(),
            detail: format!("cannot read header: {}", e),
        })?;
    if head.as_slice() != PDF_MAGIC {
        let mut magic = [0u8; 4];
        magic[..head.len()].copy_from_slice(&head);
        return Err(PdfCorrectError::NotAPdf { path, magic });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, PdfCorrectError> {
    info!("Downloading PDF from: {}", url);

    let failed = |reason: String| PdfCorrectError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            PdfCorrectError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let filename = filename_from_url(url);
    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    let temp_dir = TempDir::new().map_err(|e| PdfCorrectError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    if bytes.len() < 4 || &bytes[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(PdfCorrectError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| PdfCorrectError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());
    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of `url` if it looks like a file name.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(filename_from_url("https://x.org/a/paper.pdf?x=1"), "paper.pdf");
        assert_eq!(filename_from_url("https://x.org/a/"), "downloaded.pdf");
        assert_eq!(filename_from_url("https://x.org/download"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn rejects_unsupported_scheme_and_empty_input() {
        let err = resolve_input("ftp://host/doc.pdf", 5).await.unwrap_err();
        assert!(matches!(err, PdfCorrectError::InvalidInput { .. }));
        let err = resolve_input("  ", 5).await.unwrap_err();
        assert!(matches!(err, PdfCorrectError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn local_file_checks() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pdf");
        let err = resolve_input(missing.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, PdfCorrectError::FileNotFound { .. }));

        let text = dir.path().join("notes.pdf");
        std::fs::write(&text, b"plain text").unwrap();
        let err = resolve_input(text.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, PdfCorrectError::NotAPdf { magic, .. } if &magic == b"plai"));

        let short = dir.path().join("short.pdf");
        std::fs::write(&short, b"%P").unwrap();
        let err = resolve_input(short.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, PdfCorrectError::NotAPdf { magic, .. } if &magic == b"%P\0\0"));

        let pdf = dir.path().join("ok.pdf");
        std::fs::write(&pdf, b"%PDF-1.7\n").unwrap();
        let resolved = resolve_input(pdf.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(resolved.path(), pdf.as_path());
    }

    #[tokio::test]
    async fn unreadable_header_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("folder.pdf");
        std::fs::create_dir(&folder).unwrap();
        let err = resolve_input(folder.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, PdfCorrectError::CorruptPdf { .. }), "got {err:?}");
        assert!(err.is_load_error());
    }
}
