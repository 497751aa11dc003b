//! Output writer: produce the artifact from the loaded document.
//!
//! Every page is committed in source order. By default a page is committed
//! unchanged; with `commit_corrected_text` a page that has corrected text is
//! re-typeset from it using the house body font, size and line spacing.
//!
//! Writes are atomic: the bytes go to a hidden temp sibling which is then
//! renamed over the target, so a failed run never leaves a partial file.

use super::load::LoadedPdf;
use crate::config::FormattingStandards;
use crate::document::Document;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const PAGE_MARGIN: f32 = 72.0;

/// Average glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

const FONT_RESOURCE: &str = "F1";

/// Write the artifact for `document` to `target`. Returns the number of pages
/// committed.
pub async fn write_artifact(
    pdf: Arc<LoadedPdf>,
    document: &Document,
    commit_corrected_text: bool,
    standards: &FormattingStandards,
    target: &Path,
) -> io::Result<usize> {
    let replacements: Vec<Option<String>> = document
        .pages()
        .iter()
        .map(|p| {
            if commit_corrected_text {
                p.corrected_text().map(str::to_string)
            } else {
                None
            }
        })
        .collect();
    let standards = standards.clone();
    let committed = replacements.len();

    let bytes = tokio::task::spawn_blocking(move || render_artifact(&pdf, &replacements, &standards))
        .await
        .map_err(|e| io::Error::other(format!("write task panicked: {e}")))??;

    write_atomic(target, &bytes).await?;
    info!("Wrote {} pages to '{}'", committed, target.display());
    Ok(committed)
}

/// Serialise the document, replacing the content of pages that have `Some`
/// replacement text.
pub fn render_artifact(
    pdf: &LoadedPdf,
    replacements: &[Option<String>],
    standards: &FormattingStandards,
) -> io::Result<Vec<u8>> {
    let mut doc = pdf.lopdf().clone();

    if replacements.iter().any(Option::is_some) {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base14_font(&standards.default_font),
            "Encoding" => "WinAnsiEncoding",
        });

        for (page_id, text) in pdf.page_ids().iter().zip(replacements) {
            let Some(text) = text else { continue };
            let (width, height) = pdf.page_size(*page_id);
            let content = typeset(text, standards, width, height)
                .encode()
                .map_err(|e| io::Error::other(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));

            let page = doc
                .get_object_mut(*page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| io::Error::other(e.to_string()))?;
            page.set("Contents", content_id);
            page.set(
                "Resources",
                dictionary! { "Font" => dictionary! { FONT_RESOURCE => font_id } },
            );
            debug!("Re-typeset page object {:?}", page_id);
        }
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| io::Error::other(e.to_string()))?;
    Ok(out)
}

/// Content stream drawing `text` top-down from the top-left margin.
fn typeset(text: &str, standards: &FormattingStandards, width: f32, height: f32) -> Content {
    let size = standards.body_font_size;
    let leading = size * standards.paragraph_spacing;
    let max_chars = ((width - 2.0 * PAGE_MARGIN) / (size * AVG_GLYPH_WIDTH)).max(10.0) as usize;

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![FONT_RESOURCE.into(), Object::Real(size)]),
        Operation::new("TL", vec![Object::Real(leading)]),
        Operation::new(
            "Td",
            vec![Object::Real(PAGE_MARGIN), Object::Real(height - PAGE_MARGIN - size)],
        ),
    ];
    for line in wrap_lines(text, max_chars) {
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(win_ansi(&line), lopdf::StringFormat::Literal)],
        ));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

/// Greedy word wrap; source line breaks are kept.
fn wrap_lines(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for source_line in text.lines() {
        let mut current = String::new();
        for word in source_line.split_whitespace() {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}

/// Encode for a WinAnsi base-14 font; unmappable characters become `?`.
fn win_ansi(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| match c {
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '–' => 0x96,
            '—' => 0x97,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Closest standard-14 font for a family name.
fn base14_font(family: &str) -> &'static str {
    let lower = family.to_ascii_lowercase();
    if lower.contains("times") {
        "Times-Roman"
    } else if lower.contains("courier") {
        "Courier"
    } else if lower.contains("arial") || lower.contains("helvetica") {
        "Helvetica"
    } else {
        "Times-Roman"
    }
}

/// Write `bytes` to a temp sibling of `target`, then rename into place.
pub async fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = temp_sibling(target);
    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    if let Err(e) = tokio::fs::rename(&tmp, target).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

fn temp_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    target.with_file_name(format!(".{name}.tmp"))
}
