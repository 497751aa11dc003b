//! Document loading: parse the PDF once and expose its pages and structure.
//!
//! ## Why spawn_blocking?
//!
//! Parsing and content-stream decoding are CPU-bound and synchronous in
//! `lopdf`. Both [`open`] and [`extract`] move that work onto the blocking
//! pool so the async workers stay free for engine I/O.
//!
//! The parsed [`LoadedPdf`] is kept for the whole run: the writer clones its
//! object graph to produce the output artifact, so the source file itself is
//! only read once and no handle outlives [`open`].

use super::structure::{extract_structure, StructuralAccessor};
use crate::document::{Document, Page, TextSpan};
use crate::error::{CollaboratorError, PdfCorrectError};
use lopdf::content::Content;
use lopdf::{Dictionary, Encoding, Object, ObjectId};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const ENGINE: &str = "lopdf";

/// Parent-chain depth guard for inherited page attributes.
const MAX_INHERIT_DEPTH: usize = 32;

/// A parsed PDF plus its page object ids in page order.
#[derive(Debug)]
pub struct LoadedPdf {
    path: PathBuf,
    doc: lopdf::Document,
    page_ids: Vec<ObjectId>,
}

/// Read and parse `path` on the blocking pool.
pub async fn open(path: &Path) -> Result<Arc<LoadedPdf>, PdfCorrectError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PdfCorrectError::FileNotFound { path: path.clone() },
            std::io::ErrorKind::PermissionDenied => {
                PdfCorrectError::PermissionDenied { path: path.clone() }
            }
            _ => PdfCorrectError::CorruptPdf {
                path: path.clone(),
                detail: e.to_string(),
            },
        })?;
        LoadedPdf::from_bytes(path, &bytes).map(Arc::new)
    })
    .await
    .map_err(|e| PdfCorrectError::Internal(format!("Load task panicked: {}", e)))?
}

/// Extract page text and the structural profile on the blocking pool.
pub async fn extract(pdf: Arc<LoadedPdf>) -> Result<Document, PdfCorrectError> {
    tokio::task::spawn_blocking(move || {
        let pages = pdf.extract_pages();
        let profile = extract_structure(pdf.as_ref());
        Document::new(pages, profile)
    })
    .await
    .map_err(|e| PdfCorrectError::Internal(format!("Extraction task panicked: {}", e)))
}

impl LoadedPdf {
    /// Parse an in-memory PDF. `path` is used for error messages only.
    pub fn from_bytes(path: PathBuf, bytes: &[u8]) -> Result<Self, PdfCorrectError> {
        if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
            let mut magic = [0u8; 4];
            let n = bytes.len().min(4);
            magic[..n].copy_from_slice(&bytes[..n]);
            return Err(PdfCorrectError::NotAPdf { path, magic });
        }

        let doc = lopdf::Document::load_mem(bytes).map_err(|e| PdfCorrectError::CorruptPdf {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        if doc.is_encrypted() {
            return Err(PdfCorrectError::Encrypted { path });
        }

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        info!("Loaded '{}': {} pages", path.display(), page_ids.len());
        Ok(Self {
            path,
            doc,
            page_ids,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed object graph.
    pub fn lopdf(&self) -> &lopdf::Document {
        &self.doc
    }

    /// Page object ids in page order.
    pub fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    /// Raw text of every page, in order. A page whose text cannot be
    /// extracted yields an empty string.
    pub fn extract_pages(&self) -> Vec<Page> {
        self.page_ids
            .iter()
            .enumerate()
            .map(|(index, page_id)| {
                let number = index + 1;
                let text = match self.page_text(*page_id) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!("Page {}: text extraction failed: {}", number, e);
                        String::new()
                    }
                };
                debug!("Page {}: {} chars of text", number, text.len());
                Page::new(index, text)
            })
            .collect()
    }

    /// Decode the show-text operators of one page.
    ///
    /// Fonts are looked up in the page's resources, inherited from the page
    /// tree when the page has none of its own. Strings in a font without a
    /// usable encoding fall back to Latin-1 (or UTF-16BE with a BOM).
    fn page_text(&self, page_id: ObjectId) -> Result<String, CollaboratorError> {
        let encodings: BTreeMap<Vec<u8>, Encoding<'_>> = self
            .page_fonts(page_id)
            .into_iter()
            .filter_map(|(key, font)| font.get_font_encoding(&self.doc).ok().map(|e| (key, e)))
            .collect();
        let content = self.page_content(page_id)?;

        let mut text = String::new();
        let mut current: Option<&Encoding<'_>> = None;
        let mut shows = 0usize;
        for op in &content.operations {
            match op.operator.as_str() {
                "Tf" => {
                    current = op
                        .operands
                        .first()
                        .and_then(|o| o.as_name().ok())
                        .and_then(|key| encodings.get(key));
                }
                "Tj" | "TJ" => {
                    shows += 1;
                    push_shown(&mut text, current, &op.operands);
                }
                "'" | "\"" => {
                    // `"` carries word and char spacing before its string.
                    shows += 1;
                    line_break(&mut text);
                    let string = op.operands.len().saturating_sub(1);
                    push_shown(&mut text, current, &op.operands[string..]);
                }
                "T*" | "ET" => line_break(&mut text),
                "Td" | "TD" => {
                    let moves_down = op.operands.get(1).and_then(number).is_some_and(|ty| ty != 0.0);
                    if moves_down {
                        line_break(&mut text);
                    }
                }
                _ => {}
            }
        }

        if shows > 0 && text.trim().is_empty() {
            warn!(
                "Page object {:?}: {} show-text operators but no decodable text",
                page_id, shows
            );
        }
        Ok(text)
    }

    // ── Object helpers ───────────────────────────────────────────────────

    fn page_id(&self, page: usize) -> Result<ObjectId, CollaboratorError> {
        self.page_ids
            .get(page)
            .copied()
            .ok_or_else(|| protocol(format!("page index {} out of range", page)))
    }

    /// Follow one level of indirection.
    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(obj) {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// `key` on the page dictionary, walking `/Parent` for inherited values.
    fn inherited<'a>(&'a self, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
        let mut current = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_INHERIT_DEPTH {
            if let Ok(value) = current.get(key) {
                return Some(value);
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    pub(crate) fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        self.inherited(page_id, b"Resources")
            .and_then(|r| self.resolve_dict(r))
    }

    /// `(width, height)` of the page's MediaBox in points; US Letter if absent.
    pub(crate) fn page_size(&self, page_id: ObjectId) -> (f32, f32) {
        let media_box = self
            .inherited(page_id, b"MediaBox")
            .map(|b| self.resolve(b))
            .and_then(|b| b.as_array().ok())
            .and_then(|a| {
                let n: Vec<f32> = a.iter().filter_map(number).collect();
                (n.len() == 4).then(|| (n[2] - n[0], n[3] - n[1]))
            });
        media_box.unwrap_or((612.0, 792.0))
    }

    /// Resource name → font dictionary, from the (possibly inherited)
    /// page resources.
    fn page_fonts(&self, page_id: ObjectId) -> BTreeMap<Vec<u8>, &Dictionary> {
        let Some(fonts) = self
            .page_resources(page_id)
            .and_then(|r| r.get(b"Font").ok())
            .and_then(|f| self.resolve_dict(f))
        else {
            return BTreeMap::new();
        };

        fonts
            .iter()
            .filter_map(|(key, value)| Some((key.clone(), self.resolve_dict(value)?)))
            .collect()
    }

    /// Resource name → base font name for the page's fonts.
    fn font_names(&self, page_id: ObjectId) -> BTreeMap<Vec<u8>, String> {
        self.page_fonts(page_id)
            .into_iter()
            .map(|(key, font)| {
                let name = font
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|n| n.as_name().ok())
                    .map(|n| strip_subset_prefix(&String::from_utf8_lossy(n)).to_string())
                    .unwrap_or_else(|| String::from_utf8_lossy(&key).to_string());
                (key, name)
            })
            .collect()
    }

    fn page_content(&self, page_id: ObjectId) -> Result<Content, CollaboratorError> {
        let bytes = self
            .doc
            .get_page_content(page_id)
            .map_err(|e| protocol(e.to_string()))?;
        Content::decode(&bytes).map_err(|e| protocol(e.to_string()))
    }
}

impl StructuralAccessor for LoadedPdf {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_spans(&self, page: usize) -> Result<Vec<TextSpan>, CollaboratorError> {
        let page_id = self.page_id(page)?;
        let fonts = self.font_names(page_id);
        let content = self.page_content(page_id)?;

        let mut spans = Vec::new();
        let mut current: Option<(String, f32)> = None;
        for op in &content.operations {
            match op.operator.as_str() {
                "Tf" => {
                    let key = op.operands.first().and_then(|o| o.as_name().ok());
                    let size = op.operands.get(1).and_then(number);
                    if let (Some(key), Some(size)) = (key, size) {
                        let font = fonts
                            .get(key)
                            .cloned()
                            .unwrap_or_else(|| String::from_utf8_lossy(key).to_string());
                        current = Some((font, size));
                    }
                }
                "Tj" | "TJ" | "'" | "\"" => {
                    if let Some((font, size)) = &current {
                        spans.push(TextSpan {
                            font: font.clone(),
                            size: *size,
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(spans)
    }

    fn page_links(&self, page: usize) -> Result<Vec<String>, CollaboratorError> {
        let page_id = self.page_id(page)?;
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| protocol(e.to_string()))?;
        let Ok(annots) = page_dict.get(b"Annots") else {
            return Ok(Vec::new());
        };
        let Ok(annots) = self.resolve(annots).as_array() else {
            return Ok(Vec::new());
        };

        let mut links = Vec::new();
        for annot in annots {
            let Some(annot) = self.resolve_dict(annot) else {
                continue;
            };
            let is_link = annot
                .get(b"Subtype")
                .ok()
                .and_then(|s| s.as_name().ok())
                .is_some_and(|s| s == b"Link");
            if !is_link {
                continue;
            }
            let uri = annot
                .get(b"A")
                .ok()
                .and_then(|a| self.resolve_dict(a))
                .and_then(|a| a.get(b"URI").ok())
                .map(|u| self.resolve(u));
            if let Some(Object::String(bytes, _)) = uri {
                links.push(String::from_utf8_lossy(bytes).to_string());
            }
        }
        Ok(links)
    }

    fn page_images(&self, page: usize) -> Result<Vec<(u32, u32)>, CollaboratorError> {
        let page_id = self.page_id(page)?;
        let Some(xobjects) = self
            .page_resources(page_id)
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|x| self.resolve_dict(x))
        else {
            return Ok(Vec::new());
        };
        let content = self.page_content(page_id)?;

        let mut images = Vec::new();
        let mut seen: BTreeSet<&[u8]> = BTreeSet::new();
        for op in content.operations.iter().filter(|op| op.operator == "Do") {
            let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) else {
                continue;
            };
            if !seen.insert(name) {
                continue;
            }
            let Some(xobject) = xobjects.get(name).ok().and_then(|x| self.resolve_dict(x)) else {
                continue;
            };
            let is_image = xobject
                .get(b"Subtype")
                .ok()
                .and_then(|s| s.as_name().ok())
                .is_some_and(|s| s == b"Image");
            if !is_image {
                continue;
            }
            let dim = |key: &[u8]| {
                xobject
                    .get(key)
                    .ok()
                    .and_then(|v| self.resolve(v).as_i64().ok())
                    .map(|v| v.max(0) as u32)
                    .unwrap_or(0)
            };
            images.push((dim(b"Width"), dim(b"Height")));
        }
        Ok(images)
    }
}

fn protocol(detail: String) -> CollaboratorError {
    CollaboratorError::Protocol {
        engine: ENGINE.into(),
        detail,
    }
}

pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Append the strings of a show-text operator. `TJ` kerning wider than
/// 100 thousandths of an em is read as a word space.
fn push_shown(text: &mut String, encoding: Option<&Encoding<'_>>, operands: &[Object]) {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => text.push_str(&decode_shown(encoding, bytes)),
            Object::Array(items) => push_shown(text, encoding, items),
            Object::Integer(_) | Object::Real(_) => {
                if number(operand).is_some_and(|n| n < -100.0) && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn decode_shown(encoding: Option<&Encoding<'_>>, bytes: &[u8]) -> String {
    if let Some(encoding) = encoding {
        if let Ok(decoded) = lopdf::Document::decode_text(encoding, bytes) {
            return decoded;
        }
    }
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn line_break(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}

/// "ABCDEF+Arial" → "Arial". Subset tags are six uppercase letters.
fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{dictionary, Stream};

    fn hello_ops() -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("Hello")]),
            Operation::new("ET", vec![]),
            Operation::new("Do", vec!["Im1".into()]),
        ]
    }

    /// One page drawing `operations` with /F1 (Helvetica) and image /Im1
    /// (40×30), plus one link annotation. Resources sit on the page itself
    /// or on the parent `/Pages` node.
    fn build_pdf(operations: Vec<Operation>, resources_on_page: bool) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "ABCDEF+Helvetica",
        });
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 40,
                "Height" => 30,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0u8; 1200],
        ));
        let resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => dictionary! { "Im1" => image_id },
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let link_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![0.into(), 0.into(), 10.into(), 10.into()],
            "A" => dictionary! { "S" => "URI", "URI" => Object::string_literal("ftp://x") },
        });
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Annots" => vec![link_id.into()],
        };
        let mut pages = dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        if resources_on_page {
            page.set("Resources", resources);
        } else {
            pages.set("Resources", resources);
        }
        let page_id = doc.add_object(page);
        pages.set("Kids", vec![Object::from(page_id)]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    fn load(bytes: Vec<u8>) -> LoadedPdf {
        LoadedPdf::from_bytes(PathBuf::from("sample.pdf"), &bytes).unwrap()
    }

    fn loaded() -> LoadedPdf {
        load(build_pdf(hello_ops(), false))
    }

    #[test]
    fn rejects_non_pdf_bytes() {
        let err = LoadedPdf::from_bytes(PathBuf::from("x.txt"), b"hello").unwrap_err();
        assert!(matches!(err, PdfCorrectError::NotAPdf { magic, .. } if &magic == b"hell"));
    }

    #[test]
    fn rejects_truncated_pdf() {
        let err = LoadedPdf::from_bytes(PathBuf::from("x.pdf"), b"%PDF-1.7\ngarbage").unwrap_err();
        assert!(matches!(err, PdfCorrectError::CorruptPdf { .. }), "got {err:?}");
    }

    #[test]
    fn extracts_text_and_inherited_resources() {
        let pdf = loaded();
        assert_eq!(pdf.page_count(), 1);
        let pages = pdf.extract_pages();
        assert_eq!(pages[0].raw_text(), "Hello\n");
        assert_eq!(pdf.page_size(pdf.page_ids()[0]), (595.0, 842.0));
    }

    #[test]
    fn extracts_text_with_resources_on_the_page() {
        let pdf = load(build_pdf(hello_ops(), true));
        assert_eq!(pdf.extract_pages()[0].raw_text(), "Hello\n");
        assert_eq!(pdf.page_spans(0).unwrap().len(), 1);
        assert_eq!(pdf.page_images(0).unwrap(), vec![(40, 30)]);
    }

    #[test]
    fn line_moves_and_kerning_shape_the_text() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Their"),
                    (-250).into(),
                    Object::string_literal("going"),
                    (-20).into(),
                    Object::string_literal("."),
                ])],
            ),
            Operation::new("Td", vec![0.into(), (-14).into()]),
            Operation::new("Tj", vec![Object::string_literal("Next")]),
            Operation::new("Td", vec![30.into(), 0.into()]),
            Operation::new("Tj", vec![Object::string_literal(" line")]),
            Operation::new("'", vec![Object::string_literal("Third")]),
            Operation::new("ET", vec![]),
        ];
        let pdf = load(build_pdf(ops, false));
        assert_eq!(pdf.extract_pages()[0].raw_text(), "Their going.\nNext line\nThird\n");
    }

    #[test]
    fn image_drawn_twice_counts_once() {
        let mut ops = hello_ops();
        ops.push(Operation::new("Do", vec!["Im1".into()]));
        let pdf = load(build_pdf(ops, false));
        assert_eq!(pdf.page_images(0).unwrap(), vec![(40, 30)]);
    }

    #[test]
    fn reads_spans_links_and_images() {
        let pdf = loaded();
        let spans = pdf.page_spans(0).unwrap();
        assert_eq!(
            spans,
            vec![TextSpan {
                font: "Helvetica".into(),
                size: 12.0
            }]
        );
        assert_eq!(pdf.page_links(0).unwrap(), vec!["ftp://x"]);
        assert_eq!(pdf.page_images(0).unwrap(), vec![(40, 30)]);
        assert!(pdf.page_spans(5).is_err());
    }

    #[test]
    fn subset_prefix() {
        assert_eq!(strip_subset_prefix("ABCDEF+Arial"), "Arial");
        assert_eq!(strip_subset_prefix("Arial"), "Arial");
        assert_eq!(strip_subset_prefix("Abc+Arial"), "Abc+Arial");
    }

    #[tokio::test]
    async fn open_missing_file() {
        let err = open(Path::new("/definitely/not/here.pdf")).await.unwrap_err();
        assert!(matches!(err, PdfCorrectError::FileNotFound { .. }));
    }
}
