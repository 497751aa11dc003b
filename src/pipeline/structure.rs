//! Structure extraction: one walk over every page builds the
//! [`StructuralProfile`].

use crate::document::{Hyperlink, ImagePlacement, StructuralProfile, TextSpan};
use crate::error::CollaboratorError;
use tracing::{debug, warn};

/// Low-level per-page view of a PDF, as offered by the parsing engine.
///
/// Pages are 0-based. Implemented by [`super::load::LoadedPdf`]; tests use
/// in-memory fakes.
pub trait StructuralAccessor: Send + Sync {
    fn page_count(&self) -> usize;

    /// Text runs with the font and size each was drawn in.
    fn page_spans(&self, page: usize) -> Result<Vec<TextSpan>, CollaboratorError>;

    /// Outgoing link URIs in discovery order.
    fn page_links(&self, page: usize) -> Result<Vec<String>, CollaboratorError>;

    /// Pixel dimensions `(width, height)` of each image drawn, in order.
    fn page_images(&self, page: usize) -> Result<Vec<(u32, u32)>, CollaboratorError>;
}

/// Visit every page once and aggregate fonts, links and images.
///
/// A page whose accessor calls fail contributes what it can and is logged;
/// extraction itself never fails.
pub fn extract_structure(accessor: &dyn StructuralAccessor) -> StructuralProfile {
    let mut profile = StructuralProfile::default();

    for page in 0..accessor.page_count() {
        match accessor.page_spans(page) {
            Ok(spans) => {
                for span in spans {
                    profile.record_font(&span.font, span.size);
                }
            }
            Err(e) => warn!("Page {}: font spans unavailable: {}", page + 1, e),
        }

        match accessor.page_links(page) {
            Ok(links) => profile
                .hyperlinks
                .extend(links.into_iter().map(|uri| Hyperlink { page, uri })),
            Err(e) => warn!("Page {}: links unavailable: {}", page + 1, e),
        }

        match accessor.page_images(page) {
            Ok(images) => profile.images.extend(images.into_iter().enumerate().map(
                |(index, (width, height))| ImagePlacement {
                    page,
                    index,
                    width,
                    height,
                },
            )),
            Err(e) => warn!("Page {}: images unavailable: {}", page + 1, e),
        }
    }

    debug!(
        "Structure: {} fonts, {} links, {} images",
        profile.fonts.len(),
        profile.hyperlinks.len(),
        profile.images.len()
    );
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakePdf {
        visits: AtomicUsize,
    }

    impl StructuralAccessor for FakePdf {
        fn page_count(&self) -> usize {
            3
        }

        fn page_spans(&self, page: usize) -> Result<Vec<TextSpan>, CollaboratorError> {
            self.visits.fetch_add(1, Ordering::SeqCst);
            let span = |font: &str, size| TextSpan {
                font: font.into(),
                size,
            };
            match page {
                0 => Ok(vec![span("Arial", 12.0), span("Arial", 12.0), span("Arial", 18.0)]),
                1 => Ok(vec![span("Georgia", 11.0), span("Arial", 12.0)]),
                _ => Err(CollaboratorError::Protocol {
                    engine: "fake".into(),
                    detail: "bad stream".into(),
                }),
            }
        }

        fn page_links(&self, page: usize) -> Result<Vec<String>, CollaboratorError> {
            Ok(match page {
                0 => vec!["https://a".into(), "ftp://b".into()],
                2 => vec!["mailto:c@d".into()],
                _ => vec![],
            })
        }

        fn page_images(&self, page: usize) -> Result<Vec<(u32, u32)>, CollaboratorError> {
            Ok(if page == 1 { vec![(10, 20), (30, 40)] } else { vec![] })
        }
    }

    fn fake() -> FakePdf {
        FakePdf {
            visits: AtomicUsize::new(0),
        }
    }

    #[test]
    fn aggregates_and_orders() {
        let pdf = fake();
        let profile = extract_structure(&pdf);
        assert_eq!(pdf.visits.load(Ordering::SeqCst), 3);
        assert_eq!(profile.fonts["Arial"], vec![12.0, 18.0]);
        assert_eq!(profile.fonts["Georgia"], vec![11.0]);
        let uris: Vec<_> = profile.hyperlinks.iter().map(|l| (l.page, l.uri.as_str())).collect();
        assert_eq!(uris, vec![(0, "https://a"), (0, "ftp://b"), (2, "mailto:c@d")]);
        assert_eq!(profile.images[1].index, 1);
        assert_eq!((profile.images[1].width, profile.images[1].height), (30, 40));
    }

    #[test]
    fn extraction_is_idempotent() {
        let pdf = fake();
        assert_eq!(extract_structure(&pdf), extract_structure(&pdf));
    }
}
