//! Pipeline stages around the detectors.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ load ──▶ structure ──▶ [detectors] ──▶ write
//! (URL/path) (lopdf)  (fonts/links/images)          (atomic artifact)
//! ```
//!
//! 1. [`input`]: canonicalise the user-supplied path or URL to a local file
//! 2. [`load`]: parse once on the blocking pool; page text per page
//! 3. [`structure`]: one walk over all pages into a `StructuralProfile`
//! 4. [`write`]: commit every page, optionally re-typeset, temp + rename
//!
//! The detectors themselves live in [`crate::detector`]; sequencing is done
//! by [`crate::correct`].

pub mod input;
pub mod load;
pub mod structure;
pub mod write;
