//! Text normalization: turns a profile into the single string that gets embedded.
//!
//! Both surface forms of a bilingual name are kept so that queries in either
//! language land near the same vector.

use crate::types::{Document, Name};

pub const FIELD_SEPARATOR: &str = ". ";

/// Embeddable text for one document.
///
/// Fields in order: primary name (or `full_name` when the primary name is
/// missing or empty), secondary-language name, specialty, bio, availability.
/// Each is trimmed; empty fields are dropped.
pub fn document_text(doc: &Document) -> String {
    let name = doc.name.as_ref();
    let primary = name
        .and_then(Name::primary)
        .filter(|s| !s.is_empty())
        .or(doc.full_name.as_deref());
    let secondary = name.and_then(Name::secondary);

    [
        primary,
        secondary,
        doc.specialty.as_deref(),
        doc.bio.as_deref(),
        doc.availability.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(FIELD_SEPARATOR)
}

/// Queries are embedded as given.
pub fn query_text(query: &str) -> &str {
    query
}
