//! Loads the doctor profile corpus from a JSON array file.
//!
//! A missing or unreadable source is not fatal: [`load_corpus`] degrades to
//! the empty corpus and logs why.

use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Corpus, Document};

/// Load the corpus, degrading to empty on any source error.
pub fn load_corpus(path: &Path) -> Corpus {
    match try_load_corpus(path) {
        Ok(corpus) => {
            tracing::info!(path = %path.display(), docs = corpus.len(), "loaded corpus");
            corpus
        }
        Err(e) => {
            if path.exists() {
                tracing::error!(error = %e, "failed to load corpus, continuing with none");
            } else {
                tracing::warn!(path = %path.display(), "corpus file not found, continuing with none");
            }
            Corpus::empty()
        }
    }
}

pub fn try_load_corpus(path: &Path) -> Result<Corpus> {
    let unavailable = |reason: String| Error::SourceUnavailable { path: path.to_path_buf(), reason };
    let bytes = fs::read(path).map_err(|e| unavailable(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| unavailable(format!("not valid UTF-8: {e}")))?;
    parse_corpus(&text).map_err(|e| match e {
        Error::SourceUnavailable { reason, .. } => unavailable(reason),
        other => other,
    })
}

/// Parse corpus JSON.
///
/// `null` is the empty corpus. Entries that are not objects are skipped.
/// Records without a usable `id` get their position as id, suffixed when
/// that collides with an id already in the corpus.
pub fn parse_corpus(text: &str) -> Result<Corpus> {
    let root: Value = serde_json::from_str(text).map_err(|e| Error::SourceUnavailable {
        path: Default::default(),
        reason: format!("invalid JSON: {e}"),
    })?;
    let entries = match root {
        Value::Null => return Ok(Corpus::empty()),
        Value::Array(entries) => entries,
        other => {
            return Err(Error::SourceUnavailable {
                path: Default::default(),
                reason: format!("expected a JSON array of profiles, found {}", kind(&other)),
            })
        }
    };

    let mut docs = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        match to_document(entry) {
            Ok(doc) => docs.push(doc),
            Err(e) => tracing::warn!(entry = i, error = %e, "skipping profile"),
        }
    }
    fill_missing_ids(&mut docs);
    Ok(Corpus::new(docs))
}

fn fill_missing_ids(docs: &mut [Document]) {
    let mut taken: HashSet<String> =
        docs.iter().filter(|d| !d.id.is_empty()).map(|d| d.id.clone()).collect();
    for (pos, doc) in docs.iter_mut().enumerate() {
        if !doc.id.is_empty() {
            continue;
        }
        let mut id = pos.to_string();
        let mut n = 1;
        while taken.contains(&id) {
            id = format!("{pos}-{n}");
            n += 1;
        }
        tracing::debug!(position = pos, %id, "profile has no id");
        taken.insert(id.clone());
        doc.id = id;
    }
}

fn to_document(entry: Value) -> Result<Document> {
    if !entry.is_object() {
        return Err(Error::MalformedDocument(format!("expected an object, found {}", kind(&entry))));
    }
    serde_json::from_value(entry).map_err(|e| Error::MalformedDocument(e.to_string()))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
