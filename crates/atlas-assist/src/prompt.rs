//! System instruction and grounding payload sent to the language model.

use serde::Serialize;
use serde_json::Value;

use atlas_core::Document;

use crate::RetrievedProfile;

pub const SYSTEM_PROMPT: &str = "Use ONLY the provided doctor profiles to answer the user's question.\n\
Return matched doctors ranked by relevance with keys: id, name, specialty, availability, one_sentence_bio, contact_if_available.\n\
OUTPUT MUST BE A JSON OBJECT ONLY. If no relevant info, return {\"matches\":[], \"note\":\"Information not available in profiles\"}.";

pub const NO_PROFILES: &str = "No relevant doctors found.";

/// Profile as shown to the model: only the fields it needs to answer.
#[derive(Debug, Serialize)]
pub struct CompactProfile<'a> {
    pub id: &'a str,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_ar: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<&'a Value>,
    pub score: f32,
}

impl<'a> CompactProfile<'a> {
    pub fn new(doc: &'a Document, score: f32) -> Self {
        Self {
            id: &doc.id,
            name: doc.display_name(),
            name_ar: doc.name.as_ref().and_then(|n| n.secondary()),
            specialty: doc.specialty.as_deref(),
            availability: doc.availability.as_deref(),
            bio: doc.bio.as_deref(),
            contact: contact(doc),
            score,
        }
    }
}

pub(crate) fn contact(doc: &Document) -> Option<&Value> {
    doc.extra.get("contact").filter(|v| !v.is_null())
}

/// User message: the question followed by the retrieved profiles as JSON,
/// best match first.
pub fn user_message(question: &str, context: &[RetrievedProfile]) -> String {
    let question = question.trim();
    if context.is_empty() {
        return format!("Question: {question}\n\n{NO_PROFILES}");
    }
    let profiles: Vec<CompactProfile<'_>> = context
        .iter()
        .map(|p| CompactProfile::new(&p.doc, p.score))
        .collect();
    let payload = serde_json::to_string_pretty(&profiles).unwrap_or_else(|_| "[]".to_string());
    format!("Question: {question}\n\nDoctor profiles (most relevant first):\n{payload}")
}

/// One line per profile, for logs.
pub fn context_summary(context: &[RetrievedProfile]) -> String {
    context
        .iter()
        .map(|p| {
            format!(
                "{} - {}. Availability: {}. {}",
                p.doc.display_name(),
                p.doc.specialty.as_deref().unwrap_or(""),
                p.doc.availability.as_deref().unwrap_or(""),
                p.doc.bio.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
