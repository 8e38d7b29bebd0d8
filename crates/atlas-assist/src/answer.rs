//! Tolerant parsing of model output.
//!
//! Models are asked for a JSON object but may wrap it in a Markdown fence,
//! return a bare array, or answer in prose. Prose yields `None` and the
//! caller falls back to the retrieval hits.

use serde::Serialize;
use serde_json::{json, Value};

use crate::prompt::contact;
use crate::RetrievedProfile;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnswer {
    pub matches: Vec<Value>,
    pub note: Option<String>,
}

/// Where the `matches` of a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Llm,
    Retrieval,
}

pub fn parse_answer(answer: &str) -> Option<ParsedAnswer> {
    let body = strip_code_fence(answer.trim());
    match serde_json::from_str::<Value>(body).ok()? {
        Value::Object(mut map) => {
            let Value::Array(matches) = map.remove("matches")? else {
                return None;
            };
            let note = map.remove("note").and_then(|n| n.as_str().map(str::to_string));
            Some(ParsedAnswer { matches, note })
        }
        Value::Array(items) => Some(ParsedAnswer { matches: items, note: None }),
        _ => None,
    }
}

/// Strips a Markdown fence and its language tag, on one line or several.
fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.trim_end();
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        .trim()
}

/// Matches in the shape the model is asked for, built from retrieval hits.
pub fn fallback_matches(context: &[RetrievedProfile]) -> Vec<Value> {
    context
        .iter()
        .map(|p| {
            json!({
                "id": p.doc.id,
                "name": p.doc.display_name(),
                "specialty": p.doc.specialty,
                "availability": p.doc.availability,
                "one_sentence_bio": p.doc.bio.as_deref().map(first_sentence),
                "contact_if_available": contact(&p.doc),
                "score": p.score,
            })
        })
        .collect()
}

fn first_sentence(text: &str) -> &str {
    let text = text.trim();
    match text.find(". ") {
        Some(end) => &text[..=end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_with_matches() {
        let parsed = parse_answer(r#"{"matches": [{"id": "1"}], "note": "ok"}"#).unwrap();
        assert_eq!(parsed.matches, vec![json!({"id": "1"})]);
        assert_eq!(parsed.note.as_deref(), Some("ok"));
    }

    #[test]
    fn empty_matches_with_note() {
        let parsed =
            parse_answer(r#"{"matches":[], "note":"Information not available in profiles"}"#).unwrap();
        assert!(parsed.matches.is_empty());
        assert_eq!(parsed.note.as_deref(), Some("Information not available in profiles"));
    }

    #[test]
    fn bare_array() {
        let parsed = parse_answer(r#"[{"id": "2"}, {"id": "1"}]"#).unwrap();
        assert_eq!(parsed.matches.len(), 2);
        assert_eq!(parsed.note, None);
    }

    #[test]
    fn fenced_json() {
        let parsed = parse_answer("```json\n{\"matches\": [{\"id\": \"1\"}]}\n```").unwrap();
        assert_eq!(parsed.matches[0]["id"], "1");
        let parsed = parse_answer("```\n[]\n```").unwrap();
        assert!(parsed.matches.is_empty());
    }

    #[test]
    fn one_line_fenced_json() {
        let parsed = parse_answer("```json {\"matches\": [{\"id\": \"2\"}]}```").unwrap();
        assert_eq!(parsed.matches[0]["id"], "2");
        let parsed = parse_answer("```{\"matches\": []}```").unwrap();
        assert!(parsed.matches.is_empty());
        let parsed = parse_answer("```json[]```").unwrap();
        assert!(parsed.matches.is_empty());
    }

    #[test]
    fn prose_and_odd_shapes_are_rejected() {
        assert_eq!(parse_answer("Dr. Amir Khan is available on Monday."), None);
        assert_eq!(parse_answer(""), None);
        assert_eq!(parse_answer(r#"{"answer": "no matches key"}"#), None);
        assert_eq!(parse_answer(r#"{"matches": "Dr. Amir"}"#), None);
        assert_eq!(parse_answer(r#"{"matches": null}"#), None);
        assert_eq!(parse_answer("42"), None);
    }

    #[test]
    fn first_sentence_cuts_at_period_space() {
        assert_eq!(first_sentence("Treats heart disease. Also lipids."), "Treats heart disease.");
        assert_eq!(first_sentence(" Skin conditions "), "Skin conditions");
    }

    #[test]
    fn fallback_uses_requested_keys() {
        let ctx = vec![RetrievedProfile {
            doc: serde_json::from_value(json!({
                "id": "1", "name": {"en": "Dr. Amir"}, "specialty": "Cardiology",
                "bio": "Heart. Lungs.", "contact": "555-0100"
            }))
            .unwrap(),
            score: 0.8,
            idx: 0,
        }];
        let m = fallback_matches(&ctx);
        assert_eq!(m[0]["id"], "1");
        assert_eq!(m[0]["name"], "Dr. Amir");
        assert_eq!(m[0]["one_sentence_bio"], "Heart.");
        assert_eq!(m[0]["contact_if_available"], "555-0100");
        assert!(m[0]["availability"].is_null());
    }
}
