//! Domain types shared by the embedder, the vector index and the answer layer.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type DocId = String;
pub type Extra = BTreeMap<String, Value>;

/// A doctor's display name.
///
/// Source records carry either a bare string or a per-language mapping
/// such as `{"en": "Dr. Sara", "ar": "د. سارة"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Name {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl Name {
    /// English (or only) surface form.
    pub fn primary(&self) -> Option<&str> {
        match self {
            Name::Plain(s) => Some(s),
            Name::Localized(_) => self.localized("en"),
        }
    }

    /// Arabic surface form, present only for localized names.
    pub fn secondary(&self) -> Option<&str> {
        self.localized("ar")
    }

    pub fn localized(&self, lang: &str) -> Option<&str> {
        match self {
            Name::Plain(_) => None,
            Name::Localized(map) => map.get(lang).map(String::as_str),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Name::Plain(s)),
            Value::Object(map) => Some(Name::Localized(
                map.into_iter()
                    .filter_map(|(lang, v)| scalar_text(v).map(|s| (lang, s)))
                    .collect(),
            )),
            _ => None,
        }
    }
}

/// One doctor profile.
///
/// Deserialization is lenient: a field with an unexpected JSON shape is
/// treated as absent instead of failing the whole record. Fields this type
/// does not model are kept in `extra` and serialized back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: DocId,
    #[serde(default, deserialize_with = "lenient_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<Name>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Document {
    pub fn new(id: impl Into<DocId>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    #[must_use]
    pub fn with_name(mut self, name: Name) -> Self {
        self.name = Some(name);
        self
    }

    #[must_use]
    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    #[must_use]
    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    #[must_use]
    pub fn with_availability(mut self, availability: impl Into<String>) -> Self {
        self.availability = Some(availability.into());
        self
    }

    /// Best human-readable name: the primary name, else `full_name`, else "".
    pub fn display_name(&self) -> &str {
        self.name
            .as_ref()
            .and_then(Name::primary)
            .filter(|s| !s.is_empty())
            .or(self.full_name.as_deref())
            .unwrap_or("")
    }
}

/// The ordered, immutable set of documents available for retrieval.
///
/// Positions are significant: position `i` is the join key between a
/// document and its vector in the index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    docs: Vec<Document>,
}

impl Corpus {
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Document> {
        self.docs.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.docs.iter()
    }

    pub fn as_slice(&self) -> &[Document] {
        &self.docs
    }
}

impl FromIterator<Document> for Corpus {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.iter()
    }
}

/// One ranked result of a vector search.
///
/// `score` is the cosine similarity in `[-1, 1]`, higher is better.
/// `position` is the document's index in the corpus.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<'a> {
    #[serde(rename = "doc")]
    pub document: &'a Document,
    pub score: f32,
    #[serde(rename = "idx")]
    pub position: usize,
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(Value::deserialize(de)?))
}

fn lenient_name<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Name>, D::Error> {
    Ok(Name::from_value(Value::deserialize(de)?))
}

fn lenient_id<'de, D: Deserializer<'de>>(de: D) -> Result<DocId, D::Error> {
    Ok(scalar_text(Value::deserialize(de)?).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn localized_and_plain_names() {
        let doc: Document = serde_json::from_value(json!({
            "id": "1", "name": {"en": "Dr. Sara", "ar": "د. سارة"}
        }))
        .unwrap();
        let name = doc.name.unwrap();
        assert_eq!(name.primary(), Some("Dr. Sara"));
        assert_eq!(name.secondary(), Some("د. سارة"));

        let doc: Document = serde_json::from_value(json!({"id": 2, "name": "Dr. Omar"})).unwrap();
        assert_eq!(doc.id, "2");
        assert_eq!(doc.name, Some(Name::Plain("Dr. Omar".into())));
        assert_eq!(doc.name.unwrap().secondary(), None);
    }

    #[test]
    fn malformed_fields_degrade_to_absent() {
        let doc: Document = serde_json::from_value(json!({
            "id": "3",
            "name": 42,
            "specialty": ["not", "text"],
            "bio": null,
            "availability": 5,
            "contact": {"phone": "123"}
        }))
        .unwrap();
        assert_eq!(doc.name, None);
        assert_eq!(doc.specialty, None);
        assert_eq!(doc.bio, None);
        assert_eq!(doc.availability.as_deref(), Some("5"));
        assert_eq!(doc.extra["contact"], json!({"phone": "123"}));
    }

    #[test]
    fn extra_fields_round_trip() {
        let src = json!({"id": "7", "name": "Dr. X", "location": "Amman"});
        let doc: Document = serde_json::from_value(src.clone()).unwrap();
        assert_eq!(serde_json::to_value(&doc).unwrap(), src);
    }

    #[test]
    fn display_name_falls_back_to_full_name() {
        let mut doc = Document::new("1").with_name(Name::Localized(BTreeMap::from([(
            "ar".to_string(),
            "د. سارة".to_string(),
        )])));
        doc.full_name = Some("Sara Haddad".into());
        assert_eq!(doc.display_name(), "Sara Haddad");
        assert_eq!(Document::new("2").display_name(), "");
    }
}
