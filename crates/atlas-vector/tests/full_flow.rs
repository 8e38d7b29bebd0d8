use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use serde_json::json;

use atlas_core::config::Settings;
use atlas_core::normalize::document_text;
use atlas_core::traits::Embedder;
use atlas_core::{Corpus, Document};
use atlas_embed::HashEmbedder;
use atlas_vector::VectorIndex;

fn corpus(value: serde_json::Value) -> Corpus {
    let docs: Vec<Document> = serde_json::from_value(value).expect("docs");
    Corpus::new(docs)
}

fn doctors() -> Corpus {
    corpus(json!([
        {"id": "1", "name": {"en": "Dr. Amir Khan"}, "specialty": "Cardiology",
         "bio": "Treats heart disease.", "availability": "Mon-Wed"},
        {"id": "2", "name": {"en": "Dr. Lina Haddad"}, "specialty": "Dermatology",
         "bio": "Skin conditions.", "availability": "Tue"},
        {"id": "3", "name": {"en": "Dr. Sara", "ar": "د. سارة"}, "specialty": "Pediatrics",
         "bio": "Child health and vaccinations.", "availability": "Thu"},
        {"id": "4", "name": "Dr. Omar Said", "specialty": "Orthopedics",
         "bio": "Bones, joints and sports injuries.", "availability": "Fri"},
        {"id": "5", "full_name": "Dr. Noor Aziz", "specialty": "Neurology",
         "bio": "Migraine and epilepsy care.", "availability": "Sat-Sun"}
    ]))
}

fn hash_index(corpus: Corpus) -> VectorIndex {
    VectorIndex::build(corpus, Box::new(HashEmbedder::default()))
}

fn init_tracing() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();
}

/// Maps exact texts to fixed (deliberately non-unit) vectors.
struct TableEmbedder(HashMap<String, Vec<f32>>);

impl Embedder for TableEmbedder {
    fn dim(&self) -> usize { 2 }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|t| self.0.get(t).cloned().ok_or_else(|| anyhow!("unknown text {t:?}")))
            .collect()
    }
}

/// Fails on any batch containing the word "boom".
struct FussyEmbedder;

impl Embedder for FussyEmbedder {
    fn dim(&self) -> usize { HashEmbedder::DEFAULT_DIM }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains("boom")) {
            return Err(anyhow!("model exploded"));
        }
        HashEmbedder::default().embed_batch(texts)
    }
}

/// Returns one vector too few.
struct ShortEmbedder;

impl Embedder for ShortEmbedder {
    fn dim(&self) -> usize { 4 }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().skip(1).map(|_| vec![1.0; 4]).collect())
    }
}

#[test]
fn cardiology_query_finds_cardiologist() {
    init_tracing();
    let index = hash_index(corpus(json!([
        {"id": "1", "name": {"en": "Dr. Amir Khan"}, "specialty": "Cardiology",
         "bio": "Treats heart disease.", "availability": "Mon-Wed"},
        {"id": "2", "name": {"en": "Dr. Lina Haddad"}, "specialty": "Dermatology",
         "bio": "Skin conditions.", "availability": "Tue"}
    ])));
    assert!(index.is_built());

    let hits = index.search("cardiologist available Monday", Some(1));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document.id, "1");
    assert_eq!(hits[0].position, 0);
}

#[test]
fn arabic_name_recalls_bilingual_profile() {
    let index = hash_index(doctors());
    let hits = index.search("سارة", Some(2));
    assert!(hits.iter().any(|h| h.document.id == "3"), "hits: {hits:?}");
}

#[test]
fn hits_sorted_descending_and_bounded() {
    let index = hash_index(doctors());
    for query in ["heart", "skin rash", "child vaccinations", "sports injury", "migraine weekend", "doctor"] {
        for k in [1, 2, 3, 5, 10] {
            let hits = index.search(query, Some(k));
            assert!(hits.len() <= k);
            assert!(hits.len() <= index.len());
            for pair in hits.windows(2) {
                assert!(pair[0].score >= pair[1].score, "{query}: {} < {}", pair[0].score, pair[1].score);
            }
            for h in &hits {
                assert!((-1.0001f32..=1.0001).contains(&h.score));
                assert_eq!(index.corpus().get(h.position).map(|d| &d.id), Some(&h.document.id));
            }
        }
    }
}

#[test]
fn k_larger_than_corpus_returns_whole_corpus() {
    let index = hash_index(doctors());
    let hits = index.search("doctor", Some(50));
    assert_eq!(hits.len(), 5);
}

#[test]
fn search_is_deterministic() {
    let index = hash_index(doctors());
    let a: Vec<(usize, f32)> = index.search("heart disease", Some(3)).iter().map(|h| (h.position, h.score)).collect();
    let b: Vec<(usize, f32)> = index.search("heart disease", Some(3)).iter().map(|h| (h.position, h.score)).collect();
    assert_eq!(a, b);

    let rebuilt = hash_index(doctors());
    let c: Vec<(usize, f32)> = rebuilt.search("heart disease", Some(3)).iter().map(|h| (h.position, h.score)).collect();
    assert_eq!(a, c);
}

#[test]
fn own_text_is_top_hit_with_unit_score() {
    let corpus = doctors();
    let index = hash_index(corpus.clone());
    for (i, doc) in corpus.iter().enumerate() {
        let hits = index.search(&document_text(doc), Some(1));
        assert_eq!(hits[0].position, i);
        assert!((hits[0].score - 1.0).abs() < 1e-5, "score {}", hits[0].score);
    }
}

#[test]
fn default_k_applies_when_not_given() {
    let index = hash_index(doctors());
    assert_eq!(index.default_k(), 3);
    assert_eq!(index.search("doctor", None).len(), 3);

    let index = index.with_default_k(2);
    assert_eq!(index.search("doctor", None).len(), 2);
}

#[test]
fn cosine_ranking_ignores_vector_length() {
    // Raw inner product would rank "long" first (110 vs 10); after
    // normalizing both sides "short" is the closer direction.
    let corpus = corpus(json!([{"id": "long", "name": "long"}, {"id": "short", "name": "short"}]));
    let table = HashMap::from([
        ("long".to_string(), vec![10.0, 10.0]),
        ("short".to_string(), vec![1.0, 0.0]),
        ("q".to_string(), vec![10.0, 1.0]),
    ]);
    let index = VectorIndex::build(corpus, Box::new(TableEmbedder(table)));
    assert!(index.is_built());

    let hits = index.search("q", Some(2));
    let ids: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
    assert_eq!(ids, vec!["short", "long"]);
    // Query side is normalized too, otherwise scores would exceed 1.
    let q = (10.0f32 * 10.0 + 1.0).sqrt();
    assert!((hits[0].score - 10.0 / q).abs() < 1e-5);
    assert!((hits[1].score - 110.0 / (q * 200f32.sqrt())).abs() < 1e-5);
}

#[test]
fn empty_corpus_never_loads_embedder() {
    let index = VectorIndex::build_with(Corpus::empty(), || panic!("embedder must not be loaded"));
    assert!(!index.is_built());
    assert!(index.is_empty());
    assert!(index.search("anything", Some(3)).is_empty());
}

#[test]
fn loader_failure_degrades_to_no_index() {
    init_tracing();
    let index = VectorIndex::build_with(doctors(), || Err(anyhow!("model files missing")));
    assert!(!index.is_built());
    assert_eq!(index.len(), 5);
    assert_eq!(index.dim(), None);
    assert!(index.search("heart", Some(3)).is_empty());
}

#[test]
fn embedding_failure_during_build_degrades_to_no_index() {
    let corpus = corpus(json!([{"id": "1", "bio": "boom"}, {"id": "2", "bio": "calm"}]));
    let index = VectorIndex::build(corpus, Box::new(FussyEmbedder));
    assert!(!index.is_built());
    assert!(index.search("calm", None).is_empty());
}

#[test]
fn wrong_vector_count_degrades_to_no_index() {
    let index = VectorIndex::build(doctors(), Box::new(ShortEmbedder));
    assert!(!index.is_built());
    assert!(index.search("heart", Some(1)).is_empty());
}

#[test]
fn query_embedding_failure_returns_no_hits() {
    let index = VectorIndex::build(doctors(), Box::new(FussyEmbedder));
    assert!(index.is_built());
    assert!(index.search("boom", Some(3)).is_empty());
    assert!(!index.search("heart", Some(3)).is_empty());
}

#[test]
fn blank_query_and_zero_k_return_no_hits() {
    let index = hash_index(doctors());
    assert!(index.search("", Some(3)).is_empty());
    assert!(index.search("   ", Some(3)).is_empty());
    assert!(index.search("heart", Some(0)).is_empty());
}

#[test]
fn concurrent_searches_agree() {
    let index = Arc::new(hash_index(doctors()));
    let expected: Vec<usize> = index.search("heart disease", Some(3)).iter().map(|h| h.position).collect();
    std::thread::scope(|s| {
        for _ in 0..4 {
            let index = Arc::clone(&index);
            let expected = expected.clone();
            s.spawn(move || {
                for _ in 0..25 {
                    let got: Vec<usize> = index.search("heart disease", Some(3)).iter().map(|h| h.position).collect();
                    assert_eq!(got, expected);
                }
            });
        }
    });
}

#[test]
fn build_from_settings_uses_configured_embedder_and_k() {
    let mut settings = Settings::default();
    settings.embed.use_fake_embeddings = true;
    settings.search.top_k = 4;
    let index = VectorIndex::build_from_settings(doctors(), &settings);
    assert!(index.is_built());
    assert_eq!(index.dim(), Some(HashEmbedder::DEFAULT_DIM));
    assert_eq!(index.search("doctor", None).len(), 4);
}

#[test]
fn hits_serialize_with_doc_score_idx() {
    let index = hash_index(doctors());
    let hits = index.search("heart", Some(1));
    let value = serde_json::to_value(&hits).unwrap();
    assert_eq!(value[0]["doc"]["id"], "1");
    assert!(value[0]["score"].is_number());
    assert_eq!(value[0]["idx"], 0);
}
