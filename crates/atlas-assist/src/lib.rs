//! Retrieval-augmented answering over the doctor profile index.
//!
//! [`Assistant::ask`] searches the shared [`VectorIndex`], hands the hits to
//! a [`ChatModel`] as grounding, and parses the reply. When the reply is not
//! the JSON the model was asked for, the retrieval hits are returned as the
//! matches instead.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use atlas_core::{Document, SearchHit};
use atlas_vector::VectorIndex;

pub mod answer;
pub mod llm;
pub mod prompt;

pub use answer::{fallback_matches, parse_answer, AnswerSource, ParsedAnswer};
pub use llm::{ChatModel, LlmError, OpenAiChat};

/// Owned copy of a search hit, serialized like [`SearchHit`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedProfile {
    pub doc: Document,
    pub score: f32,
    pub idx: usize,
}

impl From<&SearchHit<'_>> for RetrievedProfile {
    fn from(hit: &SearchHit<'_>) -> Self {
        Self { doc: hit.document.clone(), score: hit.score, idx: hit.position }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub matches: Vec<Value>,
    pub source: AnswerSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub context: Vec<RetrievedProfile>,
}

#[derive(Debug, thiserror::Error)]
pub enum AskError {
    #[error("Question is required")]
    EmptyQuestion,

    #[error("OPENAI_API_KEY not configured on server.")]
    NotConfigured,

    #[error("search failed: {0}")]
    Search(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

pub struct Assistant {
    index: Arc<VectorIndex>,
    chat: Option<Arc<dyn ChatModel>>,
}

impl Assistant {
    pub fn new(index: Arc<VectorIndex>) -> Self {
        Self { index, chat: None }
    }

    #[must_use]
    pub fn with_chat_model(mut self, chat: Arc<dyn ChatModel>) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn index(&self) -> &Arc<VectorIndex> { &self.index }

    pub fn has_chat_model(&self) -> bool { self.chat.is_some() }

    /// Top hits for `question`, searched on the blocking pool.
    pub async fn retrieve(&self, question: &str, k: Option<usize>) -> Result<Vec<RetrievedProfile>, AskError> {
        let index = Arc::clone(&self.index);
        let question = question.to_string();
        tokio::task::spawn_blocking(move || {
            let hits = index.search(&question, k);
            hits.iter().map(RetrievedProfile::from).collect::<Vec<_>>()
        })
        .await
        .map_err(|e| AskError::Search(e.to_string()))
    }

    pub async fn ask(&self, question: &str) -> Result<AskResponse, AskError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::EmptyQuestion);
        }

        let context = self.retrieve(question, None).await?;
        tracing::info!(query = question, results = context.len(), "search");
        for (i, p) in context.iter().enumerate() {
            tracing::info!(
                rank = i,
                id = %p.doc.id,
                name = p.doc.display_name(),
                specialty = p.doc.specialty.as_deref().unwrap_or(""),
                score = p.score,
                "result"
            );
        }
        tracing::debug!(context = %prompt::context_summary(&context), "grounding context");

        let chat = self.chat.as_ref().ok_or(AskError::NotConfigured)?;
        let answer = chat
            .complete(prompt::SYSTEM_PROMPT, &prompt::user_message(question, &context))
            .await?;

        let (matches, note, source) = match parse_answer(&answer) {
            Some(parsed) => (parsed.matches, parsed.note, AnswerSource::Llm),
            None => {
                tracing::warn!("model reply is not JSON, falling back to retrieval results");
                (fallback_matches(&context), None, AnswerSource::Retrieval)
            }
        };
        Ok(AskResponse { answer, matches, source, note, context })
    }
}
