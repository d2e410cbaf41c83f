//! # LLM Gateway (C1)
//! One-shot calls to an external chat model and embedding model.
//! Nominally stateless; callers supply timeouts (spec §4.1, §5) and are
//! responsible for cancellation — every method here takes a `Duration`
//! deadline and maps timeout/transport/rate-limit failures onto
//! `ErrorKind::ExternalService`, and unparsable model output onto
//! `ErrorKind::MalformedResponse`.

pub mod http;
pub mod mock;

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::RequirementDelta;
use crate::error::Result;

pub use http::HttpLlmGateway;
pub use mock::MockLlmGateway;

/// Fields generated for a brand-new backlog card (spec §4.1, §4.9).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CardFields {
    pub title: String,
    pub description: String,
}

#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Idempotent: returns the input unchanged if it is already English.
    async fn translate_to_english(&self, text: &str, deadline: Duration) -> Result<String>;

    /// Extracts a structured delta from a user turn, given the prior
    /// accumulated state as context for disambiguation (spec §4.3).
    async fn extract_requirements(
        &self,
        user_turn_text: &str,
        prior_accumulated_hint: &str,
        deadline: Duration,
    ) -> Result<RequirementDelta>;

    /// Returns a dense 1536-dim embedding.
    async fn get_embedding(&self, text: &str, deadline: Duration) -> Result<Vec<f32>>;

    /// `title` must be non-empty and <=10 words; `description` a one
    /// paragraph English summary. Internal retries happen inside the
    /// implementation up to a small fixed bound.
    async fn generate_card_fields(&self, prompt_text: &str, deadline: Duration)
        -> Result<CardFields>;
}
