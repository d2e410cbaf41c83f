//! Deterministic in-memory `LlmGateway` for unit/integration tests: fixed,
//! injectable responses rather than real network calls.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{CardFields, LlmGateway};
use crate::domain::RequirementDelta;
use crate::error::Result;

pub struct MockLlmGateway {
    pub translations: Mutex<HashMap<String, String>>,
    pub extractions: Mutex<Vec<RequirementDelta>>,
    pub embedding_for: Mutex<HashMap<String, Vec<f32>>>,
    pub default_embedding: Vec<f32>,
    pub card_fields: CardFields,
}

impl Default for MockLlmGateway {
    fn default() -> Self {
        Self {
            translations: Mutex::new(HashMap::new()),
            extractions: Mutex::new(Vec::new()),
            embedding_for: Mutex::new(HashMap::new()),
            default_embedding: vec![0.1; 1536],
            card_fields: CardFields {
                title: "Untitled request".to_string(),
                description: "Generated description.".to_string(),
            },
        }
    }
}

impl MockLlmGateway {
    /// Queue the deltas `extract_requirements` returns, FIFO, one per call.
    pub fn with_extractions(deltas: Vec<RequirementDelta>) -> Self {
        Self {
            extractions: Mutex::new(deltas),
            ..Self::default()
        }
    }

    pub fn with_embedding(text: &str, vector: Vec<f32>) -> Self {
        let gateway = Self::default();
        gateway
            .embedding_for
            .lock()
            .unwrap()
            .insert(text.to_string(), vector);
        gateway
    }
}

#[async_trait]
impl LlmGateway for MockLlmGateway {
    async fn translate_to_english(&self, text: &str, _deadline: Duration) -> Result<String> {
        let translations = self.translations.lock().unwrap();
        Ok(translations.get(text).cloned().unwrap_or_else(|| text.to_string()))
    }

    async fn extract_requirements(
        &self,
        _user_turn_text: &str,
        _prior_accumulated_hint: &str,
        _deadline: Duration,
    ) -> Result<RequirementDelta> {
        let mut queue = self.extractions.lock().unwrap();
        if queue.is_empty() {
            Ok(RequirementDelta::default())
        } else {
            Ok(queue.remove(0))
        }
    }

    async fn get_embedding(&self, text: &str, _deadline: Duration) -> Result<Vec<f32>> {
        let table = self.embedding_for.lock().unwrap();
        Ok(table.get(text).cloned().unwrap_or_else(|| self.default_embedding.clone()))
    }

    async fn generate_card_fields(
        &self,
        _prompt_text: &str,
        _deadline: Duration,
    ) -> Result<CardFields> {
        Ok(self.card_fields.clone())
    }
}
