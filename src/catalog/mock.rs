//! In-memory `CatalogRepository` for unit/integration tests.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{AppFeatures, CatalogRepository};
use crate::domain::application::CandidateApp;
use crate::domain::backlog::ActiveCardPrompts;
use crate::error::Result;

#[derive(Default)]
pub struct MockCatalogRepository {
    pub candidates: Vec<CandidateApp>,
    pub features: HashMap<String, AppFeatures>,
    pub synonyms: HashMap<String, Vec<String>>,
    pub names: HashMap<String, String>,
    pub cards: Vec<ActiveCardPrompts>,
}

#[async_trait]
impl CatalogRepository for MockCatalogRepository {
    async fn vector_candidates(&self, _buyer_embedding: &[f32], k: usize) -> Result<Vec<CandidateApp>> {
        Ok(self.candidates.iter().take(k).cloned().collect())
    }

    async fn fetch_features(&self, app_search_ids: &[String]) -> Result<HashMap<String, AppFeatures>> {
        Ok(app_search_ids
            .iter()
            .filter_map(|id| self.features.get(id).map(|f| (id.clone(), f.clone())))
            .collect())
    }

    async fn fetch_synonyms(&self, label_names: &[String]) -> Result<HashMap<String, Vec<String>>> {
        Ok(label_names
            .iter()
            .filter_map(|l| self.synonyms.get(l).map(|s| (l.clone(), s.clone())))
            .collect())
    }

    async fn fetch_app_names(&self, app_ids: &[String]) -> Result<HashMap<String, String>> {
        Ok(app_ids
            .iter()
            .filter_map(|id| self.names.get(id).map(|n| (id.clone(), n.clone())))
            .collect())
    }

    async fn active_cards(&self) -> Result<Vec<ActiveCardPrompts>> {
        Ok(self.cards.clone())
    }
}
