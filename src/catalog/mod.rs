//! # Catalog Repository (C2)
//! Read-side access to the application catalog and the backlog's active
//! cards. Guarantees read-committed semantics (spec §4.2) — no snapshot
//! isolation is required, so the Postgres adapter below does not open a
//! repeatable-read transaction for reads.

pub mod mock;
pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::backlog::ActiveCardPrompts;
use crate::domain::application::CandidateApp;
use crate::error::Result;

pub use mock::MockCatalogRepository;
pub use postgres::PostgresCatalogRepository;

/// Per-app features batched from `application_labels`, `apps_tags`, and
/// `application_integration_keys` (spec §4.2). Tags are keyed by `app_id`;
/// labels/integrations by `app_search_id` — callers must not conflate them.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AppFeatures {
    pub labels: Vec<String>,
    pub integration_keys: Vec<String>,
    pub tags: Vec<String>,
    pub price_text: String,
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Cosine-distance ordered ascending (i.e. similarity descending),
    /// top `k` from the HNSW index over `application_search.embedding`.
    async fn vector_candidates(&self, buyer_embedding: &[f32], k: usize) -> Result<Vec<CandidateApp>>;

    /// Single batched read keyed by `app_search_id`.
    async fn fetch_features(&self, app_search_ids: &[String]) -> Result<HashMap<String, AppFeatures>>;

    /// `label -> {label, synonyms...}`.
    async fn fetch_synonyms(&self, label_names: &[String]) -> Result<HashMap<String, Vec<String>>>;

    /// `app_id -> name`.
    async fn fetch_app_names(&self, app_ids: &[String]) -> Result<HashMap<String, String>>;

    /// Active (`status = 1`) cards with their prompt texts, for backlog
    /// matching (spec §4.2, §4.8).
    async fn active_cards(&self) -> Result<Vec<ActiveCardPrompts>>;
}
