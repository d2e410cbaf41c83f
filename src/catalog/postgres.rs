//! Postgres + pgvector implementation of `CatalogRepository` against the
//! schema in spec §6 (`application`, `application_search` with an HNSW
//! cosine index, `labels`, `application_labels`, `application_integration_keys`,
//! `apps_tags`, `cards`, `card_prompts_comments`). Connection pooling is the
//! one piece of genuinely out-of-scope plumbing (spec §1) — `deadpool_postgres`
//! is used because it is the pool the stack's `tokio-postgres` ecosystem
//! reaches for, not because pool tuning is part of this crate's scope.

use std::collections::HashMap;

use async_trait::async_trait;
use deadpool_postgres::Pool;
use pgvector::Vector;

use super::{AppFeatures, CatalogRepository};
use crate::domain::backlog::ActiveCardPrompts;
use crate::domain::application::CandidateApp;
use crate::domain::backlog::STATUS_ACTIVE;
use crate::error::{ErrorKind, Result};

pub struct PostgresCatalogRepository {
    pool: Pool,
}

impl PostgresCatalogRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn client(&self) -> Result<deadpool_postgres::Client> {
        self.pool
            .get()
            .await
            .map_err(|e| ErrorKind::storage(format!("failed to acquire db connection: {e}")))
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn vector_candidates(&self, buyer_embedding: &[f32], k: usize) -> Result<Vec<CandidateApp>> {
        let client = self.client().await?;
        let vector = Vector::from(buyer_embedding.to_vec());
        let rows = client
            .query(
                "SELECT s.id AS app_search_id, \
                        s.app_id, \
                        a.price_text, \
                        (s.embedding <=> $1) AS cosine_distance \
                 FROM application_search s \
                 JOIN application a ON a.id = s.app_id \
                 ORDER BY s.embedding <=> $1 \
                 LIMIT $2",
                &[&vector, &(k as i64)],
            )
            .await
            .map_err(|e| ErrorKind::storage(format!("vector_candidates query failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let app_search_id: i64 = row.get("app_search_id");
                let app_id: i64 = row.get("app_id");
                let price_text: String = row.get("price_text");
                let cosine_distance: f64 = row.get("cosine_distance");
                CandidateApp {
                    app_search_id: app_search_id.to_string(),
                    app_id: app_id.to_string(),
                    price_text,
                    // Cosine distance in pgvector is `1 - cosine_similarity`.
                    cosine_similarity: 1.0 - cosine_distance,
                    labels: Vec::new(),
                    integration_keys: Vec::new(),
                    tags: Vec::new(),
                    name: None,
                }
            })
            .collect())
    }

    async fn fetch_features(&self, app_search_ids: &[String]) -> Result<HashMap<String, AppFeatures>> {
        if app_search_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let client = self.client().await?;
        let ids: Vec<i64> = app_search_ids
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        let mut out: HashMap<String, AppFeatures> = HashMap::new();

        let label_rows = client
            .query(
                "SELECT app_search_id, label FROM application_labels WHERE app_search_id = ANY($1)",
                &[&ids],
            )
            .await
            .map_err(|e| ErrorKind::storage(format!("fetch_features labels failed: {e}")))?;
        for row in label_rows {
            let id: i64 = row.get(0);
            let label: String = row.get(1);
            out.entry(id.to_string()).or_default().labels.push(label);
        }

        let integration_rows = client
            .query(
                "SELECT app_search_id, integration_key FROM application_integration_keys WHERE app_search_id = ANY($1)",
                &[&ids],
            )
            .await
            .map_err(|e| ErrorKind::storage(format!("fetch_features integrations failed: {e}")))?;
        for row in integration_rows {
            let id: i64 = row.get(0);
            let key: String = row.get(1);
            out.entry(id.to_string())
                .or_default()
                .integration_keys
                .push(key);
        }

        // Tags and price are keyed by app_id, not app_search_id (spec §4.2).
        let app_ids: Vec<i64> = client
            .query(
                "SELECT id, app_id FROM application_search WHERE id = ANY($1)",
                &[&ids],
            )
            .await
            .map_err(|e| ErrorKind::storage(format!("fetch_features id map failed: {e}")))?
            .into_iter()
            .map(|row| row.get::<_, i64>("app_id"))
            .collect();

        if !app_ids.is_empty() {
            let tag_rows = client
                .query(
                    "SELECT app_id, tag FROM apps_tags WHERE app_id = ANY($1)",
                    &[&app_ids],
                )
                .await
                .map_err(|e| ErrorKind::storage(format!("fetch_features tags failed: {e}")))?;
            let mut tags_by_app: HashMap<i64, Vec<String>> = HashMap::new();
            for row in tag_rows {
                let app_id: i64 = row.get(0);
                let tag: String = row.get(1);
                tags_by_app.entry(app_id).or_default().push(tag);
            }

            let price_rows = client
                .query(
                    "SELECT id, price_text FROM application WHERE id = ANY($1)",
                    &[&app_ids],
                )
                .await
                .map_err(|e| ErrorKind::storage(format!("fetch_features price failed: {e}")))?;
            let mut price_by_app: HashMap<i64, String> = HashMap::new();
            for row in price_rows {
                let app_id: i64 = row.get(0);
                let price_text: String = row.get(1);
                price_by_app.insert(app_id, price_text);
            }

            // Re-join app_id-keyed data back onto app_search_id keys.
            let mapping = client
                .query(
                    "SELECT id, app_id FROM application_search WHERE id = ANY($1)",
                    &[&ids],
                )
                .await
                .map_err(|e| ErrorKind::storage(format!("fetch_features remap failed: {e}")))?;
            for row in mapping {
                let search_id: i64 = row.get("id");
                let app_id: i64 = row.get("app_id");
                let entry = out.entry(search_id.to_string()).or_default();
                if let Some(tags) = tags_by_app.get(&app_id) {
                    entry.tags = tags.clone();
                }
                if let Some(price) = price_by_app.get(&app_id) {
                    entry.price_text = price.clone();
                }
            }
        }

        Ok(out)
    }

    async fn fetch_synonyms(&self, label_names: &[String]) -> Result<HashMap<String, Vec<String>>> {
        if label_names.is_empty() {
            return Ok(HashMap::new());
        }
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT label, synonyms FROM labels WHERE label = ANY($1)",
                &[&label_names],
            )
            .await
            .map_err(|e| ErrorKind::storage(format!("fetch_synonyms failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let label: String = row.get("label");
                let synonyms: Vec<String> = row.get("synonyms");
                (label, synonyms)
            })
            .collect())
    }

    async fn fetch_app_names(&self, app_ids: &[String]) -> Result<HashMap<String, String>> {
        if app_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let client = self.client().await?;
        let ids: Vec<i64> = app_ids.iter().filter_map(|s| s.parse().ok()).collect();
        let rows = client
            .query("SELECT id, name FROM application WHERE id = ANY($1)", &[&ids])
            .await
            .map_err(|e| ErrorKind::storage(format!("fetch_app_names failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id: i64 = row.get("id");
                let name: String = row.get("name");
                (id.to_string(), name)
            })
            .collect())
    }

    async fn active_cards(&self) -> Result<Vec<ActiveCardPrompts>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT c.id, array_agg(p.prompt_text) AS prompts \
                 FROM cards c \
                 LEFT JOIN card_prompts_comments p ON p.card_id = c.id \
                 WHERE c.status = $1 \
                 GROUP BY c.id",
                &[&STATUS_ACTIVE],
            )
            .await
            .map_err(|e| ErrorKind::storage(format!("active_cards query failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id: i64 = row.get("id");
                let prompts: Vec<Option<String>> = row.get("prompts");
                ActiveCardPrompts {
                    id: id.to_string(),
                    prompts: prompts.into_iter().flatten().collect(),
                }
            })
            .collect())
    }
}
