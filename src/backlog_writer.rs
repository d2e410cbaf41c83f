//! # Backlog Writer (C9)
//! Transactionally appends a prompt to an existing card or creates a new
//! one (spec §4.9). The original prompt text is stored verbatim even though
//! card-field generation uses the English-normalized text.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::backlog_matcher::{match_backlog, BacklogMatch};
use crate::catalog::CatalogRepository;
use crate::error::Result;
use crate::llm::LlmGateway;

/// Write-side of the backlog store. Deliberately separate from
/// `CatalogRepository` (C2), which is read-only (spec §4.2): this trait is
/// the "interface the core consumes" for the transactional bookkeeping in
/// §4.9, with a Postgres adapter provided in `postgres`.
#[async_trait]
pub trait BacklogStore: Send + Sync {
    /// Inserts a `card_prompts_comments` row for `card_id` and atomically
    /// increments that card's `number_of_requests`, in one transaction.
    async fn attach_prompt(&self, card_id: &str, original_prompt_text: &str, comment_text: Option<&str>) -> Result<()>;

    /// Creates a new active card (`number_of_requests = 1`) and its first
    /// `card_prompts_comments` row in one transaction. Returns the new
    /// card's id.
    async fn create_card(
        &self,
        title: &str,
        description: &str,
        original_prompt_text: &str,
        comment_text: Option<&str>,
    ) -> Result<String>;
}

pub mod postgres {
    use super::BacklogStore;
    use crate::error::{ErrorKind, Result};
    use async_trait::async_trait;
    use deadpool_postgres::Pool;

    pub struct PostgresBacklogStore {
        pool: Pool,
    }

    impl PostgresBacklogStore {
        pub fn new(pool: Pool) -> Self {
            Self { pool }
        }
    }

    #[async_trait]
    impl BacklogStore for PostgresBacklogStore {
        async fn attach_prompt(&self, card_id: &str, original_prompt_text: &str, comment_text: Option<&str>) -> Result<()> {
            let card_id: i64 = card_id
                .parse()
                .map_err(|_| ErrorKind::storage("card_id is not a valid identifier"))?;
            let mut client = self
                .pool
                .get()
                .await
                .map_err(|e| ErrorKind::storage(format!("failed to acquire db connection: {e}")))?;
            let txn = client
                .transaction()
                .await
                .map_err(|e| ErrorKind::storage(format!("failed to open transaction: {e}")))?;

            txn.execute(
                "INSERT INTO card_prompts_comments (card_id, prompt_text, comment_text, created_at) \
                 VALUES ($1, $2, $3, now())",
                &[&card_id, &original_prompt_text, &comment_text],
            )
            .await
            .map_err(|e| ErrorKind::storage(format!("insert prompt_comment failed: {e}")))?;

            txn.execute(
                "UPDATE cards SET number_of_requests = number_of_requests + 1 WHERE id = $1",
                &[&card_id],
            )
            .await
            .map_err(|e| ErrorKind::storage(format!("increment number_of_requests failed: {e}")))?;

            txn.commit()
                .await
                .map_err(|e| ErrorKind::storage(format!("commit failed: {e}")))?;
            Ok(())
        }

        async fn create_card(
            &self,
            title: &str,
            description: &str,
            original_prompt_text: &str,
            comment_text: Option<&str>,
        ) -> Result<String> {
            use crate::domain::backlog::STATUS_ACTIVE;

            let mut client = self
                .pool
                .get()
                .await
                .map_err(|e| ErrorKind::storage(format!("failed to acquire db connection: {e}")))?;
            let txn = client
                .transaction()
                .await
                .map_err(|e| ErrorKind::storage(format!("failed to open transaction: {e}")))?;

            let row = txn
                .query_one(
                    "INSERT INTO cards (title, description, status, number_of_requests, created_at) \
                     VALUES ($1, $2, $3, 1, now()) RETURNING id",
                    &[&title, &description, &STATUS_ACTIVE],
                )
                .await
                .map_err(|e| ErrorKind::storage(format!("insert card failed: {e}")))?;
            let card_id: i64 = row.get(0);

            txn.execute(
                "INSERT INTO card_prompts_comments (card_id, prompt_text, comment_text, created_at) \
                 VALUES ($1, $2, $3, now())",
                &[&card_id, &original_prompt_text, &comment_text],
            )
            .await
            .map_err(|e| ErrorKind::storage(format!("insert prompt_comment failed: {e}")))?;

            txn.commit()
                .await
                .map_err(|e| ErrorKind::storage(format!("commit failed: {e}")))?;
            Ok(card_id.to_string())
        }
    }
}

pub mod mock {
    use super::BacklogStore;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub struct AttachedPrompt {
        pub card_id: String,
        pub prompt_text: String,
        pub comment_text: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct CreatedCard {
        pub id: String,
        pub title: String,
        pub description: String,
        pub prompt_text: String,
    }

    #[derive(Default)]
    pub struct MockBacklogStore {
        pub attached: Mutex<Vec<AttachedPrompt>>,
        pub created: Mutex<Vec<CreatedCard>>,
        next_id: Mutex<u64>,
    }

    #[async_trait]
    impl BacklogStore for MockBacklogStore {
        async fn attach_prompt(&self, card_id: &str, original_prompt_text: &str, comment_text: Option<&str>) -> Result<()> {
            self.attached.lock().unwrap().push(AttachedPrompt {
                card_id: card_id.to_string(),
                prompt_text: original_prompt_text.to_string(),
                comment_text: comment_text.map(String::from),
            });
            Ok(())
        }

        async fn create_card(
            &self,
            title: &str,
            description: &str,
            original_prompt_text: &str,
            _comment_text: Option<&str>,
        ) -> Result<String> {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let id = next_id.to_string();
            self.created.lock().unwrap().push(CreatedCard {
                id: id.clone(),
                title: title.to_string(),
                description: description.to_string(),
                prompt_text: original_prompt_text.to_string(),
            });
            Ok(id)
        }
    }
}

/// Orchestrates C8 (match) + C9 (write) for `POST /backlog/ingest` (spec
/// §4.8/§4.9). The original, untranslated `prompt_text` is what gets
/// persisted in the child row; only the English-normalized text is used
/// for matching and, on the no-match path, card-field generation.
pub async fn ingest(
    gateway: &dyn LlmGateway,
    catalog: &dyn CatalogRepository,
    store: &dyn BacklogStore,
    prompt_text: &str,
    comment_text: Option<&str>,
    deadline: Duration,
    rng: &mut impl Rng,
) -> Result<()> {
    let (decision, english_prompt) =
        match_backlog(gateway, catalog, prompt_text, comment_text, deadline, rng).await?;

    match decision {
        BacklogMatch::Card(card_id) => {
            crate::metrics::record_backlog_match();
            store.attach_prompt(&card_id, prompt_text, comment_text).await
        }
        BacklogMatch::NoMatch => {
            let fields = gateway.generate_card_fields(&english_prompt, deadline).await?;
            let result = store
                .create_card(&fields.title, &fields.description, prompt_text, comment_text)
                .await
                .map(|_| ());
            if result.is_ok() {
                crate::metrics::record_backlog_new_card();
            }
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockBacklogStore;
    use super::*;
    use crate::catalog::MockCatalogRepository;
    use crate::domain::backlog::ActiveCardPrompts;
    use crate::llm::MockLlmGateway;
    use rand::{rngs::StdRng, SeedableRng};

    #[tokio::test]
    async fn no_match_creates_new_card_and_stores_original_prompt_verbatim() {
        let gateway = MockLlmGateway::default();
        let catalog = MockCatalogRepository::default();
        let store = MockBacklogStore::default();
        let mut rng = StdRng::seed_from_u64(1);

        ingest(
            &gateway,
            &catalog,
            &store,
            "Necesito integrar Stripe",
            None,
            Duration::from_secs(1),
            &mut rng,
        )
        .await
        .unwrap();

        let created = store.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].prompt_text, "Necesito integrar Stripe");
        assert!(store.attached.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn match_attaches_prompt_and_increments_without_creating_card() {
        let gateway = MockLlmGateway::with_embedding("x", vec![1.0; 1536]);
        {
            let mut e = gateway.embedding_for.lock().unwrap();
            e.insert("needs stripe".to_string(), vec![1.0; 1536]);
            e.insert("sampled".to_string(), vec![1.0; 1536]);
        }
        let catalog = MockCatalogRepository {
            cards: vec![ActiveCardPrompts {
                id: "card-9".to_string(),
                prompts: vec!["sampled".to_string()],
            }],
            ..Default::default()
        };
        let store = MockBacklogStore::default();
        let mut rng = StdRng::seed_from_u64(2);

        ingest(
            &gateway,
            &catalog,
            &store,
            "needs stripe",
            Some("payments"),
            Duration::from_secs(1),
            &mut rng,
        )
        .await
        .unwrap();

        assert_eq!(store.attached.lock().unwrap().len(), 1);
        assert!(store.created.lock().unwrap().is_empty());
        assert_eq!(store.attached.lock().unwrap()[0].card_id, "card-9");
    }
}
