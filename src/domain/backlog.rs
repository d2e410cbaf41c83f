//! Backlog card + child prompt/comment rows (spec §3, §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `status` code for an active card (spec §3: "`active` is status code 1").
pub const STATUS_ACTIVE: i32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BacklogCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: i32,
    pub number_of_requests: u32,
    pub created_at: DateTime<Utc>,
}

impl BacklogCard {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptComment {
    pub id: String,
    pub card_id: String,
    pub prompt_text: String,
    pub comment_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An active card together with its prompt texts only, the shape
/// `CatalogRepository::active_cards` returns for backlog matching
/// (spec §4.2): `{id, prompts: [text...]}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveCardPrompts {
    pub id: String,
    pub prompts: Vec<String>,
}
