//! Session: client-carried continuation between dialog turns (spec §3).

use serde::{Deserialize, Serialize};

use super::OrderedSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}

/// Accumulated requirement state across turns. Sets preserve insertion
/// order of first appearance; duplicates are ignored case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccumulatedState {
    pub labels: OrderedSet,
    pub tags: OrderedSet,
    pub integrations: OrderedSet,
    pub price_max: Option<f64>,
}

/// Missing counts per dimension (C4).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Missing {
    pub labels_needed: usize,
    pub tags_needed: usize,
    pub integrations_needed: usize,
}

impl Missing {
    pub fn is_satisfied(&self) -> bool {
        self.labels_needed == 0 && self.tags_needed == 0 && self.integrations_needed == 0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub turns: Vec<Turn>,
    pub accumulated: AccumulatedState,
    pub missing: Missing,
    pub is_valid: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenation of all user turns in order, prefixed with a header and
    /// labeled sections (spec §4.7 `finalize`).
    pub fn compose_final_prompt(&self) -> String {
        let mut out = String::from("Buyer requirement summary\n");
        out.push_str("==========================\n");
        for (idx, turn) in self
            .turns
            .iter()
            .filter(|t| t.role == TurnRole::User)
            .enumerate()
        {
            out.push_str(&format!("Turn {}: {}\n", idx + 1, turn.text));
        }
        out
    }
}
