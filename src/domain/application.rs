//! Read-only catalog types consumed by the scorer (spec §3).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single candidate returned by `CatalogRepository::vector_candidates`,
/// later enriched in-place with `fetch_features`/`fetch_app_names`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateApp {
    pub app_search_id: String,
    pub app_id: String,
    pub price_text: String,
    pub cosine_similarity: f64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub integration_keys: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Full application record, as read from the catalog (not all fields are
/// consumed by the core — `features_text` belongs to an out-of-scope
/// comparison service and is intentionally omitted here).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub app_id: String,
    pub app_search_id: String,
    pub name: String,
    pub price_text: String,
    pub embedding: Vec<f32>,
    pub labels: Vec<String>,
    pub integration_keys: Vec<String>,
    pub tags: Vec<String>,
}

/// `label -> synonyms[]` lookup table, used only during hard-constraint
/// matching (spec §4.6 step A).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelCatalog {
    entries: HashMap<String, Vec<String>>,
}

impl LabelCatalog {
    pub fn new(entries: HashMap<String, Vec<String>>) -> Self {
        Self { entries }
    }

    /// True if `candidate_label` equals `required_label` case-insensitively,
    /// or appears in `required_label`'s synonym list.
    pub fn matches(&self, required_label: &str, candidate_label: &str) -> bool {
        if required_label.eq_ignore_ascii_case(candidate_label) {
            return true;
        }
        self.entries
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(required_label))
            .map(|(_, synonyms)| {
                synonyms
                    .iter()
                    .any(|syn| syn.eq_ignore_ascii_case(candidate_label))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_catalog_matches_via_synonym() {
        let mut entries = HashMap::new();
        entries.insert("CRM".to_string(), vec!["Customer Management".to_string()]);
        let catalog = LabelCatalog::new(entries);
        assert!(catalog.matches("CRM", "customer management"));
        assert!(catalog.matches("crm", "CRM"));
        assert!(!catalog.matches("CRM", "Analytics"));
    }
}
