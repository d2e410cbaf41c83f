//! Requirement profile: the matcher's central value (spec §3).

use serde::{Deserialize, Serialize};

/// The structured buyer specification built by `finalize` (C7) and
/// consumed by the hybrid scorer (C6).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementProfile {
    /// Composed final prompt (natural language).
    pub buyer_text: String,
    pub labels_must: Vec<String>,
    pub labels_nice: Vec<String>,
    pub tag_must: Vec<String>,
    pub tag_nice: Vec<String>,
    pub integration_required: Vec<String>,
    pub integration_nice: Vec<String>,
    pub price_max: Option<f64>,
    #[serde(default)]
    pub notes: String,
}

impl RequirementProfile {
    /// True if at least one of labels/tags/integrations is non-empty, the
    /// scorer precondition from spec §4.6.
    pub fn has_any_requirement(&self) -> bool {
        !self.labels_must.is_empty()
            || !self.labels_nice.is_empty()
            || !self.tag_must.is_empty()
            || !self.tag_nice.is_empty()
            || !self.integration_required.is_empty()
            || !self.integration_nice.is_empty()
    }
}

/// Output of a single C3 parse: a delta to be merged into `accumulated`
/// (spec §4.3). Unknown JSON keys from the LLM response are ignored by the
/// gateway's deserialization; missing keys default to empty/`None` here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementDelta {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub integrations: Vec<String>,
    #[serde(default)]
    pub price_max: Option<f64>,
}
