//! # Requirement Parser (C3)
//! Converts a free-form buyer turn into a structured delta, using the LLM
//! gateway for translation and extraction (spec §4.3).

use std::time::Duration;

use crate::domain::session::AccumulatedState;
use crate::domain::{title_case, RequirementDelta};
use crate::error::Result;
use crate::llm::LlmGateway;

/// Renders the prior accumulated state as a short hint string the gateway's
/// extraction prompt can reference, so repeated turns don't re-ask for
/// requirements already captured.
fn accumulated_hint(prior: &AccumulatedState) -> String {
    format!(
        "labels={:?} tags={:?} integrations={:?} price_max={:?}",
        prior.labels.as_slice(),
        prior.tags.as_slice(),
        prior.integrations.as_slice(),
        prior.price_max
    )
}

/// C3: translate, extract, and normalize a single turn into a delta.
pub async fn parse_turn(
    gateway: &dyn LlmGateway,
    turn_text: &str,
    prior: &AccumulatedState,
    deadline: Duration,
) -> Result<RequirementDelta> {
    let english = gateway.translate_to_english(turn_text, deadline).await?;
    let hint = accumulated_hint(prior);
    let mut delta = gateway
        .extract_requirements(&english, &hint, deadline)
        .await?;

    delta.labels = dedup_case_insensitive(delta.labels);
    delta.tags = dedup_case_insensitive(delta.tags);
    delta.integrations = dedup_case_insensitive(
        delta
            .integrations
            .into_iter()
            .map(|i| title_case(&i))
            .collect(),
    );
    Ok(delta)
}

/// Deduplicate case-insensitively, preserving first-seen casing/order.
fn dedup_case_insensitive(items: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for item in items {
        let trimmed = item.trim().to_string();
        if trimmed.is_empty() {
            continue;
        }
        if !seen.iter().any(|s| s.eq_ignore_ascii_case(&trimmed)) {
            seen.push(trimmed);
        }
    }
    seen
}

/// Merge policy executed by C4/the controller (spec §4.3): case-insensitive
/// set union preserving first-seen casing; `price_max` adopts the minimum
/// when both present.
pub fn merge_delta_into(accumulated: &mut AccumulatedState, delta: &RequirementDelta) {
    for label in &delta.labels {
        accumulated.labels.insert(label.clone());
    }
    for tag in &delta.tags {
        accumulated.tags.insert(tag.clone());
    }
    for integration in &delta.integrations {
        accumulated.integrations.insert(integration.clone());
    }
    accumulated.price_max = match (accumulated.price_max, delta.price_max) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };
}
