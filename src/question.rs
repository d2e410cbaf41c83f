//! # Question Synthesizer (C5)
//! Picks the single most pressing missing dimension and emits one English
//! question with 3-4 rotating example values (spec §4.5). Not invoked when
//! nothing is missing.

use crate::domain::session::Missing;

/// Priority order: labels > integrations > tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingDimension {
    Labels,
    Integrations,
    Tags,
}

/// Closed-catalog label examples (spec §4.5: "for labels come from the
/// closed catalog"). A representative sample; the real catalog lives in the
/// `labels` table (spec §6).
const LABEL_POOL: &[&str] = &[
    "CRM",
    "Project Management",
    "Time Tracking",
    "Analytics",
    "Accounting",
    "HR Management",
    "Inventory",
    "Customer Support",
    "Marketing Automation",
    "Business Intelligence",
];

const INTEGRATION_POOL: &[&str] = &[
    "Stripe",
    "Salesforce",
    "HubSpot",
    "Google Workspace",
    "Slack",
    "QuickBooks",
    "Microsoft Teams",
    "Zapier",
];

const TAG_POOL: &[&str] = &[
    "B2B",
    "Healthcare",
    "E-commerce",
    "Manufacturing",
    "Architecture",
    "Education",
    "Nonprofit",
    "Real Estate",
];

/// Picks the most pressing missing dimension by priority. Returns `None`
/// when nothing is missing — the synthesizer must not be invoked then.
pub fn most_pressing(missing: &Missing) -> Option<MissingDimension> {
    if missing.labels_needed > 0 {
        Some(MissingDimension::Labels)
    } else if missing.integrations_needed > 0 {
        Some(MissingDimension::Integrations)
    } else if missing.tags_needed > 0 {
        Some(MissingDimension::Tags)
    } else {
        None
    }
}

/// Rotates through the example pool using `turn_count` as the seed, taking
/// a contiguous window of 3-4 examples so repeat requests vary.
fn rotate_examples(pool: &[&str], turn_count: usize, window: usize) -> Vec<String> {
    if pool.is_empty() {
        return Vec::new();
    }
    let window = window.min(pool.len());
    let start = turn_count % pool.len();
    (0..window)
        .map(|i| pool[(start + i) % pool.len()].to_string())
        .collect()
}

/// Produces exactly one clarifying question for the given missing dimension.
pub fn synthesize_question(dimension: MissingDimension, turn_count: usize) -> String {
    let (noun, pool) = match dimension {
        MissingDimension::Labels => ("functional categories", LABEL_POOL),
        MissingDimension::Integrations => ("integrations", INTEGRATION_POOL),
        MissingDimension::Tags => ("business context", TAG_POOL),
    };
    let examples = rotate_examples(pool, turn_count, 4);
    format!(
        "Could you tell me more about the {noun} you need? For example: {}.",
        examples.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_prefers_labels_over_integrations_over_tags() {
        let missing = Missing {
            labels_needed: 1,
            tags_needed: 1,
            integrations_needed: 1,
        };
        assert_eq!(most_pressing(&missing), Some(MissingDimension::Labels));

        let missing = Missing {
            labels_needed: 0,
            tags_needed: 1,
            integrations_needed: 1,
        };
        assert_eq!(most_pressing(&missing), Some(MissingDimension::Integrations));

        let missing = Missing {
            labels_needed: 0,
            tags_needed: 1,
            integrations_needed: 0,
        };
        assert_eq!(most_pressing(&missing), Some(MissingDimension::Tags));
    }

    #[test]
    fn nothing_missing_yields_none() {
        assert_eq!(most_pressing(&Missing::default()), None);
    }

    #[test]
    fn rotation_varies_with_turn_count() {
        let first = rotate_examples(LABEL_POOL, 0, 4);
        let second = rotate_examples(LABEL_POOL, 1, 4);
        assert_ne!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn question_includes_examples() {
        let q = synthesize_question(MissingDimension::Integrations, 2);
        assert!(q.contains("integrations"));
        assert!(INTEGRATION_POOL.iter().any(|ex| q.contains(ex)));
    }
}
