//! # Session Validator (C4)
//! Merges deltas across turns (delegated to `parser::merge_delta_into`) and
//! decides `needs_more` vs `ready` (spec §4.4).

use crate::domain::session::{AccumulatedState, Missing, Session};

/// Threshold parameters (spec §4.4 defaults).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub min_labels_required: usize,
    pub min_tags_required: usize,
    pub min_integrations_required: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_labels_required: 2,
            min_tags_required: 1,
            min_integrations_required: 1,
        }
    }
}

/// Computes `missing = max(0, MIN_X - |accumulated.X|)` per dimension.
pub fn compute_missing(accumulated: &AccumulatedState, thresholds: Thresholds) -> Missing {
    Missing {
        labels_needed: thresholds.min_labels_required.saturating_sub(accumulated.labels.len()),
        tags_needed: thresholds.min_tags_required.saturating_sub(accumulated.tags.len()),
        integrations_needed: thresholds
            .min_integrations_required
            .saturating_sub(accumulated.integrations.len()),
    }
}

/// Re-derives `missing` and `is_valid` on the session in place. `is_valid`
/// only ever transitions false -> true (spec invariant, §3/§8): once a
/// session is valid, re-running validation on a monotonically-grown
/// accumulated state can never make it false again, so this function never
/// reverts an already-true flag.
pub fn revalidate(session: &mut Session, thresholds: Thresholds) {
    let missing = compute_missing(&session.accumulated, thresholds);
    session.missing = missing;
    if missing.is_satisfied() && !session.is_valid {
        session.is_valid = true;
        crate::metrics::record_session_validated();
    }
}
