//! # Hybrid Scorer (C6) — the critical algorithm
//! Enforces hard constraints, computes the hybrid score, and maps it to a
//! percentage (spec §4.6). The set-overlap helper computes a ratio over a
//! case-normalized comparison: intersection-over-buyer-list rather than
//! edit-distance similarity.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::application::{CandidateApp, LabelCatalog};
use crate::domain::{title_case, RequirementProfile};
use crate::error::{ErrorKind, Result};

/// Floor score assigned to candidates that fail a hard constraint (spec
/// §4.6 step A): they are not discarded, just skipped for further scoring.
pub const HARD_CONSTRAINT_FLOOR_PERCENT: u32 = 5;

const FREE_INDICATORS: &[&str] = &["gratis", "free", "kostenlos", "gratuit"];

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+(?:[.,][0-9]+)?").unwrap());

/// A single scored result (spec §4.6 step D output shape, pre-name-attach).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoredApp {
    pub app_id: String,
    pub similarity_percent: u32,
}

/// Parses `price_text` into a numeric value, or `None` if unparseable
/// (spec §4.6 step A "Budget"): free indicators map to 0; otherwise the
/// first numeric token is extracted, tolerating currency prefixes and
/// `/period` suffixes; if nothing parses the budget check is skipped
/// (optimistic inclusion).
pub fn parse_price(price_text: &str) -> Option<f64> {
    let lower = price_text.to_lowercase();
    if FREE_INDICATORS.iter().any(|f| lower.contains(f)) {
        return Some(0.0);
    }
    FIRST_NUMBER
        .find(&lower)
        .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
}

/// `O(buyer_list, app_list)`: case-insensitive intersection-over-buyer-list
/// ratio, or `0.1` when `buyer_list` is empty (spec §4.6 step B).
pub fn overlap_ratio(buyer_list: &[String], app_list: &[String]) -> f64 {
    if buyer_list.is_empty() {
        return 0.1;
    }
    let matched = buyer_list
        .iter()
        .filter(|b| app_list.iter().any(|a| a.eq_ignore_ascii_case(b)))
        .count();
    matched as f64 / buyer_list.len() as f64
}

/// Integration overlap compares Title-Cased forms on both sides (spec §4.6
/// step B: "integrations compared Title-Cased").
fn integration_overlap_ratio(buyer_list: &[String], app_list: &[String]) -> f64 {
    let buyer_titled: Vec<String> = buyer_list.iter().map(|s| title_case(s)).collect();
    let app_titled: Vec<String> = app_list.iter().map(|s| title_case(s)).collect();
    overlap_ratio(&buyer_titled, &app_titled)
}

fn labels_must_satisfied(profile: &RequirementProfile, app: &CandidateApp, synonyms: &LabelCatalog) -> bool {
    profile.labels_must.iter().all(|required| {
        app.labels
            .iter()
            .any(|candidate| synonyms.matches(required, candidate))
    })
}

fn integrations_required_satisfied(profile: &RequirementProfile, app: &CandidateApp) -> bool {
    profile.integration_required.iter().all(|required| {
        let required_titled = title_case(required);
        app.integration_keys
            .iter()
            .any(|candidate| title_case(candidate).eq_ignore_ascii_case(&required_titled))
    })
}

fn budget_satisfied(profile: &RequirementProfile, app: &CandidateApp) -> bool {
    let Some(price_max) = profile.price_max else {
        return true;
    };
    match parse_price(&app.price_text) {
        Some(price_value) => price_value <= price_max,
        // Nothing parses: treat as unknown and pass (optimistic inclusion).
        None => true,
    }
}

/// Step A: true if the candidate passes every hard constraint.
fn passes_hard_constraints(profile: &RequirementProfile, app: &CandidateApp, synonyms: &LabelCatalog) -> bool {
    labels_must_satisfied(profile, app, synonyms)
        && integrations_required_satisfied(profile, app)
        && budget_satisfied(profile, app)
}

/// Step B: hybrid raw/calibrated score for a passing candidate.
fn hybrid_score(profile: &RequirementProfile, app: &CandidateApp) -> f64 {
    let raw = 0.60 * app.cosine_similarity
        + 0.10 * overlap_ratio(&profile.tag_must, &app.tags)
        + 0.10 * overlap_ratio(&profile.labels_nice, &app.labels)
        + 0.05 * overlap_ratio(&profile.tag_nice, &app.tags)
        + 0.15 * integration_overlap_ratio(&profile.integration_nice, &app.integration_keys);
    raw * 0.45 + 0.55
}

/// Step C: percentage mapping via a steepness-10 sigmoid centered at 0.5.
fn percentage_from_score(score: f64) -> u32 {
    let value = 100.0 / (1.0 + (-10.0 * (score - 0.5)).exp());
    value.round().clamp(0.0, 100.0) as u32
}

/// Step A-D: score a candidate set against a requirement profile and
/// return the top `top_n` by `similarity_percent` descending.
///
/// Preconditions (spec §4.6): at least one of labels/tags/integrations
/// must be non-empty on `profile`, else `invalid_input`. An empty
/// candidate set returns an empty result.
pub fn score_candidates(
    profile: &RequirementProfile,
    candidates: &[CandidateApp],
    synonyms: &LabelCatalog,
    top_n: usize,
) -> Result<Vec<ScoredApp>> {
    if !profile.has_any_requirement() {
        return Err(ErrorKind::invalid_input(
            "requirement profile has no labels, tags, or integrations to score against",
        ));
    }
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    crate::metrics::record_scorer_invocation(candidates.len());

    let mut scored: Vec<ScoredApp> = candidates
        .iter()
        .map(|app| {
            let percent = if passes_hard_constraints(profile, app, synonyms) {
                percentage_from_score(hybrid_score(profile, app))
            } else {
                crate::metrics::record_hard_constraint_floor();
                HARD_CONSTRAINT_FLOOR_PERCENT
            };
            ScoredApp {
                app_id: app.app_id.clone(),
                similarity_percent: percent,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.similarity_percent.cmp(&a.similarity_percent));
    scored.truncate(top_n);
    Ok(scored)
}
