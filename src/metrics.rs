//! # Metrics
//! Prometheus exposition for the matcher and backlog pipelines via a
//! `PrometheusBuilder`-installed recorder and a `/metrics` route.

use axum::{routing::get, Router};
use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Installs the Prometheus recorder and publishes the static config
    /// gauges a dashboard would want at startup.
    pub fn init(thresholds: &crate::validator::Thresholds) -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        gauge!("matcher_threshold_labels").set(thresholds.min_labels_required as f64);
        gauge!("matcher_threshold_tags").set(thresholds.min_tags_required as f64);
        gauge!("matcher_threshold_integrations").set(thresholds.min_integrations_required as f64);

        Self { handle }
    }

    /// Returns a router exposing `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// A session reached `is_valid = true` (spec §4.4).
pub fn record_session_validated() {
    counter!("matcher_sessions_validated_total").increment(1);
}

/// A clarifying question was emitted (spec §4.5).
pub fn record_question_asked(dimension: &'static str) {
    counter!("matcher_questions_asked_total", "dimension" => dimension).increment(1);
}

/// The hybrid scorer ran over a candidate set (spec §4.6).
pub fn record_scorer_invocation(candidate_count: usize) {
    counter!("matcher_scorer_invocations_total").increment(1);
    counter!("matcher_scorer_candidates_total").increment(candidate_count as u64);
}

/// A candidate failed one or more hard constraints and was floored rather
/// than dropped (spec §4.6).
pub fn record_hard_constraint_floor() {
    counter!("matcher_hard_constraint_floors_total").increment(1);
}

/// Backlog ingest resolved to an existing card (spec §4.8/§4.9).
pub fn record_backlog_match() {
    counter!("backlog_matches_total").increment(1);
}

/// Backlog ingest created a new card (spec §4.9).
pub fn record_backlog_new_card() {
    counter!("backlog_new_cards_total").increment(1);
}
