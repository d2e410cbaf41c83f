//! # Interactive Controller (C7)
//! Drives the start/continue/finalize dialog, wiring C1-C6. Produces
//! responses and error classifications (spec §4.7). Input-shape failures
//! are raised here as `ErrorKind::InvalidInput`; everything else simply
//! propagates the kind its suspension point already produced (C1 ->
//! `ExternalService`/`MalformedResponse`, C2 -> `Storage`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogRepository;
use crate::domain::application::{CandidateApp, LabelCatalog};
use crate::domain::session::{Missing, Session, Turn};
use crate::domain::RequirementProfile;
use crate::error::{ErrorKind, Result};
use crate::llm::LlmGateway;
use crate::parser::{merge_delta_into, parse_turn};
use crate::question::{most_pressing, synthesize_question};
use crate::scorer::score_candidates;
use crate::validator::{revalidate, Thresholds};

const MIN_START_LEN: usize = 10;
const MAX_START_LEN: usize = 2000;
const MIN_ANSWER_LEN: usize = 1;
const MAX_ANSWER_LEN: usize = 1000;

const DEFAULT_TOP_K: usize = 30;
const DEFAULT_TOP_N: usize = 10;

/// Max labels/tags/integrations sent to the "must/required" bucket before
/// the rest spill into "nice" (spec §4.7 finalize: "first <=6 ... next <=6").
const MUST_BUCKET_CAP: usize = 6;
const NICE_BUCKET_CAP: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    NeedsMore,
    Ready,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedResult {
    pub app_id: String,
    pub name: String,
    pub similarity_percent: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResponse {
    pub status: MatchStatus,
    pub session: Session,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Missing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<NamedResult>>,
}

pub struct InteractiveController<'a> {
    pub gateway: &'a dyn LlmGateway,
    pub catalog: &'a dyn CatalogRepository,
    pub thresholds: Thresholds,
    pub deadline: Duration,
}

impl<'a> InteractiveController<'a> {
    pub fn new(gateway: &'a dyn LlmGateway, catalog: &'a dyn CatalogRepository) -> Self {
        Self {
            gateway,
            catalog,
            thresholds: Thresholds::default(),
            deadline: Duration::from_secs(20),
        }
    }

    /// `POST /match/interactive/start`.
    pub async fn start(&self, prompt_text: &str) -> Result<MatchResponse> {
        let trimmed = prompt_text.trim();
        if trimmed.chars().count() < MIN_START_LEN || trimmed.chars().count() > MAX_START_LEN {
            return Err(ErrorKind::invalid_input(format!(
                "prompt_text length must be in [{MIN_START_LEN}, {MAX_START_LEN}]"
            )));
        }

        let mut session = Session::new();
        session.turns.push(Turn::user(trimmed));

        let delta = parse_turn(self.gateway, trimmed, &session.accumulated, self.deadline).await?;
        merge_delta_into(&mut session.accumulated, &delta);
        revalidate(&mut session, self.thresholds);

        self.branch_on_validity(session).await
    }

    /// `POST /match/interactive/continue`.
    pub async fn continue_dialog(&self, mut session: Session, answer_text: &str) -> Result<MatchResponse> {
        if session.is_valid {
            return Err(ErrorKind::invalid_input(
                "session is already valid; call finalize instead",
            ));
        }
        let trimmed = answer_text.trim();
        if trimmed.chars().count() < MIN_ANSWER_LEN || trimmed.chars().count() > MAX_ANSWER_LEN {
            return Err(ErrorKind::invalid_input(format!(
                "answer_text length must be in [{MIN_ANSWER_LEN}, {MAX_ANSWER_LEN}]"
            )));
        }

        session.turns.push(Turn::user(trimmed));
        let delta = parse_turn(self.gateway, trimmed, &session.accumulated, self.deadline).await?;
        merge_delta_into(&mut session.accumulated, &delta);
        revalidate(&mut session, self.thresholds);

        self.branch_on_validity(session).await
    }

    async fn branch_on_validity(&self, mut session: Session) -> Result<MatchResponse> {
        if session.is_valid {
            let final_prompt = session.compose_final_prompt();
            session
                .turns
                .push(Turn::assistant("Thanks, I have everything I need."));
            Ok(MatchResponse {
                status: MatchStatus::Ready,
                session,
                question: None,
                missing: None,
                final_prompt: Some(final_prompt),
                results: None,
            })
        } else {
            let dimension = most_pressing(&session.missing).expect(
                "is_valid is false, so compute_missing must report at least one missing dimension",
            );
            let turn_count = session.turns.len();
            let question = synthesize_question(dimension, turn_count);
            crate::metrics::record_question_asked(match dimension {
                crate::question::MissingDimension::Labels => "labels",
                crate::question::MissingDimension::Integrations => "integrations",
                crate::question::MissingDimension::Tags => "tags",
            });
            session.turns.push(Turn::assistant(question.clone()));
            Ok(MatchResponse {
                status: MatchStatus::NeedsMore,
                missing: Some(session.missing),
                session,
                question: Some(question),
                final_prompt: None,
                results: None,
            })
        }
    }

    /// `POST /match/interactive/finalize`.
    pub async fn finalize(
        &self,
        session: Session,
        top_k: Option<usize>,
        top_n: Option<usize>,
    ) -> Result<MatchResponse> {
        if !session.is_valid {
            return Err(ErrorKind::invalid_input(
                "session is not valid yet; keep calling continue",
            ));
        }

        let profile = build_requirement_profile(&session);
        let top_k = top_k.unwrap_or(DEFAULT_TOP_K);
        let top_n = top_n.unwrap_or(DEFAULT_TOP_N);

        let embedding = self
            .gateway
            .get_embedding(&profile.buyer_text, self.deadline)
            .await?;
        let mut candidates = self.catalog.vector_candidates(&embedding, top_k).await?;
        enrich_candidates(self.catalog, &mut candidates).await?;

        let synonyms = self.fetch_label_catalog(&profile).await?;
        let scored = score_candidates(&profile, &candidates, &synonyms, top_n)?;

        let app_ids: Vec<String> = scored.iter().map(|s| s.app_id.clone()).collect();
        let names = self.catalog.fetch_app_names(&app_ids).await?;
        let results = scored
            .into_iter()
            .map(|s| NamedResult {
                name: names.get(&s.app_id).cloned().unwrap_or_default(),
                app_id: s.app_id,
                similarity_percent: s.similarity_percent,
            })
            .collect();

        Ok(MatchResponse {
            status: MatchStatus::Ready,
            final_prompt: Some(session.compose_final_prompt()),
            session,
            question: None,
            missing: None,
            results: Some(results),
        })
    }

    async fn fetch_label_catalog(&self, profile: &RequirementProfile) -> Result<LabelCatalog> {
        let mut names = profile.labels_must.clone();
        names.extend(profile.labels_nice.clone());
        let map = self.catalog.fetch_synonyms(&names).await?;
        Ok(LabelCatalog::new(map))
    }
}

/// Splits `accumulated` into must/nice buckets and composes `buyer_text`
/// (spec §4.7 finalize).
fn build_requirement_profile(session: &Session) -> RequirementProfile {
    let (labels_must, labels_nice) = split_bucket(session.accumulated.labels.as_slice());
    let (tag_must, tag_nice) = split_bucket(session.accumulated.tags.as_slice());
    let (integration_required, integration_nice) = split_bucket(session.accumulated.integrations.as_slice());

    RequirementProfile {
        buyer_text: session.compose_final_prompt(),
        labels_must,
        labels_nice,
        tag_must,
        tag_nice,
        integration_required,
        integration_nice,
        price_max: session.accumulated.price_max,
        notes: String::new(),
    }
}

fn split_bucket(items: &[String]) -> (Vec<String>, Vec<String>) {
    let must: Vec<String> = items.iter().take(MUST_BUCKET_CAP).cloned().collect();
    let nice: Vec<String> = items
        .iter()
        .skip(MUST_BUCKET_CAP)
        .take(NICE_BUCKET_CAP)
        .cloned()
        .collect();
    (must, nice)
}

async fn enrich_candidates(catalog: &dyn CatalogRepository, candidates: &mut [CandidateApp]) -> Result<()> {
    let ids: Vec<String> = candidates.iter().map(|c| c.app_search_id.clone()).collect();
    let features = catalog.fetch_features(&ids).await?;
    for candidate in candidates.iter_mut() {
        if let Some(f) = features.get(&candidate.app_search_id) {
            candidate.labels = f.labels.clone();
            candidate.integration_keys = f.integration_keys.clone();
            candidate.tags = f.tags.clone();
            if !f.price_text.is_empty() {
                candidate.price_text = f.price_text.clone();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockCatalogRepository;
    use crate::domain::RequirementDelta;
    use crate::llm::MockLlmGateway;

    fn gateway_with(labels: Vec<&str>, tags: Vec<&str>, integrations: Vec<&str>, price_max: Option<f64>) -> MockLlmGateway {
        MockLlmGateway::with_extractions(vec![RequirementDelta {
            labels: labels.into_iter().map(String::from).collect(),
            tags: tags.into_iter().map(String::from).collect(),
            integrations: integrations.into_iter().map(String::from).collect(),
            price_max,
        }])
    }

    #[tokio::test]
    async fn start_rejects_short_prompt() {
        let gateway = MockLlmGateway::default();
        let catalog = MockCatalogRepository::default();
        let controller = InteractiveController::new(&gateway, &catalog);
        let err = controller.start("too short").await.unwrap_err();
        assert!(matches!(err, ErrorKind::InvalidInput(_)));
    }

    #[tokio::test]
    async fn start_returns_needs_more_when_underspecified() {
        let gateway = gateway_with(vec!["CRM"], vec![], vec![], None);
        let catalog = MockCatalogRepository::default();
        let controller = InteractiveController::new(&gateway, &catalog);
        let resp = controller
            .start("I need a tool to manage my projects please")
            .await
            .unwrap();
        assert_eq!(resp.status, MatchStatus::NeedsMore);
        assert!(resp.question.is_some());
    }

    #[tokio::test]
    async fn start_returns_ready_when_thresholds_met_in_one_turn() {
        let gateway = gateway_with(
            vec!["CRM", "Analytics"],
            vec!["B2B"],
            vec!["Salesforce"],
            None,
        );
        let catalog = MockCatalogRepository::default();
        let controller = InteractiveController::new(&gateway, &catalog);
        let resp = controller
            .start("I need a comprehensive CRM with analytics for B2B, integrates with Salesforce")
            .await
            .unwrap();
        assert_eq!(resp.status, MatchStatus::Ready);
        assert!(resp.final_prompt.is_some());
    }

    #[tokio::test]
    async fn continue_rejects_already_valid_session() {
        let gateway = MockLlmGateway::default();
        let catalog = MockCatalogRepository::default();
        let controller = InteractiveController::new(&gateway, &catalog);
        let mut session = Session::new();
        session.is_valid = true;
        let err = controller.continue_dialog(session, "more").await.unwrap_err();
        assert!(matches!(err, ErrorKind::InvalidInput(_)));
    }

    #[tokio::test]
    async fn finalize_rejects_not_yet_valid_session() {
        let gateway = MockLlmGateway::default();
        let catalog = MockCatalogRepository::default();
        let controller = InteractiveController::new(&gateway, &catalog);
        let err = controller
            .finalize(Session::new(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ErrorKind::InvalidInput(_)));
    }

    #[tokio::test]
    async fn finalize_returns_empty_results_for_empty_candidate_set() {
        let gateway = MockLlmGateway::default();
        let catalog = MockCatalogRepository::default();
        let controller = InteractiveController::new(&gateway, &catalog);
        let mut session = Session::new();
        session.accumulated.labels.insert("CRM".into());
        session.accumulated.labels.insert("Analytics".into());
        session.accumulated.tags.insert("B2B".into());
        session.accumulated.integrations.insert("Stripe".into());
        session.is_valid = true;

        let resp = controller.finalize(session, None, None).await.unwrap();
        assert_eq!(resp.results, Some(vec![]));
    }

    #[test]
    fn split_bucket_caps_must_at_six_and_spills_rest_into_nice() {
        let items: Vec<String> = (0..10).map(|i| format!("item{i}")).collect();
        let (must, nice) = split_bucket(&items);
        assert_eq!(must.len(), 6);
        assert_eq!(nice.len(), 4);
    }
}
