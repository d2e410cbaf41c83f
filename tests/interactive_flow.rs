// tests/interactive_flow.rs
//
// Black-box coverage of the three-turn interactive dialog and the
// hybrid scorer wired together end-to-end through `InteractiveController`,
// using mock LLM/catalog adapters rather than real network/DB calls.
//
// Mirrors spec.md §8 scenario 1 ("under-specified -> ready -> rejected").

use std::time::Duration;

use marketplace_matcher::catalog::MockCatalogRepository;
use marketplace_matcher::controller::{InteractiveController, MatchStatus};
use marketplace_matcher::domain::application::CandidateApp;
use marketplace_matcher::domain::RequirementDelta;
use marketplace_matcher::llm::MockLlmGateway;

fn controller<'a>(gateway: &'a MockLlmGateway, catalog: &'a MockCatalogRepository) -> InteractiveController<'a> {
    InteractiveController {
        gateway,
        catalog,
        thresholds: Default::default(),
        deadline: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn three_turn_dialog_reaches_ready_then_finalize_floors_missing_integration() {
    let gateway = MockLlmGateway::with_extractions(vec![
        RequirementDelta {
            labels: vec!["Project Management".to_string()],
            ..Default::default()
        },
        RequirementDelta {
            labels: vec!["Time Tracking".to_string()],
            tags: vec!["Architecture".to_string()],
            ..Default::default()
        },
        RequirementDelta {
            integrations: vec!["AutoCAD".to_string(), "Revit".to_string()],
            price_max: Some(0.0),
            ..Default::default()
        },
    ]);

    let candidate = CandidateApp {
        app_search_id: "s-1".to_string(),
        app_id: "1".to_string(),
        price_text: "Gratis".to_string(),
        cosine_similarity: 0.9,
        labels: vec!["Project Management".to_string(), "Time Tracking".to_string()],
        integration_keys: vec!["Slack".to_string()], // missing AutoCAD/Revit
        tags: vec!["Architecture".to_string()],
        name: None,
    };
    let catalog = MockCatalogRepository {
        candidates: vec![candidate],
        names: [("1".to_string(), "Generic PM Tool".to_string())].into(),
        ..Default::default()
    };

    let ctrl = controller(&gateway, &catalog);

    let turn1 = ctrl.start("I need a tool to manage my projects please").await.unwrap();
    assert_eq!(turn1.status, MatchStatus::NeedsMore);

    let turn2 = ctrl
        .continue_dialog(
            turn1.session,
            "I need time tracking and resource planning for my architecture firm",
        )
        .await
        .unwrap();
    assert_eq!(turn2.status, MatchStatus::NeedsMore);

    let turn3 = ctrl
        .continue_dialog(
            turn2.session,
            "It must integrate with AutoCAD and Revit, and it needs to be completely free",
        )
        .await
        .unwrap();
    assert_eq!(turn3.status, MatchStatus::Ready);
    assert!(turn3.session.accumulated.labels.contains("Project Management"));
    assert!(turn3.session.accumulated.labels.contains("Time Tracking"));
    assert_eq!(turn3.session.accumulated.price_max, Some(0.0));

    let finalized = ctrl.finalize(turn3.session, None, None).await.unwrap();
    let results = finalized.results.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].similarity_percent, 5);
}

#[tokio::test]
async fn single_rich_prompt_reaches_ready_immediately_and_scores_strong_match_high() {
    let gateway = MockLlmGateway::with_extractions(vec![RequirementDelta {
        labels: vec!["CRM".to_string(), "Analytics".to_string()],
        tags: vec!["B2B".to_string(), "SaaS".to_string()],
        integrations: vec!["Salesforce".to_string(), "HubSpot".to_string(), "Google Workspace".to_string()],
        price_max: None,
    }]);

    let strong = CandidateApp {
        app_search_id: "s-2".to_string(),
        app_id: "2".to_string(),
        price_text: "$49/mo".to_string(),
        cosine_similarity: 0.95,
        labels: vec!["CRM".to_string(), "Analytics".to_string()],
        integration_keys: vec![
            "Salesforce".to_string(),
            "Hubspot".to_string(),
            "Google Workspace".to_string(),
        ],
        tags: vec!["B2B".to_string(), "SaaS".to_string()],
        name: None,
    };
    let catalog = MockCatalogRepository {
        candidates: vec![strong],
        names: [("2".to_string(), "Pipeline Pro".to_string())].into(),
        ..Default::default()
    };

    let ctrl = controller(&gateway, &catalog);
    let started = ctrl
        .start(
            "I need a comprehensive CRM system with sales pipeline management, customer \
             analytics, and reporting dashboards for my B2B SaaS company. Integrates with \
             Salesforce, HubSpot, and Google Workspace.",
        )
        .await
        .unwrap();
    assert_eq!(started.status, MatchStatus::Ready);

    let finalized = ctrl.finalize(started.session, None, None).await.unwrap();
    let results = finalized.results.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].similarity_percent >= 75, "got {}", results[0].similarity_percent);
    assert_eq!(results[0].name, "Pipeline Pro");
}
