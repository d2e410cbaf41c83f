//! # Backlog Matcher (C8)
//! Detects near-duplicate existing backlog cards for an incoming request
//! via per-card sampled embedding similarity (spec §4.8).

use std::time::Duration;

use rand::Rng;

use crate::catalog::CatalogRepository;
use crate::error::{ErrorKind, Result};
use crate::llm::LlmGateway;

const MIN_PROMPT_LEN: usize = 5;
const MAX_PROMPT_LEN: usize = 2000;
const MAX_COMMENT_LEN: usize = 1000;

/// Spec §4.8: "If best percent >= 50, return that card_id; else return
/// sentinel no-match."
pub const MATCH_THRESHOLD_PERCENT: f64 = 50.0;

#[derive(Clone, Debug, PartialEq)]
pub enum BacklogMatch {
    Card(String),
    NoMatch,
}

/// Validates prompt/comment length bounds (spec §4.8).
pub fn validate_lengths(prompt_text: &str, comment_text: Option<&str>) -> Result<()> {
    let prompt_len = prompt_text.trim().chars().count();
    if prompt_len < MIN_PROMPT_LEN || prompt_len > MAX_PROMPT_LEN {
        return Err(ErrorKind::invalid_input(format!(
            "prompt_text length must be in [{MIN_PROMPT_LEN}, {MAX_PROMPT_LEN}]"
        )));
    }
    if let Some(comment) = comment_text {
        if comment.chars().count() > MAX_COMMENT_LEN {
            return Err(ErrorKind::invalid_input(format!(
                "comment_text length must be in [0, {MAX_COMMENT_LEN}]"
            )));
        }
    }
    Ok(())
}

/// Same sigmoid used by the hybrid scorer (spec §4.8 step 3), scaled to
/// `[0, 100]` instead of rounded to an integer percent here — the matcher
/// only needs the threshold comparison, not a display value.
fn similarity_percent(cosine: f64) -> f64 {
    100.0 / (1.0 + (-10.0 * (cosine - 0.5)).exp())
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// C8: picks the best-matching active card, if any scores at or above the
/// threshold. `rng` is an explicit parameter so tests can supply a seeded
/// generator (spec §9 "Random sampling in backlog should be parameterizable
/// by seed").
pub async fn match_backlog(
    gateway: &dyn LlmGateway,
    catalog: &dyn CatalogRepository,
    prompt_text: &str,
    comment_text: Option<&str>,
    deadline: Duration,
    rng: &mut impl Rng,
) -> Result<(BacklogMatch, String)> {
    validate_lengths(prompt_text, comment_text)?;

    let english_prompt = gateway.translate_to_english(prompt_text, deadline).await?;
    let english_comment = match comment_text {
        Some(c) if !c.trim().is_empty() => Some(gateway.translate_to_english(c, deadline).await?),
        _ => None,
    };
    let combined = match &english_comment {
        Some(c) => format!("{english_prompt}\n{c}"),
        None => english_prompt.clone(),
    };
    let incoming_embedding = gateway.get_embedding(&combined, deadline).await?;

    let cards = catalog.active_cards().await?;

    let mut best: Option<(String, f64)> = None;
    for card in cards {
        if card.prompts.is_empty() {
            continue;
        }
        let idx = rng.gen_range(0..card.prompts.len());
        let sampled_prompt = &card.prompts[idx];

        let sampled_english = gateway.translate_to_english(sampled_prompt, deadline).await?;
        let sampled_embedding = gateway.get_embedding(&sampled_english, deadline).await?;

        let cosine = cosine_similarity(&incoming_embedding, &sampled_embedding);
        let percent = similarity_percent(cosine);

        if best.as_ref().map(|(_, p)| percent > *p).unwrap_or(true) {
            best = Some((card.id, percent));
        }
    }

    match best {
        Some((card_id, percent)) if percent >= MATCH_THRESHOLD_PERCENT => {
            Ok((BacklogMatch::Card(card_id), english_prompt))
        }
        _ => Ok((BacklogMatch::NoMatch, english_prompt)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockCatalogRepository;
    use crate::domain::backlog::ActiveCardPrompts;
    use crate::llm::MockLlmGateway;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn validate_lengths_rejects_below_minimum() {
        assert!(validate_lengths("abcd", None).is_err());
        assert!(validate_lengths("abcde", None).is_ok());
    }

    #[test]
    fn validate_lengths_rejects_overlong_comment() {
        let comment = "x".repeat(1001);
        assert!(validate_lengths("a valid prompt", Some(&comment)).is_err());
    }

    #[tokio::test]
    async fn no_active_cards_yields_no_match() {
        let gateway = MockLlmGateway::default();
        let catalog = MockCatalogRepository::default();
        let mut rng = StdRng::seed_from_u64(7);
        let (result, _) = match_backlog(&gateway, &catalog, "I need Stripe integration", None, Duration::from_secs(1), &mut rng)
            .await
            .unwrap();
        assert_eq!(result, BacklogMatch::NoMatch);
    }

    #[tokio::test]
    async fn identical_embeddings_match_above_threshold() {
        let gateway = MockLlmGateway::with_embedding("shared", vec![1.0; 1536]);
        {
            let mut t = gateway.translations.lock().unwrap();
            t.insert("Payment gateway integration".to_string(), "Payment gateway integration".to_string());
            t.insert("Necesito Stripe".to_string(), "I need Stripe".to_string());
        }
        {
            let mut e = gateway.embedding_for.lock().unwrap();
            e.insert("Payment gateway integration".to_string(), vec![1.0; 1536]);
            e.insert("I need Stripe".to_string(), vec![1.0; 1536]);
        }
        let catalog = MockCatalogRepository {
            cards: vec![ActiveCardPrompts {
                id: "card-1".to_string(),
                prompts: vec!["Payment gateway integration".to_string()],
            }],
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let (result, _) = match_backlog(
            &gateway,
            &catalog,
            "Necesito Stripe",
            None,
            Duration::from_secs(1),
            &mut rng,
        )
        .await
        .unwrap();
        assert_eq!(result, BacklogMatch::Card("card-1".to_string()));
    }

    #[test]
    fn cosine_similarity_is_one_for_identical_vectors() {
        let v = vec![0.5f32, 0.5, 0.7071];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }
}
