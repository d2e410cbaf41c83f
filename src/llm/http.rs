//! HTTP-backed `LlmGateway` talking to an OpenAI-compatible chat +
//! embeddings API: client construction with bearer auth and a user-agent,
//! timeouts on every call, generalized across the four C1 operations.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CardFields, LlmGateway};
use crate::domain::RequirementDelta;
use crate::error::{ErrorKind, Result};

const EMBEDDING_DIM: usize = 1536;
/// Internal retry budget for structurally-validated generations
/// (spec §4.1: "gateway retries internally up to a small fixed bound").
const GENERATION_RETRY_BUDGET: u32 = 2;

pub struct HttpLlmGateway {
    http: reqwest::Client,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    base_url: String,
}

impl HttpLlmGateway {
    pub fn new(api_key: String, chat_model: String, embedding_model: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("marketplace-matcher/0.1")
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            chat_model,
            embedding_model,
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn chat_completion(
        &self,
        system: &str,
        user: &str,
        deadline: Duration,
    ) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model: &self.chat_model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
        };

        let resp = tokio::time::timeout(
            deadline,
            self.http
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&req)
                .send(),
        )
        .await
        .map_err(|_| ErrorKind::external_service("chat completion timed out"))?
        .map_err(|e| ErrorKind::external_service(format!("chat completion transport error: {e}")))?;

        if !resp.status().is_success() {
            return Err(ErrorKind::external_service(format!(
                "chat completion returned status {}",
                resp.status()
            )));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| ErrorKind::malformed_response(format!("bad chat response JSON: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ErrorKind::malformed_response("chat completion returned no choices"))
    }
}

#[async_trait]
impl LlmGateway for HttpLlmGateway {
    async fn translate_to_english(&self, text: &str, deadline: Duration) -> Result<String> {
        let system = "Translate the user's message to English. If it is already \
                       English, return it verbatim. Output only the translated text, \
                       no quotes, no commentary.";
        let out = self.chat_completion(system, text, deadline).await?;
        Ok(out.trim().to_string())
    }

    async fn extract_requirements(
        &self,
        user_turn_text: &str,
        prior_accumulated_hint: &str,
        deadline: Duration,
    ) -> Result<RequirementDelta> {
        let system = format!(
            "You extract software-marketplace buyer requirements as JSON with keys \
             \"labels\" (closed catalog functional categories), \"tags\" (short \
             business-context noun phrases), \"integrations\" (named external \
             services, Title Case), and \"price_max\" (a number, only if the buyer \
             stated a cash ceiling). Omit any key you cannot fill; never invent \
             values. Prior accumulated state for context: {prior_accumulated_hint}. \
             Output only the JSON object."
        );
        let raw = self
            .chat_completion(&system, user_turn_text, deadline)
            .await?;
        parse_json_delta(&raw)
    }

    async fn get_embedding(&self, text: &str, deadline: Duration) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            input: &'a str,
        }
        #[derive(Deserialize)]
        struct Resp {
            data: Vec<Item>,
        }
        #[derive(Deserialize)]
        struct Item {
            embedding: Vec<f32>,
        }

        let req = Req {
            model: &self.embedding_model,
            input: text,
        };

        let resp = tokio::time::timeout(
            deadline,
            self.http
                .post(format!("{}/embeddings", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&req)
                .send(),
        )
        .await
        .map_err(|_| ErrorKind::external_service("embedding call timed out"))?
        .map_err(|e| ErrorKind::external_service(format!("embedding transport error: {e}")))?;

        if !resp.status().is_success() {
            return Err(ErrorKind::external_service(format!(
                "embedding endpoint returned status {}",
                resp.status()
            )));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| ErrorKind::malformed_response(format!("bad embedding response JSON: {e}")))?;

        let vector = body
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| ErrorKind::malformed_response("embedding response had no data"))?;

        if vector.len() != EMBEDDING_DIM {
            return Err(ErrorKind::malformed_response(format!(
                "expected {EMBEDDING_DIM}-dim embedding, got {}",
                vector.len()
            )));
        }
        Ok(vector)
    }

    async fn generate_card_fields(
        &self,
        prompt_text: &str,
        deadline: Duration,
    ) -> Result<CardFields> {
        let system = "Summarize this feature request as a backlog card. Respond with \
                       JSON {\"title\": ..., \"description\": ...}. title must be \
                       non-empty, at most 10 words. description must be a single \
                       English paragraph summarizing the request. Output only JSON.";

        for attempt in 0..=GENERATION_RETRY_BUDGET {
            let raw = self.chat_completion(system, prompt_text, deadline).await?;
            match parse_card_fields(&raw) {
                Ok(fields) => return Ok(fields),
                Err(e) => {
                    warn!(attempt, error = %e, "card field generation failed validation, retrying");
                }
            }
        }
        Err(ErrorKind::external_service(
            "card field generation exhausted retry budget",
        ))
    }
}

fn parse_json_delta(raw: &str) -> Result<RequirementDelta> {
    let trimmed = strip_code_fence(raw);
    serde_json::from_str(trimmed)
        .map_err(|e| ErrorKind::malformed_response(format!("unparsable requirement delta: {e}")))
}

fn parse_card_fields(raw: &str) -> Result<CardFields> {
    let trimmed = strip_code_fence(raw);
    let fields: CardFields = serde_json::from_str(trimmed)
        .map_err(|e| ErrorKind::malformed_response(format!("unparsable card fields: {e}")))?;

    let word_count = fields.title.split_whitespace().count();
    if fields.title.trim().is_empty() || word_count > 10 {
        return Err(ErrorKind::malformed_response(
            "card title empty or exceeds 10 words",
        ));
    }
    if fields.description.trim().is_empty() {
        return Err(ErrorKind::malformed_response("card description empty"));
    }
    debug!(title = %fields.title, "generated card fields");
    Ok(fields)
}

/// Chat models frequently wrap JSON in ```json fences despite instructions;
/// strip them defensively before parsing.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.strip_suffix("```").unwrap_or(s))
        .unwrap_or(trimmed)
        .trim()
}
