//! # HTTP API Layer
//! Thin Axum routing over the interactive matcher and backlog pipelines
//! (spec §6). Transport shape is normative; everything else is delegated
//! to `controller`/`backlog_writer`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::backlog_writer::{self, BacklogStore};
use crate::catalog::CatalogRepository;
use crate::controller::{InteractiveController, MatchResponse};
use crate::domain::session::Session;
use crate::error::{classify, ErrorKind, StatusClass};
use crate::llm::LlmGateway;
use crate::validator::Thresholds;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn LlmGateway>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub backlog_store: Arc<dyn BacklogStore>,
    pub thresholds: Thresholds,
    pub deadline: Duration,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/match/interactive/start", post(start))
        .route("/match/interactive/continue", post(continue_dialog))
        .route("/match/interactive/finalize", post(finalize))
        .route("/backlog/ingest", post(ingest))
        .route("/health", axum::routing::get(|| async { "ok" }))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

struct ApiError(ErrorKind);

impl From<ErrorKind> for ApiError {
    fn from(err: ErrorKind) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match classify(&self.0) {
            StatusClass::ClientError => StatusCode::BAD_REQUEST,
            StatusClass::BadGateway => StatusCode::BAD_GATEWAY,
            StatusClass::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

#[derive(Deserialize)]
struct StartReq {
    prompt_text: String,
}

async fn start(State(state): State<AppState>, Json(body): Json<StartReq>) -> Result<Json<MatchResponse>, ApiError> {
    let controller = InteractiveController {
        gateway: state.gateway.as_ref(),
        catalog: state.catalog.as_ref(),
        thresholds: state.thresholds,
        deadline: state.deadline,
    };
    let resp = controller.start(&body.prompt_text).await?;
    Ok(Json(resp))
}

#[derive(Deserialize)]
struct ContinueReq {
    session: Session,
    answer_text: String,
}

async fn continue_dialog(
    State(state): State<AppState>,
    Json(body): Json<ContinueReq>,
) -> Result<Json<MatchResponse>, ApiError> {
    let controller = InteractiveController {
        gateway: state.gateway.as_ref(),
        catalog: state.catalog.as_ref(),
        thresholds: state.thresholds,
        deadline: state.deadline,
    };
    let resp = controller.continue_dialog(body.session, &body.answer_text).await?;
    Ok(Json(resp))
}

#[derive(Deserialize)]
struct FinalizeReq {
    session: Session,
    top_k: Option<usize>,
    top_n: Option<usize>,
}

async fn finalize(
    State(state): State<AppState>,
    Json(body): Json<FinalizeReq>,
) -> Result<Json<MatchResponse>, ApiError> {
    let controller = InteractiveController {
        gateway: state.gateway.as_ref(),
        catalog: state.catalog.as_ref(),
        thresholds: state.thresholds,
        deadline: state.deadline,
    };
    let resp = controller.finalize(body.session, body.top_k, body.top_n).await?;
    Ok(Json(resp))
}

#[derive(Deserialize)]
struct IngestReq {
    prompt_text: String,
    comment_text: Option<String>,
}

async fn ingest(State(state): State<AppState>, Json(body): Json<IngestReq>) -> Result<StatusCode, ApiError> {
    let mut rng = rand::rng();
    backlog_writer::ingest(
        state.gateway.as_ref(),
        state.catalog.as_ref(),
        state.backlog_store.as_ref(),
        &body.prompt_text,
        body.comment_text.as_deref(),
        state.deadline,
        &mut rng,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
