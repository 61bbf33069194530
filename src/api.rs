// 🌐 REST API with Axum
// Thin adapter over SessionRegistry: every handler is one engine call under the session lock

use crate::engine::{ResetSnapshot, SimulationState};
use crate::error::ValidationError;
use crate::logic::impact_table;
use crate::model::{LcrMetrics, SimulationRecord, TransactionRequest};
use crate::session::SessionRegistry;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::path::Path as FsPath;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ApiError>,
}

#[derive(Serialize)]
struct ApiError {
    code: &'static str,
    message: String,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn fail(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Serialize)]
struct SessionResponse {
    id: Uuid,
    state: SimulationState,
}

#[derive(Serialize)]
struct ApplyResponse {
    record: SimulationRecord,
    metrics: LcrMetrics,
    records: Vec<SimulationRecord>,
}

fn not_found(id: &Uuid) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::fail("session_not_found", format!("No session {}", id))),
    )
        .into_response()
}

fn bad_body(rejection: JsonRejection) -> Response {
    (
        rejection.status(),
        Json(ApiResponse::fail("invalid_body", rejection.body_text())),
    )
        .into_response()
}

fn rejected(err: &ValidationError) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::fail(err.code(), err.to_string())),
    )
        .into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/balance-sheet - Reference balance sheet
async fn get_balance_sheet(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.sessions.store().balance_sheet().to_vec()))
}

/// GET /api/baseline - Original LCR metrics
async fn get_baseline(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.sessions.store().baseline_metrics()))
}

/// GET /api/logic - Documented vs applied impact per product
async fn get_logic() -> impl IntoResponse {
    Json(ApiResponse::ok(impact_table()))
}

/// POST /api/sessions - Open a session at the baseline
async fn create_session(State(state): State<AppState>) -> Response {
    let id = state.sessions.create();
    match state.sessions.with_session(&id, |engine| engine.state()) {
        Some(session_state) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok(SessionResponse {
                id,
                state: session_state,
            })),
        )
            .into_response(),
        None => not_found(&id),
    }
}

/// GET /api/sessions/:id - Current metrics and log
async fn get_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.sessions.with_session(&id, |engine| engine.state()) {
        Some(session_state) => Json(ApiResponse::ok(session_state)).into_response(),
        None => not_found(&id),
    }
}

/// POST /api/sessions/:id/transactions - Apply one transaction
async fn apply_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return bad_body(rejection),
    };

    let outcome = state.sessions.with_session(&id, |engine| {
        engine.apply(&request).map(|applied| ApplyResponse {
            record: applied.record,
            metrics: applied.metrics,
            records: engine.log().to_vec(),
        })
    });

    match outcome {
        Some(Ok(response)) => Json(ApiResponse::ok(response)).into_response(),
        Some(Err(err)) => rejected(&err),
        None => not_found(&id),
    }
}

/// POST /api/sessions/:id/reset - Back to the baseline
async fn reset_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state
        .sessions
        .with_session(&id, |engine| engine.reset_snapshot())
    {
        Some(snapshot) => Json(ApiResponse::<ResetSnapshot>::ok(snapshot)).into_response(),
        None => not_found(&id),
    }
}

/// DELETE /api/sessions/:id - Close a session
async fn delete_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if state.sessions.remove(&id) {
        Json(ApiResponse::ok(id)).into_response()
    } else {
        not_found(&id)
    }
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState, static_dir: &FsPath) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/balance-sheet", get(get_balance_sheet))
        .route("/baseline", get(get_baseline))
        .route("/logic", get(get_logic))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/transactions", post(apply_transaction))
        .route("/sessions/:id/reset", post(reset_session))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}

// ============================================================================
// TESTS
// ============================================================================
