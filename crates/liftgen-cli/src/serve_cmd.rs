use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use liftgen_core::generation::{GenerationClient, OpenAiClient};
use liftgen_core::pipeline::{
    GenerationResponse, PipelineConfig, PipelineError, RequestContext, generate_workout,
};
use liftgen_core::quota::{self, QuotaStatus};
use liftgen_core::request::GenerationRequest;
use liftgen_core::store::{PgStore, WorkoutStore};
use liftgen_db::models::{Workout, WorkoutExerciseDetail};
use liftgen_db::pool;

use crate::config::LiftgenConfig;

/// Header carrying the authenticated user id, set by the auth proxy.
pub const USER_HEADER: &str = "x-user-id";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WorkoutStore>,
    pub client: Arc<dyn GenerationClient>,
    pub pipeline: Arc<PipelineConfig>,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// HTTP status for a failed generation.
fn status_for(err: &PipelineError) -> StatusCode {
    match err.error_type() {
        "validation" => StatusCode::BAD_REQUEST,
        "rate_limit" => StatusCode::TOO_MANY_REQUESTS,
        "generation" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct WorkoutDetailResponse {
    #[serde(flatten)]
    pub workout: Workout,
    pub exercises: Vec<WorkoutExerciseDetail>,
}

#[derive(Debug, Serialize)]
pub struct QuotaResponse {
    #[serde(flatten)]
    pub status: QuotaStatus,
    pub remaining: Option<i64>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/workouts/generate", post(generate_handler))
        .route("/api/workouts/{id}", get(get_workout_handler))
        .route("/api/quota", get(quota_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(config: &LiftgenConfig, bind: &str, port: u16) -> Result<()> {
    let client = OpenAiClient::new(config.generation.clone())?;
    let db_pool = pool::create_pool(&config.db_config).await?;

    let state = AppState {
        store: Arc::new(PgStore::new(db_pool.clone())),
        client: Arc::new(client),
        pipeline: Arc::new(config.pipeline.clone()),
    };
    let app = build_router(state);

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!(model = %config.generation.model, "liftgen serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    tracing::info!("liftgen serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C; serving until killed");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn user_id(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let value = headers
        .get(USER_HEADER)
        .ok_or_else(|| AppError::unauthorized(format!("missing {USER_HEADER} header")))?;
    value
        .to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .ok_or_else(|| AppError::unauthorized(format!("invalid {USER_HEADER} header")))
}

async fn generate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let user_id = user_id(&headers)?;

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let response = GenerationResponse {
                success: false,
                workout_id: None,
                error: Some(rejection.body_text()),
                error_type: Some("validation".to_owned()),
            };
            return Ok((StatusCode::BAD_REQUEST, Json(response)).into_response());
        }
    };

    let ctx = RequestContext::new(user_id, state.store.clone());
    let result = generate_workout(
        &ctx,
        state.client.as_ref(),
        &state.pipeline,
        request,
        Utc::now(),
    )
    .await;

    let response = GenerationResponse::from_result(&result, |w| w.id);
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error_type = e.error_type(), error = %e, "generation failed");
            status_for(e)
        }
    };
    Ok((status, Json(response)).into_response())
}

async fn get_workout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let user_id = user_id(&headers)?;

    let workout = state
        .store
        .get_workout(id)
        .await
        .map_err(AppError::internal)?
        .filter(|w| w.user_id == user_id)
        .ok_or_else(|| AppError::not_found(format!("workout {id} not found")))?;

    let exercises = state
        .store
        .list_workout_exercises(id)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(WorkoutDetailResponse { workout, exercises }).into_response())
}

async fn quota_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let user_id = user_id(&headers)?;

    let status = quota::check_quota(state.store.as_ref(), user_id, Utc::now())
        .await
        .map_err(AppError::internal)?;

    Ok(Json(QuotaResponse {
        remaining: status.remaining(),
        status,
    })
    .into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
