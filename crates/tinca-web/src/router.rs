//! Web router using Axum

use crate::auth::AuthUser;
use crate::response::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::{MultipleScoresRequest, Validate};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tinca_core::models::{LoginRequest, Score, TopScores, UploadScore, UserInfo, UserScores};
use tinca_core::CoreResult;
use tower_http::cors::{Any, CorsLayer};

/// Create the web router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/user/login", post(login_handler))
        .route("/score", get(user_scores_handler).post(upload_handler))
        .route("/score/multiple", post(upload_multiple_handler))
        .route("/score/leaderboard", get(leaderboard_handler))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    user_info: UserInfo,
    token: String,
}

/// Run a synchronous service call off the async workers
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Worker task failed: {e}")))?
        .map_err(ApiError::from)
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|e| {
        tracing::debug!(error = %e, "Unreadable request body");
        ApiError::BadRequest("Request body parsing failed".to_string())
    })
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().timestamp_millis(),
    }))
}

async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let request = parse_body(body)?;
    request.validate()?;

    let users = state.ctx.users.clone();
    let user_info = blocking(move || users.login(&request.username, &request.password)).await?;
    let token = state.tokens.issue(&user_info)?;

    Ok(ApiResponse::ok(
        LoginResponse { user_info, token },
        "Login successful",
    ))
}

async fn user_scores_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<UserScores> {
    let scores = state.ctx.scores.clone();
    let result = blocking(move || scores.get_user_scores(user.id)).await?;
    Ok(ApiResponse::ok(result, "User scores retrieved successfully"))
}

async fn upload_handler(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    body: Result<Json<UploadScore>, JsonRejection>,
) -> ApiResult<Score> {
    let upload = parse_body(body)?;
    upload.validate()?;

    let country = state.country(&headers);
    let scores = state.ctx.scores.clone();
    let created =
        blocking(move || scores.upload_score(user.id, &upload, country.as_deref())).await?;

    Ok(ApiResponse::created(created, "Score uploaded successfully"))
}

async fn upload_multiple_handler(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    body: Result<Json<MultipleScoresRequest>, JsonRejection>,
) -> ApiResult<Vec<Score>> {
    let request = parse_body(body)?;
    request.validate()?;

    let country = state.country(&headers);
    let scores = state.ctx.scores.clone();
    let created = blocking(move || {
        scores.upload_multiple_scores(user.id, &request.scores, country.as_deref())
    })
    .await?;

    Ok(ApiResponse::created(created, "Batch scores uploaded successfully"))
}

async fn leaderboard_handler(State(state): State<AppState>) -> ApiResult<TopScores> {
    let scores = state.ctx.scores.clone();
    let board = blocking(move || scores.get_leaderboard()).await?;
    Ok(ApiResponse::ok(board, "Leaderboard retrieved successfully"))
}
