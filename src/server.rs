//! HTTP surface: axum router and handler glue.
//!
//! Handlers deserialize params, delegate to [`crate::api`], and map
//! [`CoreError`] to the JSON error envelope `{message, errors?}`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::api;
use crate::error::CoreError;
use crate::lifecycle::{ProgramDraft, ProgramPatch};
use crate::model::{ProgramId, QuizId, StudentId};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/programs", post(create_program).get(list_programs))
        .route(
            "/programs/{id}",
            get(get_program).put(update_program).delete(delete_program),
        )
        .route("/programs/{id}/readiness", get(program_readiness))
        .route("/catalog", get(list_catalog))
        .route("/catalog/{id}", get(get_catalog_program))
        .route("/quizzes", post(create_quiz).get(list_quizzes))
        .route("/quizzes/{id}", get(get_quiz).put(update_quiz))
        .route("/enrollments/free", post(enroll_free))
        .route("/enrollments/paid", post(enroll_paid))
        .route("/students/{id}/enrollments", get(student_enrollments))
        .route("/students/{id}/certificates", get(student_certificates))
        .route("/enrollment/video-complete", post(complete_video))
        .route("/enrollment/quiz-submit", post(submit_quiz))
        .route("/certificates/verify/{certificate_id}", get(verify_certificate))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

/// Wrapper so `CoreError` can cross the handler boundary as a response.
pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if self.0.is_retryable() {
            warn!(category = self.0.category(), error = %self.0, "request failed");
        } else {
            debug!(category = self.0.category(), error = %self.0, "request rejected");
        }

        let body = match &self.0 {
            CoreError::Validation { failures } => ErrorBody {
                message: "validation failed".to_string(),
                errors: Some(failures.clone()),
            },
            other => ErrorBody {
                message: other.to_string(),
                errors: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_program(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ProgramDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let program = api::create_program(state, draft).await?;
    Ok((StatusCode::CREATED, Json(program)))
}

async fn list_programs(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::list_programs(state).await?))
}

async fn get_program(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProgramId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::get_program(state, id).await?))
}

async fn update_program(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProgramId>,
    Json(patch): Json<ProgramPatch>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::update_program(state, id, patch).await?))
}

async fn delete_program(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProgramId>,
) -> Result<impl IntoResponse, ApiError> {
    api::delete_program(state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn program_readiness(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProgramId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::program_readiness(state, id).await?))
}

async fn list_catalog(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::list_catalog(state).await?))
}

async fn get_catalog_program(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ProgramId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::get_catalog_program(state, id).await?))
}

async fn create_quiz(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<api::QuizDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let quiz = api::create_quiz(state, draft).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

async fn list_quizzes(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::list_quizzes(state).await?))
}

async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<QuizId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::get_quiz(state, id).await?))
}

async fn update_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<QuizId>,
    Json(patch): Json<api::QuizPatch>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::update_quiz(state, id, patch).await?))
}

async fn enroll_free(
    State(state): State<Arc<AppState>>,
    Json(params): Json<api::EnrollParams>,
) -> Result<impl IntoResponse, ApiError> {
    let enrollment = api::enroll_free(state, params).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

async fn enroll_paid(
    State(state): State<Arc<AppState>>,
    Json(params): Json<api::EnrollParams>,
) -> Result<impl IntoResponse, ApiError> {
    let enrollment = api::enroll_paid(state, params).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

async fn student_enrollments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<StudentId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::student_enrollments(state, id).await?))
}

async fn student_certificates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<StudentId>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::student_certificates(state, id).await?))
}

async fn complete_video(
    State(state): State<Arc<AppState>>,
    Json(params): Json<api::CompleteVideoParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::complete_video(state, params).await?))
}

async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    Json(params): Json<api::SubmitQuizParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::submit_quiz(state, params).await?))
}

async fn verify_certificate(
    State(state): State<Arc<AppState>>,
    Path(certificate_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(api::verify_certificate(state, certificate_id).await?))
}
