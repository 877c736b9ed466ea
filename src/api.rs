//! Operation layer: one function per exposed operation, params struct
//! in, response out. HTTP handlers in [`crate::server`] are thin
//! wrappers over these, so tests can drive the same code paths without a
//! listener.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::certificates::{self, CertificateIssuer};
use crate::enrollment::EnrollmentService;
use crate::error::{CoreError, CoreResult, Resource};
use crate::ids::new_document_id;
use crate::lifecycle::{ProgramDraft, ProgramLifecycle, ProgramPatch};
use crate::model::{
    CertificateListResponse, CertificateVerification, Enrollment, Program, ProgramId,
    ProgramListResponse, ProgramStatus, Quiz, QuizId, QuizListResponse, QuizQuestion,
    QuizSubmitResponse, StudentEnrollmentsResponse, StudentId,
};
use crate::progress::ProgressTracker;
use crate::state::AppState;
use crate::validation::ValidationReport;

fn lifecycle(state: &AppState) -> ProgramLifecycle<'_> {
    ProgramLifecycle::new(state.programs(), state.codes())
}

fn tracker(state: &AppState) -> ProgressTracker<'_> {
    ProgressTracker::new(
        state.programs(),
        state.enrollments(),
        state.quizzes(),
        CertificateIssuer::new(state.certificates(), state.codes(), state.config()),
    )
}

// ---------------------------------------------------------------------
// Programs (admin)
// ---------------------------------------------------------------------

pub async fn create_program(state: Arc<AppState>, draft: ProgramDraft) -> CoreResult<Program> {
    lifecycle(&state).create(draft)
}

pub async fn update_program(
    state: Arc<AppState>,
    id: ProgramId,
    patch: ProgramPatch,
) -> CoreResult<Program> {
    lifecycle(&state).update(&id, patch)
}

pub async fn delete_program(state: Arc<AppState>, id: ProgramId) -> CoreResult<()> {
    lifecycle(&state).delete(&id)
}

pub async fn get_program(state: Arc<AppState>, id: ProgramId) -> CoreResult<Program> {
    state
        .programs()
        .get(&id)
        .map_err(CoreError::from_store)?
        .ok_or_else(|| CoreError::not_found(Resource::Program, id.as_str()))
}

/// Admin listing: every program, newest first.
pub async fn list_programs(state: Arc<AppState>) -> CoreResult<ProgramListResponse> {
    let mut programs = state.programs().list().map_err(CoreError::from_store)?;
    programs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(ProgramListResponse { programs })
}

pub async fn program_readiness(
    state: Arc<AppState>,
    id: ProgramId,
) -> CoreResult<ValidationReport> {
    lifecycle(&state).readiness(&id)
}

// ---------------------------------------------------------------------
// Catalog (public, published-only)
// ---------------------------------------------------------------------

pub async fn list_catalog(state: Arc<AppState>) -> CoreResult<ProgramListResponse> {
    let mut programs: Vec<Program> = state
        .programs()
        .list()
        .map_err(CoreError::from_store)?
        .into_iter()
        .filter(|program| program.status == ProgramStatus::Published)
        .collect();
    programs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(ProgramListResponse { programs })
}

pub async fn get_catalog_program(state: Arc<AppState>, id: ProgramId) -> CoreResult<Program> {
    state
        .programs()
        .get(&id)
        .map_err(CoreError::from_store)?
        .filter(|program| program.status == ProgramStatus::Published)
        .ok_or_else(|| CoreError::not_found(Resource::Program, id.as_str()))
}

// ---------------------------------------------------------------------
// Quizzes
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct QuizDraft {
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
    #[serde(default = "QuizDraft::default_passing_score")]
    pub passing_score: u32,
    #[serde(default = "QuizDraft::default_time_limit")]
    pub time_limit_minutes: u32,
}

impl QuizDraft {
    fn default_passing_score() -> u32 {
        70
    }

    fn default_time_limit() -> u32 {
        30
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizPatch {
    pub title: Option<String>,
    pub questions: Option<Vec<QuizQuestion>>,
    pub passing_score: Option<u32>,
    pub time_limit_minutes: Option<u32>,
}

pub async fn create_quiz(state: Arc<AppState>, draft: QuizDraft) -> CoreResult<Quiz> {
    let quiz = Quiz {
        id: QuizId(new_document_id()),
        title: draft.title,
        questions: draft.questions,
        passing_score: draft.passing_score,
        time_limit_minutes: draft.time_limit_minutes,
        created_at: Utc::now(),
    };
    state.quizzes().insert(quiz).map_err(CoreError::from_store)
}

pub async fn get_quiz(state: Arc<AppState>, id: QuizId) -> CoreResult<Quiz> {
    state
        .quizzes()
        .get(&id)
        .map_err(CoreError::from_store)?
        .ok_or_else(|| CoreError::not_found(Resource::Quiz, id.as_str()))
}

pub async fn update_quiz(state: Arc<AppState>, id: QuizId, patch: QuizPatch) -> CoreResult<Quiz> {
    state.quizzes().update_with(&id, &mut |quiz| {
        if let Some(title) = &patch.title {
            quiz.title = title.clone();
        }
        if let Some(questions) = &patch.questions {
            quiz.questions = questions.clone();
        }
        if let Some(passing_score) = patch.passing_score {
            quiz.passing_score = passing_score;
        }
        if let Some(time_limit) = patch.time_limit_minutes {
            quiz.time_limit_minutes = time_limit;
        }
        Ok(())
    })
}

pub async fn list_quizzes(state: Arc<AppState>) -> CoreResult<QuizListResponse> {
    let mut quizzes = state.quizzes().list().map_err(CoreError::from_store)?;
    quizzes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(QuizListResponse { quizzes })
}

// ---------------------------------------------------------------------
// Enrollment
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollParams {
    pub student_id: StudentId,
    pub program_id: ProgramId,
}

pub async fn enroll_free(state: Arc<AppState>, params: EnrollParams) -> CoreResult<Enrollment> {
    EnrollmentService::new(state.programs(), state.enrollments())
        .enroll_free(&params.student_id, &params.program_id)
}

pub async fn enroll_paid(state: Arc<AppState>, params: EnrollParams) -> CoreResult<Enrollment> {
    EnrollmentService::new(state.programs(), state.enrollments())
        .enroll_paid(&params.student_id, &params.program_id)
}

pub async fn student_enrollments(
    state: Arc<AppState>,
    student: StudentId,
) -> CoreResult<StudentEnrollmentsResponse> {
    let enrollments =
        EnrollmentService::new(state.programs(), state.enrollments()).summaries(&student)?;
    Ok(StudentEnrollmentsResponse { enrollments })
}

pub async fn student_certificates(
    state: Arc<AppState>,
    student: StudentId,
) -> CoreResult<CertificateListResponse> {
    let certificates = state
        .certificates()
        .list_by_student(&student)
        .map_err(CoreError::from_store)?;
    Ok(CertificateListResponse { certificates })
}

// ---------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteVideoParams {
    pub student_id: StudentId,
    pub program_id: ProgramId,
    pub video_id: String,
}

pub async fn complete_video(
    state: Arc<AppState>,
    params: CompleteVideoParams,
) -> CoreResult<Enrollment> {
    tracker(&state).complete_video(&params.student_id, &params.program_id, &params.video_id)
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitQuizParams {
    pub student_id: StudentId,
    pub program_id: ProgramId,
    pub quiz_id: QuizId,
    /// Question index → selected option.
    #[serde(default)]
    pub answers: HashMap<usize, String>,
}

pub async fn submit_quiz(
    state: Arc<AppState>,
    params: SubmitQuizParams,
) -> CoreResult<QuizSubmitResponse> {
    tracker(&state).submit_quiz(
        &params.student_id,
        &params.program_id,
        &params.quiz_id,
        &params.answers,
    )
}

// ---------------------------------------------------------------------
// Certificates
// ---------------------------------------------------------------------

pub async fn verify_certificate(
    state: Arc<AppState>,
    certificate_id: String,
) -> CoreResult<CertificateVerification> {
    certificates::verify(
        state.certificates(),
        state.programs(),
        state.students(),
        &certificate_id,
    )
}
