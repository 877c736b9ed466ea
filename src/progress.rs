//! Enrollment progress and the completion → certification handoff.
//!
//! Both entry points funnel through one recomputation applied inside the
//! enrollment store's atomic update; concurrent completions for the same
//! enrollment serialize on the record instead of losing writes.

use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use crate::certificates::CertificateIssuer;
use crate::error::{CoreError, CoreResult, Resource};
use crate::model::{
    Enrollment, EnrollmentStatus, Program, ProgramId, Quiz, QuizAttempt, QuizId,
    QuizSubmitResponse, StudentId,
};
use crate::store::{EnrollmentStore, ProgramStore, QuizStore};

pub struct ProgressTracker<'a> {
    programs: &'a dyn ProgramStore,
    enrollments: &'a dyn EnrollmentStore,
    quizzes: &'a dyn QuizStore,
    issuer: CertificateIssuer<'a>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(
        programs: &'a dyn ProgramStore,
        enrollments: &'a dyn EnrollmentStore,
        quizzes: &'a dyn QuizStore,
        issuer: CertificateIssuer<'a>,
    ) -> Self {
        Self {
            programs,
            enrollments,
            quizzes,
            issuer,
        }
    }

    /// Marks a video finished. Re-submitting an already-completed video
    /// is a no-op, not an error.
    pub fn complete_video(
        &self,
        student: &StudentId,
        program_id: &ProgramId,
        video_id: &str,
    ) -> CoreResult<Enrollment> {
        let program = self.load_program(program_id)?;
        if !program.video_ids().contains(video_id) {
            return Err(CoreError::not_found(Resource::Video, video_id));
        }

        let updated = self.enrollments.update_with(student, program_id, &mut |enrollment| {
            enrollment
                .progress
                .completed_videos
                .insert(video_id.to_string());
            recompute(enrollment, &program);
            Ok(())
        })?;

        debug!(
            student_id = %student,
            program_id = %program_id,
            video_id,
            percentage = updated.completion_percentage,
            "video completed"
        );

        self.finalize_certificate(updated)
    }

    /// Scores an attempt against the quiz's question bank and appends it
    /// to the attempt history; prior attempts are never overwritten.
    pub fn submit_quiz(
        &self,
        student: &StudentId,
        program_id: &ProgramId,
        quiz_id: &QuizId,
        answers: &HashMap<usize, String>,
    ) -> CoreResult<QuizSubmitResponse> {
        let program = self.load_program(program_id)?;
        let quiz = self
            .quizzes
            .get(quiz_id)
            .map_err(CoreError::from_store)?
            .ok_or_else(|| CoreError::not_found(Resource::Quiz, quiz_id.as_str()))?;

        let score = score_attempt(&quiz, answers);
        let passed = score >= quiz.passing_score;

        let updated = self.enrollments.update_with(student, program_id, &mut |enrollment| {
            enrollment.progress.quiz_attempts.push(QuizAttempt {
                quiz_id: quiz_id.clone(),
                score,
                passed,
                attempted_at: Utc::now(),
            });
            recompute(enrollment, &program);
            Ok(())
        })?;

        debug!(
            student_id = %student,
            program_id = %program_id,
            quiz_id = %quiz_id,
            score,
            passed,
            percentage = updated.completion_percentage,
            "quiz attempt recorded"
        );

        let enrollment = self.finalize_certificate(updated)?;
        Ok(QuizSubmitResponse {
            score,
            passed,
            enrollment,
        })
    }

    fn load_program(&self, program_id: &ProgramId) -> CoreResult<Program> {
        self.programs
            .get(program_id)
            .map_err(CoreError::from_store)?
            .ok_or_else(|| CoreError::not_found(Resource::Program, program_id.as_str()))
    }

    /// Mints the certificate once the enrollment reaches 100%. The
    /// issued flag is persisted only after the certificate write
    /// committed, so a store failure here leaves a retriable state
    /// rather than a phantom credential.
    fn finalize_certificate(&self, enrollment: Enrollment) -> CoreResult<Enrollment> {
        if enrollment.completion_percentage < 100 || enrollment.certificate_issued {
            return Ok(enrollment);
        }

        self.issuer
            .issue(&enrollment.student_id, &enrollment.program_id)?;

        self.enrollments.update_with(
            &enrollment.student_id,
            &enrollment.program_id,
            &mut |record| {
                record.certificate_issued = true;
                Ok(())
            },
        )
    }
}

/// Recomputes the completion percentage from the program's current
/// content. Completed items no longer present in the program (content
/// edited after the fact) are excluded on both sides of the ratio, so
/// the percentage stays within 0–100.
fn recompute(enrollment: &mut Enrollment, program: &Program) {
    let totals = program.content_totals();
    let total = totals.total();

    let percentage = if total == 0 {
        0
    } else {
        let program_videos = program.video_ids();
        let completed_videos = enrollment
            .progress
            .completed_videos
            .iter()
            .filter(|video| program_videos.contains(video.as_str()))
            .count();

        let program_quizzes = program.quiz_ids();
        let passed_quizzes = enrollment
            .progress
            .passed_quiz_ids()
            .into_iter()
            .filter(|quiz| program_quizzes.contains(quiz))
            .count();

        let completed = completed_videos + passed_quizzes;
        (100.0 * completed as f64 / total as f64).round() as u32
    };

    enrollment.completion_percentage = percentage;
    if percentage == 100 {
        enrollment.status = EnrollmentStatus::Completed;
    }
}

/// Percentage of points earned across the question bank, rounded. An
/// empty bank scores 0.
fn score_attempt(quiz: &Quiz, answers: &HashMap<usize, String>) -> u32 {
    let total_points: u32 = quiz.questions.iter().map(|question| question.points).sum();
    if total_points == 0 {
        return 0;
    }

    let earned: u32 = quiz
        .questions
        .iter()
        .enumerate()
        .filter(|(idx, question)| {
            answers
                .get(idx)
                .is_some_and(|answer| answer == &question.correct_answer)
        })
        .map(|(_, question)| question.points)
        .sum();

    (100.0 * earned as f64 / total_points as f64).round() as u32
}
