//! Enrollment creation and per-student progress overviews.
//!
//! Payment settlement is an external concern: `enroll_paid` is called by
//! the boundary layer only after the gateway has verified payment, and
//! `enroll_free` refuses priced programs outright.

use chrono::Utc;
use tracing::info;

use crate::error::{CoreError, CoreResult, Resource, StoreError};
use crate::ids::new_document_id;
use crate::model::{
    Enrollment, EnrollmentId, EnrollmentStatus, EnrollmentSummary, Program, ProgramId,
    StudentId,
};
use crate::store::{EnrollmentStore, ProgramStore};

pub struct EnrollmentService<'a> {
    programs: &'a dyn ProgramStore,
    enrollments: &'a dyn EnrollmentStore,
}

impl<'a> EnrollmentService<'a> {
    pub fn new(programs: &'a dyn ProgramStore, enrollments: &'a dyn EnrollmentStore) -> Self {
        Self {
            programs,
            enrollments,
        }
    }

    pub fn enroll_free(&self, student: &StudentId, program_id: &ProgramId) -> CoreResult<Enrollment> {
        let program = self.load_program(program_id)?;
        if program.price > 0 {
            return Err(CoreError::Validation {
                failures: vec!["Program is not free, payment required".to_string()],
            });
        }
        self.create_enrollment(student, program_id)
    }

    /// Records the enrollment backing a verified payment.
    pub fn enroll_paid(&self, student: &StudentId, program_id: &ProgramId) -> CoreResult<Enrollment> {
        let program = self.load_program(program_id)?;
        if program.price == 0 {
            return Err(CoreError::Validation {
                failures: vec!["Program is free, use free enrollment".to_string()],
            });
        }
        self.create_enrollment(student, program_id)
    }

    /// Dashboard rows for one student, newest enrollment first. Programs
    /// deleted after enrollment are skipped rather than erroring the
    /// whole overview.
    pub fn summaries(&self, student: &StudentId) -> CoreResult<Vec<EnrollmentSummary>> {
        let enrollments = self
            .enrollments
            .list_by_student(student)
            .map_err(CoreError::from_store)?;

        let mut summaries = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let Some(program) = self
                .programs
                .get(&enrollment.program_id)
                .map_err(CoreError::from_store)?
            else {
                continue;
            };
            summaries.push(EnrollmentSummary {
                program_id: program.id,
                program_title: program.title,
                level: program.level,
                completion_percentage: enrollment.completion_percentage,
                status: enrollment.status,
                certificate_issued: enrollment.certificate_issued,
            });
        }
        Ok(summaries)
    }

    fn load_program(&self, program_id: &ProgramId) -> CoreResult<Program> {
        self.programs
            .get(program_id)
            .map_err(CoreError::from_store)?
            .ok_or_else(|| CoreError::not_found(Resource::Program, program_id.as_str()))
    }

    fn create_enrollment(
        &self,
        student: &StudentId,
        program_id: &ProgramId,
    ) -> CoreResult<Enrollment> {
        let enrollment = Enrollment {
            id: EnrollmentId(new_document_id()),
            student_id: student.clone(),
            program_id: program_id.clone(),
            enrolled_at: Utc::now(),
            progress: Default::default(),
            completion_percentage: 0,
            status: EnrollmentStatus::Active,
            certificate_issued: false,
        };

        match self.enrollments.insert(enrollment) {
            Ok(created) => {
                info!(
                    student_id = %student,
                    program_id = %program_id,
                    "student enrolled"
                );
                Ok(created)
            }
            Err(StoreError::DuplicateKey(_)) => {
                Err(CoreError::conflict("student already enrolled"))
            }
            Err(err) => Err(CoreError::from_store(err)),
        }
    }
}
