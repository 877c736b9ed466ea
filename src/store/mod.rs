//! Storage abstraction consumed by the core.
//!
//! Read-modify-write cycles go through `update_with`, which applies the
//! closure under the record's lock and commits only when the closure
//! succeeds. Callers never issue separate read-then-write calls, so
//! concurrent mutations of one record cannot lose updates.

pub mod memory;

use crate::error::{CoreResult, StoreError};
use crate::model::{
    Certificate, Enrollment, Program, ProgramId, Quiz, QuizId, StudentId,
};

pub type StoreResult<T> = Result<T, StoreError>;

pub trait ProgramStore: Send + Sync {
    /// Fails with `DuplicateKey` when the id or program code is taken.
    fn insert(&self, program: Program) -> StoreResult<Program>;
    fn get(&self, id: &ProgramId) -> StoreResult<Option<Program>>;
    /// Atomic conditional update: `apply` runs under the record lock and
    /// the mutation is committed only if it returns `Ok`.
    fn update_with(
        &self,
        id: &ProgramId,
        apply: &mut dyn FnMut(&mut Program) -> CoreResult<()>,
    ) -> CoreResult<Program>;
    /// Returns whether a record was removed. Deletion is permitted
    /// regardless of status or enrollment count.
    fn delete(&self, id: &ProgramId) -> StoreResult<bool>;
    fn list(&self) -> StoreResult<Vec<Program>>;
}

pub trait EnrollmentStore: Send + Sync {
    /// Fails with `DuplicateKey` when the (student, program) pair is
    /// already enrolled.
    fn insert(&self, enrollment: Enrollment) -> StoreResult<Enrollment>;
    fn find(&self, student: &StudentId, program: &ProgramId) -> StoreResult<Option<Enrollment>>;
    fn list_by_student(&self, student: &StudentId) -> StoreResult<Vec<Enrollment>>;
    /// Atomic conditional update scoped to one enrollment record.
    fn update_with(
        &self,
        student: &StudentId,
        program: &ProgramId,
        apply: &mut dyn FnMut(&mut Enrollment) -> CoreResult<()>,
    ) -> CoreResult<Enrollment>;
}

/// Outcome of the atomic check-then-insert on the certificate store.
#[derive(Debug, Clone, PartialEq)]
pub enum CertificateInsert {
    Created(Certificate),
    /// A certificate for the (student, program) pair already existed;
    /// returned unchanged.
    Existing(Certificate),
}

impl CertificateInsert {
    pub fn into_certificate(self) -> Certificate {
        match self {
            CertificateInsert::Created(cert) | CertificateInsert::Existing(cert) => cert,
        }
    }
}

pub trait CertificateStore: Send + Sync {
    /// Atomic per (student, program): concurrent calls resolve to one
    /// `Created` and the rest `Existing`. A certificate-id collision with
    /// a different pair fails with `DuplicateKey` so the issuer can retry
    /// with a fresh id.
    fn insert_if_absent(&self, certificate: Certificate) -> StoreResult<CertificateInsert>;
    fn find_by_student_program(
        &self,
        student: &StudentId,
        program: &ProgramId,
    ) -> StoreResult<Option<Certificate>>;
    fn find_by_certificate_id(&self, certificate_id: &str) -> StoreResult<Option<Certificate>>;
    fn list_by_student(&self, student: &StudentId) -> StoreResult<Vec<Certificate>>;
}

pub trait QuizStore: Send + Sync {
    fn insert(&self, quiz: Quiz) -> StoreResult<Quiz>;
    fn get(&self, id: &QuizId) -> StoreResult<Option<Quiz>>;
    fn update_with(
        &self,
        id: &QuizId,
        apply: &mut dyn FnMut(&mut Quiz) -> CoreResult<()>,
    ) -> CoreResult<Quiz>;
    fn list(&self) -> StoreResult<Vec<Quiz>>;
}

/// Read-only student display-name lookup; account management itself is an
/// external concern.
pub trait StudentDirectory: Send + Sync {
    fn display_name(&self, student: &StudentId) -> StoreResult<Option<String>>;
}
