//! In-memory store backend over `parking_lot` locks.
//!
//! Each `update_with` holds the map's write lock for the duration of the
//! closure and commits a scratch copy only on success, so a failed
//! mutation leaves the record untouched.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, Resource, StoreError};
use crate::model::{
    Certificate, Enrollment, Program, ProgramId, Quiz, QuizId, StudentId,
};
use crate::store::{
    CertificateInsert, CertificateStore, EnrollmentStore, ProgramStore, QuizStore, StoreResult,
    StudentDirectory,
};

#[derive(Default)]
pub struct MemoryProgramStore {
    programs: RwLock<HashMap<ProgramId, Program>>,
}

impl MemoryProgramStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgramStore for MemoryProgramStore {
    fn insert(&self, program: Program) -> StoreResult<Program> {
        let mut programs = self.programs.write();
        if programs.contains_key(&program.id) {
            return Err(StoreError::DuplicateKey(format!(
                "program({})",
                program.id
            )));
        }
        if programs
            .values()
            .any(|existing| existing.program_code == program.program_code)
        {
            return Err(StoreError::DuplicateKey(format!(
                "program_code({})",
                program.program_code
            )));
        }
        programs.insert(program.id.clone(), program.clone());
        Ok(program)
    }

    fn get(&self, id: &ProgramId) -> StoreResult<Option<Program>> {
        Ok(self.programs.read().get(id).cloned())
    }

    fn update_with(
        &self,
        id: &ProgramId,
        apply: &mut dyn FnMut(&mut Program) -> CoreResult<()>,
    ) -> CoreResult<Program> {
        let mut programs = self.programs.write();
        let entry = programs
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found(Resource::Program, id.as_str()))?;
        let mut draft = entry.clone();
        apply(&mut draft)?;
        *entry = draft.clone();
        Ok(draft)
    }

    fn delete(&self, id: &ProgramId) -> StoreResult<bool> {
        Ok(self.programs.write().remove(id).is_some())
    }

    fn list(&self) -> StoreResult<Vec<Program>> {
        Ok(self.programs.read().values().cloned().collect())
    }
}

#[derive(Default)]
pub struct MemoryEnrollmentStore {
    enrollments: RwLock<HashMap<(StudentId, ProgramId), Enrollment>>,
}

impl MemoryEnrollmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EnrollmentStore for MemoryEnrollmentStore {
    fn insert(&self, enrollment: Enrollment) -> StoreResult<Enrollment> {
        let key = (
            enrollment.student_id.clone(),
            enrollment.program_id.clone(),
        );
        let mut enrollments = self.enrollments.write();
        if enrollments.contains_key(&key) {
            return Err(StoreError::DuplicateKey(format!(
                "enrollment({},{})",
                key.0, key.1
            )));
        }
        enrollments.insert(key, enrollment.clone());
        Ok(enrollment)
    }

    fn find(&self, student: &StudentId, program: &ProgramId) -> StoreResult<Option<Enrollment>> {
        let key = (student.clone(), program.clone());
        Ok(self.enrollments.read().get(&key).cloned())
    }

    fn list_by_student(&self, student: &StudentId) -> StoreResult<Vec<Enrollment>> {
        let mut found: Vec<Enrollment> = self
            .enrollments
            .read()
            .values()
            .filter(|enrollment| &enrollment.student_id == student)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        Ok(found)
    }

    fn update_with(
        &self,
        student: &StudentId,
        program: &ProgramId,
        apply: &mut dyn FnMut(&mut Enrollment) -> CoreResult<()>,
    ) -> CoreResult<Enrollment> {
        let key = (student.clone(), program.clone());
        let mut enrollments = self.enrollments.write();
        let entry = enrollments.get_mut(&key).ok_or_else(|| {
            CoreError::not_found(
                Resource::Enrollment,
                format!("{}/{}", student, program),
            )
        })?;
        let mut draft = entry.clone();
        apply(&mut draft)?;
        *entry = draft.clone();
        Ok(draft)
    }
}

#[derive(Default)]
pub struct MemoryCertificateStore {
    certificates: RwLock<Vec<Certificate>>,
}

impl MemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CertificateStore for MemoryCertificateStore {
    fn insert_if_absent(&self, certificate: Certificate) -> StoreResult<CertificateInsert> {
        let mut certificates = self.certificates.write();
        if let Some(existing) = certificates.iter().find(|existing| {
            existing.student_id == certificate.student_id
                && existing.program_id == certificate.program_id
        }) {
            return Ok(CertificateInsert::Existing(existing.clone()));
        }
        if certificates
            .iter()
            .any(|existing| existing.certificate_id == certificate.certificate_id)
        {
            return Err(StoreError::DuplicateKey(format!(
                "certificate_id({})",
                certificate.certificate_id
            )));
        }
        certificates.push(certificate.clone());
        Ok(CertificateInsert::Created(certificate))
    }

    fn find_by_student_program(
        &self,
        student: &StudentId,
        program: &ProgramId,
    ) -> StoreResult<Option<Certificate>> {
        Ok(self
            .certificates
            .read()
            .iter()
            .find(|cert| &cert.student_id == student && &cert.program_id == program)
            .cloned())
    }

    fn find_by_certificate_id(&self, certificate_id: &str) -> StoreResult<Option<Certificate>> {
        Ok(self
            .certificates
            .read()
            .iter()
            .find(|cert| cert.certificate_id == certificate_id)
            .cloned())
    }

    fn list_by_student(&self, student: &StudentId) -> StoreResult<Vec<Certificate>> {
        Ok(self
            .certificates
            .read()
            .iter()
            .filter(|cert| &cert.student_id == student)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryQuizStore {
    quizzes: RwLock<HashMap<QuizId, Quiz>>,
}

impl MemoryQuizStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuizStore for MemoryQuizStore {
    fn insert(&self, quiz: Quiz) -> StoreResult<Quiz> {
        let mut quizzes = self.quizzes.write();
        if quizzes.contains_key(&quiz.id) {
            return Err(StoreError::DuplicateKey(format!("quiz({})", quiz.id)));
        }
        quizzes.insert(quiz.id.clone(), quiz.clone());
        Ok(quiz)
    }

    fn get(&self, id: &QuizId) -> StoreResult<Option<Quiz>> {
        Ok(self.quizzes.read().get(id).cloned())
    }

    fn update_with(
        &self,
        id: &QuizId,
        apply: &mut dyn FnMut(&mut Quiz) -> CoreResult<()>,
    ) -> CoreResult<Quiz> {
        let mut quizzes = self.quizzes.write();
        let entry = quizzes
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found(Resource::Quiz, id.as_str()))?;
        let mut draft = entry.clone();
        apply(&mut draft)?;
        *entry = draft.clone();
        Ok(draft)
    }

    fn list(&self) -> StoreResult<Vec<Quiz>> {
        Ok(self.quizzes.read().values().cloned().collect())
    }
}

/// Name directory seeded at startup or by tests; lookups never fail.
#[derive(Default)]
pub struct MemoryStudentDirectory {
    names: RwLock<HashMap<StudentId, String>>,
}

impl MemoryStudentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, student: StudentId, name: impl Into<String>) {
        self.names.write().insert(student, name.into());
    }
}

impl StudentDirectory for MemoryStudentDirectory {
    fn display_name(&self, student: &StudentId) -> StoreResult<Option<String>> {
        Ok(self.names.read().get(student).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EnrollmentStatus;
    use chrono::Utc;

    fn enrollment(student: &str, program: &str) -> Enrollment {
        Enrollment {
            id: crate::model::EnrollmentId(format!("e-{student}-{program}")),
            student_id: StudentId(student.into()),
            program_id: ProgramId(program.into()),
            enrolled_at: Utc::now(),
            progress: Default::default(),
            completion_percentage: 0,
            status: EnrollmentStatus::Active,
            certificate_issued: false,
        }
    }

    fn certificate(id: &str, student: &str, program: &str) -> Certificate {
        Certificate {
            certificate_id: id.into(),
            student_id: StudentId(student.into()),
            program_id: ProgramId(program.into()),
            issued_at: Utc::now(),
            artifact_url: format!("https://certs.example.com/{id}.pdf"),
        }
    }

    #[test]
    fn duplicate_enrollment_pair_is_rejected() {
        let store = MemoryEnrollmentStore::new();
        store.insert(enrollment("s-1", "p-1")).expect("first insert");
        let err = store
            .insert(enrollment("s-1", "p-1"))
            .expect_err("duplicate pair");
        assert!(matches!(err, StoreError::DuplicateKey(_)));
        // Same student, different program is fine.
        store.insert(enrollment("s-1", "p-2")).expect("other program");
    }

    #[test]
    fn failed_update_closure_commits_nothing() {
        let store = MemoryEnrollmentStore::new();
        store.insert(enrollment("s-1", "p-1")).expect("insert");
        let student = StudentId("s-1".into());
        let program = ProgramId("p-1".into());

        let err = store.update_with(&student, &program, &mut |draft| {
            draft.completion_percentage = 50;
            Err(CoreError::Store(StoreError::Unavailable("disk full".into())))
        });
        assert!(err.is_err());

        let unchanged = store.find(&student, &program).expect("find").expect("some");
        assert_eq!(unchanged.completion_percentage, 0);
    }

    #[test]
    fn certificate_insert_is_idempotent_per_pair() {
        let store = MemoryCertificateStore::new();
        let first = store
            .insert_if_absent(certificate("CERT-AAAA1111", "s-1", "p-1"))
            .expect("insert");
        assert!(matches!(first, CertificateInsert::Created(_)));

        let second = store
            .insert_if_absent(certificate("CERT-BBBB2222", "s-1", "p-1"))
            .expect("insert");
        match second {
            CertificateInsert::Existing(cert) => {
                assert_eq!(cert.certificate_id, "CERT-AAAA1111")
            }
            CertificateInsert::Created(_) => panic!("pair already certified"),
        }
    }

    #[test]
    fn certificate_id_collision_across_pairs_is_duplicate_key() {
        let store = MemoryCertificateStore::new();
        store
            .insert_if_absent(certificate("CERT-AAAA1111", "s-1", "p-1"))
            .expect("insert");
        let err = store
            .insert_if_absent(certificate("CERT-AAAA1111", "s-2", "p-1"))
            .expect_err("colliding id");
        assert!(matches!(err, StoreError::DuplicateKey(_)));
    }

    #[test]
    fn program_code_uniqueness_is_store_enforced() {
        let store = MemoryProgramStore::new();
        let mut program = Program {
            id: ProgramId("p-1".into()),
            program_code: "FC-11111".into(),
            title: "Rust Fundamentals".into(),
            description: "Intro".into(),
            program_type: crate::model::ProgramType::Free,
            level: "Beginner".into(),
            duration: "40 hours".into(),
            price: 0,
            status: crate::model::ProgramStatus::Draft,
            banner_image: None,
            certificate_template: None,
            modules: vec![],
            created_at: Utc::now(),
        };
        store.insert(program.clone()).expect("insert");

        program.id = ProgramId("p-2".into());
        let err = store.insert(program).expect_err("same code");
        assert!(matches!(err, StoreError::DuplicateKey(_)));
    }
}
