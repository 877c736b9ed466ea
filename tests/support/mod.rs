#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use chrono::Utc;
use parking_lot::Mutex;

use lms_server::certificates::CertificateIssuer;
use lms_server::config::ServerConfig;
use lms_server::enrollment::EnrollmentService;
use lms_server::error::StoreError;
use lms_server::ids::CodeGenerator;
use lms_server::lifecycle::{ProgramDraft, ProgramLifecycle};
use lms_server::model::{
    Certificate, ContentItem, Enrollment, Module, Program, ProgramId, ProgramType, Quiz, QuizId,
    QuizQuestion, StudentId,
};
use lms_server::progress::ProgressTracker;
use lms_server::state::AppState;
use lms_server::store::memory::{
    MemoryCertificateStore, MemoryEnrollmentStore, MemoryProgramStore, MemoryQuizStore,
    MemoryStudentDirectory,
};
use lms_server::store::{
    CertificateInsert, CertificateStore, EnrollmentStore, ProgramStore, QuizStore, StoreResult,
};

/// Deterministic code source: sequential program codes and certificate
/// ids, with an optional scripted queue of certificate ids for collision
/// scenarios.
#[derive(Default)]
pub struct ScriptedCodes {
    program_seq: AtomicU32,
    cert_seq: AtomicU32,
    scripted_cert_ids: Mutex<Vec<String>>,
}

impl ScriptedCodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues certificate ids returned (in order) before falling back to
    /// the sequential scheme.
    pub fn push_certificate_ids<I: IntoIterator<Item = S>, S: Into<String>>(&self, ids: I) {
        let mut scripted = self.scripted_cert_ids.lock();
        for id in ids {
            scripted.push(id.into());
        }
    }
}

impl CodeGenerator for ScriptedCodes {
    fn program_code(&self, program_type: ProgramType) -> String {
        let seq = self.program_seq.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:05}", program_type.code_prefix(), 10_000 + seq)
    }

    fn certificate_id(&self) -> String {
        let mut scripted = self.scripted_cert_ids.lock();
        if !scripted.is_empty() {
            return scripted.remove(0);
        }
        let seq = self.cert_seq.fetch_add(1, Ordering::Relaxed);
        format!("CERT-{:08X}", seq)
    }
}

/// Certificate store that can be switched into a failing mode to
/// exercise the persistence-failure path.
pub struct ToggleFailCertificateStore {
    inner: MemoryCertificateStore,
    failing: AtomicBool,
}

impl ToggleFailCertificateStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryCertificateStore::new(),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("certificate store offline".into()))
        } else {
            Ok(())
        }
    }
}

impl CertificateStore for ToggleFailCertificateStore {
    fn insert_if_absent(&self, certificate: Certificate) -> StoreResult<CertificateInsert> {
        self.check()?;
        self.inner.insert_if_absent(certificate)
    }

    fn find_by_student_program(
        &self,
        student: &StudentId,
        program: &ProgramId,
    ) -> StoreResult<Option<Certificate>> {
        self.check()?;
        self.inner.find_by_student_program(student, program)
    }

    fn find_by_certificate_id(&self, certificate_id: &str) -> StoreResult<Option<Certificate>> {
        self.check()?;
        self.inner.find_by_certificate_id(certificate_id)
    }

    fn list_by_student(&self, student: &StudentId) -> StoreResult<Vec<Certificate>> {
        self.check()?;
        self.inner.list_by_student(student)
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub programs: Arc<MemoryProgramStore>,
    pub enrollments: Arc<MemoryEnrollmentStore>,
    pub certificates: Arc<ToggleFailCertificateStore>,
    pub quizzes: Arc<MemoryQuizStore>,
    pub directory: Arc<MemoryStudentDirectory>,
    pub codes: Arc<ScriptedCodes>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Arc::new(test_config());
        let programs = Arc::new(MemoryProgramStore::new());
        let enrollments = Arc::new(MemoryEnrollmentStore::new());
        let certificates = Arc::new(ToggleFailCertificateStore::new());
        let quizzes = Arc::new(MemoryQuizStore::new());
        let directory = Arc::new(MemoryStudentDirectory::new());
        let codes = Arc::new(ScriptedCodes::new());

        let state = Arc::new(AppState::with_parts(
            config,
            programs.clone(),
            enrollments.clone(),
            certificates.clone(),
            quizzes.clone(),
            directory.clone(),
            codes.clone(),
        ));

        Self {
            state,
            programs,
            enrollments,
            certificates,
            quizzes,
            directory,
            codes,
        }
    }

    pub fn lifecycle(&self) -> ProgramLifecycle<'_> {
        ProgramLifecycle::new(self.state.programs(), self.state.codes())
    }

    pub fn enrollment_service(&self) -> EnrollmentService<'_> {
        EnrollmentService::new(self.state.programs(), self.state.enrollments())
    }

    pub fn tracker(&self) -> ProgressTracker<'_> {
        ProgressTracker::new(
            self.state.programs(),
            self.state.enrollments(),
            self.state.quizzes(),
            self.issuer(),
        )
    }

    pub fn issuer(&self) -> CertificateIssuer<'_> {
        CertificateIssuer::new(
            self.state.certificates(),
            self.state.codes(),
            self.state.config(),
        )
    }

    pub fn student(&self, id: &str, name: &str) -> StudentId {
        let student = StudentId(id.to_string());
        self.directory.register(student.clone(), name);
        student
    }

    /// Creates and publishes a free program with one single-video module
    /// per entry in `videos`.
    pub fn published_video_program(&self, videos: &[&str]) -> Program {
        let modules = videos
            .iter()
            .enumerate()
            .map(|(idx, url)| video_module(&format!("Module {}", idx + 1), url))
            .collect();
        let program = self
            .lifecycle()
            .create(free_draft("Rust Fundamentals", modules))
            .expect("create program");
        self.lifecycle()
            .request_publish(&program.id)
            .expect("publish program")
    }

    pub fn enroll(&self, student: &StudentId, program: &ProgramId) -> Enrollment {
        self.enrollment_service()
            .enroll_free(student, program)
            .expect("enroll")
    }

    pub fn add_quiz(&self, id: &str, passing_score: u32, questions: Vec<QuizQuestion>) -> Quiz {
        let quiz = Quiz {
            id: QuizId(id.to_string()),
            title: format!("Quiz {id}"),
            questions,
            passing_score,
            time_limit_minutes: 30,
            created_at: Utc::now(),
        };
        self.quizzes.insert(quiz).expect("insert quiz")
    }

    pub fn certificates_for(&self, student: &StudentId) -> Vec<Certificate> {
        self.certificates
            .list_by_student(student)
            .expect("certificate store")
    }

    pub fn stored_program(&self, id: &ProgramId) -> Program {
        self.programs
            .get(id)
            .expect("program store")
            .expect("program exists")
    }

    pub fn program_count(&self) -> usize {
        self.programs.list().expect("program store").len()
    }

    pub fn find_enrollment(&self, student: &StudentId, program: &ProgramId) -> Enrollment {
        self.enrollments
            .find(student, program)
            .expect("find enrollment")
            .expect("enrollment exists")
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        http_bind_address: "127.0.0.1:0".parse().expect("bind addr"),
        certificate_base_url: "https://certs.test".to_string(),
        students_file: None,
        graceful_shutdown_timeout_secs: 1,
    }
}

pub fn video_item(title: &str, url: &str) -> ContentItem {
    ContentItem::Video {
        title: title.to_string(),
        url: url.to_string(),
        duration: "10:00".to_string(),
    }
}

pub fn quiz_item(title: &str, quiz_id: &str) -> ContentItem {
    ContentItem::Quiz {
        title: title.to_string(),
        quiz_id: QuizId(quiz_id.to_string()),
    }
}

pub fn video_module(title: &str, url: &str) -> Module {
    Module {
        title: title.to_string(),
        description: format!("{title} description"),
        content: vec![video_item(&format!("{title} video"), url)],
    }
}

pub fn module_with(title: &str, content: Vec<ContentItem>) -> Module {
    Module {
        title: title.to_string(),
        description: format!("{title} description"),
        content,
    }
}

pub fn free_draft(title: &str, modules: Vec<Module>) -> ProgramDraft {
    draft(title, ProgramType::Free, 0, modules)
}

pub fn draft(title: &str, program_type: ProgramType, price: u32, modules: Vec<Module>) -> ProgramDraft {
    ProgramDraft {
        title: title.to_string(),
        description: format!("{title} description"),
        program_type,
        level: "Beginner".to_string(),
        duration: "40 hours".to_string(),
        price,
        banner_image: None,
        certificate_template: match program_type {
            ProgramType::Certification => Some("templates/cert-bg.png".to_string()),
            _ => None,
        },
        modules,
        status: None,
    }
}

pub fn question(correct: &str, points: u32) -> QuizQuestion {
    QuizQuestion {
        question_text: format!("Pick {correct}"),
        options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        correct_answer: correct.to_string(),
        points,
    }
}

pub fn answers(entries: &[(usize, &str)]) -> std::collections::HashMap<usize, String> {
    entries
        .iter()
        .map(|(idx, answer)| (*idx, answer.to_string()))
        .collect()
}

/// `published_video_program` counterpart for drafts that are expected to
/// fail the publish gate.
pub fn expect_validation_failures(err: lms_server::CoreError) -> Vec<String> {
    match err {
        lms_server::CoreError::Validation { failures } => failures,
        other => panic!("expected validation error, got {other:?}"),
    }
}
