use std::sync::Arc;

use tracing::info;

use crate::config::ServerConfig;
use crate::ids::{CodeGenerator, RandomCodes};
use crate::model::StudentId;
use crate::store::memory::{
    MemoryCertificateStore, MemoryEnrollmentStore, MemoryProgramStore, MemoryQuizStore,
    MemoryStudentDirectory,
};
use crate::store::{
    CertificateStore, EnrollmentStore, ProgramStore, QuizStore, StudentDirectory,
};

/// Shared handles behind every request handler. Stores are trait objects
/// so tests can substitute deterministic or failing backends.
pub struct AppState {
    config: Arc<ServerConfig>,
    programs: Arc<dyn ProgramStore>,
    enrollments: Arc<dyn EnrollmentStore>,
    certificates: Arc<dyn CertificateStore>,
    quizzes: Arc<dyn QuizStore>,
    students: Arc<dyn StudentDirectory>,
    codes: Arc<dyn CodeGenerator>,
}

impl AppState {
    /// Production wiring: in-memory stores, thread-local RNG codes, and
    /// the student directory seeded from configuration.
    pub fn new(config: Arc<ServerConfig>) -> anyhow::Result<Self> {
        let directory = MemoryStudentDirectory::new();
        let seed = config.load_students()?;
        if !seed.is_empty() {
            info!(students = seed.len(), "seeding student directory");
        }
        for (id, name) in seed {
            directory.register(StudentId(id), name);
        }

        Ok(Self::with_parts(
            config,
            Arc::new(MemoryProgramStore::new()),
            Arc::new(MemoryEnrollmentStore::new()),
            Arc::new(MemoryCertificateStore::new()),
            Arc::new(MemoryQuizStore::new()),
            Arc::new(directory),
            Arc::new(RandomCodes),
        ))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_parts(
        config: Arc<ServerConfig>,
        programs: Arc<dyn ProgramStore>,
        enrollments: Arc<dyn EnrollmentStore>,
        certificates: Arc<dyn CertificateStore>,
        quizzes: Arc<dyn QuizStore>,
        students: Arc<dyn StudentDirectory>,
        codes: Arc<dyn CodeGenerator>,
    ) -> Self {
        Self {
            config,
            programs,
            enrollments,
            certificates,
            quizzes,
            students,
            codes,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn programs(&self) -> &dyn ProgramStore {
        self.programs.as_ref()
    }

    pub fn enrollments(&self) -> &dyn EnrollmentStore {
        self.enrollments.as_ref()
    }

    pub fn certificates(&self) -> &dyn CertificateStore {
        self.certificates.as_ref()
    }

    pub fn quizzes(&self) -> &dyn QuizStore {
        self.quizzes.as_ref()
    }

    pub fn students(&self) -> &dyn StudentDirectory {
        self.students.as_ref()
    }

    pub fn codes(&self) -> &dyn CodeGenerator {
        self.codes.as_ref()
    }
}
