use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ProgramId(pub String);

impl ProgramId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProgramId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl StudentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct QuizId(pub String);

impl QuizId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QuizId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct EnrollmentId(pub String);

impl EnrollmentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProgramType {
    Free,
    Certification,
    Professional,
    Internship,
}

impl ProgramType {
    /// Human-facing program-code prefix, e.g. `FC-83712`.
    pub fn code_prefix(&self) -> &'static str {
        match self {
            ProgramType::Free => "FC",
            ProgramType::Certification => "CP",
            ProgramType::Professional => "PMC",
            ProgramType::Internship => "IP",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProgramStatus {
    Draft,
    Published,
    Archived,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentItem {
    Video {
        title: String,
        /// Media reference; doubles as the identifier reported by
        /// video-complete calls.
        url: String,
        duration: String,
    },
    Quiz {
        title: String,
        quiz_id: QuizId,
    },
}

impl ContentItem {
    pub fn is_video(&self) -> bool {
        matches!(self, ContentItem::Video { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub content: Vec<ContentItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub program_code: String,
    pub title: String,
    pub description: String,
    pub program_type: ProgramType,
    pub level: String,
    pub duration: String,
    #[serde(default)]
    pub price: u32,
    pub status: ProgramStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_template: Option<String>,
    #[serde(default)]
    pub modules: Vec<Module>,
    pub created_at: DateTime<Utc>,
}

/// Per-kind content counts across every module of a program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentTotals {
    pub videos: usize,
    pub quizzes: usize,
}

impl ContentTotals {
    pub fn total(&self) -> usize {
        self.videos + self.quizzes
    }
}

impl Program {
    pub fn content_totals(&self) -> ContentTotals {
        let mut totals = ContentTotals::default();
        for module in &self.modules {
            for item in &module.content {
                match item {
                    ContentItem::Video { .. } => totals.videos += 1,
                    ContentItem::Quiz { .. } => totals.quizzes += 1,
                }
            }
        }
        totals
    }

    /// Identifiers of every video item across all modules.
    pub fn video_ids(&self) -> BTreeSet<&str> {
        self.modules
            .iter()
            .flat_map(|module| module.content.iter())
            .filter_map(|item| match item {
                ContentItem::Video { url, .. } => Some(url.as_str()),
                ContentItem::Quiz { .. } => None,
            })
            .collect()
    }

    /// Quizzes referenced by this program's content.
    pub fn quiz_ids(&self) -> BTreeSet<&QuizId> {
        self.modules
            .iter()
            .flat_map(|module| module.content.iter())
            .filter_map(|item| match item {
                ContentItem::Quiz { quiz_id, .. } => Some(quiz_id),
                ContentItem::Video { .. } => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default = "default_points")]
    pub points: u32,
}

fn default_points() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
    #[serde(default = "default_passing_score")]
    pub passing_score: u32,
    #[serde(default = "default_time_limit")]
    pub time_limit_minutes: u32,
    pub created_at: DateTime<Utc>,
}

fn default_passing_score() -> u32 {
    70
}

fn default_time_limit() -> u32 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub quiz_id: QuizId,
    pub score: u32,
    pub passed: bool,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Progress {
    /// Grows monotonically; re-completing a video is a no-op.
    #[serde(default)]
    pub completed_videos: BTreeSet<String>,
    /// Full attempt history, never overwritten.
    #[serde(default)]
    pub quiz_attempts: Vec<QuizAttempt>,
}

impl Progress {
    /// Distinct quizzes with at least one passing attempt.
    pub fn passed_quiz_ids(&self) -> BTreeSet<&QuizId> {
        self.quiz_attempts
            .iter()
            .filter(|attempt| attempt.passed)
            .map(|attempt| &attempt.quiz_id)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub program_id: ProgramId,
    pub enrolled_at: DateTime<Utc>,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default)]
    pub completion_percentage: u32,
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub certificate_issued: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub certificate_id: String,
    pub student_id: StudentId,
    pub program_id: ProgramId,
    pub issued_at: DateTime<Utc>,
    pub artifact_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramListResponse {
    pub programs: Vec<Program>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizListResponse {
    pub quizzes: Vec<Quiz>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmitResponse {
    pub score: u32,
    pub passed: bool,
    pub enrollment: Enrollment,
}

/// One row of a student's progress overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentSummary {
    pub program_id: ProgramId,
    pub program_title: String,
    pub level: String,
    pub completion_percentage: u32,
    pub status: EnrollmentStatus,
    pub certificate_issued: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentEnrollmentsResponse {
    pub enrollments: Vec<EnrollmentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateListResponse {
    pub certificates: Vec<Certificate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateVerification {
    pub valid: bool,
    pub student_name: String,
    pub program_title: String,
    pub issue_date: DateTime<Utc>,
    pub artifact_url: String,
}
