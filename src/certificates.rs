//! Certificate issuance and public verification.
//!
//! Issuance is idempotent per (student, program): the store's atomic
//! check-then-insert resolves concurrent completions to a single
//! certificate, and an id collision with an unrelated pair is retried
//! with a fresh code.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{CoreError, CoreResult, Resource, StoreError};
use crate::ids::CodeGenerator;
use crate::model::{Certificate, CertificateVerification, ProgramId, StudentId};
use crate::store::{CertificateInsert, CertificateStore, ProgramStore, StudentDirectory};

const ISSUE_RETRY_LIMIT: usize = 4;

pub struct CertificateIssuer<'a> {
    certificates: &'a dyn CertificateStore,
    codes: &'a dyn CodeGenerator,
    config: &'a ServerConfig,
}

impl<'a> CertificateIssuer<'a> {
    pub fn new(
        certificates: &'a dyn CertificateStore,
        codes: &'a dyn CodeGenerator,
        config: &'a ServerConfig,
    ) -> Self {
        Self {
            certificates,
            codes,
            config,
        }
    }

    /// Returns the pair's certificate, minting it on first call. Repeat
    /// and racing calls get the already-issued record unchanged.
    pub fn issue(&self, student: &StudentId, program: &ProgramId) -> CoreResult<Certificate> {
        let mut attempts = 0;
        loop {
            let certificate_id = self.codes.certificate_id();
            let candidate = Certificate {
                certificate_id: certificate_id.clone(),
                student_id: student.clone(),
                program_id: program.clone(),
                issued_at: Utc::now(),
                artifact_url: self.config.certificate_artifact_url(&certificate_id),
            };

            match self.certificates.insert_if_absent(candidate) {
                Ok(CertificateInsert::Created(certificate)) => {
                    info!(
                        certificate_id = %certificate.certificate_id,
                        student_id = %student,
                        program_id = %program,
                        "certificate issued"
                    );
                    return Ok(certificate);
                }
                Ok(CertificateInsert::Existing(certificate)) => {
                    debug!(
                        certificate_id = %certificate.certificate_id,
                        student_id = %student,
                        program_id = %program,
                        "certificate already issued"
                    );
                    return Ok(certificate);
                }
                Err(StoreError::DuplicateKey(key)) if attempts < ISSUE_RETRY_LIMIT => {
                    attempts += 1;
                    warn!(key = %key, attempt = attempts, "certificate id collision, regenerating");
                }
                Err(err) => return Err(CoreError::from_store(err)),
            }
        }
    }
}

/// Public lookup by certificate code. Programs may be deleted after
/// issuance, so missing joins degrade to the raw identifiers rather than
/// invalidating the certificate.
pub fn verify(
    certificates: &dyn CertificateStore,
    programs: &dyn ProgramStore,
    students: &dyn StudentDirectory,
    certificate_id: &str,
) -> CoreResult<CertificateVerification> {
    let certificate = certificates
        .find_by_certificate_id(certificate_id)
        .map_err(CoreError::from_store)?
        .ok_or_else(|| CoreError::not_found(Resource::Certificate, certificate_id))?;

    let student_name = students
        .display_name(&certificate.student_id)
        .map_err(CoreError::from_store)?
        .unwrap_or_else(|| certificate.student_id.as_str().to_string());

    let program_title = programs
        .get(&certificate.program_id)
        .map_err(CoreError::from_store)?
        .map(|program| program.title)
        .unwrap_or_else(|| certificate.program_id.as_str().to_string());

    Ok(CertificateVerification {
        valid: true,
        student_name,
        program_title,
        issue_date: certificate.issued_at,
        artifact_url: certificate.artifact_url,
    })
}
