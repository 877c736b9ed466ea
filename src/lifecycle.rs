//! Program lifecycle: draft → published → archived transitions.
//!
//! Publishing is gated on [`crate::validation::evaluate`]; nothing in
//! this module lets a caller force an invalid program live. Transitions
//! and patch merges run inside the program store's atomic update, so the
//! gate always sees the resulting document, never a stale snapshot.

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{CoreError, CoreResult, Resource};
use crate::ids::{CodeGenerator, new_document_id};
use crate::model::{Module, Program, ProgramId, ProgramStatus, ProgramType};
use crate::store::ProgramStore;
use crate::validation::{self, ValidationReport};

const CODE_RETRY_LIMIT: usize = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramDraft {
    pub title: String,
    pub description: String,
    pub program_type: ProgramType,
    pub level: String,
    pub duration: String,
    #[serde(default)]
    pub price: u32,
    #[serde(default)]
    pub banner_image: Option<String>,
    #[serde(default)]
    pub certificate_template: Option<String>,
    #[serde(default)]
    pub modules: Vec<Module>,
    /// Requested initial status; `draft` when omitted. Requesting
    /// `published` runs the publish gate before anything is persisted.
    #[serde(default)]
    pub status: Option<ProgramStatus>,
}

/// Partial update. `None` leaves the field untouched; a status change
/// goes through the same transition rules as the dedicated endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub program_type: Option<ProgramType>,
    pub level: Option<String>,
    pub duration: Option<String>,
    pub price: Option<u32>,
    pub banner_image: Option<String>,
    pub certificate_template: Option<String>,
    pub modules: Option<Vec<Module>>,
    pub status: Option<ProgramStatus>,
}

impl ProgramPatch {
    fn apply_fields(&self, program: &mut Program) {
        if let Some(title) = &self.title {
            program.title = title.clone();
        }
        if let Some(description) = &self.description {
            program.description = description.clone();
        }
        if let Some(program_type) = self.program_type {
            program.program_type = program_type;
        }
        if let Some(level) = &self.level {
            program.level = level.clone();
        }
        if let Some(duration) = &self.duration {
            program.duration = duration.clone();
        }
        if let Some(price) = self.price {
            program.price = price;
        }
        if let Some(banner) = &self.banner_image {
            program.banner_image = Some(banner.clone());
        }
        if let Some(template) = &self.certificate_template {
            program.certificate_template = Some(template.clone());
        }
        if let Some(modules) = &self.modules {
            program.modules = modules.clone();
        }
    }
}

pub struct ProgramLifecycle<'a> {
    programs: &'a dyn ProgramStore,
    codes: &'a dyn CodeGenerator,
}

impl<'a> ProgramLifecycle<'a> {
    pub fn new(programs: &'a dyn ProgramStore, codes: &'a dyn CodeGenerator) -> Self {
        Self { programs, codes }
    }

    pub fn create(&self, draft: ProgramDraft) -> CoreResult<Program> {
        let initial_status = match draft.status.unwrap_or(ProgramStatus::Draft) {
            ProgramStatus::Archived => {
                return Err(CoreError::conflict(
                    "programs cannot be created as archived",
                ));
            }
            status => status,
        };

        // Program codes are random; uniqueness is the store's call, so a
        // collision just means another roll.
        let mut attempts = 0;
        loop {
            let program = Program {
                id: ProgramId(new_document_id()),
                program_code: self.codes.program_code(draft.program_type),
                title: draft.title.clone(),
                description: draft.description.clone(),
                program_type: draft.program_type,
                level: draft.level.clone(),
                duration: draft.duration.clone(),
                price: draft.price,
                status: ProgramStatus::Draft,
                banner_image: draft.banner_image.clone(),
                certificate_template: draft.certificate_template.clone(),
                modules: draft.modules.clone(),
                created_at: chrono::Utc::now(),
            };

            if initial_status == ProgramStatus::Published {
                let report = validation::evaluate(&program);
                if !report.ready {
                    return Err(CoreError::Validation {
                        failures: report.failures,
                    });
                }
            }

            let mut candidate = program;
            candidate.status = initial_status;

            match self.programs.insert(candidate) {
                Ok(created) => {
                    info!(
                        program_id = %created.id,
                        program_code = %created.program_code,
                        status = %created.status,
                        "program created"
                    );
                    return Ok(created);
                }
                Err(crate::error::StoreError::DuplicateKey(key)) if attempts < CODE_RETRY_LIMIT => {
                    attempts += 1;
                    warn!(key = %key, attempt = attempts, "program code collision, regenerating");
                }
                Err(err) => return Err(CoreError::from_store(err)),
            }
        }
    }

    /// Applies `patch` to the current document; when the patch requests
    /// `published` the gate validates the merged result, never the
    /// pre-patch snapshot.
    pub fn update(&self, id: &ProgramId, patch: ProgramPatch) -> CoreResult<Program> {
        let updated = self.programs.update_with(id, &mut |program| {
            if program.status == ProgramStatus::Archived {
                return Err(CoreError::conflict("archived programs cannot be edited"));
            }

            patch.apply_fields(program);

            match patch.status {
                None => Ok(()),
                Some(target) if target == program.status => Ok(()),
                Some(target) => {
                    check_transition(program.status, target)?;
                    if target == ProgramStatus::Published {
                        let report = validation::evaluate(program);
                        if !report.ready {
                            return Err(CoreError::Validation {
                                failures: report.failures,
                            });
                        }
                    }
                    program.status = target;
                    Ok(())
                }
            }
        })?;

        info!(program_id = %id, status = %updated.status, "program updated");
        Ok(updated)
    }

    pub fn request_publish(&self, id: &ProgramId) -> CoreResult<Program> {
        let published = self.programs.update_with(id, &mut |program| {
            check_transition(program.status, ProgramStatus::Published)?;
            let report = validation::evaluate(program);
            if !report.ready {
                return Err(CoreError::Validation {
                    failures: report.failures,
                });
            }
            program.status = ProgramStatus::Published;
            Ok(())
        })?;

        info!(program_id = %id, "program published");
        Ok(published)
    }

    /// Unconditional: lets an admin edit a live program without deleting
    /// it.
    pub fn request_unpublish(&self, id: &ProgramId) -> CoreResult<Program> {
        let reverted = self.programs.update_with(id, &mut |program| {
            check_transition(program.status, ProgramStatus::Draft)?;
            program.status = ProgramStatus::Draft;
            Ok(())
        })?;

        info!(program_id = %id, "program unpublished");
        Ok(reverted)
    }

    pub fn archive(&self, id: &ProgramId) -> CoreResult<Program> {
        let archived = self.programs.update_with(id, &mut |program| {
            check_transition(program.status, ProgramStatus::Archived)?;
            program.status = ProgramStatus::Archived;
            Ok(())
        })?;

        info!(program_id = %id, "program archived");
        Ok(archived)
    }

    /// Deletion carries no enrollment-count guard; existing enrollments
    /// keep their progress records and dangle.
    pub fn delete(&self, id: &ProgramId) -> CoreResult<()> {
        let removed = self
            .programs
            .delete(id)
            .map_err(CoreError::from_store)?;
        if !removed {
            return Err(CoreError::not_found(Resource::Program, id.as_str()));
        }
        info!(program_id = %id, "program deleted");
        Ok(())
    }

    /// Readiness preview for the authoring UI; same rules as the gate.
    pub fn readiness(&self, id: &ProgramId) -> CoreResult<ValidationReport> {
        let program = self
            .programs
            .get(id)
            .map_err(CoreError::from_store)?
            .ok_or_else(|| CoreError::not_found(Resource::Program, id.as_str()))?;
        Ok(validation::evaluate(&program))
    }
}

fn check_transition(from: ProgramStatus, to: ProgramStatus) -> CoreResult<()> {
    use ProgramStatus::*;
    match (from, to) {
        (Draft, Published) | (Published, Draft) | (Draft, Archived) | (Published, Archived) => {
            Ok(())
        }
        (from, to) => Err(CoreError::InvalidTransition { from, to }),
    }
}
