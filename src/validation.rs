//! Publish-readiness rules.
//!
//! [`evaluate`] is the single gate for both the server-side publish
//! transition and readiness previews. It is pure and never
//! short-circuits: every rule runs and every failure is collected, so
//! both call sites see identical results for the same program snapshot.

use serde::{Deserialize, Serialize};

use crate::model::{Program, ProgramType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ready: bool,
    pub failures: Vec<String>,
}

pub fn evaluate(program: &Program) -> ValidationReport {
    let mut failures = Vec::new();

    check_required_fields(program, &mut failures);
    check_price(program, &mut failures);
    check_module_content(program, &mut failures);
    check_certificate_template(program, &mut failures);

    ValidationReport {
        ready: failures.is_empty(),
        failures,
    }
}

fn check_required_fields(program: &Program, failures: &mut Vec<String>) {
    if program.title.trim().is_empty() {
        failures.push("Program title is required".to_string());
    }
    if program.description.trim().is_empty() {
        failures.push("Description is required".to_string());
    }
    if program.level.trim().is_empty() {
        failures.push("Difficulty level is required".to_string());
    }
    if program.duration.trim().is_empty() {
        failures.push("Duration is required".to_string());
    }
}

fn check_price(program: &Program, failures: &mut Vec<String>) {
    match program.program_type {
        ProgramType::Free => {
            if program.price > 0 {
                failures.push("Free programs must have price = 0".to_string());
            }
        }
        ProgramType::Certification | ProgramType::Professional | ProgramType::Internship => {
            if program.price == 0 {
                failures.push("Price > 0 is required for paid programs".to_string());
            }
        }
    }
}

fn check_module_content(program: &Program, failures: &mut Vec<String>) {
    match program.program_type {
        // Internships carry no video curriculum; module rules are waived
        // entirely, including the module-count rule.
        ProgramType::Internship => {}
        ProgramType::Free | ProgramType::Certification | ProgramType::Professional => {
            if program.modules.is_empty() {
                failures.push("At least one module is required".to_string());
                return;
            }
            for (idx, module) in program.modules.iter().enumerate() {
                let position = idx + 1;
                if module.content.is_empty() {
                    failures.push(format!("Module {} ({}) is empty", position, module.title));
                } else if !module.content.iter().any(|item| item.is_video()) {
                    failures.push(format!(
                        "Module {} must contain at least one video",
                        position
                    ));
                }
            }
        }
    }
}

fn check_certificate_template(program: &Program, failures: &mut Vec<String>) {
    match program.program_type {
        ProgramType::Certification => {
            let missing = program
                .certificate_template
                .as_deref()
                .map(|template| template.trim().is_empty())
                .unwrap_or(true);
            if missing {
                failures
                    .push("Certification programs must have a certificate background image".into());
            }
        }
        ProgramType::Free | ProgramType::Professional | ProgramType::Internship => {}
    }
}
