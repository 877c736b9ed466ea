//! Identifier and code generation.
//!
//! Program codes and certificate ids come from an injected
//! [`CodeGenerator`] so tests can supply deterministic values. Uniqueness
//! is always enforced at the store level; randomness only makes
//! collisions unlikely, never impossible.

use rand::Rng;

use crate::model::ProgramType;

pub const CERTIFICATE_PREFIX: &str = "CERT";
const CERTIFICATE_SUFFIX_LEN: usize = 8;
const HEX_ALPHABET: &[u8] = b"0123456789ABCDEF";

/// Source of human-facing codes. Object-safe so [`crate::state::AppState`]
/// can carry it as a trait object.
pub trait CodeGenerator: Send + Sync {
    /// Program code, e.g. `FC-83712`: type-dependent prefix plus a
    /// five-digit numeric suffix.
    fn program_code(&self, program_type: ProgramType) -> String;

    /// Verifiable certificate code, e.g. `CERT-4F21A9C0`.
    fn certificate_id(&self) -> String;
}

/// Production generator backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodes;

impl CodeGenerator for RandomCodes {
    fn program_code(&self, program_type: ProgramType) -> String {
        let suffix: u32 = rand::thread_rng().gen_range(10_000..100_000);
        format!("{}-{}", program_type.code_prefix(), suffix)
    }

    fn certificate_id(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut out = String::with_capacity(CERTIFICATE_PREFIX.len() + 1 + CERTIFICATE_SUFFIX_LEN);
        out.push_str(CERTIFICATE_PREFIX);
        out.push('-');
        for _ in 0..CERTIFICATE_SUFFIX_LEN {
            let idx = rng.gen_range(0..HEX_ALPHABET.len());
            out.push(HEX_ALPHABET[idx] as char);
        }
        out
    }
}

/// Opaque document id for newly created records.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
