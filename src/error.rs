// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Bitsmith Error Types with Error Codes
//!
//! Error code ranges:
//! - BITS-000-009: Field resolution errors
//! - BITS-010-019: Validation errors
//! - BITS-020-029: Finalization errors
//! - BITS-030-039: Payload errors
//! - BITS-040-049: Host/config errors
//! - BITS-090-099: IO/parse errors

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BitsError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for fancy terminal error display.
#[derive(Error, Debug, Diagnostic)]
pub enum BitsError {
    // ═══════════════════════════════════════════
    // FIELD RESOLUTION ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[BITS-001] {kind} does not contain or has no rules to generate field '{field}'")]
    #[diagnostic(
        code(bits::field_undefined),
        help("Supply the field with -u FIELD VALUE or use a kind that renders it")
    )]
    FieldUndefined { field: String, kind: String },

    #[error("[BITS-002] Could not render field '{field}': {source}")]
    #[diagnostic(code(bits::field_render))]
    FieldRender {
        field: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("[BITS-003] Field resolution re-entered itself: {cycle}")]
    #[diagnostic(
        code(bits::resolution_cycle),
        help("A renderer must not read the field it is computing")
    )]
    ResolutionCycle { cycle: String },

    // ═══════════════════════════════════════════
    // VALIDATION ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[BITS-010] Invalid submission: {details}")]
    #[diagnostic(code(bits::invalid_submission))]
    InvalidSubmission { fields: Vec<String>, details: String },

    // ═══════════════════════════════════════════
    // FINALIZATION ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[BITS-020] Cyclic dependency among deferred fields: {cycle}")]
    #[diagnostic(code(bits::cyclic_dependency))]
    CyclicDependency { fields: Vec<String>, cycle: String },

    #[error("[BITS-021] Finalization of field '{field}' failed: {source}")]
    #[diagnostic(code(bits::finalization))]
    Finalization {
        field: String,
        #[source]
        source: anyhow::Error,
    },

    // ═══════════════════════════════════════════
    // PAYLOAD ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[BITS-030] Cannot read file for field '{field}' at {}: {source}", .path.display())]
    #[diagnostic(code(bits::payload_file))]
    PayloadFile {
        field: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ═══════════════════════════════════════════
    // HOST/CONFIG ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[BITS-040] Unknown submission kind '{name}'")]
    #[diagnostic(code(bits::unknown_kind), help("Run 'bitsmith fields' to list kinds"))]
    UnknownKind { name: String },

    #[error("[BITS-041] Configuration error: {reason}")]
    #[diagnostic(code(bits::config_error))]
    ConfigError { reason: String },

    // ═══════════════════════════════════════════
    // IO/PARSE ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[BITS-090] IO error: {0}")]
    #[diagnostic(code(bits::io_error))]
    Io(#[from] std::io::Error),

    #[error("[BITS-091] YAML parse error: {0}")]
    #[diagnostic(code(bits::yaml_error))]
    Yaml(#[from] serde_yaml::Error),

    #[error("[BITS-092] JSON error: {0}")]
    #[diagnostic(code(bits::json_error))]
    Json(#[from] serde_json::Error),
}

impl BitsError {
    /// Stable error code, e.g. `BITS-001`
    pub fn code(&self) -> &'static str {
        match self {
            Self::FieldUndefined { .. } => "BITS-001",
            Self::FieldRender { .. } => "BITS-002",
            Self::ResolutionCycle { .. } => "BITS-003",
            Self::InvalidSubmission { .. } => "BITS-010",
            Self::CyclicDependency { .. } => "BITS-020",
            Self::Finalization { .. } => "BITS-021",
            Self::PayloadFile { .. } => "BITS-030",
            Self::UnknownKind { .. } => "BITS-040",
            Self::ConfigError { .. } => "BITS-041",
            Self::Io(_) => "BITS-090",
            Self::Yaml(_) => "BITS-091",
            Self::Json(_) => "BITS-092",
        }
    }

    /// Whether retrying the same operation may succeed.
    ///
    /// Failed renders are never cached and finalizations that failed were
    /// never committed, so both can be attempted again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FieldRender { .. } | Self::Finalization { .. } | Self::Io(_)
        )
    }

    /// Field the error is about, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::FieldUndefined { field, .. }
            | Self::FieldRender { field, .. }
            | Self::Finalization { field, .. }
            | Self::PayloadFile { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl FixSuggestion for BitsError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BitsError::FieldUndefined { .. } => {
                Some("Supply the field with -u FIELD VALUE or pick a more specific kind with -c")
            }
            BitsError::FieldRender { .. } => Some("Fix the cause above and run again"),
            BitsError::ResolutionCycle { .. } => {
                Some("Break the loop by supplying one of the fields explicitly")
            }
            BitsError::InvalidSubmission { .. } => {
                Some("Supply the listed fields with -u FIELD VALUE")
            }
            BitsError::CyclicDependency { .. } => {
                Some("Deferred fields must not read each other in a loop")
            }
            BitsError::Finalization { .. } => {
                Some("Earlier fields stay finalized; run again to retry the rest")
            }
            BitsError::PayloadFile { .. } => Some("Check file path and permissions"),
            BitsError::UnknownKind { .. } => Some("Use one of: base, video, tv, movie"),
            BitsError::ConfigError { .. } => Some("Check ~/.config/bitsmith/config.toml syntax"),
            BitsError::Io(_) => Some("Check file path and permissions"),
            BitsError::Yaml(_) => Some("Check YAML syntax: indentation and quoting"),
            BitsError::Json(_) => None,
        }
    }
}
