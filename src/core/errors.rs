/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::id::UnitId;
use crate::security::types::Permission;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export AccessDenied from security module
pub use crate::security::types::AccessDenied;

/// Result of running a code unit or a host operation on its behalf
///
/// # Must Use
/// A denied operation must reach the host; dropping this value discards the signal
pub type ExecResult<T> = Result<T, ExecError>;

/// Result of compiling source text into a code unit
pub type CompileResult<T> = Result<T, CompileError>;

/// Result of loading configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failure of a code unit invocation
///
/// `AccessDenied` is kept distinct from every other variant so hosts can test
/// confinement outcomes deterministically.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ExecError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    AccessDenied(#[from] AccessDenied),

    #[error("{unit} failed: {message}")]
    #[diagnostic(
        code(exec::fault),
        help("The unit raised an ordinary runtime failure; it was not a confinement decision.")
    )]
    Fault { unit: String, message: String },

    #[error("Type mismatch: expected {expected}, found {found}")]
    #[diagnostic(code(exec::type_mismatch))]
    TypeMismatch { expected: String, found: String },

    #[error("No linked unit named '{0}'")]
    #[diagnostic(
        code(exec::unknown_unit),
        help("Publish the unit with Sandbox::link before calling it by name.")
    )]
    UnknownUnit(String),

    #[error("Unknown type '{0}'")]
    #[diagnostic(code(exec::unknown_type))]
    UnknownType(String),

    #[error("Type '{ty}' declares no field '{field}'")]
    #[diagnostic(code(exec::no_such_field))]
    NoSuchField { ty: String, field: String },

    #[error("Call depth limit of {0} exceeded")]
    #[diagnostic(
        code(exec::depth_exceeded),
        help("A unit is recursing without bound. Raise CONFINE_MAX_CALL_DEPTH only if the nesting is intentional.")
    )]
    DepthExceeded(usize),

    #[error("IO error: {0}")]
    #[diagnostic(code(exec::io))]
    Io(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),
}

impl ExecError {
    /// Construct a runtime fault attributed to a unit
    pub fn fault(unit: impl Into<String>, message: impl Into<String>) -> Self {
        ExecError::Fault {
            unit: unit.into(),
            message: message.into(),
        }
    }

    /// True when this failure is a confinement decision
    #[inline]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, ExecError::AccessDenied(_))
    }

    /// The category that was denied, if this is a denial
    #[inline]
    pub fn denied_permission(&self) -> Option<Permission> {
        match self {
            ExecError::AccessDenied(denied) => Some(denied.permission),
            _ => None,
        }
    }

    /// The unit whose grant excluded the operation, if this is a denial
    #[inline]
    pub fn denied_by(&self) -> Option<UnitId> {
        match self {
            ExecError::AccessDenied(denied) => Some(denied.unit),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ExecError {
    fn from(err: std::io::Error) -> Self {
        ExecError::Io(err.to_string())
    }
}

/// Syntax or semantic error raised by the compilation boundary
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[error("Compile error at {line}:{col}: {message}")]
#[diagnostic(
    code(compile::error),
    help("Fix the source text; nothing was registered or executed.")
)]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl CompileError {
    pub fn new(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    #[diagnostic(code(config::invalid))]
    Invalid { key: String, reason: String },

    #[error("Invalid capability grant '{0}'")]
    #[diagnostic(
        code(config::invalid_grant),
        help("Use 'all', 'none' or a comma-separated list such as 'read_property,read_file'.")
    )]
    InvalidGrant(String),
}

/// Top-level error for embedding hosts and the `confine` binary
#[derive(Error, Debug, Diagnostic)]
pub enum ConfineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    #[diagnostic(code(confine::io))]
    Io(#[from] std::io::Error),

    #[error("Usage: {0}")]
    #[diagnostic(code(confine::usage))]
    Usage(String),
}

impl ConfineError {
    /// True when the underlying failure is a confinement decision
    pub fn is_access_denied(&self) -> bool {
        matches!(self, ConfineError::Exec(e) if e.is_access_denied())
    }
}
