//! Error types and error code constants for buildmodel.
//!
//! This module provides a unified error type (`BuildModelError`) that the
//! document model, the DSL front end and the extraction engine all convert
//! into before surfacing a failure to a caller.
//!
//! ## Error Code Mapping
//!
//! Exit codes used by the `bmodel` CLI:
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (file not found, entity not found)
//! - `4`: Apply errors (stale entity, conflicting edits, failed write)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

/// Result alias used across the workspace.
pub type Result<T, E = BuildModelError> = std::result::Result<T, E>;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output and CLI exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (file or entity not found).
    ResolutionError = 3,
    /// Apply errors (stale markers, overlapping edits, write failures).
    ApplyError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the document model and the CLI.
#[derive(Debug, Error)]
pub enum BuildModelError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// No entity matches the request.
    #[error("entity not found: {message}")]
    EntityNotFound { message: String },

    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// The source changed since the model was built.
    #[error("stale entity: {message}")]
    StaleEntity { message: String },

    /// Failed to apply a transaction.
    #[error("apply error: {message}")]
    ApplyError { message: String },

    /// A configuration file could not be used.
    #[error("invalid configuration {path}: {message}")]
    Config { path: String, message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&BuildModelError> for OutputErrorCode {
    fn from(err: &BuildModelError) -> Self {
        match err {
            BuildModelError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            BuildModelError::Config { .. } => OutputErrorCode::InvalidArguments,
            BuildModelError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            BuildModelError::EntityNotFound { .. } => OutputErrorCode::ResolutionError,
            BuildModelError::Io { .. } => OutputErrorCode::ApplyError,
            BuildModelError::StaleEntity { .. } => OutputErrorCode::ApplyError,
            BuildModelError::ApplyError { .. } => OutputErrorCode::ApplyError,
            BuildModelError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<BuildModelError> for OutputErrorCode {
    fn from(err: BuildModelError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl BuildModelError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        BuildModelError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        BuildModelError::FileNotFound { path: path.into() }
    }

    /// Create an I/O error for `path`.
    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        BuildModelError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a stale entity error.
    pub fn stale(message: impl Into<String>) -> Self {
        BuildModelError::StaleEntity {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        BuildModelError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod error_code_mapping {
        use super::*;

        #[test]
        fn file_not_found_maps_to_resolution_error() {
            let err = BuildModelError::file_not_found("app/build.gradle");
            assert_eq!(OutputErrorCode::from(&err), OutputErrorCode::ResolutionError);
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn invalid_arguments_maps_to_invalid_arguments() {
            let err = BuildModelError::invalid_args("missing group");
            assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn stale_entity_maps_to_apply_error() {
            let err = BuildModelError::stale("range deleted");
            assert_eq!(err.error_code(), OutputErrorCode::ApplyError);
            assert_eq!(err.error_code().code(), 4);
        }

        #[test]
        fn internal_error_maps_to_internal_error() {
            let err = BuildModelError::internal("unexpected state");
            assert_eq!(err.error_code(), OutputErrorCode::InternalError);
            assert_eq!(err.error_code().code(), 10);
        }

        #[test]
        fn config_error_maps_to_invalid_arguments() {
            let err = BuildModelError::Config {
                path: "buildmodel.toml".to_string(),
                message: "bad".to_string(),
            };
            assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
        }
    }

    mod error_display {
        use super::*;

        #[test]
        fn file_not_found_display() {
            let err = BuildModelError::file_not_found("settings.gradle");
            assert_eq!(err.to_string(), "file not found: settings.gradle");
        }

        #[test]
        fn stale_display() {
            let err = BuildModelError::stale("source changed");
            assert_eq!(err.to_string(), "stale entity: source changed");
        }
    }
}
