//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Validation errors ─────────────────────────────────────────────────────────

/// Arguments rejected before any I/O happens. Never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("empty remote path for {operation}")]
    EmptyRemotePath { operation: &'static str },

    #[error("empty local path for {operation}")]
    EmptyLocalPath { operation: &'static str },

    #[error("internal error: empty file to upload to {dest:?}")]
    EmptyContent { dest: String },
}

// ── Temp path errors ──────────────────────────────────────────────────────────

/// Errors while allocating a temporary remote path.
#[derive(Debug, Error)]
pub enum TempPathError {
    #[error("can not use empty prefix or extension")]
    EmptyPrefixOrExtension,

    #[error("could not read random bytes: {0}")]
    Random(#[from] rand::Error),
}

// ── Action errors ─────────────────────────────────────────────────────────────

/// Errors produced while evaluating an action tree.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("command `{command}` failed with exit code {code:?}: {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("upload to {dest:?} failed: {reason}")]
    UploadFailed { dest: String, reason: String },

    #[error("run cancelled")]
    Cancelled,
}

// ── Cleanup errors ────────────────────────────────────────────────────────────

/// Aggregated failures from a step that keeps going after individual errors.
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("{} of {total} steps failed:\n{}", failures.len(), failures.join("\n"))]
    Incomplete {
        total: usize,
        failures: Vec<String>,
    },
}
