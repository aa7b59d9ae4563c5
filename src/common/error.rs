//! Error types for the tour runner
//!
//! Run-time failures always carry the index of the step that aborted the
//! run so a failing tour can be diagnosed from the message alone.

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::runner::RunReport;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tour runner
#[derive(Error, Debug)]
pub enum Error {
    // === Registration Errors ===
    #[error(transparent)]
    DuplicateName(#[from] DuplicateNameError),

    #[error("Invalid tour '{name}': {reason}")]
    InvalidTour { name: String, reason: String },

    #[error("Invalid step action '{0}'. Expected 'click', 'noop' or 'text <value>'")]
    InvalidAction(String),

    // === Run Errors ===
    #[error(transparent)]
    Run(#[from] RunError),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create an invalid tour error
    pub fn invalid_tour(name: &str, reason: &str) -> Self {
        Self::InvalidTour {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a file read error for `path`
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}

/// A tour with the same name is already registered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Tour '{name}' is already registered")]
pub struct DuplicateNameError {
    pub name: String,
}

/// Why a run stopped before its last step
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepFailure {
    #[error("Step {step_index}: trigger '{selector}' did not resolve to a single element in time")]
    StepTimeout { step_index: usize, selector: String },

    #[error("Step {step_index}: action rejected by the UI surface: {reason}")]
    ActionFailure { step_index: usize, reason: String },

    #[error("Step {step_index}: run cancelled")]
    Cancelled { step_index: usize },
}

impl StepFailure {
    /// Index of the step the run aborted at
    pub fn step_index(&self) -> usize {
        match self {
            StepFailure::StepTimeout { step_index, .. }
            | StepFailure::ActionFailure { step_index, .. }
            | StepFailure::Cancelled { step_index } => *step_index,
        }
    }
}

/// Error returned by [`crate::runner::StepRunner::run`]
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Tour '{0}' is not registered. Use 'tour list' to see available tours")]
    UnknownTour(String),

    /// The run stopped at a step; the partial report lists every step attempted
    #[error("Tour '{}' aborted. {failure}", .report.tour)]
    Aborted {
        failure: StepFailure,
        report: Box<RunReport>,
    },
}

impl RunError {
    /// The partial report of an aborted run
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunError::Aborted { report, .. } => Some(report),
            RunError::UnknownTour(_) => None,
        }
    }

    /// The step failure of an aborted run
    pub fn failure(&self) -> Option<&StepFailure> {
        match self {
            RunError::Aborted { failure, .. } => Some(failure),
            RunError::UnknownTour(_) => None,
        }
    }
}
