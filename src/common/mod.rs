//! Common utilities shared by the library and the CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{DuplicateNameError, Error, Result, RunError, StepFailure};
