//! Tour Runner - declarative UI walkthroughs for acceptance testing
//!
//! A tour is an ordered list of steps, each a trigger selector plus an
//! action. The runner waits for every trigger on a UI surface, applies the
//! action, and stops at the first step that cannot be completed.

pub mod cli;
pub mod commands;
pub mod common;
pub mod i18n;
pub mod runner;
pub mod surface;
pub mod tour;

// Re-export commonly used types for tests
pub use common::{DuplicateNameError, Error, Result, RunError, StepFailure};
pub use runner::{CancelHandle, RunReport, RunState, RunnerConfig, StepRunner};
pub use surface::{ScriptedSurface, UiSurface};
pub use tour::{Action, Step, Tour, TourOptions, TourRegistry};
