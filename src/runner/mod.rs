//! Tour execution
//!
//! The [`StepRunner`] takes a [`crate::tour::TourRegistry`] and a
//! [`crate::surface::UiSurface`] and runs one tour at a time, fail-fast,
//! producing a [`RunReport`] that lists every attempted step.

mod cancel;
mod report;
mod step_runner;

pub use cancel::{CancelHandle, CancelToken};
pub use report::{RunReport, RunState, StepOutcome};
pub use step_runner::{RunnerConfig, StepRunner};
