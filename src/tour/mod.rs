//! Tours: ordered, selector-driven UI walkthrough scripts
//!
//! A tour is built once, registered into a [`TourRegistry`] under its
//! unique name and never mutated afterwards.

pub mod builtin;
mod definition;
mod model;
mod registry;

pub use definition::{load_dir, load_file, StandardStep, StepDefinition, TourDefinition};
pub use model::{Action, Step, Tour, TourOptions, WaitPosition};
pub use registry::TourRegistry;
