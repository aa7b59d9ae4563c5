//! Run state and report types

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::common::StepFailure;

/// Lifecycle of a single run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    /// Executing the step at this index
    Running(usize),
    Completed,
    Aborted(StepFailure),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Aborted(_))
    }
}

/// Outcome of one attempted step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub selector: String,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Every step attempted by a run, in order, and how the run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub tour: String,
    pub steps: Vec<StepOutcome>,
    pub state: RunState,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

impl RunReport {
    pub(crate) fn new(tour: &str) -> Self {
        Self {
            tour: tour.to_string(),
            steps: Vec::new(),
            state: RunState::NotStarted,
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn record_success(&mut self, index: usize, selector: &str, elapsed: Duration) {
        self.steps.push(StepOutcome {
            index,
            selector: selector.to_string(),
            elapsed,
            success: true,
            error: None,
        });
    }

    pub(crate) fn record_failure(
        &mut self,
        index: usize,
        selector: &str,
        elapsed: Duration,
        failure: &StepFailure,
    ) {
        self.steps.push(StepOutcome {
            index,
            selector: selector.to_string(),
            elapsed,
            success: false,
            error: Some(failure.to_string()),
        });
    }

    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }

    /// Number of steps that succeeded
    pub fn succeeded(&self) -> usize {
        self.steps.iter().filter(|s| s.success).count()
    }

    /// Index of the step the run aborted at
    pub fn aborted_at(&self) -> Option<usize> {
        match &self.state {
            RunState::Aborted(failure) => Some(failure.step_index()),
            _ => None,
        }
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
