//! Step runner implementation
//!
//! Executes a registered tour one step at a time: wait until the trigger
//! resolves to exactly one element, apply the action, let the surface
//! settle, move on. The first failing step aborts the run.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use super::cancel::CancelToken;
use super::report::{RunReport, RunState};
use crate::common::config::Config;
use crate::common::{RunError, StepFailure};
use crate::surface::{ElementId, SurfaceError, UiSurface};
use crate::tour::{Action, Step, TourRegistry};

/// Polling and settling behaviour of the runner
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
    /// Pause after every applied action
    pub settle: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(1),
            multiplier: 2.0,
            settle: Duration::ZERO,
        }
    }
}

impl From<&Config> for RunnerConfig {
    fn from(config: &Config) -> Self {
        Self {
            initial_backoff: Duration::from_millis(config.polling.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.polling.max_backoff_ms),
            multiplier: config.polling.multiplier,
            settle: Duration::from_millis(config.polling.settle_ms),
        }
    }
}

/// Exponential delay between trigger lookups
#[derive(Debug)]
struct Backoff {
    current: Duration,
    max: Duration,
    multiplier: f64,
}

/// Smallest delay between lookups, whatever the configuration says
const MIN_BACKOFF: Duration = Duration::from_millis(1);

impl Backoff {
    fn new(config: &RunnerConfig) -> Self {
        let initial = config.initial_backoff.max(MIN_BACKOFF);
        let multiplier = if config.multiplier.is_nan() {
            1.0
        } else {
            config.multiplier.max(1.0)
        };
        Self {
            current: initial,
            max: config.max_backoff.max(initial),
            multiplier,
        }
    }

    /// Current delay; the next one grows by the multiplier, saturating at the cap
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = Duration::try_from_secs_f64(self.current.as_secs_f64() * self.multiplier)
            .map_or(self.max, |d| d.min(self.max));
        delay
    }
}

/// Runs registered tours against a UI surface
///
/// The runner does not serialise concurrent `run` calls; callers must not
/// run two tours against the same surface at once.
pub struct StepRunner {
    registry: Arc<TourRegistry>,
    surface: Arc<dyn UiSurface>,
    config: RunnerConfig,
    state: watch::Sender<RunState>,
}

impl StepRunner {
    pub fn new(
        registry: Arc<TourRegistry>,
        surface: Arc<dyn UiSurface>,
        config: RunnerConfig,
    ) -> Self {
        let (state, _) = watch::channel(RunState::NotStarted);
        Self {
            registry,
            surface,
            config,
            state,
        }
    }

    pub fn registry(&self) -> &TourRegistry {
        &self.registry
    }

    /// Observe state transitions of the current run
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Run a tour to completion or to its first failing step
    pub async fn run(&self, name: &str, timeout_per_step: Duration) -> Result<RunReport, RunError> {
        self.run_with_cancel(name, timeout_per_step, CancelToken::never())
            .await
    }

    /// Like [`StepRunner::run`], stopping early when `cancel` fires
    #[tracing::instrument(skip(self, cancel), fields(timeout_ms = timeout_per_step.as_millis() as u64))]
    pub async fn run_with_cancel(
        &self,
        name: &str,
        timeout_per_step: Duration,
        mut cancel: CancelToken,
    ) -> Result<RunReport, RunError> {
        let tour = self
            .registry
            .get(name)
            .ok_or_else(|| RunError::UnknownTour(name.to_string()))?;

        let started = Instant::now();
        let mut report = RunReport::new(tour.name());
        self.transition(&mut report, RunState::NotStarted);

        tracing::info!(
            tour = tour.name(),
            steps = tour.steps().len(),
            url = %tour.options().start_url,
            test_mode = tour.options().is_test_mode,
            "Starting tour"
        );

        if let Err(e) = self.surface.prepare(tour.options()).await {
            let failure = StepFailure::ActionFailure {
                step_index: 0,
                reason: e.to_string(),
            };
            let selector = &tour.steps()[0].trigger_selector;
            report.record_failure(0, selector, Duration::ZERO, &failure);
            return Err(self.abort(report, failure, started));
        }

        for (index, step) in tour.steps().iter().enumerate() {
            self.transition(&mut report, RunState::Running(index));
            let step_started = Instant::now();

            match self
                .execute_step(index, step, timeout_per_step, &mut cancel)
                .await
            {
                Ok(()) => {
                    let elapsed = step_started.elapsed();
                    tracing::debug!(
                        step = index,
                        selector = %step.trigger_selector,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Step completed"
                    );
                    report.record_success(index, &step.trigger_selector, elapsed);
                }
                Err(failure) => {
                    report.record_failure(
                        index,
                        &step.trigger_selector,
                        step_started.elapsed(),
                        &failure,
                    );
                    return Err(self.abort(report, failure, started));
                }
            }
        }

        report.elapsed = started.elapsed();
        self.transition(&mut report, RunState::Completed);
        tracing::info!(
            tour = tour.name(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Tour completed"
        );
        Ok(report)
    }

    fn transition(&self, report: &mut RunReport, state: RunState) {
        report.state = state.clone();
        self.state.send_replace(state);
    }

    fn abort(&self, mut report: RunReport, failure: StepFailure, started: Instant) -> RunError {
        tracing::warn!(tour = %report.tour, error = %failure, "Tour aborted");
        report.elapsed = started.elapsed();
        self.transition(&mut report, RunState::Aborted(failure.clone()));
        RunError::Aborted {
            failure,
            report: Box::new(report),
        }
    }

    /// Resolve the trigger and apply the action within one step's budget
    ///
    /// A stale element sends the step back to polling; only the remaining
    /// budget is available for it to reappear.
    async fn execute_step(
        &self,
        index: usize,
        step: &Step,
        timeout: Duration,
        cancel: &mut CancelToken,
    ) -> Result<(), StepFailure> {
        let deadline = Instant::now() + timeout;
        let mut backoff = Backoff::new(&self.config);

        loop {
            let element = self
                .wait_for_trigger(index, step, deadline, &mut backoff, cancel)
                .await?;

            match self.apply(element, &step.action).await {
                Ok(()) => {
                    self.settle().await;
                    return Ok(());
                }
                Err(SurfaceError::Detached(element)) => {
                    tracing::warn!(
                        step = index,
                        selector = %step.trigger_selector,
                        %element,
                        "Trigger element went stale, polling again"
                    );
                    self.pause(index, step, deadline, &mut backoff, cancel)
                        .await?;
                }
                Err(SurfaceError::Rejected(reason)) => {
                    return Err(StepFailure::ActionFailure {
                        step_index: index,
                        reason,
                    });
                }
            }
        }
    }

    async fn wait_for_trigger(
        &self,
        index: usize,
        step: &Step,
        deadline: Instant,
        backoff: &mut Backoff,
        cancel: &mut CancelToken,
    ) -> Result<ElementId, StepFailure> {
        let mut attempts = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(StepFailure::Cancelled { step_index: index });
            }

            attempts += 1;
            let matches = self.surface.find_all(&step.trigger_selector).await;
            if let [element] = matches.as_slice() {
                return Ok(*element);
            }

            tracing::debug!(
                step = index,
                selector = %step.trigger_selector,
                matches = matches.len(),
                attempts,
                "Trigger not resolved yet"
            );

            self.pause(index, step, deadline, backoff, cancel).await?;
        }
    }

    /// Sleep for the next backoff delay, bounded by the step deadline
    async fn pause(
        &self,
        index: usize,
        step: &Step,
        deadline: Instant,
        backoff: &mut Backoff,
        cancel: &mut CancelToken,
    ) -> Result<(), StepFailure> {
        let now = Instant::now();
        if now >= deadline {
            return Err(StepFailure::StepTimeout {
                step_index: index,
                selector: step.trigger_selector.clone(),
            });
        }

        let delay = backoff.next_delay().min(deadline - now);
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = cancel.cancelled() => Err(StepFailure::Cancelled { step_index: index }),
        }
    }

    async fn apply(&self, element: ElementId, action: &Action) -> Result<(), SurfaceError> {
        match action {
            Action::Click => self.surface.click(element).await,
            Action::EnterText(value) => {
                self.surface.focus(element).await?;
                self.surface.set_text(element, value).await
            }
            Action::NoOp => Ok(()),
        }
    }

    async fn settle(&self) {
        if !self.config.settle.is_zero() {
            tokio::time::sleep(self.config.settle).await;
        }
        self.surface.settle().await;
    }
}
