//! End-to-end tests for the tour runner
//!
//! The library tests drive `StepRunner` against a `ScriptedSurface` with
//! tokio's clock paused, so timeouts elapse instantly and deterministically.
//! The CLI tests run the built `tour` binary against the fixtures in
//! `demos/` with an isolated configuration directory.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tour::runner::RunState;
use tour::surface::{ElementId, ElementSpec, RecordedAction, SurfaceError};
use tour::tour::builtin::{self, ResourceFormFixture};
use tour::{
    Action, CancelHandle, RunError, RunnerConfig, ScriptedSurface, Step, StepFailure, StepRunner,
    Tour, TourOptions, TourRegistry, UiSurface,
};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Registry holding `tours`, plus a runner over `surface`
fn runner_for(tours: Vec<Tour>, surface: Arc<ScriptedSurface>) -> StepRunner {
    let mut registry = TourRegistry::new();
    registry.extend(tours).expect("tour names are unique");
    StepRunner::new(Arc::new(registry), surface, RunnerConfig::default())
}

fn create_tour() -> Tour {
    Tour::new(
        "create",
        TourOptions::default(),
        vec![
            Step::new(".menu"),
            Step::new("input[name=workload]").enter_text("100"),
            Step::new(".save"),
        ],
    )
    .unwrap()
}

fn demo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join(relative)
}

fn expect_aborted(result: Result<tour::RunReport, RunError>) -> (StepFailure, tour::RunReport) {
    match result {
        Err(RunError::Aborted { failure, report }) => (failure, *report),
        Err(other) => panic!("expected an aborted run, got {other}"),
        Ok(report) => panic!("expected an aborted run, got {report:?}"),
    }
}

// ============== Runner ==============

#[tokio::test(start_paused = true)]
async fn test_missing_save_button_aborts_at_step_two() {
    let surface = Arc::new(ScriptedSurface::new(vec![
        ElementSpec::new(".menu"),
        ElementSpec::new("input[name=workload]"),
    ]));
    let runner = runner_for(vec![create_tour()], surface.clone());

    let (failure, report) = expect_aborted(runner.run("create", TIMEOUT).await);

    assert_eq!(
        failure,
        StepFailure::StepTimeout {
            step_index: 2,
            selector: ".save".to_string()
        }
    );
    assert_eq!(report.steps.len(), 3);
    assert!(report.steps[0].success);
    assert!(report.steps[1].success);
    assert!(!report.steps[2].success);
    assert_eq!(report.aborted_at(), Some(2));
    assert!(report.steps[2].elapsed >= TIMEOUT);

    assert_eq!(surface.text_of("input[name=workload]").await.as_deref(), Some("100"));
}

#[tokio::test(start_paused = true)]
async fn test_builtin_create_tour_runs_in_order() {
    let surface = Arc::new(ScriptedSurface::load(&demo_path("resource_planning.surface.yaml")).unwrap());
    let fixture = ResourceFormFixture::default();
    let tour = builtin::create_tour(&fixture).unwrap();
    let triggers: Vec<String> = tour
        .steps()
        .iter()
        .map(|s| s.trigger_selector.clone())
        .collect();
    let runner = runner_for(vec![tour], surface.clone());

    let report = runner.run(builtin::CREATE_TOUR, TIMEOUT).await.unwrap();
    assert!(report.is_completed());

    let indexes: Vec<usize> = report.steps.iter().map(|s| s.index).collect();
    assert_eq!(indexes, (0..12).collect::<Vec<_>>());
    // The app tile renders 150ms after the home menu opens
    assert!(report.steps[1].elapsed >= Duration::from_millis(150));

    // Clicks and text entries land in step order; focus is part of text entry
    let acted: Vec<String> = surface
        .actions()
        .await
        .into_iter()
        .filter(|a| !matches!(a, RecordedAction::Focus { .. }))
        .map(|a| a.selector().to_string())
        .collect();
    assert_eq!(acted, triggers);

    assert_eq!(
        surface.text_of("input[name=\"start_date\"]").await.as_deref(),
        Some("2020-04-05 13:42:07")
    );
    let prepared = surface.prepared().await.unwrap();
    assert!(prepared.is_test_mode);
    assert_eq!(prepared.start_url, "/web");
}

#[tokio::test(start_paused = true)]
async fn test_builtin_navigation_tour_completes() {
    let surface = Arc::new(ScriptedSurface::load(&demo_path("resource_planning.surface.yaml")).unwrap());
    let tour = builtin::navigation_tour(&ResourceFormFixture::default()).unwrap();
    let runner = runner_for(vec![tour], surface);

    let report = runner.run(builtin::NAVIGATION_TOUR, TIMEOUT).await.unwrap();
    assert_eq!(report.succeeded(), 14);
}

#[tokio::test(start_paused = true)]
async fn test_no_action_after_timeout() {
    let surface = Arc::new(ScriptedSurface::new(vec![
        ElementSpec::new(".first"),
        ElementSpec::new(".third"),
    ]));
    let tour = Tour::new(
        "gap",
        TourOptions::default(),
        vec![Step::new(".first"), Step::new(".second"), Step::new(".third")],
    )
    .unwrap();
    let runner = runner_for(vec![tour], surface.clone());

    let (failure, report) = expect_aborted(runner.run("gap", Duration::from_millis(800)).await);
    assert_eq!(failure.step_index(), 1);
    assert_eq!(report.steps.len(), 2);

    let actions = surface.actions().await;
    assert_eq!(actions.len(), 1);
    assert!(actions.iter().all(|a| a.selector() != ".third"));
}

#[tokio::test(start_paused = true)]
async fn test_enter_text_round_trip() {
    let surface = Arc::new(ScriptedSurface::new(vec![
        ElementSpec::new("input[name=\"base_workload\"]").with_text("0")
    ]));
    let tour = Tour::new(
        "workload",
        TourOptions::default(),
        vec![Step::new("input[name=\"base_workload\"]").enter_text("100")],
    )
    .unwrap();
    let runner = runner_for(vec![tour], surface.clone());

    runner.run("workload", TIMEOUT).await.unwrap();

    let element = surface
        .find_element("input[name=\"base_workload\"]")
        .await
        .unwrap();
    assert_eq!(surface.text(element).await.unwrap(), "100");
    assert_eq!(surface.focused().await, Some(element));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_run() {
    // Steps 0..3 are present, step 3 onwards never appears
    let selectors: Vec<String> = (0..10).map(|i| format!(".step-{i}")).collect();
    let surface = Arc::new(ScriptedSurface::new(
        selectors[..3].iter().map(ElementSpec::new).collect(),
    ));
    let tour = Tour::new(
        "long",
        TourOptions::default(),
        selectors.iter().map(Step::new).collect(),
    )
    .unwrap();
    let runner = runner_for(vec![tour], surface.clone());
    let mut states = runner.subscribe();

    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let (failure, report) = expect_aborted(
        runner
            .run_with_cancel("long", Duration::from_secs(60), cancel.token())
            .await,
    );

    assert_eq!(failure, StepFailure::Cancelled { step_index: 3 });
    assert_eq!(report.steps.last().unwrap().index, 3);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(surface.actions().await.len(), 3);

    states.changed().await.unwrap();
    assert_eq!(*states.borrow(), RunState::Aborted(failure));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_start_stops_at_first_step() {
    let surface = Arc::new(ScriptedSurface::new(vec![ElementSpec::new(".menu")]));
    let runner = runner_for(vec![create_tour()], surface.clone());

    let cancel = CancelHandle::new();
    cancel.cancel();
    let (failure, _) = expect_aborted(runner.run_with_cancel("create", TIMEOUT, cancel.token()).await);

    assert_eq!(failure, StepFailure::Cancelled { step_index: 0 });
    assert!(surface.actions().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stale_element_is_polled_again() {
    let surface = Arc::new(ScriptedSurface::new(vec![
        ElementSpec::new(".menu").detach_times(2)
    ]));
    let tour = Tour::new("stale", TourOptions::default(), vec![Step::new(".menu")]).unwrap();
    let runner = runner_for(vec![tour], surface.clone());

    let report = runner.run("stale", TIMEOUT).await.unwrap();
    assert!(report.is_completed());
    assert_eq!(surface.actions().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_element_that_stays_stale_times_out() {
    let surface = Arc::new(ScriptedSurface::new(vec![
        ElementSpec::new(".menu").detach_times(u32::MAX)
    ]));
    let tour = Tour::new("stale", TourOptions::default(), vec![Step::new(".menu")]).unwrap();
    let runner = runner_for(vec![tour], surface);

    let (failure, _) = expect_aborted(runner.run("stale", Duration::from_secs(2)).await);
    assert_eq!(
        failure,
        StepFailure::StepTimeout {
            step_index: 0,
            selector: ".menu".to_string()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_rejected_action_is_action_failure() {
    let surface = Arc::new(ScriptedSurface::new(vec![
        ElementSpec::new(".menu"),
        ElementSpec::new("input[name=workload]").rejecting("field is read-only"),
        ElementSpec::new(".save"),
    ]));
    let runner = runner_for(vec![create_tour()], surface.clone());

    let (failure, report) = expect_aborted(runner.run("create", TIMEOUT).await);
    assert_eq!(
        failure,
        StepFailure::ActionFailure {
            step_index: 1,
            reason: "field is read-only".to_string()
        }
    );
    assert_eq!(report.steps.len(), 2);
    assert!(surface.actions().await.iter().all(|a| a.selector() != ".save"));
}

/// Surface that cannot open the entry page; otherwise a scripted page
struct UnreachableSurface {
    page: ScriptedSurface,
}

#[async_trait]
impl UiSurface for UnreachableSurface {
    async fn prepare(&self, options: &TourOptions) -> Result<(), SurfaceError> {
        Err(SurfaceError::Rejected(format!(
            "cannot open {}",
            options.start_url
        )))
    }

    async fn find_all(&self, selector: &str) -> Vec<ElementId> {
        self.page.find_all(selector).await
    }

    async fn click(&self, element: ElementId) -> Result<(), SurfaceError> {
        self.page.click(element).await
    }

    async fn focus(&self, element: ElementId) -> Result<(), SurfaceError> {
        self.page.focus(element).await
    }

    async fn set_text(&self, element: ElementId, value: &str) -> Result<(), SurfaceError> {
        self.page.set_text(element, value).await
    }

    async fn text(&self, element: ElementId) -> Result<String, SurfaceError> {
        self.page.text(element).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_prepare_aborts_at_first_step() {
    let surface = Arc::new(UnreachableSurface {
        page: ScriptedSurface::new(vec![ElementSpec::new(".menu")]),
    });
    let mut registry = TourRegistry::new();
    registry.register(create_tour()).unwrap();
    let runner = StepRunner::new(Arc::new(registry), surface.clone(), RunnerConfig::default());
    let states = runner.subscribe();

    let (failure, report) = expect_aborted(runner.run("create", TIMEOUT).await);

    assert_eq!(
        failure,
        StepFailure::ActionFailure {
            step_index: 0,
            reason: "Surface rejected the action: cannot open /web".to_string()
        }
    );
    assert_eq!(report.steps.len(), 1);
    assert_eq!(report.steps[0].index, 0);
    assert_eq!(report.steps[0].selector, ".menu");
    assert!(!report.steps[0].success);
    assert_eq!(report.aborted_at(), Some(0));
    assert_eq!(*states.borrow(), RunState::Aborted(failure));
    assert!(surface.page.actions().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_ambiguous_trigger_times_out() {
    let surface = Arc::new(ScriptedSurface::new(vec![
        ElementSpec::new(".fa-check"),
        ElementSpec::new(".fa-check"),
    ]));
    let tour = Tour::new("ambiguous", TourOptions::default(), vec![Step::new(".fa-check")]).unwrap();
    let runner = runner_for(vec![tour], surface.clone());

    let (failure, _) = expect_aborted(runner.run("ambiguous", Duration::from_secs(1)).await);
    assert!(matches!(failure, StepFailure::StepTimeout { step_index: 0, .. }));
    assert!(surface.actions().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_delayed_trigger_within_budget() {
    let surface = Arc::new(ScriptedSurface::new(vec![
        ElementSpec::new(".o_list_button_add").appear_after(Duration::from_millis(1500))
    ]));
    let tour = Tour::new(
        "slow",
        TourOptions::default(),
        vec![Step::new(".o_list_button_add").with_action(Action::NoOp)],
    )
    .unwrap();
    let runner = runner_for(vec![tour], surface.clone());

    let report = runner.run("slow", Duration::from_secs(3)).await.unwrap();
    assert!(report.steps[0].elapsed >= Duration::from_millis(1500));
    // NoOp only confirms presence
    assert!(surface.actions().await.is_empty());
}

#[tokio::test]
async fn test_unknown_tour() {
    let runner = runner_for(vec![create_tour()], Arc::new(ScriptedSurface::new(Vec::new())));
    let err = runner.run("missing", TIMEOUT).await.unwrap_err();
    assert!(matches!(err, RunError::UnknownTour(name) if name == "missing"));
    assert_eq!(*runner.subscribe().borrow(), RunState::NotStarted);
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let mut registry = TourRegistry::new();
    registry.register(create_tour()).unwrap();
    let err = registry.register(create_tour()).unwrap_err();
    assert_eq!(err.name, "create");
    assert_eq!(registry.len(), 1);
}

// ============== CLI ==============

struct CliOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

/// Run the binary with config and data dirs pointing into `home`
fn run_tour(home: &Path, args: &[&str]) -> CliOutput {
    let output = Command::new(env!("CARGO_BIN_EXE_tour"))
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("RUST_LOG", "warn")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to run tour binary");

    CliOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

#[test]
fn test_cli_list_includes_builtin_and_extra_tours() {
    let home = tempfile::tempdir().unwrap();
    let tours_dir = demo_path("tours");
    let output = run_tour(home.path(), &["--tours", tours_dir.to_str().unwrap(), "list"]);

    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("tour_test_create"));
    assert!(output.stdout.contains("tour_test_navigation"));
    assert!(output.stdout.contains("quick_create"));
}

#[test]
fn test_cli_duplicate_tour_across_dirs_fails() {
    let home = tempfile::tempdir().unwrap();
    let tours_dir = home.path().join("tours");
    std::fs::create_dir_all(&tours_dir).unwrap();
    std::fs::write(
        tours_dir.join("shadow.yaml"),
        "name: tour_test_create\nsteps:\n  - trigger: .o_menu_toggle\n",
    )
    .unwrap();

    let output = run_tour(home.path(), &["--tours", tours_dir.to_str().unwrap(), "list"]);

    assert!(!output.success);
    assert!(
        output
            .stderr
            .contains("Tour 'tour_test_create' is already registered"),
        "stderr: {}",
        output.stderr
    );
    assert!(!output.stdout.contains("Tours:"), "stdout: {}", output.stdout);
}

#[test]
fn test_cli_validate() {
    let home = tempfile::tempdir().unwrap();
    let path = demo_path("tours/quick_create.yaml");
    let output = run_tour(home.path(), &["validate", path.to_str().unwrap()]);
    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("quick_create is valid (5 steps)"));

    let broken = home.path().join("broken.yaml");
    std::fs::write(&broken, "name: broken\nsteps:\n  - trigger: .a\n    run: hover\n").unwrap();
    let output = run_tour(home.path(), &["validate", broken.to_str().unwrap()]);
    assert!(!output.success);
    assert!(output.stderr.contains("hover"), "stderr: {}", output.stderr);
}

#[test]
fn test_cli_show_uses_catalog() {
    let home = tempfile::tempdir().unwrap();
    let config_dir = home.path().join("config").join("tour-runner");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        format!(
            "[i18n]\ncatalog = {:?}\n",
            demo_path("catalog.de.yaml").to_str().unwrap()
        ),
    )
    .unwrap();

    let output = run_tour(home.path(), &["show", "tour_test_create"]);
    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("Ressource speichern"));
    assert!(output.stdout.contains("text 100"));
}

#[test]
fn test_cli_run_passes_against_demo_surface() {
    let home = tempfile::tempdir().unwrap();
    let surface = demo_path("resource_planning.surface.yaml");
    let output = run_tour(
        home.path(),
        &["run", "tour_test_create", "--surface", surface.to_str().unwrap()],
    );

    assert!(output.success, "stderr: {}", output.stderr);
    assert!(output.stdout.contains("Tour Passed"));
}

#[test]
fn test_cli_run_json_report() {
    let home = tempfile::tempdir().unwrap();
    let surface = demo_path("resource_planning.surface.yaml");
    let output = run_tour(
        home.path(),
        &[
            "run",
            "tour_test_navigation",
            "--surface",
            surface.to_str().unwrap(),
            "--json",
        ],
    );

    assert!(output.success, "stderr: {}", output.stderr);
    let report: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(report["tour"], "tour_test_navigation");
    assert_eq!(report["state"]["state"], "completed");
    assert_eq!(report["steps"].as_array().unwrap().len(), 14);
}

#[test]
fn test_cli_run_reports_missing_trigger() {
    let home = tempfile::tempdir().unwrap();
    let surface = home.path().join("no_save.surface.yaml");
    std::fs::write(
        &surface,
        "elements:\n  - selector: .o_menu_toggle\n",
    )
    .unwrap();

    let output = run_tour(
        home.path(),
        &[
            "run",
            "tour_test_create",
            "--surface",
            surface.to_str().unwrap(),
            "--timeout-ms",
            "200",
        ],
    );

    assert!(!output.success);
    assert!(output.stdout.contains("Tour Aborted"), "stdout: {}", output.stdout);
    assert!(output.stderr.contains("Error:"), "stderr: {}", output.stderr);
    assert!(output.stderr.contains("Step 1"), "stderr: {}", output.stderr);
}

#[test]
fn test_cli_unknown_tour() {
    let home = tempfile::tempdir().unwrap();
    let output = run_tour(home.path(), &["show", "nope"]);
    assert!(!output.success);
    assert!(output.stderr.contains("'nope' is not registered"));
}
