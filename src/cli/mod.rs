//! CLI command handling
//!
//! Builds the tour registry, dispatches commands and formats output.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use tokio::sync::watch;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{paths, Error, Result, RunError};
use crate::i18n::{CatalogTranslator, IdentityTranslator, Translator};
use crate::runner::{CancelHandle, RunReport, RunState, RunnerConfig, StepRunner};
use crate::surface::ScriptedSurface;
use crate::tour::builtin::{self, ResourceFormFixture};
use crate::tour::{self, Tour, TourRegistry};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, tour_dirs: &[PathBuf]) -> Result<()> {
    let config = Config::load()?;

    match command {
        Commands::List => {
            let registry = build_registry(&config, tour_dirs)?;
            if registry.is_empty() {
                println!("No tours registered");
                return Ok(());
            }

            println!("Tours:");
            for tour in registry.iter() {
                let mode = if tour.options().is_test_mode {
                    "test"
                } else {
                    "live"
                };
                println!(
                    "  {} ({} steps, {}, {})",
                    tour.name().bold(),
                    tour.steps().len(),
                    mode,
                    tour.options().start_url.dimmed()
                );
            }
            Ok(())
        }

        Commands::Show { name } => {
            let registry = build_registry(&config, tour_dirs)?;
            let tour = registry.get(&name).ok_or(RunError::UnknownTour(name))?;
            let translator = load_translator(&config)?;
            print_tour(&tour, translator.as_ref());
            Ok(())
        }

        Commands::Validate { path } => {
            let tour = tour::load_file(&path)?;
            println!(
                "  {} {} is valid ({} steps)",
                "✓".green(),
                tour.name().bold(),
                tour.steps().len()
            );
            Ok(())
        }

        Commands::Run {
            name,
            surface,
            timeout_ms,
            json,
            verbose,
        } => {
            let registry = Arc::new(build_registry(&config, tour_dirs)?);
            let tour = registry
                .get(&name)
                .ok_or_else(|| RunError::UnknownTour(name.clone()))?;
            let translator = load_translator(&config)?;
            let surface = Arc::new(ScriptedSurface::load(&surface)?);
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.step_timeout());

            let runner = StepRunner::new(registry, surface, RunnerConfig::from(&config));

            let cancel = CancelHandle::new();
            {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Interrupt received, cancelling run");
                        cancel.cancel();
                    }
                });
            }

            if !json {
                println!(
                    "\n{} {}",
                    "Running Tour:".blue().bold(),
                    tour.name().white().bold()
                );
                println!("  {}", tour.options().start_url.dimmed());
            }

            let progress = (verbose && !json)
                .then(|| tokio::spawn(print_progress(runner.subscribe(), tour.clone())));

            let result = runner.run_with_cancel(&name, timeout, cancel.token()).await;

            if let Some(progress) = progress {
                let _ = progress.await;
            }

            match result {
                Ok(report) => {
                    print_report(&report, &tour, translator.as_ref(), json)?;
                    Ok(())
                }
                Err(err) => {
                    if let Some(report) = err.report() {
                        print_report(report, &tour, translator.as_ref(), json)?;
                    }
                    Err(err.into())
                }
            }
        }

        Commands::Config { init } => {
            let path = paths::config_path()
                .ok_or_else(|| Error::Config("No configuration directory available".into()))?;

            if init {
                if path.exists() {
                    println!("Configuration already exists: {}", path.display());
                } else {
                    paths::ensure_config_dir()?;
                    std::fs::write(&path, Config::default().to_toml()?)?;
                    println!("Wrote default configuration: {}", path.display());
                }
                return Ok(());
            }

            println!("# {}", path.display());
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// Built-in tours, then the user tours directory, configured directories
/// and finally directories passed on the command line
pub fn build_registry(config: &Config, extra_dirs: &[PathBuf]) -> Result<TourRegistry> {
    let mut registry = TourRegistry::new();
    builtin::register_builtins(&mut registry, &ResourceFormFixture::default())?;

    let optional_dirs = paths::tours_dir()
        .into_iter()
        .chain(config.tours.dirs.iter().cloned());
    for dir in optional_dirs {
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "Tour directory not found, skipping");
            continue;
        }
        registry.extend(tour::load_dir(&dir)?)?;
    }

    for dir in extra_dirs {
        registry.extend(tour::load_dir(dir)?)?;
    }

    Ok(registry)
}

fn load_translator(config: &Config) -> Result<Box<dyn Translator>> {
    match &config.i18n.catalog {
        Some(path) => Ok(Box::new(CatalogTranslator::load(path)?)),
        None => Ok(Box::new(IdentityTranslator)),
    }
}

fn print_tour(tour: &Tour, translator: &dyn Translator) {
    println!("{}", tour.name().bold());
    println!(
        "  url: {}  test mode: {}",
        tour.options().start_url,
        tour.options().is_test_mode
    );
    println!("\n{}", "Steps:".cyan());
    for (index, step) in tour.steps().iter().enumerate() {
        println!(
            "  {:>2}. {} {} [{}]",
            index,
            step.action.to_string().yellow(),
            step.trigger_selector,
            step.wait_position.to_string().dimmed()
        );
        let text = step.display_text(translator);
        if !text.is_empty() {
            println!("      {}", text.dimmed());
        }
    }
}

async fn print_progress(mut states: watch::Receiver<RunState>, tour: Arc<Tour>) {
    while states.changed().await.is_ok() {
        let state = states.borrow_and_update().clone();
        match state {
            RunState::Running(index) => {
                let selector = &tour.steps()[index].trigger_selector;
                println!("  {} Step {}: waiting for {}", "…".dimmed(), index, selector.dimmed());
            }
            state if state.is_terminal() => break,
            _ => {}
        }
    }
}

fn print_report(
    report: &RunReport,
    tour: &Tour,
    translator: &dyn Translator,
    json: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("\n{}", "Steps:".cyan());
    for outcome in &report.steps {
        let hint = tour
            .steps()
            .get(outcome.index)
            .map(|s| s.display_text(translator))
            .unwrap_or_default();

        if outcome.success {
            println!(
                "  {} Step {}: {} {} ({} ms)",
                "✓".green(),
                outcome.index,
                outcome.selector.dimmed(),
                hint,
                outcome.elapsed.as_millis()
            );
        } else {
            println!(
                "  {} Step {}: {}",
                "✗".red(),
                outcome.index,
                outcome.error.as_deref().unwrap_or("failed")
            );
        }
    }

    match &report.state {
        RunState::Completed => println!(
            "\n{} {} ({} ms)\n",
            "✓".green().bold(),
            "Tour Passed".green().bold(),
            report.elapsed.as_millis()
        ),
        RunState::Aborted(failure) => println!(
            "\n{} {} at step {}\n",
            "✗".red().bold(),
            "Tour Aborted".red().bold(),
            failure.step_index()
        ),
        _ => {}
    }
    Ok(())
}
