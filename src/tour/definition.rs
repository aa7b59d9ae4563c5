//! Tour definition files
//!
//! Defines the data structures for deserializing YAML tour definitions and
//! turning them into validated [`Tour`] values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::model::{Action, Step, Tour, TourOptions, WaitPosition};
use crate::common::{Error, Result};

/// A complete tour loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct TourDefinition {
    /// Unique tour name
    pub name: String,
    /// Registration options
    #[serde(default)]
    pub options: OptionsDefinition,
    /// Ordered steps
    pub steps: Vec<StepDefinition>,
}

/// Registration options as written in a definition file
#[derive(Deserialize, Debug, Default)]
pub struct OptionsDefinition {
    /// Run in non-persistent mode
    #[serde(default)]
    pub test: bool,
    /// Entry URL for the run (default: /web)
    pub url: Option<String>,
}

/// One entry of the `steps` list
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum StepDefinition {
    /// A predefined step shared by many tours
    Standard { standard: StandardStep },
    /// A step spelled out in full
    Custom {
        /// Selector of the element to wait for
        trigger: String,
        /// Human-readable hint (translation key)
        content: Option<String>,
        /// Action spec: "click" (default), "noop" or "text <value>"
        run: Option<String>,
        /// Tooltip anchor, display only
        #[serde(default)]
        position: WaitPosition,
    },
}

/// Predefined steps available to definition files
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StandardStep {
    /// Open the application switcher from the home menu toggle
    ShowAppsMenuItem,
}

impl StandardStep {
    pub fn step(self) -> Step {
        match self {
            StandardStep::ShowAppsMenuItem => Step::new(".o_menu_toggle")
                .with_description("Click on the Home icon to navigate across apps.")
                .at(WaitPosition::Bottom),
        }
    }
}

impl StepDefinition {
    fn into_step(self) -> Result<Step> {
        match self {
            StepDefinition::Standard { standard } => Ok(standard.step()),
            StepDefinition::Custom {
                trigger,
                content,
                run,
                position,
            } => {
                // The host clicks the trigger when no action is given
                let action = match run {
                    Some(spec) => Action::parse(&spec)?,
                    None => Action::Click,
                };
                Ok(Step {
                    trigger_selector: trigger,
                    description: content,
                    action,
                    wait_position: position,
                })
            }
        }
    }
}

impl TourDefinition {
    /// Parse a definition from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Validate and convert into a [`Tour`]
    pub fn into_tour(self) -> Result<Tour> {
        let defaults = TourOptions::default();
        let options = TourOptions {
            is_test_mode: self.options.test,
            start_url: self.options.url.unwrap_or(defaults.start_url),
        };

        let steps = self
            .steps
            .into_iter()
            .enumerate()
            .map(|(i, step)| {
                step.into_step().map_err(|e| {
                    Error::invalid_tour(&self.name, &format!("step {}: {}", i, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Tour::new(self.name, options, steps)
    }
}

/// Load a single tour from a YAML file
pub fn load_file(path: &Path) -> Result<Tour> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    let definition = TourDefinition::from_yaml(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse tour definition '{}': {}",
            path.display(),
            e
        ))
    })?;
    definition.into_tour()
}

/// Load every `*.yaml`/`*.yml` tour in `dir`, ordered by file name
pub fn load_dir(dir: &Path) -> Result<Vec<Tour>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| Error::file_read(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("yaml") | Some("yml")
                )
        })
        .collect();
    files.sort();

    files.iter().map(|path| load_file(path)).collect()
}
