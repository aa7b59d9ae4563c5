//! Tour, step and action types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};
use crate::i18n::Translator;

/// Where the host would anchor its tooltip for a step
///
/// Carried through for display only; execution ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitPosition {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

impl fmt::Display for WaitPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitPosition::Top => write!(f, "top"),
            WaitPosition::Bottom => write!(f, "bottom"),
            WaitPosition::Left => write!(f, "left"),
            WaitPosition::Right => write!(f, "right"),
        }
    }
}

/// What a step does once its trigger resolves
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Action {
    Click,
    EnterText(String),
    /// Only confirms the trigger is present
    NoOp,
}

impl Action {
    /// Parse an action spec: `click`, `noop`, or `text <value>`
    ///
    /// Everything after the first space of a `text` spec is the value, so
    /// `text 2020-04-05 13:42:07` enters the full timestamp.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let (verb, rest) = match spec.split_once(' ') {
            Some((verb, rest)) => (verb, Some(rest)),
            None => (spec, None),
        };

        match (verb.to_lowercase().as_str(), rest) {
            ("click", None) => Ok(Action::Click),
            ("noop", None) | ("none", None) => Ok(Action::NoOp),
            ("text", Some(value)) => Ok(Action::EnterText(value.to_string())),
            ("text", None) => Ok(Action::EnterText(String::new())),
            _ => Err(Error::InvalidAction(spec.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Click => write!(f, "click"),
            Action::EnterText(value) => write!(f, "text {}", value),
            Action::NoOp => write!(f, "noop"),
        }
    }
}

/// A single selector-driven step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub trigger_selector: String,
    /// Translation key for the human-readable hint
    pub description: Option<String>,
    pub action: Action,
    pub wait_position: WaitPosition,
}

impl Step {
    /// A click step on `trigger`
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger_selector: trigger.into(),
            description: None,
            action: Action::Click,
            wait_position: WaitPosition::default(),
        }
    }

    pub fn with_description(mut self, key: impl Into<String>) -> Self {
        self.description = Some(key.into());
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Shorthand for an `EnterText` step
    pub fn enter_text(self, value: impl Into<String>) -> Self {
        self.with_action(Action::EnterText(value.into()))
    }

    pub fn at(mut self, position: WaitPosition) -> Self {
        self.wait_position = position;
        self
    }

    /// Description translated for display, empty when the step has none
    pub fn display_text(&self, translator: &dyn Translator) -> String {
        self.description
            .as_deref()
            .map(|key| translator.translate(key))
            .unwrap_or_default()
    }
}

/// Options the host applies before the first step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TourOptions {
    /// Run without persisting changes
    pub is_test_mode: bool,
    /// Entry URL the surface navigates to before the first step
    pub start_url: String,
}

impl Default for TourOptions {
    fn default() -> Self {
        Self {
            is_test_mode: false,
            start_url: "/web".to_string(),
        }
    }
}

/// An immutable, validated walkthrough script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tour {
    name: String,
    options: TourOptions,
    steps: Vec<Step>,
}

impl Tour {
    /// Build a tour, rejecting empty names, empty step lists and blank triggers
    pub fn new(name: impl Into<String>, options: TourOptions, steps: Vec<Step>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_tour(&name, "name must not be empty"));
        }
        if steps.is_empty() {
            return Err(Error::invalid_tour(&name, "a tour needs at least one step"));
        }
        if let Some(index) = steps
            .iter()
            .position(|s| s.trigger_selector.trim().is_empty())
        {
            return Err(Error::invalid_tour(
                &name,
                &format!("step {} has an empty trigger selector", index),
            ));
        }

        Ok(Self {
            name,
            options,
            steps,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &TourOptions {
        &self.options
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}
