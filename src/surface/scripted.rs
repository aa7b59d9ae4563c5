//! Scripted in-memory surface
//!
//! A deterministic stand-in for a rendered page. Elements are described in
//! a YAML fixture and can appear after a delay, be revealed or hidden by
//! actions on other elements, go stale a number of times, or reject
//! actions outright. Every applied action is recorded.
//!
//! Selectors are matched literally against an element's `selector` and
//! `aliases`; there is no CSS engine here.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{ElementId, SurfaceError, UiSurface};
use crate::common::{Error, Result};
use crate::tour::TourOptions;

/// A fixture file describing the page
#[derive(Deserialize, Debug, Default)]
pub struct SurfaceFixture {
    pub elements: Vec<ElementSpec>,
}

/// One element of the scripted page
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ElementSpec {
    /// Primary selector
    pub selector: String,
    /// Other selectors that also match this element
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Initial text content
    #[serde(default)]
    pub text: String,
    /// Delay before the element is rendered, counted from page load or,
    /// for elements with `revealed_by`, from the revealing action
    pub appear_after_ms: Option<u64>,
    /// Hidden until an action is applied to one of these selectors
    #[serde(default)]
    pub revealed_by: Vec<String>,
    /// Removed when an action is applied to one of these selectors
    #[serde(default)]
    pub hidden_by: Vec<String>,
    /// Every action on this element is rejected with this reason
    pub reject: Option<String>,
    /// Number of actions that find the element detached before it settles
    #[serde(default)]
    pub detach_times: u32,
}

impl ElementSpec {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            ..Self::default()
        }
    }

    pub fn alias(mut self, selector: impl Into<String>) -> Self {
        self.aliases.push(selector.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn appear_after(mut self, delay: Duration) -> Self {
        self.appear_after_ms = Some(delay.as_millis() as u64);
        self
    }

    pub fn revealed_by(mut self, selector: impl Into<String>) -> Self {
        self.revealed_by.push(selector.into());
        self
    }

    pub fn hidden_by(mut self, selector: impl Into<String>) -> Self {
        self.hidden_by.push(selector.into());
        self
    }

    pub fn rejecting(mut self, reason: impl Into<String>) -> Self {
        self.reject = Some(reason.into());
        self
    }

    pub fn detach_times(mut self, times: u32) -> Self {
        self.detach_times = times;
        self
    }

    fn matches(&self, selector: &str) -> bool {
        self.selector == selector || self.aliases.iter().any(|a| a == selector)
    }
}

/// An action the surface accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordedAction {
    Click { selector: String },
    Focus { selector: String },
    SetText { selector: String, value: String },
}

impl RecordedAction {
    pub fn selector(&self) -> &str {
        match self {
            RecordedAction::Click { selector }
            | RecordedAction::Focus { selector }
            | RecordedAction::SetText { selector, .. } => selector,
        }
    }
}

#[derive(Debug)]
struct ElementState {
    spec: ElementSpec,
    text: String,
    revealed: bool,
    /// When a `revealed_by` action last showed the element
    revealed_at: Option<Instant>,
    hidden: bool,
    detaches_left: u32,
}

impl ElementState {
    fn new(spec: ElementSpec) -> Self {
        Self {
            text: spec.text.clone(),
            revealed: spec.revealed_by.is_empty(),
            revealed_at: None,
            hidden: false,
            detaches_left: spec.detach_times,
            spec,
        }
    }

    fn is_visible(&self, loaded_at: Instant) -> bool {
        let delay = Duration::from_millis(self.spec.appear_after_ms.unwrap_or(0));
        let shown_at = self.revealed_at.unwrap_or(loaded_at);
        self.revealed && !self.hidden && Instant::now() >= shown_at + delay
    }
}

#[derive(Debug)]
struct PageState {
    elements: Vec<ElementState>,
    loaded_at: Instant,
    prepared: Option<TourOptions>,
    focused: Option<ElementId>,
    log: Vec<RecordedAction>,
}

impl PageState {
    /// Resolve a handle for an action, consuming one pending detach
    fn attached(&mut self, element: ElementId) -> std::result::Result<usize, SurfaceError> {
        let loaded_at = self.loaded_at;
        let index = element.0 as usize;
        let state = self
            .elements
            .get_mut(index)
            .filter(|s| s.is_visible(loaded_at))
            .ok_or(SurfaceError::Detached(element))?;

        if state.detaches_left > 0 {
            state.detaches_left -= 1;
            return Err(SurfaceError::Detached(element));
        }
        if let Some(reason) = &state.spec.reject {
            return Err(SurfaceError::Rejected(reason.clone()));
        }
        Ok(index)
    }

    /// Apply reveal/hide rules triggered by an action on `selector`
    fn propagate(&mut self, selector: &str) {
        let now = Instant::now();
        for state in &mut self.elements {
            if state.spec.revealed_by.iter().any(|s| s == selector) {
                state.revealed = true;
                state.revealed_at = Some(now);
                state.hidden = false;
            }
            if state.spec.hidden_by.iter().any(|s| s == selector) {
                state.hidden = true;
            }
        }
    }
}

/// In-memory [`UiSurface`] driven by a fixture
#[derive(Debug)]
pub struct ScriptedSurface {
    page: Mutex<PageState>,
}

impl ScriptedSurface {
    pub fn new(elements: Vec<ElementSpec>) -> Self {
        Self {
            page: Mutex::new(PageState {
                elements: elements.into_iter().map(ElementState::new).collect(),
                loaded_at: Instant::now(),
                prepared: None,
                focused: None,
                log: Vec::new(),
            }),
        }
    }

    /// Build a surface from fixture YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        let fixture: SurfaceFixture = serde_yaml::from_str(content)?;
        Ok(Self::new(fixture.elements))
    }

    /// Load a fixture file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::from_yaml(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse surface fixture '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Actions accepted so far, in order
    pub async fn actions(&self) -> Vec<RecordedAction> {
        self.page.lock().await.log.clone()
    }

    /// Options passed to the last `prepare` call
    pub async fn prepared(&self) -> Option<TourOptions> {
        self.page.lock().await.prepared.clone()
    }

    /// Text of the first element whose primary selector is `selector`
    pub async fn text_of(&self, selector: &str) -> Option<String> {
        let page = self.page.lock().await;
        page.elements
            .iter()
            .find(|s| s.spec.selector == selector)
            .map(|s| s.text.clone())
    }

    pub async fn focused(&self) -> Option<ElementId> {
        self.page.lock().await.focused
    }
}

#[async_trait]
impl UiSurface for ScriptedSurface {
    async fn prepare(&self, options: &TourOptions) -> std::result::Result<(), SurfaceError> {
        let mut page = self.page.lock().await;
        page.loaded_at = Instant::now();
        page.prepared = Some(options.clone());
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Vec<ElementId> {
        let page = self.page.lock().await;
        page.elements
            .iter()
            .enumerate()
            .filter(|(_, s)| s.spec.matches(selector) && s.is_visible(page.loaded_at))
            .map(|(i, _)| ElementId(i as u64))
            .collect()
    }

    async fn click(&self, element: ElementId) -> std::result::Result<(), SurfaceError> {
        let mut page = self.page.lock().await;
        let index = page.attached(element)?;
        let selector = page.elements[index].spec.selector.clone();
        page.log.push(RecordedAction::Click {
            selector: selector.clone(),
        });
        page.propagate(&selector);
        Ok(())
    }

    async fn focus(&self, element: ElementId) -> std::result::Result<(), SurfaceError> {
        let mut page = self.page.lock().await;
        let index = page.attached(element)?;
        let selector = page.elements[index].spec.selector.clone();
        page.focused = Some(element);
        page.log.push(RecordedAction::Focus { selector });
        Ok(())
    }

    async fn set_text(
        &self,
        element: ElementId,
        value: &str,
    ) -> std::result::Result<(), SurfaceError> {
        let mut page = self.page.lock().await;
        let index = page.attached(element)?;
        page.elements[index].text = value.to_string();
        let selector = page.elements[index].spec.selector.clone();
        page.log.push(RecordedAction::SetText {
            selector: selector.clone(),
            value: value.to_string(),
        });
        page.propagate(&selector);
        Ok(())
    }

    async fn text(&self, element: ElementId) -> std::result::Result<String, SurfaceError> {
        let page = self.page.lock().await;
        page.elements
            .get(element.0 as usize)
            .filter(|s| s.is_visible(page.loaded_at))
            .map(|s| s.text.clone())
            .ok_or(SurfaceError::Detached(element))
    }
}
