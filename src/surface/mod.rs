//! UI surface abstraction
//!
//! The runner never touches a DOM directly. It queries and drives whatever
//! implements [`UiSurface`]: a browser bridge in production, or the
//! [`ScriptedSurface`] fixture in tests and demos.

mod scripted;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::tour::TourOptions;

pub use scripted::{ElementSpec, RecordedAction, ScriptedSurface, SurfaceFixture};

/// Opaque handle to an element on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors reported by a surface when acting on an element
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The element was removed or re-rendered between lookup and action
    #[error("Element {0} is no longer attached to the surface")]
    Detached(ElementId),

    #[error("Surface rejected the action: {0}")]
    Rejected(String),
}

/// Query and interaction capability provided by the host
#[async_trait]
pub trait UiSurface: Send + Sync {
    /// Apply tour options (entry URL, test mode) before the first step
    async fn prepare(&self, _options: &TourOptions) -> Result<(), SurfaceError> {
        Ok(())
    }

    /// Every element currently matching `selector`
    async fn find_all(&self, selector: &str) -> Vec<ElementId>;

    /// The element matching `selector`, if exactly one does
    async fn find_element(&self, selector: &str) -> Option<ElementId> {
        match self.find_all(selector).await.as_slice() {
            [element] => Some(*element),
            _ => None,
        }
    }

    async fn click(&self, element: ElementId) -> Result<(), SurfaceError>;

    async fn focus(&self, element: ElementId) -> Result<(), SurfaceError>;

    async fn set_text(&self, element: ElementId, value: &str) -> Result<(), SurfaceError>;

    /// Current text content or value of the element
    async fn text(&self, element: ElementId) -> Result<String, SurfaceError>;

    /// Give the host a chance to render after an action
    async fn settle(&self) {
        tokio::task::yield_now().await;
    }
}
