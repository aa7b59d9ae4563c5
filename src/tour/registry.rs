//! Tour registry
//!
//! Tours are added once at load time and are read-only afterwards. The
//! registry is an owned value handed to the runner, usually behind an `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::model::{Step, Tour, TourOptions};
use crate::common::{DuplicateNameError, Result};

/// Tours keyed by their unique name
#[derive(Debug, Default)]
pub struct TourRegistry {
    tours: BTreeMap<String, Arc<Tour>>,
}

impl TourRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tour, failing without side effects if the name is taken
    pub fn register(&mut self, tour: Tour) -> std::result::Result<(), DuplicateNameError> {
        if self.tours.contains_key(tour.name()) {
            return Err(DuplicateNameError {
                name: tour.name().to_string(),
            });
        }
        tracing::debug!(tour = tour.name(), steps = tour.steps().len(), "Registered tour");
        self.tours.insert(tour.name().to_string(), Arc::new(tour));
        Ok(())
    }

    /// Build and register a tour from its parts
    pub fn register_steps(
        &mut self,
        name: &str,
        options: TourOptions,
        steps: Vec<Step>,
    ) -> Result<()> {
        let tour = Tour::new(name, options, steps)?;
        self.register(tour)?;
        Ok(())
    }

    /// Register every tour in order, stopping at the first duplicate
    pub fn extend(
        &mut self,
        tours: impl IntoIterator<Item = Tour>,
    ) -> std::result::Result<(), DuplicateNameError> {
        for tour in tours {
            self.register(tour)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Tour>> {
        self.tours.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tours.contains_key(name)
    }

    /// Tours sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Tour>> {
        self.tours.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tours.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }
}
