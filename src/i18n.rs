//! Translation of step descriptions
//!
//! Descriptions are stored as keys and only translated for display. A
//! missing translation falls back to the key itself.

use std::collections::HashMap;
use std::path::Path;

use crate::common::{Error, Result};

/// Maps a description key to display text
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str) -> String;
}

/// Returns every key unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

/// Translator backed by a flat key/value catalog
#[derive(Debug, Default, Clone)]
pub struct CatalogTranslator {
    entries: HashMap<String, String>,
}

impl CatalogTranslator {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Parse a YAML mapping of `key: translation`
    pub fn from_yaml(content: &str) -> Result<Self> {
        let entries: HashMap<String, String> = serde_yaml::from_str(content)?;
        Ok(Self::new(entries))
    }

    /// Load a YAML catalog from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::from_yaml(&content)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Translator for CatalogTranslator {
    fn translate(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
