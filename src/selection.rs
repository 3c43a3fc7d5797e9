//! Selection handling for saving and loading component choices.
//!
//! A selection maps component keys to a wanted flag; a missing key means not
//! wanted. Selections can be persisted as JSON and validated against the
//! catalog before any planning happens.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::{self, Component};
use crate::error::GameTuiError;

/// Mapping from component key to "wanted".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Selection {
    pub components: BTreeMap<String, bool>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from a list of wanted keys.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::new();
        for key in keys {
            selection.components.insert(key.into(), true);
        }
        selection
    }

    /// Mark a component as wanted.
    pub fn enable(&mut self, key: &str) {
        self.components.insert(key.to_string(), true);
    }

    /// A missing key means not wanted.
    pub fn is_enabled(&self, key: &str) -> bool {
        self.components.get(key).copied().unwrap_or(false)
    }

    /// True when nothing is wanted.
    pub fn is_empty(&self) -> bool {
        !self.components.values().any(|wanted| *wanted)
    }

    /// Resolve the wanted keys against the catalog, in catalog order.
    ///
    /// Fails on the first key that does not exist in the catalog, so typos
    /// surface before any command runs.
    pub fn enabled_components(&self) -> std::result::Result<Vec<&'static Component>, GameTuiError> {
        for (key, wanted) in &self.components {
            if *wanted && catalog::find(key).is_none() {
                return Err(GameTuiError::unknown_component(key.clone()));
            }
        }
        Ok(catalog::COMPONENTS.iter().filter(|c| self.is_enabled(c.key)).collect())
    }

    /// Save the selection to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize selection to JSON")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write selection to {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Load a selection from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read selection from {:?}", path.as_ref()))?;
        let selection: Self =
            serde_json::from_str(&content).context("Failed to parse selection JSON")?;
        Ok(selection)
    }
}
