//! Per-logger-name minimum levels
//!
//! A filter string is a comma/space separated list of `name:level` pairs.
//! Entries without a `:` are dropped; entries whose level is unknown are
//! kept with the unknown-level fallback (error only).

use super::bootstrap::BootstrapLogger;
use super::config::split_list;
use super::log_level::{resolve, LevelFilter};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRules {
    rules: HashMap<String, LevelFilter>,
}

impl FilterRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(filters: &str, diagnostics: &BootstrapLogger) -> Self {
        let mut rules = HashMap::new();
        for item in split_list(filters) {
            // Only the first two `:`-separated parts count.
            let mut parts = item.split(':');
            if let (Some(name), Some(level)) = (parts.next(), parts.next()) {
                rules.insert(name.to_string(), resolve(level, diagnostics));
            }
        }
        Self { rules }
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, level: LevelFilter) -> Self {
        self.rules.insert(name.into(), level);
        self
    }

    pub fn get(&self, name: &str) -> Option<LevelFilter> {
        self.rules.get(name).copied()
    }

    /// The rule for `name`, or `fallback` when there is none
    pub fn level_for(&self, name: &str, fallback: LevelFilter) -> LevelFilter {
        self.get(name).unwrap_or(fallback)
    }

    /// Copy every rule of `other` whose name is not present yet.
    ///
    /// Used both to layer defaults under a mode's own rules and to build the
    /// process-wide table where the first mode to name a logger wins.
    pub fn merge_missing(&mut self, other: &FilterRules) {
        for (name, level) in &other.rules {
            self.rules.entry(name.clone()).or_insert(*level);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, LevelFilter)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
