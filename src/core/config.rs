//! Configuration model read by the loader
//!
//! The model is INI-shaped: a top-level `log` section and one `log.<mode>`
//! section per output mode, each a flat map of string values. Typed getters
//! fall back to the supplied default when a key is missing, empty or
//! malformed. The model can be built in code or deserialized with serde from
//! a `{ "section": { "key": value } }` document.

use serde::Deserialize;
use std::collections::HashMap;

/// Name of the top-level section
pub const ROOT_SECTION: &str = "log";

/// Split a comma and/or whitespace separated list, dropping empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LogConfig {
    sections: HashMap<String, Section>,
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` in `section`, creating the section if needed (builder style)
    #[must_use]
    pub fn set(
        mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        self.insert(section, key, value);
        self
    }

    pub fn insert(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl ToString,
    ) {
        self.sections
            .entry(section.into())
            .or_default()
            .values
            .insert(key.into(), value.to_string());
    }

    /// Declare an empty section (an enabled mode that relies on defaults)
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.sections.entry(section.into()).or_default();
        self
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// The top-level section; an absent one reads as empty.
    pub fn root(&self) -> Section {
        self.section(ROOT_SECTION).cloned().unwrap_or_default()
    }

    /// Modes listed under `log.mode`, `console` when unset.
    pub fn modes(&self) -> Vec<String> {
        split_list(&self.root().must_string("mode", "console"))
    }

    pub fn from_json_str(json: &str) -> super::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One configuration section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "HashMap<String, RawValue>")]
pub struct Section {
    values: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
}

impl From<HashMap<String, RawValue>> for Section {
    fn from(raw: HashMap<String, RawValue>) -> Self {
        let values = raw
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    RawValue::String(s) => s,
                    RawValue::Int(i) => i.to_string(),
                    RawValue::Float(f) => f.to_string(),
                    RawValue::Bool(b) => b.to_string(),
                    RawValue::List(items) => items.join(","),
                };
                (key, value)
            })
            .collect();
        Self { values }
    }
}

impl Section {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The raw value, or `""` when absent
    pub fn string(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn must_string(&self, key: &str, default: &str) -> String {
        match self.get(key).map(str::trim) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => default.to_string(),
        }
    }

    pub fn must_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(|v| v.trim().to_lowercase()).as_deref() {
            Some("1" | "t" | "true" | "y" | "yes" | "on") => true,
            Some("0" | "f" | "false" | "n" | "no" | "off") => false,
            _ => default,
        }
    }

    pub fn must_int(&self, key: &str, default: i64) -> i64 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn must_u32(&self, key: &str, default: u32) -> u32 {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}
