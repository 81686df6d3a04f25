// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entitlement configuration persisted as TOML string tables.
//!
//! The document is a set of `[section]` tables holding `key = "value"`
//! pairs. Missing sections and keys fall back to built-in defaults; only
//! what is on disk or set at runtime is written back.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// `section -> key -> value`
pub type Sections = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("No configuration section '{0}' exists")]
    UnknownSection(String),

    #[error("Property '{key}' does not exist in section '{section}'")]
    UnknownKey { section: String, key: String },
}

const DEFAULTS: &[(&str, &[(&str, &str)])] = &[
    (
        "server",
        &[
            ("hostname", "subscription.rhsm.redhat.com"),
            ("prefix", "/subscription"),
            ("port", "443"),
            ("insecure", "0"),
            ("proxy_hostname", ""),
            ("proxy_port", ""),
            ("proxy_user", ""),
            ("proxy_password", ""),
        ],
    ),
    (
        "rhsm",
        &[
            ("baseurl", "https://cdn.redhat.com"),
            ("ca_cert_dir", "/etc/rhsm/ca/"),
            ("consumerCertDir", "/etc/pki/consumer"),
            ("entitlementCertDir", "/etc/pki/entitlement"),
            ("manage_repos", "1"),
        ],
    ),
    ("rhsmcertd", &[("certCheckInterval", "240"), ("autoAttachInterval", "1440")]),
    ("logging", &[("default_log_level", "INFO")]),
];

/// Two-level configuration backed by a TOML file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    defaults: Sections,
    stored: Sections,
}

impl ConfigStore {
    /// Load `path`, or start from defaults if it does not exist yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let stored = match std::fs::read_to_string(&path) {
            Ok(text) => parse(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Sections::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, defaults: defaults(), stored })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Effective configuration: defaults overlaid with stored values.
    pub fn sections(&self) -> Sections {
        let mut merged = self.defaults.clone();
        for (name, entries) in &self.stored {
            merged.entry(name.clone()).or_default().extend(entries.clone());
        }
        merged
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.defaults.contains_key(section) || self.stored.contains_key(section)
    }

    pub fn section(&self, section: &str) -> Result<BTreeMap<String, String>, ConfigError> {
        self.sections().remove(section).ok_or_else(|| ConfigError::UnknownSection(section.to_string()))
    }

    pub fn get(&self, section: &str, key: &str) -> Result<String, ConfigError> {
        self.section(section)?
            .remove(key)
            .ok_or_else(|| ConfigError::UnknownKey { section: section.to_string(), key: key.to_string() })
    }

    /// Set one value in memory. The section must already exist; new keys
    /// within it are allowed.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) -> Result<(), ConfigError> {
        if !self.has_section(section) {
            return Err(ConfigError::UnknownSection(section.to_string()));
        }
        self.stored.entry(section.to_string()).or_default().insert(key.to_string(), value.into());
        Ok(())
    }

    /// Write stored values to disk, replacing the file atomically.
    pub fn persist(&self) -> Result<(), ConfigError> {
        let text = toml::to_string(&self.stored)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, text.as_bytes())?;
        std::fs::rename(&tmp_path, &self.path)?;
        info!(path = %self.path.display(), "config persisted");
        Ok(())
    }
}

fn defaults() -> Sections {
    DEFAULTS
        .iter()
        .map(|(section, entries)| {
            let entries = entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
            (section.to_string(), entries)
        })
        .collect()
}

/// Parse a TOML document. Non-string scalars are kept as their TOML text.
fn parse(text: &str) -> Result<Sections, ConfigError> {
    let table: toml::Table = text.parse()?;
    let mut sections = Sections::new();
    for (name, value) in table {
        let toml::Value::Table(entries) = value else {
            continue;
        };
        let entries = entries
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    toml::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect();
        sections.insert(name, entries);
    }
    Ok(sections)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
