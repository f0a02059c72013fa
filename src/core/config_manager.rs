// src/core/config_manager.rs
//! Env-file backed credential store for the dashboard session.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_UPSTREAM_URL: &str = "https://hiring.base.vn/publicapi/v2";
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000";

/// Keys the dashboard manages through its config form. Anything else found
/// in the file is preserved untouched on save.
const MANAGED_KEYS: [&str; 4] = ["ACCESS_TOKEN", "OPENING_ID", "STAGE_ID", "NUM_PER_PAGE"];

/// Key/value configuration persisted in an env file, read at session start
/// and re-read immediately after every save.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl ConfigManager {
    /// Load the env file. A missing file is a fresh session, not an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut values = BTreeMap::new();

        if path.exists() {
            let entries = dotenvy::from_path_iter(&path)
                .with_context(|| format!("Failed to read env file: {}", path.display()))?;
            for entry in entries {
                let (key, value) =
                    entry.with_context(|| format!("Malformed entry in {}", path.display()))?;
                values.insert(key, value);
            }
            info!(
                "Loaded {} config values from {}",
                values.len(),
                path.display()
            );
        }

        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_exists(&self) -> bool {
        self.path.exists()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn access_token(&self) -> &str {
        self.get("ACCESS_TOKEN").unwrap_or_default()
    }

    pub fn opening_id(&self) -> &str {
        self.get("OPENING_ID").unwrap_or_default()
    }

    pub fn stage_id(&self) -> &str {
        self.get("STAGE_ID").unwrap_or_default()
    }

    /// NUM_PER_PAGE with the documented defaulting: absent or non-numeric
    /// falls back to 50, anything else clamps into 1..=100.
    pub fn default_page_size(&self) -> u32 {
        match self.get("NUM_PER_PAGE").map(str::trim) {
            Some(raw) if !raw.is_empty() => match raw.parse::<i64>() {
                Ok(value) => value.clamp(1, 100) as u32,
                Err(_) => DEFAULT_PAGE_SIZE,
            },
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    pub fn upstream_url(&self) -> String {
        self.get("UPSTREAM_API_URL")
            .map(str::to_string)
            .or_else(|| std::env::var("UPSTREAM_API_URL").ok())
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string())
    }

    pub fn relay_url(&self) -> String {
        self.get("RELAY_URL")
            .map(str::to_string)
            .or_else(|| std::env::var("RELAY_URL").ok())
            .unwrap_or_else(|| DEFAULT_RELAY_URL.to_string())
    }

    /// Overwrite the managed keys, rewrite the file, then re-read it so the
    /// in-memory view always matches what landed on disk.
    pub fn save(&mut self, updates: &BTreeMap<String, String>) -> Result<()> {
        for key in MANAGED_KEYS {
            if let Some(value) = updates.get(key) {
                self.values.insert(key.to_string(), value.clone());
            }
        }

        let mut contents = String::new();
        for (key, value) in &self.values {
            contents.push_str(&format!("{}={}\n", key, quote_env_value(value)));
        }
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write env file: {}", self.path.display()))?;

        *self = Self::load(self.path.clone())?;
        info!("Saved config to {}", self.path.display());
        Ok(())
    }
}

/// Quote values the plain KEY=value form cannot carry.
fn quote_env_value(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '#' || c == '"' || c == '\'');
    if needs_quoting {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
