// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

//! Settings for tools embedding the store.
//!
//! Loaded from the TOML file named by the `ROMHOARD_CONFIG` environment
//! variable, falling back to `romhoard.toml` in the working directory,
//! falling back to defaults.

use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

fn default_store_path() -> PathBuf {
    PathBuf::from("catalog.db")
}

/// Errors while loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    TomlParse(#[from] toml::de::Error),
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Catalog XML to ingest when the store is (re)built.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Store file queried by default.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Whether ingest may replace an existing store file.
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            catalog_path: None,
            store_path: default_store_path(),
            overwrite: false,
        }
    }
}

impl Config {
    /// Load settings from a specific file.
    pub fn load(settings_file: &Path) -> Result<Config, ConfigError> {
        let raw = read_to_string(settings_file).map_err(|e| ConfigError::ReadFile {
            path: settings_file.to_owned(),
            source: e,
        })?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Load settings from the environment-selected file, if any.
pub fn load() -> Result<Config, ConfigError> {
    match std::env::var("ROMHOARD_CONFIG") {
        Ok(settings_file) => Config::load(Path::new(&settings_file)),
        Err(_) => {
            if Path::new("romhoard.toml").exists() {
                Config::load(Path::new("romhoard.toml"))
            } else {
                Ok(Config::default())
            }
        }
    }
}
