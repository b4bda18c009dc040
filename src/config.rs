// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime configuration read from the environment (and an optional `.env`).
//!
//! Nothing here is fatal: a missing or malformed store configuration means the
//! program runs in demo mode, and a missing AI credential disables advice.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

pub const STORE_CONFIG_VAR: &str = "STORE_CONFIG";
pub const API_KEY_VAR: &str = "API_KEY";
pub const ADVICE_MODEL_VAR: &str = "ADVICE_MODEL";
pub const ADVICE_ENDPOINT_VAR: &str = "ADVICE_ENDPOINT";

pub const DEFAULT_ADVICE_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_ADVICE_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("store configuration is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("store configuration has no apiKey")]
    MissingAccessKey,
}

/// Connection settings for the document store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    #[serde(default)]
    pub api_key: String,
    pub database_path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let cfg: StoreConfig = serde_json::from_str(raw)?;
        if cfg.api_key.trim().is_empty() {
            return Err(ConfigError::MissingAccessKey);
        }
        Ok(cfg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub store: Option<StoreConfig>,
    pub advice: Option<AdviceConfig>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store = match non_blank(STORE_CONFIG_VAR) {
            None => {
                info!("no store configuration found, running in demo mode");
                None
            }
            Some(raw) => match StoreConfig::parse(&raw) {
                Ok(cfg) => Some(cfg),
                Err(err) => {
                    warn!(error = %err, "ignoring store configuration, falling back to demo mode");
                    None
                }
            },
        };

        let advice = non_blank(API_KEY_VAR).map(|api_key| AdviceConfig {
            api_key: api_key.trim().to_string(),
            model: non_blank(ADVICE_MODEL_VAR).unwrap_or_else(|| DEFAULT_ADVICE_MODEL.to_string()),
            endpoint: non_blank(ADVICE_ENDPOINT_VAR)
                .unwrap_or_else(|| DEFAULT_ADVICE_ENDPOINT.to_string()),
        });
        if advice.is_none() {
            info!("no AI credential configured, advice is disabled");
        }

        Self { store, advice }
    }
}
