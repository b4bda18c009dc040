// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use smartfinance::config::{
    AppConfig, ConfigError, DEFAULT_ADVICE_ENDPOINT, DEFAULT_ADVICE_MODEL, StoreConfig,
};
use std::collections::HashMap;
use std::path::PathBuf;

fn config_from(vars: &[(&str, &str)]) -> AppConfig {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_lookup(|key| map.get(key).cloned())
}

#[test]
fn empty_environment_means_demo_and_no_advice() {
    assert_eq!(config_from(&[]), AppConfig::default());
}

#[test]
fn store_config_is_parsed() {
    let cfg = config_from(&[(
        "STORE_CONFIG",
        r#"{"apiKey":"k-1","databasePath":"/tmp/sf.sqlite","projectId":"demo"}"#,
    )]);
    let store = cfg.store.unwrap();
    assert_eq!(store.api_key, "k-1");
    assert_eq!(store.database_path, Some(PathBuf::from("/tmp/sf.sqlite")));
}

#[test]
fn malformed_or_keyless_store_config_is_ignored() {
    assert!(config_from(&[("STORE_CONFIG", "{not json")]).store.is_none());
    assert!(config_from(&[("STORE_CONFIG", r#"{"apiKey":"  "}"#)]).store.is_none());
    assert!(config_from(&[("STORE_CONFIG", "   ")]).store.is_none());

    assert!(matches!(
        StoreConfig::parse("42"),
        Err(ConfigError::Malformed(_))
    ));
    assert!(matches!(
        StoreConfig::parse(r#"{"databasePath":"x"}"#),
        Err(ConfigError::MissingAccessKey)
    ));
}

#[test]
fn advice_uses_defaults_unless_overridden() {
    let cfg = config_from(&[("API_KEY", " secret ")]);
    let advice = cfg.advice.unwrap();
    assert_eq!(advice.api_key, "secret");
    assert_eq!(advice.model, DEFAULT_ADVICE_MODEL);
    assert_eq!(advice.endpoint, DEFAULT_ADVICE_ENDPOINT);

    let cfg = config_from(&[
        ("API_KEY", "secret"),
        ("ADVICE_MODEL", "gemini-2.5-flash"),
        ("ADVICE_ENDPOINT", "http://localhost:8080/v1beta"),
    ]);
    let advice = cfg.advice.unwrap();
    assert_eq!(advice.model, "gemini-2.5-flash");
    assert_eq!(advice.endpoint, "http://localhost:8080/v1beta");
}

#[test]
fn blank_api_key_disables_advice() {
    assert!(config_from(&[("API_KEY", "")]).advice.is_none());
}
