// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use serde::Deserialize;
use url::Url;

use super::model::{ApiConfig, Config, HistoryConfig};

const CONFIG_FILE: &str = "swag.toml";

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigSer {
    pub api: Option<ApiSer>,
    pub history: Option<HistorySer>,
}

#[derive(Deserialize, Debug, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ApiSer {
    pub manifest: Option<PathBuf>,
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: Option<u64>,
    #[serde(rename = "max-payload-mb")]
    pub max_payload_mb: Option<u64>,
}

#[derive(Deserialize, Debug, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct HistorySer {
    pub file: Option<PathBuf>,
    #[serde(rename = "capacity-kb")]
    pub capacity_kb: Option<usize>,
}

impl TryFrom<ConfigSer> for Config {
    type Error = anyhow::Error;

    fn try_from(config: ConfigSer) -> Result<Self, Self::Error> {
        Ok(Config {
            api: config
                .api
                .map(ApiConfig::try_from)
                .transpose()?
                .unwrap_or_default(),
            history: config
                .history
                .map(HistoryConfig::try_from)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

impl TryFrom<ApiSer> for ApiConfig {
    type Error = anyhow::Error;

    fn try_from(config: ApiSer) -> Result<Self, Self::Error> {
        let base_url = config
            .base_url
            .map(|base_url| {
                Url::parse(&base_url).map_err(|e| anyhow!("Invalid base-url '{base_url}': {e}"))
            })
            .transpose()?;

        if config.timeout_ms == Some(0) {
            return Err(anyhow!("timeout-ms must be greater than 0"));
        }

        Ok(ApiConfig {
            manifest: config.manifest,
            base_url,
            timeout_ms: config.timeout_ms,
            max_payload_mb: config.max_payload_mb,
        })
    }
}

impl TryFrom<HistorySer> for HistoryConfig {
    type Error = anyhow::Error;

    fn try_from(config: HistorySer) -> Result<Self, Self::Error> {
        Ok(HistoryConfig {
            file: config.file,
            capacity_kb: config.capacity_kb,
        })
    }
}

fn load_config_from_file(path: &Path) -> Result<Config> {
    let toml_str = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read file '{}': {}", path.display(), e))?;
    let config: ConfigSer = toml::from_str(&toml_str)
        .map_err(|e| anyhow!("Failed to parse TOML file '{}': {}", path.display(), e))?;

    config.try_into()
}

/// Load `swag.toml` from the working directory; without one, everything is left to the
/// environment and the built-in defaults.
pub fn load_config() -> Result<Config> {
    let config_path = Path::new(CONFIG_FILE);

    if !config_path.exists() {
        return Ok(Config::default());
    }

    load_config_from_file(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_test_config(name: &str) -> Result<Config> {
        let test_configs_dir =
            Path::new(env!("CARGO_MANIFEST_DIR")).join("src/config/test-configs");
        let file_path = test_configs_dir.join(format!("{name}.toml"));
        load_config_from_file(&file_path)
    }

    #[test]
    fn test_load_empty_config() {
        let config = load_test_config("empty").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_full_config() {
        let config = load_test_config("full").unwrap();
        assert_eq!(
            config,
            Config {
                api: ApiConfig {
                    manifest: Some(PathBuf::from("api/yo-refl.json")),
                    base_url: Some(Url::parse("http://localhost:3000/api").unwrap()),
                    timeout_ms: Some(10000),
                    max_payload_mb: Some(4),
                },
                history: HistoryConfig {
                    file: Some(PathBuf::from(".swag/history.json")),
                    capacity_kb: Some(256),
                },
            }
        );
    }

    #[test]
    fn test_unknown_field() {
        let error = load_test_config("unknown-field").unwrap_err();
        assert!(error.to_string().contains("unknown field `timeout`"));
    }

    #[test]
    fn test_invalid_base_url() {
        let error = load_test_config("bad-url").unwrap_err();
        assert!(error.to_string().starts_with("Invalid base-url 'localhost api'"));
    }
}
