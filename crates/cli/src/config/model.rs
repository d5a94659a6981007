// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::PathBuf;

use common::env_const::{
    SWAG_API_BASE_URL, SWAG_HISTORY_CAPACITY_KB, SWAG_HISTORY_FILE, SWAG_MANIFEST,
    SWAG_MAX_PAYLOAD_MB, SWAG_REQUEST_TIMEOUT_MS,
};
use swag_env::MapEnvironment;
use url::Url;

#[derive(Debug, PartialEq, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, PartialEq, Default)]
pub struct ApiConfig {
    pub manifest: Option<PathBuf>,
    pub base_url: Option<Url>,
    pub timeout_ms: Option<u64>,
    pub max_payload_mb: Option<u64>,
}

#[derive(Debug, PartialEq, Default)]
pub struct HistoryConfig {
    pub file: Option<PathBuf>,
    pub capacity_kb: Option<usize>,
}

impl Config {
    /// The configured values under the environment variable names they stand in for, so that
    /// they can be layered below the process environment.
    pub fn environment(&self) -> MapEnvironment {
        let mut env = MapEnvironment::new();

        env.set_opt(
            SWAG_MANIFEST,
            self.api.manifest.as_ref().map(|path| path.display()),
        );
        env.set_opt(SWAG_API_BASE_URL, self.api.base_url.as_ref());
        env.set_opt(SWAG_REQUEST_TIMEOUT_MS, self.api.timeout_ms);
        env.set_opt(SWAG_MAX_PAYLOAD_MB, self.api.max_payload_mb);

        env.set_opt(
            SWAG_HISTORY_FILE,
            self.history.file.as_ref().map(|path| path.display()),
        );
        env.set_opt(SWAG_HISTORY_CAPACITY_KB, self.history.capacity_kb);

        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swag_env::Environment;

    #[test]
    fn environment_holds_only_configured_values() {
        let config = Config {
            api: ApiConfig {
                base_url: Some(Url::parse("https://api.example.com/").unwrap()),
                timeout_ms: Some(1000),
                ..Default::default()
            },
            history: HistoryConfig::default(),
        };

        let env = config.environment();

        assert_eq!(
            env.get(SWAG_API_BASE_URL).as_deref(),
            Some("https://api.example.com/")
        );
        assert_eq!(env.get(SWAG_REQUEST_TIMEOUT_MS).as_deref(), Some("1000"));
        assert_eq!(env.get(SWAG_MANIFEST), None);
        assert!(Config::default().environment().is_empty());
    }
}
