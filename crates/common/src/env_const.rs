// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::PathBuf;

use swag_env::{EnvError, Environment, get_parsed};

pub const SWAG_LOG: &str = "SWAG_LOG";

pub const SWAG_MANIFEST: &str = "SWAG_MANIFEST";
pub const SWAG_API_BASE_URL: &str = "SWAG_API_BASE_URL";

pub const SWAG_REQUEST_TIMEOUT_MS: &str = "SWAG_REQUEST_TIMEOUT_MS";
pub const SWAG_MAX_PAYLOAD_MB: &str = "SWAG_MAX_PAYLOAD_MB"; // 0 means unlimited

pub const SWAG_HISTORY_FILE: &str = "SWAG_HISTORY_FILE";
pub const SWAG_HISTORY_CAPACITY_KB: &str = "SWAG_HISTORY_CAPACITY_KB";

pub const DEFAULT_MANIFEST: &str = "yo-refl.json";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 4321;
pub const DEFAULT_MAX_PAYLOAD_MB: u64 = 0;
pub const DEFAULT_HISTORY_FILE: &str = ".swag/history.json";
/// Roughly what browsers grant a page's local storage.
pub const DEFAULT_HISTORY_CAPACITY_KB: usize = 5 * 1024;

pub fn get_manifest_path(env: &dyn Environment) -> PathBuf {
    PathBuf::from(env.get_or_else(SWAG_MANIFEST, DEFAULT_MANIFEST))
}

pub fn get_api_base_url(env: &dyn Environment) -> String {
    env.get_or_else(SWAG_API_BASE_URL, DEFAULT_API_BASE_URL)
}

pub fn get_request_timeout_ms(env: &dyn Environment) -> Result<u64, EnvError> {
    get_parsed(env, SWAG_REQUEST_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS)
}

pub fn get_max_payload_mb(env: &dyn Environment) -> Result<u64, EnvError> {
    get_parsed(env, SWAG_MAX_PAYLOAD_MB, DEFAULT_MAX_PAYLOAD_MB)
}

pub fn get_history_file(env: &dyn Environment) -> PathBuf {
    PathBuf::from(env.get_or_else(SWAG_HISTORY_FILE, DEFAULT_HISTORY_FILE))
}

/// The history capacity in bytes. `0` disables the limit.
pub fn get_history_capacity(env: &dyn Environment) -> Result<Option<usize>, EnvError> {
    let kb = get_parsed(env, SWAG_HISTORY_CAPACITY_KB, DEFAULT_HISTORY_CAPACITY_KB)?;
    Ok((kb > 0).then(|| kb * 1024))
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;
    use swag_env::MapEnvironment;

    #[multiplatform_test]
    fn defaults() {
        let env = MapEnvironment::from([("UNRELATED", "1")]);

        assert_eq!(get_manifest_path(&env), PathBuf::from("yo-refl.json"));
        assert_eq!(get_api_base_url(&env), "http://localhost:8080");
        assert_eq!(get_request_timeout_ms(&env).unwrap(), 4321);
        assert_eq!(get_max_payload_mb(&env).unwrap(), 0);
        assert_eq!(get_history_capacity(&env).unwrap(), Some(5 * 1024 * 1024));
    }

    #[multiplatform_test]
    fn overrides() {
        let env = MapEnvironment::from([
            (SWAG_REQUEST_TIMEOUT_MS, "100"),
            (SWAG_HISTORY_CAPACITY_KB, "0"),
            (SWAG_MAX_PAYLOAD_MB, "lots"),
        ]);

        assert_eq!(get_request_timeout_ms(&env).unwrap(), 100);
        assert_eq!(get_history_capacity(&env).unwrap(), None);
        assert!(matches!(
            get_max_payload_mb(&env),
            Err(EnvError::InvalidValue { .. })
        ));
    }
}
