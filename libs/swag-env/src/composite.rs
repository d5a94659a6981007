// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::Environment;
use std::sync::Arc;

/// Layers several environments; the first one that knows a key wins.
pub struct CompositeEnvironment {
    // Underlying environments in order of precedence (first is highest precedence)
    envs: Vec<Arc<dyn Environment>>,
}

impl Environment for CompositeEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        self.envs.iter().find_map(|e| e.get(key))
    }
}

impl CompositeEnvironment {
    pub fn new(envs: Vec<Arc<dyn Environment>>) -> Self {
        Self { envs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MapEnvironment;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn first_environment_wins() {
        let flags = MapEnvironment::from([("SWAG_MANIFEST", "flag.json")]);
        let file = MapEnvironment::from([
            ("SWAG_MANIFEST", "file.json"),
            ("SWAG_API_BASE_URL", "http://localhost:8080"),
        ]);

        let env = CompositeEnvironment::new(vec![Arc::new(flags), Arc::new(file)]);

        assert_eq!(env.get("SWAG_MANIFEST").as_deref(), Some("flag.json"));
        assert_eq!(
            env.get("SWAG_API_BASE_URL").as_deref(),
            Some("http://localhost:8080")
        );
        assert_eq!(env.get("SWAG_LOG"), None);
    }
}
