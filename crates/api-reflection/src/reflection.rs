// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use elsa::sync::FrozenMap;

use crate::manifest::ReflectionManifest;
use crate::type_name::{TypeKind, classify, strip_optional};

/// The manifest together with a classification cache.
///
/// The manifest never changes after construction, so a classification computed once stays valid
/// for the lifetime of the session; the cache is insert-only.
pub struct ApiReflection {
    manifest: ReflectionManifest,
    classified: FrozenMap<String, Box<TypeKind>>,
}

impl ApiReflection {
    pub fn new(manifest: ReflectionManifest) -> Self {
        tracing::debug!(
            methods = manifest.methods.len(),
            types = manifest.types.len(),
            enums = manifest.enums.len(),
            "Loaded reflection manifest"
        );
        Self {
            manifest,
            classified: FrozenMap::new(),
        }
    }

    pub fn manifest(&self) -> &ReflectionManifest {
        &self.manifest
    }

    /// Classify `type_name`, peeling at most one optional marker (see [`classify`]).
    pub fn classify(&self, type_name: &str) -> &TypeKind {
        match self.classified.get(type_name) {
            Some(kind) => kind,
            None => self.classified.insert(
                type_name.to_string(),
                Box::new(classify(type_name, &self.manifest)),
            ),
        }
    }

    /// Classify `type_name` after stripping all of its optional markers.
    pub fn resolve(&self, type_name: &str) -> &TypeKind {
        self.classify(strip_optional(type_name))
    }
}

impl std::fmt::Debug for ApiReflection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiReflection")
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_name::PrimitiveType;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn cached_classification_matches_direct_classification() {
        let manifest = ReflectionManifest::new()
            .with_struct("Node", [("Next", "?Node")])
            .with_enum("Color", ["red"]);
        let api = ApiReflection::new(manifest.clone());

        for type_name in ["Node", "?Node", "Color", "[.int8]", "{.string:Node}", "Mystery"] {
            let first = api.classify(type_name).clone();
            assert_eq!(first, classify(type_name, &manifest));
            // a second lookup is served from the cache
            assert_eq!(api.classify(type_name), &first);
        }
    }

    #[multiplatform_test]
    fn resolve_strips_every_optional_marker() {
        let api = ApiReflection::new(ReflectionManifest::new());

        assert_eq!(
            api.resolve("???.uint16"),
            &TypeKind::Primitive(PrimitiveType::Uint16)
        );
        assert_eq!(
            api.classify("???.uint16"),
            &TypeKind::Optional("??.uint16".to_string())
        );
    }
}
