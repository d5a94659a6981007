// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! API reflection for swag.
//!
//! This crate provides types and utilities for:
//! - Reading the reflection manifest (methods, struct types, enums) emitted by the code generator
//! - Classifying the compact type-name grammar used throughout the manifest
//! - Caching classifications so every consumer shares one interpretation per type name
//!
//! # Example
//!
//! ```
//! use api_reflection::{ApiReflection, ReflectionManifest, TypeKind};
//!
//! let manifest = ReflectionManifest::from_json_str(
//!     r#"{"Methods":[{"Path":"createUser","In":"UserCreateReq","Out":"User"}],
//!         "Types":{"UserCreateReq":{"Name":".string","Age":".int32"}},
//!         "Enums":{}}"#,
//! )?;
//! let api = ApiReflection::new(manifest);
//!
//! assert!(matches!(api.classify("UserCreateReq"), TypeKind::Struct(_)));
//! ```

pub mod manifest;
pub mod reflection;
pub mod type_name;

pub use manifest::{ManifestError, ReflMethod, ReflectionManifest};
pub use reflection::ApiReflection;
pub use type_name::{PrimitiveType, TypeKind, classify, is_optional, strip_optional};
