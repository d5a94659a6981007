// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The reflection manifest: the generator's description of the API's methods and type graph.
//!
//! The manifest is read once and is immutable for the duration of a session.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field name to field type name, in declaration order.
pub type StructFields = IndexMap<String, String>;

/// The complete reflection manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReflectionManifest {
    /// All available RPC methods
    #[serde(default)]
    pub methods: Vec<ReflMethod>,
    /// Struct types, keyed by type name
    #[serde(default)]
    pub types: IndexMap<String, StructFields>,
    /// Enum types, keyed by type name, with their allowed values in order
    #[serde(default)]
    pub enums: IndexMap<String, Vec<String>>,
    /// Struct types backed by a database table (their identity and audit fields are server-assigned)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub db_structs: Vec<String>,
}

/// An RPC method: its path plus the type names of its payload and its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflMethod {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "In")]
    pub in_type: String,
    #[serde(rename = "Out")]
    pub out_type: String,
}

impl ReflMethod {
    pub fn new(
        path: impl Into<String>,
        in_type: impl Into<String>,
        out_type: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            in_type: in_type.into(),
            out_type: out_type.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed manifest: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ReflectionManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let json = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_method(mut self, method: ReflMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_struct<'a>(
        mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let fields = fields
            .into_iter()
            .map(|(field, type_name)| (field.to_string(), type_name.to_string()))
            .collect();
        self.types.insert(name.into(), fields);
        self
    }

    pub fn with_enum<'a>(
        mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.enums.insert(
            name.into(),
            members.into_iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    pub fn with_db_struct(mut self, name: impl Into<String>) -> Self {
        self.db_structs.push(name.into());
        self
    }

    pub fn method(&self, path: &str) -> Option<&ReflMethod> {
        self.methods.iter().find(|m| m.path == path)
    }

    pub fn struct_fields(&self, type_name: &str) -> Option<&StructFields> {
        self.types.get(type_name)
    }

    pub fn enum_members(&self, type_name: &str) -> Option<&[String]> {
        self.enums.get(type_name).map(|members| members.as_slice())
    }

    pub fn is_db_struct(&self, type_name: &str) -> bool {
        self.db_structs.iter().any(|name| name == type_name)
    }

    /// Whether any struct in the manifest declares a field with this name.
    pub fn has_field_named(&self, field_name: &str) -> bool {
        self.types
            .values()
            .any(|fields| fields.contains_key(field_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    const MANIFEST: &str = r#"{
        "Methods": [
            {"Path": "createUser", "In": "UserCreateReq", "Out": "User"},
            {"Path": "__/yo/db/User/createOne", "In": "User", "Out": "?.int64"}
        ],
        "Types": {
            "UserCreateReq": {"Name": ".string", "Age": ".int32"},
            "User": {"Id": ".int64", "Name": ".string", "Role": "Role", "Created": "?yo/db.DateTime"}
        },
        "Enums": {"Role": ["admin", "member"]},
        "DbStructs": ["User"]
    }"#;

    #[multiplatform_test]
    fn parses_generator_output() {
        let manifest = ReflectionManifest::from_json_str(MANIFEST).unwrap();

        assert_eq!(manifest.methods.len(), 2);
        assert_eq!(
            manifest.method("createUser"),
            Some(&ReflMethod::new("createUser", "UserCreateReq", "User"))
        );
        assert!(manifest.method("deleteUser").is_none());

        let fields: Vec<_> = manifest.struct_fields("User").unwrap().keys().collect();
        assert_eq!(fields, vec!["Id", "Name", "Role", "Created"]);

        assert_eq!(
            manifest.enum_members("Role"),
            Some(&["admin".to_string(), "member".to_string()][..])
        );
        assert!(manifest.is_db_struct("User"));
        assert!(!manifest.is_db_struct("UserCreateReq"));
    }

    #[multiplatform_test]
    fn missing_tables_default_to_empty() {
        let manifest = ReflectionManifest::from_json_str(r#"{"Methods": []}"#).unwrap();

        assert!(manifest.types.is_empty());
        assert!(manifest.enums.is_empty());
        assert!(manifest.db_structs.is_empty());
    }

    #[multiplatform_test]
    fn field_name_lookup_spans_all_structs() {
        let manifest = ReflectionManifest::from_json_str(MANIFEST).unwrap();

        assert!(manifest.has_field_named("Age"));
        assert!(manifest.has_field_named("Created"));
        assert!(!manifest.has_field_named("Email"));
    }

    #[multiplatform_test]
    fn malformed_manifest() {
        let err = ReflectionManifest::from_json_str(r#"{"Methods": 3}"#).unwrap_err();
        assert!(matches!(err, ManifestError::Malformed(_)));
    }
}
