// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Two views of one JSON value: a text buffer and a tree of typed controls.

mod node;
mod span_writer;
mod sync;

pub use node::{Tree, TreeNode, Widget, count_badge};
pub use span_writer::SpannedJson;
pub use sync::{JsonTreeSync, LeafInput, PaneKind};

use thiserror::Error;

use api_reflection::{ApiReflection, TypeKind};

use crate::path::{PathSegment, ValuePath};
use crate::validation::ValidationError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeEditError {
    #[error("The response pane is read-only")]
    ReadOnly,

    #[error("There is no valid value to edit")]
    NoValue,

    #[error("No value at '{0}'")]
    PathNotFound(ValuePath),

    #[error("'{0}' is not an array")]
    NotAnArray(ValuePath),

    #[error("'{0}' is not a map")]
    NotAMap(ValuePath),

    #[error("Invalid input for '{path}': {message}")]
    InvalidInput { path: ValuePath, message: String },

    #[error("already have '{0}'")]
    DuplicateKey(String),

    #[error("No sample is available for type '{0}'")]
    NoSample(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// The declared type name of the value at `path` under a root of type `root_type`.
pub fn type_name_at(api: &ApiReflection, root_type: &str, path: &ValuePath) -> Option<String> {
    let mut type_name = root_type.to_string();

    for segment in path.segments() {
        type_name = match (api.resolve(&type_name), segment) {
            (TypeKind::Struct(struct_name), PathSegment::Field(field_name)) => api
                .manifest()
                .struct_fields(struct_name)?
                .get(field_name)?
                .clone(),
            (TypeKind::Array(element_type), PathSegment::Index(_)) => element_type.clone(),
            (TypeKind::Map { value, .. }, PathSegment::Key(_)) => value.clone(),
            _ => return None,
        };
    }

    Some(type_name)
}
