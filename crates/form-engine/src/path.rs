// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Paths into a JSON value: struct fields, array indices and map keys.
//!
//! Displayed as `Friends[0].Name` or `Scores["math"]`; the root path displays as the empty string.

use std::fmt::{Display, Formatter};

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Field(String),
    Index(usize),
    Key(String),
}

impl PathSegment {
    /// Tree label for the segment: `.Name`, `[0]` or `["key"]`.
    pub fn label(&self) -> String {
        match self {
            PathSegment::Field(name) => format!(".{name}"),
            _ => self.to_string(),
        }
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Field(name) => f.write_str(name),
            PathSegment::Index(index) => write!(f, "[{index}]"),
            PathSegment::Key(key) => write!(f, "[{}]", Value::String(key.clone())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValuePath(Vec<PathSegment>);

impl ValuePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    pub fn field(&self, name: &str) -> Self {
        self.child(PathSegment::Field(name.to_string()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    pub fn key(&self, key: &str) -> Self {
        self.child(PathSegment::Key(key.to_string()))
    }

    /// The parent path and the last segment, or `None` for the root.
    pub fn split_last(&self) -> Option<(ValuePath, &PathSegment)> {
        self.0
            .split_last()
            .map(|(last, parent)| (ValuePath(parent.to_vec()), last))
    }

    /// The name under which string values at this path are remembered for autocompletion: the
    /// nearest struct field name, skipping array indices and map keys.
    pub fn autocomplete_name(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|segment| match segment {
            PathSegment::Field(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn lookup<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.0
            .iter()
            .try_fold(root, |value, segment| match (segment, value) {
                (PathSegment::Field(name) | PathSegment::Key(name), Value::Object(map)) => {
                    map.get(name)
                }
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
                _ => None,
            })
    }

    pub fn lookup_mut<'v>(&self, root: &'v mut Value) -> Option<&'v mut Value> {
        self.0
            .iter()
            .try_fold(root, |value, segment| match (segment, value) {
                (PathSegment::Field(name) | PathSegment::Key(name), Value::Object(map)) => {
                    map.get_mut(name)
                }
                (PathSegment::Index(index), Value::Array(items)) => items.get_mut(*index),
                _ => None,
            })
    }
}

impl Display for ValuePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (position, segment) in self.0.iter().enumerate() {
            if position > 0 && matches!(segment, PathSegment::Field(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
