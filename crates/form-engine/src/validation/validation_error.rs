// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::path::ValuePath;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationErrorKind {
    /// A caller passed no value at all, which is a bug on the caller's side.
    #[error("new bug, value being undefined")]
    UndefinedValue,

    #[error("{message}")]
    MalformedJson {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("must be non-empty string or null")]
    EmptyDateTime,

    #[error("must be a parseable date-time, not '{0}'")]
    UnparseableDateTime(String),

    #[error("'{type_name}' has no '{value}' but has '{}'", .members.join("', '"))]
    UnknownEnumMember {
        type_name: String,
        value: String,
        members: Vec<String>,
    },

    #[error("must be {expected}, not {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("must be null or {expected}, not {actual}")]
    NullOrTypeMismatch { expected: String, actual: String },

    #[error("'{type_name}' has no '{field}'{}", known_fields_suffix(.known_fields))]
    UnknownField {
        type_name: String,
        field: String,
        known_fields: Vec<String>,
    },
}

fn known_fields_suffix(known_fields: &[String]) -> String {
    if known_fields.is_empty() {
        " field".to_string()
    } else {
        format!(" but has: '{}'", known_fields.join("' and '"))
    }
}

/// A structural diagnostic: what is wrong and where.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub path: ValuePath,
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(path: &ValuePath, kind: ValidationErrorKind) -> Self {
        Self {
            path: path.clone(),
            kind,
        }
    }

    /// Line and column (both 1-based) of a JSON syntax error.
    pub fn position(&self) -> Option<(usize, usize)> {
        match &self.kind {
            ValidationErrorKind::MalformedJson { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.path.is_root() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.path, self.kind)
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<serde_json::Error> for ValidationErrorKind {
    fn from(error: serde_json::Error) -> Self {
        ValidationErrorKind::MalformedJson {
            message: error.to_string(),
            line: error.line(),
            column: error.column(),
        }
    }
}

/// Render a validation outcome the way the form shows it: `(all ok)` when accepted.
pub fn outcome_message<T>(outcome: &Result<T, ValidationError>) -> String {
    match outcome {
        Ok(_) => "(all ok)".to_string(),
        Err(error) => error.to_string().replace('\n', " "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn messages() {
        let path = ValuePath::root().field("Role");

        let error = ValidationError::new(
            &path,
            ValidationErrorKind::UnknownEnumMember {
                type_name: "Role".to_string(),
                value: "owner".to_string(),
                members: vec!["admin".to_string(), "member".to_string()],
            },
        );
        assert_eq!(
            error.to_string(),
            "Role: 'Role' has no 'owner' but has 'admin', 'member'"
        );

        let error = ValidationError::new(
            &ValuePath::root().field("Nick"),
            ValidationErrorKind::UnknownField {
                type_name: "User".to_string(),
                field: "Nick".to_string(),
                known_fields: vec!["Name".to_string(), "Age".to_string()],
            },
        );
        assert_eq!(
            error.to_string(),
            "Nick: 'User' has no 'Nick' but has: 'Name' and 'Age'"
        );

        let error = ValidationError::new(
            &ValuePath::root().field("X"),
            ValidationErrorKind::UnknownField {
                type_name: "Empty".to_string(),
                field: "X".to_string(),
                known_fields: vec![],
            },
        );
        assert_eq!(error.to_string(), "X: 'Empty' has no 'X' field");
    }

    #[multiplatform_test]
    fn root_errors_have_no_path_prefix() {
        let error = ValidationError::new(
            &ValuePath::root(),
            ValidationErrorKind::NullOrTypeMismatch {
                expected: "User".to_string(),
                actual: "3".to_string(),
            },
        );
        assert_eq!(error.to_string(), "must be null or User, not 3");
    }

    #[multiplatform_test]
    fn json_errors_keep_their_position() {
        let parse_error = serde_json::from_str::<serde_json::Value>("{\n  \"a\": }").unwrap_err();
        let error = ValidationError::new(&ValuePath::root(), parse_error.into());

        assert_eq!(error.position(), Some((2, 8)));
        assert!(outcome_message::<()>(&Err(error)).starts_with("expected value"));
        assert_eq!(outcome_message(&Ok::<_, ValidationError>(())), "(all ok)");
    }
}
