// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::borrow::Cow;

use serde_json::{Map, Value};

use api_reflection::{ApiReflection, PrimitiveType, TypeKind, is_optional, strip_optional};

use crate::date_time::parse_date_time;
use crate::path::ValuePath;

use super::validation_error::{ValidationError, ValidationErrorKind};

/// Check JSON values against type names.
///
/// Validation either accepts a value, returning its normalized form (JSON-encoded strings
/// standing in for containers are decoded), or rejects it with the first offending path.
pub struct StructuralValidator<'a> {
    api: &'a ApiReflection,
}

impl<'a> StructuralValidator<'a> {
    pub fn new(api: &'a ApiReflection) -> Self {
        Self { api }
    }

    /// Validate a root value. A string standing in for a container type is decoded first.
    pub fn validate_value(&self, type_name: &str, value: &Value) -> Result<Value, ValidationError> {
        self.validate(type_name, Some(value), &ValuePath::root(), false)
            .map(Cow::into_owned)
    }

    /// Parse a text buffer and validate the result as a root value.
    pub fn validate_text(&self, type_name: &str, text: &str) -> Result<Value, ValidationError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|error| ValidationError::new(&ValuePath::root(), error.into()))?;
        self.validate_value(type_name, &value)
    }

    /// Validate a prospective key of the map type `map_type_name`. Non-map types accept any key.
    pub fn validate_map_key(&self, map_type_name: &str, key: &str) -> Result<(), ValidationError> {
        match self.api.resolve(map_type_name) {
            TypeKind::Map { key: key_type, .. } => self
                .validate(
                    key_type,
                    Some(&self.key_value(key_type, key)),
                    &ValuePath::root().key(key),
                    true,
                )
                .map(|_| ()),
            _ => Ok(()),
        }
    }

    /// Validate `value` (or its absence) against `type_name` at `path`.
    ///
    /// With `string_is_not_json` unset, a string value checked against a non-scalar type is taken
    /// to be the JSON encoding of the actual value.
    pub fn validate<'v>(
        &self,
        type_name: &str,
        value: Option<&'v Value>,
        path: &ValuePath,
        string_is_not_json: bool,
    ) -> Result<Cow<'v, Value>, ValidationError> {
        let error = |kind| ValidationError::new(path, kind);

        let Some(value) = value else {
            return Err(error(ValidationErrorKind::UndefinedValue));
        };

        let optional = is_optional(type_name);
        let type_name = strip_optional(type_name);

        match self.api.classify(type_name) {
            TypeKind::Optional(inner) => self.validate(inner, Some(value), path, string_is_not_json),
            TypeKind::DateTime => match value {
                Value::Null => Ok(Cow::Borrowed(value)),
                Value::String(text) if !text.is_empty() => {
                    if parse_date_time(text).is_some() {
                        Ok(Cow::Borrowed(value))
                    } else {
                        Err(error(ValidationErrorKind::UnparseableDateTime(
                            text.clone(),
                        )))
                    }
                }
                _ => Err(error(ValidationErrorKind::EmptyDateTime)),
            },
            TypeKind::Enum(enum_name) => {
                let members = self.api.manifest().enum_members(enum_name).unwrap_or(&[]);
                match value {
                    Value::Null => Ok(Cow::Borrowed(value)),
                    Value::String(text)
                        if text.is_empty() || members.is_empty() || members.contains(text) =>
                    {
                        Ok(Cow::Borrowed(value))
                    }
                    _ => Err(error(ValidationErrorKind::UnknownEnumMember {
                        type_name: enum_name.clone(),
                        value: display_value(value),
                        members: members.to_vec(),
                    })),
                }
            }
            TypeKind::Primitive(primitive) => {
                if value.is_null() && optional {
                    Ok(Cow::Borrowed(value))
                } else {
                    check_primitive(*primitive, value)
                        .map(|_| Cow::Borrowed(value))
                        .map_err(error)
                }
            }
            TypeKind::Array(element_type) => {
                let value = decode_json_string(value, string_is_not_json, path)?;
                match value.as_ref() {
                    Value::Null => {}
                    Value::Array(items) => {
                        for (index, item) in items.iter().enumerate() {
                            // A null item is an unchecked slot
                            if !item.is_null() {
                                self.validate(element_type, Some(item), &path.index(index), true)?;
                            }
                        }
                    }
                    other => return Err(error(null_or_mismatch(type_name, other))),
                }
                Ok(value)
            }
            TypeKind::Map {
                key: key_type,
                value: value_type,
            } => {
                let value = decode_json_string(value, string_is_not_json, path)?;
                match value.as_ref() {
                    Value::Null => {}
                    Value::Object(entries) => {
                        for (key, entry) in entries {
                            let entry_path = path.key(key);
                            self.validate(
                                key_type,
                                Some(&self.key_value(key_type, key)),
                                &entry_path,
                                true,
                            )?;
                            self.validate(value_type, Some(entry), &entry_path, true)?;
                        }
                    }
                    other => return Err(error(null_or_mismatch(type_name, other))),
                }
                Ok(value)
            }
            TypeKind::Struct(struct_name) => {
                let value = decode_json_string(value, string_is_not_json, path)?;
                match value.as_ref() {
                    Value::Null => {}
                    Value::Object(fields) => self.validate_fields(struct_name, fields, path)?,
                    other => return Err(error(null_or_mismatch(type_name, other))),
                }
                Ok(value)
            }
            // No structural check applies to a type the manifest does not describe
            TypeKind::Unknown(_) => Ok(Cow::Borrowed(value)),
        }
    }

    /// JSON object keys are strings; keys of numeric and boolean key types are read as literals.
    fn key_value(&self, key_type: &str, key: &str) -> Value {
        match self.api.resolve(key_type) {
            TypeKind::Primitive(primitive) if *primitive != PrimitiveType::String => {
                serde_json::from_str(key).unwrap_or_else(|_| Value::String(key.to_string()))
            }
            _ => Value::String(key.to_string()),
        }
    }

    fn validate_fields(
        &self,
        struct_name: &str,
        fields: &Map<String, Value>,
        path: &ValuePath,
    ) -> Result<(), ValidationError> {
        let declared = self.api.manifest().struct_fields(struct_name);

        for (field_name, field_value) in fields {
            let field_path = path.field(field_name);
            match declared.and_then(|declared| declared.get(field_name)) {
                Some(field_type) => {
                    self.validate(field_type, Some(field_value), &field_path, true)?;
                }
                None => {
                    return Err(ValidationError::new(
                        &field_path,
                        ValidationErrorKind::UnknownField {
                            type_name: struct_name.to_string(),
                            field: field_name.clone(),
                            known_fields: declared
                                .map(|declared| declared.keys().cloned().collect())
                                .unwrap_or_default(),
                        },
                    ));
                }
            }
        }
        Ok(())
    }
}

fn decode_json_string<'v>(
    value: &'v Value,
    string_is_not_json: bool,
    path: &ValuePath,
) -> Result<Cow<'v, Value>, ValidationError> {
    match value {
        Value::String(text) if !string_is_not_json => serde_json::from_str(text)
            .map(Cow::Owned)
            .map_err(|error| ValidationError::new(path, error.into())),
        _ => Ok(Cow::Borrowed(value)),
    }
}

fn check_primitive(primitive: PrimitiveType, value: &Value) -> Result<(), ValidationErrorKind> {
    let mismatch = |expected: &str| ValidationErrorKind::TypeMismatch {
        expected: expected.to_string(),
        actual: display_value(value),
    };

    match primitive {
        PrimitiveType::Bool => match value {
            Value::Bool(_) => Ok(()),
            _ => Err(mismatch("true or false")),
        },
        PrimitiveType::String => match value {
            Value::String(_) => Ok(()),
            _ => Err(mismatch("string")),
        },
        _ => {
            let in_range = match (value, primitive.numeric_limits()) {
                (Value::Number(number), Some((min, max))) => {
                    if primitive.is_integer() {
                        integral_value(number)
                            .is_some_and(|n| (min as i64..=max as i64).contains(&n))
                    } else {
                        number
                            .as_f64()
                            .is_some_and(|n| n.is_finite() && (min..=max).contains(&n))
                    }
                }
                _ => false,
            };

            if in_range {
                Ok(())
            } else {
                Err(mismatch(primitive.tag()))
            }
        }
    }
}

/// The value of an integral JSON number, or `None` when it has a fractional part or exceeds the
/// `i64` range (which is wider than every supported width).
fn integral_value(number: &serde_json::Number) -> Option<i64> {
    if let Some(n) = number.as_i64() {
        return Some(n);
    }
    if number.is_u64() {
        return None;
    }
    number
        .as_f64()
        .filter(|n| n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64)
        .map(|n| n as i64)
}

fn null_or_mismatch(type_name: &str, value: &Value) -> ValidationErrorKind {
    ValidationErrorKind::NullOrTypeMismatch {
        expected: type_name.to_string(),
        actual: display_value(value),
    }
}

/// Render an offending value for a diagnostic: strings verbatim, containers elided.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(_) => "[...]".to_string(),
        Value::Object(_) => "{...}".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_reflection::ReflectionManifest;
    use multiplatform_test::multiplatform_test;
    use serde_json::json;

    fn api() -> ApiReflection {
        ApiReflection::new(
            ReflectionManifest::new()
                .with_struct(
                    "User",
                    [
                        ("Name", ".string"),
                        ("Age", ".int32"),
                        ("Role", "?Role"),
                        ("Friends", "?[User]"),
                        ("Scores", "{.string:.float64}"),
                        ("Born", "?time.Time"),
                    ],
                )
                .with_struct("Empty", [])
                .with_enum("Role", ["admin", "member"]),
        )
    }

    fn check(api: &ApiReflection, type_name: &str, value: Value) -> Result<Value, String> {
        StructuralValidator::new(api)
            .validate_value(type_name, &value)
            .map_err(|error| error.to_string())
    }

    #[multiplatform_test]
    fn integer_widths() {
        let api = api();

        assert!(check(&api, ".int8", json!(127)).is_ok());
        assert!(check(&api, ".int8", json!(-128)).is_ok());
        assert_eq!(
            check(&api, ".int8", json!(128)),
            Err("must be .int8, not 128".to_string())
        );
        assert_eq!(
            check(&api, ".uint8", json!(-1)),
            Err("must be .uint8, not -1".to_string())
        );
        assert!(check(&api, ".uint32", json!(4294967295u64)).is_ok());
        assert!(check(&api, ".int64", json!(9007199254740991i64)).is_ok());
        assert!(check(&api, ".int64", json!(9007199254740992i64)).is_err());
        assert!(check(&api, ".uint64", json!(u64::MAX)).is_err());
        // integral floats count as integers, fractional ones do not
        assert!(check(&api, ".int16", json!(12.0)).is_ok());
        assert!(check(&api, ".int16", json!(12.5)).is_err());
        assert!(check(&api, ".int16", json!("12")).is_err());
    }

    #[multiplatform_test]
    fn floats_and_scalars() {
        let api = api();

        assert!(check(&api, ".float32", json!(3.25)).is_ok());
        assert!(check(&api, ".float64", json!(-1e15)).is_ok());
        assert!(check(&api, ".float64", json!(1e300)).is_err());
        assert_eq!(
            check(&api, ".bool", json!(1)),
            Err("must be true or false, not 1".to_string())
        );
        assert_eq!(
            check(&api, ".string", json!(false)),
            Err("must be string, not false".to_string())
        );
    }

    #[multiplatform_test]
    fn null_is_only_accepted_for_optional_scalars() {
        let api = api();

        assert_eq!(
            check(&api, ".int32", Value::Null),
            Err("must be .int32, not null".to_string())
        );
        assert!(check(&api, "?.int32", Value::Null).is_ok());
        assert!(check(&api, "??.string", Value::Null).is_ok());
        assert!(check(&api, "time.Time", Value::Null).is_ok());
        assert!(check(&api, "Role", Value::Null).is_ok());
        assert!(check(&api, "User", Value::Null).is_ok());
        assert!(check(&api, "[.int8]", Value::Null).is_ok());
    }

    #[multiplatform_test]
    fn array_slots_may_be_null() {
        let api = api();

        assert_eq!(
            check(&api, "[.string]", json!([null, "b"])),
            Ok(json!([null, "b"]))
        );
        assert!(check(&api, "[.int32]", json!([1, null, 3])).is_ok());
        assert!(check(&api, "[[.int8]]", json!([[null], null])).is_ok());
        assert_eq!(
            check(&api, "[.int32]", json!([null, "x"])),
            Err("[1]: must be .int32, not x".to_string())
        );
    }

    #[multiplatform_test]
    fn date_times() {
        let api = api();

        assert!(check(&api, "yo/db.DateTime", json!("2024-03-01T09:30:00Z")).is_ok());
        assert_eq!(
            check(&api, "time.Time", json!("")),
            Err("must be non-empty string or null".to_string())
        );
        assert_eq!(
            check(&api, "time.Time", json!(17)),
            Err("must be non-empty string or null".to_string())
        );
        assert_eq!(
            check(&api, "time.Time", json!("soon")),
            Err("must be a parseable date-time, not 'soon'".to_string())
        );
    }

    #[multiplatform_test]
    fn enums() {
        let api = api();

        assert!(check(&api, "Role", json!("admin")).is_ok());
        assert!(check(&api, "Role", json!("")).is_ok());
        assert_eq!(
            check(&api, "Role", json!("owner")),
            Err("'Role' has no 'owner' but has 'admin', 'member'".to_string())
        );
    }

    #[multiplatform_test]
    fn maps_validate_keys_and_values() {
        let api = api();

        assert_eq!(
            check(&api, "{.string:.int32}", json!({"a": 1})),
            Ok(json!({"a": 1}))
        );
        assert_eq!(
            check(&api, "{.string:.string}", json!({"a": 1})),
            Err("[\"a\"]: must be string, not 1".to_string())
        );
        assert_eq!(
            check(&api, "{.string:.int32}", json!([1])),
            Err("must be null or {.string:.int32}, not [...]".to_string())
        );
        assert!(check(&api, "{.uint8:.bool}", json!({"8": true})).is_ok());
        assert_eq!(
            check(&api, "{.uint8:.bool}", json!({"300": true})),
            Err("[\"300\"]: must be .uint8, not 300".to_string())
        );
        assert_eq!(
            check(&api, "{.int8:.bool}", json!({"x": true})),
            Err("[\"x\"]: must be .int8, not x".to_string())
        );
        assert_eq!(
            check(&api, "{Role:.int32}", json!({"owner": 1})),
            Err("[\"owner\"]: 'Role' has no 'owner' but has 'admin', 'member'".to_string())
        );
    }

    #[multiplatform_test]
    fn structs() {
        let api = api();

        let user = json!({
            "Name": "Ana",
            "Age": 31,
            "Friends": [{"Name": "Bea", "Role": "member"}],
            "Scores": {"math": 9.5}
        });
        assert_eq!(check(&api, "User", user.clone()), Ok(user));

        assert_eq!(
            check(&api, "User", json!({"Friends": [{"Age": 1.5}]})),
            Err("Friends[0].Age: must be .int32, not 1.5".to_string())
        );
        assert_eq!(
            check(&api, "User", json!({"Nick": "A"})),
            Err(
                "Nick: 'User' has no 'Nick' but has: 'Name' and 'Age' and 'Role' and 'Friends' and 'Scores' and 'Born'"
                    .to_string()
            )
        );
        assert_eq!(
            check(&api, "Empty", json!({"X": 1})),
            Err("X: 'Empty' has no 'X' field".to_string())
        );
        assert_eq!(
            check(&api, "User", json!(3)),
            Err("must be null or User, not 3".to_string())
        );
        // scalars are rejected against containers even when falsy
        assert!(check(&api, "User", json!(0)).is_err());
        assert!(check(&api, "[User]", json!(false)).is_err());
    }

    #[multiplatform_test]
    fn root_strings_are_decoded_as_json() {
        let api = api();

        assert_eq!(
            check(&api, "[.int8]", json!("[1, 2]")),
            Ok(json!([1, 2]))
        );
        let error = check(&api, "[.int8]", json!("[1,")).unwrap_err();
        assert!(error.starts_with("EOF while parsing"), "{error}");

        // nested strings are taken literally
        assert_eq!(
            check(&api, "User", json!({"Friends": "[]"})),
            Err("Friends: must be null or [User], not []".to_string())
        );
    }

    #[multiplatform_test]
    fn undefined_values_are_a_bug() {
        let api = api();
        let error = StructuralValidator::new(&api)
            .validate(".string", None, &ValuePath::root(), false)
            .unwrap_err();

        assert_eq!(error.kind, ValidationErrorKind::UndefinedValue);
    }

    #[multiplatform_test]
    fn text_buffers() {
        let api = api();
        let validator = StructuralValidator::new(&api);

        assert_eq!(
            validator.validate_text("User", "{\"Name\": \"Ana\"}"),
            Ok(json!({"Name": "Ana"}))
        );
        assert!(matches!(
            validator.validate_text("User", "").unwrap_err().kind,
            ValidationErrorKind::MalformedJson { .. }
        ));
        assert_eq!(
            validator
                .validate_text("User", "{\n  \"Name\": }")
                .unwrap_err()
                .position(),
            Some((2, 11))
        );
    }

    #[multiplatform_test]
    fn map_keys() {
        let api = api();
        let validator = StructuralValidator::new(&api);

        assert!(validator.validate_map_key("{Role:.int32}", "admin").is_ok());
        assert!(validator.validate_map_key("{Role:.int32}", "owner").is_err());
        assert!(validator.validate_map_key("?{.string:.int32}", "x").is_ok());
        assert!(validator.validate_map_key("User", "anything").is_ok());
    }

    #[multiplatform_test]
    fn validation_is_idempotent() {
        let api = api();

        for (type_name, value) in [
            ("User", json!("{\"Name\": \"Ana\", \"Scores\": {\"x\": 1}}")),
            ("{.string:[.uint8]}", json!({"a": [1, 2]})),
            ("?Role", Value::Null),
        ] {
            let once = check(&api, type_name, value).unwrap();
            assert_eq!(check(&api, type_name, once.clone()), Ok(once));
        }
    }
}
