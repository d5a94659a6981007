// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Sample values for pre-filling forms.
//!
//! Two flavors: payload samples are "empty" (zeros, empty strings, `null` for optional fields)
//! so that a user fills them in, illustrative samples carry a distinct literal per primitive so
//! that a response shape is easy to read.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

use api_reflection::{ApiReflection, PrimitiveType, TypeKind};

use crate::date_time::to_iso_string;

const DB_METHOD_PREFIX: &str = "__/yo/db/";
const DB_CREATE_METHOD_SUFFIXES: [&str; 2] = ["/createOne", "/createMany"];
/// Server-assigned fields of database-backed structs
const DB_ASSIGNED_FIELDS: [&str; 3] = ["ID", "Id", "Created"];

pub struct SampleSynthesizer<'a> {
    api: &'a ApiReflection,
    for_payload: bool,
    method_path: Option<&'a str>,
    now: DateTime<Utc>,
}

impl<'a> SampleSynthesizer<'a> {
    /// Synthesizer for illustrative samples.
    pub fn illustrative(api: &'a ApiReflection) -> Self {
        Self {
            api,
            for_payload: false,
            method_path: None,
            now: Utc::now(),
        }
    }

    /// Synthesizer for the payload of `method_path`.
    pub fn for_payload(api: &'a ApiReflection, method_path: &'a str) -> Self {
        Self {
            api,
            for_payload: true,
            method_path: Some(method_path),
            now: Utc::now(),
        }
    }

    /// Use a fixed instant for date-time samples.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// A sample for a root value. Root values are never `null`, even when optional.
    pub fn synthesize(&self, type_name: &str) -> Value {
        self.sample(type_name, &mut Vec::new(), true)
    }

    /// A sample for a value nested in a container.
    pub fn synthesize_nested(&self, type_name: &str) -> Value {
        self.sample(type_name, &mut Vec::new(), false)
    }

    fn sample(&self, type_name: &str, visiting: &mut Vec<String>, is_root: bool) -> Value {
        match self.api.classify(type_name) {
            TypeKind::Primitive(primitive) => self.primitive_sample(*primitive),
            TypeKind::DateTime => {
                if self.for_payload {
                    Value::Null
                } else {
                    Value::String(to_iso_string(&self.now))
                }
            }
            TypeKind::Enum(enum_name) => {
                if self.for_payload {
                    return Value::String(String::new());
                }
                match self
                    .api
                    .manifest()
                    .enum_members(enum_name)
                    .and_then(|members| members.first())
                {
                    Some(member) => Value::String(member.clone()),
                    None => Value::String(format!("(some {enum_name} enumerant)")),
                }
            }
            TypeKind::Optional(inner) => {
                if self.for_payload && !is_root {
                    Value::Null
                } else {
                    self.sample(inner, visiting, is_root)
                }
            }
            TypeKind::Array(element_type) => {
                Value::Array(vec![self.sample(element_type, visiting, false)])
            }
            TypeKind::Map {
                key: key_type,
                value: value_type,
            } => {
                let key = match self.sample(key_type, visiting, false) {
                    Value::String(key) => key,
                    other => other.to_string(),
                };
                let mut entries = Map::new();
                entries.insert(key, self.sample(value_type, visiting, false));
                Value::Object(entries)
            }
            TypeKind::Struct(struct_name) => self.struct_sample(struct_name, visiting),
            TypeKind::Unknown(name) => Value::String(name.clone()),
        }
    }

    fn struct_sample(&self, struct_name: &str, visiting: &mut Vec<String>) -> Value {
        if visiting.iter().any(|visited| visited == struct_name) {
            return Value::Null;
        }
        let Some(fields) = self.api.manifest().struct_fields(struct_name) else {
            return Value::Null;
        };

        visiting.push(struct_name.to_string());
        let mut sample: Map<String, Value> = fields
            .iter()
            .map(|(field_name, field_type)| {
                (field_name.clone(), self.sample(field_type, visiting, false))
            })
            .collect();
        visiting.pop();

        if self.is_db_create_method() && self.api.manifest().is_db_struct(struct_name) {
            for field_name in DB_ASSIGNED_FIELDS {
                sample.shift_remove(field_name);
            }
        }

        Value::Object(sample)
    }

    fn is_db_create_method(&self) -> bool {
        self.method_path.is_some_and(|path| {
            path.starts_with(DB_METHOD_PREFIX)
                && DB_CREATE_METHOD_SUFFIXES
                    .iter()
                    .any(|suffix| path.ends_with(suffix))
        })
    }

    fn primitive_sample(&self, primitive: PrimitiveType) -> Value {
        if self.for_payload {
            return match primitive {
                PrimitiveType::Bool => json!(false),
                PrimitiveType::String => json!(""),
                _ => json!(0),
            };
        }

        match primitive {
            PrimitiveType::Bool => json!(true),
            PrimitiveType::String => json!("foo bar"),
            PrimitiveType::Float32 => json!(3.2),
            PrimitiveType::Float64 => json!(6.4),
            PrimitiveType::Int8 => json!(-8),
            PrimitiveType::Int16 => json!(-16),
            PrimitiveType::Int32 => json!(-32),
            PrimitiveType::Int64 => json!(-64),
            PrimitiveType::Uint8 => json!(8),
            PrimitiveType::Uint16 => json!(16),
            PrimitiveType::Uint32 => json!(32),
            PrimitiveType::Uint64 => json!(64),
        }
    }
}
