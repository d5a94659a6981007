// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The type-name grammar.
//!
//! Every field, payload and result type in the manifest is a compact string:
//!
//! - `.bool`, `.string`, `.int32`, ... : primitive scalars (leading `.`)
//! - `time.Time`, `yo/db.DateTime` : date-time aliases (string-or-null ISO-8601 instants)
//! - `?T` : optional `T` (markers may stack, `??T` is still an optional `T`)
//! - `[T]` : array of `T`
//! - `{K:V}` : map from `K` to `V`, split on the first `:`
//! - any other bare name : an enum (looked up first) or a struct, or unknown if neither

use std::fmt::{Display, Formatter};

use crate::manifest::ReflectionManifest;

pub const OPTIONAL_MARKER: char = '?';

/// The two recognized date-time tags: the legacy one and the namespaced one.
pub const DATE_TIME_TAGS: [&str; 2] = ["time.Time", "yo/db.DateTime"];

/// Largest integer exactly representable in an IEEE double (2^53 - 1).
///
/// 64-bit integer widths are clamped to this range instead of their true range.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool,
    String,
    Float32,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 12] = [
        PrimitiveType::Bool,
        PrimitiveType::String,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
        PrimitiveType::Int8,
        PrimitiveType::Int16,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::Uint8,
        PrimitiveType::Uint16,
        PrimitiveType::Uint32,
        PrimitiveType::Uint64,
    ];

    /// The wire tag, including the leading `.`
    pub fn tag(self) -> &'static str {
        match self {
            PrimitiveType::Bool => ".bool",
            PrimitiveType::String => ".string",
            PrimitiveType::Float32 => ".float32",
            PrimitiveType::Float64 => ".float64",
            PrimitiveType::Int8 => ".int8",
            PrimitiveType::Int16 => ".int16",
            PrimitiveType::Int32 => ".int32",
            PrimitiveType::Int64 => ".int64",
            PrimitiveType::Uint8 => ".uint8",
            PrimitiveType::Uint16 => ".uint16",
            PrimitiveType::Uint32 => ".uint32",
            PrimitiveType::Uint64 => ".uint64",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|primitive| primitive.tag() == tag)
    }

    pub fn is_integer(self) -> bool {
        self.integer_limits().is_some()
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveType::Float32 | PrimitiveType::Float64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Inclusive range of an integer width.
    pub fn integer_limits(self) -> Option<(i64, i64)> {
        match self {
            PrimitiveType::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            PrimitiveType::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            PrimitiveType::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            PrimitiveType::Int64 => Some((-MAX_SAFE_INTEGER, MAX_SAFE_INTEGER)),
            PrimitiveType::Uint8 => Some((0, u8::MAX as i64)),
            PrimitiveType::Uint16 => Some((0, u16::MAX as i64)),
            PrimitiveType::Uint32 => Some((0, u32::MAX as i64)),
            PrimitiveType::Uint64 => Some((0, MAX_SAFE_INTEGER)),
            _ => None,
        }
    }

    /// Inclusive numeric range of any numeric primitive; floats use the safe-integer range.
    pub fn numeric_limits(self) -> Option<(f64, f64)> {
        if self.is_float() {
            Some((-(MAX_SAFE_INTEGER as f64), MAX_SAFE_INTEGER as f64))
        } else {
            self.integer_limits()
                .map(|(min, max)| (min as f64, max as f64))
        }
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// The classification of a type name.
///
/// Wrapped type names (`Optional`, `Array`, `Map`) carry the inner type names as written, so
/// consumers classify them again (through the cache in [`crate::ApiReflection`]) when descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Primitive(PrimitiveType),
    DateTime,
    Enum(String),
    /// One optional marker peeled; the payload is the remaining type name.
    Optional(String),
    Array(String),
    Map {
        key: String,
        value: String,
    },
    Struct(String),
    /// Not resolvable against the manifest; carried verbatim.
    Unknown(String),
}

impl TypeKind {
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            TypeKind::Array(_) | TypeKind::Map { .. } | TypeKind::Struct(_)
        )
    }
}

/// Classify a type name against the manifest. Total: anything unrecognized is `Unknown`.
pub fn classify(type_name: &str, manifest: &ReflectionManifest) -> TypeKind {
    if let Some(inner) = type_name.strip_prefix(OPTIONAL_MARKER) {
        return TypeKind::Optional(inner.to_string());
    }

    if DATE_TIME_TAGS.contains(&type_name) {
        return TypeKind::DateTime;
    }

    if let Some(primitive) = PrimitiveType::from_tag(type_name) {
        return TypeKind::Primitive(primitive);
    }

    if let Some(inner) = type_name
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return TypeKind::Array(inner.to_string());
    }

    if let Some((key, value)) = type_name
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .and_then(|inner| inner.split_once(':'))
    {
        return TypeKind::Map {
            key: key.to_string(),
            value: value.to_string(),
        };
    }

    if manifest.enums.contains_key(type_name) {
        TypeKind::Enum(type_name.to_string())
    } else if manifest.types.contains_key(type_name) {
        TypeKind::Struct(type_name.to_string())
    } else {
        TypeKind::Unknown(type_name.to_string())
    }
}

/// Peel every leading optional marker.
pub fn strip_optional(type_name: &str) -> &str {
    type_name.trim_start_matches(OPTIONAL_MARKER)
}

pub fn is_optional(type_name: &str) -> bool {
    type_name.starts_with(OPTIONAL_MARKER)
}
