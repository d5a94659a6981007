// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde_json::Value;

use api_reflection::{ApiReflection, TypeKind, strip_optional};

use crate::path::ValuePath;

/// Visit a value guided by its type.
///
/// The visitor receives the path, the type name (optional markers stripped) and the value of
/// every leaf. With `include_containers`, arrays, maps and structs are visited too, after their
/// contents. Struct fields the type does not declare are skipped; so are values whose shape
/// does not match their type, which are visited as leaves.
pub fn walk<F>(
    api: &ApiReflection,
    type_name: &str,
    value: &Value,
    include_containers: bool,
    visitor: &mut F,
) where
    F: FnMut(&ValuePath, &str, &Value),
{
    walk_at(
        api,
        type_name,
        value,
        &ValuePath::root(),
        include_containers,
        visitor,
    );
}

fn walk_at<F>(
    api: &ApiReflection,
    type_name: &str,
    value: &Value,
    path: &ValuePath,
    include_containers: bool,
    visitor: &mut F,
) where
    F: FnMut(&ValuePath, &str, &Value),
{
    let type_name = strip_optional(type_name);

    let descended = match (api.classify(type_name), value) {
        (TypeKind::Array(element_type), Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                walk_at(
                    api,
                    element_type,
                    item,
                    &path.index(index),
                    include_containers,
                    visitor,
                );
            }
            true
        }
        (TypeKind::Map { value: value_type, .. }, Value::Object(entries)) => {
            for (key, entry) in entries {
                walk_at(
                    api,
                    value_type,
                    entry,
                    &path.key(key),
                    include_containers,
                    visitor,
                );
            }
            true
        }
        (TypeKind::Struct(struct_name), Value::Object(fields)) => {
            let declared = api.manifest().struct_fields(struct_name);
            for (field_name, field_value) in fields {
                if let Some(field_type) = declared.and_then(|declared| declared.get(field_name)) {
                    walk_at(
                        api,
                        field_type,
                        field_value,
                        &path.field(field_name),
                        include_containers,
                        visitor,
                    );
                }
            }
            true
        }
        _ => false,
    };

    if !descended || include_containers {
        visitor(path, type_name, value);
    }
}
