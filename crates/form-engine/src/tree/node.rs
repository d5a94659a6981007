// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde_json::Value;

use api_reflection::{ApiReflection, PrimitiveType, TypeKind, is_optional, strip_optional};

use crate::date_time::parse_date_time;
use crate::path::{PathSegment, ValuePath};

/// Shortest string a date-time control accepts: `YYYY-MM-DDThh:mm`.
const DATE_TIME_CONTROL_LEN: usize = 16;

/// The control that edits a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    /// Minute precision, `YYYY-MM-DDThh:mm`
    DateTime { value: String },
    Integer { value: i64, min: i64, max: i64 },
    Float { value: f64, min: f64, max: f64 },
    /// Free text; `autocomplete` names the suggestion set, if any.
    Text {
        value: String,
        autocomplete: Option<String>,
    },
    Checkbox { checked: bool },
    /// Enum choice; the first option is always the empty string.
    Select { selected: String, options: Vec<String> },
    /// A struct, array or map. Arrays and maps carry a count badge such as `[2×]`.
    Container {
        badge: Option<String>,
        children: Vec<TreeNode>,
    },
    /// A value no specific control applies to, shown as JSON.
    Raw(String),
    /// Nothing to show: the slot is absent or `null`.
    Absent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub path: ValuePath,
    /// `.Field`, `[i]` or `["key"]`
    pub label: String,
    /// The declared type name, optional markers included.
    pub type_name: String,
    /// State of the presence checkbox.
    pub present: bool,
    pub widget: Widget,
}

/// The structural view of a root value: one node per struct field, array item or map entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
    /// Badge of a root array or map.
    pub badge: Option<String>,
}

impl Tree {
    pub fn build(api: &ApiReflection, type_name: &str, value: Option<&Value>) -> Self {
        let builder = TreeBuilder { api };
        match value {
            Some(value) => {
                let (badge, nodes) = builder.children(type_name, value, &ValuePath::root());
                Tree { nodes, badge }
            }
            None => Tree::default(),
        }
    }

    /// Depth-first search for the node at `path`.
    pub fn find(&self, path: &ValuePath) -> Option<&TreeNode> {
        fn find_in<'t>(nodes: &'t [TreeNode], path: &ValuePath) -> Option<&'t TreeNode> {
            nodes.iter().find_map(|node| {
                if &node.path == path {
                    Some(node)
                } else if let Widget::Container { children, .. } = &node.widget {
                    find_in(children, path)
                } else {
                    None
                }
            })
        }
        find_in(&self.nodes, path)
    }
}

/// `[2×]` for an array type of two items, `{1×}` for a map type of one entry.
pub fn count_badge(type_name: &str, count: usize) -> String {
    let mut chars = type_name.chars();
    let first = chars.next().unwrap_or_default();
    let last = chars.next_back().unwrap_or(first);
    format!("{first}{count}×{last}")
}

struct TreeBuilder<'a> {
    api: &'a ApiReflection,
}

impl TreeBuilder<'_> {
    fn children(
        &self,
        type_name: &str,
        value: &Value,
        path: &ValuePath,
    ) -> (Option<String>, Vec<TreeNode>) {
        let type_name = strip_optional(type_name);

        match (self.api.classify(type_name), value) {
            (TypeKind::Array(element_type), Value::Array(items)) => {
                let nodes = items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        self.node(element_type, Some(item), PathSegment::Index(index), path)
                    })
                    .collect();
                (Some(count_badge(type_name, items.len())), nodes)
            }
            (TypeKind::Map { value: value_type, .. }, Value::Object(entries)) => {
                let nodes = entries
                    .iter()
                    .map(|(key, entry)| {
                        self.node(value_type, Some(entry), PathSegment::Key(key.clone()), path)
                    })
                    .collect();
                (Some(count_badge(type_name, entries.len())), nodes)
            }
            (TypeKind::Struct(struct_name), Value::Object(fields)) => {
                let nodes = self
                    .api
                    .manifest()
                    .struct_fields(struct_name)
                    .map(|declared| {
                        declared
                            .iter()
                            .map(|(field_name, field_type)| {
                                self.node(
                                    field_type,
                                    fields.get(field_name),
                                    PathSegment::Field(field_name.clone()),
                                    path,
                                )
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                (None, nodes)
            }
            _ => (None, vec![]),
        }
    }

    fn node(
        &self,
        type_name: &str,
        value: Option<&Value>,
        segment: PathSegment,
        parent: &ValuePath,
    ) -> TreeNode {
        let label = segment.label();
        let path = parent.child(segment);

        let present = match value {
            None | Some(Value::Null) => false,
            Some(Value::String(text)) if text.is_empty() && is_optional(type_name) => !matches!(
                self.api.resolve(type_name),
                TypeKind::Enum(_) | TypeKind::DateTime
            ),
            Some(_) => true,
        };

        let widget = match value {
            Some(value) if present => self.widget(type_name, value, &path),
            _ => Widget::Absent,
        };

        TreeNode {
            path,
            label,
            type_name: type_name.to_string(),
            present,
            widget,
        }
    }

    fn widget(&self, type_name: &str, value: &Value, path: &ValuePath) -> Widget {
        let kind = self.api.resolve(type_name);

        match (kind, value) {
            (TypeKind::DateTime, Value::String(text))
                if text.len() >= DATE_TIME_CONTROL_LEN && parse_date_time(text).is_some() =>
            {
                Widget::DateTime {
                    value: text.chars().take(DATE_TIME_CONTROL_LEN).collect(),
                }
            }
            (TypeKind::Primitive(PrimitiveType::Bool), Value::Bool(checked)) => {
                Widget::Checkbox { checked: *checked }
            }
            (TypeKind::Primitive(PrimitiveType::String), Value::String(text)) => Widget::Text {
                value: text.clone(),
                autocomplete: path.autocomplete_name().map(str::to_string),
            },
            (TypeKind::Primitive(primitive), Value::Number(number)) if primitive.is_integer() => {
                match (number.as_i64(), primitive.integer_limits()) {
                    (Some(value), Some((min, max))) => Widget::Integer { value, min, max },
                    _ => Widget::Raw(value.to_string()),
                }
            }
            (TypeKind::Primitive(primitive), Value::Number(number)) if primitive.is_float() => {
                match (number.as_f64(), primitive.numeric_limits()) {
                    (Some(value), Some((min, max))) => Widget::Float { value, min, max },
                    _ => Widget::Raw(value.to_string()),
                }
            }
            (TypeKind::Enum(enum_name), Value::String(text)) => {
                let members = self.api.manifest().enum_members(enum_name).unwrap_or(&[]);
                if !members.is_empty() && (text.is_empty() || members.contains(text)) {
                    Widget::Select {
                        selected: text.clone(),
                        options: std::iter::once(String::new())
                            .chain(members.iter().cloned())
                            .collect(),
                    }
                } else {
                    Widget::Text {
                        value: text.clone(),
                        autocomplete: None,
                    }
                }
            }
            (TypeKind::Array(_) | TypeKind::Map { .. } | TypeKind::Struct(_), _) => {
                let (badge, children) = self.children(type_name, value, path);
                Widget::Container { badge, children }
            }
            _ => Widget::Raw(value.to_string()),
        }
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
                        ("Age", ".uint8"),
                        ("Height", "?.float32"),
                        ("Admin", ".bool"),
                        ("Role", "?Role"),
                        ("Born", "?time.Time"),
                        ("Tags", "[.string]"),
                        ("Scores", "{.string:.int16}"),
                    ],
                )
                .with_enum("Role", ["admin", "member"]),
        )
    }

    #[multiplatform_test]
    fn badges() {
        assert_eq!(count_badge("[.string]", 2), "[2×]");
        assert_eq!(count_badge("{.string:.int16}", 0), "{0×}");
    }

    #[multiplatform_test]
    fn struct_nodes_cover_every_declared_field() {
        let api = api();
        let value = json!({
            "Name": "Ana",
            "Age": 31,
            "Admin": true,
            "Role": "",
            "Born": "2024-03-01T09:30:00.000Z",
            "Tags": ["x"],
            "Scores": {"math": 7}
        });
        let tree = Tree::build(&api, "User", Some(&value));

        let labels: Vec<_> = tree.nodes.iter().map(|node| node.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![".Name", ".Age", ".Height", ".Admin", ".Role", ".Born", ".Tags", ".Scores"]
        );
        assert_eq!(tree.badge, None);

        let widget = |path: ValuePath| tree.find(&path).map(|node| node.widget.clone());
        let root = ValuePath::root();

        assert_eq!(
            widget(root.field("Name")),
            Some(Widget::Text {
                value: "Ana".to_string(),
                autocomplete: Some("Name".to_string())
            })
        );
        assert_eq!(
            widget(root.field("Age")),
            Some(Widget::Integer {
                value: 31,
                min: 0,
                max: 255
            })
        );
        assert_eq!(widget(root.field("Height")), Some(Widget::Absent));
        assert_eq!(
            widget(root.field("Admin")),
            Some(Widget::Checkbox { checked: true })
        );
        assert_eq!(
            widget(root.field("Born")),
            Some(Widget::DateTime {
                value: "2024-03-01T09:30".to_string()
            })
        );
        assert_eq!(
            widget(root.field("Tags").index(0)),
            Some(Widget::Text {
                value: "x".to_string(),
                autocomplete: Some("Tags".to_string())
            })
        );

        let scores = tree.find(&root.field("Scores")).unwrap();
        assert!(matches!(
            &scores.widget,
            Widget::Container { badge: Some(badge), children } if badge == "{1×}" && children[0].label == "[\"math\"]"
        ));
    }

    #[multiplatform_test]
    fn empty_optional_enums_are_absent() {
        let api = api();
        let tree = Tree::build(&api, "User", Some(&json!({"Role": ""})));
        let role = tree.find(&ValuePath::root().field("Role")).unwrap();

        assert!(!role.present);
        assert_eq!(role.widget, Widget::Absent);

        let tree = Tree::build(&api, "User", Some(&json!({"Role": "member"})));
        let role = tree.find(&ValuePath::root().field("Role")).unwrap();

        assert!(role.present);
        assert_eq!(
            role.widget,
            Widget::Select {
                selected: "member".to_string(),
                options: vec!["".to_string(), "admin".to_string(), "member".to_string()]
            }
        );
    }

    #[multiplatform_test]
    fn root_containers() {
        let api = api();

        let tree = Tree::build(&api, "?[.bool]", Some(&json!([true, false])));
        assert_eq!(tree.badge.as_deref(), Some("[2×]"));
        assert_eq!(tree.nodes[1].label, "[1]");
        assert_eq!(tree.nodes[1].widget, Widget::Checkbox { checked: false });

        assert_eq!(Tree::build(&api, ".string", Some(&json!("x"))), Tree::default());
        assert_eq!(Tree::build(&api, "User", None), Tree::default());
    }
}
