// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::ops::Range;

use serde_json::Value;

use crate::path::{PathSegment, ValuePath};

const INDENT: &str = "  ";

/// Pretty-printed JSON along with the byte range each value occupies in it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpannedJson {
    pub text: String,
    spans: HashMap<ValuePath, Range<usize>>,
}

impl SpannedJson {
    /// Serialize with two-space indentation, the same layout as `serde_json::to_string_pretty`.
    pub fn new(value: &Value) -> Self {
        let mut spanned = SpannedJson::default();
        spanned.write_value(value, &ValuePath::root(), 0);
        spanned
    }

    /// The range of the value at `path` (its key, if any, excluded).
    pub fn span(&self, path: &ValuePath) -> Option<Range<usize>> {
        self.spans.get(&object_keyed(path)).cloned()
    }

    fn write_value(&mut self, value: &Value, path: &ValuePath, depth: usize) {
        let start = self.text.len();

        match value {
            Value::Array(items) if !items.is_empty() => {
                self.text.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        self.text.push(',');
                    }
                    self.new_line(depth + 1);
                    self.write_value(item, &path.index(index), depth + 1);
                }
                self.new_line(depth);
                self.text.push(']');
            }
            Value::Object(entries) if !entries.is_empty() => {
                self.text.push('{');
                for (position, (key, entry)) in entries.iter().enumerate() {
                    if position > 0 {
                        self.text.push(',');
                    }
                    self.new_line(depth + 1);
                    self.text.push_str(&Value::String(key.clone()).to_string());
                    self.text.push_str(": ");
                    self.write_value(entry, &path.key(key), depth + 1);
                }
                self.new_line(depth);
                self.text.push('}');
            }
            scalar_or_empty => self.text.push_str(&scalar_or_empty.to_string()),
        }

        self.spans.insert(path.clone(), start..self.text.len());
    }

    fn new_line(&mut self, depth: usize) {
        self.text.push('\n');
        for _ in 0..depth {
            self.text.push_str(INDENT);
        }
    }
}

/// Struct fields and map keys share the object representation, so spans are recorded under
/// key segments only.
fn object_keyed(path: &ValuePath) -> ValuePath {
    path.segments()
        .iter()
        .fold(ValuePath::root(), |keyed, segment| match segment {
            PathSegment::Field(name) => keyed.key(name),
            other => keyed.child(other.clone()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;
    use serde_json::json;

    fn spanned_text(spanned: &SpannedJson, path: &ValuePath) -> Option<String> {
        spanned
            .span(path)
            .map(|range| spanned.text[range].to_string())
    }

    #[multiplatform_test]
    fn layout_matches_serde_pretty_printing() {
        for value in [
            json!(null),
            json!("text with \"quotes\""),
            json!([]),
            json!({}),
            json!({"Name": "Ana", "Tags": [], "Scores": {"math": 9.5, "art": {}}, "Ids": [1, [2, 3]]}),
        ] {
            assert_eq!(
                SpannedJson::new(&value).text,
                serde_json::to_string_pretty(&value).unwrap()
            );
        }
    }

    #[multiplatform_test]
    fn spans() {
        let value = json!({"Name": "Ana", "Friends": [{"Name": "Bea"}], "Scores": {"math": 9}});
        let spanned = SpannedJson::new(&value);

        insta::assert_snapshot!(spanned.text, @r#"
        {
          "Name": "Ana",
          "Friends": [
            {
              "Name": "Bea"
            }
          ],
          "Scores": {
            "math": 9
          }
        }
        "#);

        let root = ValuePath::root();
        assert_eq!(spanned_text(&spanned, &root), Some(spanned.text.clone()));
        assert_eq!(
            spanned_text(&spanned, &root.field("Name")),
            Some("\"Ana\"".to_string())
        );
        assert_eq!(
            spanned_text(&spanned, &root.field("Friends").index(0).field("Name")),
            Some("\"Bea\"".to_string())
        );
        assert_eq!(
            spanned_text(&spanned, &root.field("Scores").key("math")),
            Some("9".to_string())
        );
        assert_eq!(
            spanned_text(&spanned, &root.field("Friends").index(0)),
            Some("{\n      \"Name\": \"Bea\"\n    }".to_string())
        );
        assert_eq!(spanned.span(&root.field("Missing")), None);
    }
}
