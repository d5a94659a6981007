// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::ops::Range;
use std::sync::Arc;

use serde_json::{Value, json};

use api_reflection::{ApiReflection, PrimitiveType, TypeKind};

use crate::date_time::{parse_date_time, to_iso_string};
use crate::path::{PathSegment, ValuePath};
use crate::sample::SampleSynthesizer;
use crate::validation::{StructuralValidator, ValidationError};

use super::node::Tree;
use super::span_writer::SpannedJson;
use super::{TreeEditError, type_name_at};

/// Characters selected on either side of a parse error.
const ERROR_CURSOR_RADIUS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneKind {
    /// The editable request payload
    Payload,
    /// The read-only response
    Response,
}

/// What a user enters into a leaf control.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafInput {
    Text(String),
    Checked(bool),
}

/// Keeps a JSON text buffer and its tree view consistent.
///
/// The text is the source of truth while it parses and validates; otherwise the tree keeps
/// showing the last valid value. Tree edits rewrite the text from that value.
pub struct JsonTreeSync {
    api: Arc<ApiReflection>,
    method_path: String,
    type_name: String,
    pane: PaneKind,
    text: String,
    value: Option<Value>,
    tree: Tree,
    error: Option<ValidationError>,
    selection: Option<Range<usize>>,
}

impl JsonTreeSync {
    /// A pane showing no value.
    pub fn new(api: Arc<ApiReflection>, method_path: &str, type_name: &str, pane: PaneKind) -> Self {
        Self {
            api,
            method_path: method_path.to_string(),
            type_name: type_name.to_string(),
            pane,
            text: String::new(),
            value: None,
            tree: Tree::default(),
            error: None,
            selection: None,
        }
    }

    /// A payload pane pre-filled with a payload sample, or a response pane pre-filled with an
    /// illustrative sample of the result.
    pub fn with_sample(
        api: Arc<ApiReflection>,
        method_path: &str,
        type_name: &str,
        pane: PaneKind,
    ) -> Self {
        let sample = match pane {
            PaneKind::Payload => {
                SampleSynthesizer::for_payload(&api, method_path).synthesize(type_name)
            }
            PaneKind::Response => SampleSynthesizer::illustrative(&api).synthesize(type_name),
        };
        let mut sync = Self::new(api, method_path, type_name, pane);
        sync.show_value(sample);
        sync
    }

    pub fn method_path(&self) -> &str {
        &self.method_path
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn pane(&self) -> PaneKind {
        self.pane
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The last value that parsed and validated.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The diagnostic for the current text, if it did not validate.
    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    /// The text range to select: around a parse error, or the value of the last tree edit.
    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    /// Replace the whole value, bypassing validation (used for server responses and for
    /// restoring history entries).
    pub fn show_value(&mut self, value: Value) {
        self.error = None;
        self.selection = None;
        self.text = SpannedJson::new(&value).text;
        self.tree = Tree::build(&self.api, &self.type_name, Some(&value));
        self.value = Some(value);
    }

    /// Replace the text with a message that is not JSON, such as a transport error.
    pub fn show_message(&mut self, message: &str) {
        self.text = message.to_string();
        self.value = None;
        self.error = None;
        self.selection = None;
        self.tree = Tree::default();
    }

    /// Accept new text. Text that is unchanged since it was last validated is a no-op; otherwise
    /// it is parsed and validated, and on success the tree is rebuilt from the normalized value.
    pub fn set_text(&mut self, text: &str) -> Result<(), ValidationError> {
        let validated = self.value.is_some() || self.error.is_some();
        if validated && text == self.text {
            return match &self.error {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            };
        }
        self.text = text.to_string();

        match StructuralValidator::new(&self.api).validate_text(&self.type_name, text) {
            Ok(value) => {
                self.error = None;
                self.selection = None;
                self.tree = Tree::build(&self.api, &self.type_name, Some(&value));
                self.value = Some(value);
                Ok(())
            }
            Err(error) => {
                tracing::debug!(type_name = %self.type_name, %error, "Text did not validate");
                self.selection = error
                    .position()
                    .map(|(line, column)| error_cursor_range(text, line, column));
                self.error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Set a leaf from its control's input.
    pub fn edit_leaf(&mut self, path: &ValuePath, input: LeafInput) -> Result<(), TreeEditError> {
        let type_name = self.editable_type_at(path)?;
        let new_value = self.leaf_value(&type_name, path, input)?;

        self.edit(path, |root| {
            let slot = path
                .lookup_mut(root)
                .ok_or_else(|| TreeEditError::PathNotFound(path.clone()))?;
            *slot = new_value;
            Ok(())
        })
    }

    /// Toggle the presence checkbox of the node at `path`.
    ///
    /// Unchecking deletes a struct field or map entry and nulls an array item. Checking a slot
    /// that holds nothing fills it with a fresh sample.
    pub fn set_present(&mut self, path: &ValuePath, present: bool) -> Result<(), TreeEditError> {
        let type_name = self.editable_type_at(path)?;
        let Some((parent, last)) = path.split_last() else {
            return Err(TreeEditError::PathNotFound(path.clone()));
        };
        let last = last.clone();

        if present {
            let is_filled = self
                .value
                .as_ref()
                .and_then(|root| path.lookup(root))
                .is_some_and(|value| !is_empty_slot(&self.api, &type_name, value));
            if is_filled {
                return Ok(());
            }

            if matches!(self.api.resolve(&type_name), TypeKind::Unknown(_)) {
                return Err(TreeEditError::NoSample(type_name));
            }
            let sample = SampleSynthesizer::illustrative(&self.api).synthesize(&type_name);

            self.edit(path, |root| {
                match (parent.lookup_mut(root), last) {
                    (Some(Value::Object(entries)), PathSegment::Field(key) | PathSegment::Key(key)) => {
                        entries.insert(key, sample);
                    }
                    (Some(Value::Array(items)), PathSegment::Index(index)) if index < items.len() => {
                        items[index] = sample;
                    }
                    _ => return Err(TreeEditError::PathNotFound(path.clone())),
                }
                Ok(())
            })
        } else {
            self.edit(path, |root| {
                match (parent.lookup_mut(root), last) {
                    (Some(Value::Object(entries)), PathSegment::Field(key) | PathSegment::Key(key)) => {
                        entries.shift_remove(&key);
                    }
                    (Some(Value::Array(items)), PathSegment::Index(index)) if index < items.len() => {
                        items[index] = Value::Null;
                    }
                    _ => return Err(TreeEditError::PathNotFound(path.clone())),
                }
                Ok(())
            })
        }
    }

    /// Append a sample item to the array at `path`.
    pub fn add_array_item(&mut self, path: &ValuePath) -> Result<(), TreeEditError> {
        let type_name = self.editable_type_at(path)?;
        let TypeKind::Array(element_type) = self.api.resolve(&type_name) else {
            return Err(TreeEditError::NotAnArray(path.clone()));
        };
        let item = self.synthesizer().synthesize_nested(element_type);

        self.edit(path, |root| match path.lookup_mut(root) {
            Some(Value::Array(items)) => {
                items.push(item);
                Ok(())
            }
            _ => Err(TreeEditError::NotAnArray(path.clone())),
        })
    }

    /// Add entries with sample values to the map at `path`. Either every key is added or, when a
    /// key is invalid for the map's key type or already taken, none is.
    pub fn add_map_keys(&mut self, path: &ValuePath, keys: &[String]) -> Result<(), TreeEditError> {
        let type_name = self.editable_type_at(path)?;
        let TypeKind::Map {
            value: value_type, ..
        } = self.api.resolve(&type_name)
        else {
            return Err(TreeEditError::NotAMap(path.clone()));
        };
        let Some(Value::Object(existing)) = self.value.as_ref().and_then(|root| path.lookup(root))
        else {
            return Err(TreeEditError::NotAMap(path.clone()));
        };

        let validator = StructuralValidator::new(&self.api);
        for (position, key) in keys.iter().enumerate() {
            validator.validate_map_key(&type_name, key)?;
            if existing.contains_key(key) || keys[..position].contains(key) {
                return Err(TreeEditError::DuplicateKey(key.clone()));
            }
        }
        if keys.is_empty() {
            return Ok(());
        }

        let synthesizer = self.synthesizer();
        let entries: Vec<_> = keys
            .iter()
            .map(|key| (key.clone(), synthesizer.synthesize_nested(value_type)))
            .collect();

        self.edit(path, |root| match path.lookup_mut(root) {
            Some(Value::Object(map)) => {
                map.extend(entries);
                Ok(())
            }
            _ => Err(TreeEditError::NotAMap(path.clone())),
        })
    }

    fn synthesizer(&self) -> SampleSynthesizer<'_> {
        match self.pane {
            PaneKind::Payload => SampleSynthesizer::for_payload(&self.api, &self.method_path),
            PaneKind::Response => SampleSynthesizer::illustrative(&self.api),
        }
    }

    fn editable_type_at(&self, path: &ValuePath) -> Result<String, TreeEditError> {
        if self.pane == PaneKind::Response {
            return Err(TreeEditError::ReadOnly);
        }
        if self.value.is_none() {
            return Err(TreeEditError::NoValue);
        }
        type_name_at(&self.api, &self.type_name, path)
            .ok_or_else(|| TreeEditError::PathNotFound(path.clone()))
    }

    /// Apply `mutate` to a copy of the value; keep the result only if it still validates, then
    /// re-serialize and select the edited value.
    fn edit<F>(&mut self, path: &ValuePath, mutate: F) -> Result<(), TreeEditError>
    where
        F: FnOnce(&mut Value) -> Result<(), TreeEditError>,
    {
        let mut root = self.value.clone().ok_or(TreeEditError::NoValue)?;
        mutate(&mut root)?;
        let root = StructuralValidator::new(&self.api).validate_value(&self.type_name, &root)?;

        let spanned = SpannedJson::new(&root);
        self.selection = spanned.span(path);
        self.text = spanned.text;
        self.error = None;
        self.tree = Tree::build(&self.api, &self.type_name, Some(&root));
        self.value = Some(root);

        tracing::debug!(%path, "Applied tree edit");
        Ok(())
    }

    fn leaf_value(
        &self,
        type_name: &str,
        path: &ValuePath,
        input: LeafInput,
    ) -> Result<Value, TreeEditError> {
        let invalid = |message: String| TreeEditError::InvalidInput {
            path: path.clone(),
            message,
        };

        let text = match input {
            LeafInput::Checked(checked) => return Ok(Value::Bool(checked)),
            LeafInput::Text(text) => text,
        };

        match self.api.resolve(type_name) {
            TypeKind::DateTime => parse_date_time(&text)
                .map(|date_time| Value::String(to_iso_string(&date_time)))
                .ok_or_else(|| invalid(format!("'{text}' is not a date-time"))),
            TypeKind::Primitive(PrimitiveType::String) | TypeKind::Enum(_) => {
                Ok(Value::String(text))
            }
            TypeKind::Primitive(PrimitiveType::Bool) => text
                .trim()
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|error| invalid(error.to_string())),
            TypeKind::Primitive(primitive) if primitive.is_integer() => text
                .trim()
                .parse::<i64>()
                .map(|number| json!(number))
                .map_err(|error| invalid(error.to_string())),
            TypeKind::Primitive(_) => match text.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => Ok(json!(number)),
                Ok(_) => Err(invalid(format!("'{text}' is not a finite number"))),
                Err(error) => Err(invalid(error.to_string())),
            },
            _ => serde_json::from_str(&text).map_err(|error| invalid(error.to_string())),
        }
    }
}

/// Whether a slot counts as unfilled: `null`, or an empty string in an optional enum or
/// date-time slot.
fn is_empty_slot(api: &ApiReflection, type_name: &str, value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) if text.is_empty() => {
            api_reflection::is_optional(type_name)
                && matches!(api.resolve(type_name), TypeKind::Enum(_) | TypeKind::DateTime)
        }
        _ => false,
    }
}

/// Byte range around the error at a 1-based line and column, clamped to the text and widened
/// to character boundaries.
fn error_cursor_range(text: &str, line: usize, column: usize) -> Range<usize> {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let position = (line_start + column.saturating_sub(1)).min(text.len());

    let mut start = position.saturating_sub(ERROR_CURSOR_RADIUS);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (position + ERROR_CURSOR_RADIUS).min(text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }
    start..end
}
