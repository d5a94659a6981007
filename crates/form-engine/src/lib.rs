// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The type-driven request form.
//!
//! Given an [`api_reflection::ApiReflection`], this crate synthesizes sample values, validates
//! JSON against type names, keeps a JSON text buffer in sync with a tree of typed controls, and
//! remembers submitted requests for history and autocompletion. [`form::FormController`] ties
//! these together for one method at a time, sending requests through a [`form::Transport`].

pub mod date_time;
pub mod form;
pub mod history;
pub mod path;
pub mod sample;
pub mod tree;
pub mod validation;
pub mod walk;

pub use path::{PathSegment, ValuePath};
pub use sample::SampleSynthesizer;
pub use validation::{StructuralValidator, ValidationError, ValidationErrorKind};
