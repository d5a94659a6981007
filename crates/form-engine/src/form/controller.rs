// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;

use api_reflection::{ApiReflection, ReflMethod};

use crate::history::{HistoryEntry, HistoryStore, KeyValueStore, StoreError};
use crate::path::ValuePath;
use crate::tree::{JsonTreeSync, PaneKind, TreeEditError};
use crate::validation::{StructuralValidator, ValidationError, outcome_message};

use super::transport::{Transport, TransportError, TransportResponse};

const NO_USER: &str = "(none)";
const PENDING_TEXT: &str = "...";

#[derive(Error, Debug)]
pub enum FormError {
    #[error("No method is selected")]
    NoMethodSelected,

    #[error("No method '{0}' in the manifest")]
    UnknownMethod(String),

    #[error("No history entry #{0}")]
    UnknownHistoryEntry(usize),

    #[error("URL query-string object:\n{0}")]
    QueryArgs(String),

    /// The payload does not validate and the submission was not forced.
    #[error("{0}")]
    InvalidPayload(ValidationError),

    #[error(transparent)]
    TreeEdit(#[from] TreeEditError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// Nothing submitted since the method was selected
    Idle,
    Pending,
    Succeeded,
    Failed,
    /// The payload was edited after the response arrived
    Stale,
}

/// A request that passed the form's checks and is ready for the transport.
#[derive(Debug, Clone)]
pub struct Submission {
    pub method_path: String,
    pub payload: Value,
    pub query_args: Option<Value>,
    /// Whether the payload validated (unvalidated payloads are sent only when forced)
    pub validated: bool,
    started: Instant,
}

/// The request form for one method at a time: a payload pane, a query-string input and a
/// response pane, with history of earlier submissions.
pub struct FormController<T, S> {
    api: Arc<ApiReflection>,
    transport: T,
    history: HistoryStore<S>,
    method: Option<ReflMethod>,
    payload: Option<JsonTreeSync>,
    response: Option<JsonTreeSync>,
    query_text: String,
    status: ResponseStatus,
    last_duration: Option<Duration>,
    current_user: Option<String>,
}

impl<T: Transport, S: KeyValueStore> FormController<T, S> {
    /// Create the form, pruning history the manifest no longer supports. The method of the most
    /// recent history entry, if any, is selected.
    pub fn new(api: Arc<ApiReflection>, transport: T, store: S) -> Self {
        let mut history = HistoryStore::new(store);
        if let Err(error) = history.cleanup(&api) {
            tracing::error!(%error, "History cleanup failed");
        }
        let latest = history.history_latest().unwrap_or_else(|error| {
            tracing::error!(%error, "Could not read the latest history entry");
            None
        });

        let mut form = Self {
            api,
            transport,
            history,
            method: None,
            payload: None,
            response: None,
            query_text: String::new(),
            status: ResponseStatus::Idle,
            last_duration: None,
            current_user: None,
        };

        let restored = latest.map(|latest| form.select_method(&latest.method_path));
        if let Some(Err(error)) = restored {
            tracing::error!(%error, "Could not restore the latest history entry");
        }
        form
    }

    pub fn methods(&self) -> &[ReflMethod] {
        &self.api.manifest().methods
    }

    pub fn selected_method(&self) -> Option<&ReflMethod> {
        self.method.as_ref()
    }

    /// Show `method_path` with an illustrative response, and its newest history entry or else a
    /// payload sample.
    pub fn select_method(&mut self, method_path: &str) -> Result<(), FormError> {
        let method = self
            .api
            .manifest()
            .method(method_path)
            .cloned()
            .ok_or_else(|| FormError::UnknownMethod(method_path.to_string()))?;

        tracing::debug!(method_path, "Selected method");

        self.payload = Some(JsonTreeSync::with_sample(
            self.api.clone(),
            &method.path,
            &method.in_type,
            PaneKind::Payload,
        ));
        self.response = Some(JsonTreeSync::with_sample(
            self.api.clone(),
            &method.path,
            &method.out_type,
            PaneKind::Response,
        ));
        self.query_text.clear();
        self.status = ResponseStatus::Idle;
        self.last_duration = None;

        match self.history.history_of(&method.path) {
            Ok(entries) => {
                if let Some(entry) = entries.into_iter().next() {
                    self.restore_entry(entry)?;
                }
            }
            Err(error) => {
                tracing::error!(method_path = %method.path, %error, "Could not read history");
            }
        }

        self.method = Some(method);
        Ok(())
    }

    /// Earlier submissions of the selected method, most recent first.
    pub fn history(&self) -> Result<Vec<HistoryEntry>, FormError> {
        let method = self.method.as_ref().ok_or(FormError::NoMethodSelected)?;
        Ok(self.history.history_of(&method.path)?)
    }

    pub fn history_store(&self) -> &HistoryStore<S> {
        &self.history
    }

    /// Restore the payload and query string of the `index`th entry of [`Self::history`].
    pub fn select_history(&mut self, index: usize) -> Result<(), FormError> {
        let entry = self
            .history()?
            .into_iter()
            .nth(index)
            .ok_or(FormError::UnknownHistoryEntry(index))?;

        self.restore_entry(entry)?;
        self.mark_stale();
        Ok(())
    }

    pub fn payload_pane(&self) -> Option<&JsonTreeSync> {
        self.payload.as_ref()
    }

    pub fn response_pane(&self) -> Option<&JsonTreeSync> {
        self.response.as_ref()
    }

    /// Replace the payload text; the outcome is also available as [`Self::validation_message`].
    pub fn set_payload_text(&mut self, text: &str) -> Result<(), FormError> {
        let pane = self.payload_pane_mut()?;
        let changed = pane.text() != text;
        let outcome = pane.set_text(text);
        if changed {
            self.mark_stale();
        }
        outcome.map_err(FormError::InvalidPayload)
    }

    /// Apply a tree edit to the payload pane.
    pub fn edit_payload<R>(
        &mut self,
        edit: impl FnOnce(&mut JsonTreeSync) -> Result<R, TreeEditError>,
    ) -> Result<R, FormError> {
        let result = edit(self.payload_pane_mut()?)?;
        self.mark_stale();
        Ok(result)
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn set_query_args(&mut self, text: &str) {
        self.query_text = text.to_string();
    }

    /// `(all ok)` or the diagnostic for the current payload text.
    pub fn validation_message(&self) -> String {
        match self.payload.as_ref().and_then(JsonTreeSync::error) {
            Some(error) => outcome_message::<()>(&Err(error.clone())),
            None => outcome_message(&Ok::<_, ValidationError>(())),
        }
    }

    pub fn response_status(&self) -> ResponseStatus {
        self.status
    }

    /// How long the last completed request took.
    pub fn last_duration(&self) -> Option<Duration> {
        self.last_duration
    }

    pub fn current_user(&self) -> &str {
        self.current_user.as_deref().unwrap_or(NO_USER)
    }

    /// Check the query string and payload, record the payload in the history if it validates,
    /// and mark the response as pending.
    ///
    /// A payload that fails validation is rejected unless `force` is set; a forced submission is
    /// sent but not recorded. Problems are also shown in the response pane.
    pub fn prepare_submission(&mut self, force: bool) -> Result<Submission, FormError> {
        let method = self.method.clone().ok_or(FormError::NoMethodSelected)?;

        let query_args = match self.query_text.trim() {
            "" => None,
            text => match serde_json::from_str::<Value>(text) {
                Ok(query_args) => Some(query_args),
                Err(error) => {
                    return Err(self.fail(FormError::QueryArgs(error.to_string())));
                }
            },
        };

        let text = self.payload_pane_mut()?.text().to_string();
        let payload: Value = match serde_json::from_str(&text) {
            Ok(payload) => payload,
            Err(error) => {
                let error = ValidationError::new(&ValuePath::root(), error.into());
                return Err(self.fail(FormError::InvalidPayload(error)));
            }
        };

        let (payload, validated) =
            match StructuralValidator::new(&self.api).validate_value(&method.in_type, &payload) {
                Ok(normalized) => (normalized, true),
                Err(error) if force => {
                    tracing::warn!(
                        method_path = %method.path,
                        %error,
                        "Sending a payload that does not validate"
                    );
                    (payload, false)
                }
                Err(error) => return Err(self.fail(FormError::InvalidPayload(error))),
            };

        if validated {
            let stored =
                self.history
                    .store(&self.api, &method.path, payload.clone(), query_args.clone());
            if let Err(error) = stored {
                tracing::error!(method_path = %method.path, %error, "Could not record history");
            }
        }

        if let Some(response) = self.response.as_mut() {
            response.show_message(PENDING_TEXT);
        }
        self.status = ResponseStatus::Pending;

        Ok(Submission {
            method_path: method.path,
            payload,
            query_args,
            validated,
            started: Instant::now(),
        })
    }

    /// Show the outcome of a submission and return it. Responses apply in the order they
    /// complete; one for a method that is no longer selected only updates the current user.
    pub fn complete_submission(
        &mut self,
        submission: &Submission,
        result: Result<TransportResponse, TransportError>,
    ) -> ResponseStatus {
        let duration = submission.started.elapsed();

        let shows_method = self
            .method
            .as_ref()
            .is_some_and(|method| method.path == submission.method_path);

        let status = match result {
            Ok(response) => {
                if let Some(user) = response.user {
                    self.current_user = Some(user).filter(|user| !user.is_empty());
                }
                tracing::debug!(
                    method_path = %submission.method_path,
                    ?duration,
                    "Request succeeded"
                );
                if let Some(pane) = self.response.as_mut().filter(|_| shows_method) {
                    pane.show_value(response.body);
                }
                ResponseStatus::Succeeded
            }
            Err(error) => {
                tracing::debug!(method_path = %submission.method_path, %error, "Request failed");
                if let Some(pane) = self.response.as_mut().filter(|_| shows_method) {
                    pane.show_message(&error.to_pane_text());
                }
                ResponseStatus::Failed
            }
        };

        if shows_method {
            self.status = status;
            self.last_duration = Some(duration);
        }
        status
    }

    /// Prepare, send and complete a submission.
    pub async fn submit(&mut self, force: bool) -> Result<ResponseStatus, FormError> {
        let submission = self.prepare_submission(force)?;
        let result = self
            .transport
            .submit(
                &submission.method_path,
                &submission.payload,
                submission.query_args.as_ref(),
            )
            .await;
        Ok(self.complete_submission(&submission, result))
    }

    fn restore_entry(&mut self, entry: HistoryEntry) -> Result<(), FormError> {
        self.query_text = match &entry.query_string {
            Some(query_string) => query_string.to_string(),
            None => String::new(),
        };
        self.payload_pane_mut()?.show_value(entry.payload);
        Ok(())
    }

    fn payload_pane_mut(&mut self) -> Result<&mut JsonTreeSync, FormError> {
        self.payload.as_mut().ok_or(FormError::NoMethodSelected)
    }

    fn mark_stale(&mut self) {
        if matches!(self.status, ResponseStatus::Succeeded | ResponseStatus::Failed) {
            self.status = ResponseStatus::Stale;
        }
    }

    /// Show `error` in the response pane and return it.
    fn fail(&mut self, error: FormError) -> FormError {
        if let Some(response) = self.response.as_mut() {
            response.show_message(&error.to_string());
        }
        self.status = ResponseStatus::Failed;
        error
    }
}
