//! Host-facing async driver: loads the schema, runs option lookups for the
//! engine and handles the save flow.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::FormConfig;
use crate::engine::{FormEngine, SelectionCallbacks};
use crate::error::{FormError, Result};
use crate::layout::FieldId;
use crate::options::OptionLoader;
use crate::picker::{PickerOpen, SelectionOutcome};
use crate::schema::SchemaDocument;
use crate::traits::{FormRequest, SchemaSource, SubmitTarget};
use crate::validation::ValidationError;

/// Fetches a schema document, giving up as soon as `cancel` fires.
pub async fn load_schema(
    source: &dyn SchemaSource,
    request: &FormRequest,
    cancel: &CancellationToken,
) -> Result<SchemaDocument> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            log::debug!("Schema fetch for '{}' cancelled", request.form_name);
            Err(FormError::Cancelled)
        }
        result = source.fetch_schema(request) => result.map_err(|e| {
            log::error!("Failed to fetch schema for '{}': {}", request.form_name, e);
            FormError::SchemaFetch(e.to_string())
        }),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A non-blocking message for the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SaveOutcome {
    Saved,
    /// Nothing was submitted.
    Invalid(Vec<ValidationError>),
    /// The backend answered with an error status.
    Rejected(String),
    /// The submission call itself failed.
    Failed(String),
}

pub struct FormSession {
    engine: FormEngine,
    loader: OptionLoader,
    submitter: Arc<dyn SubmitTarget>,
    employee_code: Option<String>,
    saving: bool,
    notification: Option<Notification>,
}

impl FormSession {
    pub fn new(engine: FormEngine, loader: OptionLoader, submitter: Arc<dyn SubmitTarget>) -> Self {
        FormSession {
            engine,
            loader,
            submitter,
            employee_code: None,
            saving: false,
            notification: None,
        }
    }

    /// Loads the schema and builds a session around a fresh engine.
    pub async fn mount(
        source: &dyn SchemaSource,
        request: &FormRequest,
        cancel: &CancellationToken,
        config: FormConfig,
        loader: OptionLoader,
        submitter: Arc<dyn SubmitTarget>,
    ) -> Result<Self> {
        let doc = load_schema(source, request, cancel).await?;
        Ok(FormSession::new(FormEngine::new(&doc, config), loader, submitter))
    }

    pub fn with_employee_code(mut self, code: impl Into<String>) -> Self {
        self.employee_code = Some(code.into());
        self
    }

    pub fn with_callbacks(mut self, callbacks: SelectionCallbacks) -> Self {
        self.engine = self.engine.with_callbacks(callbacks);
        self
    }

    pub fn engine(&self) -> &FormEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut FormEngine {
        &mut self.engine
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    fn notify(&mut self, kind: NotificationKind, message: String) {
        self.notification = Some(Notification { kind, message });
    }

    async fn fulfil(&mut self, open: &PickerOpen) {
        if let PickerOpen::Fetch(fetch) = open {
            let list = self.loader.load(fetch.source, &fetch.params).await;
            self.engine.deliver_options(fetch.ticket, list);
        }
    }

    pub async fn open_picker(&mut self, id: FieldId) -> Result<PickerOpen> {
        let open = self.engine.open_picker(id)?;
        self.fulfil(&open).await;
        Ok(open)
    }

    pub async fn open_cell_picker(&mut self, table: &str, row: usize, column: &str) -> Result<PickerOpen> {
        let open = self.engine.open_cell_picker(table, row, column)?;
        self.fulfil(&open).await;
        Ok(open)
    }

    pub async fn choose(&mut self, option: Value) -> Result<SelectionOutcome> {
        let outcome = self.engine.choose(option)?;
        if let SelectionOutcome::Chained(open) = &outcome {
            self.fulfil(open).await;
        }
        Ok(outcome)
    }

    pub async fn confirm(&mut self) -> Result<SelectionOutcome> {
        let outcome = self.engine.confirm()?;
        if let SelectionOutcome::Chained(open) = &outcome {
            self.fulfil(open).await;
        }
        Ok(outcome)
    }

    /// Lazily loads an inline dropdown's options and returns them.
    pub async fn open_dropdown(&mut self, id: FieldId) -> Result<Vec<Value>> {
        if let Some(fetch) = self.engine.request_field_options(id)? {
            let list = self.loader.load(fetch.source, &fetch.params).await;
            self.engine.deliver_options(fetch.ticket, list);
        }
        Ok(self.engine.field(id)?.schema().options())
    }

    /// Validates, collects and submits. Form state is kept whatever happens so
    /// the user can retry.
    pub async fn save(&mut self) -> SaveOutcome {
        let errors = self.engine.validate().to_vec();
        if !errors.is_empty() {
            let message = self.engine.config().messages.invalid.clone();
            self.notify(NotificationKind::Error, message);
            return SaveOutcome::Invalid(errors);
        }

        self.saving = true;
        let payload = self.engine.collect(self.employee_code.as_deref());
        let result = self.submitter.submit(payload).await;
        self.saving = false;

        let messages = self.engine.config().messages.clone();
        match result {
            Ok(response) if response.is_error() => {
                let message = response
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or(messages.rejected);
                self.notify(NotificationKind::Error, message.clone());
                SaveOutcome::Rejected(message)
            }
            Ok(_) => {
                self.notify(NotificationKind::Success, messages.saved);
                SaveOutcome::Saved
            }
            Err(e) => {
                log::error!("Error submitting form: {}", e);
                let message = Some(e.to_string())
                    .filter(|m| !m.is_empty())
                    .unwrap_or(messages.failed);
                self.notify(NotificationKind::Error, message.clone());
                SaveOutcome::Failed(message)
            }
        }
    }

    pub fn teardown(&mut self) {
        self.engine.teardown();
    }
}
