//! Collaborators the engine consumes from its host.

use anyhow::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{OptionSourceId, SchemaDocument};

/// Identifies the form a host wants to show.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct FormRequest {
    pub form_name: String,
    pub operation: String,
    #[serde(default)]
    pub parameters: String,
}

impl FormRequest {
    pub fn new(form_name: impl Into<String>, operation: impl Into<String>) -> Self {
        FormRequest {
            form_name: form_name.into(),
            operation: operation.into(),
            parameters: String::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = parameters.into();
        self
    }
}

#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn fetch_schema(&self, request: &FormRequest) -> Result<SchemaDocument, Error>;
}

/// Remote lookup tables. `Ok(None)` means the backend returned nothing.
#[async_trait]
pub trait OptionSource: Send + Sync {
    async fn fetch_option_list(
        &self,
        source: OptionSourceId,
        params: &str,
    ) -> Result<Option<Vec<Value>>, Error>;
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SubmitResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SubmitResponse {
    /// Anything but an explicit "error" status counts as success.
    pub fn is_error(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("error"))
    }
}

#[async_trait]
pub trait SubmitTarget: Send + Sync {
    async fn submit(&self, payload: Value) -> Result<SubmitResponse, Error>;
}
