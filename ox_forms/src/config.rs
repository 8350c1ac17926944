use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FormError, Result};
use crate::schema::OptionSourceId;

/// Engine-wide settings. Every field has a default, so an empty document is a
/// valid configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FormConfig {
    /// Option source served from the host's employee cache instead of the backend.
    pub employees_source_id: OptionSourceId,
    /// Submission format for date fields that do not declare one (moment-style tokens).
    pub default_date_format: String,
    pub required_message: String,
    pub default_picker_title: String,
    pub header_title: String,
    /// Sequence number given to every checkbox+input field.
    pub composite_seq_no: i64,
    /// Added to every ordinary field's sequence number when checkbox+input fields exist.
    pub seq_offset: i64,
    pub messages: NotificationMessages,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NotificationMessages {
    pub invalid: String,
    pub saved: String,
    pub rejected: String,
    pub failed: String,
}

impl Default for NotificationMessages {
    fn default() -> Self {
        Self {
            invalid: "Please fill in all required fields.".to_string(),
            saved: "Changes saved successfully!".to_string(),
            rejected: "An error occurred".to_string(),
            failed: "Failed to save changes. Please try again.".to_string(),
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            employees_source_id: OptionSourceId(1),
            default_date_format: "DD-MM-YYYY".to_string(),
            required_message: "This field is required".to_string(),
            default_picker_title: "Select an option".to_string(),
            header_title: "Basic Information".to_string(),
            composite_seq_no: 1,
            seq_offset: 1000,
            messages: NotificationMessages::default(),
        }
    }
}

impl FormConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| FormError::Config(e.to_string()))
    }

    /// Loads a `.json` file as JSON and anything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }
}
