use serde::Serialize;
use serde_json::Value;

use crate::config::FormConfig;
use crate::field_type::FieldType;
use crate::layout::{FieldRecord, FieldValue, FormLayout};

/// Represents a validation error for a specific field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Checks required fields across every partition.
pub struct Validator<'a> {
    config: &'a FormConfig,
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a FormConfig) -> Self {
        Validator { config }
    }

    /// Walks header, general, each tab, then each accordion. At most one error
    /// is reported per field identifier.
    pub fn validate(&self, layout: &FormLayout) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = Vec::new();
        for id in layout.ordered_ids() {
            let Ok(record) = layout.record(id) else {
                continue;
            };
            if !record.schema.is_required || !is_empty(record) {
                continue;
            }
            if errors.iter().any(|e| e.field == record.schema.key) {
                continue;
            }
            errors.push(ValidationError {
                field: record.schema.key.clone(),
                message: record
                    .schema
                    .validation_message
                    .clone()
                    .unwrap_or_else(|| self.config.required_message.clone()),
            });
        }
        if !errors.is_empty() {
            log::debug!("Validation found {} missing required fields", errors.len());
        }
        errors
    }
}

/// Emptiness as the required check sees it.
pub fn is_empty(record: &FieldRecord) -> bool {
    let value = match &record.value {
        FieldValue::Composite(parts) => return !parts.checked && parts.text.trim().is_empty(),
        FieldValue::Single(v) => v,
    };
    match record.schema.field_type {
        FieldType::Modal | FieldType::SelectDropdown => !has_code(value),
        FieldType::MultiSelectWithInputDiv | FieldType::MultiSelectWithDropdownInputDiv => {
            value.as_array().map_or(true, Vec::is_empty)
        }
        _ => is_blank(value),
    }
}

fn has_code(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty() && items.iter().all(has_code),
        Value::Object(record) => match record.get("code") {
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(_)) => true,
            _ => false,
        },
        _ => false,
    }
}

pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSchema;
    use serde_json::json;

    fn layout(fields: Value) -> FormLayout {
        let fields: Vec<FieldSchema> = serde_json::from_value(fields).unwrap();
        FormLayout::build(fields, &[], &[])
    }

    #[test]
    fn test_picker_needs_a_code() {
        let l = layout(json!([
            { "jquerySelectorID": "a", "fieldType": "selectdropdown", "isRequired": true,
              "defaultValue": { "code": "", "description": "" } },
            { "jquerySelectorID": "b", "fieldType": "modal", "isRequired": true,
              "defaultValue": { "code": "B1" } },
            { "jquerySelectorID": "c", "fieldType": "modal", "isRequired": true,
              "defaultValue": [ { "code": "C1" } ] }
        ]));
        let errors = Validator::new(&FormConfig::default()).validate(&l);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "a");
        assert_eq!(errors[0].message, "This field is required");
    }

    #[test]
    fn test_multi_entry_and_custom_message() {
        let l = layout(json!([
            { "jquerySelectorID": "m", "fieldType": "multiselectwithinputdiv", "isRequired": true,
              "defaultValue": [], "validationMessage": "Add at least one" },
            { "jquerySelectorID": "t", "fieldType": "inputfield", "isRequired": true,
              "defaultValue": 0 },
            { "jquerySelectorID": "u", "fieldType": "inputfield", "defaultValue": null }
        ]));
        let errors = Validator::new(&FormConfig::default()).validate(&l);
        assert_eq!(errors, vec![ValidationError {
            field: "m".into(),
            message: "Add at least one".into()
        }]);
    }

    #[test]
    fn test_composite_empty_only_when_both_parts_empty() {
        let fields: Vec<FieldSchema> = serde_json::from_value(json!([
            { "jquerySelectorID": "c1", "isRequired": true, "isFormInputCheckbox": true },
            { "jquerySelectorID": "c2", "isRequired": true, "isFormInputCheckbox": true,
              "defaultCheckboxValue": true }
        ]))
        .unwrap();
        let l = FormLayout::build(fields, &[], &[]);
        let errors = Validator::new(&FormConfig::default()).validate(&l);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "c1");
    }
}
