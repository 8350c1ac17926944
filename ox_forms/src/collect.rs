//! Projection of form state into the submission payload.

use serde_json::{Map, Value};

use crate::config::FormConfig;
use crate::date;
use crate::field_type::{ColumnType, FieldType};
use crate::layout::{FieldRecord, FieldValue, FormLayout};
use crate::tables::TableStore;

pub struct Collector<'a> {
    config: &'a FormConfig,
}

impl<'a> Collector<'a> {
    pub fn new(config: &'a FormConfig) -> Self {
        Collector { config }
    }

    pub fn collect(
        &self,
        layout: &FormLayout,
        tables: &TableStore,
        employee_code: Option<&str>,
    ) -> Map<String, Value> {
        let mut payload = Map::new();
        if let Some(code) = employee_code.filter(|c| !c.is_empty()) {
            payload.insert("employeeCode".to_string(), Value::from(code));
        }

        for id in layout.ordered_ids() {
            if let Ok(record) = layout.record(id) {
                self.collect_field(record, &mut payload);
            }
        }

        for table in tables.tables() {
            let Some(key) = table.json_data_key_name.as_deref().filter(|_| table.is_post) else {
                continue;
            };
            let columns = tables.columns(table);
            let rows = tables.rows(key).unwrap_or(&[]);
            let projected: Vec<Value> = rows
                .iter()
                .map(|row| {
                    let mut out = Map::new();
                    for column in columns.iter().filter(|c| c.is_post) {
                        let Some(target) = column.json_data_key_name.as_deref() else {
                            continue;
                        };
                        let cell = row.get(&column.column_name).unwrap_or(&Value::Null);
                        let format = column
                            .post_date_format
                            .as_deref()
                            .unwrap_or(&self.config.default_date_format);
                        out.insert(target.to_string(), project_cell(&column.field_type, cell, format));
                    }
                    Value::Object(out)
                })
                .collect();
            payload.insert(key.to_string(), Value::Array(projected));
        }
        payload
    }

    fn collect_field(&self, record: &FieldRecord, payload: &mut Map<String, Value>) {
        let schema = &record.schema;
        if !schema.is_post {
            return;
        }
        match &record.value {
            FieldValue::Composite(parts) => {
                if let Some(key) = &schema.checkbox_json_data_key_name {
                    payload.insert(key.clone(), Value::Bool(parts.checked));
                }
                if let Some(key) = &schema.input_json_data_key_name {
                    payload.insert(key.clone(), Value::from(parts.text.clone()));
                }
            }
            FieldValue::Single(value) => {
                if let Some(key) = &schema.json_data_key_name {
                    let format = schema
                        .post_date_format
                        .as_deref()
                        .unwrap_or(&self.config.default_date_format);
                    let projected = project_field(&schema.field_type, schema.is_multi_select, value, format);
                    payload.insert(key.clone(), projected);
                }
            }
        }
    }
}

fn project_field(field_type: &FieldType, multi_select: bool, value: &Value, format: &str) -> Value {
    match field_type {
        FieldType::Modal | FieldType::ModalInput | FieldType::SelectDropdown => {
            if multi_select {
                Value::Array(match value {
                    Value::Array(items) => items.iter().map(display_value).collect(),
                    Value::Null => Vec::new(),
                    other => vec![display_value(other)],
                })
            } else {
                or_empty(&display_value(value))
            }
        }
        FieldType::Checkbox => Value::Bool(truthy(value)),
        FieldType::DatePickerSingle => Value::from(date::format_for_submission(value, format)),
        FieldType::MultiSelectWithInputDiv | FieldType::MultiSelectWithDropdownInputDiv => match value {
            Value::Array(items) => Value::Array(items.clone()),
            _ => Value::Array(Vec::new()),
        },
        FieldType::ClockPicker => or_empty(value),
        FieldType::ColorPicker => Value::from(bare_hex(value)),
        FieldType::Heading
        | FieldType::Accordion
        | FieldType::EmptyDiv
        | FieldType::RadioButton
        | FieldType::ClockPickerCheckbox
        | FieldType::TextArea
        | FieldType::InputField
        | FieldType::Other(_) => scalar(value),
    }
}

fn project_cell(column_type: &ColumnType, value: &Value, format: &str) -> Value {
    match column_type {
        ColumnType::Modal | ColumnType::ModalInput | ColumnType::SelectDropdown => match value {
            Value::Array(items) if !items.is_empty() => {
                Value::Array(items.iter().map(display_value).collect())
            }
            other => or_empty(&display_value(other)),
        },
        ColumnType::DatePickerSingle => Value::from(date::format_for_submission(value, format)),
        ColumnType::ColorPicker => Value::from(bare_hex(value)),
        ColumnType::AutoIncrement
        | ColumnType::Display
        | ColumnType::Delete
        | ColumnType::InputField
        | ColumnType::ClockPicker
        | ColumnType::Other(_) => or_empty(value),
    }
}

/// Text shown for an option record: its code, else description, else `Value`.
/// Lists are joined with ", ".
pub fn display_value(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(|v| as_text(&display_value(v))).collect();
            Value::from(parts.join(", "))
        }
        Value::Object(record) => ["code", "description", "Value"]
            .iter()
            .filter_map(|k| record.get(*k))
            .find(|v| truthy(v))
            .cloned()
            .unwrap_or_else(|| Value::from("")),
        other => other.clone(),
    }
}

fn scalar(value: &Value) -> Value {
    match value {
        Value::Object(record) => record
            .get("code")
            .filter(|v| truthy(v))
            .cloned()
            .unwrap_or_else(|| Value::from("")),
        other => or_empty(other),
    }
}

fn bare_hex(value: &Value) -> String {
    as_text(value).replacen('#', "", 1)
}

fn or_empty(value: &Value) -> Value {
    if truthy(value) {
        value.clone()
    } else {
        Value::from("")
    }
}

pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
