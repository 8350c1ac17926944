use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::field_type::{ColumnType, FieldType};

/// Identifier of a remote lookup table of selectable records.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct OptionSourceId(pub i64);

impl std::fmt::Display for OptionSourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A form description as served by the backend.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    #[serde(default, deserialize_with = "de::nullable")]
    pub dynamic_fields: Vec<FieldSchema>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub form_input_checkbox: Vec<FieldSchema>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub tabs: Vec<TabSchema>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub accordions: Vec<AccordionSchema>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub form_tables: Vec<TableSchema>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub form_tables_columns: Vec<TableColumnSchema>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub page_table_modals: Vec<PickerSchema>,
    /// Pre-filled table rows keyed by table data key.
    #[serde(default, deserialize_with = "de::nullable")]
    pub data: Map<String, Value>,
}

impl SchemaDocument {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn picker_for_field(&self, field_key: &str) -> Option<&PickerSchema> {
        self.page_table_modals
            .iter()
            .find(|p| p.configuration_key.as_deref() == Some(field_key))
    }

    pub fn picker_by_id(&self, modal_id: &str) -> Option<&PickerSchema> {
        self.page_table_modals
            .iter()
            .find(|p| p.modal_id.as_deref() == Some(modal_id))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    #[serde(rename = "jquerySelectorID", default, deserialize_with = "de::id")]
    pub key: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub display_name: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub placeholder: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub heading: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub field_type: FieldType,
    #[serde(default, deserialize_with = "de::nullable")]
    pub field_data_type: String,
    #[serde(default)]
    pub default_value: Value,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_required: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_read_only: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_post: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_header: bool,
    /// Set by normalization on checkbox+input fields.
    #[serde(default, deserialize_with = "de::flag")]
    pub is_form_input_checkbox: bool,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub json_data_key_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub parent_json_data_key_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub child_json_data_key_name: Option<String>,
    #[serde(rename = "parentTabID", default, deserialize_with = "de::number")]
    pub parent_tab_id: i64,
    #[serde(rename = "parentAccordionID", default, deserialize_with = "de::number")]
    pub parent_accordion_id: i64,
    #[serde(default, deserialize_with = "de::number")]
    pub display_seq_no: i64,
    #[serde(default, deserialize_with = "de::number")]
    pub layout_class: i64,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub validation_message: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub post_date_format: Option<String>,
    #[serde(default, deserialize_with = "de::option_source")]
    pub table_data_enum: Option<OptionSourceId>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub on_click_func_name: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_multi_select: bool,
    #[serde(rename = "childModalID", default, deserialize_with = "de::opt_id")]
    pub child_modal_id: Option<String>,
    /// Attached option list; may arrive as a JSON-encoded string.
    #[serde(default)]
    pub field_data: Value,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub checkbox_json_data_key_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub input_json_data_key_name: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub default_checkbox_value: bool,
    #[serde(default, deserialize_with = "de::nullable")]
    pub default_input_value: String,
}

impl FieldSchema {
    pub fn options(&self) -> Vec<Value> {
        option_list(&self.field_data)
    }

    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.placeholder
        } else {
            &self.display_name
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabSchema {
    #[serde(default, deserialize_with = "de::number")]
    pub tab_id: i64,
    #[serde(default, deserialize_with = "de::nullable")]
    pub display_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccordionSchema {
    #[serde(default, deserialize_with = "de::number")]
    pub accordion_id: i64,
    #[serde(default, deserialize_with = "de::nullable")]
    pub display_name: String,
    /// Tab containing the accordion; 0 is the general section.
    #[serde(rename = "parentTabID", default, deserialize_with = "de::number")]
    pub parent_tab_id: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    #[serde(default, deserialize_with = "de::number")]
    pub id: i64,
    #[serde(rename = "tableID", default, deserialize_with = "de::id")]
    pub table_code: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub table_header_name: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub json_data_key_name: Option<String>,
    #[serde(rename = "parentTabID", default, deserialize_with = "de::number")]
    pub parent_tab_id: i64,
    #[serde(rename = "parentAccordionID", default, deserialize_with = "de::number")]
    pub parent_accordion_id: i64,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_post: bool,
    #[serde(default = "enabled", deserialize_with = "de::flag_on")]
    pub is_add_new_row_enabled: bool,
    #[serde(default = "enabled", deserialize_with = "de::flag_on")]
    pub is_delete_row_btn_enabled: bool,
    #[serde(default)]
    pub table_data: Value,
}

fn enabled() -> bool {
    true
}

impl TableSchema {
    /// Key under which the table's rows are stored and submitted.
    pub fn key(&self) -> &str {
        self.json_data_key_name.as_deref().unwrap_or(&self.table_code)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TableColumnSchema {
    #[serde(rename = "columnTableID", default, deserialize_with = "de::number")]
    pub column_table_id: i64,
    #[serde(default, deserialize_with = "de::id")]
    pub column_name: String,
    #[serde(default, deserialize_with = "de::nullable")]
    pub display_name: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub property_code: Option<String>,
    #[serde(default, deserialize_with = "de::nullable")]
    pub field_type: ColumnType,
    #[serde(default, deserialize_with = "de::nullable")]
    pub field_data_type: String,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_required: bool,
    #[serde(default, deserialize_with = "de::nullable")]
    pub placeholder: String,
    #[serde(rename = "modalID", default, deserialize_with = "de::opt_id")]
    pub modal_id: Option<String>,
    #[serde(rename = "childModalID", default, deserialize_with = "de::opt_id")]
    pub child_modal_id: Option<String>,
    #[serde(default, deserialize_with = "de::option_source")]
    pub table_data_enum: Option<OptionSourceId>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub json_data_key_name: Option<String>,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_post: bool,
    #[serde(default)]
    pub field_data: Value,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_multi_select: bool,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub post_date_format: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub on_click_func_name: Option<String>,
}

impl TableColumnSchema {
    pub fn options(&self) -> Vec<Value> {
        option_list(&self.field_data)
    }
}

/// Picker binding (`pageTableModals` entry).
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PickerSchema {
    #[serde(rename = "modalID", default, deserialize_with = "de::opt_id")]
    pub modal_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub configuration_key: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub modal_title: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub on_click_func_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_flag")]
    pub is_multi_select: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_flag")]
    pub is_post: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub json_data_key_name: Option<String>,
    #[serde(default)]
    pub field_data: Value,
    #[serde(default, deserialize_with = "de::option_source")]
    pub table_data_enum: Option<OptionSourceId>,
    #[serde(default, deserialize_with = "de::opt_id")]
    pub api_params: Option<String>,
    #[serde(rename = "childModalID", default, deserialize_with = "de::opt_id")]
    pub child_modal_id: Option<String>,
}

impl PickerSchema {
    pub fn options(&self) -> Vec<Value> {
        option_list(&self.field_data)
    }

    pub fn title(&self) -> Option<&str> {
        self.modal_title
            .as_deref()
            .or(self.display_name.as_deref())
    }
}

/// Reads an attached option list. Lists sometimes arrive JSON-encoded inside a
/// string; anything that is not a list yields no options.
pub fn option_list(data: &Value) -> Vec<Value> {
    match data {
        Value::Array(items) => items.clone(),
        Value::String(text) if text.trim().is_empty() => Vec::new(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => items,
            Ok(_) | Err(_) => {
                log::warn!("Ignoring option list that is not a JSON array: {}", text);
                Vec::new()
            }
        },
        _ => Vec::new(),
    }
}

/// Lenient readers for backend documents, which mix nulls, numbers and strings
/// for the same keys.
mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::OptionSourceId;

    pub fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }

    /// Booleans also arrive as `0`/`1` or `"true"`/`"false"` strings.
    fn truth(value: Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "y" => Some(true),
                "false" | "0" | "no" | "n" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(truth(Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn opt_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(truth(Value::deserialize(d)?))
    }

    pub fn flag_on<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(truth(Value::deserialize(d)?).unwrap_or(true))
    }

    fn text(value: Value) -> Option<String> {
        match value {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(text(Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(text(Value::deserialize(d)?))
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        })
    }

    /// Zero, null and blank all mean "no remote source".
    pub fn option_source<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<OptionSourceId>, D::Error> {
        let id = number(d)?;
        Ok((id != 0).then_some(OptionSourceId(id)))
    }
}
