//! Maps fields and columns to presentation-neutral behaviors and lays them out
//! into sections, accordions, tables and tab pages.

use serde::Serialize;
use serde_json::Value;

use crate::collect::{as_text, truthy};
use crate::config::FormConfig;
use crate::field_type::{ColumnType, FieldType};
use crate::layout::{FieldId, FieldRecord, FieldValue, FormLayout};
use crate::schema::{OptionSourceId, TableSchema};
use crate::tables::{Row, TableStore};
use crate::validation::ValidationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Width {
    Full,
    Half,
    Third,
    Quarter,
}

impl Width {
    pub fn from_layout_class(units: i64) -> Self {
        match units {
            12 => Width::Full,
            6 => Width::Half,
            4 => Width::Third,
            3 => Width::Quarter,
            _ => Width::Half,
        }
    }

    pub fn units(self) -> u8 {
        match self {
            Width::Full => 12,
            Width::Half => 6,
            Width::Third => 4,
            Width::Quarter => 3,
        }
    }
}

/// What an input does and which value shape it works with.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum FieldBehavior {
    Heading { text: String },
    /// Two sub-values, each edited on its own.
    CheckboxInput { checked: bool, text: String },
    Spacer,
    /// Searchable inline list; `lazy_source` is fetched on first open.
    InlineList {
        options: Vec<Value>,
        lazy_source: Option<OptionSourceId>,
        selected: Value,
    },
    /// Opens a picker session. `editable` allows typing into the field too.
    Picker { display: String, multi_select: bool, editable: bool },
    Toggle { checked: bool },
    RadioChoice { options: Vec<Value>, selected: Value },
    Date { value: Value },
    Time { value: String },
    /// `hex` carries the leading `#` for the visual input.
    Color { hex: String },
    EntryList { entries: Vec<Value> },
    EntryListWithOptions {
        entries: Vec<Value>,
        options: Vec<Value>,
        lazy_source: Option<OptionSourceId>,
        entry_key: String,
    },
    Text { value: String, multiline: bool, numeric: bool },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum CellBehavior {
    Counter,
    ReadOnly,
    DeleteButton,
    Picker { multi_select: bool, editable: bool },
    InlineList { options: Vec<Value>, lazy_source: Option<OptionSourceId> },
    Color,
    Time,
    Date,
    Text,
}

#[derive(Clone, Debug, Serialize)]
pub struct FieldView {
    pub id: FieldId,
    pub key: String,
    pub label: String,
    pub placeholder: String,
    pub required: bool,
    pub read_only: bool,
    pub width: Width,
    pub behavior: FieldBehavior,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ColumnView {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub behavior: CellBehavior,
}

#[derive(Clone, Debug, Serialize)]
pub struct TableView {
    pub key: String,
    pub title: String,
    pub columns: Vec<ColumnView>,
    pub rows: Vec<Row>,
    pub can_add: bool,
    pub can_delete: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct AccordionView {
    pub id: i64,
    pub title: String,
    pub fields: Vec<FieldView>,
    pub tables: Vec<TableView>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SectionView {
    pub title: Option<String>,
    pub fields: Vec<FieldView>,
    pub accordions: Vec<AccordionView>,
    pub tables: Vec<TableView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TabView {
    pub id: i64,
    pub label: String,
    pub active: bool,
    pub fields: Vec<FieldView>,
    pub accordions: Vec<AccordionView>,
    pub tables: Vec<TableView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RenderPlan {
    pub header: SectionView,
    pub general: SectionView,
    pub tabs: Vec<TabView>,
}

pub struct RenderDispatcher<'a> {
    layout: &'a FormLayout,
    tables: &'a TableStore,
    config: &'a FormConfig,
    errors: &'a [ValidationError],
}

impl<'a> RenderDispatcher<'a> {
    pub fn new(
        layout: &'a FormLayout,
        tables: &'a TableStore,
        config: &'a FormConfig,
        errors: &'a [ValidationError],
    ) -> Self {
        RenderDispatcher { layout, tables, config, errors }
    }

    pub fn plan(&self, active_tab: usize) -> RenderPlan {
        let header = SectionView {
            title: Some(self.config.header_title.clone()),
            fields: self.field_views(self.layout.header()),
            ..Default::default()
        };
        let general = SectionView {
            title: None,
            fields: self.field_views(self.layout.general()),
            accordions: self.accordion_views(None),
            tables: self.tab_table_views(None),
        };
        let tabs = self
            .layout
            .tabs()
            .iter()
            .enumerate()
            .map(|(position, tab)| TabView {
                id: tab.tab_id,
                label: tab.display_name.clone(),
                active: position == active_tab,
                fields: self.field_views(self.layout.tab_fields(position)),
                accordions: self.accordion_views(Some(position)),
                tables: self.tab_table_views(Some(position)),
            })
            .collect();
        RenderPlan { header, general, tabs }
    }

    fn field_views(&self, ids: &[FieldId]) -> Vec<FieldView> {
        ids.iter()
            .filter_map(|id| self.layout.record(*id).ok())
            .map(|record| self.field_view(record))
            .collect()
    }

    fn accordion_views(&self, position: Option<usize>) -> Vec<AccordionView> {
        self.layout
            .accordions_in_tab(position)
            .into_iter()
            .map(|accordion_id| AccordionView {
                id: accordion_id,
                title: self
                    .layout
                    .accordion(accordion_id)
                    .map(|a| a.display_name.clone())
                    .unwrap_or_default(),
                fields: self.field_views(self.layout.accordion_fields(accordion_id)),
                tables: self
                    .tables
                    .tables()
                    .iter()
                    .filter(|t| t.parent_accordion_id == accordion_id)
                    .map(|table| self.table_view(table))
                    .collect(),
            })
            .collect()
    }

    /// Tables placed directly in a tab or the general section. A table whose
    /// accordion is not rendered anywhere falls back to its tab.
    fn tab_table_views(&self, position: Option<usize>) -> Vec<TableView> {
        let accordions = self.layout.accordion_order();
        self.tables
            .tables()
            .iter()
            .filter(|t| t.parent_accordion_id == 0 || !accordions.contains(&t.parent_accordion_id))
            .filter(|t| self.layout.resolve_tab(t.parent_tab_id) == position)
            .map(|table| self.table_view(table))
            .collect()
    }

    pub fn field_view(&self, record: &FieldRecord) -> FieldView {
        let schema = record.schema();
        FieldView {
            id: record.id(),
            key: schema.key.clone(),
            label: schema.display_name.clone(),
            placeholder: schema.placeholder.clone(),
            required: schema.is_required,
            read_only: schema.is_read_only,
            width: Width::from_layout_class(schema.layout_class),
            behavior: behavior(record),
            error: self
                .errors
                .iter()
                .find(|e| e.field == schema.key)
                .map(|e| e.message.clone()),
        }
    }

    pub fn table_view(&self, table: &TableSchema) -> TableView {
        let columns = self
            .tables
            .columns(table)
            .iter()
            .map(|column| ColumnView {
                name: column.column_name.clone(),
                label: column.display_name.clone(),
                required: column.is_required,
                behavior: cell_behavior(
                    &column.field_type,
                    column.is_multi_select,
                    column.options(),
                    column.table_data_enum,
                ),
            })
            .collect();
        TableView {
            key: table.key().to_string(),
            title: table.table_header_name.clone(),
            columns,
            rows: self.tables.rows(table.key()).map(<[Row]>::to_vec).unwrap_or_default(),
            can_add: table.is_add_new_row_enabled,
            can_delete: table.is_delete_row_btn_enabled,
        }
    }
}

pub fn behavior(record: &FieldRecord) -> FieldBehavior {
    let schema = record.schema();
    let value = match record.value() {
        FieldValue::Composite(parts) => {
            return FieldBehavior::CheckboxInput {
                checked: parts.checked,
                text: parts.text.clone(),
            }
        }
        FieldValue::Single(v) => v,
    };
    match &schema.field_type {
        FieldType::Heading => FieldBehavior::Heading {
            text: if schema.heading.is_empty() {
                schema.display_name.clone()
            } else {
                schema.heading.clone()
            },
        },
        // Containers and the unsupported composite never reach a partition.
        FieldType::EmptyDiv | FieldType::Accordion | FieldType::ClockPickerCheckbox => {
            FieldBehavior::Spacer
        }
        FieldType::SelectDropdown => FieldBehavior::InlineList {
            options: schema.options(),
            lazy_source: schema.table_data_enum,
            selected: value.clone(),
        },
        FieldType::Modal | FieldType::ModalInput => FieldBehavior::Picker {
            display: as_text(&crate::collect::display_value(value)),
            multi_select: schema.is_multi_select,
            editable: schema.field_type == FieldType::ModalInput,
        },
        FieldType::Checkbox => FieldBehavior::Toggle { checked: truthy(value) },
        FieldType::RadioButton => FieldBehavior::RadioChoice {
            options: schema.options(),
            selected: value.clone(),
        },
        FieldType::DatePickerSingle => FieldBehavior::Date { value: value.clone() },
        FieldType::ClockPicker => FieldBehavior::Time { value: as_text(value) },
        FieldType::ColorPicker => FieldBehavior::Color { hex: display_hex(value) },
        FieldType::MultiSelectWithInputDiv => FieldBehavior::EntryList { entries: entries(value) },
        FieldType::MultiSelectWithDropdownInputDiv => FieldBehavior::EntryListWithOptions {
            entries: entries(value),
            options: schema.options(),
            lazy_source: schema.table_data_enum,
            entry_key: schema
                .child_json_data_key_name
                .clone()
                .unwrap_or_else(|| "value".to_string()),
        },
        FieldType::TextArea => FieldBehavior::Text {
            value: as_text(value),
            multiline: true,
            numeric: is_numeric(&schema.field_data_type),
        },
        FieldType::InputField | FieldType::Other(_) => FieldBehavior::Text {
            value: as_text(value),
            multiline: false,
            numeric: is_numeric(&schema.field_data_type),
        },
    }
}

pub fn cell_behavior(
    column_type: &ColumnType,
    multi_select: bool,
    options: Vec<Value>,
    lazy_source: Option<OptionSourceId>,
) -> CellBehavior {
    match column_type {
        ColumnType::AutoIncrement => CellBehavior::Counter,
        ColumnType::Display => CellBehavior::ReadOnly,
        ColumnType::Delete => CellBehavior::DeleteButton,
        ColumnType::Modal => CellBehavior::Picker { multi_select, editable: false },
        ColumnType::ModalInput => CellBehavior::Picker { multi_select, editable: true },
        ColumnType::SelectDropdown => CellBehavior::InlineList { options, lazy_source },
        ColumnType::ColorPicker => CellBehavior::Color,
        ColumnType::ClockPicker => CellBehavior::Time,
        ColumnType::DatePickerSingle => CellBehavior::Date,
        ColumnType::InputField | ColumnType::Other(_) => CellBehavior::Text,
    }
}

fn display_hex(value: &Value) -> String {
    let digits = as_text(value);
    let digits = digits.trim_start_matches('#');
    if digits.is_empty() {
        "#000000".to_string()
    } else {
        format!("#{}", digits)
    }
}

fn entries(value: &Value) -> Vec<Value> {
    value.as_array().cloned().unwrap_or_default()
}

fn is_numeric(data_type: &str) -> bool {
    matches!(data_type.to_ascii_lowercase().as_str(), "int" | "integer" | "number" | "decimal")
}
