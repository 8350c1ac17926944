//! The interaction engine: owns all form state and mediates every mutation.
//!
//! The engine performs no I/O. Operations that need a remote option list hand
//! back an [`OptionFetch`]; the host runs the lookup and passes the result to
//! [`FormEngine::deliver_options`], which drops it when the request has since
//! been superseded or the engine torn down.

use ox_callback_manager::{CallbackRegistry, EventType};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::collect::Collector;
use crate::config::FormConfig;
use crate::error::{FormError, Result};
use crate::field_type::{ColumnType, FieldType};
use crate::layout::{FieldId, FieldRecord, FieldValue, FormLayout};
use crate::normalize::normalize;
use crate::picker::{
    lookup_code, FetchPurpose, FetchTicket, OptionFetch, PickerOpen, PickerPhase, PickerSession,
    PickerTarget, SelectionOutcome,
};
use crate::render::{RenderDispatcher, RenderPlan};
use crate::schema::{FieldSchema, OptionSourceId, PickerSchema, SchemaDocument};
use crate::tables::{Row, TableStore};
use crate::validation::{ValidationError, Validator};

/// Passed to named callbacks after a picker commit.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionEvent {
    /// Field identifier, or column name for table cells.
    pub field: String,
    pub target: PickerTarget,
    pub selection: Value,
}

pub type SelectionCallbacks = CallbackRegistry<SelectionEvent>;

pub struct FormEngine {
    id: Uuid,
    config: FormConfig,
    pickers: Vec<PickerSchema>,
    layout: FormLayout,
    tables: TableStore,
    active_tab: usize,
    picker: Option<PickerSession>,
    dropdown_requests: HashMap<FieldId, u64>,
    next_seq: u64,
    errors: Vec<ValidationError>,
    callbacks: SelectionCallbacks,
    torn_down: bool,
}

impl FormEngine {
    /// Builds fresh state from a schema document.
    pub fn new(doc: &SchemaDocument, config: FormConfig) -> Self {
        let fields = normalize(doc, &config);
        let layout = FormLayout::build(fields, &doc.tabs, &doc.accordions);
        let tables = TableStore::build(doc);
        let id = Uuid::new_v4();
        log::debug!(
            "Form engine {} ready: {} fields, {} tables",
            id,
            layout.len(),
            tables.tables().len()
        );
        FormEngine {
            id,
            config,
            pickers: doc.page_table_modals.clone(),
            layout,
            tables,
            active_tab: 0,
            picker: None,
            dropdown_requests: HashMap::new(),
            next_seq: 0,
            errors: Vec::new(),
            callbacks: SelectionCallbacks::new(),
            torn_down: false,
        }
    }

    pub fn with_callbacks(mut self, callbacks: SelectionCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn callbacks_mut(&mut self) -> &mut SelectionCallbacks {
        &mut self.callbacks
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn layout(&self) -> &FormLayout {
        &self.layout
    }

    pub fn tables(&self) -> &TableStore {
        &self.tables
    }

    pub fn picker(&self) -> Option<&PickerSession> {
        self.picker.as_ref()
    }

    pub fn active_tab(&self) -> usize {
        self.active_tab
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn error_for(&self, key: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == key)
            .map(|e| e.message.as_str())
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn find_field(&self, key: &str) -> Option<FieldId> {
        self.layout.find(key)
    }

    pub fn field(&self, id: FieldId) -> Result<&FieldRecord> {
        self.layout.record(id)
    }

    pub fn value(&self, id: FieldId) -> Result<&FieldValue> {
        Ok(self.layout.record(id)?.value())
    }

    pub fn rows(&self, table: &str) -> Result<&[Row]> {
        self.tables.rows(table)
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn clear_error(&mut self, key: &str) {
        self.errors.retain(|e| e.field != key);
    }

    fn editable(&mut self, id: FieldId) -> Result<&mut FieldRecord> {
        let record = self.layout.record_mut(id)?;
        if record.schema.is_read_only {
            return Err(FormError::ReadOnly(record.schema.key.clone()));
        }
        Ok(record)
    }

    // --- field edits ---

    /// Writes a directly edited value. Color values are stored without `#`.
    pub fn edit_field(&mut self, id: FieldId, value: Value) -> Result<()> {
        let record = self.editable(id)?;
        if record.is_composite() {
            return Err(FormError::CompositeField(record.schema.key.clone()));
        }
        let value = match (&record.schema.field_type, value) {
            (FieldType::ColorPicker, Value::String(s)) => Value::String(s.replacen('#', "", 1)),
            (_, v) => v,
        };
        record.value = FieldValue::Single(value);
        let key = record.schema.key.clone();
        self.clear_error(&key);
        self.cascade(id);
        Ok(())
    }

    pub fn set_checkbox(&mut self, id: FieldId, checked: bool) -> Result<()> {
        let record = self.editable(id)?;
        match &mut record.value {
            FieldValue::Composite(parts) => parts.checked = checked,
            FieldValue::Single(_) => return Err(FormError::NotComposite(record.schema.key.clone())),
        }
        let key = record.schema.key.clone();
        self.clear_error(&key);
        Ok(())
    }

    pub fn set_checkbox_text(&mut self, id: FieldId, text: impl Into<String>) -> Result<()> {
        let record = self.editable(id)?;
        match &mut record.value {
            FieldValue::Composite(parts) => parts.text = text.into(),
            FieldValue::Single(_) => return Err(FormError::NotComposite(record.schema.key.clone())),
        }
        let key = record.schema.key.clone();
        self.clear_error(&key);
        Ok(())
    }

    fn entries_mut(&mut self, id: FieldId, with_options: bool) -> Result<(&FieldSchema, &mut Vec<Value>)> {
        let record = self.editable(id)?;
        let accepted = if with_options {
            record.schema.field_type == FieldType::MultiSelectWithDropdownInputDiv
        } else {
            record.schema.field_type.is_multi_entry()
        };
        if !accepted {
            return Err(FormError::NotMultiEntry(record.schema.key.clone()));
        }
        let FieldRecord { schema, value, .. } = record;
        if !matches!(value, FieldValue::Single(Value::Array(_))) {
            *value = FieldValue::Single(Value::Array(Vec::new()));
        }
        match value {
            FieldValue::Single(Value::Array(items)) => Ok((&*schema, items)),
            _ => Err(FormError::NotMultiEntry(schema.key.clone())),
        }
    }

    /// Appends a trimmed entry. Blank text is ignored and returns `false`.
    pub fn add_entry(&mut self, id: FieldId, text: &str) -> Result<bool> {
        let (schema, items) = self.entries_mut(id, false)?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }
        items.push(Value::from(text));
        let key = schema.key.clone();
        self.clear_error(&key);
        Ok(true)
    }

    /// Appends an entry built from text and a picked option; the text is stored
    /// under the field's child key and the option's own keys are merged in.
    pub fn add_option_entry(&mut self, id: FieldId, text: &str, option: &Value) -> Result<bool> {
        let (schema, items) = self.entries_mut(id, true)?;
        let text = text.trim();
        if text.is_empty() || option.is_null() {
            return Ok(false);
        }
        let child_key = schema
            .child_json_data_key_name
            .clone()
            .unwrap_or_else(|| "value".to_string());
        let mut entry = Map::new();
        entry.insert(child_key, Value::from(text));
        if let Value::Object(fields) = option {
            entry.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        items.push(Value::Object(entry));
        let key = schema.key.clone();
        self.clear_error(&key);
        Ok(true)
    }

    pub fn remove_entry(&mut self, id: FieldId, index: usize) -> Result<Value> {
        let (schema, items) = self.entries_mut(id, false)?;
        if index >= items.len() {
            return Err(FormError::EntryOutOfRange {
                field: schema.key.clone(),
                index,
            });
        }
        Ok(items.remove(index))
    }

    /// Copies a picker-like field's selected description into every field that
    /// names it as parent.
    fn cascade(&mut self, source: FieldId) {
        let Ok(record) = self.layout.record(source) else {
            return;
        };
        let schema = record.schema();
        if !schema.field_type.is_picker_like() {
            return;
        }
        let Some(parent_key) = schema.json_data_key_name.clone().filter(|k| !k.is_empty()) else {
            return;
        };
        let description = match record.value() {
            FieldValue::Single(Value::Object(selection)) => match selection.get("description") {
                Some(Value::String(d)) if !d.is_empty() => d.clone(),
                _ => return,
            },
            _ => return,
        };

        let mut touched = Vec::new();
        for dependent in self.layout.records_mut() {
            if dependent.id == source || dependent.is_composite() {
                continue;
            }
            if dependent.schema.parent_json_data_key_name.as_deref() == Some(parent_key.as_str()) {
                dependent.value = FieldValue::Single(Value::from(description.clone()));
                touched.push(dependent.schema.key.clone());
            }
        }
        if !touched.is_empty() {
            log::debug!("Cascaded '{}' from '{}' into {:?}", description, parent_key, touched);
            self.errors.retain(|e| !touched.contains(&e.field));
        }
    }

    // --- tabs ---

    pub fn set_active_tab(&mut self, index: usize) -> Result<()> {
        let count = self.layout.tabs().len();
        if index >= count {
            return Err(FormError::TabOutOfRange { index, count });
        }
        self.active_tab = index;
        Ok(())
    }

    // --- option lists ---

    /// Starts a lazy load for an inline dropdown. Returns `None` when the field
    /// has no remote source.
    pub fn request_field_options(&mut self, id: FieldId) -> Result<Option<OptionFetch>> {
        let record = self.layout.record(id)?;
        let schema = record.schema();
        if !matches!(
            schema.field_type,
            FieldType::SelectDropdown | FieldType::MultiSelectWithDropdownInputDiv
        ) {
            return Err(FormError::NotAPicker(schema.key.clone()));
        }
        let Some(source) = schema.table_data_enum else {
            return Ok(None);
        };
        let seq = self.next_seq();
        self.dropdown_requests.insert(id, seq);
        Ok(Some(OptionFetch {
            ticket: FetchTicket {
                engine: self.id,
                seq,
                purpose: FetchPurpose::Dropdown(id),
            },
            source,
            params: String::new(),
        }))
    }

    /// Applies a fetched list. Returns `false` when the response is stale and
    /// was dropped.
    pub fn deliver_options(&mut self, ticket: FetchTicket, options: Vec<Value>) -> bool {
        if ticket.engine != self.id || self.torn_down {
            log::debug!("Dropping option list for engine {} (current {})", ticket.engine, self.id);
            return false;
        }
        match ticket.purpose {
            FetchPurpose::Picker => self.deliver_to_picker(ticket.seq, options),
            FetchPurpose::Dropdown(id) => {
                if self.dropdown_requests.get(&id) != Some(&ticket.seq) {
                    log::debug!("Dropping superseded dropdown list for {:?}", id);
                    return false;
                }
                self.dropdown_requests.remove(&id);
                match self.layout.record_mut(id) {
                    Ok(record) => {
                        record.schema.field_data = Value::Array(options);
                        true
                    }
                    Err(_) => false,
                }
            }
        }
    }

    fn deliver_to_picker(&mut self, seq: u64, options: Vec<Value>) -> bool {
        let Some(session) = self
            .picker
            .as_mut()
            .filter(|s| s.seq == seq && s.phase == PickerPhase::Opening)
        else {
            log::debug!("Dropping option list for closed or superseded picker session {}", seq);
            return false;
        };
        session.phase = PickerPhase::Open;
        let cache = (!session.is_child() && !options.is_empty()).then(|| options.clone());
        session.options = options;
        let target = session.target.clone();

        // Later opens of the same field or column are served locally.
        if let Some(list) = cache {
            match target {
                PickerTarget::Field(id) => {
                    if let Ok(record) = self.layout.record_mut(id) {
                        record.schema.field_data = Value::Array(list);
                    }
                }
                PickerTarget::Cell { table, column, .. } => {
                    if let Ok(col) = self.tables.column_mut(&table, &column) {
                        col.field_data = Value::Array(list);
                    }
                }
            }
        }
        true
    }

    // --- picker sessions ---

    fn picker_by_id(&self, modal_id: &str) -> Option<&PickerSchema> {
        self.pickers
            .iter()
            .find(|p| p.modal_id.as_deref() == Some(modal_id))
    }

    fn field_title(&self, schema: &FieldSchema) -> String {
        self.pickers
            .iter()
            .find(|p| p.configuration_key.as_deref() == Some(schema.key.as_str()))
            .and_then(|p| p.modal_title.clone())
            .filter(|t| !t.is_empty() && *t != self.config.default_picker_title)
            .or_else(|| Some(schema.display_name.clone()).filter(|t| !t.is_empty()))
            .or_else(|| Some(schema.placeholder.clone()).filter(|t| !t.is_empty()))
            .unwrap_or_else(|| self.config.default_picker_title.clone())
    }

    fn start_session(
        &mut self,
        mut session: PickerSession,
        options: Vec<Value>,
        source: Option<OptionSourceId>,
        params: String,
    ) -> PickerOpen {
        let source = source.filter(|_| options.is_empty());
        let open = match source {
            Some(source) => {
                session.phase = PickerPhase::Opening;
                PickerOpen::Fetch(OptionFetch {
                    ticket: FetchTicket {
                        engine: self.id,
                        seq: session.seq,
                        purpose: FetchPurpose::Picker,
                    },
                    source,
                    params,
                })
            }
            None => {
                session.phase = PickerPhase::Open;
                session.options = options;
                PickerOpen::Ready
            }
        };
        log::debug!("Picker '{}' opened for {:?} ({:?})", session.title, session.target, session.phase);
        // Any previous session is superseded here; its pending fetch is now stale.
        self.picker = Some(session);
        open
    }

    /// Opens a picker for a `modal` or `modalinput` field.
    pub fn open_picker(&mut self, id: FieldId) -> Result<PickerOpen> {
        let schema = self.layout.record(id)?.schema();
        if !schema.field_type.opens_picker() {
            return Err(FormError::NotAPicker(schema.key.clone()));
        }
        if schema.is_read_only {
            return Err(FormError::ReadOnly(schema.key.clone()));
        }
        let title = self.field_title(schema);
        let multi_select = schema.is_multi_select;
        let child = schema.child_modal_id.clone();
        let on_select = schema.on_click_func_name.clone();
        let options = schema.options();
        let source = schema.table_data_enum;

        let seq = self.next_seq();
        let mut session = PickerSession::new(seq, PickerTarget::Field(id), title, multi_select);
        session.child_picker_id = child;
        session.on_select = on_select;
        Ok(self.start_session(session, options, source, String::new()))
    }

    /// Opens the picker bound to a table cell. Columns without a declared
    /// binding open nothing.
    pub fn open_cell_picker(&mut self, table: &str, row: usize, column: &str) -> Result<PickerOpen> {
        let len = self.tables.rows(table)?.len();
        if row >= len {
            return Err(FormError::RowOutOfRange { table: table.to_string(), row, len });
        }
        let col = self.tables.column(table, column)?;
        if !matches!(col.field_type, ColumnType::Modal | ColumnType::ModalInput) {
            return Err(FormError::NotAPicker(format!("{}.{}", table, column)));
        }
        let Some(binding) = col.modal_id.as_deref().and_then(|m| self.picker_by_id(m)) else {
            log::warn!("Column '{}' of table '{}' has no picker binding", column, table);
            return Ok(PickerOpen::Unavailable);
        };
        let title = binding
            .modal_title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| col.display_name.clone());
        let multi_select = binding.is_multi_select.unwrap_or(false);
        let child = col.child_modal_id.clone();
        let on_select = col.on_click_func_name.clone();
        let options = col.options();
        let source = col.table_data_enum;

        let seq = self.next_seq();
        let target = PickerTarget::Cell {
            table: table.to_string(),
            row,
            column: column.to_string(),
        };
        let mut session = PickerSession::new(seq, target, title, multi_select);
        session.child_picker_id = child;
        session.on_select = on_select;
        Ok(self.start_session(session, options, source, String::new()))
    }

    pub fn close_picker(&mut self) {
        if let Some(session) = self.picker.take() {
            log::debug!("Picker '{}' closed without a selection", session.title);
        }
    }

    /// Single-select commits the option; multi-select toggles it in the
    /// pending set.
    pub fn choose(&mut self, option: Value) -> Result<SelectionOutcome> {
        let session = self.picker.as_mut().ok_or(FormError::NoPickerOpen)?;
        if session.phase == PickerPhase::Opening {
            return Err(FormError::PickerLoading);
        }
        if session.multi_select {
            session.toggle(option);
            return Ok(SelectionOutcome::Pending);
        }
        self.commit(option)
    }

    /// Commits the pending multi-select set. An empty set changes nothing.
    pub fn confirm(&mut self) -> Result<SelectionOutcome> {
        let session = self.picker.as_ref().ok_or(FormError::NoPickerOpen)?;
        if session.phase == PickerPhase::Opening {
            return Err(FormError::PickerLoading);
        }
        if !session.multi_select || session.pending.is_empty() {
            return Ok(SelectionOutcome::Pending);
        }
        let selection = Value::Array(session.pending.clone());
        self.commit(selection)
    }

    fn commit(&mut self, selection: Value) -> Result<SelectionOutcome> {
        let session = self.picker.take().ok_or(FormError::NoPickerOpen)?;
        if let Some(child_id) = session.child_picker_id.clone() {
            return Ok(self.chain(session, &child_id, selection));
        }

        let target = session.target.clone();
        self.write_selection(&target, &selection)?;
        log::debug!("Picker '{}' committed to {:?}", session.title, target);
        let messages = self.run_callback(session.on_select.as_deref(), target, selection);
        Ok(SelectionOutcome::Committed(messages))
    }

    fn chain(&mut self, mut session: PickerSession, child_id: &str, selection: Value) -> SelectionOutcome {
        let Some(child) = self.picker_by_id(child_id).cloned() else {
            log::warn!("Child picker '{}' is not declared; closing the picker", child_id);
            return SelectionOutcome::Closed;
        };
        let params = match child.table_data_enum {
            Some(_) => {
                let key = child
                    .api_params
                    .as_deref()
                    .filter(|k| !k.is_empty())
                    .unwrap_or("apiParams");
                format!("{}={}", key, lookup_code(&selection))
            }
            None => String::new(),
        };
        let options = match child.table_data_enum {
            Some(_) => Vec::new(),
            None => child.options(),
        };

        session.parents.push(selection);
        session.seq = self.next_seq();
        session.title = child
            .title()
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.config.default_picker_title.clone());
        session.multi_select = child.is_multi_select.unwrap_or(false);
        session.child_picker_id = child.child_modal_id.clone();
        session.options.clear();
        session.pending.clear();
        log::debug!("Chaining to child picker '{}' (depth {})", child_id, session.parents.len());
        SelectionOutcome::Chained(self.start_session(session, options, child.table_data_enum, params))
    }

    fn write_selection(&mut self, target: &PickerTarget, selection: &Value) -> Result<()> {
        match target {
            PickerTarget::Field(id) => {
                let record = self.layout.record_mut(*id)?;
                record.value = FieldValue::Single(selection.clone());
                let key = record.schema.key.clone();
                self.clear_error(&key);
                self.cascade(*id);
            }
            PickerTarget::Cell { table, row, column } => {
                self.tables.set_cell(table, *row, column, selection.clone())?;
                self.tables.populate_display(table, *row, column, selection)?;
            }
        }
        Ok(())
    }

    fn run_callback(&self, name: Option<&str>, target: PickerTarget, selection: Value) -> Vec<String> {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return Vec::new();
        };
        let field = match &target {
            PickerTarget::Field(id) => self
                .layout
                .record(*id)
                .map(|r| r.key().to_string())
                .unwrap_or_default(),
            PickerTarget::Cell { column, .. } => column.clone(),
        };
        let event = SelectionEvent { field, target, selection };
        match self.callbacks.trigger(&EventType::new(name), &event) {
            Ok(messages) => messages,
            Err(e) => {
                log::warn!("Callback '{}' failed after selection on '{}': {}", name, event.field, e);
                Vec::new()
            }
        }
    }

    // --- tables ---

    pub fn add_row(&mut self, table: &str) -> Result<usize> {
        self.tables.add_row(table)
    }

    pub fn delete_row(&mut self, table: &str, row: usize) -> Result<Row> {
        self.tables.delete_row(table, row)
    }

    pub fn set_cell(&mut self, table: &str, row: usize, column: &str, value: Value) -> Result<()> {
        let value = match (&self.tables.column(table, column)?.field_type, value) {
            (ColumnType::ColorPicker, Value::String(s)) => Value::String(s.replacen('#', "", 1)),
            (_, v) => v,
        };
        self.tables.set_cell(table, row, column, value)
    }

    // --- validation, collection, rendering ---

    /// Re-checks every required field and replaces the stored error set.
    pub fn validate(&mut self) -> &[ValidationError] {
        self.errors = Validator::new(&self.config).validate(&self.layout);
        &self.errors
    }

    pub fn collect(&self, employee_code: Option<&str>) -> Value {
        Value::Object(Collector::new(&self.config).collect(&self.layout, &self.tables, employee_code))
    }

    pub fn render_plan(&self) -> RenderPlan {
        RenderDispatcher::new(&self.layout, &self.tables, &self.config, &self.errors).plan(self.active_tab)
    }

    /// Discards in-flight work. Responses that arrive afterwards are dropped.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.picker = None;
        self.dropdown_requests.clear();
        log::debug!("Form engine {} torn down", self.id);
    }
}
