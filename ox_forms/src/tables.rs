//! Sub-table materialization and row storage.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::error::{FormError, Result};
use crate::field_type::ColumnType;
use crate::schema::{SchemaDocument, TableColumnSchema, TableSchema};

pub type Row = Map<String, Value>;

#[derive(Clone, Debug, Default)]
pub struct TableStore {
    tables: Vec<TableSchema>,
    columns: BTreeMap<i64, Vec<TableColumnSchema>>,
    rows: HashMap<String, Vec<Row>>,
}

impl TableStore {
    pub fn build(doc: &SchemaDocument) -> Self {
        let mut columns: BTreeMap<i64, Vec<TableColumnSchema>> = BTreeMap::new();
        for column in &doc.form_tables_columns {
            columns
                .entry(column.column_table_id)
                .or_default()
                .push(enrich_column(doc, column));
        }

        let mut rows = HashMap::new();
        for table in &doc.form_tables {
            let key = table.key().to_string();
            let initial = match doc.data.get(&key) {
                Some(Value::Array(items)) => to_rows(&key, items),
                _ => match &table.table_data {
                    Value::Array(items) => to_rows(&key, items),
                    _ => Vec::new(),
                },
            };
            rows.insert(key, initial);
        }

        TableStore {
            tables: doc.form_tables.clone(),
            columns,
            rows,
        }
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn table(&self, key: &str) -> Result<&TableSchema> {
        self.tables
            .iter()
            .find(|t| t.key() == key)
            .ok_or_else(|| FormError::UnknownTable(key.to_string()))
    }

    pub fn columns(&self, table: &TableSchema) -> &[TableColumnSchema] {
        self.columns.get(&table.id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn column(&self, key: &str, column: &str) -> Result<&TableColumnSchema> {
        let table = self.table(key)?;
        self.columns(table)
            .iter()
            .find(|c| c.column_name == column)
            .ok_or_else(|| FormError::UnknownColumn {
                table: key.to_string(),
                column: column.to_string(),
            })
    }

    pub(crate) fn column_mut(&mut self, key: &str, column: &str) -> Result<&mut TableColumnSchema> {
        let table_id = self.table(key)?.id;
        self.columns
            .get_mut(&table_id)
            .and_then(|cols| cols.iter_mut().find(|c| c.column_name == column))
            .ok_or_else(|| FormError::UnknownColumn {
                table: key.to_string(),
                column: column.to_string(),
            })
    }

    pub fn rows(&self, key: &str) -> Result<&[Row]> {
        self.rows
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| FormError::UnknownTable(key.to_string()))
    }

    fn rows_mut(&mut self, key: &str) -> Result<&mut Vec<Row>> {
        self.rows
            .get_mut(key)
            .ok_or_else(|| FormError::UnknownTable(key.to_string()))
    }

    fn auto_increment_column(&self, key: &str) -> Result<Option<String>> {
        let table = self.table(key)?;
        Ok(self
            .columns(table)
            .iter()
            .find(|c| c.field_type == ColumnType::AutoIncrement)
            .map(|c| c.column_name.clone()))
    }

    /// Appends an empty row and returns its index.
    pub fn add_row(&mut self, key: &str) -> Result<usize> {
        let table = self.table(key)?;
        if !table.is_add_new_row_enabled {
            return Err(FormError::AddRowDisabled(key.to_string()));
        }
        let names: Vec<(String, bool)> = self
            .columns(table)
            .iter()
            .map(|c| (c.column_name.clone(), c.field_type == ColumnType::AutoIncrement))
            .collect();
        let rows = self.rows_mut(key)?;
        let next = rows.len() + 1;
        let mut row = Row::new();
        for (name, counter) in names {
            let cell = if counter { Value::from(next) } else { Value::from("") };
            row.insert(name, cell);
        }
        rows.push(row);
        log::debug!("Added row {} to table '{}'", next - 1, key);
        Ok(next - 1)
    }

    /// Removes a row and renumbers the auto-increment column of every
    /// remaining row.
    pub fn delete_row(&mut self, key: &str, index: usize) -> Result<Row> {
        if !self.table(key)?.is_delete_row_btn_enabled {
            return Err(FormError::DeleteRowDisabled(key.to_string()));
        }
        let counter = self.auto_increment_column(key)?;
        let rows = self.rows_mut(key)?;
        if index >= rows.len() {
            return Err(FormError::RowOutOfRange {
                table: key.to_string(),
                row: index,
                len: rows.len(),
            });
        }
        let removed = rows.remove(index);
        if let Some(column) = counter {
            for (i, row) in rows.iter_mut().enumerate() {
                row.insert(column.clone(), Value::from(i + 1));
            }
        }
        Ok(removed)
    }

    pub fn set_cell(&mut self, key: &str, row: usize, column: &str, value: Value) -> Result<()> {
        self.column(key, column)?;
        let cells = self.row_mut(key, row)?;
        cells.insert(column.to_string(), value);
        Ok(())
    }

    pub(crate) fn row_mut(&mut self, key: &str, row: usize) -> Result<&mut Row> {
        let rows = self.rows_mut(key)?;
        let len = rows.len();
        rows.get_mut(row).ok_or_else(|| FormError::RowOutOfRange {
            table: key.to_string(),
            row,
            len,
        })
    }

    /// Fills the column after `column` from a committed selection when that
    /// column is a read-only display column.
    pub(crate) fn populate_display(
        &mut self,
        key: &str,
        row: usize,
        column: &str,
        selection: &Value,
    ) -> Result<()> {
        let table = self.table(key)?;
        let columns = self.columns(table);
        let next = match columns.iter().position(|c| c.column_name == column) {
            Some(i) if i + 1 < columns.len() => &columns[i + 1],
            _ => return Ok(()),
        };
        if next.field_type != ColumnType::Display {
            return Ok(());
        }

        let description = selection
            .get("description")
            .filter(|d| !is_blank(d))
            .cloned();
        let fill = match (&next.property_code, description) {
            (None, Some(d)) => Some(d),
            (Some(_), Some(d)) if next.display_name.eq_ignore_ascii_case("description") => Some(d),
            (Some(code), _) => Some(property(selection, code)),
            (None, None) => None,
        };
        if let Some(value) = fill {
            let target = next.column_name.clone();
            self.row_mut(key, row)?.insert(target, value);
        }
        Ok(())
    }
}

/// Case-insensitive property lookup with an empty-string fallback.
fn property(selection: &Value, code: &str) -> Value {
    let Some(record) = selection.as_object() else {
        return Value::from("");
    };
    record
        .get(&code.to_lowercase())
        .or_else(|| record.get(code))
        .or_else(|| {
            record
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(code))
                .map(|(_, v)| v)
        })
        .filter(|v| !is_blank(v))
        .cloned()
        .unwrap_or_else(|| Value::from(""))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn enrich_column(doc: &SchemaDocument, column: &TableColumnSchema) -> TableColumnSchema {
    let mut column = column.clone();
    let Some(modal_id) = column.modal_id.clone() else {
        return column;
    };
    match doc.picker_by_id(&modal_id) {
        Some(picker) => {
            if !picker.options().is_empty() {
                column.field_data = picker.field_data.clone();
            }
            if column.table_data_enum.is_none() {
                column.table_data_enum = picker.table_data_enum;
            }
            column.is_multi_select = picker.is_multi_select.unwrap_or(false);
            if column.on_click_func_name.is_none() {
                column.on_click_func_name = picker.on_click_func_name.clone();
            }
        }
        None => log::warn!(
            "Column '{}' references unknown picker '{}'",
            column.column_name,
            modal_id
        ),
    }
    column
}

fn to_rows(key: &str, items: &[Value]) -> Vec<Row> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(row) => Some(row.clone()),
            other => {
                log::warn!("Skipping non-object row in table '{}': {}", key, other);
                None
            }
        })
        .collect()
}
