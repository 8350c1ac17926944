//! Field catalog normalization: merges checkbox+input fields into the field
//! list and attaches picker binding metadata.

use crate::config::FormConfig;
use crate::field_type::FieldType;
use crate::schema::{FieldSchema, PickerSchema, SchemaDocument};

pub fn normalize(doc: &SchemaDocument, config: &FormConfig) -> Vec<FieldSchema> {
    let mut fields: Vec<FieldSchema> = doc
        .dynamic_fields
        .iter()
        .filter(|f| f.field_type != FieldType::ClockPickerCheckbox)
        .cloned()
        .collect();

    let composites: Vec<FieldSchema> = doc
        .form_input_checkbox
        .iter()
        .filter(|f| !matches!(f.field_type, FieldType::EmptyDiv | FieldType::ClockPickerCheckbox))
        .cloned()
        .map(|mut f| {
            f.is_form_input_checkbox = true;
            f.display_seq_no = config.composite_seq_no;
            f
        })
        .collect();

    if !composites.is_empty() {
        // Ordinary fields must all rank after the composite group, even when a
        // schema carries sequence numbers below the configured offset.
        let lowest = fields.iter().map(|f| f.display_seq_no).min().unwrap_or(0);
        let shift = config
            .seq_offset
            .max(config.composite_seq_no.saturating_add(1).saturating_sub(lowest));
        for field in &mut fields {
            field.display_seq_no = field.display_seq_no.saturating_add(shift);
        }
        fields.splice(0..0, composites);
    }

    for field in &mut fields {
        if let Some(binding) = doc.picker_for_field(&field.key) {
            apply_binding(field, binding);
        }
    }

    log::debug!("Normalized {} fields", fields.len());
    fields
}

fn apply_binding(field: &mut FieldSchema, binding: &PickerSchema) {
    if binding.on_click_func_name.is_some() {
        field.on_click_func_name = binding.on_click_func_name.clone();
    }
    if let Some(multi) = binding.is_multi_select {
        field.is_multi_select = multi;
    }
    if let Some(post) = binding.is_post {
        field.is_post = post;
    }
    if binding.json_data_key_name.is_some() {
        field.json_data_key_name = binding.json_data_key_name.clone();
    }
    if !binding.field_data.is_null() {
        field.field_data = binding.field_data.clone();
    }
    if field.table_data_enum.is_none() {
        field.table_data_enum = binding.table_data_enum;
    }
    if binding.child_modal_id.is_some() {
        field.child_modal_id = binding.child_modal_id.clone();
    }
}
