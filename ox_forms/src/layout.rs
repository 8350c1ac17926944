//! Field arena and partition indexes.
//!
//! Every normalized field lives in exactly one record of the arena and is
//! listed in exactly one partition index (header, general, a tab or an
//! accordion). Indexes hold `FieldId`s sorted by display sequence number.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::error::{FormError, Result};
use crate::field_type::FieldType;
use crate::schema::{AccordionSchema, FieldSchema, TabSchema};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FieldId(pub(crate) usize);

impl FieldId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Partition {
    Header,
    General,
    /// `position` indexes the sorted tab list.
    Tab { position: usize, tab_id: i64 },
    /// `tab_id` is the tab holding this accordion instance (0 = general).
    Accordion { accordion_id: i64, tab_id: i64 },
}

/// The two halves of a checkbox+input field.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CheckboxInput {
    pub checked: bool,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Single(Value),
    Composite(CheckboxInput),
}

impl FieldValue {
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            FieldValue::Single(v) => Some(v),
            FieldValue::Composite(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldRecord {
    pub(crate) id: FieldId,
    pub(crate) schema: FieldSchema,
    pub(crate) value: FieldValue,
    pub(crate) partition: Partition,
}

impl FieldRecord {
    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.schema.key
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.value, FieldValue::Composite(_))
    }
}

#[derive(Clone, Debug, Default)]
pub struct FormLayout {
    records: Vec<FieldRecord>,
    by_key: HashMap<String, FieldId>,
    header: Vec<FieldId>,
    general: Vec<FieldId>,
    tabs: Vec<TabSchema>,
    tab_fields: Vec<Vec<FieldId>>,
    accordions: Vec<AccordionSchema>,
    accordion_fields: BTreeMap<i64, Vec<FieldId>>,
}

impl FormLayout {
    pub fn build(
        fields: Vec<FieldSchema>,
        tabs: &[TabSchema],
        accordions: &[AccordionSchema],
    ) -> Self {
        let mut layout = FormLayout {
            tabs: tabs.to_vec(),
            accordions: accordions.to_vec(),
            ..Default::default()
        };
        layout.tabs.sort_by_key(|t| t.tab_id);
        layout.tab_fields = vec![Vec::new(); layout.tabs.len()];

        for schema in fields {
            // Accordions are containers, never rendered as fields.
            if schema.field_type == FieldType::Accordion {
                continue;
            }
            let id = FieldId(layout.records.len());
            let partition = layout.partition_for(&schema);
            let value = if schema.is_form_input_checkbox {
                FieldValue::Composite(CheckboxInput {
                    checked: schema.default_checkbox_value,
                    text: schema.default_input_value.clone(),
                })
            } else {
                FieldValue::Single(schema.default_value.clone())
            };

            match &partition {
                Partition::Header => layout.header.push(id),
                Partition::General => layout.general.push(id),
                Partition::Tab { position, .. } => layout.tab_fields[*position].push(id),
                Partition::Accordion { accordion_id, .. } => {
                    layout.accordion_fields.entry(*accordion_id).or_default().push(id)
                }
            }
            if layout.by_key.contains_key(&schema.key) {
                log::warn!("Duplicate field identifier '{}'; lookups resolve to the first", schema.key);
            } else {
                layout.by_key.insert(schema.key.clone(), id);
            }
            layout.records.push(FieldRecord { id, schema, value, partition });
        }

        let records = &layout.records;
        let by_seq = |ids: &mut Vec<FieldId>| ids.sort_by_key(|id| records[id.0].schema.display_seq_no);
        by_seq(&mut layout.header);
        by_seq(&mut layout.general);
        layout.tab_fields.iter_mut().for_each(by_seq);
        layout.accordion_fields.values_mut().for_each(by_seq);

        log::debug!(
            "Partitioned {} fields: {} header, {} general, {} tabs, {} accordions",
            layout.records.len(),
            layout.header.len(),
            layout.general.len(),
            layout.tabs.len(),
            layout.accordion_fields.len()
        );
        layout
    }

    fn partition_for(&self, schema: &FieldSchema) -> Partition {
        if schema.parent_accordion_id > 0 {
            return Partition::Accordion {
                accordion_id: schema.parent_accordion_id,
                tab_id: schema.parent_tab_id,
            };
        }
        if schema.is_header {
            return Partition::Header;
        }
        match self.resolve_tab(schema.parent_tab_id) {
            Some(position) => {
                let tab_id = self.tabs[position].tab_id;
                if tab_id != schema.parent_tab_id {
                    log::warn!(
                        "Field '{}' names tab {} which is not declared; binding it to tab position {}",
                        schema.key,
                        schema.parent_tab_id,
                        position
                    );
                }
                Partition::Tab { position, tab_id }
            }
            None => {
                if schema.parent_tab_id != 0 && !self.tabs.is_empty() {
                    log::warn!(
                        "Field '{}' names unknown tab {}; placing it in the general section",
                        schema.key,
                        schema.parent_tab_id
                    );
                }
                Partition::General
            }
        }
    }

    /// Position of the tab a `parentTabID` refers to. Declared ids win; an id
    /// in `1..=tab count` that is not declared falls back to that 1-based
    /// position. `None` means the general section.
    pub fn resolve_tab(&self, tab_id: i64) -> Option<usize> {
        if tab_id == 0 {
            return None;
        }
        if let Some(position) = self.tabs.iter().position(|t| t.tab_id == tab_id) {
            return Some(position);
        }
        let count = self.tabs.len() as i64;
        (1..=count).contains(&tab_id).then(|| (tab_id - 1) as usize)
    }

    pub fn record(&self, id: FieldId) -> Result<&FieldRecord> {
        self.records.get(id.0).ok_or(FormError::UnknownField(id))
    }

    pub(crate) fn record_mut(&mut self, id: FieldId) -> Result<&mut FieldRecord> {
        self.records.get_mut(id.0).ok_or(FormError::UnknownField(id))
    }

    pub(crate) fn records_mut(&mut self) -> impl Iterator<Item = &mut FieldRecord> {
        self.records.iter_mut()
    }

    pub fn find(&self, key: &str) -> Option<FieldId> {
        self.by_key.get(key).copied()
    }

    pub fn records(&self) -> impl Iterator<Item = &FieldRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn header(&self) -> &[FieldId] {
        &self.header
    }

    pub fn general(&self) -> &[FieldId] {
        &self.general
    }

    /// Tabs in ascending id order.
    pub fn tabs(&self) -> &[TabSchema] {
        &self.tabs
    }

    pub fn tab_fields(&self, position: usize) -> &[FieldId] {
        self.tab_fields.get(position).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Accordions in declaration order.
    pub fn accordions(&self) -> &[AccordionSchema] {
        &self.accordions
    }

    pub fn accordion(&self, accordion_id: i64) -> Option<&AccordionSchema> {
        self.accordions.iter().find(|a| a.accordion_id == accordion_id)
    }

    /// Tab position an accordion renders in, `None` for the general section.
    /// Accordions only referenced by fields follow their first field's tab.
    pub fn accordion_placement(&self, accordion_id: i64) -> Option<usize> {
        if let Some(accordion) = self.accordion(accordion_id) {
            return self.resolve_tab(accordion.parent_tab_id);
        }
        let first = self.accordion_fields(accordion_id).first()?;
        match self.records[first.0].partition {
            Partition::Accordion { tab_id, .. } => self.resolve_tab(tab_id),
            _ => None,
        }
    }

    /// Accordion ids rendered at a tab position (`None` = general), in
    /// [`accordion_order`](Self::accordion_order).
    pub fn accordions_in_tab(&self, position: Option<usize>) -> Vec<i64> {
        self.accordion_order()
            .into_iter()
            .filter(|id| self.accordion_placement(*id) == position)
            .collect()
    }

    pub fn accordion_fields(&self, accordion_id: i64) -> &[FieldId] {
        self.accordion_fields
            .get(&accordion_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declared accordions first, then any accordion ids only referenced by
    /// fields, ascending.
    pub fn accordion_order(&self) -> Vec<i64> {
        let mut order: Vec<i64> = Vec::new();
        for accordion in &self.accordions {
            if !order.contains(&accordion.accordion_id) {
                order.push(accordion.accordion_id);
            }
        }
        for id in self.accordion_fields.keys() {
            if !order.contains(id) {
                order.push(*id);
            }
        }
        order
    }

    /// Every field id: header, general, each tab, then each accordion.
    pub fn ordered_ids(&self) -> Vec<FieldId> {
        let mut ids: Vec<FieldId> = Vec::with_capacity(self.records.len());
        ids.extend_from_slice(&self.header);
        ids.extend_from_slice(&self.general);
        for bucket in &self.tab_fields {
            ids.extend_from_slice(bucket);
        }
        for accordion_id in self.accordion_order() {
            ids.extend_from_slice(self.accordion_fields(accordion_id));
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Vec<FieldSchema> {
        serde_json::from_value(value).unwrap()
    }

    fn keys(layout: &FormLayout, ids: &[FieldId]) -> Vec<String> {
        ids.iter()
            .map(|id| layout.record(*id).unwrap().key().to_string())
            .collect()
    }

    #[test]
    fn test_tabs_sorted_and_bound_by_id() {
        let tabs: Vec<TabSchema> =
            serde_json::from_value(json!([{ "tabId": 20 }, { "tabId": 10 }])).unwrap();
        let layout = FormLayout::build(
            fields(json!([
                { "jquerySelectorID": "b", "parentTabID": 20, "displaySeqNo": 2 },
                { "jquerySelectorID": "a", "parentTabID": 20, "displaySeqNo": 1 },
                { "jquerySelectorID": "c", "parentTabID": 10 }
            ])),
            &tabs,
            &[],
        );
        assert_eq!(layout.tabs()[0].tab_id, 10);
        assert_eq!(keys(&layout, layout.tab_fields(0)), vec!["c"]);
        assert_eq!(keys(&layout, layout.tab_fields(1)), vec!["a", "b"]);
    }

    #[test]
    fn test_positional_fallback_and_orphans() {
        let tabs: Vec<TabSchema> =
            serde_json::from_value(json!([{ "tabId": 100 }, { "tabId": 200 }])).unwrap();
        let layout = FormLayout::build(
            fields(json!([
                { "jquerySelectorID": "pos", "parentTabID": 2 },
                { "jquerySelectorID": "lost", "parentTabID": 9 }
            ])),
            &tabs,
            &[],
        );
        assert_eq!(keys(&layout, layout.tab_fields(1)), vec!["pos"]);
        assert_eq!(keys(&layout, layout.general()), vec!["lost"]);
    }

    #[test]
    fn test_every_field_in_exactly_one_partition() {
        let tabs: Vec<TabSchema> = serde_json::from_value(json!([{ "tabId": 1 }])).unwrap();
        let layout = FormLayout::build(
            fields(json!([
                { "jquerySelectorID": "h", "isHeader": true, "parentAccordionID": 0 },
                { "jquerySelectorID": "ha", "isHeader": true, "parentAccordionID": 3 },
                { "jquerySelectorID": "g" },
                { "jquerySelectorID": "t", "parentTabID": 1 },
                { "jquerySelectorID": "ta", "parentTabID": 1, "parentAccordionID": 3 },
                { "jquerySelectorID": "acc", "fieldType": "accordion" }
            ])),
            &tabs,
            &[],
        );
        let ids = layout.ordered_ids();
        assert_eq!(ids.len(), layout.len());
        let mut seen = ids.clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), ids.len());
        assert!(layout.find("acc").is_none());
        assert_eq!(keys(&layout, layout.accordion_fields(3)), vec!["ha", "ta"]);
    }

    #[test]
    fn test_no_tabs_means_general() {
        let layout = FormLayout::build(
            fields(json!([{ "jquerySelectorID": "x", "parentTabID": 4 }])),
            &[],
            &[],
        );
        assert_eq!(keys(&layout, layout.general()), vec!["x"]);
        assert!(layout.tabs().is_empty());
    }

    #[test]
    fn test_resolve_tab_and_accordion_placement() {
        let tabs: Vec<TabSchema> =
            serde_json::from_value(json!([{ "tabId": 10 }, { "tabId": 20 }])).unwrap();
        let accordions: Vec<AccordionSchema> =
            serde_json::from_value(json!([{ "accordionId": 5, "parentTabID": 2 }])).unwrap();
        let layout = FormLayout::build(
            fields(json!([
                { "jquerySelectorID": "a", "parentAccordionID": 5 },
                { "jquerySelectorID": "b", "parentTabID": 10, "parentAccordionID": 7 }
            ])),
            &tabs,
            &accordions,
        );
        assert_eq!(layout.resolve_tab(0), None);
        assert_eq!(layout.resolve_tab(20), Some(1));
        assert_eq!(layout.resolve_tab(1), Some(0));
        assert_eq!(layout.resolve_tab(3), None);
        assert_eq!(layout.accordions_in_tab(Some(1)), vec![5]);
        assert_eq!(layout.accordions_in_tab(Some(0)), vec![7]);
        assert!(layout.accordions_in_tab(None).is_empty());
    }
}
