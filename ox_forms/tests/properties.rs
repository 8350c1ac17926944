#[cfg(test)]
mod tests {
    use ox_forms::{
        FieldValue, FormConfig, FormEngine, PickerOpen, SchemaDocument, SelectionOutcome,
    };
    use serde_json::{json, Value};

    fn engine(doc: Value) -> FormEngine {
        FormEngine::new(&SchemaDocument::from_value(doc).unwrap(), FormConfig::default())
    }

    fn mixed_form() -> Value {
        json!({
            "tabs": [ { "tabId": 3 }, { "tabId": 1 }, { "tabId": 2 } ],
            "accordions": [ { "accordionId": 8, "parentTabID": 2 }, { "accordionId": 4, "parentTabID": 0 } ],
            "dynamicFields": [
                { "jquerySelectorID": "h1", "isHeader": true, "displaySeqNo": 2 },
                { "jquerySelectorID": "g1", "displaySeqNo": 5 },
                { "jquerySelectorID": "g2", "fieldType": "clockpickercheckbox" },
                { "jquerySelectorID": "t1", "parentTabID": 1 },
                { "jquerySelectorID": "t3", "parentTabID": 3, "fieldType": "ClockPickerCheckbox" },
                { "jquerySelectorID": "t3b", "parentTabID": 3 },
                { "jquerySelectorID": "a8", "parentTabID": 2, "parentAccordionID": 8 },
                { "jquerySelectorID": "a4", "parentAccordionID": 4, "isHeader": true },
                { "jquerySelectorID": "container", "fieldType": "accordion", "parentTabID": 2 }
            ],
            "formInputCheckbox": [
                { "jquerySelectorID": "c1", "displaySeqNo": 900 },
                { "jquerySelectorID": "c2", "fieldType": "clockpickercheckbox" }
            ]
        })
    }

    #[test]
    fn test_clockpickercheckbox_never_rendered() {
        let e = engine(mixed_form());
        for key in ["g2", "t3", "c2"] {
            assert!(e.find_field(key).is_none(), "{} should be dropped", key);
        }
        let plan = serde_json::to_string(&e.render_plan()).unwrap();
        assert!(!plan.contains("\"g2\""));
        assert!(!plan.contains("\"t3\""));
    }

    #[test]
    fn test_composite_ranks_before_ordinary_fields() {
        let e = engine(mixed_form());
        let composite = e.field(e.find_field("c1").unwrap()).unwrap().schema().display_seq_no;
        for record in e.layout().records().filter(|r| !r.is_composite()) {
            assert!(record.schema().display_seq_no > composite, "{}", record.key());
        }
    }

    #[test]
    fn test_tabs_processed_in_ascending_id_order() {
        let e = engine(mixed_form());
        let ids: Vec<i64> = e.render_plan().tabs.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let third: Vec<String> = e.render_plan().tabs[2].fields.iter().map(|f| f.key.clone()).collect();
        assert_eq!(third, vec!["t3b"]);
    }

    #[test]
    fn test_each_field_in_exactly_one_partition() {
        let e = engine(mixed_form());
        let plan = e.render_plan();
        let mut keys: Vec<String> = Vec::new();
        keys.extend(plan.header.fields.iter().map(|f| f.key.clone()));
        keys.extend(plan.general.fields.iter().map(|f| f.key.clone()));
        for accordion in &plan.general.accordions {
            keys.extend(accordion.fields.iter().map(|f| f.key.clone()));
        }
        for tab in &plan.tabs {
            keys.extend(tab.fields.iter().map(|f| f.key.clone()));
            for accordion in &tab.accordions {
                keys.extend(accordion.fields.iter().map(|f| f.key.clone()));
            }
        }
        keys.sort();
        let total = keys.len();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert_eq!(total, e.layout().len());
        assert!(!keys.contains(&"container".to_string()));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let mut e = engine(json!({
            "dynamicFields": [
                { "jquerySelectorID": "a", "isRequired": true },
                { "jquerySelectorID": "b", "isRequired": true, "fieldType": "multiselectwithinputdiv" },
                { "jquerySelectorID": "c", "isRequired": true, "defaultValue": "ok" }
            ]
        }));
        let first = e.validate().to_vec();
        let second = e.validate().to_vec();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_fresh_form_collects_initial_values() {
        let e = engine(json!({
            "dynamicFields": [
                { "jquerySelectorID": "start", "fieldType": "datepickersingle", "isPost": true,
                  "jsonDataKeyName": "startDate", "defaultValue": "2024-03-01",
                  "postDateFormat": "DD-MM-YYYY" },
                { "jquerySelectorID": "iso", "fieldType": "datepickersingle", "isPost": true,
                  "jsonDataKeyName": "isoDate", "defaultValue": "2024-03-01",
                  "postDateFormat": "YYYY/MM/DD" },
                { "jquerySelectorID": "active", "fieldType": "checkbox", "isPost": true,
                  "jsonDataKeyName": "active", "defaultValue": true },
                { "jquerySelectorID": "time", "fieldType": "ClockPicker", "isPost": true,
                  "jsonDataKeyName": "time", "defaultValue": "08:30" },
                { "jquerySelectorID": "site", "fieldType": "selectdropdown", "isPost": true,
                  "jsonDataKeyName": "site", "defaultValue": { "code": "S9", "description": "Depot" } },
                { "jquerySelectorID": "secret", "fieldType": "inputfield", "isPost": false,
                  "jsonDataKeyName": "secret", "defaultValue": "x" },
                { "jquerySelectorID": "nokey", "fieldType": "inputfield", "isPost": true,
                  "defaultValue": "y" }
            ]
        }));
        let payload = e.collect(Some("EMP-7"));
        assert_eq!(payload, json!({
            "employeeCode": "EMP-7",
            "startDate": "01-03-2024",
            "isoDate": "2024/03/01",
            "active": true,
            "time": "08:30",
            "site": "S9"
        }));
    }

    #[test]
    fn test_cascading_update_sets_description() {
        let mut e = engine(json!({
            "dynamicFields": [
                { "jquerySelectorID": "A", "fieldType": "modal", "jsonDataKeyName": "K",
                  "fieldData": [ { "code": "X1", "description": "Widget" } ] },
                { "jquerySelectorID": "B", "parentJsonDataKeyName": "K" },
                { "jquerySelectorID": "C", "parentJsonDataKeyName": "other" }
            ]
        }));
        let a = e.find_field("A").unwrap();
        e.open_picker(a).unwrap();
        e.choose(json!({ "code": "X1", "description": "Widget" })).unwrap();
        let b = e.find_field("B").unwrap();
        let c = e.find_field("C").unwrap();
        assert_eq!(e.value(b).unwrap(), &FieldValue::Single(json!("Widget")));
        assert_eq!(e.value(c).unwrap(), &FieldValue::Single(Value::Null));
    }

    #[test]
    fn test_table_display_column_auto_populates() {
        let mut e = engine(json!({
            "formTables": [ { "id": 1, "tableID": "T", "jsonDataKeyName": "vendors",
                              "tableData": [ { "c1": "", "c2": "" } ] } ],
            "formTablesColumns": [
                { "columnTableID": 1, "columnName": "c1", "fieldType": "Modal", "modalID": "V" },
                { "columnTableID": 1, "columnName": "c2", "fieldType": "Display" }
            ],
            "pageTableModals": [ { "modalID": "V", "fieldData": [ { "code": "V1", "description": "Acme" } ] } ]
        }));
        assert_eq!(e.open_cell_picker("vendors", 0, "c1").unwrap(), PickerOpen::Ready);
        let outcome = e.choose(json!({ "code": "V1", "description": "Acme" })).unwrap();
        assert!(matches!(outcome, SelectionOutcome::Committed(_)));
        assert_eq!(e.rows("vendors").unwrap()[0]["c2"], json!("Acme"));
    }

    #[test]
    fn test_required_selectdropdown_reports_once() {
        for initial in [json!({ "code": "", "description": "" }), Value::Null] {
            let mut e = engine(json!({
                "dynamicFields": [
                    { "jquerySelectorID": "shift", "fieldType": "selectdropdown", "isRequired": true,
                      "defaultValue": initial }
                ]
            }));
            let errors = e.validate().to_vec();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "shift");
        }
    }

    #[test]
    fn test_delete_row_renumbers() {
        let mut e = engine(json!({
            "formTables": [ { "id": 2, "tableID": "S", "tableData": [ { "seq": 1 }, { "seq": 2 }, { "seq": 3 } ] } ],
            "formTablesColumns": [ { "columnTableID": 2, "columnName": "seq", "fieldType": "AutoIncrement" } ]
        }));
        e.delete_row("S", 1).unwrap();
        assert_eq!(
            e.rows("S").unwrap().to_vec(),
            vec![
                json!({ "seq": 1 }).as_object().unwrap().clone(),
                json!({ "seq": 2 }).as_object().unwrap().clone()
            ]
        );
    }

    #[test]
    fn test_color_round_trip() {
        let mut e = engine(json!({
            "dynamicFields": [ { "jquerySelectorID": "col", "fieldType": "colorpicker", "isPost": true,
                                 "jsonDataKeyName": "colour", "defaultValue": "00ff00" } ]
        }));
        let col = e.find_field("col").unwrap();
        let plan = e.render_plan();
        assert_eq!(
            plan.general.fields[0].behavior,
            ox_forms::FieldBehavior::Color { hex: "#00ff00".to_string() }
        );
        e.edit_field(col, json!("#ff0000")).unwrap();
        assert_eq!(e.value(col).unwrap(), &FieldValue::Single(json!("ff0000")));
        assert_eq!(e.collect(None)["colour"], json!("ff0000"));
    }
}
