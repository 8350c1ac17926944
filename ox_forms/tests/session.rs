#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use ox_forms::{
        load_schema, FormConfig, FormError, FormRequest, FormSession, NotificationKind,
        OptionLoader, OptionSource, OptionSourceId, PickerOpen, SaveOutcome, SchemaDocument,
        SchemaSource, SelectionOutcome, SubmitResponse, SubmitTarget,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    struct FakeBackend {
        schema: Value,
        delay: Duration,
    }

    #[async_trait]
    impl SchemaSource for FakeBackend {
        async fn fetch_schema(&self, request: &FormRequest) -> anyhow::Result<SchemaDocument> {
            tokio::time::sleep(self.delay).await;
            if request.form_name == "missing" {
                anyhow::bail!("form not found");
            }
            Ok(serde_json::from_value(self.schema.clone())?)
        }
    }

    #[derive(Default)]
    struct FakeOptions {
        calls: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl OptionSource for FakeOptions {
        async fn fetch_option_list(
            &self,
            source: OptionSourceId,
            params: &str,
        ) -> anyhow::Result<Option<Vec<Value>>> {
            self.calls.lock().unwrap().push((source.0, params.to_string()));
            match source.0 {
                20 => Ok(Some(vec![json!({ "code": "R1", "description": "Rotation" })])),
                21 => Ok(Some(vec![json!({ "code": format!("{}-A", params), "description": "Slot" })])),
                _ => anyhow::bail!("no such table"),
            }
        }
    }

    struct FakeSubmit {
        response: anyhow::Result<SubmitResponse>,
        received: Mutex<Vec<Value>>,
    }

    impl FakeSubmit {
        fn answering(status: Option<&str>, message: Option<&str>) -> Arc<Self> {
            Arc::new(FakeSubmit {
                response: Ok(SubmitResponse {
                    status: status.map(str::to_string),
                    message: message.map(str::to_string),
                }),
                received: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(FakeSubmit {
                response: Err(anyhow::anyhow!("connection reset")),
                received: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SubmitTarget for FakeSubmit {
        async fn submit(&self, payload: Value) -> anyhow::Result<SubmitResponse> {
            self.received.lock().unwrap().push(payload);
            match &self.response {
                Ok(r) => Ok(r.clone()),
                Err(e) => Err(anyhow::anyhow!(e.to_string())),
            }
        }
    }

    fn schema() -> Value {
        json!({
            "dynamicFields": [
                { "jquerySelectorID": "manager", "fieldType": "modal", "tableDataEnum": 1,
                  "isPost": true, "jsonDataKeyName": "manager", "isRequired": true },
                { "jquerySelectorID": "rotation", "fieldType": "modal", "tableDataEnum": 20, "childModalID": "SLOT",
                  "isPost": true, "jsonDataKeyName": "rotation" },
                { "jquerySelectorID": "pattern", "fieldType": "selectdropdown", "tableDataEnum": 99,
                  "isPost": true, "jsonDataKeyName": "pattern" }
            ],
            "pageTableModals": [
                { "configurationKey": "rotation", "childModalID": "SLOT" },
                { "modalID": "SLOT", "modalTitle": "Slot", "tableDataEnum": 21 }
            ]
        })
    }

    fn employees() -> Arc<Vec<Value>> {
        Arc::new(vec![json!({ "code": "E1", "description": "Ana" }), json!({ "code": "E2", "description": "Ben" })])
    }

    async fn mount(options: Arc<FakeOptions>, submit: Arc<FakeSubmit>) -> FormSession {
        let backend = FakeBackend { schema: schema(), delay: Duration::from_millis(0) };
        let loader = OptionLoader::new(options, employees(), OptionSourceId(1));
        FormSession::mount(
            &backend,
            &FormRequest::new("roster", "edit"),
            &CancellationToken::new(),
            FormConfig::default(),
            loader,
            submit,
        )
        .await
        .unwrap()
        .with_employee_code("EMP-1")
    }

    #[tokio::test]
    async fn test_employee_picker_served_from_cache() {
        let options = Arc::new(FakeOptions::default());
        let mut session = mount(options.clone(), FakeSubmit::answering(None, None)).await;
        let manager = session.engine().find_field("manager").unwrap();

        let open = session.open_picker(manager).await.unwrap();
        assert!(matches!(open, PickerOpen::Fetch(_)));
        assert!(options.calls.lock().unwrap().is_empty());

        let picker = session.engine().picker().unwrap();
        assert_eq!(picker.options().len(), 2);
        assert_eq!(picker.search("ben").len(), 1);
    }

    #[tokio::test]
    async fn test_nested_picker_fetches_child_with_parent_code() {
        let options = Arc::new(FakeOptions::default());
        let mut session = mount(options.clone(), FakeSubmit::answering(None, None)).await;
        let rotation = session.engine().find_field("rotation").unwrap();

        session.open_picker(rotation).await.unwrap();
        let outcome = session.choose(json!({ "code": "R1", "description": "Rotation" })).await.unwrap();
        assert!(matches!(outcome, SelectionOutcome::Chained(PickerOpen::Fetch(_))));
        assert_eq!(session.engine().picker().unwrap().title(), "Slot");

        let slot = session.engine().picker().unwrap().options()[0].clone();
        assert_eq!(slot["code"], json!("apiParams=R1-A"));
        session.choose(slot).await.unwrap();

        let calls = options.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![(20, String::new()), (21, "apiParams=R1".to_string())]);
        assert_eq!(session.engine().collect(None)["rotation"], json!("apiParams=R1-A"));
    }

    #[tokio::test]
    async fn test_failed_lookup_gives_empty_dropdown() {
        let options = Arc::new(FakeOptions::default());
        let mut session = mount(options, FakeSubmit::answering(None, None)).await;
        let pattern = session.engine().find_field("pattern").unwrap();
        let list = session.open_dropdown(pattern).await.unwrap();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_save_blocked_by_validation() {
        let submit = FakeSubmit::answering(None, None);
        let mut session = mount(Arc::new(FakeOptions::default()), submit.clone()).await;

        let outcome = session.save().await;
        match outcome {
            SaveOutcome::Invalid(errors) => assert_eq!(errors[0].field, "manager"),
            other => panic!("unexpected {:?}", other),
        }
        let note = session.take_notification().unwrap();
        assert_eq!(note.kind, NotificationKind::Error);
        assert_eq!(note.message, "Please fill in all required fields.");
        assert!(submit.received.lock().unwrap().is_empty());
        assert_eq!(session.engine().error_for("manager"), Some("This field is required"));
    }

    #[tokio::test]
    async fn test_save_submits_payload() {
        let submit = FakeSubmit::answering(Some("success"), None);
        let mut session = mount(Arc::new(FakeOptions::default()), submit.clone()).await;
        let manager = session.engine().find_field("manager").unwrap();
        session
            .engine_mut()
            .edit_field(manager, json!({ "code": "E2", "description": "Ben" }))
            .unwrap();

        assert_eq!(session.save().await, SaveOutcome::Saved);
        assert!(!session.is_saving());
        assert_eq!(session.notification().unwrap().message, "Changes saved successfully!");

        let sent = submit.received.lock().unwrap()[0].clone();
        assert_eq!(sent["employeeCode"], json!("EMP-1"));
        assert_eq!(sent["manager"], json!("E2"));
        assert_eq!(sent["rotation"], json!(""));
    }

    #[tokio::test]
    async fn test_rejected_and_failed_submissions_keep_state() {
        for (submit, expected) in [
            (FakeSubmit::answering(Some("error"), Some("Roster locked")), SaveOutcome::Rejected("Roster locked".into())),
            (FakeSubmit::answering(Some("ERROR"), None), SaveOutcome::Rejected("An error occurred".into())),
            (FakeSubmit::failing(), SaveOutcome::Failed("connection reset".into())),
        ] {
            let mut session = mount(Arc::new(FakeOptions::default()), submit).await;
            let manager = session.engine().find_field("manager").unwrap();
            session.engine_mut().edit_field(manager, json!({ "code": "E1" })).unwrap();

            assert_eq!(session.save().await, expected);
            assert_eq!(session.notification().unwrap().kind, NotificationKind::Error);
            assert_eq!(session.engine().collect(None)["manager"], json!("E1"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_schema_fetch_cancellation() {
        let backend = FakeBackend { schema: schema(), delay: Duration::from_secs(30) };
        let cancel = CancellationToken::new();
        let request = FormRequest::new("roster", "edit");

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });
        let result = load_schema(&backend, &request, &cancel).await;
        assert!(matches!(result, Err(FormError::Cancelled)));
    }

    #[tokio::test]
    async fn test_schema_fetch_failure() {
        let backend = FakeBackend { schema: schema(), delay: Duration::from_millis(0) };
        let result = load_schema(&backend, &FormRequest::new("missing", "view"), &CancellationToken::new()).await;
        assert!(matches!(result, Err(FormError::SchemaFetch(_))));
    }

    #[tokio::test]
    async fn test_torn_down_session_ignores_late_lists() {
        let mut session = mount(Arc::new(FakeOptions::default()), FakeSubmit::answering(None, None)).await;
        let pattern = session.engine().find_field("pattern").unwrap();
        let fetch = session.engine_mut().request_field_options(pattern).unwrap().unwrap();
        session.teardown();
        assert!(!session.engine_mut().deliver_options(fetch.ticket, vec![json!({ "code": "P" })]));
    }
}
