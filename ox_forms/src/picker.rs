//! Picker sessions.
//!
//! A session moves `Opening -> Open -> Selecting` and is dropped on commit or
//! close. Nested pickers keep the parent selections on a stack so a child
//! picker that declares its own child chains further.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::layout::FieldId;
use crate::schema::OptionSourceId;

/// Where a committed selection is written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickerTarget {
    Field(FieldId),
    Cell { table: String, row: usize, column: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PickerPhase {
    /// Waiting for a remote option list.
    Opening,
    Open,
    /// Multi-select with a pending selection.
    Selecting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchPurpose {
    Picker,
    Dropdown(FieldId),
}

/// Identifies the request a fetched option list answers. Lists delivered with a
/// ticket from another engine or a superseded request are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub(crate) engine: Uuid,
    pub(crate) seq: u64,
    pub(crate) purpose: FetchPurpose,
}

impl FetchTicket {
    pub fn purpose(&self) -> FetchPurpose {
        self.purpose
    }
}

/// A remote lookup the host must perform before the picker can show options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionFetch {
    pub ticket: FetchTicket,
    pub source: OptionSourceId,
    pub params: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickerOpen {
    /// Options are available locally; the session is open.
    Ready,
    Fetch(OptionFetch),
    /// The target has no picker binding; nothing was opened.
    Unavailable,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectionOutcome {
    /// Multi-select toggled, or an empty confirm.
    Pending,
    /// The selection was kept and a child picker opened.
    Chained(PickerOpen),
    /// Written to the target; carries messages returned by named callbacks.
    Committed(Vec<String>),
    /// The chain could not continue and the session was closed.
    Closed,
}

#[derive(Clone, Debug)]
pub struct PickerSession {
    pub(crate) seq: u64,
    pub(crate) target: PickerTarget,
    pub(crate) title: String,
    pub(crate) multi_select: bool,
    pub(crate) phase: PickerPhase,
    pub(crate) options: Vec<Value>,
    pub(crate) pending: Vec<Value>,
    pub(crate) child_picker_id: Option<String>,
    pub(crate) parents: Vec<Value>,
    pub(crate) on_select: Option<String>,
}

impl PickerSession {
    pub(crate) fn new(seq: u64, target: PickerTarget, title: String, multi_select: bool) -> Self {
        PickerSession {
            seq,
            target,
            title,
            multi_select,
            phase: PickerPhase::Open,
            options: Vec::new(),
            pending: Vec::new(),
            child_picker_id: None,
            parents: Vec::new(),
            on_select: None,
        }
    }

    pub fn target(&self) -> &PickerTarget {
        &self.target
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_multi_select(&self) -> bool {
        self.multi_select
    }

    pub fn phase(&self) -> PickerPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == PickerPhase::Opening
    }

    pub fn options(&self) -> &[Value] {
        &self.options
    }

    pub fn pending(&self) -> &[Value] {
        &self.pending
    }

    /// Selections made on the pickers above this one, outermost first.
    pub fn parent_selections(&self) -> &[Value] {
        &self.parents
    }

    pub fn is_child(&self) -> bool {
        !self.parents.is_empty()
    }

    /// Options with any value containing `query`, ignoring case. A blank query
    /// matches everything.
    pub fn search(&self, query: &str) -> Vec<&Value> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.options.iter().collect();
        }
        self.options
            .iter()
            .filter(|option| matches_query(option, &needle))
            .collect()
    }

    /// Adds the option to the pending set, or removes it when an option with
    /// the same code is already there.
    pub(crate) fn toggle(&mut self, option: Value) {
        let code = option_code(&option);
        let existing = self.pending.iter().position(|p| match (&code, option_code(p)) {
            (Some(a), Some(b)) => *a == b,
            _ => *p == option,
        });
        match existing {
            Some(index) => {
                self.pending.remove(index);
            }
            None => self.pending.push(option),
        }
        self.phase = PickerPhase::Selecting;
    }
}

fn matches_query(value: &Value, needle: &str) -> bool {
    match value {
        Value::Object(map) => map.values().any(|v| matches_query(v, needle)),
        Value::Array(items) => items.iter().any(|v| matches_query(v, needle)),
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        Value::Bool(b) => b.to_string().contains(needle),
        Value::Null => false,
    }
}

pub(crate) fn option_code(option: &Value) -> Option<String> {
    match option.get("code")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Value sent to a child lookup: the parent's code, falling back through the
/// other key spellings the backend uses.
pub(crate) fn lookup_code(selection: &Value) -> String {
    let record = match selection {
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    };
    ["code", "Code", "value", "Value"]
        .iter()
        .filter_map(|k| record.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> PickerSession {
        let mut s = PickerSession::new(1, PickerTarget::Field(FieldId(0)), "Pick".into(), true);
        s.options = vec![
            json!({ "code": "A1", "description": "Alpha site" }),
            json!({ "code": "B2", "description": "Beta", "region": "North" }),
            json!({ "code": 77, "description": "Gamma" }),
        ];
        s
    }

    #[test]
    fn test_search_matches_any_value_ignoring_case() {
        let s = session();
        assert_eq!(s.search("alpha").len(), 1);
        assert_eq!(s.search("NORTH").len(), 1);
        assert_eq!(s.search("77").len(), 1);
        assert_eq!(s.search("  ").len(), 3);
        assert!(s.search("zeta").is_empty());
    }

    #[test]
    fn test_toggle_by_code() {
        let mut s = session();
        s.toggle(json!({ "code": "A1", "description": "Alpha site" }));
        s.toggle(json!({ "code": "B2" }));
        assert_eq!(s.pending().len(), 2);
        assert_eq!(s.phase(), PickerPhase::Selecting);
        s.toggle(json!({ "code": "A1", "description": "renamed" }));
        assert_eq!(s.pending().len(), 1);
        assert_eq!(option_code(&s.pending()[0]).as_deref(), Some("B2"));
    }

    #[test]
    fn test_lookup_code_fallbacks() {
        assert_eq!(lookup_code(&json!({ "code": "X" })), "X");
        assert_eq!(lookup_code(&json!({ "Code": "Y" })), "Y");
        assert_eq!(lookup_code(&json!({ "Value": 5 })), "5");
        assert_eq!(lookup_code(&json!([ { "code": "first" }, { "code": "second" } ])), "first");
        assert_eq!(lookup_code(&json!({})), "");
    }
}
