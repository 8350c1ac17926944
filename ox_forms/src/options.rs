use serde_json::Value;
use std::sync::Arc;

use crate::schema::OptionSourceId;
use crate::traits::OptionSource;

/// Employee records the host already holds. Read-only to the engine.
pub type EmployeeCache = Arc<Vec<Value>>;

/// Resolves option lists, serving the reserved employees source from the
/// host's cache.
#[derive(Clone)]
pub struct OptionLoader {
    source: Arc<dyn OptionSource>,
    employees: EmployeeCache,
    employees_source_id: OptionSourceId,
}

impl OptionLoader {
    pub fn new(
        source: Arc<dyn OptionSource>,
        employees: EmployeeCache,
        employees_source_id: OptionSourceId,
    ) -> Self {
        OptionLoader {
            source,
            employees,
            employees_source_id,
        }
    }

    /// Never fails: a failed or empty lookup yields an empty list.
    pub async fn load(&self, source: OptionSourceId, params: &str) -> Vec<Value> {
        if source == self.employees_source_id {
            log::debug!("Serving option source {} from the employee cache", source);
            return self.employees.as_ref().clone();
        }
        match self.source.fetch_option_list(source, params).await {
            Ok(Some(list)) => list,
            Ok(None) => Vec::new(),
            Err(e) => {
                log::error!("Failed to fetch option source {} ({}): {}", source, params, e);
                Vec::new()
            }
        }
    }
}
