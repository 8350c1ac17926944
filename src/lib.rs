pub use ox_callback_manager::{CallbackError, CallbackRegistry, CallbackResult, EventType};
pub use ox_forms::{
    FieldId, FieldValue, FormConfig, FormEngine, FormError, FormRequest, FormSession, OptionLoader,
    OptionSource, OptionSourceId, RenderPlan, SaveOutcome, SchemaDocument, SchemaSource,
    SelectionEvent, SubmitTarget, engine_from_json,
};
