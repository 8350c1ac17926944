pub mod collect;
pub mod config;
pub mod date;
pub mod engine;
pub mod error;
pub mod field_type;
pub mod layout;
pub mod normalize;
pub mod options;
pub mod picker;
pub mod render;
pub mod schema;
pub mod session;
pub mod tables;
pub mod traits;
pub mod validation;


pub use config::*;
pub use engine::*;
pub use error::{FormError, Result};
pub use field_type::*;
pub use layout::{CheckboxInput, FieldId, FieldRecord, FieldValue, FormLayout, Partition};
pub use options::*;
pub use picker::*;
pub use render::*;
pub use schema::*;
pub use session::*;
pub use tables::{Row, TableStore};
pub use traits::*;
pub use validation::{ValidationError, Validator};

/// Parses a schema document and builds an engine with the default configuration.
pub fn engine_from_json(text: &str) -> Result<FormEngine> {
    let doc = SchemaDocument::from_json_str(text)?;
    Ok(FormEngine::new(&doc, FormConfig::default()))
}
