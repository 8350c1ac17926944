//! ox_callback_manager - named callbacks resolved at the moment an event fires

pub mod registry;

pub use registry::CallbackRegistry;

/// Symbolic name a callback is registered under (e.g. `afterLoadBtnCick`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventType(pub String);

impl EventType {
    pub fn new(name: &str) -> Self {
        EventType(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        EventType::new(name)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned by a callback. The selection that fired it stays committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackError {
    pub message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CallbackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CallbackError {}

/// On success a callback may hand back a message for the host.
pub type CallbackResult = Result<Option<String>, CallbackError>;
