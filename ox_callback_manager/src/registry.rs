use std::collections::HashMap;
use std::sync::Arc;

use crate::{CallbackError, CallbackResult, EventType};

/// A callback receiving the event payload by reference.
pub type CallbackFn<E> = Arc<dyn Fn(&E) -> CallbackResult + Send + Sync + 'static>;

/// Registry of named callbacks. Owned by whoever fires the events; there is no
/// process-wide instance.
///
/// Firing an event nobody registered for is a no-op.
pub struct CallbackRegistry<E: ?Sized> {
    callbacks: HashMap<EventType, Vec<CallbackFn<E>>>,
}

impl<E: ?Sized> Default for CallbackRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized> Clone for CallbackRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            callbacks: self.callbacks.clone(),
        }
    }
}

impl<E: ?Sized> std::fmt::Debug for CallbackRegistry<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("events", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<E: ?Sized> CallbackRegistry<E> {
    pub fn new() -> Self {
        Self {
            callbacks: HashMap::new(),
        }
    }

    /// Registers a callback under `name`. Several callbacks may share a name;
    /// they run in registration order.
    pub fn register<F>(&mut self, name: impl Into<EventType>, callback: F)
    where
        F: Fn(&E) -> CallbackResult + Send + Sync + 'static,
    {
        self.callbacks
            .entry(name.into())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<F>(mut self, name: impl Into<EventType>, callback: F) -> Self
    where
        F: Fn(&E) -> CallbackResult + Send + Sync + 'static,
    {
        self.register(name, callback);
        self
    }

    /// Runs every callback registered under `event`.
    ///
    /// Returns the messages produced by callbacks that returned one, or the
    /// first error; callbacks after a failing one do not run.
    pub fn trigger(&self, event: &EventType, payload: &E) -> Result<Vec<String>, CallbackError> {
        let Some(callbacks) = self.callbacks.get(event) else {
            log::debug!("no callbacks registered for '{}'", event);
            return Ok(Vec::new());
        };

        let mut messages = Vec::new();
        for callback in callbacks {
            if let Some(message) = callback(payload)? {
                messages.push(message);
            }
        }
        Ok(messages)
    }

    pub fn has_callbacks(&self, event: &EventType) -> bool {
        self.callbacks.contains_key(event)
    }

    pub fn registered_events(&self) -> Vec<EventType> {
        self.callbacks.keys().cloned().collect()
    }
}
