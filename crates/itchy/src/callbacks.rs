//! Connection event callbacks

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallbackType {
    /// The device has been connected successfully.
    Connected,
    /// The device went offline, e.g. the cable was removed.
    Disconnected,
    /// A USB report could not be sent or received.
    CommunicationError,
}

pub type Callback = Box<dyn FnMut() + Send + 'static>;

/// Callbacks grouped by event, run in registration order.
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<CallbackType, Vec<Callback>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: CallbackType, callback: impl FnMut() + Send + 'static) {
        self.callbacks.entry(kind).or_default().push(Box::new(callback));
    }

    pub fn fire(&mut self, kind: CallbackType) {
        if let Some(callbacks) = self.callbacks.get_mut(&kind) {
            for callback in callbacks.iter_mut() {
                callback();
            }
        }
    }

    pub fn len(&self, kind: CallbackType) -> usize {
        self.callbacks.get(&kind).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.values().all(Vec::is_empty)
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("connected", &self.len(CallbackType::Connected))
            .field("disconnected", &self.len(CallbackType::Disconnected))
            .field(
                "communication_error",
                &self.len(CallbackType::CommunicationError),
            )
            .finish()
    }
}
