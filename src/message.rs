// Chat message value type
// Carried by both event kinds; never stored by the channel itself

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single chat message
///
/// `sender` is an opaque label supplied by whoever built the message and
/// carries no identity guarantees. `extra` is an unvalidated passthrough bag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    sender: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    extra: Option<Map<String, Value>>,
}

impl Message {
    /// Create a message with no sender and no extra payload
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: None,
            extra: None,
        }
    }

    /// Attach a sender label
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Attach an optional sender label, leaving it absent for `None`
    pub fn with_sender_opt(mut self, sender: Option<String>) -> Self {
        self.sender = sender;
        self
    }

    /// Insert one entry into the extra payload
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn extra(&self) -> Option<&Map<String, Value>> {
        self.extra.as_ref()
    }
}
