// Event kinds exposed by the chat channel

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::EventError;

/// The two notifications a chat channel publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// A line was submitted locally or injected with `send_message`
    MessageSent,

    /// A message arrived from somewhere else (typically a transport)
    MessageReceived,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::MessageSent, EventKind::MessageReceived];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::MessageSent => "message-sent",
            EventKind::MessageReceived => "message-received",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EventError::UnknownEventKind(s.to_string()))
    }
}
