// Chatline library - terminal chat prompt with a local message bus

pub mod chat;
pub mod config;
pub mod events;
pub mod message;
pub mod ui;

pub use chat::{ChatChannel, ChatError};
pub use config::{ChatConfig, OutputStream};
pub use events::{EventKind, HandlerId};
pub use message::Message;
pub use ui::{InputStream, PrintOptions};
