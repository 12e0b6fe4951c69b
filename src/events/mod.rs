// Event bus module
// Named chat events and the synchronous handler registry behind them

pub mod bus;
pub mod kind;

pub use bus::{in_dispatch, Dispatch, EventBus, Handler, HandlerId};
pub use kind::EventKind;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EventError {
    #[error("Unknown event kind: {0}")]
    UnknownEventKind(String),
}
