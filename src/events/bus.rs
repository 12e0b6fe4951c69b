// Synchronous publish/subscribe registry
// Handlers run in registration order; a failing handler never stops the others

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{error, trace};

use super::EventKind;
use crate::message::Message;

/// Event handler
///
/// The first argument is the bus owner's context, so a handler can reach the
/// chat channel it is registered on while it runs.
pub type Handler<C> = Rc<dyn Fn(&C, &Message) -> anyhow::Result<()>>;

thread_local! {
    static DISPATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// True while a handler is running on this thread
///
/// Lets a process panic hook stay quiet for panics the bus catches and
/// reports itself.
pub fn in_dispatch() -> bool {
    DISPATCH_DEPTH.with(|depth| depth.get() > 0)
}

struct DispatchGuard;

impl DispatchGuard {
    fn enter() -> Self {
        DISPATCH_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCH_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Outcome of one emission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Handlers that were registered when the emission started
    pub handlers: usize,

    /// Handlers that returned an error or panicked
    pub failed: usize,
}

/// Identifies one registration, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Registration<C> {
    id: HandlerId,
    handler: Handler<C>,
}

impl<C> Clone for Registration<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Rc::clone(&self.handler),
        }
    }
}

/// Handler lists keyed by event kind
pub struct EventBus<C> {
    handlers: RefCell<HashMap<EventKind, Vec<Registration<C>>>>,
    next_id: Cell<u64>,
}

impl<C> EventBus<C> {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        }
    }

    /// Register a handler for `kind`
    pub fn on<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&C, &Message) -> anyhow::Result<()> + 'static,
    {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        self.handlers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Registration {
                id,
                handler: Rc::new(handler),
            });

        trace!(event = %kind, ?id, "handler registered");
        id
    }

    /// Remove a registration. Returns false if it was already gone.
    pub fn off(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        for list in handlers.values_mut() {
            if let Some(pos) = list.iter().position(|r| r.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.handlers.borrow().get(&kind).map_or(0, Vec::len)
    }

    /// Run every handler registered for `kind`, in registration order
    ///
    /// Returns true if at least one handler was registered.
    pub fn emit(&self, ctx: &C, kind: EventKind, message: &Message) -> bool {
        self.dispatch(ctx, kind, message).handlers > 0
    }

    /// Like [`emit`](Self::emit), also counting the handlers that failed
    ///
    /// Errors and panics from a handler are reported through `tracing` and
    /// dispatch continues. The list is snapshotted first: handlers may
    /// register, remove or emit while running, and new registrations only
    /// see later emissions.
    pub fn dispatch(&self, ctx: &C, kind: EventKind, message: &Message) -> Dispatch {
        let snapshot: Vec<Registration<C>> = match self.handlers.borrow().get(&kind) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => return Dispatch::default(),
        };

        trace!(event = %kind, handlers = snapshot.len(), "dispatching");

        let mut failed = 0;
        for registration in &snapshot {
            let outcome = {
                let _guard = DispatchGuard::enter();
                panic::catch_unwind(AssertUnwindSafe(|| (registration.handler)(ctx, message)))
            };

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failed += 1;
                    error!(event = %kind, handler = ?registration.id, "event handler failed: {e:#}");
                }
                Err(payload) => {
                    failed += 1;
                    error!(
                        event = %kind,
                        handler = ?registration.id,
                        "event handler panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }

        Dispatch {
            handlers: snapshot.len(),
            failed,
        }
    }
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
