use std::error::Error;
use std::fmt;

use crate::message::Message;

/// Address of one destination tab inside a `RouterContext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabRef {
    /// Singleton tab used while multi-window tabs are disabled.
    Default,
    /// Tab at `tab` in the window at `window`, both in configured order.
    Window { window: usize, tab: usize },
}

/// Emitted once per routed message, before any tab receives it.
///
/// Handlers may rewrite the message annotations or suppress delivery. The
/// destination list is fixed by the routing pass and only readable here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingEvent {
    message: Message,
    destinations: Vec<TabRef>,
    suppressed: bool,
}

impl RoutingEvent {
    pub fn new(message: Message, destinations: Vec<TabRef>) -> Self {
        Self {
            message,
            destinations,
            suppressed: false,
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }

    pub fn destinations(&self) -> &[TabRef] {
        &self.destinations
    }

    /// Cancels delivery to every destination. There is no way to undo this.
    pub fn suppress(&mut self) {
        self.suppressed = true;
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub(crate) fn into_delivery(self) -> (Message, Vec<TabRef>) {
        (self.message, self.destinations)
    }
}

pub type HandlerError = Box<dyn Error + Send + Sync>;
pub type HandlerResult = Result<(), HandlerError>;

type BoxedHandler = Box<dyn FnMut(&mut RoutingEvent) -> HandlerResult + Send>;

/// Registration token used to remove a handler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u64);

struct Registration {
    id: HandlerId,
    name: String,
    priority: i32,
    handler: BoxedHandler,
}

impl fmt::Debug for Registration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Registration")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Ordered, synchronous subscriber list for `RoutingEvent`.
///
/// Handlers run highest priority first; equal priorities run in registration
/// order. Every handler sees the edits of the handlers before it.
#[derive(Debug, Default)]
pub struct RoutingHandlers {
    registrations: Vec<Registration>,
    next_id: u64,
}

impl RoutingHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> HandlerId
    where
        F: FnMut(&mut RoutingEvent) -> HandlerResult + Send + 'static,
    {
        self.register_with_priority(name, 0, handler)
    }

    pub fn register_with_priority<F>(
        &mut self,
        name: impl Into<String>,
        priority: i32,
        handler: F,
    ) -> HandlerId
    where
        F: FnMut(&mut RoutingEvent) -> HandlerResult + Send + 'static,
    {
        let id = HandlerId(self.next_id);
        self.next_id += 1;

        // Insert after every handler of equal or higher priority.
        let position = self
            .registrations
            .iter()
            .position(|registration| registration.priority < priority)
            .unwrap_or(self.registrations.len());
        self.registrations.insert(
            position,
            Registration {
                id,
                name: name.into(),
                priority,
                handler: Box::new(handler),
            },
        );
        id
    }

    /// Returns false when `id` was never registered or already removed.
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|registration| registration.id != id);
        self.registrations.len() != before
    }

    pub fn clear(&mut self) {
        self.registrations.clear();
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Runs every handler once, in order.
    ///
    /// A failing handler is logged and skipped; the remaining handlers still run.
    pub fn publish(&mut self, event: &mut RoutingEvent) {
        for registration in &mut self.registrations {
            if let Err(error) = (registration.handler)(event) {
                tracing::warn!(
                    "routing handler '{}' failed for message {}: {}",
                    registration.name,
                    event.message().sequence_id().0,
                    error
                );
            }
        }
    }
}
