//! Per-kind event handler routing

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use maoto_core::{AgentEvent, EventKind};

use crate::error::HandlerError;
use crate::pool::{handler_fn, TaskHandler};

/// Dispatches each event to the handler registered for its kind
///
/// # Example
///
/// ```
/// use maoto_core::{AgentEvent, EventKind};
/// use maoto_worker::EventRouter;
///
/// let router = EventRouter::new().on(EventKind::OfferCall, |event: AgentEvent| async move {
///     println!("offer call: {:?}", event);
///     Ok(())
/// });
///
/// assert!(router.handles(EventKind::OfferCall));
/// let _handler = router.into_handler();
/// ```
#[derive(Default, Clone)]
pub struct EventRouter {
    handlers: HashMap<EventKind, TaskHandler<AgentEvent>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `kind`, replacing any previous one
    pub fn on<F, Fut>(mut self, kind: EventKind, handler: F) -> Self
    where
        F: Fn(AgentEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.handlers.insert(kind, handler_fn(handler));
        self
    }

    pub fn handles(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Registered kinds, in wire-table order
    pub fn kinds(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.handles(*kind))
            .collect()
    }

    /// Pool handler dispatching on `AgentEvent::kind`
    ///
    /// Events without a registered handler fail with `HandlerError::Unhandled`.
    pub fn into_handler(self) -> TaskHandler<AgentEvent> {
        let handlers = Arc::new(self.handlers);
        Arc::new(move |event: AgentEvent| -> BoxFuture<'static, Result<(), HandlerError>> {
            let kind = event.kind();
            match handlers.get(&kind) {
                Some(handler) => handler(event),
                None => Box::pin(async move { Err(HandlerError::Unhandled(kind)) }),
            }
        })
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("kinds", &self.kinds())
            .finish()
    }
}
