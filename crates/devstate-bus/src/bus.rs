//! Typed broadcast bus.

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};

use devstate_types::{Message, MessageKind, ModuleId};
use tracing::{error, trace, warn};

use crate::error::HandlerError;

/// Upper bound on messages delivered by a single [`Bus::publish`] call,
/// counting everything handlers publish in response.
pub const MAX_CASCADE: usize = 1024;

/// Callback invoked for every published message of a subscribed kind.
///
/// Handlers run to completion on the dispatch thread and must not block.
/// Messages they want to publish go into the [`Outbox`] and are delivered
/// after the current fan-out finishes.
pub trait Handler: Send {
    fn handle(&mut self, message: &Message, outbox: &mut Outbox) -> Result<(), HandlerError>;
}

impl<F> Handler for F
where
    F: FnMut(&Message, &mut Outbox) -> Result<(), HandlerError> + Send,
{
    fn handle(&mut self, message: &Message, outbox: &mut Outbox) -> Result<(), HandlerError> {
        self(message, outbox)
    }
}

/// Box a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> Box<dyn Handler>
where
    F: FnMut(&Message, &mut Outbox) -> Result<(), HandlerError> + Send + 'static,
{
    Box::new(f)
}

/// Messages published from inside a handler.
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<Message>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message for broadcast once the current handler returns.
    pub fn publish(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Take the queued messages, in publish order.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

/// Summary of one [`Bus::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Messages broadcast, including those published by handlers.
    pub messages: usize,
    /// Handler invocations that succeeded.
    pub delivered: usize,
    /// Handler invocations that returned an error.
    pub failed: usize,
    /// Messages dropped because the cascade limit was reached.
    pub dropped: usize,
}

impl std::ops::AddAssign for Delivery {
    fn add_assign(&mut self, rhs: Self) {
        self.messages += rhs.messages;
        self.delivered += rhs.delivered;
        self.failed += rhs.failed;
        self.dropped += rhs.dropped;
    }
}

struct Subscription {
    owner: ModuleId,
    handler: Box<dyn Handler>,
}

/// In-process publish/subscribe bus keyed by [`MessageKind`].
#[derive(Default)]
pub struct Bus {
    subscriptions: HashMap<MessageKind, Vec<Subscription>>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for messages of `kind` on behalf of `owner`.
    ///
    /// Handlers of the same owner and kind run in registration order.
    pub fn subscribe(&mut self, kind: MessageKind, owner: ModuleId, handler: Box<dyn Handler>) {
        trace!(%kind, %owner, "subscribe");
        self.subscriptions
            .entry(kind)
            .or_default()
            .push(Subscription { owner, handler });
    }

    /// Remove every handler registered by `owner`. Returns how many were removed.
    pub fn unsubscribe(&mut self, owner: ModuleId) -> usize {
        let mut removed = 0;
        for subs in self.subscriptions.values_mut() {
            let before = subs.len();
            subs.retain(|s| s.owner != owner);
            removed += before - subs.len();
        }
        self.subscriptions.retain(|_, subs| !subs.is_empty());
        trace!(%owner, removed, "unsubscribe");
        removed
    }

    /// Number of handlers registered for `kind`.
    pub fn subscriber_count(&self, kind: MessageKind) -> usize {
        self.subscriptions.get(&kind).map_or(0, Vec::len)
    }

    /// Total number of registered handlers.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.values().map(Vec::len).sum()
    }

    /// Deliver `message` to every handler subscribed to its kind.
    ///
    /// Returns once the message, and everything handlers published in
    /// response, has been delivered. A handler that fails or panics is logged
    /// and counted as failed; the remaining handlers still run.
    pub fn publish(&mut self, message: Message) -> Delivery {
        let mut queue = VecDeque::from([message]);
        let mut delivery = Delivery::default();

        while let Some(message) = queue.pop_front() {
            if delivery.messages == MAX_CASCADE {
                delivery.dropped = queue.len() + 1;
                warn!(dropped = delivery.dropped, "cascade limit reached, dropping messages");
                break;
            }
            delivery.messages += 1;

            let kind = message.kind();
            let Some(subs) = self.subscriptions.get_mut(&kind) else {
                trace!(%kind, "no subscribers");
                continue;
            };

            for sub in subs.iter_mut() {
                let mut outbox = Outbox::new();
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    sub.handler.handle(&message, &mut outbox)
                }));
                match result {
                    Ok(Ok(())) => delivery.delivered += 1,
                    Ok(Err(e)) => {
                        delivery.failed += 1;
                        warn!(%kind, owner = %sub.owner, error = %e, "handler failed");
                    }
                    Err(payload) => {
                        delivery.failed += 1;
                        error!(
                            %kind,
                            owner = %sub.owner,
                            panic = panic_message(payload.as_ref()),
                            "handler panicked"
                        );
                        // Whatever it queued before panicking is not trusted.
                        continue;
                    }
                }
                queue.extend(outbox.into_messages());
            }
        }

        delivery
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

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}
