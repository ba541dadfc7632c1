//! Topic-keyed publish/subscribe registry.
//!
//! DESIGN
//! ======
//! Each topic maps to an ordered list of subscriptions; insertion order is
//! delivery order. Tokens come from a single per-bus counter starting at 1,
//! so a token identifies exactly one subscription across all topics and
//! unsubscribing scans every topic.
//!
//! Delivery is synchronous. `publish` snapshots the subscriber list before
//! invoking anything, which lets callbacks subscribe, unsubscribe, or
//! publish again without tripping the `RefCell`. Changes made during a
//! publish take effect from the next publish on.
//!
//! ERROR HANDLING
//! ==============
//! Empty topics and the zero token are silent no-ops. A panicking callback
//! is not caught: it unwinds through `publish` into whoever triggered it.

#[cfg(test)]
#[path = "bus_test.rs"]
mod bus_test;

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

/// Handle identifying one subscription. The only way to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

impl Token {
    /// The raw counter value. Never zero for an issued token.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Token {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Callback as stored by the bus: receives the subscription's context, if any.
pub type Callback<P> = Rc<dyn Fn(Option<&dyn Any>, &P)>;

struct Subscription<P> {
    token: Token,
    context: Option<Rc<dyn Any>>,
    callback: Callback<P>,
}

struct Registry<P> {
    topics: HashMap<String, Vec<Subscription<P>>>,
    last_token: u64,
}

/// Publish/subscribe bus carrying payloads of type `P`.
pub struct EventBus<P> {
    registry: RefCell<Registry<P>>,
}

impl<P: 'static> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("EventBus")
            .field("topics", &registry.topics.len())
            .field("last_token", &registry.last_token)
            .finish()
    }
}

impl<P: 'static> EventBus<P> {
    #[must_use]
    pub fn new() -> Self {
        Self { registry: RefCell::new(Registry { topics: HashMap::new(), last_token: 0 }) }
    }

    /// Subscribe `callback` to `topic`. Returns `None` for an empty topic.
    pub fn subscribe<F>(&self, topic: &str, callback: F) -> Option<Token>
    where
        F: Fn(&P) + 'static,
    {
        self.insert(topic, None, Rc::new(move |_: Option<&dyn Any>, payload: &P| callback(payload)))
    }

    /// Subscribe with an explicit context value that is handed to `callback`
    /// on every delivery.
    pub fn subscribe_with_context<C, F>(&self, topic: &str, context: Rc<C>, callback: F) -> Option<Token>
    where
        C: Any,
        F: Fn(&C, &P) + 'static,
    {
        let context: Rc<dyn Any> = context;
        self.insert(
            topic,
            Some(context),
            Rc::new(move |ctx: Option<&dyn Any>, payload: &P| {
                if let Some(ctx) = ctx.and_then(|c| c.downcast_ref::<C>()) {
                    callback(ctx, payload);
                }
            }),
        )
    }

    fn insert(&self, topic: &str, context: Option<Rc<dyn Any>>, callback: Callback<P>) -> Option<Token> {
        if topic.is_empty() {
            return None;
        }
        let mut registry = self.registry.borrow_mut();
        registry.last_token += 1;
        let token = Token(registry.last_token);
        registry
            .topics
            .entry(topic.to_owned())
            .or_default()
            .push(Subscription { token, context, callback });
        trace!(topic, token = token.0, "subscribed");
        Some(token)
    }

    /// Deliver `payload` to every subscriber of `topic`, in subscription order.
    ///
    /// Returns `false` when the topic has no subscribers.
    pub fn publish(&self, topic: &str, payload: &P) -> bool {
        let targets: Vec<(Callback<P>, Option<Rc<dyn Any>>)> = {
            let registry = self.registry.borrow();
            match registry.topics.get(topic) {
                Some(subs) if !subs.is_empty() => subs
                    .iter()
                    .map(|s| (Rc::clone(&s.callback), s.context.clone()))
                    .collect(),
                _ => return false,
            }
        };
        trace!(topic, subscribers = targets.len(), "publish");
        for (callback, context) in &targets {
            callback(context.as_deref(), payload);
        }
        true
    }

    /// Remove the subscription identified by `token`.
    ///
    /// Returns `false` for the zero token or a token that is no longer live.
    pub fn unsubscribe(&self, token: Token) -> bool {
        if token.0 == 0 {
            return false;
        }
        let mut registry = self.registry.borrow_mut();
        for (topic, subs) in &mut registry.topics {
            if let Some(pos) = subs.iter().position(|s| s.token == token) {
                subs.remove(pos);
                trace!(topic = topic.as_str(), token = token.0, "unsubscribed");
                return true;
            }
        }
        false
    }

    /// Drop every subscription on `topic`.
    pub fn clear_topic(&self, topic: &str) -> bool {
        if topic.is_empty() {
            return false;
        }
        self.registry.borrow_mut().topics.remove(topic).is_some()
    }

    /// Drop every subscription and restart the token counter.
    ///
    /// Tokens issued before this call become meaningless and may be reissued.
    pub fn clear_all(&self) {
        let mut registry = self.registry.borrow_mut();
        registry.topics.clear();
        registry.last_token = 0;
    }

    /// Number of topics currently present, including emptied ones.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.registry.borrow().topics.len()
    }

    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.registry.borrow().topics.get(topic).map_or(0, Vec::len)
    }

    /// True when no topic has a live subscription.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.borrow().topics.values().all(Vec::is_empty)
    }
}
