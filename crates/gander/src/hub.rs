//! Typed publish/subscribe hub.
//!
//! The host library and its pool/connection objects expose lifecycle
//! notifications through [`Hub`]s. Subscribers get a [`SubscriberId`] token
//! back so the owner can deterministically tear a subscription down later;
//! once-subscribers are removed before their single invocation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Token identifying one subscription on one hub.
///
/// Tokens are process-unique, so holding a token from the wrong hub can
/// never remove somebody else's subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

fn next_subscriber_id() -> SubscriberId {
    SubscriberId(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed))
}

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T> {
    id: SubscriberId,
    once: bool,
    handler: Handler<T>,
}

/// A typed event hub: `on` / `once` / `removeListener` as an explicit
/// interface.
pub struct Hub<T> {
    entries: Mutex<Vec<Entry<T>>>,
}

impl<T> Default for Hub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Hub<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Durable subscription; fires on every [`emit`](Self::emit) until
    /// unsubscribed.
    pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> SubscriberId {
        self.push(false, Arc::new(handler))
    }

    /// One-shot subscription; removed before its single invocation.
    pub fn subscribe_once(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> SubscriberId {
        self.push(true, Arc::new(handler))
    }

    fn push(&self, once: bool, handler: Handler<T>) -> SubscriberId {
        let id = next_subscriber_id();
        self.entries.lock().push(Entry { id, once, handler });
        id
    }

    /// Removes a subscription. Unknown or already-removed tokens are
    /// ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.entries.lock().retain(|entry| entry.id != id);
    }

    /// Delivers `value` to every current subscriber.
    ///
    /// Handlers run without the hub lock held, so they may freely
    /// subscribe/unsubscribe (on this hub or others) while being invoked.
    pub fn emit(&self, value: &T) {
        let handlers: Vec<Handler<T>> = {
            let mut entries = self.entries.lock();
            let handlers = entries
                .iter()
                .map(|entry| Arc::clone(&entry.handler))
                .collect();
            entries.retain(|entry| !entry.once);
            handlers
        };
        for handler in handlers {
            handler(value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.entries.lock().len()
    }
}
