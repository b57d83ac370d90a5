//! Listener registry and unsubscribe handles

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type SharedListener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct HubInner<E> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, SharedListener<E>)>>,
}

/// Fan-out of events of type `E` to registered listeners
pub(crate) struct ListenerHub<E> {
    inner: Arc<HubInner<E>>,
}

impl<E: 'static> ListenerHub<E> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                next_id: AtomicU64::new(0),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn subscribe_boxed(
        &self,
        listener: Box<dyn Fn(&E) + Send + Sync>,
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::from(listener)));

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.lock().retain(|(lid, _)| *lid != id);
            }
        })
    }

    pub(crate) fn emit(&self, event: &E) {
        // Snapshot so listeners may unsubscribe while being called
        let listeners: Vec<SharedListener<E>> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

/// Unsubscribe handle
///
/// The listener stays registered until [`Subscription::unsubscribe`] is
/// called or the handle is dropped.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(detach: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A handle that is not attached to anything
    pub fn detached() -> Self {
        Self { detach: None }
    }

    pub fn unsubscribe(mut self) {
        self.run_detach();
    }

    fn run_detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_may_unsubscribe_during_emit() {
        let hub: ListenerHub<u32> = ListenerHub::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicU64::new(0));

        let inner_slot = Arc::clone(&slot);
        let inner_hits = Arc::clone(&hits);
        let subscription = hub.subscribe_boxed(Box::new(move |_: &u32| {
            inner_hits.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = inner_slot.lock().take() {
                sub.unsubscribe();
            }
        }));
        *slot.lock() = Some(subscription);

        hub.emit(&1);
        hub.emit(&2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_hub_is_harmless() {
        let hub: ListenerHub<u32> = ListenerHub::new();
        let subscription = hub.subscribe_boxed(Box::new(|_: &u32| {}));
        drop(hub);
        subscription.unsubscribe();
    }
}
