//! Listener registry for store change notifications.
//!
//! Listeners are invoked synchronously, in registration order. The registry
//! lock is released before any listener runs, so a listener may subscribe or
//! unsubscribe from inside its callback.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use tracing::warn;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct RegistryState<T> {
    next_id: u64,
    listeners: BTreeMap<u64, Listener<T>>,
}

/// Set of listeners for values of type `T`.
pub struct Subscribers<T> {
    inner: Arc<Mutex<RegistryState<T>>>,
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.len())
            .finish()
    }
}

impl<T> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryState {
                next_id: 1,
                listeners: BTreeMap::new(),
            })),
        }
    }

    /// Register `listener`. It stays registered until the returned handle is
    /// dropped or [`Subscription::unsubscribe`] is called.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = match self.inner.lock() {
            Ok(mut state) => {
                let id = state.next_id;
                state.next_id = state.next_id.saturating_add(1);
                state.listeners.insert(id, Arc::new(listener));
                id
            }
            Err(_) => {
                warn!("listener registry poisoned; subscription ignored");
                0
            }
        };
        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Call every current listener with `value`.
    pub fn publish(&self, value: &T) {
        let listeners: Vec<Listener<T>> = match self.inner.lock() {
            Ok(state) => state.listeners.values().cloned().collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .map(|state| state.listeners.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by [`Subscribers::subscribe`].
pub struct Subscription<T> {
    id: u64,
    registry: Weak<Mutex<RegistryState<T>>>,
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl<T> Subscription<T> {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut state) = registry.lock() {
                state.listeners.remove(&self.id);
            }
        }
    }
}
