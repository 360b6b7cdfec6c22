//! In-flight request registry
//!
//! Collapses concurrent identical reads into one shared future. An entry is
//! registered before the future is first polled and removed by a guard that
//! lives inside the future, so removal happens when the work settles or when
//! every waiter has gone away, whichever comes first.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared, WeakShared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};

struct Entry<T> {
    id: u64,
    handle: WeakShared<BoxFuture<'static, T>>,
}

struct Inner<T> {
    next_id: u64,
    entries: HashMap<String, Entry<T>>,
}

/// Map of dedupe key to pending shared result
pub struct InflightRegistry<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for InflightRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for InflightRegistry<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 0,
                entries: HashMap::new(),
            })),
        }
    }
}

/// Deregisters its entry when the owning future completes or is dropped
struct InflightGuard<T> {
    inner: Arc<Mutex<Inner<T>>>,
    key: String,
    id: u64,
}

impl<T> Drop for InflightGuard<T> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // A newer request may have taken the key after this one went stale
        if inner.entries.get(&self.key).is_some_and(|entry| entry.id == self.id) {
            inner.entries.remove(&self.key);
            trace!(key = %self.key, "In-flight entry released");
        }
    }
}

impl<T> InflightRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Await the pending future for `key`, or start one with `start`
    ///
    /// `start` is only invoked when no live entry exists for `key`.
    pub async fn run<F>(&self, key: String, start: F) -> T
    where
        F: FnOnce() -> BoxFuture<'static, T>,
    {
        let shared = self.join_or_register(key, start);
        shared.await
    }

    fn join_or_register<F>(&self, key: String, start: F) -> Shared<BoxFuture<'static, T>>
    where
        F: FnOnce() -> BoxFuture<'static, T>,
    {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = inner.entries.get(&key).and_then(|entry| entry.handle.upgrade()) {
            debug!(key = %key, "Joining in-flight request");
            return existing;
        }

        let id = inner.next_id;
        inner.next_id = inner.next_id.wrapping_add(1);

        let guard = InflightGuard {
            inner: self.inner.clone(),
            key: key.clone(),
            id,
        };
        let work = start();
        let shared = async move {
            let _guard = guard;
            work.await
        }
        .boxed()
        .shared();

        // A fresh, unpolled future always downgrades
        if let Some(handle) = shared.downgrade() {
            inner.entries.insert(key, Entry { id, handle });
        }

        shared
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Whether no request is in flight
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` currently has a registered entry
    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    include!("inflight.test.rs");
}
