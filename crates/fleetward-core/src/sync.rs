//! Per-key async mutual exclusion.
//!
//! Mutations of one device or session are serialised on the record's
//! uid; different uids never contend. Entries are dropped as soon as no
//! task holds or waits on them, so the registry stays proportional to
//! the number of in-flight mutations.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct KeyedLocks {
    inner: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let mutex = self
            .inner
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        KeyGuard {
            key: key.to_string(),
            guard: Some(guard),
            locks: Arc::clone(&self.inner),
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Held while a keyed critical section runs.
pub struct KeyGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release the mutex first so its Arc count reflects only the map
        // and any waiters.
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Key of a device record. Enrollment, registry mutations and session
/// creation on the device all take it.
pub fn device_key(uid: &str) -> String {
    format!("device/{uid}")
}

/// Key of a device name within a tenant. Taken after [`device_key`].
pub fn device_name_key(tenant_id: &str, name: &str) -> String {
    format!("device-name/{tenant_id}/{name}")
}

/// Key of a session record. Taken after [`device_key`] when both are held.
pub fn session_key(uid: &str) -> String {
    format!("session/{uid}")
}
