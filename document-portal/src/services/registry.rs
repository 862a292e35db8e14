use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Something with in-flight work that must stop once nobody can see it.
pub trait Cancellable: Send + Sync {
    fn cancel(&self);
}

struct Entry<T> {
    value: Arc<T>,
    last_used: Instant,
}

/// Server-side home of per-browser views, keyed by an id kept in the
/// browser's session.
///
/// Entries idle for longer than `idle_timeout` are cancelled and dropped the
/// next time the registry is written to.
pub struct ViewRegistry<T: Cancellable> {
    entries: DashMap<Uuid, Entry<T>>,
    idle_timeout: Duration,
}

impl<T: Cancellable> ViewRegistry<T> {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            idle_timeout,
        }
    }

    /// Store `value` under a fresh id.
    pub fn insert(&self, value: Arc<T>) -> Uuid {
        self.evict_idle();

        let id = Uuid::new_v4();
        self.entries.insert(
            id,
            Entry {
                value,
                last_used: Instant::now(),
            },
        );
        id
    }

    /// Look up a live entry and mark it as used.
    pub fn get(&self, id: &Uuid) -> Option<Arc<T>> {
        let mut entry = self.entries.get_mut(id)?;
        if entry.last_used.elapsed() > self.idle_timeout {
            drop(entry);
            self.remove(id);
            return None;
        }
        entry.last_used = Instant::now();
        Some(entry.value.clone())
    }

    /// Drop an entry and cancel its in-flight work.
    pub fn remove(&self, id: &Uuid) {
        if let Some((_, entry)) = self.entries.remove(id) {
            entry.value.cancel();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_idle(&self) {
        let idle_timeout = self.idle_timeout;
        self.entries.retain(|id, entry| {
            let keep = entry.last_used.elapsed() <= idle_timeout;
            if !keep {
                tracing::debug!(view_id = %id, "Evicting idle view");
                entry.value.cancel();
            }
            keep
        });
    }
}
