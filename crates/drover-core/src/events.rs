//! Channel-keyed publish/subscribe.
//!
//! Listeners are registered per channel and invoked in registration order
//! (`prepend` inserts at the front). A per-channel listener limit guards
//! against leaks: going over it logs a warning and returns
//! [`EmitterError::MaxListenersExceeded`] instead of registering.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{error, warn};

use crate::error::EmitterError;

/// Default per-channel listener limit. `0` disables the limit.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

pub type Listener<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Handle returned on registration, used with [`EventEmitter::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Entry<P> {
    id: ListenerId,
    once: bool,
    listener: Listener<P>,
}

struct Table<K, P> {
    channels: HashMap<K, Vec<Entry<P>>>,
    max_listeners: usize,
    next_id: u64,
}

#[derive(Clone, Copy)]
enum Placement {
    Back,
    Front,
}

pub struct EventEmitter<K, P> {
    table: Mutex<Table<K, P>>,
}

impl<K, P> EventEmitter<K, P>
where
    K: Eq + Hash + Clone + fmt::Display,
{
    pub fn new() -> Self {
        Self::with_max_listeners(DEFAULT_MAX_LISTENERS)
    }

    pub fn with_max_listeners(max_listeners: usize) -> Self {
        Self {
            table: Mutex::new(Table {
                channels: HashMap::new(),
                max_listeners,
                next_id: 1,
            }),
        }
    }

    pub fn on<F>(&self, channel: K, listener: F) -> Result<ListenerId, EmitterError>
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.register(channel, Arc::new(listener), false, Placement::Back)
    }

    /// Like [`on`](Self::on), but the listener is removed before its first call.
    pub fn once<F>(&self, channel: K, listener: F) -> Result<ListenerId, EmitterError>
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.register(channel, Arc::new(listener), true, Placement::Back)
    }

    pub fn prepend<F>(&self, channel: K, listener: F) -> Result<ListenerId, EmitterError>
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.register(channel, Arc::new(listener), false, Placement::Front)
    }

    pub fn prepend_once<F>(&self, channel: K, listener: F) -> Result<ListenerId, EmitterError>
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.register(channel, Arc::new(listener), true, Placement::Front)
    }

    fn register(
        &self,
        channel: K,
        listener: Listener<P>,
        once: bool,
        placement: Placement,
    ) -> Result<ListenerId, EmitterError> {
        let mut guard = self.lock();
        let table = &mut *guard;

        let max = table.max_listeners;
        let entries = table.channels.entry(channel.clone()).or_default();
        if max != 0 && entries.len() >= max {
            warn!(%channel, max, "max listeners exceeded, listener not registered");
            return Err(EmitterError::MaxListenersExceeded {
                channel: channel.to_string(),
                max,
            });
        }

        let id = ListenerId(table.next_id);
        table.next_id += 1;

        let entry = Entry { id, once, listener };
        match placement {
            Placement::Back => entries.push(entry),
            Placement::Front => entries.insert(0, entry),
        }
        Ok(id)
    }

    /// Remove one listener. Returns whether it was registered.
    pub fn off(&self, channel: &K, id: ListenerId) -> bool {
        let mut table = self.lock();
        let Some(entries) = table.channels.get_mut(channel) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        before != entries.len()
    }

    /// Remove every listener on `channel`, returning how many were removed.
    pub fn remove_all(&self, channel: &K) -> usize {
        self.lock()
            .channels
            .remove(channel)
            .map_or(0, |entries| entries.len())
    }

    pub fn clear(&self) {
        self.lock().channels.clear();
    }

    pub fn listener_count(&self, channel: &K) -> usize {
        self.lock().channels.get(channel).map_or(0, Vec::len)
    }

    pub fn max_listeners(&self) -> usize {
        self.lock().max_listeners
    }

    /// Applies to later registrations only; existing listeners are kept.
    pub fn set_max_listeners(&self, max_listeners: usize) {
        self.lock().max_listeners = max_listeners;
    }

    /// Invoke every listener on `channel` with `payload`, returning how many ran.
    ///
    /// Listeners run after the table lock is released, so they may register,
    /// remove, or emit again. A panicking listener is logged and skipped.
    pub fn emit(&self, channel: &K, payload: &P) -> usize {
        let listeners: Vec<Listener<P>> = {
            let mut table = self.lock();
            let Some(entries) = table.channels.get_mut(channel) else {
                return 0;
            };
            let listeners = entries
                .iter()
                .map(|entry| Arc::clone(&entry.listener))
                .collect();
            entries.retain(|entry| !entry.once);
            listeners
        };

        for listener in &listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(payload))).is_err() {
                error!(%channel, "event listener panicked");
            }
        }
        listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, Table<K, P>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, P> Default for EventEmitter<K, P>
where
    K: Eq + Hash + Clone + fmt::Display,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, P> fmt::Debug for EventEmitter<K, P>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let counts: Vec<(&K, usize)> = table
            .channels
            .iter()
            .map(|(channel, entries)| (channel, entries.len()))
            .collect();
        f.debug_struct("EventEmitter")
            .field("listeners", &counts)
            .field("max_listeners", &table.max_listeners)
            .finish()
    }
}
