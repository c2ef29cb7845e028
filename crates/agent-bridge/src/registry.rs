//! Registry of active call sessions
//!
//! Sessions are registered when created and tombstoned when closed. A
//! tombstone keeps a closed call distinguishable from an unknown one for a
//! grace period, so a late transfer completion referencing an ended parent
//! is recognized as such. Expired tombstones are purged lazily on insert.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::session::CallSession;
use crate::types::CallSid;

enum RegistryEntry {
    Live(Arc<dyn CallSession>),
    Closed { at: Instant },
}

/// Result of resolving a call identifier
pub enum Lookup {
    Live(Arc<dyn CallSession>),
    Closed,
    Unknown,
}

impl std::fmt::Debug for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lookup::Live(session) => write!(f, "Live({})", session.call_sid()),
            Lookup::Closed => write!(f, "Closed"),
            Lookup::Unknown => write!(f, "Unknown"),
        }
    }
}

pub struct CallRegistry {
    calls: DashMap<CallSid, RegistryEntry>,
    tombstone_grace: Duration,
}

impl CallRegistry {
    pub fn new(tombstone_grace: Duration) -> Self {
        Self {
            calls: DashMap::new(),
            tombstone_grace,
        }
    }

    /// Register a live session. Returns `false` and keeps the existing entry
    /// if a live session with the same identifier is already registered.
    pub fn insert(&self, session: Arc<dyn CallSession>) -> bool {
        self.purge_expired();

        let call_sid = session.call_sid().clone();
        match self.calls.entry(call_sid) {
            Entry::Occupied(mut occupied) => match occupied.get() {
                RegistryEntry::Live(_) => {
                    warn!("call {} is already registered, keeping the first session", occupied.key());
                    false
                }
                RegistryEntry::Closed { .. } => {
                    occupied.insert(RegistryEntry::Live(session));
                    true
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(RegistryEntry::Live(session));
                true
            }
        }
    }

    pub fn lookup(&self, call_sid: &CallSid) -> Lookup {
        match self.calls.get(call_sid).as_deref() {
            Some(RegistryEntry::Live(session)) => Lookup::Live(session.clone()),
            Some(RegistryEntry::Closed { .. }) => Lookup::Closed,
            None => Lookup::Unknown,
        }
    }

    /// Live session for `call_sid`, if any
    pub fn get(&self, call_sid: &CallSid) -> Option<Arc<dyn CallSession>> {
        match self.lookup(call_sid) {
            Lookup::Live(session) => Some(session),
            _ => None,
        }
    }

    /// Replace the live entry for `session` with a tombstone.
    ///
    /// Only the registered session itself can retire its entry; a rejected
    /// duplicate sharing the call identifier leaves it untouched.
    pub fn mark_closed(&self, session: &Arc<dyn CallSession>) {
        let call_sid = session.call_sid();
        if let Some(mut entry) = self.calls.get_mut(call_sid) {
            match &*entry {
                RegistryEntry::Live(registered) if Arc::ptr_eq(registered, session) => {
                    *entry = RegistryEntry::Closed { at: Instant::now() };
                    debug!("call {} tombstoned", call_sid);
                }
                RegistryEntry::Live(_) => {
                    debug!("call {} is registered to another session, not tombstoning", call_sid)
                }
                RegistryEntry::Closed { .. } => {}
            }
        }
    }

    /// Drop tombstones older than the grace period; returns how many were dropped
    pub fn purge_expired(&self) -> usize {
        let before = self.calls.len();
        let grace = self.tombstone_grace;
        self.calls.retain(|_, entry| match entry {
            RegistryEntry::Closed { at } => at.elapsed() < grace,
            RegistryEntry::Live(_) => true,
        });
        before.saturating_sub(self.calls.len())
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.calls
            .iter()
            .filter(|entry| matches!(entry.value(), RegistryEntry::Live(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tombstone_count(&self) -> usize {
        self.calls.len().saturating_sub(self.len())
    }
}
