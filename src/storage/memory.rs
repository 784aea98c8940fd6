//! In-memory session storage implementation

use std::sync::Arc;

use dashmap::DashMap;
use rocket::async_trait;

use crate::{error::SessionResult, Session};

use super::interface::SessionStore;

/// In-memory storage provider for sessions. Sessions live in a concurrent map and are shared
/// by reference with the requests using them, so nothing is copied on load or persist.
/// Data is lost when the process exits, and isn't shared between processes.
///
/// Clones share the same underlying map.
///
/// # Example
/// ```rust
/// use rocket_session_store::{storage::memory::MemoryStore, Sessions, SessionsOptions};
///
/// let store = MemoryStore::default();
/// let fairing = Sessions::builder()
///     .store(store.clone())
///     .options(
///         SessionsOptions::builder()
///             .cookie_name("sid")
///             .max_age(3600)
///             .gc_interval(60)
///             .build(),
///     )
///     .build();
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<DashMap<String, Arc<Session>>>,
}

impl MemoryStore {
    /// Number of stored sessions, including expired ones not yet collected
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load_or_create(&self, id: &str, max_age: u32) -> (Arc<Session>, bool) {
        // Clone out of the map so no shard lock is held by the caller
        let existing = self.sessions.get(id).map(|entry| entry.value().clone());
        match existing {
            Some(session) => {
                session.touch();
                (session, false)
            }
            None => (Arc::new(Session::new(max_age)), true),
        }
    }

    async fn persist(&self, id: &str, session: &Arc<Session>) -> SessionResult<()> {
        self.sessions.insert(id.to_owned(), session.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> SessionResult<()> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn gc(&self) -> SessionResult<(usize, usize)> {
        let (mut from, mut purged) = (0, 0);
        self.sessions.retain(|_, session| {
            from += 1;
            let expired = session.is_expired();
            if expired {
                purged += 1;
            }
            !expired
        });
        Ok((from, from - purged))
    }
}
