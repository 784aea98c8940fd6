//! Shared interface for session storage

use std::sync::Arc;

use rocket::async_trait;

use crate::{error::SessionResult, Session};

/// Trait representing a session backend storage. You can use your own session storage
/// by implementing this trait.
///
/// Stores are shared by every in-flight request and the background GC sweep, so all
/// operations must tolerate arbitrary interleaving for different session IDs.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session stored under `id`, or create a fresh empty one with the given `max_age`
    /// (in seconds). The boolean is `true` when the session was created. A record that is
    /// missing or can't be read should be treated as a miss rather than an error.
    ///
    /// Expiration is not checked here: a session that expired but hasn't been garbage
    /// collected yet is handed out again with its deadline extended.
    async fn load_or_create(&self, id: &str, max_age: u32) -> (Arc<Session>, bool);

    /// Save the session, fully replacing whatever was stored under `id`. This is called at the
    /// end of every request. Concurrent writers for the same ID are resolved by last-write-wins.
    async fn persist(&self, id: &str, session: &Arc<Session>) -> SessionResult<()>;

    /// Delete the session stored under `id`. Deleting a missing session is not an error.
    async fn delete(&self, id: &str) -> SessionResult<()>;

    /// Drop all expired sessions. Returns the number of stored sessions before and after the
    /// sweep. Records that can't be inspected should be kept and skipped, not fail the sweep.
    async fn gc(&self) -> SessionResult<(usize, usize)>;

    /// Optional setup of resources that will be called on server startup. An error here
    /// aborts the launch.
    async fn setup(&self) -> SessionResult<()> {
        Ok(()) // Default no-op
    }

    /// Optional teardown of resources that will be called on server shutdown
    async fn shutdown(&self) -> SessionResult<()> {
        Ok(()) // Default no-op
    }
}
