use std::{
    ops::Deref,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};

use crate::Session;

/// Type of the cached session in Rocket's request local cache
pub(crate) type LocalCachedSession = Option<ActiveSession>;

/**
The session bound to the current request by the [`Sessions`](crate::Sessions) fairing.
Dereferences to [`Session`], so the key/value methods can be called directly on it.

Every use of this guard within a request sees the same session instance. The fairing persists
the session after the response is built, so changes made anywhere during the request are saved.

The guard fails with `500 Internal Server Error` if the fairing isn't attached. Use
`Option<&ActiveSession>` (or [`current_session`]) to check whether a session is bound without
failing.

# Example
```rust
use rocket_session_store::ActiveSession;

#[rocket::get("/visits")]
fn visits(session: &ActiveSession) -> String {
    let visits = session.load_as::<u64>("visits").ok().flatten().unwrap_or(0) + 1;
    session.store("visits", visits);
    format!("Visit #{visits}")
}
```
*/
#[derive(Debug)]
pub struct ActiveSession {
    id: String,
    session: Arc<Session>,
    created: bool,
    invalidated: AtomicBool,
}

impl ActiveSession {
    pub(crate) fn new(id: String, session: Arc<Session>, created: bool) -> Self {
        Self {
            id,
            session,
            created,
            invalidated: AtomicBool::new(false),
        }
    }

    /// The session ID (32-character alphanumeric string)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the session was created during this request, rather than found in the store
    pub fn is_new(&self) -> bool {
        self.created
    }

    /// The shared session instance
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Remove the session from the store at the end of this request, and tell the client
    /// to drop its cookie. The next request will start a new, empty session.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::Release);
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Acquire)
    }
}

impl Deref for ActiveSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

/// Get the session bound to a request, if the [`Sessions`](crate::Sessions) fairing bound one.
pub fn current_session<'r>(req: &'r Request<'_>) -> Option<&'r ActiveSession> {
    req.local_cache(|| LocalCachedSession::None).as_ref()
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for &'r ActiveSession {
    type Error = &'static str;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match current_session(req) {
            Some(active) => Outcome::Success(active),
            None => {
                // Expected for `Option<&ActiveSession>` without the fairing
                rocket::debug!("No session bound to request. Is the Sessions fairing attached?");
                Outcome::Error((Status::InternalServerError, "Sessions fairing not attached"))
            }
        }
    }
}

/// If using rocket-okapi, this implements OpenApiFromRequest for the session guard to ignore it
#[cfg(feature = "rocket_okapi")]
impl<'r> rocket_okapi::request::OpenApiFromRequest<'r> for &'r ActiveSession {
    fn from_request_input(
        _gen: &mut rocket_okapi::gen::OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<rocket_okapi::request::RequestHeaderInput> {
        Ok(rocket_okapi::request::RequestHeaderInput::None)
    }
}
