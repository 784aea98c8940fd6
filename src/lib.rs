#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

/*!
# Overview
Server-side cookie sessions for Rocket applications, with pluggable storage.

- Each client gets an opaque 32-character session ID in an `HttpOnly` cookie, which is
  re-issued with a fresh `Max-Age` on every request.
- Session data is a key/value bag of JSON values kept on the server. Any type implementing
  `serde::Serialize` / `Deserialize` can be stored and read back.
- Sessions use sliding expiration: every read or write pushes the deadline `max_age` seconds
  into the future.
- The session is loaded once per request and shared by every handler and guard that asks for
  it. It is saved back to the store after the response is built.
- Expired sessions are garbage collected by a background task that stops with the server.
- Two storage providers are included (in-memory and filesystem), or you can
  use your own by implementing the [`SessionStore`](crate::storage::SessionStore) trait.

# Usage

## Basic setup

```rust
use rocket::routes;
use rocket_session_store::{storage::memory::MemoryStore, ActiveSession, Sessions, SessionsOptions};

#[rocket::launch]
fn rocket() -> _ {
    rocket::build()
        // attach the `Sessions` fairing with a store and its options
        .attach(
            Sessions::builder()
                .store(MemoryStore::default())
                .options(
                    SessionsOptions::builder()
                        .cookie_name("sid")
                        .max_age(60 * 60)
                        .gc_interval(5 * 60)
                        .build(),
                )
                .build(),
        )
        .mount("/", routes![login])
}

// use the `ActiveSession` request guard in a route handler
#[rocket::post("/login")]
fn login(session: &ActiveSession) {
    session.store("user_id", "123");
}
```

## Request guard auth

The [`ActiveSession`] guard only fails if the fairing isn't attached: a client without a session
simply gets a new, empty one. Authentication is layered on top with your own request guard:

```
use rocket::{
    http::Status,
    outcome::try_outcome,
    request::{FromRequest, Outcome},
    Request,
};
use rocket_session_store::ActiveSession;

struct User {
    id: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for User {
    type Error = &'static str;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let session = try_outcome!(req.guard::<&ActiveSession>().await);
        match session.load_as::<String>("user_id") {
            Ok(Some(id)) => Outcome::Success(User { id }),
            _ => Outcome::Error((Status::Unauthorized, "Not logged in")),
        }
    }
}

#[rocket::get("/user")]
fn get_user(user: User) -> String {
    format!("Logged in as user {}!", user.id)
}
```

# Storage Providers

| Storage | Feature Flag | Use Case |
|---------|-------------|----------|
| [`storage::memory::MemoryStore`] | Built-in | Single process, development, testing |
| [`storage::filesystem::FilesystemStore`] | `filesystem` (default) | Sessions that survive restarts, single host |

## Custom Storage

To implement a custom storage provider, implement the [`SessionStore`](crate::storage::SessionStore) trait:

```rust
use std::sync::Arc;
use rocket::async_trait;
use rocket_session_store::{error::SessionResult, storage::SessionStore, Session};

pub struct MyCustomStore {}

#[async_trait]
impl SessionStore for MyCustomStore {
    async fn load_or_create(&self, id: &str, max_age: u32) -> (Arc<Session>, bool) {
        // Load the session from your storage, or create a new one
        todo!()
    }

    async fn persist(&self, id: &str, session: &Arc<Session>) -> SessionResult<()> {
        // Save `session.to_record()` to your storage
        todo!()
    }

    async fn delete(&self, id: &str) -> SessionResult<()> {
        // Delete session from your storage
        todo!()
    }

    async fn gc(&self) -> SessionResult<(usize, usize)> {
        // Remove expired sessions, returning the count before and after
        todo!()
    }
}
```

### Implementation Tips

1. **Thread Safety**: All storage implementations must be `Send + Sync`
2. **Misses**: Missing or unreadable records should produce a new session, not an error
3. **Error Handling**: Use [`error::SessionError::Backend`] for custom errors
4. **GC**: Skip and keep records that can't be inspected, rather than failing the sweep
5. **Cleanup**: Implement `setup()` and `shutdown()` if your store holds resources

# Feature flags

| Name    | Description    |
|---------|----------------|
| `filesystem` | (default) The filesystem session store, using [sha2](https://docs.rs/crate/sha2) and [walkdir](https://docs.rs/crate/walkdir). |
| `rocket_okapi`  | Enables support for the [rocket_okapi](https://docs.rs/crate/rocket_okapi) crate if needed. |
*/

mod fairing;
mod guard;
mod options;
mod session;
mod sweep;

pub mod error;
pub mod storage;
pub use fairing::{Sessions, SessionsBuilder, SESSION_ID_LENGTH};
pub use guard::{current_session, ActiveSession};
pub use options::{SessionsOptions, SessionsOptionsBuilder};
pub use session::{Session, SessionRecord};
