use std::{sync::Arc, time::Duration as StdDuration};

use bon::Builder;
use rand::distr::{Alphanumeric, SampleString};
use rocket::{
    fairing::{self, Fairing},
    http::{Cookie, CookieJar},
    time::{Duration, OffsetDateTime},
    tokio::sync::Mutex,
    Build, Data, Orbit, Request, Response, Rocket,
};

use crate::{
    guard::{current_session, ActiveSession},
    storage::SessionStore,
    sweep::Sweeper,
    Session, SessionsOptions,
};

/// Length of generated session IDs. Cookies holding anything else are ignored.
pub const SESSION_ID_LENGTH: usize = 32;

/// Attempts at generating an ID that isn't already taken in the store
const MAX_ID_ATTEMPTS: usize = 5;

/**
A Rocket fairing that enables server-side sessions.

On every request, the fairing reads the session ID cookie (or generates a new ID), loads or
creates the session from the configured [store](SessionStore), re-issues the cookie, and binds
the session to the request as an [`ActiveSession`]. After the response is built, the session is
saved back to the store. A background task garbage collects expired sessions every
[`gc_interval`](SessionsOptions::gc_interval) seconds until Rocket shuts down.

# Example
```rust
use rocket_session_store::{storage::memory::MemoryStore, ActiveSession, Sessions, SessionsOptions};

#[rocket::get("/")]
fn index(session: &ActiveSession) -> String {
    match session.load("name") {
        Some(name) => format!("Hello again, {name}!"),
        None => {
            session.store("name", "stranger");
            "Hello!".to_owned()
        }
    }
}

#[rocket::launch]
fn rocket() -> _ {
    let sessions = Sessions::builder()
        .store(MemoryStore::default())
        .options(
            SessionsOptions::builder()
                .cookie_name("sid")
                .max_age(30 * 60)
                .gc_interval(60)
                .build(),
        )
        .build();

    rocket::build()
        .attach(sessions)
        .mount("/", rocket::routes![index])
}
```
*/
#[derive(Builder)]
pub struct Sessions {
    /// Set the session storage provider.
    #[builder(with = |store: impl SessionStore + 'static| Arc::new(store))]
    pub(crate) store: Arc<dyn SessionStore>,
    /// Set the session options.
    pub(crate) options: SessionsOptions,
    #[builder(skip)]
    sweeper: Mutex<Option<Sweeper>>,
}

impl Sessions {
    /// Read the session cookie, load the matching session and refresh the cookie
    async fn acquire(&self, cookie_jar: &CookieJar<'_>) -> ActiveSession {
        let cookie_id = cookie_jar
            .get(&self.options.cookie_name)
            .map(|cookie| cookie.value())
            .filter(|id| is_valid_id(id))
            .map(str::to_owned);

        let (id, session, created) = match cookie_id {
            Some(id) => {
                rocket::debug!("Got session id '{id}' from cookie. Loading session...");
                let (session, created) = self.store.load_or_create(&id, self.options.max_age).await;
                (id, session, created)
            }
            None => {
                rocket::debug!("No valid session cookie found. Creating new session...");
                self.create_session().await
            }
        };

        cookie_jar.add(create_session_cookie(&id, &self.options));
        ActiveSession::new(id, session, created)
    }

    /// Generate a fresh ID, retrying if the store already has a session under it
    async fn create_session(&self) -> (String, Arc<Session>, bool) {
        let mut id = generate_id();
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let (session, created) = self.store.load_or_create(&id, self.options.max_age).await;
            if created {
                return (id, session, created);
            }
            rocket::warn!("Generated session id is already in use (attempt {attempt})");
            if attempt < MAX_ID_ATTEMPTS {
                id = generate_id();
            }
        }

        // Never hand out another client's session. The stored one is overwritten on save.
        rocket::error!("No unused session id after {MAX_ID_ATTEMPTS} attempts, replacing session '{id}'");
        (id, Arc::new(Session::new(self.options.max_age)), true)
    }
}

#[rocket::async_trait]
impl Fairing for Sessions {
    fn info(&self) -> fairing::Info {
        use rocket::fairing::Kind;
        fairing::Info {
            name: "Sessions",
            kind: Kind::Ignite | Kind::Request | Kind::Response | Kind::Shutdown | Kind::Singleton,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> fairing::Result {
        rocket::debug!("Setting up session store...");
        if let Err(e) = self.store.setup().await {
            rocket::error!("Session store setup failed: {e}");
            return Err(rocket);
        }

        if self.options.gc_interval == 0 {
            rocket::warn!("Session GC interval is 0, expired sessions won't be collected");
        } else {
            let period = StdDuration::from_secs(self.options.gc_interval.into());
            let sweeper = Sweeper::start(self.store.clone(), period);
            if let Some(previous) = self.sweeper.lock().await.replace(sweeper) {
                previous.stop().await;
            }
        }

        Ok(rocket)
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let req: &Request<'_> = req;
        req.local_cache_async(async { Some(self.acquire(req.cookies()).await) })
            .await;
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let Some(active) = current_session(req) else {
            return;
        };
        let id = active.id();

        // Handle invalidated session
        if active.is_invalidated() {
            rocket::debug!("Session invalidated. Deleting session '{id}'...");
            if let Err(e) = self.store.delete(id).await {
                rocket::warn!("Error while deleting session '{id}': {e}");
            } else {
                rocket::debug!("Deleted session '{id}' successfully");
            }
            // Goes after the session cookie from the jar, and clients apply the last one
            res.adjoin_header(&removal_cookie(&self.options));
            return;
        }

        // Rocket drops the jar's cookies on error responses, so re-issue the cookie here
        if !has_cookie(res, &self.options.cookie_name) {
            res.adjoin_header(&create_session_cookie(id, &self.options));
        }

        // Save the session, even if unchanged, to keep the sliding expiration
        rocket::debug!("Saving session '{id}'...");
        if let Err(e) = self.store.persist(id, active.session()).await {
            rocket::error!("Error while saving session '{id}': {e}");
        } else {
            rocket::debug!("Saved session '{id}' successfully");
        }
    }

    async fn on_shutdown(&self, _rocket: &Rocket<Orbit>) {
        rocket::debug!("Shutting down session resources...");
        if let Some(sweeper) = self.sweeper.lock().await.take() {
            sweeper.stop().await;
        }
        if let Err(e) = self.store.shutdown().await {
            rocket::warn!("Error during session store shutdown: {e}");
        }
    }
}

fn generate_id() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), SESSION_ID_LENGTH)
}

fn is_valid_id(id: &str) -> bool {
    id.len() == SESSION_ID_LENGTH && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Create the session cookie
fn create_session_cookie(id: &str, options: &SessionsOptions) -> Cookie<'static> {
    Cookie::build((options.cookie_name.to_owned(), id.to_owned()))
        .http_only(true)
        .max_age(Duration::seconds(options.max_age.into()))
        .path("/")
        .build()
}

/// Whether the response already sets the named cookie
fn has_cookie(res: &Response<'_>, name: &str) -> bool {
    res.headers()
        .get("Set-Cookie")
        .filter_map(|value| Cookie::parse(value).ok())
        .any(|cookie| cookie.name() == name)
}

/// Create a cookie telling the client to drop its session cookie
fn removal_cookie(options: &SessionsOptions) -> Cookie<'static> {
    Cookie::build((options.cookie_name.to_owned(), ""))
        .http_only(true)
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .path("/")
        .build()
}
