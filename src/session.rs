use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use rocket::{
    serde::{
        de::DeserializeOwned,
        json::{serde_json, Value},
        Deserialize, Serialize,
    },
    time::{Duration, OffsetDateTime},
};

use crate::error::{SessionError, SessionResult};

/**
Server-side state of one client: a key/value bag with a sliding expiration deadline.

Values are JSON [`Value`]s, so anything that implements `Serialize` can be stored via
[`store_as`](Session::store_as) and read back with [`load_as`](Session::load_as) without
registering types anywhere. Every [`load`](Session::load) and [`store`](Session::store) pushes
the deadline forward to `now + max_age`.

A session is shared as an `Arc<Session>` between the store and the request handling it,
so all methods take `&self`.

# Example
```
use rocket_session_store::Session;

let session = Session::new(60);
session.store("user_id", "123");
assert_eq!(session.load("user_id"), Some("123".into()));

session.delete("user_id");
assert_eq!(session.load("user_id"), None);
```
*/
#[derive(Debug)]
pub struct Session {
    state: Mutex<SessionRecord>,
}

impl Session {
    /// Create an empty session that lives for `max_age` seconds from now
    pub fn new(max_age: u32) -> Self {
        Self::new_at(max_age, OffsetDateTime::now_utc())
    }

    fn new_at(max_age: u32, now: OffsetDateTime) -> Self {
        Self::from_record(SessionRecord {
            max_age,
            expires: deadline(now, max_age),
            payload: HashMap::new(),
        })
    }

    /// Restore a session from its durable form
    pub fn from_record(record: SessionRecord) -> Self {
        Self {
            state: Mutex::new(record),
        }
    }

    /// Snapshot the session into its durable form
    pub fn to_record(&self) -> SessionRecord {
        self.lock().clone()
    }

    /// Get the value stored under `key`, if any. Extends the session deadline.
    pub fn load(&self, key: &str) -> Option<Value> {
        self.load_at(key, OffsetDateTime::now_utc())
    }

    fn load_at(&self, key: &str, now: OffsetDateTime) -> Option<Value> {
        let mut state = self.lock();
        state.touch_at(now);
        state.payload.get(key).cloned()
    }

    /// Get the value stored under `key` converted into `T`. Extends the session deadline.
    pub fn load_as<T: DeserializeOwned>(&self, key: &str) -> SessionResult<Option<T>> {
        self.load(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| SessionError::Serialization(Box::new(e)))
    }

    /// Insert or replace the value under `key`. Extends the session deadline.
    pub fn store(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.store_at(key.into(), value.into(), OffsetDateTime::now_utc());
    }

    fn store_at(&self, key: String, value: Value, now: OffsetDateTime) {
        let mut state = self.lock();
        state.touch_at(now);
        state.payload.insert(key, value);
    }

    /// Serialize `value` and store it under `key`. Extends the session deadline.
    pub fn store_as<T>(&self, key: impl Into<String>, value: &T) -> SessionResult<()>
    where
        T: Serialize + ?Sized,
    {
        let value =
            serde_json::to_value(value).map_err(|e| SessionError::Serialization(Box::new(e)))?;
        self.store(key, value);
        Ok(())
    }

    /// Remove `key` if present. The deadline is left untouched.
    pub fn delete(&self, key: &str) {
        self.lock().payload.remove(key);
    }

    /// Remove all keys. Extends the session deadline.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.touch_at(OffsetDateTime::now_utc());
        state.payload.clear();
    }

    /// Keys currently in the session, in no particular order
    pub fn keys(&self) -> Vec<String> {
        self.lock().payload.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().payload.is_empty()
    }

    /// Lifetime in seconds, fixed when the session was created
    pub fn max_age(&self) -> u32 {
        self.lock().max_age
    }

    /// Current expiration deadline
    pub fn expires_at(&self) -> OffsetDateTime {
        self.lock().expires
    }

    /// Slide the deadline forward without reading or writing data
    pub(crate) fn touch(&self) {
        self.touch_at(OffsetDateTime::now_utc());
    }

    fn touch_at(&self, now: OffsetDateTime) {
        self.lock().touch_at(now);
    }

    pub(crate) fn is_expired(&self) -> bool {
        self.lock().is_expired()
    }

    fn lock(&self) -> MutexGuard<'_, SessionRecord> {
        self.state.lock().expect("Failed to get session data lock")
    }
}

/// Durable form of a [`Session`], as written by persistent stores. Encoded as
/// self-describing JSON bytes without a version field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SessionRecord {
    /// Lifetime in seconds
    pub max_age: u32,
    /// Absolute expiration deadline
    pub expires: OffsetDateTime,
    /// Session data
    pub payload: HashMap<String, Value>,
}

impl SessionRecord {
    pub fn encode(&self) -> SessionResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| SessionError::Serialization(Box::new(e)))
    }

    pub fn decode(bytes: &[u8]) -> SessionResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| SessionError::Serialization(Box::new(e)))
    }

    /// Whether the deadline has passed
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires
    }

    fn touch_at(&mut self, now: OffsetDateTime) {
        self.expires = deadline(now, self.max_age);
    }
}

fn deadline(now: OffsetDateTime, max_age: u32) -> OffsetDateTime {
    now.saturating_add(Duration::seconds(max_age.into()))
}
