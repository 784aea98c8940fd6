#![allow(dead_code)]

use std::sync::Arc;

#[cfg(feature = "filesystem")]
use rocket_session_store::storage::filesystem::FilesystemStore;
use rocket_session_store::{
    storage::{memory::MemoryStore, SessionStore},
    Sessions, SessionsOptions,
};
use tempfile::TempDir;

pub const COOKIE_NAME: &str = "sid";

pub fn options(max_age: u32, gc_interval: u32) -> SessionsOptions {
    SessionsOptions::builder()
        .cookie_name(COOKIE_NAME)
        .max_age(max_age)
        .gc_interval(gc_interval)
        .build()
}

/// Create a store for the given test case. The returned temp dir (if any) must be kept alive
/// for the duration of the test.
pub fn create_store(storage_case: &str) -> (Arc<dyn SessionStore>, Option<TempDir>) {
    match storage_case {
        "memory" => (Arc::new(MemoryStore::default()), None),
        #[cfg(feature = "filesystem")]
        "filesystem" => {
            let dir = TempDir::new().expect("Should create temp dir");
            let store = FilesystemStore::create(dir.path().join("sessions"))
                .expect("Should create session directory");
            (Arc::new(store), Some(dir))
        }
        _ => unimplemented!(),
    }
}

/// Create the sessions fairing for the given test case
pub fn create_fairing(
    storage_case: &str,
    max_age: u32,
    gc_interval: u32,
) -> (Sessions, Option<TempDir>) {
    let options = options(max_age, gc_interval);
    match storage_case {
        "memory" => (
            Sessions::builder()
                .store(MemoryStore::default())
                .options(options)
                .build(),
            None,
        ),
        #[cfg(feature = "filesystem")]
        "filesystem" => {
            let dir = TempDir::new().expect("Should create temp dir");
            let store = FilesystemStore::new(dir.path().join("sessions"));
            (
                Sessions::builder().store(store).options(options).build(),
                Some(dir),
            )
        }
        _ => unimplemented!(),
    }
}
