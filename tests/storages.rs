mod common;

#[macro_use]
extern crate rocket;

use std::{sync::Arc, time::Duration};

use rocket::{
    http::{Cookie, Status},
    local::asynchronous::Client,
    serde::json::json,
    tokio::{spawn, time::sleep},
};
use rocket_session_store::{storage::SessionStore, ActiveSession};
use test_case::test_case;

use crate::common::{create_fairing, create_store};

fn session_id(n: usize) -> String {
    format!("{n:0>32}")
}

#[cfg_attr(feature = "filesystem", test_case("filesystem"; "Filesystem"))]
#[test_case("memory"; "Memory")]
#[rocket::async_test]
async fn test_load_or_create(storage_case: &str) {
    let (store, _dir) = create_store(storage_case);
    let id = session_id(1);

    let (session, created) = store.load_or_create(&id, 60).await;
    assert!(created, "Missing session is created");
    assert!(session.is_empty());
    assert_eq!(session.max_age(), 60);

    session.store("user", json!({ "id": 7, "name": "Bob" }));
    session.store("visits", 1);
    store.persist(&id, &session).await.unwrap();

    let (loaded, created) = store.load_or_create(&id, 60).await;
    assert!(!created, "Persisted session is found");
    assert_eq!(loaded.load("user"), Some(json!({ "id": 7, "name": "Bob" })));
    assert_eq!(loaded.load("visits"), Some(json!(1)));
    assert_eq!(loaded.len(), 2);
}

#[cfg_attr(feature = "filesystem", test_case("filesystem"; "Filesystem"))]
#[test_case("memory"; "Memory")]
#[rocket::async_test]
async fn test_persist_overwrites(storage_case: &str) {
    let (store, _dir) = create_store(storage_case);
    let id = session_id(2);

    let (first, _) = store.load_or_create(&id, 60).await;
    first.store("a", 1);
    first.store("b", 2);
    store.persist(&id, &first).await.unwrap();

    // Another request writes a different version last
    let (second, _) = store.load_or_create(&id, 60).await;
    second.delete("a");
    second.store("b", 3);
    store.persist(&id, &second).await.unwrap();

    let (loaded, _) = store.load_or_create(&id, 60).await;
    assert_eq!(loaded.load("a"), None);
    assert_eq!(loaded.load("b"), Some(json!(3)));
}

#[cfg_attr(feature = "filesystem", test_case("filesystem"; "Filesystem"))]
#[test_case("memory"; "Memory")]
#[rocket::async_test]
async fn test_delete(storage_case: &str) {
    let (store, _dir) = create_store(storage_case);
    let id = session_id(3);

    let (session, _) = store.load_or_create(&id, 60).await;
    session.store("k", "v");
    store.persist(&id, &session).await.unwrap();

    store.delete(&id).await.unwrap();
    let (session, created) = store.load_or_create(&id, 60).await;
    assert!(created);
    assert_eq!(session.load("k"), None);

    // Deleting a missing session is fine
    store.delete(&id).await.unwrap();
    store.delete(&session_id(999)).await.unwrap();
}

#[cfg_attr(feature = "filesystem", test_case("filesystem"; "Filesystem"))]
#[test_case("memory"; "Memory")]
#[rocket::async_test]
async fn test_gc(storage_case: &str) {
    let (store, _dir) = create_store(storage_case);

    for n in 0..5 {
        // The first three sessions expire right away
        let max_age = if n < 3 { 0 } else { 3600 };
        let (session, _) = store.load_or_create(&session_id(n), max_age).await;
        session.store("n", n);
        store.persist(&session_id(n), &session).await.unwrap();
    }
    sleep(Duration::from_millis(20)).await;

    assert_eq!(store.gc().await.unwrap(), (5, 2), "Reports surviving count");
    assert_eq!(store.gc().await.unwrap(), (2, 2), "Nothing left to purge");

    for n in 0..5 {
        let (_, created) = store.load_or_create(&session_id(n), 3600).await;
        assert_eq!(created, n < 3, "Session {n}");
    }
}

#[cfg_attr(feature = "filesystem", test_case("filesystem"; "Filesystem"))]
#[test_case("memory"; "Memory")]
#[rocket::async_test]
async fn test_expired_session_revived_before_gc(storage_case: &str) {
    let (store, _dir) = create_store(storage_case);
    let id = session_id(4);

    let (session, _) = store.load_or_create(&id, 0).await;
    session.store("k", "v");
    store.persist(&id, &session).await.unwrap();
    sleep(Duration::from_millis(20)).await;

    let (session, created) = store.load_or_create(&id, 60).await;
    assert!(!created, "Expired session is still returned before GC");
    assert_eq!(session.load("k"), Some(json!("v")));
}

#[cfg_attr(feature = "filesystem", test_case("filesystem"; "Filesystem"))]
#[test_case("memory"; "Memory")]
#[rocket::async_test]
async fn test_concurrent_distinct_sessions(storage_case: &str) {
    let (store, _dir) = create_store(storage_case);

    let tasks = (0..32)
        .map(|n| {
            let store: Arc<dyn SessionStore> = store.clone();
            spawn(async move {
                let id = session_id(n);
                for round in 0..5 {
                    let (session, _) = store.load_or_create(&id, 60).await;
                    session.store("owner", n);
                    session.store("round", round);
                    store.persist(&id, &session).await.unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for task in tasks {
        task.await.unwrap();
    }

    for n in 0..32 {
        let (session, created) = store.load_or_create(&session_id(n), 60).await;
        assert!(!created);
        assert_eq!(session.load("owner"), Some(json!(n)));
        assert_eq!(session.load("round"), Some(json!(4)));
        assert_eq!(session.len(), 2);
    }
    assert_eq!(store.gc().await.unwrap(), (32, 32));
}

#[get("/visit")]
fn visit(session: &ActiveSession) -> String {
    let visits = session.load_as::<u64>("visits").ok().flatten().unwrap_or(0) + 1;
    session.store("visits", visits);
    visits.to_string()
}

#[cfg_attr(feature = "filesystem", test_case("filesystem"; "Filesystem"))]
#[test_case("memory"; "Memory")]
#[rocket::async_test]
async fn test_storages(storage_case: &str) {
    let (fairing, _dir) = create_fairing(storage_case, 3600, 600);
    let rocket = rocket::build().attach(fairing).mount("/", routes![visit]);
    let client = Client::tracked(rocket).await.unwrap();

    for expected in 1..=3 {
        let response = client.get("/visit").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.unwrap(), expected.to_string());
    }

    // A malformed cookie starts over with a new session
    let response = client
        .get("/visit")
        .cookie(Cookie::new(common::COOKIE_NAME, "stale"))
        .dispatch()
        .await;
    assert_eq!(response.into_string().await.unwrap(), "1");
}
