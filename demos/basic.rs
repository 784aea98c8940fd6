//! This is a basic example of how to use the `Sessions` fairing. To demonstrate both storage
//! providers, this will store sessions in memory for a debug build and on disk in
//! the release build.

use rocket::{
    http::Status,
    routes,
    serde::{json::Json, Deserialize, Serialize},
};
use rocket_session_store::{
    storage::{filesystem::FilesystemStore, memory::MemoryStore},
    ActiveSession, Sessions, SessionsOptions,
};

// Data stored in the session under the "user" key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
struct BasicUser {
    user_id: u32,
    name: String,
}

#[rocket::launch]
async fn basic() -> _ {
    let options = SessionsOptions::builder()
        .cookie_name("my-cookie-name")
        .max_age(60 * 60) // sessions last an hour after the last request
        .gc_interval(5 * 60) // look for expired sessions every 5 minutes
        .build();

    // Use an in-memory store for development/debug mode, and a filesystem store for production
    let builder = Sessions::builder().options(options);
    let session_fairing = if cfg!(debug_assertions) {
        builder.store(MemoryStore::default()).build()
    } else {
        builder.store(FilesystemStore::new("./sessions")).build()
    };

    // Attach the session fairing and mount the routes
    rocket::build()
        .attach(session_fairing)
        .mount("/", routes![login, logout, user, visits])
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
struct LoginData {
    username: String,
    password: String,
}

#[rocket::post("/login", data = "<data>")]
async fn login(
    session: &ActiveSession,
    data: Json<LoginData>,
) -> Result<&'static str, (Status, &'static str)> {
    if session.load("user").is_some() {
        return Err((Status::BadRequest, "Already logged in"));
    }

    // Implement actual login logic here
    if data.username == "rossg" && data.password == "dinosaurs" {
        let user = BasicUser {
            user_id: 1,
            name: "Ross".to_string(),
        };
        session
            .store_as("user", &user)
            .map_err(|_| (Status::InternalServerError, "Failed to save session"))?;
        Ok("Logged in")
    } else {
        Err((Status::Unauthorized, "Invalid credentials"))
    }
}

#[rocket::get("/user")]
async fn user(session: &ActiveSession) -> Result<String, (Status, &'static str)> {
    match session.load_as::<BasicUser>("user") {
        Ok(Some(user)) => Ok(format!("User ID: {} ({})", user.user_id, user.name)),
        _ => Err((Status::Unauthorized, "Not logged in")),
    }
}

#[rocket::post("/logout")]
async fn logout(session: &ActiveSession) -> &'static str {
    session.invalidate();
    "Logged out"
}

// Works for anonymous visitors too: every client has a session
#[rocket::get("/visits")]
async fn visits(session: &ActiveSession) -> String {
    let count = session.load_as::<u64>("visits").ok().flatten().unwrap_or(0) + 1;
    session.store("visits", count);
    format!("You've been here {count} times")
}
