//! Filesystem session storage implementation

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use rocket::{
    async_trait,
    tokio::{fs, io::AsyncWriteExt, task::spawn_blocking},
};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::{
    error::{SessionError, SessionResult},
    session::SessionRecord,
    Session,
};

use super::interface::SessionStore;

#[cfg(unix)]
const DIR_MODE: u32 = 0o750;
#[cfg(unix)]
const FILE_MODE: u32 = 0o640;

/**
Durable storage provider that keeps one file per session on local disk.

Each session is serialized as a [`SessionRecord`] in JSON to a path derived from the SHA-256 hash
of the session ID, sharded two directory levels deep (`<dir>/ab/cd/abcd...`) to keep
directories small. Directories are created on demand.

Files are overwritten in place. A record that was only partially written (e.g. after a
crash) fails to decode and is treated as a missing session on the next request, and kept
as-is by garbage collection.

# Example
```rust,no_run
use rocket_session_store::{storage::filesystem::FilesystemStore, Sessions, SessionsOptions};

#[rocket::launch]
fn rocket() -> _ {
    rocket::build().attach(
        Sessions::builder()
            // the directory is created when Rocket ignites
            .store(FilesystemStore::new("/var/lib/my-app/sessions"))
            .options(
                SessionsOptions::builder()
                    .cookie_name("sid")
                    .max_age(7 * 24 * 60 * 60)
                    .gc_interval(10 * 60)
                    .build(),
            )
            .build(),
    )
}
```
*/
#[derive(Clone, Debug)]
pub struct FilesystemStore {
    dir: PathBuf,
}

impl FilesystemStore {
    /// Create a store rooted at `dir`. The directory is created during [`setup`](SessionStore::setup).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a store rooted at `dir`, creating the directory right away. Use this when
    /// the store is used outside of the [`Sessions`](crate::Sessions) fairing.
    pub fn create(dir: impl Into<PathBuf>) -> SessionResult<Self> {
        let store = Self::new(dir);
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        std::os::unix::fs::DirBuilderExt::mode(&mut builder, DIR_MODE);
        builder.create(&store.dir)?;
        Ok(store)
    }

    /// Base directory of the store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the record for a session ID
    pub fn record_path(&self, id: &str) -> PathBuf {
        let digest = Sha256::digest(id.as_bytes());
        self.dir
            .join(format!("{:02x}", digest[0]))
            .join(format!("{:02x}", digest[1]))
            .join(format!("{digest:x}"))
    }

    async fn read_record(&self, path: &Path) -> SessionResult<SessionRecord> {
        let bytes = fs::read(path).await?;
        SessionRecord::decode(&bytes)
    }
}

#[async_trait]
impl SessionStore for FilesystemStore {
    async fn load_or_create(&self, id: &str, max_age: u32) -> (Arc<Session>, bool) {
        let path = self.record_path(id);
        match self.read_record(&path).await {
            Ok(record) => {
                let session = Session::from_record(record);
                session.touch();
                return (Arc::new(session), false);
            }
            Err(SessionError::Io(e)) if e.kind() == ErrorKind::NotFound => {}
            Err(SessionError::Io(e)) => {
                rocket::warn!("Couldn't read session record {}: {e}", path.display());
            }
            Err(e) => {
                rocket::debug!("Discarding unreadable session record {}: {e}", path.display());
            }
        }

        (Arc::new(Session::new(max_age)), true)
    }

    async fn persist(&self, id: &str, session: &Arc<Session>) -> SessionResult<()> {
        let path = self.record_path(id);
        if let Some(parent) = path.parent() {
            create_dirs(parent).await?;
        }
        let bytes = session.to_record().encode()?;
        write_file(&path, &bytes).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> SessionResult<()> {
        match fs::remove_file(self.record_path(id)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn gc(&self) -> SessionResult<(usize, usize)> {
        let dir = self.dir.clone();
        spawn_blocking(move || sweep_dir(&dir))
            .await
            .map_err(|e| SessionError::Backend(e.to_string().into()))
    }

    async fn setup(&self) -> SessionResult<()> {
        create_dirs(&self.dir).await.map_err(|e| {
            SessionError::SetupTeardown(format!(
                "Failed to create session directory {}: {e}",
                self.dir.display()
            ))
        })
    }
}

async fn create_dirs(path: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder.create(path).await
}

async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(FILE_MODE);
    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.flush().await
}

/// Walk the whole directory tree and remove expired records. Entries that can't be read or
/// decoded are kept.
fn sweep_dir(dir: &Path) -> (usize, usize) {
    let (mut from, mut purged) = (0, 0);

    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                rocket::warn!("Skipping entry during session GC: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        from += 1;

        let path = entry.path();
        let record = std::fs::read(path)
            .map_err(SessionError::from)
            .and_then(|bytes| SessionRecord::decode(&bytes));
        match record {
            Ok(record) if record.is_expired() => match std::fs::remove_file(path) {
                Ok(()) => purged += 1,
                Err(e) => rocket::warn!("Failed to remove session {}: {e}", path.display()),
            },
            Ok(_) => {}
            Err(e) => {
                rocket::warn!("Keeping unreadable session record {}: {e}", path.display());
            }
        }
    }

    (from, from - purged)
}
