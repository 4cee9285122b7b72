use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;

use crate::oauth::StoredToken;

/// Persistence for the OAuth session, injected so the embedder decides where
/// tokens live. Implementations are read fresh on every request and written
/// back on every refresh; there is no cross process locking.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredToken>>;

    fn save(&self, token: &StoredToken) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

fn kumo_home() -> PathBuf {
    match std::env::var("KUMO_HOME") {
        Ok(path) => PathBuf::from(path),
        Err(_) => dirs::home_dir().expect("should have home").join(".kumo"),
    }
}

/// Token store backed by a JSON file, by default under the kumo home
/// directory so the session survives restarts.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: PathBuf::new().join(path),
        }
    }
}

impl Default for FileTokenStore {
    fn default() -> Self {
        let dir = kumo_home();
        if !dir.exists() {
            let _ = std::fs::create_dir_all(&dir);
        }
        Self {
            path: dir.join("drive_token.json"),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredToken>> {
        match std::fs::read(&self.path) {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &StoredToken) -> Result<()> {
        std::fs::write(&self.path, serde_json::to_vec(token)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and embedders that persist elsewhere.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<StoredToken>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredToken>> {
        Ok(self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("token store poisoned"))?
            .clone())
    }

    fn save(&self, token: &StoredToken) -> Result<()> {
        *self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("token store poisoned"))? = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("token store poisoned"))? = None;
        Ok(())
    }
}
