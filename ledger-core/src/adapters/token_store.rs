//! File-backed session token store
//!
//! The bearer token lives in `session` inside the data directory, one line, nothing else.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::result::{Error, Result};
use crate::ports::SessionStore;

const TOKEN_FILE: &str = "session";

pub struct FileTokenStore {
    path: PathBuf,
    token: Mutex<Option<String>>,
}

impl FileTokenStore {
    /// Open the store in `data_dir`, reading any token saved by a previous run
    pub fn open(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(TOKEN_FILE);
        let token = match std::fs::read_to_string(&path) {
            Ok(content) => Some(content.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            token: Mutex::new(token),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_| Error::storage("session lock poisoned"))
    }
}

impl SessionStore for FileTokenStore {
    fn token(&self) -> Option<String> {
        self.lock().ok().and_then(|guard| guard.clone())
    }

    fn set_token(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        *self.lock()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        *self.lock()? = None;
        Ok(())
    }
}
