//! The signed-in user, persisted under a single storage key.
//!
//! `SessionContext` is created once at start-up and handed to whatever needs
//! the user; nothing else reads the storage directly.

use crate::models::User;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Storage key the serialized user lives under
pub const SESSION_KEY: &str = "user";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session storage error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key-value storage backed by one JSON file per key in a data directory
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", SESSION_KEY))
    }

    pub fn read(&self) -> Result<Option<String>, SessionError> {
        let path = self.path();
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(io_error(&path, source)),
        }
    }

    pub fn write(&self, value: &str) -> Result<(), SessionError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;
        let path = self.path();
        std::fs::write(&path, value).map_err(|e| io_error(&path, e))
    }

    pub fn remove(&self) -> Result<(), SessionError> {
        let path = self.path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(io_error(&path, source)),
        }
    }
}

fn io_error(path: &Path, source: io::Error) -> SessionError {
    SessionError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// First screen to show after start-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
}

#[derive(Debug)]
pub struct SessionContext {
    store: SessionStore,
    user: Option<User>,
}

impl SessionContext {
    /// Read the stored user. Unreadable data counts as signed out.
    pub fn load(store: SessionStore) -> Result<Self, SessionError> {
        let user = match store.read()? {
            Some(text) => match serde_json::from_str::<User>(&text) {
                Ok(user) => {
                    debug!("Restored session for {}", user.email);
                    Some(user)
                }
                Err(e) => {
                    warn!("Stored session is unreadable, treating as signed out: {}", e);
                    None
                }
            },
            None => None,
        };
        Ok(Self { store, user })
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn initial_route(&self) -> Route {
        if self.is_signed_in() {
            Route::Home
        } else {
            Route::Login
        }
    }

    /// Persist `user` as the current session
    pub fn sign_in(&mut self, user: User) -> Result<(), SessionError> {
        self.store.write(&serde_json::to_string(&user)?)?;
        info!("Signed in as {}", user.email);
        self.user = Some(user);
        Ok(())
    }

    /// Forget the stored user (logout)
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.store.remove()?;
        if let Some(user) = self.user.take() {
            info!("Signed out {}", user.email);
        }
        Ok(())
    }
}
