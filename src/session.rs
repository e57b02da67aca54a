//! The signed-in session and the screens it unlocks.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("io error on token file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("not logged in")]
    NotLoggedIn,
}

/// An authenticated session. Every protected API call borrows one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Persists the session token as a single-line file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved session, if any. A missing or blank file means logged out.
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| Session::new(token)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Like `load`, but treats "no session" as an error.
    pub fn require(&self) -> Result<Session, SessionError> {
        self.load()?.ok_or(SessionError::NotLoggedIn)
    }

    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, format!("{}\n", session.token)).map_err(|e| self.io_error(e))
    }

    /// Forget the saved session. Already logged out is fine.
    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Top-level screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Board(u64),
    Profile,
}

impl Route {
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Dashboard | Self::Board(_) | Self::Profile)
    }

    /// Where navigation actually lands: protected screens need a session.
    pub fn guard(self, session: Option<&Session>) -> Route {
        if self.is_protected() && session.is_none() {
            Route::Login
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("nested").join("token"))
    }

    #[test]
    fn test_load_missing_file_is_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_in(&dir).load().unwrap(), None);
        assert!(matches!(store_in(&dir).require(), Err(SessionError::NotLoggedIn)));
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&Session::new("abc123")).unwrap();
        assert_eq!(store.load().unwrap(), Some(Session::new("abc123")));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing twice is not an error.
        store.clear().unwrap();
    }

    #[test]
    fn test_blank_token_file_is_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "  \n").unwrap();
        assert_eq!(SessionStore::new(path).load().unwrap(), None);
    }

    #[test]
    fn test_guard_redirects_protected_routes() {
        let session = Session::new("t");
        for route in [Route::Dashboard, Route::Board(3), Route::Profile] {
            assert_eq!(route.guard(None), Route::Login);
            assert_eq!(route.guard(Some(&session)), route);
        }
        assert_eq!(Route::Register.guard(None), Route::Register);
        assert_eq!(Route::Login.guard(None), Route::Login);
    }
}
