use anyhow::Context;
use serde::{Deserialize, Serialize};
use shared_types::{LoginResponse, User};
use std::path::PathBuf;
use std::sync::RwLock;

/// Session persisted after login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub token: String,
    pub expires_at: i64,
    pub user: Option<User>,
}

impl StoredSession {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

impl From<&LoginResponse> for StoredSession {
    fn from(login: &LoginResponse) -> Self {
        Self {
            token: login.token.clone(),
            expires_at: login.expires_at,
            user: Some(login.user.clone()),
        }
    }
}

/// Source of the bearer token for API calls. Passed to the client explicitly.
pub trait SessionProvider: Send + Sync {
    fn current(&self) -> Option<StoredSession>;
    fn store(&self, session: StoredSession) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;

    /// Token of a session that has not expired yet.
    fn token(&self) -> Option<String> {
        let now = chrono::Utc::now().timestamp();
        self.current()
            .filter(|session| !session.is_expired(now))
            .map(|session| session.token)
    }
}

/// In-memory session, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySession {
    inner: RwLock<Option<StoredSession>>,
}

impl MemorySession {
    pub fn new(session: Option<StoredSession>) -> Self {
        Self {
            inner: RwLock::new(session),
        }
    }
}

impl SessionProvider for MemorySession {
    fn current(&self) -> Option<StoredSession> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }

    fn store(&self, session: StoredSession) -> anyhow::Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("Session lock poisoned"))?;
        *guard = Some(session);
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("Session lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

/// JSON file holding the session between CLI invocations.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SessionProvider for FileSessionStore {
    fn current(&self) -> Option<StoredSession> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn store(&self, session: StoredSession) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&session)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: i64) -> StoredSession {
        StoredSession {
            token: "tok".to_string(),
            expires_at,
            user: None,
        }
    }

    #[test]
    fn test_expired_session_has_no_token() {
        let store = MemorySession::new(Some(session(0)));
        assert!(store.current().is_some());
        assert_eq!(store.token(), None);

        store.store(session(i64::MAX)).unwrap();
        assert_eq!(store.token().as_deref(), Some("tok"));

        store.clear().unwrap();
        assert!(store.current().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("crm").join("session.json"));

        assert!(store.current().is_none());
        store.clear().unwrap();

        store.store(session(i64::MAX)).unwrap();
        assert_eq!(store.token().as_deref(), Some("tok"));

        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_ignores_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(FileSessionStore::new(path).token().is_none());
    }
}
