use crate::error::{BmxError, Result};
use crate::models::CachedSession;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

/// Persistence for identity provider sessions
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore {
    fn sessions(&self) -> Result<Vec<CachedSession>>;

    /// Persist `sessions`, dropping any that have already expired
    fn save(&self, sessions: Vec<CachedSession>) -> Result<()>;
}

/// Session cache stored as a JSON array in ~/.bmx/<org>-sessions
pub struct FileSessionStore {
    cache_file: PathBuf,
}

impl FileSessionStore {
    pub fn new(org: &str) -> Result<Self> {
        let cache_dir = dirs::home_dir()
            .ok_or_else(|| BmxError::CacheError("Could not determine home directory".to_string()))?
            .join(".bmx");

        Ok(Self::at(cache_dir.join(format!("{}-sessions", org))))
    }

    pub fn at(cache_file: PathBuf) -> Self {
        Self { cache_file }
    }
}

impl SessionStore for FileSessionStore {
    fn sessions(&self) -> Result<Vec<CachedSession>> {
        if !self.cache_file.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.cache_file)
            .map_err(|e| BmxError::CacheError(format!("Failed to read cache file: {}", e)))?;

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        // Entries are decoded one at a time so a single bad record doesn't hide the rest
        let entries: Vec<serde_json::Value> = serde_json::from_str(&contents)?;
        let sessions = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!("Skipping unreadable cached session: {}", e);
                    None
                }
            })
            .collect();

        Ok(sessions)
    }

    fn save(&self, sessions: Vec<CachedSession>) -> Result<()> {
        let active = prune_expired(sessions, Utc::now());

        if let Some(dir) = self.cache_file.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| {
                    BmxError::CacheError(format!("Failed to create cache directory: {}", e))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(&active)?;
        fs::write(&self.cache_file, json)
            .map_err(|e| BmxError::CacheError(format!("Failed to write cache file: {}", e)))?;

        tracing::debug!(
            "Saved {} session(s) to {}",
            active.len(),
            self.cache_file.display()
        );
        Ok(())
    }
}

pub fn prune_expired(sessions: Vec<CachedSession>, now: DateTime<Utc>) -> Vec<CachedSession> {
    sessions
        .into_iter()
        .filter(|s| !s.is_expired_at(now))
        .collect()
}

/// Find the longest-lived session for `username` that is still valid at `now`
pub fn lookup<'a>(
    sessions: &'a [CachedSession],
    username: &str,
    now: DateTime<Utc>,
) -> Option<&'a CachedSession> {
    sessions
        .iter()
        .filter(|s| s.username == username && !s.is_expired_at(now))
        .max_by_key(|s| s.expires_at)
}

/// Add a freshly established session to the store.
///
/// An unreadable cache is replaced rather than left in place.
pub fn remember(store: &dyn SessionStore, session: CachedSession) -> Result<()> {
    let mut sessions = store.sessions().unwrap_or_else(|e| {
        tracing::warn!("Replacing unreadable session cache: {}", e);
        Vec::new()
    });
    sessions.retain(|s| !(s.username == session.username && s.session_id == session.session_id));
    sessions.push(session);
    store.save(sessions)
}

/// Drop a session the identity provider no longer accepts
pub fn forget(store: &dyn SessionStore, session_id: &str) -> Result<()> {
    let mut sessions = store.sessions()?;
    sessions.retain(|s| s.session_id != session_id);
    store.save(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(username: &str, id: &str, expires_at: DateTime<Utc>) -> CachedSession {
        CachedSession {
            username: username.to_string(),
            session_id: id.to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_lookup_finds_live_session() {
        let now = Utc::now();
        let sessions = vec![session("testuser", "live", now + Duration::hours(1))];

        let found = lookup(&sessions, "testuser", now).unwrap();
        assert_eq!(found.session_id, "live");
    }

    #[test]
    fn test_lookup_ignores_expired_session() {
        let now = Utc::now();
        let sessions = vec![session("testuser", "stale", now - Duration::hours(1))];

        assert!(lookup(&sessions, "testuser", now).is_none());
    }

    #[test]
    fn test_lookup_skips_other_users_and_stale_entries() {
        let now = Utc::now();
        let sessions = vec![
            session("testuser", "stale-1", now - Duration::hours(2)),
            session("otheruser", "other", now + Duration::hours(1)),
            session("testuser", "stale-2", now - Duration::minutes(1)),
            session("testuser", "short", now + Duration::minutes(10)),
            session("testuser", "long", now + Duration::hours(2)),
        ];

        let found = lookup(&sessions, "testuser", now).unwrap();
        assert_eq!(found.session_id, "long");
        assert!(lookup(&sessions, "nobody", now).is_none());
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::at(dir.path().join("org-sessions"));

        assert!(store.sessions().unwrap().is_empty());
    }

    #[test]
    fn test_save_prunes_expired_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::at(dir.path().join(".bmx").join("org-sessions"));
        let now = Utc::now();

        store
            .save(vec![
                session("testuser", "stale", now - Duration::hours(1)),
                session("testuser", "live", now + Duration::hours(1)),
            ])
            .unwrap();

        let saved = store.sessions().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].session_id, "live");
    }

    #[test]
    fn test_remember_appends_to_existing_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::at(dir.path().join("org-sessions"));
        let expires = Utc::now() + Duration::hours(1);

        remember(&store, session("alice", "a", expires)).unwrap();
        remember(&store, session("bob", "b", expires)).unwrap();
        remember(&store, session("alice", "a", expires)).unwrap();

        let saved = store.sessions().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(lookup(&saved, "bob", Utc::now()).unwrap().session_id, "b");
    }

    #[test]
    fn test_unparseable_entry_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("org-sessions");
        let expires = (Utc::now() + Duration::hours(1)).to_rfc3339();
        fs::write(
            &path,
            format!(
                r#"[{{"userId":"a","sessionId":"x","expiresAt":"bogus"}},{{"userId":"b","sessionId":"y","expiresAt":"{}"}}]"#,
                expires
            ),
        )
        .unwrap();

        let sessions = FileSessionStore::at(path).sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, "y");
    }

    #[test]
    fn test_remember_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("org-sessions");
        fs::write(&path, r#"[{"userId":"a","sessionId":"x","expiresAt":"bogus"#).unwrap();
        let store = FileSessionStore::at(path);
        assert!(store.sessions().is_err());

        remember(&store, session("alice", "fresh", Utc::now() + Duration::hours(1))).unwrap();

        let saved = store.sessions().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].session_id, "fresh");
    }

    #[test]
    fn test_remember_drops_bad_entries_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("org-sessions");
        fs::write(&path, r#"[{"userId":"a","sessionId":"x","expiresAt":"bogus"}]"#).unwrap();
        let store = FileSessionStore::at(path.clone());

        remember(&store, session("alice", "fresh", Utc::now() + Duration::hours(1))).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("bogus"));
        assert_eq!(store.sessions().unwrap()[0].session_id, "fresh");
    }

    #[test]
    fn test_forget_removes_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::at(dir.path().join("org-sessions"));
        let expires = Utc::now() + Duration::hours(1);
        remember(&store, session("alice", "a", expires)).unwrap();
        remember(&store, session("alice", "b", expires)).unwrap();

        forget(&store, "a").unwrap();

        let saved = store.sessions().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].session_id, "b");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("org-sessions");
        fs::write(&path, "not json").unwrap();

        let store = FileSessionStore::at(path);
        assert!(store.sessions().is_err());
    }
}
