use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::session::{Session, SessionId};

use super::error::PersistenceError;

/// Entry of [`JsonSessionStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: SessionId,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// One pretty-printed JSON file per session, named `<id>.json`.
///
/// Saves overwrite the whole file; a crash mid-write can leave a truncated
/// file, which later shows up as a corrupt entry and is skipped by `list`.
#[derive(Debug, Clone)]
pub struct JsonSessionStore {
    dir: PathBuf,
}

impl JsonSessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `session`, recomputing its title first.
    pub fn save(&self, session: &mut Session) -> Result<(), PersistenceError> {
        session.refresh_title();
        fs::create_dir_all(&self.dir)?;
        let payload = serde_json::to_vec_pretty(session)?;
        fs::write(self.path_for(session.id), payload)?;
        session.mark_saved();
        log::debug!("saved session {} ({} messages)", session.id, session.messages.len());
        Ok(())
    }

    /// Loads a session; missing and unreadable files both map to `NotFound`.
    pub fn load(&self, id: SessionId) -> Result<Session, PersistenceError> {
        self.load_path(&self.path_for(id)).map_err(|err| {
            log::warn!("cannot load session {id}: {err}");
            PersistenceError::NotFound(id)
        })
    }

    /// Lists stored sessions, newest first. Corrupt files are skipped.
    pub fn list(&self) -> Result<Vec<SessionSummary>, PersistenceError> {
        let mut items = Vec::new();
        if !self.dir.exists() {
            return Ok(items);
        }
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match self.load_path(&path) {
                Ok(session) => items.push(SessionSummary {
                    id: session.id,
                    title: session.title,
                    updated_at: session.updated_at,
                }),
                Err(err) => log::warn!("skipping unreadable session file {}: {err}", path.display()),
            }
        }
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id)));
        Ok(items)
    }

    /// Removes a session. Deleting an unknown id is not an error.
    pub fn delete(&self, id: SessionId) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn load_path(&self, path: &Path) -> Result<Session, PersistenceError> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    fn path_for(&self, id: SessionId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::session::{BlockKind, Message, RenderedBlock};

    fn store() -> (tempfile::TempDir, JsonSessionStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = JsonSessionStore::new(dir.path().join("sessions"));
        (dir, store)
    }

    fn session_with(text: &str) -> Session {
        let mut session = Session::new();
        session.push_message(Message::user(text));
        session.push_message(Message::assistant("answer"));
        session
    }

    #[test]
    fn save_and_load_round_trip() {
        let (_dir, store) = store();
        let mut session = session_with("What is the capital of Türkiye, exactly?");
        session.push_block(RenderedBlock {
            turn: 1,
            kind: BlockKind::Assistant,
            html: "<p>answer</p>".to_string(),
        });
        session.title = "stale".to_string();
        store.save(&mut session).expect("save session");
        assert!(!session.dirty);
        assert_eq!(session.title, "What is the capital of Türkiye...");

        let loaded = store.load(session.id).expect("load session");
        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.messages, session.messages);
        assert_eq!(loaded.rendered, session.rendered);
        assert_eq!(loaded.title, session.title);
        assert!(!loaded.dirty);
    }

    #[test]
    fn record_uses_timestamp_field() {
        let (_dir, store) = store();
        let mut session = session_with("hi");
        store.save(&mut session).unwrap();
        let raw = fs::read_to_string(store.dir().join(format!("{}.json", session.id))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        for key in ["id", "title", "messages", "rendered", "timestamp"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert!(value.get("dirty").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn list_is_newest_first_and_skips_corrupt_files() {
        let (_dir, store) = store();
        let mut older = session_with("older");
        older.updated_at = Utc::now() - Duration::minutes(5);
        let mut newer = session_with("newer");
        store.save(&mut older).unwrap();
        store.save(&mut newer).unwrap();
        fs::write(store.dir().join("broken.json"), b"{ not json").unwrap();
        fs::write(store.dir().join("notes.txt"), b"ignored").unwrap();

        let list = store.list().unwrap();
        let titles: Vec<_> = list.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["newer", "older"]);
    }

    #[test]
    fn list_of_missing_dir_is_empty() {
        let (_dir, store) = store();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn delete_removes_and_is_idempotent() {
        let (_dir, store) = store();
        let mut session = session_with("bye");
        store.save(&mut session).unwrap();

        store.delete(session.id).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(
            store.load(session.id),
            Err(PersistenceError::NotFound(id)) if id == session.id
        ));
        store.delete(session.id).unwrap();
    }

    #[test]
    fn corrupt_file_loads_as_not_found() {
        let (_dir, store) = store();
        let id = SessionId::new();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.dir().join(format!("{id}.json")), b"[]").unwrap();
        assert!(matches!(store.load(id), Err(PersistenceError::NotFound(_))));
    }
}
