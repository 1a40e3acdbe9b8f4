//! Durable per-task progress slots.
//!
//! [`KeyValueStore`] is the persistence capability the widget depends on;
//! [`ProgressStore`] layers the task slot format on top of it and turns every
//! failure into a log line plus "no prior state".

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PracticError, Result};
use crate::history::AttemptRecord;
use crate::session::TaskSession;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn delete(&mut self, key: &str) -> Result<()>;
}

/// In-memory store. Clones share the same entries, the way every widget on a
/// page shares one browser profile.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
///
/// Writes go through a temporary file and a rename so a crash mid-write never
/// leaves a truncated slot behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Longest file stem written verbatim. Longer encoded keys keep a prefix and
/// gain a digest suffix, staying under the common 255-byte name limit.
const MAX_STEM: usize = 120;
const KEPT_PREFIX: usize = 80;

/// Keys become percent-encoded file stems of bounded length.
fn encode_key(key: &str) -> String {
    let encoded = urlencoding::encode(key);
    if encoded.len() <= MAX_STEM {
        return encoded.into_owned();
    }

    // never split a `%XX` triple
    let bytes = encoded.as_bytes();
    let mut cut = KEPT_PREFIX;
    if bytes[cut - 1] == b'%' {
        cut -= 1;
    } else if bytes[cut - 2] == b'%' {
        cut -= 2;
    }
    format!("{}-{:x}", &encoded[..cut], md5::compute(key.as_bytes()))
}

/// Persisted subset of a [`TaskSession`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedProgress {
    pub selected_variant: Option<usize>,
    pub is_completed: bool,
    pub completed_time: Option<u64>,
    pub history: Vec<AttemptRecord>,
    pub current_code: String,
}

impl From<&TaskSession> for PersistedProgress {
    fn from(session: &TaskSession) -> Self {
        Self {
            selected_variant: session.selected_variant(),
            is_completed: session.is_completed(),
            completed_time: session.completed_elapsed_seconds(),
            history: session.history().to_vec(),
            current_code: session.solution().to_string(),
        }
    }
}

pub fn slot_key(task_id: &str) -> String {
    format!("task_{task_id}")
}

/// Best-effort persistence of task progress.
#[derive(Debug, Clone)]
pub struct ProgressStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> ProgressStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }

    /// Read the slot for `task_id`. Missing or unreadable slots yield `None`.
    pub fn load(&self, task_id: &str) -> Option<PersistedProgress> {
        let key = slot_key(task_id);
        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "no saved progress");
                return None;
            }
            Err(err) => {
                warn!(key = %key, error = %err, "failed to read saved progress");
                return None;
            }
        };

        match serde_json::from_str::<PersistedProgress>(&raw) {
            Ok(progress) => {
                debug!(key = %key, attempts = progress.history.len(), "restored progress");
                Some(progress)
            }
            Err(err) => {
                warn!(key = %key, error = %err, "ignoring malformed saved progress");
                None
            }
        }
    }

    /// Write the persisted subset of `session`. Returns whether the write landed.
    pub fn save(&mut self, session: &TaskSession) -> bool {
        let key = slot_key(session.task_id());
        let progress = PersistedProgress::from(session);
        let result = serde_json::to_string(&progress)
            .map_err(PracticError::from)
            .and_then(|raw| self.backend.set(&key, &raw));

        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %key, error = %err, "failed to save progress; keeping in-memory state");
                false
            }
        }
    }

    /// Remove the slot entirely. This is the only operation that deletes progress.
    pub fn clear(&mut self, task_id: &str) -> bool {
        let key = slot_key(task_id);
        match self.backend.delete(&key) {
            Ok(()) => {
                debug!(key = %key, "cleared saved progress");
                true
            }
            Err(err) => {
                warn!(key = %key, error = %err, "failed to clear saved progress");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::record_attempt;
    use chrono::Utc;
    use tempfile::tempdir;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(std::io::Error::new(ErrorKind::PermissionDenied, "denied").into())
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(PracticError::Io(std::io::Error::new(
                ErrorKind::Other,
                "quota exceeded",
            )))
        }

        fn delete(&mut self, _key: &str) -> Result<()> {
            Err(std::io::Error::new(ErrorKind::PermissionDenied, "denied").into())
        }
    }

    fn sample_session() -> TaskSession {
        let mut session = TaskSession::new("Hello_World");
        session.selected_variant = Some(0);
        session.elapsed_seconds = 12;
        session.solution = "package main".to_string();
        record_attempt(&mut session, Utc::now());
        session.selected_variant = Some(1);
        session.solution = "x := 1".to_string();
        session.completed = true;
        session.completed_elapsed_seconds = Some(30);
        session
    }

    #[test]
    fn slot_keys_are_prefixed() {
        assert_eq!(slot_key("Loops_in_Go"), "task_Loops_in_Go");
    }

    #[test]
    fn round_trip_reproduces_persisted_fields() {
        let mut store = ProgressStore::new(MemoryStore::new());
        let session = sample_session();

        assert!(store.save(&session));
        let loaded = store.load("Hello_World").unwrap();

        assert_eq!(loaded.selected_variant, Some(1));
        assert!(loaded.is_completed);
        assert_eq!(loaded.completed_time, Some(30));
        assert_eq!(loaded.history, session.history().to_vec());
        assert_eq!(loaded.current_code, "x := 1");
    }

    #[test]
    fn persisted_json_uses_slot_field_names() {
        let mut store = ProgressStore::new(MemoryStore::new());
        store.save(&sample_session());

        let raw = store.backend().get("task_Hello_World").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(json["selectedVariant"], 1);
        assert_eq!(json["isCompleted"], true);
        assert_eq!(json["completedTime"], 30);
        assert_eq!(json["currentCode"], "x := 1");
        assert_eq!(json["history"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn missing_slot_loads_as_none() {
        let store = ProgressStore::new(MemoryStore::new());
        assert!(store.load("nothing").is_none());
    }

    #[test]
    fn malformed_slot_loads_as_none() {
        let mut backend = MemoryStore::new();
        backend.set("task_bad", "{not json").unwrap();
        let store = ProgressStore::new(backend);

        assert!(store.load("bad").is_none());
    }

    #[test]
    fn partial_slot_fills_defaults() {
        let mut backend = MemoryStore::new();
        backend
            .set("task_partial", r#"{"selectedVariant":2}"#)
            .unwrap();
        let store = ProgressStore::new(backend);

        let loaded = store.load("partial").unwrap();
        assert_eq!(loaded.selected_variant, Some(2));
        assert!(!loaded.is_completed);
        assert!(loaded.history.is_empty());
        assert_eq!(loaded.current_code, "");
    }

    #[test]
    fn backend_failures_are_swallowed() {
        let mut store = ProgressStore::new(BrokenStore);

        assert!(store.load("any").is_none());
        assert!(!store.save(&sample_session()));
        assert!(!store.clear("any"));
    }

    #[test]
    fn clear_removes_the_slot() {
        let backend = MemoryStore::new();
        let mut store = ProgressStore::new(backend.clone());
        store.save(&sample_session());
        assert!(backend.contains_key("task_Hello_World"));

        assert!(store.clear("Hello_World"));

        assert!(!backend.contains_key("task_Hello_World"));
        assert!(store.load("Hello_World").is_none());
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let mut a = MemoryStore::new();
        let b = a.clone();
        a.set("k", "v").unwrap();

        assert_eq!(b.get("k").unwrap(), Some("v".to_string()));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("progress"));

        assert_eq!(store.get("task_a").unwrap(), None);
        store.set("task_a", "{\"x\":1}").unwrap();
        assert_eq!(store.get("task_a").unwrap(), Some("{\"x\":1}".to_string()));

        store.delete("task_a").unwrap();
        assert_eq!(store.get("task_a").unwrap(), None);
        // deleting twice is fine
        store.delete("task_a").unwrap();
    }

    #[test]
    fn file_store_encodes_unsafe_keys() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let path = store.path_for("task_a/b c");
        assert_eq!(path.file_name().unwrap(), "task_a%2Fb%20c.json");

        let cyrillic = store.path_for("task_Циклы");
        assert!(cyrillic.starts_with(dir.path()));
        assert_eq!(
            cyrillic.file_name().unwrap(),
            "task_%D0%A6%D0%B8%D0%BA%D0%BB%D1%8B.json"
        );
    }

    #[test]
    fn long_keys_get_bounded_distinct_names() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let title = "Написать_функцию_для_вычисления_факториала_числа_рекурсивно";

        let a = store.path_for(&format!("task_{title}"));
        let b = store.path_for(&format!("task_{title}_2"));
        let a_name = a.file_name().unwrap().to_str().unwrap();
        let b_name = b.file_name().unwrap().to_str().unwrap();

        assert!(a_name.len() <= MAX_STEM + ".json".len());
        assert!(b_name.len() <= MAX_STEM + ".json".len());
        assert_ne!(a_name, b_name);
        assert!(a_name.starts_with("task_%D0%9D"));
        // same key, same name
        assert_eq!(a, store.path_for(&format!("task_{title}")));
    }

    #[test]
    fn truncated_prefix_keeps_escapes_whole() {
        for pad in 0..3 {
            let key = format!("{}{}", "a".repeat(pad), "ж".repeat(60));
            let stem = encode_key(&key);
            let (prefix, digest) = stem.rsplit_once('-').unwrap();

            assert_eq!(digest.len(), 32);
            assert!(prefix.len() <= KEPT_PREFIX);
            assert!(urlencoding::decode(prefix).is_ok(), "{prefix}");
            assert!(prefix.ends_with("%B6"), "{prefix}");
        }
    }

    #[test]
    fn long_key_round_trips_through_files() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        let key = format!("task_{}", "Рекурсия".repeat(20));

        store.set(&key, "{}").unwrap();
        assert_eq!(store.get(&key).unwrap(), Some("{}".to_string()));
        store.delete(&key).unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[test]
    fn progress_store_over_files_survives_reopen() {
        let dir = tempdir().unwrap();
        let mut first = ProgressStore::new(FileStore::new(dir.path()));
        first.save(&sample_session());

        let reopened = ProgressStore::new(FileStore::new(dir.path()));
        let loaded = reopened.load("Hello_World").unwrap();

        assert_eq!(loaded.completed_time, Some(30));
    }
}
