use deckforge_core::{SessionSnapshot, SnapshotStore, StoreError, SNAPSHOT_VERSION};
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Keeps the session snapshot in one pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copies an unreadable snapshot aside so the next save does not destroy it.
    fn backup_corrupt(&self, raw: &str) -> Option<PathBuf> {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".backup-{seconds}"));
        let backup = PathBuf::from(name);
        match fs::write(&backup, raw) {
            Ok(()) => Some(backup),
            Err(err) => {
                warn!("could not back up {}: {err}", self.path.display());
                None
            }
        }
    }
}

impl SnapshotStore for FileStore {
    fn get(&self) -> Result<Option<SessionSnapshot>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(StoreError::Io(format!("read {}: {err}", self.path.display())))
            }
        };
        let snapshot: SessionSnapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                if let Some(backup) = self.backup_corrupt(&raw) {
                    warn!("corrupt snapshot saved to {}", backup.display());
                }
                return Err(StoreError::Serialize(format!(
                    "parse {}: {err}",
                    self.path.display()
                )));
            }
        };
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(Some(snapshot))
    }

    fn set(&mut self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(snapshot)
            .map_err(|err| StoreError::Serialize(err.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| StoreError::Io(format!("create {}: {err}", parent.display())))?;
        }
        fs::write(&self.path, body)
            .map_err(|err| StoreError::Io(format!("write {}: {err}", self.path.display())))?;
        debug!("saved snapshot to {}", self.path.display());
        Ok(())
    }

    fn remove(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Io(format!(
                "remove {}: {err}",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_temp_file() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "deckforge_store_test_{}_{}.json",
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn save_load_roundtrip() {
        let file = unique_temp_file();
        let mut store = FileStore::new(&file);
        let snapshot = SessionSnapshot {
            selected_games: vec!["base".to_string()],
            current_deck_ids: vec!["a".to_string(), "b".to_string()],
            current_index: 1,
            ..SessionSnapshot::default()
        };
        store.set(&snapshot).expect("save");
        let loaded = store.get().expect("load").expect("present");
        assert_eq!(loaded, snapshot);
        let _ = fs::remove_file(file);
    }

    #[test]
    fn missing_file_is_empty() {
        let store = FileStore::new(unique_temp_file());
        assert!(store.get().expect("load").is_none());
    }

    #[test]
    fn remove_tolerates_missing_file() {
        let mut store = FileStore::new(unique_temp_file());
        store.remove().expect("remove");
        store.set(&SessionSnapshot::default()).expect("save");
        store.remove().expect("remove");
        assert!(!store.path().exists());
    }

    #[test]
    fn rejects_other_versions() {
        let file = unique_temp_file();
        fs::write(&file, r#"{"version": 9}"#).expect("write");
        let store = FileStore::new(&file);
        match store.get() {
            Err(StoreError::UnsupportedVersion { found, expected }) => {
                assert_eq!(found, 9);
                assert_eq!(expected, SNAPSHOT_VERSION);
            }
            other => panic!("unexpected {other:?}"),
        }
        let _ = fs::remove_file(file);
    }

    #[test]
    fn corrupt_file_is_backed_up() {
        let file = unique_temp_file();
        fs::write(&file, "{not json").expect("write");
        let store = FileStore::new(&file);
        assert!(matches!(store.get(), Err(StoreError::Serialize(_))));

        let dir = file.parent().expect("temp dir");
        let stem = file
            .file_name()
            .and_then(|name| name.to_str())
            .expect("name")
            .to_string();
        let backups: Vec<PathBuf> = fs::read_dir(dir)
            .expect("read dir")
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&format!("{stem}.backup-")))
            })
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).expect("backup"), "{not json");
        let _ = fs::remove_file(&backups[0]);
        let _ = fs::remove_file(file);
    }
}
