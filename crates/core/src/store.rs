use crate::SessionSnapshot;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot io failed: {0}")]
    Io(String),
    #[error("snapshot could not be encoded or decoded: {0}")]
    Serialize(String),
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Opaque get/set/remove of the single session snapshot.
pub trait SnapshotStore {
    fn get(&self) -> Result<Option<SessionSnapshot>, StoreError>;
    fn set(&mut self, snapshot: &SessionSnapshot) -> Result<(), StoreError>;
    fn remove(&mut self) -> Result<(), StoreError>;
}

/// In-memory store for tests and hosts that do not persist.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    snapshot: Option<SessionSnapshot>,
    failing: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            ..Self::default()
        }
    }

    /// A store whose writes always fail.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self) -> Result<Option<SessionSnapshot>, StoreError> {
        Ok(self.snapshot.clone())
    }

    fn set(&mut self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Io("memory store is read-only".to_string()));
        }
        self.writes += 1;
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn remove(&mut self) -> Result<(), StoreError> {
        self.snapshot = None;
        Ok(())
    }
}
