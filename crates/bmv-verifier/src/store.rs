//! Persistence seam for the verifier's single state record.
//!
//! The host environment owns durability and transactionality; the
//! verifier only ever loads one opaque record at the start of a call
//! and writes it back after full success.

use crate::error::BmvError;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("State store error: {0}")]
pub struct StoreError(pub String);

impl From<StoreError> for BmvError {
    fn from(err: StoreError) -> Self {
        BmvError::verification(err.to_string())
    }
}

/// A single-record key-value store holding the encoded verifier state.
pub trait StateStore {
    /// Load the stored record, or `None` when never initialized.
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the stored record.
    fn save(&mut self, record: &[u8]) -> Result<(), StoreError>;
}

/// In-memory store for tests and embedding hosts that persist
/// elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Option<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.record.clone())
    }

    fn save(&mut self, record: &[u8]) -> Result<(), StoreError> {
        self.record = Some(record.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&[1, 2, 3]).unwrap();
        assert_eq!(store.load().unwrap(), Some(vec![1, 2, 3]));
    }
}
