//! In-memory pipeline store.

use std::collections::HashMap;

use ndarray::Array2;
use parking_lot::RwLock;
use sonolux_core::{PipelineStore, StorageError, StoreKey};

/// Thread-safe in-memory implementation of [`PipelineStore`].
///
/// Backs tests and single-process runs. A deployment that persists results
/// would implement the same trait over an HDF5-class container; stages only
/// ever see the trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    blobs: RwLock<HashMap<StoreKey, Array2<f64>>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl PipelineStore for InMemoryStore {
    fn read(&self, key: &StoreKey) -> Result<Array2<f64>, StorageError> {
        self.blobs
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::KeyNotFound { key: key.path() })
    }

    fn write(&self, key: &StoreKey, data: Array2<f64>) -> Result<(), StorageError> {
        self.blobs.write().insert(key.clone(), data);
        Ok(())
    }

    fn contains(&self, key: &StoreKey) -> bool {
        self.blobs.read().contains_key(key)
    }

    fn keys(&self) -> Vec<StoreKey> {
        self.blobs.read().keys().cloned().collect()
    }
}
