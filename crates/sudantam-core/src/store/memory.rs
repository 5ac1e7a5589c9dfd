//! In-memory snapshot store.

use std::sync::{Arc, Mutex};

use super::{PatientStore, StoreError, StoreResult};
use crate::models::Patient;

/// Snapshot held in memory. Clones share the same snapshot, which makes it
/// stand in for one spreadsheet reached from several devices.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Arc<Mutex<Vec<Patient>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot.
    pub fn with_patients(patients: Vec<Patient>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(patients)),
        }
    }
}

impl PatientStore for MemoryStore {
    fn load_all(&self) -> StoreResult<Vec<Patient>> {
        let rows = self
            .rows
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))?;
        Ok(rows.clone())
    }

    fn save_all(&self, patients: &[Patient]) -> StoreResult<()> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))?;
        *rows = patients.to_vec();
        Ok(())
    }
}
