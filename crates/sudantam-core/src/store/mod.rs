//! Persistence adapters.
//!
//! The ledger needs exactly two things from storage: load every patient,
//! and replace every patient in one atomic write. Row-level updates are
//! never assumed, so two devices saving snapshots taken from the same
//! state race, and the last save wins.

mod csv;
mod memory;
mod schema;
mod sqlite;

pub use self::csv::*;
pub use memory::*;
pub use schema::*;
pub use sqlite::*;

pub(crate) use self::csv::escape_csv;

use thiserror::Error;

use crate::models::Patient;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Whole-snapshot patient storage.
pub trait PatientStore {
    /// Read every patient, in row order.
    fn load_all(&self) -> StoreResult<Vec<Patient>>;

    /// Replace the stored snapshot. Either every row is written or none is.
    fn save_all(&self, patients: &[Patient]) -> StoreResult<()>;
}

impl<T: PatientStore + ?Sized> PatientStore for Box<T> {
    fn load_all(&self) -> StoreResult<Vec<Patient>> {
        (**self).load_all()
    }

    fn save_all(&self, patients: &[Patient]) -> StoreResult<()> {
        (**self).save_all(patients)
    }
}

impl<T: PatientStore + ?Sized> PatientStore for &T {
    fn load_all(&self) -> StoreResult<Vec<Patient>> {
        (**self).load_all()
    }

    fn save_all(&self, patients: &[Patient]) -> StoreResult<()> {
        (**self).save_all(patients)
    }
}
