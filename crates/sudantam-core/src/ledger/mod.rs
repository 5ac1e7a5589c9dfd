//! Patient ledger engine.
//!
//! Every operation is one transaction against the store: load the full
//! snapshot, apply the change to a [`PatientBook`], save the full snapshot.
//! Nothing is cached between calls, and a failed validation or save leaves
//! the stored rows untouched.

mod book;
mod render;
mod search;

pub use book::*;
pub use render::{money, render_entry, render_log};
pub use search::{matches_query, search, SortKey};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::audit;
use crate::config::LedgerConfig;
use crate::models::{FormatError, Patient, PatientId, PatientIntake, VisitDraft};
use crate::store::{PatientStore, StoreError};

/// Ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Patient not found: {0}")]
    NotFound(PatientId),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Storage(StoreError::Json(e))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Source of "today" for new rows and log entries.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the device.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Always the same date. Used by tests and back-dated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// The ledger engine over a patient store.
pub struct Ledger<S: PatientStore> {
    store: S,
    config: LedgerConfig,
    clock: Box<dyn Clock + Send + Sync>,
}

impl<S: PatientStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: S, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the date source.
    pub fn with_clock<C: Clock + Send + Sync + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Load the current snapshot.
    pub fn load(&self) -> LedgerResult<PatientBook> {
        let patients = self.store.load_all()?;
        tracing::debug!(rows = patients.len(), "Loaded patient snapshot");
        Ok(PatientBook::from_patients(patients))
    }

    /// Load, apply `f`, and save. Nothing is saved when `f` fails.
    fn transact<T, F>(&self, op: &'static str, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut PatientBook, NaiveDate, &LedgerConfig) -> LedgerResult<T>,
    {
        let mut book = self.load()?;
        let today = self.today();
        let out = f(&mut book, today, &self.config)?;

        if let Err(e) = self.store.save_all(book.patients()) {
            tracing::warn!(op, error = %e, "Failed to save patient snapshot");
            return Err(e.into());
        }
        Ok(out)
    }

    /// Register a new patient. Returns the stored row.
    pub fn register_patient(&self, intake: PatientIntake) -> LedgerResult<Patient> {
        let patient = self.transact("register", |book, today, config| {
            Ok(book.register(intake, today, config)?.clone())
        })?;
        tracing::info!(patient_id = patient.id, "Registered patient");
        Ok(patient)
    }

    /// Finalize a draft visit for a patient.
    pub fn record_visit(&self, patient_id: PatientId, draft: &VisitDraft) -> LedgerResult<VisitReceipt> {
        let receipt = self.transact("record_visit", |book, today, _| {
            book.record_visit(patient_id, draft, today)
        })?;
        tracing::info!(
            patient_id,
            visit_id = %receipt.visit.visit_id,
            billed = %receipt.visit.billed,
            paid = %receipt.visit.paid,
            pending = %receipt.pending_amount,
            "Recorded visit"
        );
        Ok(receipt)
    }

    /// Take a payment. Returns the new pending amount.
    pub fn record_payment(&self, patient_id: PatientId, amount: Decimal) -> LedgerResult<Decimal> {
        let pending = self.transact("record_payment", |book, today, config| {
            book.record_payment(patient_id, amount, today, config)
        })?;
        tracing::info!(patient_id, amount = %amount, pending = %pending, "Recorded payment");
        Ok(pending)
    }

    /// Settle the balance to zero. Returns the cleared amount, or `None`
    /// when the balance was already zero (in which case nothing is written).
    pub fn clear_balance(&self, patient_id: PatientId) -> LedgerResult<Option<Decimal>> {
        let mut book = self.load()?;
        let cleared = book.clear_balance(patient_id, self.today())?;
        let Some(amount) = cleared else {
            tracing::debug!(patient_id, "Balance already zero");
            return Ok(None);
        };

        if let Err(e) = self.store.save_all(book.patients()) {
            tracing::warn!(op = "clear_balance", error = %e, "Failed to save patient snapshot");
            return Err(e.into());
        }
        tracing::info!(patient_id, cleared = %amount, "Cleared balance");
        Ok(Some(amount))
    }

    /// Remove a patient and their history.
    pub fn delete_patient(&self, patient_id: PatientId) -> LedgerResult<Patient> {
        let removed = self.transact("delete", |book, _, _| book.delete(patient_id))?;
        tracing::info!(patient_id, "Deleted patient");
        Ok(removed)
    }

    /// Edit identity fields of a patient.
    pub fn update_patient(&self, patient_id: PatientId, details: PatientDetails) -> LedgerResult<Patient> {
        let patient = self.transact("update", |book, _, _| {
            Ok(book.update(patient_id, details)?.clone())
        })?;
        tracing::info!(patient_id, "Updated patient details");
        Ok(patient)
    }

    pub fn search_patients(&self, query: &str, sort: SortKey) -> LedgerResult<Vec<Patient>> {
        Ok(self.load()?.search(query, sort))
    }

    pub fn get_patient(&self, patient_id: PatientId) -> LedgerResult<Patient> {
        self.load()?
            .get(patient_id)
            .cloned()
            .ok_or(LedgerError::NotFound(patient_id))
    }

    /// Every patient in row order.
    pub fn list_patients(&self) -> LedgerResult<Vec<Patient>> {
        Ok(self.load()?.into_patients())
    }

    /// Patients with outstanding dues, largest first.
    pub fn defaulters(&self) -> LedgerResult<Vec<Patient>> {
        Ok(self.load()?.defaulters())
    }

    /// Whether the patient's log still matches its recorded hash chain.
    pub fn verify_history(&self, patient_id: PatientId) -> LedgerResult<bool> {
        let patient = self.get_patient(patient_id)?;
        let intact = audit::verify_log(&patient)?;
        if !intact {
            tracing::warn!(patient_id, "Visit log does not match its hash chain");
        }
        Ok(intact)
    }
}
