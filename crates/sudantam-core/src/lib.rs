//! Sudantam Core Library
//!
//! Patient ledger and billing engine for a single dental clinic.
//!
//! # Architecture
//!
//! ```text
//! Intake ─────────┐
//!                 │
//! Visit draft ────┼──▶  Ledger  ──load_all──▶ ┌───────────────────────┐
//! (tooth chart,   │   (PatientBook           │      PatientStore      │
//!  Tx, Rx, paid)  │    transactions)  ◀──────│  Memory│SQLite│CSV    │
//!                 │        │      save_all    └───────────────────────┘
//! Payment/clear ──┘        │
//!                          ▼
//!               visit log (+ hash chain head)
//!                          │
//!              ┌───────────┴───────────┐
//!              ▼                       ▼
//!           Invoice                Dues report
//! ```
//!
//! # Core Principle
//!
//! **Every operation is a whole-snapshot transaction.** The ledger loads all
//! rows, applies one change, and saves all rows. A failed validation or save
//! leaves the stored snapshot untouched; concurrent writers race and the last
//! save wins.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Patient, Visit, LogEntry, VisitDraft, Tooth)
//! - [`catalog`]: Procedure and medicine reference tables with fuzzy lookup
//! - [`ledger`]: The ledger engine, search, and visit log rendering
//! - [`store`]: Persistence adapters (in-memory, SQLite, CSV sheet)
//! - [`export`]: Invoice and dues documents
//! - [`audit`]: Hash chain over each patient's visit log
//! - [`config`]: Ledger tunables

pub mod audit;
pub mod catalog;
pub mod config;
pub mod export;
pub mod ledger;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use catalog::Catalog;
pub use config::{IdPolicy, LedgerConfig};
pub use export::{DuesReport, Invoice};
pub use ledger::{
    Clock, FixedClock, Ledger, LedgerError, LedgerResult, PatientBook, PatientDetails, SortKey,
    SystemClock, VisitReceipt,
};
pub use models::{
    to_fdi, FormatError, Gender, LogEntry, Patient, PatientId, PatientIntake, Tooth, Visit,
    VisitDraft,
};
pub use store::{CsvStore, MemoryStore, PatientStore, SqliteStore, StoreError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rust_decimal::Decimal;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SudantamError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<LedgerError> for SudantamError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Validation(msg) => SudantamError::Validation(msg),
            LedgerError::NotFound(id) => SudantamError::NotFound(format!("patient {}", id)),
            LedgerError::Format(e) => SudantamError::Format(e.to_string()),
            LedgerError::Storage(e) => SudantamError::Storage(e.to_string()),
        }
    }
}

impl From<StoreError> for SudantamError {
    fn from(e: StoreError) -> Self {
        SudantamError::Storage(e.to_string())
    }
}

impl From<FormatError> for SudantamError {
    fn from(e: FormatError) -> Self {
        SudantamError::Format(e.to_string())
    }
}

impl From<serde_json::Error> for SudantamError {
    fn from(e: serde_json::Error) -> Self {
        SudantamError::Storage(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for SudantamError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        SudantamError::Storage(format!("Lock poisoned: {}", e))
    }
}

fn parse_money(field: &str, value: &str) -> Result<Decimal, SudantamError> {
    Decimal::from_str(value.trim())
        .map_err(|_| SudantamError::Validation(format!("{} is not an amount: {}", field, value)))
}

fn parse_day(field: &str, value: &str) -> Result<NaiveDate, SudantamError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| SudantamError::Validation(format!("{} is not a date: {}", field, value)))
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

type SharedLedger = Ledger<Box<dyn PatientStore + Send>>;

fn core_over(store: Box<dyn PatientStore + Send>) -> Arc<SudantamCore> {
    Arc::new(SudantamCore {
        ledger: Mutex::new(Ledger::new(store)),
        catalog: Catalog::default(),
    })
}

/// Open or create a SQLite ledger at the given path.
#[uniffi::export]
pub fn open_sqlite(path: String) -> Result<Arc<SudantamCore>, SudantamError> {
    let store = SqliteStore::open(&path)?;
    Ok(core_over(Box::new(store)))
}

/// Use a CSV patient sheet at the given path (created on first save).
#[uniffi::export]
pub fn open_csv(path: String) -> Arc<SudantamCore> {
    core_over(Box::new(CsvStore::new(path)))
}

/// Create an in-memory ledger (for testing).
#[uniffi::export]
pub fn open_in_memory() -> Arc<SudantamCore> {
    core_over(Box::new(MemoryStore::new()))
}

/// Convert a tooth designator ("16", "UR6") to FDI.
#[uniffi::export]
pub fn tooth_to_fdi(designator: String) -> Result<String, SudantamError> {
    Ok(to_fdi(&designator)?)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe ledger wrapper for FFI.
#[derive(uniffi::Object)]
pub struct SudantamCore {
    ledger: Mutex<SharedLedger>,
    catalog: Catalog,
}

#[uniffi::export]
impl SudantamCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a new patient.
    pub fn register_patient(&self, intake: FfiPatientIntake) -> Result<FfiPatient, SudantamError> {
        let ledger = self.ledger.lock()?;
        let patient = ledger.register_patient(intake.into())?;
        Ok(patient.into())
    }

    /// Edit a patient's identity fields.
    pub fn update_patient(
        &self,
        patient_id: u32,
        intake: FfiPatientIntake,
    ) -> Result<FfiPatient, SudantamError> {
        let ledger = self.ledger.lock()?;
        let details = PatientDetails {
            name: Some(intake.name),
            age: Some(intake.age),
            gender: Some(intake.gender.into()),
            contact: Some(intake.contact),
            medical_history: Some(intake.medical_history),
        };
        Ok(ledger.update_patient(patient_id, details)?.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, patient_id: u32) -> Result<Option<FfiPatient>, SudantamError> {
        let ledger = self.ledger.lock()?;
        match ledger.get_patient(patient_id) {
            Ok(patient) => Ok(Some(patient.into())),
            Err(LedgerError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Search patients by name or contact number.
    pub fn search_patients(
        &self,
        query: String,
        sort: FfiSortKey,
    ) -> Result<Vec<FfiPatient>, SudantamError> {
        let ledger = self.ledger.lock()?;
        let patients = ledger.search_patients(&query, sort.into())?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Patients with outstanding dues.
    pub fn defaulters(&self) -> Result<Vec<FfiPatient>, SudantamError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.defaulters()?.into_iter().map(|p| p.into()).collect())
    }

    /// Remove a patient and their history.
    pub fn delete_patient(&self, patient_id: u32) -> Result<(), SudantamError> {
        let ledger = self.ledger.lock()?;
        ledger.delete_patient(patient_id)?;
        Ok(())
    }

    // =========================================================================
    // Billing Operations
    // =========================================================================

    /// Finalize a visit draft.
    pub fn record_visit(
        &self,
        patient_id: u32,
        draft: FfiVisitDraft,
    ) -> Result<FfiVisitReceipt, SudantamError> {
        let draft = VisitDraft::try_from(draft)?;
        let ledger = self.ledger.lock()?;
        let receipt = ledger.record_visit(patient_id, &draft)?;
        Ok(receipt.into())
    }

    /// Take a payment. Returns the new pending amount.
    pub fn record_payment(&self, patient_id: u32, amount: String) -> Result<String, SudantamError> {
        let amount = parse_money("amount", &amount)?;
        let ledger = self.ledger.lock()?;
        let pending = ledger.record_payment(patient_id, amount)?;
        Ok(pending.to_string())
    }

    /// Settle the balance to zero. Returns the cleared amount, if any.
    pub fn clear_balance(&self, patient_id: u32) -> Result<Option<String>, SudantamError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.clear_balance(patient_id)?.map(|a| a.to_string()))
    }

    /// Whether the visit log still matches its hash chain.
    pub fn verify_history(&self, patient_id: u32) -> Result<bool, SudantamError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.verify_history(patient_id)?)
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Procedures matching a typed name, best first.
    pub fn suggest_procedures(&self, query: String, limit: u32) -> Vec<FfiProcedure> {
        self.catalog
            .suggest_procedures(&query, limit as usize)
            .into_iter()
            .map(|s| s.item.clone().into())
            .collect()
    }

    /// Medicines matching a typed name, best first.
    pub fn suggest_medicines(&self, query: String, limit: u32) -> Vec<FfiMedicine> {
        self.catalog
            .suggest_medicines(&query, limit as usize)
            .into_iter()
            .map(|s| s.item.clone().into())
            .collect()
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Plain-text invoice for the patient's latest visit.
    pub fn invoice_text(&self, patient_id: u32) -> Result<Option<String>, SudantamError> {
        let ledger = self.ledger.lock()?;
        let patient = ledger.get_patient(patient_id)?;
        Ok(Invoice::for_latest_visit(&patient, &ledger.config().currency_symbol)
            .map(|invoice| invoice.to_text()))
    }

    /// Invoice for the patient's latest visit as JSON.
    pub fn invoice_json(&self, patient_id: u32) -> Result<Option<String>, SudantamError> {
        let ledger = self.ledger.lock()?;
        let patient = ledger.get_patient(patient_id)?;
        Invoice::for_latest_visit(&patient, &ledger.config().currency_symbol)
            .map(|invoice| invoice.to_json())
            .transpose()
            .map_err(Into::into)
    }

    /// Dues report as CSV.
    pub fn export_dues_csv(&self) -> Result<String, SudantamError> {
        let ledger = self.ledger.lock()?;
        let patients = ledger.list_patients()?;
        let report = DuesReport::new(&patients, ledger.today(), &ledger.config().currency_symbol);
        Ok(report.to_csv())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiGender {
    Male,
    Female,
    Other,
    Unspecified,
}

impl From<Gender> for FfiGender {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Male => FfiGender::Male,
            Gender::Female => FfiGender::Female,
            Gender::Other => FfiGender::Other,
            Gender::Unspecified => FfiGender::Unspecified,
        }
    }
}

impl From<FfiGender> for Gender {
    fn from(gender: FfiGender) -> Self {
        match gender {
            FfiGender::Male => Gender::Male,
            FfiGender::Female => Gender::Female,
            FfiGender::Other => Gender::Other,
            FfiGender::Unspecified => Gender::Unspecified,
        }
    }
}

/// FFI-safe search order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiSortKey {
    LastVisitDesc,
    LastVisitAsc,
    NameAsc,
    PendingDesc,
}

impl From<FfiSortKey> for SortKey {
    fn from(key: FfiSortKey) -> Self {
        match key {
            FfiSortKey::LastVisitDesc => SortKey::LastVisitDesc,
            FfiSortKey::LastVisitAsc => SortKey::LastVisitAsc,
            FfiSortKey::NameAsc => SortKey::NameAsc,
            FfiSortKey::PendingDesc => SortKey::PendingDesc,
        }
    }
}

/// FFI-safe intake form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientIntake {
    pub name: String,
    pub age: u32,
    pub gender: FfiGender,
    pub contact: String,
    pub medical_history: Vec<String>,
}

impl From<FfiPatientIntake> for PatientIntake {
    fn from(intake: FfiPatientIntake) -> Self {
        PatientIntake {
            name: intake.name,
            age: intake.age,
            gender: intake.gender.into(),
            contact: intake.contact,
            medical_history: intake.medical_history,
        }
    }
}

/// FFI-safe patient. Amounts are decimal strings, dates ISO `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: u32,
    pub name: String,
    pub age: u32,
    pub gender: FfiGender,
    pub contact: String,
    pub medical_history: Vec<String>,
    pub last_visit: String,
    pub pending_amount: String,
    pub visit_count: u32,
    pub affected_teeth: Vec<String>,
    pub next_visit: Option<String>,
    /// Rendered visit log
    pub visit_log: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            visit_count: patient.visit_count() as u32,
            visit_log: ledger::render_log(&patient.visit_log),
            name: patient.name,
            age: patient.age,
            gender: patient.gender.into(),
            contact: patient.contact,
            medical_history: patient.medical_history.into_iter().collect(),
            last_visit: patient.last_visit.to_string(),
            pending_amount: patient.pending_amount.to_string(),
            affected_teeth: patient.affected_teeth_latest.iter().map(|t| t.fdi()).collect(),
            next_visit: patient.next_visit.map(|d| d.to_string()),
        }
    }
}

/// FFI-safe treatment line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatment {
    pub procedure: String,
    pub cost: String,
}

/// FFI-safe prescription line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescription {
    pub medicine: String,
    pub dosage: String,
    pub duration: String,
}

/// FFI-safe visit draft.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisitDraft {
    /// Keep the same ID when retrying a failed save
    pub draft_id: String,
    pub affected_teeth: Vec<String>,
    pub diagnosis: Vec<String>,
    pub treatments: Vec<FfiTreatment>,
    pub prescription: Vec<FfiPrescription>,
    pub notes: String,
    pub next_visit: Option<String>,
    pub paid_now: String,
}

impl TryFrom<FfiVisitDraft> for VisitDraft {
    type Error = SudantamError;

    fn try_from(ffi: FfiVisitDraft) -> Result<Self, Self::Error> {
        let mut draft = VisitDraft::new();
        if !ffi.draft_id.trim().is_empty() {
            draft.draft_id = ffi.draft_id;
        }
        for tooth in &ffi.affected_teeth {
            draft.add_tooth(tooth)?;
        }
        for tag in ffi.diagnosis {
            draft.add_diagnosis(tag);
        }
        for line in ffi.treatments {
            let cost = parse_money("cost", &line.cost)?;
            draft.add_treatment(line.procedure, cost);
        }
        for line in ffi.prescription {
            draft.add_prescription(line.medicine, line.dosage, line.duration);
        }
        draft.notes = ffi.notes;
        draft.next_visit = ffi
            .next_visit
            .as_deref()
            .map(|d| parse_day("next_visit", d))
            .transpose()?;
        draft.paid_now = if ffi.paid_now.trim().is_empty() {
            Decimal::ZERO
        } else {
            parse_money("paid_now", &ffi.paid_now)?
        };
        Ok(draft)
    }
}

/// FFI-safe visit receipt.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisitReceipt {
    pub patient_id: u32,
    pub visit_id: String,
    pub billed: String,
    pub paid: String,
    pub pending_amount: String,
}

impl From<VisitReceipt> for FfiVisitReceipt {
    fn from(receipt: VisitReceipt) -> Self {
        Self {
            patient_id: receipt.patient_id,
            visit_id: receipt.visit.visit_id,
            billed: receipt.visit.billed.to_string(),
            paid: receipt.visit.paid.to_string(),
            pending_amount: receipt.pending_amount.to_string(),
        }
    }
}

/// FFI-safe catalog procedure.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProcedure {
    pub name: String,
    pub default_price: String,
}

impl From<models::ProcedureItem> for FfiProcedure {
    fn from(item: models::ProcedureItem) -> Self {
        Self {
            name: item.name,
            default_price: item.default_price.to_string(),
        }
    }
}

/// FFI-safe catalog medicine.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicine {
    pub name: String,
    pub brand: Option<String>,
    pub class: String,
    pub default_dosage: String,
    pub default_duration: String,
}

impl From<models::MedicineItem> for FfiMedicine {
    fn from(item: models::MedicineItem) -> Self {
        Self {
            name: item.name,
            brand: item.brand,
            class: item.class,
            default_dosage: item.default_dosage,
            default_duration: item.default_duration,
        }
    }
}
