//! In-memory patient snapshot and the transactions applied to it.
//!
//! Every transaction validates all of its input before touching the
//! snapshot, so a failed call leaves the book exactly as it was.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::search::{search, SortKey};
use super::{LedgerError, LedgerResult};
use crate::audit;
use crate::config::{IdPolicy, LedgerConfig};
use crate::models::{
    normalize_contact, normalize_tags, Gender, LogEntry, Patient, PatientId, PatientIntake,
    PaymentNote, Settlement, Tooth, Visit, VisitDraft,
};

/// Outcome of recording a visit.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitReceipt {
    pub patient_id: PatientId,
    pub visit: Visit,
    /// Balance after the visit
    pub pending_amount: Decimal,
}

impl VisitReceipt {
    /// Balance change caused by this visit.
    pub fn delta(&self) -> Decimal {
        self.visit.balance_delta()
    }
}

/// Editable identity fields of a patient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientDetails {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub contact: Option<String>,
    pub medical_history: Option<Vec<String>>,
}

/// A loaded snapshot of every patient, in row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientBook {
    patients: Vec<Patient>,
}

impl PatientBook {
    pub fn from_patients(patients: Vec<Patient>) -> Self {
        Self { patients }
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn into_patients(self) -> Vec<Patient> {
        self.patients
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn get(&self, id: PatientId) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: PatientId) -> LedgerResult<&mut Patient> {
        self.patients
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(LedgerError::NotFound(id))
    }

    /// Number the next patient according to the configured policy.
    pub fn next_id(&self, config: &LedgerConfig) -> PatientId {
        let after_max = self
            .patients
            .iter()
            .map(|p| p.id.saturating_add(1))
            .max()
            .unwrap_or(config.id_base)
            .max(config.id_base);

        match config.id_policy {
            IdPolicy::NextAfterMax => after_max,
            IdPolicy::RowCount => {
                let by_count = config.id_base.saturating_add(self.patients.len() as u32);
                if self.get(by_count).is_some() {
                    tracing::warn!(
                        row_count_id = by_count,
                        assigned = after_max,
                        "Row-count patient id already in use, assigning next free id"
                    );
                    after_max
                } else {
                    by_count
                }
            }
        }
    }

    /// Add a new patient from an intake form.
    pub fn register(
        &mut self,
        intake: PatientIntake,
        today: NaiveDate,
        config: &LedgerConfig,
    ) -> LedgerResult<&Patient> {
        validate_identity(&intake.name, intake.age)?;

        let id = self.next_id(config);
        self.patients.push(Patient::new(id, intake, today));
        Ok(&self.patients[self.patients.len() - 1])
    }

    /// Change identity fields. Balance and history are never touched here.
    pub fn update(&mut self, id: PatientId, details: PatientDetails) -> LedgerResult<&Patient> {
        let patient = self.get_mut(id)?;
        let name = details.name.as_deref().unwrap_or(&patient.name);
        let age = details.age.unwrap_or(patient.age);
        validate_identity(name, age)?;

        if let Some(name) = details.name {
            patient.name = name.trim().to_string();
        }
        patient.age = age;
        if let Some(gender) = details.gender {
            patient.gender = gender;
        }
        if let Some(contact) = details.contact {
            patient.contact = normalize_contact(&contact);
        }
        if let Some(history) = details.medical_history {
            patient.medical_history = normalize_tags(history);
        }
        Ok(patient)
    }

    /// Finalize a draft into a visit on the patient's log.
    pub fn record_visit(
        &mut self,
        id: PatientId,
        draft: &VisitDraft,
        today: NaiveDate,
    ) -> LedgerResult<VisitReceipt> {
        let patient = self.get_mut(id)?;
        let billed = validate_draft(draft)?;

        let already_recorded = patient
            .visit_log
            .iter()
            .filter_map(LogEntry::as_visit)
            .any(|v| v.visit_id == draft.draft_id);
        if already_recorded {
            return Err(LedgerError::Validation(format!(
                "visit {} is already recorded for patient {}",
                draft.draft_id, id
            )));
        }

        let visit = Visit {
            visit_id: draft.draft_id.clone(),
            date: today,
            affected_teeth: draft.affected_teeth.clone(),
            diagnosis: normalize_tags(&draft.diagnosis),
            treatments: draft.treatments.clone(),
            prescription: draft.prescription.clone(),
            billed,
            paid: draft.paid_now,
            notes: draft.notes.trim().to_string(),
            next_visit: draft.next_visit,
        };

        let pending = billed
            .checked_sub(visit.paid)
            .and_then(|delta| patient.pending_amount.checked_add(delta))
            .ok_or_else(|| overflow(patient.pending_amount))?;

        let entry = LogEntry::Visit(visit.clone());
        let head = audit::entry_hash(patient.log_head.as_deref(), &entry)?;

        patient.pending_amount = pending;
        patient.last_visit = today;
        patient.affected_teeth_latest = visit.affected_teeth.clone();
        if visit.next_visit.is_some() {
            patient.next_visit = visit.next_visit;
        }
        patient.visit_log.push(entry);
        patient.log_head = Some(head);

        Ok(VisitReceipt {
            patient_id: id,
            visit,
            pending_amount: patient.pending_amount,
        })
    }

    /// Take a payment against outstanding dues. Returns the new balance.
    pub fn record_payment(
        &mut self,
        id: PatientId,
        amount: Decimal,
        today: NaiveDate,
        config: &LedgerConfig,
    ) -> LedgerResult<Decimal> {
        let patient = self.get_mut(id)?;
        if amount < Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "payment amount cannot be negative: {}",
                amount
            )));
        }
        if config.cap_payments_at_pending && amount > patient.pending_amount {
            return Err(LedgerError::Validation(format!(
                "payment {} exceeds pending amount {}",
                amount, patient.pending_amount
            )));
        }

        append_payment(patient, amount, Settlement::Received, today)?;
        Ok(patient.pending_amount)
    }

    /// Force the balance to zero. Returns the amount that was cleared, or
    /// `None` when there was nothing to clear.
    pub fn clear_balance(&mut self, id: PatientId, today: NaiveDate) -> LedgerResult<Option<Decimal>> {
        let patient = self.get_mut(id)?;
        let outstanding = patient.pending_amount;
        if outstanding.is_zero() {
            return Ok(None);
        }

        append_payment(patient, outstanding, Settlement::Cleared, today)?;
        Ok(Some(outstanding))
    }

    /// Remove a patient and their whole history.
    pub fn delete(&mut self, id: PatientId) -> LedgerResult<Patient> {
        let index = self
            .patients
            .iter()
            .position(|p| p.id == id)
            .ok_or(LedgerError::NotFound(id))?;
        Ok(self.patients.remove(index))
    }

    pub fn search(&self, query: &str, sort: SortKey) -> Vec<Patient> {
        search(&self.patients, query, sort)
    }

    /// Patients who owe money, largest dues first.
    pub fn defaulters(&self) -> Vec<Patient> {
        search(
            self.patients.iter().filter(|p| p.is_defaulter()),
            "",
            SortKey::PendingDesc,
        )
    }
}

fn append_payment(
    patient: &mut Patient,
    amount: Decimal,
    settlement: Settlement,
    today: NaiveDate,
) -> LedgerResult<()> {
    let pending = patient
        .pending_amount
        .checked_sub(amount)
        .ok_or_else(|| overflow(patient.pending_amount))?;
    let entry = LogEntry::Payment(PaymentNote {
        date: today,
        amount,
        settlement,
    });
    let head = audit::entry_hash(patient.log_head.as_deref(), &entry)?;

    patient.pending_amount = pending;
    patient.visit_log.push(entry);
    patient.log_head = Some(head);
    Ok(())
}

fn validate_identity(name: &str, age: u32) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation("patient name is required".into()));
    }
    if age == 0 {
        return Err(LedgerError::Validation("patient age must be greater than 0".into()));
    }
    Ok(())
}

fn overflow(pending: Decimal) -> LedgerError {
    LedgerError::Validation(format!(
        "amount out of range for pending balance {}",
        pending
    ))
}

/// Check a draft and return its billed total.
fn validate_draft(draft: &VisitDraft) -> LedgerResult<Decimal> {
    let mut billed = Decimal::ZERO;
    for line in &draft.treatments {
        if line.procedure.trim().is_empty() {
            return Err(LedgerError::Validation("treatment name is required".into()));
        }
        if line.cost < Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "cost of {} cannot be negative: {}",
                line.procedure, line.cost
            )));
        }
        billed = billed.checked_add(line.cost).ok_or_else(|| {
            LedgerError::Validation(format!("bill total out of range at {}", line.procedure))
        })?;
    }
    for line in &draft.prescription {
        if line.medicine.trim().is_empty() {
            return Err(LedgerError::Validation("medicine name is required".into()));
        }
    }
    if draft.paid_now < Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "amount paid cannot be negative: {}",
            draft.paid_now
        )));
    }
    Ok(billed)
}

/// Teeth touched across a patient's whole history.
pub fn teeth_history(patient: &Patient) -> BTreeSet<Tooth> {
    patient
        .visit_log
        .iter()
        .filter_map(LogEntry::as_visit)
        .flat_map(|v| v.affected_teeth.iter().copied())
        .collect()
}
