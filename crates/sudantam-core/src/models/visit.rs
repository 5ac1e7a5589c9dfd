//! Visit models: finalized visits, ledger entries, and the draft a
//! front end builds up before finalizing.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::{MedicineItem, ProcedureItem};
use super::tooth::{FormatError, Tooth};

/// A procedure performed at a visit and what it was billed at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentLine {
    pub procedure: String,
    pub cost: Decimal,
}

impl TreatmentLine {
    pub fn new(procedure: impl Into<String>, cost: Decimal) -> Self {
        Self {
            procedure: procedure.into(),
            cost,
        }
    }
}

/// One prescribed medicine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionLine {
    pub medicine: String,
    /// e.g., "1-0-1", "SOS"
    pub dosage: String,
    /// e.g., "5 days"
    pub duration: String,
}

impl PrescriptionLine {
    pub fn new(
        medicine: impl Into<String>,
        dosage: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            medicine: medicine.into(),
            dosage: dosage.into(),
            duration: duration.into(),
        }
    }
}

/// A finalized clinical encounter. Immutable once logged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Visit {
    /// Same as the draft it was finalized from
    pub visit_id: String,
    pub date: NaiveDate,
    pub affected_teeth: BTreeSet<Tooth>,
    pub diagnosis: BTreeSet<String>,
    pub treatments: Vec<TreatmentLine>,
    pub prescription: Vec<PrescriptionLine>,
    /// Sum of treatment costs
    pub billed: Decimal,
    /// Amount collected at the chair
    pub paid: Decimal,
    pub notes: String,
    pub next_visit: Option<NaiveDate>,
}

impl Visit {
    /// Change in the patient's balance caused by this visit.
    pub fn balance_delta(&self) -> Decimal {
        self.billed - self.paid
    }
}

/// Why a financial-only entry was written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    /// Money received from the dues view
    Received,
    /// Balance forced to zero (settled or written off)
    Cleared,
}

/// A payment or clearance recorded outside a clinical visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentNote {
    pub date: NaiveDate,
    /// Amount subtracted from the balance; negative when a credit is cleared
    pub amount: Decimal,
    pub settlement: Settlement,
}

/// One entry of a patient's visit log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum LogEntry {
    Visit(Visit),
    Payment(PaymentNote),
}

impl LogEntry {
    pub fn date(&self) -> NaiveDate {
        match self {
            LogEntry::Visit(visit) => visit.date,
            LogEntry::Payment(note) => note.date,
        }
    }

    /// Change in the patient's balance caused by this entry.
    pub fn balance_delta(&self) -> Decimal {
        match self {
            LogEntry::Visit(visit) => visit.balance_delta(),
            LogEntry::Payment(note) => -note.amount,
        }
    }

    pub fn as_visit(&self) -> Option<&Visit> {
        match self {
            LogEntry::Visit(visit) => Some(visit),
            LogEntry::Payment(_) => None,
        }
    }
}

/// An in-progress visit held by the front end until the doctor finalizes it.
///
/// The ledger never stores drafts; it only reads one when recording a visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitDraft {
    /// Unique draft ID; becomes the visit ID
    pub draft_id: String,
    pub affected_teeth: BTreeSet<Tooth>,
    pub diagnosis: BTreeSet<String>,
    pub treatments: Vec<TreatmentLine>,
    pub prescription: Vec<PrescriptionLine>,
    pub notes: String,
    pub next_visit: Option<NaiveDate>,
    /// Amount collected at the end of the visit
    pub paid_now: Decimal,
}

impl Default for VisitDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl VisitDraft {
    /// Create an empty draft.
    pub fn new() -> Self {
        Self {
            draft_id: uuid::Uuid::new_v4().to_string(),
            affected_teeth: BTreeSet::new(),
            diagnosis: BTreeSet::new(),
            treatments: Vec::new(),
            prescription: Vec::new(),
            notes: String::new(),
            next_visit: None,
            paid_now: Decimal::ZERO,
        }
    }

    /// Mark a tooth from any supported designator ("16", "UR6").
    pub fn add_tooth(&mut self, designator: &str) -> Result<Tooth, FormatError> {
        let tooth: Tooth = designator.parse()?;
        self.affected_teeth.insert(tooth);
        Ok(tooth)
    }

    /// Flip a tooth on the chart. Returns whether it is now selected.
    pub fn toggle_tooth(&mut self, tooth: Tooth) -> bool {
        if self.affected_teeth.remove(&tooth) {
            false
        } else {
            self.affected_teeth.insert(tooth);
            true
        }
    }

    pub fn add_diagnosis(&mut self, tag: impl Into<String>) {
        let tag = tag.into().trim().to_string();
        if !tag.is_empty() {
            self.diagnosis.insert(tag);
        }
    }

    pub fn add_treatment(&mut self, procedure: impl Into<String>, cost: Decimal) {
        self.treatments.push(TreatmentLine::new(procedure, cost));
    }

    /// Add a catalog procedure at its default fee, or at `price` if given.
    pub fn add_procedure(&mut self, item: &ProcedureItem, price: Option<Decimal>) {
        self.add_treatment(item.name.clone(), price.unwrap_or(item.default_price));
    }

    pub fn add_prescription(
        &mut self,
        medicine: impl Into<String>,
        dosage: impl Into<String>,
        duration: impl Into<String>,
    ) {
        self.prescription
            .push(PrescriptionLine::new(medicine, dosage, duration));
    }

    /// Prescribe a catalog medicine with its usual dosage and duration.
    pub fn add_medicine(&mut self, item: &MedicineItem) {
        self.add_prescription(
            item.name.clone(),
            item.default_dosage.clone(),
            item.default_duration.clone(),
        );
    }

    /// Drop the last prescription line (the "undo" button on the Rx screen).
    pub fn pop_prescription(&mut self) -> Option<PrescriptionLine> {
        self.prescription.pop()
    }

    /// Total of the treatment lines so far, `None` if it overflows.
    pub fn billed(&self) -> Option<Decimal> {
        self.treatments
            .iter()
            .try_fold(Decimal::ZERO, |total, t| total.checked_add(t.cost))
    }

    /// Balance change this draft would cause if finalized.
    pub fn balance_delta(&self) -> Option<Decimal> {
        self.billed()?.checked_sub(self.paid_now)
    }
}
