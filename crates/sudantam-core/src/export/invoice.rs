//! Visit invoice data.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::money;
use crate::models::{LogEntry, Patient, PatientId, PrescriptionLine, Visit};
use crate::store::escape_csv;

/// Invoice for one visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice metadata
    pub metadata: InvoiceMetadata,
    /// Billed procedures
    pub line_items: Vec<InvoiceLine>,
    /// Prescribed medicines
    pub prescription: Vec<PrescriptionLine>,
    /// Teeth treated, FDI notation
    pub teeth: Vec<String>,
    pub billed: Decimal,
    pub paid: Decimal,
    /// Patient's outstanding balance at the time of issue
    pub balance_due: Decimal,
}

/// Invoice metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceMetadata {
    /// `INV-<patient>-<yyyymmdd>`
    pub invoice_no: String,
    pub visit_id: String,
    pub visit_date: NaiveDate,
    pub next_visit: Option<NaiveDate>,
    pub patient_id: PatientId,
    pub patient_name: String,
    pub patient_age: u32,
    pub patient_gender: String,
    pub patient_contact: String,
    pub currency: String,
}

/// Single billed procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    pub amount: Decimal,
}

impl Invoice {
    /// Build an invoice for a visit of `patient`.
    pub fn from_visit(patient: &Patient, visit: &Visit, currency: &str) -> Self {
        let line_items = visit
            .treatments
            .iter()
            .map(|t| InvoiceLine {
                description: t.procedure.clone(),
                amount: t.cost,
            })
            .collect();

        Self {
            metadata: InvoiceMetadata {
                invoice_no: format!("INV-{}-{}", patient.id, visit.date.format("%Y%m%d")),
                visit_id: visit.visit_id.clone(),
                visit_date: visit.date,
                next_visit: visit.next_visit,
                patient_id: patient.id,
                patient_name: patient.name.clone(),
                patient_age: patient.age,
                patient_gender: patient.gender.label().to_string(),
                patient_contact: patient.contact.clone(),
                currency: currency.to_string(),
            },
            line_items,
            prescription: visit.prescription.clone(),
            teeth: visit.affected_teeth.iter().map(|t| t.fdi()).collect(),
            billed: visit.billed,
            paid: visit.paid,
            balance_due: patient.pending_amount,
        }
    }

    /// Invoice for the patient's most recent visit, if they have one.
    pub fn for_latest_visit(patient: &Patient, currency: &str) -> Option<Self> {
        patient
            .visit_log
            .iter()
            .rev()
            .find_map(LogEntry::as_visit)
            .map(|visit| Self::from_visit(patient, visit, currency))
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV, one row per billed procedure.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("invoice_no,visit_date,patient_id,patient_name,description,amount\n");

        for item in &self.line_items {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                escape_csv(&self.metadata.invoice_no),
                self.metadata.visit_date,
                self.metadata.patient_id,
                escape_csv(&self.metadata.patient_name),
                escape_csv(&item.description),
                money(item.amount),
            ));
        }

        csv
    }

    /// Plain-text invoice for printing or messaging.
    pub fn to_text(&self) -> String {
        let meta = &self.metadata;
        let cur = &meta.currency;
        let mut out = String::new();

        out.push_str(&format!("Invoice {}\n", meta.invoice_no));
        out.push_str(&format!("Date: {}\n", meta.visit_date));
        out.push_str(&format!("Patient: {} (#{})\n", meta.patient_name, meta.patient_id));
        let mut details = vec![format!("Age {}", meta.patient_age)];
        if !meta.patient_gender.is_empty() {
            details.push(meta.patient_gender.clone());
        }
        if !meta.patient_contact.is_empty() {
            details.push(format!("Ph {}", meta.patient_contact));
        }
        out.push_str(&details.join(" | "));
        out.push('\n');

        if !self.teeth.is_empty() {
            out.push_str(&format!("Teeth: {}\n", self.teeth.join(", ")));
        }

        out.push_str("\nTreatment\n");
        if self.line_items.is_empty() {
            out.push_str("  -\n");
        }
        for item in &self.line_items {
            out.push_str(&format!("  {:<30} {} {}\n", item.description, cur, money(item.amount)));
        }

        if !self.prescription.is_empty() {
            out.push_str("\nRx\n");
            for line in &self.prescription {
                out.push_str(&format!("  {} ({}) - {}\n", line.medicine, line.dosage, line.duration));
            }
        }

        out.push('\n');
        out.push_str(&format!("Total: {} {}\n", cur, money(self.billed)));
        out.push_str(&format!("Paid: {} {}\n", cur, money(self.paid)));
        out.push_str(&format!("Balance due: {} {}\n", cur, money(self.balance_due)));

        if let Some(next) = meta.next_visit {
            out.push_str(&format!("Next visit: {}\n", next));
        }
        out
    }
}
