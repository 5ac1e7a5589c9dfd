//! Outstanding dues report.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::money;
use crate::models::{Patient, PatientId};
use crate::store::escape_csv;

/// Patients who owe the clinic, largest dues first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuesReport {
    pub generated_on: NaiveDate,
    pub currency: String,
    pub rows: Vec<DuesRow>,
    pub total_pending: Decimal,
}

/// Single defaulter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuesRow {
    pub patient_id: PatientId,
    pub name: String,
    pub contact: String,
    pub last_visit: NaiveDate,
    pub pending_amount: Decimal,
}

impl DuesReport {
    /// Build from any set of patients; only those with `pending > 0` are kept.
    pub fn new<'a, I>(patients: I, generated_on: NaiveDate, currency: &str) -> Self
    where
        I: IntoIterator<Item = &'a Patient>,
    {
        let mut rows: Vec<DuesRow> = patients
            .into_iter()
            .filter(|p| p.is_defaulter())
            .map(|p| DuesRow {
                patient_id: p.id,
                name: p.name.clone(),
                contact: p.contact.clone(),
                last_visit: p.last_visit,
                pending_amount: p.pending_amount,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.pending_amount
                .cmp(&a.pending_amount)
                .then(a.patient_id.cmp(&b.patient_id))
        });
        let total_pending = rows.iter().map(|r| r.pending_amount).sum();

        Self {
            generated_on,
            currency: currency.to_string(),
            rows,
            total_pending,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("patient_id,name,contact,last_visit,pending_amount\n");

        for row in &self.rows {
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                row.patient_id,
                escape_csv(&row.name),
                escape_csv(&row.contact),
                row.last_visit,
                money(row.pending_amount),
            ));
        }

        csv
    }
}
