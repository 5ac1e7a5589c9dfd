//! Patient models.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tooth::Tooth;
use super::visit::LogEntry;

/// Clinic-assigned patient number.
pub type PatientId = u32;

/// Patient gender as captured at intake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unspecified,
}

impl Gender {
    /// Label used in the spreadsheet column (empty when unspecified).
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
            Gender::Unspecified => "",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "unspecified" | "-" => Ok(Gender::Unspecified),
            "m" | "male" => Ok(Gender::Male),
            "f" | "female" => Ok(Gender::Female),
            "o" | "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender: {}", other)),
        }
    }
}

/// Intake form contents for a new patient.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientIntake {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub contact: String,
    pub medical_history: Vec<String>,
}

impl PatientIntake {
    /// Intake with the two required fields.
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self {
            name: name.into(),
            age,
            ..Default::default()
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.medical_history.push(condition.into());
        self
    }
}

/// A patient row: identity, running balance, and visit history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Clinic patient number
    pub id: PatientId,
    /// Full name (non-empty)
    pub name: String,
    /// Age in years
    pub age: u32,
    pub gender: Gender,
    /// Phone number, digits only; not guaranteed unique
    pub contact: String,
    /// Condition tags such as "Diabetes"
    pub medical_history: BTreeSet<String>,
    /// Date of registration or of the latest recorded visit
    pub last_visit: NaiveDate,
    /// Outstanding balance; negative means the patient holds credit
    pub pending_amount: Decimal,
    /// Append-only, chronological ledger of visits and payments
    pub visit_log: Vec<LogEntry>,
    /// Teeth touched at the most recent visit
    pub affected_teeth_latest: BTreeSet<Tooth>,
    /// Next scheduled appointment
    pub next_visit: Option<NaiveDate>,
    /// Hash-chain head over `visit_log`
    pub log_head: Option<String>,
}

impl Patient {
    /// Create a fresh patient row from a validated intake.
    pub fn new(id: PatientId, intake: PatientIntake, today: NaiveDate) -> Self {
        Self {
            id,
            name: intake.name.trim().to_string(),
            age: intake.age,
            gender: intake.gender,
            contact: normalize_contact(&intake.contact),
            medical_history: normalize_tags(intake.medical_history),
            last_visit: today,
            pending_amount: Decimal::ZERO,
            visit_log: Vec::new(),
            affected_teeth_latest: BTreeSet::new(),
            next_visit: None,
            log_head: None,
        }
    }

    /// A patient with money owed to the clinic.
    pub fn is_defaulter(&self) -> bool {
        self.pending_amount > Decimal::ZERO
    }

    /// Number of clinical visits (payment notes excluded).
    pub fn visit_count(&self) -> usize {
        self.visit_log
            .iter()
            .filter(|entry| entry.as_visit().is_some())
            .count()
    }

    /// Balance recomputed from the log alone.
    pub fn log_balance(&self) -> Decimal {
        self.visit_log.iter().map(LogEntry::balance_delta).sum()
    }

    /// Whether the stored balance agrees with the log.
    pub fn is_balanced(&self) -> bool {
        self.log_balance() == self.pending_amount
    }
}

/// Keep only the digits of a phone number.
pub fn normalize_contact(contact: &str) -> String {
    contact.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Trim condition tags and drop empty ones.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
