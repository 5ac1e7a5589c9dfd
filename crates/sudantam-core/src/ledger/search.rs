//! Patient lookup and ordering.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{normalize_contact, Patient};

/// Order for search results. Ties always fall back to patient id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Most recently seen first
    #[default]
    LastVisitDesc,
    LastVisitAsc,
    NameAsc,
    /// Largest dues first
    PendingDesc,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "last_visit_desc" | "recent" => Ok(SortKey::LastVisitDesc),
            "last_visit_asc" | "oldest" => Ok(SortKey::LastVisitAsc),
            "name_asc" | "name" => Ok(SortKey::NameAsc),
            "pending_desc" | "dues" => Ok(SortKey::PendingDesc),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

impl SortKey {
    fn compare(self, a: &Patient, b: &Patient) -> Ordering {
        let primary = match self {
            SortKey::LastVisitDesc => b.last_visit.cmp(&a.last_visit),
            SortKey::LastVisitAsc => a.last_visit.cmp(&b.last_visit),
            SortKey::NameAsc => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::PendingDesc => b.pending_amount.cmp(&a.pending_amount),
        };
        primary.then(a.id.cmp(&b.id))
    }
}

/// Whether a patient matches a search query: case-insensitive substring of
/// the name, or the exact contact number.
pub fn matches_query(patient: &Patient, query: &str) -> bool {
    let query = query.trim();
    if patient.name.to_lowercase().contains(&query.to_lowercase()) {
        return true;
    }
    let digits = normalize_contact(query);
    !digits.is_empty() && digits == patient.contact
}

/// Filter and order a snapshot without modifying it.
pub fn search<'a, I>(patients: I, query: &str, sort: SortKey) -> Vec<Patient>
where
    I: IntoIterator<Item = &'a Patient>,
{
    let mut results: Vec<Patient> = patients
        .into_iter()
        .filter(|p| matches_query(p, query))
        .cloned()
        .collect();
    results.sort_by(|a, b| sort.compare(a, b));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatientIntake;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn patient(id: u32, name: &str, contact: &str, day: u32, pending: i64) -> Patient {
        let mut p = Patient::new(
            id,
            PatientIntake::new(name, 30).with_contact(contact),
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        );
        p.pending_amount = Decimal::from(pending);
        p
    }

    fn sample() -> Vec<Patient> {
        vec![
            patient(101, "Asha Rao", "9000000001", 5, 300),
            patient(102, "ravi kumar", "9000000002", 9, 0),
            patient(103, "Ashok", "9000000003", 9, 1200),
            patient(104, "Meera", "9000000001", 1, 300),
        ]
    }

    fn ids(patients: &[Patient]) -> Vec<u32> {
        patients.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_name_substring_case_insensitive() {
        let results = search(&sample(), "ASH", SortKey::NameAsc);
        assert_eq!(ids(&results), vec![101, 103]);

        let results = search(&sample(), "kumar", SortKey::NameAsc);
        assert_eq!(ids(&results), vec![102]);
    }

    #[test]
    fn test_exact_contact_match() {
        let results = search(&sample(), "9000000001", SortKey::NameAsc);
        assert_eq!(ids(&results), vec![101, 104]);

        // Partial numbers do not match
        assert!(search(&sample(), "900000000", SortKey::NameAsc).is_empty());
    }

    #[test]
    fn test_empty_query_returns_all() {
        assert_eq!(search(&sample(), "", SortKey::NameAsc).len(), 4);
    }

    #[test]
    fn test_sort_last_visit_desc_ties_by_id() {
        let results = search(&sample(), "", SortKey::LastVisitDesc);
        assert_eq!(ids(&results), vec![102, 103, 101, 104]);
    }

    #[test]
    fn test_sort_last_visit_asc() {
        let results = search(&sample(), "", SortKey::LastVisitAsc);
        assert_eq!(ids(&results), vec![104, 101, 102, 103]);
    }

    #[test]
    fn test_sort_name_asc() {
        let results = search(&sample(), "", SortKey::NameAsc);
        assert_eq!(ids(&results), vec![101, 103, 104, 102]);
    }

    #[test]
    fn test_sort_pending_desc() {
        let results = search(&sample(), "", SortKey::PendingDesc);
        assert_eq!(ids(&results), vec![103, 101, 104, 102]);
    }

    #[test]
    fn test_search_is_repeatable() {
        let snapshot = sample();
        let first = search(&snapshot, "a", SortKey::PendingDesc);
        let second = search(&snapshot, "a", SortKey::PendingDesc);
        assert_eq!(first, second);
        assert_eq!(snapshot, sample());
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("name".parse::<SortKey>().unwrap(), SortKey::NameAsc);
        assert_eq!("pending-desc".parse::<SortKey>().unwrap(), SortKey::PendingDesc);
        assert!("shoe-size".parse::<SortKey>().is_err());
    }
}
