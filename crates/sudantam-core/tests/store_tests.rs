//! Ledger over file-backed stores.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;

use sudantam_core::ledger::{FixedClock, Ledger};
use sudantam_core::models::{Gender, PatientIntake, VisitDraft};
use sudantam_core::store::{CsvStore, PatientStore, SqliteStore};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
}

fn exercise<S: PatientStore>(ledger: &Ledger<S>) {
    let asha = ledger
        .register_patient(
            PatientIntake::new("Asha Rao", 30)
                .with_gender(Gender::Female)
                .with_contact("98450 12345")
                .with_condition("Diabetes"),
        )
        .unwrap();
    ledger.register_patient(PatientIntake::new("Ravi, Jr.", 12)).unwrap();

    let mut draft = VisitDraft::new();
    draft.add_tooth("UR6").unwrap();
    draft.add_tooth("48").unwrap();
    draft.add_diagnosis("Caries");
    draft.add_treatment("Scaling", Decimal::from(800));
    draft.add_treatment("RCT", Decimal::new(350050, 2));
    draft.add_prescription("Amoxicillin 500mg", "1-0-1", "5 days");
    draft.notes = "Review in a week,\n\"sensitive\"".to_string();
    draft.next_visit = Some(day(12));
    draft.paid_now = Decimal::from(1000);
    ledger.record_visit(asha.id, &draft).unwrap();
    ledger.record_payment(asha.id, Decimal::from(500)).unwrap();
}

fn check_reopened<S: PatientStore>(ledger: &Ledger<S>) {
    let patients = ledger.list_patients().unwrap();
    assert_eq!(patients.len(), 2);

    let asha = &patients[0];
    assert_eq!(asha.id, 101);
    assert_eq!(asha.gender, Gender::Female);
    assert_eq!(asha.contact, "9845012345");
    assert!(asha.medical_history.contains("Diabetes"));
    assert_eq!(asha.pending_amount, Decimal::new(280050, 2));
    assert_eq!(asha.visit_log.len(), 2);
    assert_eq!(asha.next_visit, Some(day(12)));
    assert_eq!(asha.affected_teeth_latest.len(), 2);
    assert!(asha.is_balanced());
    assert!(ledger.verify_history(101).unwrap());

    let visit = asha.visit_log[0].as_visit().unwrap();
    assert_eq!(visit.notes, "Review in a week,\n\"sensitive\"");

    assert_eq!(patients[1].name, "Ravi, Jr.");
}

#[test]
fn test_sqlite_ledger_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clinic.db");

    let ledger = Ledger::new(SqliteStore::open(&path).unwrap()).with_clock(FixedClock(day(5)));
    exercise(&ledger);
    drop(ledger);

    let reopened = Ledger::new(SqliteStore::open(&path).unwrap());
    check_reopened(&reopened);
}

#[test]
fn test_csv_ledger_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("patients.csv");

    let ledger = Ledger::new(CsvStore::new(&path)).with_clock(FixedClock(day(5)));
    exercise(&ledger);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Patient ID,Name,Age,Gender,Contact,Last Visit"));
    assert!(text.contains("Payment received: 500.00"));

    let reopened = Ledger::new(CsvStore::new(&path));
    check_reopened(&reopened);
}

#[test]
fn test_csv_missing_file_is_empty_ledger() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::new(CsvStore::new(dir.path().join("none.csv")));
    assert!(ledger.list_patients().unwrap().is_empty());
    assert!(ledger.defaulters().unwrap().is_empty());
}
