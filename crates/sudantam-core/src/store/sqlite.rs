//! SQLite-backed patient store.

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use super::{PatientStore, StoreError, StoreResult, SCHEMA};
use crate::ledger::render_log;
use crate::models::{Gender, LogEntry, Patient, Tooth};

/// Patient snapshot in a local SQLite file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl PatientStore for SqliteStore {
    fn load_all(&self) -> StoreResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT patient_id, name, age, gender, contact, last_visit,
                   medical_history, pending_amount, visit_records,
                   affected_teeth, next_visit, log_head
            FROM patients
            ORDER BY row_order
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(PatientRow {
                id: row.get(0)?,
                name: row.get(1)?,
                age: row.get(2)?,
                gender: row.get(3)?,
                contact: row.get(4)?,
                last_visit: row.get(5)?,
                medical_history: row.get(6)?,
                pending_amount: row.get(7)?,
                visit_records: row.get(8)?,
                affected_teeth: row.get(9)?,
                next_visit: row.get(10)?,
                log_head: row.get(11)?,
            })
        })?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        tracing::debug!(rows = patients.len(), "Loaded patient snapshot from SQLite");
        Ok(patients)
    }

    fn save_all(&self, patients: &[Patient]) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM patients", [])?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO patients (
                    patient_id, row_order, name, age, gender, contact, last_visit,
                    medical_history, pending_amount, visit_log, visit_records,
                    affected_teeth, next_visit, log_head
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
            )?;

            for (order, patient) in patients.iter().enumerate() {
                let teeth: Vec<String> = patient
                    .affected_teeth_latest
                    .iter()
                    .map(|t| t.fdi())
                    .collect();

                stmt.execute(params![
                    patient.id,
                    order as i64,
                    patient.name,
                    patient.age,
                    patient.gender.label(),
                    patient.contact,
                    patient.last_visit.to_string(),
                    serde_json::to_string(&patient.medical_history)?,
                    patient.pending_amount.to_string(),
                    render_log(&patient.visit_log),
                    serde_json::to_string(&patient.visit_log)?,
                    serde_json::to_string(&teeth)?,
                    patient.next_visit.map(|d| d.to_string()),
                    patient.log_head,
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(rows = patients.len(), "Saved patient snapshot to SQLite");
        Ok(())
    }
}

/// Raw database row, before parsing text columns.
struct PatientRow {
    id: u32,
    name: String,
    age: u32,
    gender: String,
    contact: String,
    last_visit: String,
    medical_history: String,
    pending_amount: String,
    visit_records: String,
    affected_teeth: String,
    next_visit: Option<String>,
    log_head: Option<String>,
}

impl TryFrom<PatientRow> for Patient {
    type Error = StoreError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let teeth: Vec<String> = serde_json::from_str(&row.affected_teeth)?;
        let affected_teeth_latest: BTreeSet<Tooth> = teeth
            .iter()
            .map(|t| Tooth::from_str(t))
            .collect::<Result<_, _>>()
            .map_err(|e| StoreError::Corrupt(format!("patient {}: {}", row.id, e)))?;
        let visit_log: Vec<LogEntry> = serde_json::from_str(&row.visit_records)?;

        Ok(Patient {
            id: row.id,
            gender: Gender::from_str(&row.gender)
                .map_err(|e| StoreError::Corrupt(format!("patient {}: {}", row.id, e)))?,
            last_visit: parse_date(row.id, &row.last_visit)?,
            medical_history: serde_json::from_str(&row.medical_history)?,
            pending_amount: parse_amount(row.id, &row.pending_amount)?,
            next_visit: row
                .next_visit
                .as_deref()
                .map(|d| parse_date(row.id, d))
                .transpose()?,
            name: row.name,
            age: row.age,
            contact: row.contact,
            visit_log,
            affected_teeth_latest,
            log_head: row.log_head,
        })
    }
}

pub(crate) fn parse_date(id: u32, value: &str) -> StoreResult<NaiveDate> {
    NaiveDate::from_str(value.trim())
        .map_err(|e| StoreError::Corrupt(format!("patient {}: bad date {:?}: {}", id, value, e)))
}

pub(crate) fn parse_amount(id: u32, value: &str) -> StoreResult<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|e| StoreError::Corrupt(format!("patient {}: bad amount {:?}: {}", id, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PatientIntake, PaymentNote, Settlement};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn sample_patient(id: u32, name: &str) -> Patient {
        let mut patient = Patient::new(
            id,
            PatientIntake::new(name, 42)
                .with_gender(Gender::Male)
                .with_contact("9876543210")
                .with_condition("Diabetes"),
            today(),
        );
        patient.pending_amount = Decimal::new(-25050, 2);
        patient.visit_log.push(LogEntry::Payment(PaymentNote {
            date: today(),
            amount: Decimal::new(25050, 2),
            settlement: Settlement::Received,
        }));
        patient.affected_teeth_latest.insert("UR6".parse().unwrap());
        patient.next_visit = NaiveDate::from_ymd_opt(2024, 3, 8);
        patient.log_head = Some("abc123".into());
        patient
    }

    #[test]
    fn test_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let patients = vec![sample_patient(101, "Ravi"), sample_patient(102, "Asha")];
        store.save_all(&patients).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded, patients);
    }

    #[test]
    fn test_row_order_preserved() {
        let store = SqliteStore::open_in_memory().unwrap();
        let patients = vec![sample_patient(105, "Zed"), sample_patient(101, "Amy")];
        store.save_all(&patients).unwrap();

        let ids: Vec<u32> = store.load_all().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![105, 101]);
    }

    #[test]
    fn test_save_replaces_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .save_all(&[sample_patient(101, "Ravi"), sample_patient(102, "Asha")])
            .unwrap();
        store.save_all(&[sample_patient(103, "Meera")]).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, 103);
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_all(&[sample_patient(101, "Ravi")]).unwrap();

        // Duplicate primary key aborts the insert loop part-way.
        let result = store.save_all(&[sample_patient(102, "Asha"), sample_patient(102, "Asha")]);
        assert!(matches!(result, Err(StoreError::Sqlite(_))));

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Ravi");
    }

    #[test]
    fn test_rendered_log_column() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_all(&[sample_patient(101, "Ravi")]).unwrap();

        let text: String = store
            .conn()
            .query_row("SELECT visit_log FROM patients WHERE patient_id = 101", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(text.starts_with("📅 2024-03-01"));
        assert!(text.contains("Payment received: 250.50"));
    }

    #[test]
    fn test_corrupt_amount() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_all(&[sample_patient(101, "Ravi")]).unwrap();
        store
            .conn()
            .execute("UPDATE patients SET pending_amount = 'lots'", [])
            .unwrap();

        assert!(matches!(store.load_all(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.save_all(&[sample_patient(101, "Ravi")]).unwrap();
        }
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.load_all().unwrap().len(), 1);
    }
}
