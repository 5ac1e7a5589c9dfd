//! Spreadsheet-compatible CSV store.
//!
//! One row per patient with the clinic sheet's columns. `Visit Log` holds
//! the human-readable history; `Visit Records` holds the same entries as
//! JSON and is the only column read back for history. `Medical History` is
//! a JSON array of tags, so a tag may itself contain commas. A plain
//! comma-separated cell typed into a spreadsheet is still accepted.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tempfile::NamedTempFile;

use super::sqlite::{parse_amount, parse_date};
use super::{PatientStore, StoreError, StoreResult, CSV_COLUMNS};
use crate::ledger::render_log;
use crate::models::{normalize_tags, Gender, Patient, Tooth};

/// Patient sheet exported as CSV.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PatientStore for CsvStore {
    fn load_all(&self) -> StoreResult<Vec<Patient>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let patients = parse_sheet(&text)?;
        tracing::debug!(rows = patients.len(), path = %self.path.display(), "Loaded patient sheet");
        Ok(patients)
    }

    /// Writes a sibling temp file and renames it over the sheet, so readers
    /// see either the old or the new snapshot.
    fn save_all(&self, patients: &[Patient]) -> StoreResult<()> {
        let text = write_sheet(patients)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        tracing::debug!(rows = patients.len(), path = %self.path.display(), "Saved patient sheet");
        Ok(())
    }
}

/// Render the full sheet, header included.
pub fn write_sheet(patients: &[Patient]) -> StoreResult<String> {
    let mut csv = String::new();
    csv.push_str(&CSV_COLUMNS.join(","));
    csv.push('\n');

    for patient in patients {
        let teeth: Vec<String> = patient
            .affected_teeth_latest
            .iter()
            .map(|t| t.fdi())
            .collect();

        let fields = [
            patient.id.to_string(),
            patient.name.clone(),
            patient.age.to_string(),
            patient.gender.label().to_string(),
            patient.contact.clone(),
            patient.last_visit.to_string(),
            serde_json::to_string(&patient.medical_history)?,
            patient.pending_amount.to_string(),
            render_log(&patient.visit_log),
            patient.next_visit.map(|d| d.to_string()).unwrap_or_default(),
            teeth.join(", "),
            serde_json::to_string(&patient.visit_log)?,
            patient.log_head.clone().unwrap_or_default(),
        ];

        let escaped: Vec<String> = fields.iter().map(|f| escape_csv(f)).collect();
        csv.push_str(&escaped.join(","));
        csv.push('\n');
    }

    Ok(csv)
}

/// Parse a sheet produced by `write_sheet` or re-saved from a spreadsheet
/// app. Columns are located by header name, so reordering is tolerated.
pub fn parse_sheet(text: &str) -> StoreResult<Vec<Patient>> {
    let mut records = parse_records(text.trim_start_matches('\u{feff}'))?.into_iter();
    let header = match records.next() {
        Some(header) => header,
        None => return Ok(Vec::new()),
    };

    let index: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim(), i))
        .collect();
    let column = |name: &str| -> StoreResult<usize> {
        index
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::Corrupt(format!("missing column {:?}", name)))
    };

    let cols = SheetColumns {
        id: column("Patient ID")?,
        name: column("Name")?,
        age: column("Age")?,
        gender: column("Gender")?,
        contact: column("Contact")?,
        last_visit: column("Last Visit")?,
        history: column("Medical History")?,
        pending: column("Pending Amount")?,
        next_visit: column("Next Visit")?,
        teeth: column("Affected Teeth")?,
        records: column("Visit Records")?,
        log_head: column("Log Head")?,
    };

    records
        .filter(|record| !(record.len() == 1 && record[0].trim().is_empty()))
        .enumerate()
        .map(|(line, record)| cols.patient(line + 2, &record))
        .collect()
}

struct SheetColumns {
    id: usize,
    name: usize,
    age: usize,
    gender: usize,
    contact: usize,
    last_visit: usize,
    history: usize,
    pending: usize,
    next_visit: usize,
    teeth: usize,
    records: usize,
    log_head: usize,
}

impl SheetColumns {
    fn patient(&self, line: usize, record: &[String]) -> StoreResult<Patient> {
        let field = move |i: usize| record.get(i).map(|s| s.trim()).unwrap_or_default();
        let corrupt = |what: &str, value: &str| {
            StoreError::Corrupt(format!("row {}: bad {} {:?}", line, what, value))
        };

        let id: u32 = field(self.id)
            .parse()
            .map_err(|_| corrupt("patient id", field(self.id)))?;
        let age: u32 = field(self.age)
            .parse()
            .map_err(|_| corrupt("age", field(self.age)))?;
        let gender = Gender::from_str(field(self.gender))
            .map_err(|_| corrupt("gender", field(self.gender)))?;
        let affected_teeth_latest: BTreeSet<Tooth> = split_list(field(self.teeth))
            .map(Tooth::from_str)
            .collect::<Result<_, _>>()
            .map_err(|_| corrupt("teeth", field(self.teeth)))?;
        let history = field(self.history);
        let medical_history = if history.starts_with('[') {
            let tags: Vec<String> =
                serde_json::from_str(history).map_err(|_| corrupt("medical history", history))?;
            normalize_tags(tags)
        } else {
            normalize_tags(split_list(history))
        };
        let records = field(self.records);
        let visit_log = if records.is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(records)?
        };
        let next_visit = match field(self.next_visit) {
            "" => None,
            date => Some(parse_date(id, date)?),
        };
        let log_head = match field(self.log_head) {
            "" => None,
            head => Some(head.to_string()),
        };

        Ok(Patient {
            id,
            name: field(self.name).to_string(),
            age,
            gender,
            contact: field(self.contact).to_string(),
            medical_history,
            last_visit: parse_date(id, field(self.last_visit))?,
            pending_amount: parse_amount(id, field(self.pending))?,
            visit_log,
            affected_teeth_latest,
            next_visit,
            log_head,
        })
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Escape a string for CSV output.
pub(crate) fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Split CSV text into records of unescaped fields. Quoted fields may
/// contain commas, doubled quotes and line breaks.
fn parse_records(text: &str) -> StoreResult<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
                quoted = false;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(StoreError::Corrupt("unterminated quoted field".into()));
    }
    if !field.is_empty() || !record.is_empty() || quoted {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogEntry, PatientIntake, PaymentNote, Settlement};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn sample_patient(id: u32, name: &str) -> Patient {
        let mut patient = Patient::new(
            id,
            PatientIntake::new(name, 35)
                .with_gender(Gender::Female)
                .with_contact("9876543210")
                .with_condition("Diabetes")
                .with_condition("Hypertension"),
            today(),
        );
        patient.pending_amount = Decimal::from(-300);
        patient.visit_log.push(LogEntry::Payment(PaymentNote {
            date: today(),
            amount: Decimal::from(300),
            settlement: Settlement::Received,
        }));
        patient.affected_teeth_latest.insert("UR6".parse().unwrap());
        patient.affected_teeth_latest.insert("48".parse().unwrap());
        patient
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_parse_records_quoting() {
        let records = parse_records("a,\"b,c\",\"say \"\"hi\"\"\"\r\n\"multi\nline\",,x\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], vec!["a", "b,c", "say \"hi\""]);
        assert_eq!(records[1], vec!["multi\nline", "", "x"]);
    }

    #[test]
    fn test_parse_records_no_trailing_newline() {
        let records = parse_records("a,b\nc,\"\"").unwrap();
        assert_eq!(records, vec![vec!["a", "b"], vec!["c", ""]]);
    }

    #[test]
    fn test_parse_records_unterminated() {
        assert!(matches!(
            parse_records("a,\"oops\n"),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_sheet_round_trip() {
        let patients = vec![sample_patient(101, "Asha, Jr."), sample_patient(102, "Meera")];
        let text = write_sheet(&patients).unwrap();
        assert!(text.starts_with("Patient ID,Name,Age,Gender,Contact,Last Visit"));

        let parsed = parse_sheet(&text).unwrap();
        assert_eq!(parsed, patients);
    }

    #[test]
    fn test_sheet_column_reorder_and_bom() {
        let text = "\u{feff}Name,Patient ID,Age,Gender,Contact,Last Visit,Medical History,Pending Amount,Visit Log,Next Visit,Affected Teeth,Visit Records,Log Head\n\
                    Ravi,103,50,M,999,2024-02-01,\"BP, Diabetes\",150.00,,2024-02-10,16,,\n\n";
        let parsed = parse_sheet(text).unwrap();
        assert_eq!(parsed.len(), 1);

        let ravi = &parsed[0];
        assert_eq!(ravi.id, 103);
        assert_eq!(ravi.gender, Gender::Male);
        assert_eq!(ravi.medical_history.len(), 2);
        assert_eq!(ravi.pending_amount, Decimal::new(15000, 2));
        assert_eq!(ravi.next_visit, NaiveDate::from_ymd_opt(2024, 2, 10));
        assert!(ravi.visit_log.is_empty());
        assert_eq!(ravi.log_head, None);
    }

    #[test]
    fn test_sheet_history_tag_with_comma() {
        let mut patient = sample_patient(101, "Asha");
        patient
            .medical_history
            .insert("Allergy: penicillin, sulfa".to_string());
        let text = write_sheet(&[patient.clone()]).unwrap();

        let parsed = parse_sheet(&text).unwrap();
        assert_eq!(parsed[0].medical_history.len(), 3);
        assert!(parsed[0]
            .medical_history
            .contains("Allergy: penicillin, sulfa"));
        assert_eq!(parsed, vec![patient]);
    }

    #[test]
    fn test_sheet_bad_history_json() {
        let text = write_sheet(&[sample_patient(101, "Asha")])
            .unwrap()
            .replace("\"\"Hypertension\"\"]\"", "\"\"Hypertension\"\"\"");
        assert!(matches!(parse_sheet(&text), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_sheet_missing_column() {
        let text = "Patient ID,Name\n101,Asha\n";
        assert!(matches!(parse_sheet(text), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_sheet_bad_tooth() {
        let mut text = write_sheet(&[sample_patient(101, "Asha")]).unwrap();
        text = text.replace("16, 48", "16, 99");
        assert!(matches!(parse_sheet(&text), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("patients.csv"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_store_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("patients.csv"));
        let patients = vec![sample_patient(101, "Asha")];

        store.save_all(&patients).unwrap();
        assert_eq!(store.load_all().unwrap(), patients);

        store.save_all(&[]).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_store_save_into_missing_dir_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("nope").join("patients.csv"));
        assert!(matches!(
            store.save_all(&[sample_patient(101, "Asha")]),
            Err(StoreError::Io(_))
        ));
    }
}
