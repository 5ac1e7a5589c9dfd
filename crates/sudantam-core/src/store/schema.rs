//! SQLite schema and spreadsheet column layout.

/// SQLite schema for the patient table.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients (one row per person, rewritten as a whole snapshot)
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    patient_id INTEGER PRIMARY KEY,
    row_order INTEGER NOT NULL,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    age INTEGER NOT NULL,
    gender TEXT NOT NULL DEFAULT '',
    contact TEXT NOT NULL DEFAULT '',
    last_visit TEXT NOT NULL,                      -- YYYY-MM-DD
    medical_history TEXT NOT NULL DEFAULT '[]',    -- JSON array of strings
    pending_amount TEXT NOT NULL DEFAULT '0',      -- decimal string
    visit_log TEXT NOT NULL DEFAULT '',            -- rendered text, never parsed back
    visit_records TEXT NOT NULL DEFAULT '[]',      -- JSON array of LogEntry
    affected_teeth TEXT NOT NULL DEFAULT '[]',     -- JSON array of FDI strings
    next_visit TEXT,
    log_head TEXT
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);
CREATE INDEX IF NOT EXISTS idx_patients_contact ON patients(contact);
"#;

/// Spreadsheet header, in column order.
pub const CSV_COLUMNS: [&str; 13] = [
    "Patient ID",
    "Name",
    "Age",
    "Gender",
    "Contact",
    "Last Visit",
    "Medical History",
    "Pending Amount",
    "Visit Log",
    "Next Visit",
    "Affected Teeth",
    "Visit Records",
    "Log Head",
];
