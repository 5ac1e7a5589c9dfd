//! Hash chain over a patient's visit log.
//!
//! Each entry is hashed together with the previous head:
//! `head_n = sha256(head_{n-1} || json(entry_n))`. Editing, reordering or
//! dropping an earlier entry changes every later head, so a stored head
//! that no longer matches the recomputed one means the log was altered
//! outside the ledger.

use sha2::{Digest, Sha256};

use crate::models::{LogEntry, Patient};

/// Hash one entry onto the chain.
pub fn entry_hash(prev: Option<&str>, entry: &LogEntry) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_string(entry)?;
    let mut hasher = Sha256::new();
    hasher.update(prev.unwrap_or_default().as_bytes());
    hasher.update(payload.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Head of the chain for a full log (`None` for an empty log).
pub fn chain_head(entries: &[LogEntry]) -> Result<Option<String>, serde_json::Error> {
    let mut head: Option<String> = None;
    for entry in entries {
        head = Some(entry_hash(head.as_deref(), entry)?);
    }
    Ok(head)
}

/// Check a patient's stored head against the log.
pub fn verify_log(patient: &Patient) -> Result<bool, serde_json::Error> {
    Ok(chain_head(&patient.visit_log)? == patient.log_head)
}
