//! Ledger configuration.

use serde::{Deserialize, Serialize};

/// How new patient numbers are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// `id_base + number of rows`, the numbering already printed on old
    /// invoices. Falls forward to the next free number if that id is taken.
    #[default]
    RowCount,
    /// `max(existing id) + 1` (or `id_base` for an empty store).
    NextAfterMax,
}

/// Tunables for the ledger engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub id_policy: IdPolicy,
    /// First patient number handed out
    pub id_base: u32,
    /// Reject payments larger than the outstanding balance
    pub cap_payments_at_pending: bool,
    /// Symbol printed on invoices and dues reports
    pub currency_symbol: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            id_policy: IdPolicy::RowCount,
            id_base: 101,
            cap_payments_at_pending: true,
            currency_symbol: "₹".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.id_base, 101);
        assert_eq!(config.id_policy, IdPolicy::RowCount);
        assert!(config.cap_payments_at_pending);
    }

    #[test]
    fn test_partial_deserialize() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"id_policy": "next_after_max", "cap_payments_at_pending": false}"#)
                .unwrap();
        assert_eq!(config.id_policy, IdPolicy::NextAfterMax);
        assert!(!config.cap_payments_at_pending);
        assert_eq!(config.id_base, 101);
        assert_eq!(config.currency_symbol, "₹");
    }
}
