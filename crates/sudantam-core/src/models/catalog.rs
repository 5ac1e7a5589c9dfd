//! Procedure and medicine reference items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A billable dental procedure with its default fee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcedureItem {
    /// Procedure name as printed on the invoice
    pub name: String,
    /// Alternative spellings/abbreviations for lookup
    pub aliases: Vec<String>,
    /// Default fee, editable per visit
    pub default_price: Decimal,
}

impl ProcedureItem {
    pub fn new(name: impl Into<String>, default_price: Decimal) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            default_price,
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Exact, case-insensitive match on name or alias.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        self.name.to_lowercase() == query || self.aliases.iter().any(|a| a.to_lowercase() == query)
    }
}

/// A medicine with the dosage the clinic usually prescribes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineItem {
    /// Generic name and strength (e.g., "Amoxicillin 500mg")
    pub name: String,
    /// Common brand (e.g., "Novamox")
    pub brand: Option<String>,
    /// Drug class (e.g., "Antibiotic")
    pub class: String,
    /// Dosage code: morning-afternoon-night (e.g., "1-0-1") or "SOS"
    pub default_dosage: String,
    /// Duration code (e.g., "5 days")
    pub default_duration: String,
}

impl MedicineItem {
    pub fn new(
        name: impl Into<String>,
        class: impl Into<String>,
        default_dosage: impl Into<String>,
        default_duration: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            brand: None,
            class: class.into(),
            default_dosage: default_dosage.into(),
            default_duration: default_duration.into(),
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Exact, case-insensitive match on name or brand.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        self.name.to_lowercase() == query
            || self
                .brand
                .as_ref()
                .is_some_and(|b| b.to_lowercase() == query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedure_matches_alias() {
        let item = ProcedureItem::new("Root Canal Treatment", Decimal::from(3500))
            .with_aliases(&["RCT"]);
        assert!(item.matches("rct"));
        assert!(item.matches("root canal treatment"));
        assert!(!item.matches("root"));
    }

    #[test]
    fn test_medicine_matches_brand() {
        let item = MedicineItem::new("Amoxicillin 500mg", "Antibiotic", "1-0-1", "5 days")
            .with_brand("Novamox");
        assert!(item.matches("NOVAMOX"));
        assert!(item.matches("amoxicillin 500mg"));
        assert!(!item.matches("amox"));
    }
}
