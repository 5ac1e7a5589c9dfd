//! Read-only procedure and medicine catalog.
//!
//! Used by the front end to pre-fill treatment fees and prescription
//! dosages. Lookup is exact on name/alias first, then fuzzy so that a
//! typed "scalling" still finds "Scaling".

mod tables;

pub use tables::{default_medicines, default_procedures};

use strsim::{jaro_winkler, normalized_levenshtein};

use crate::models::{MedicineItem, ProcedureItem};

/// Minimum similarity for a fuzzy match to count as a hit.
pub const MATCH_THRESHOLD: f64 = 0.85;

/// A catalog item paired with its match score (0.0 - 1.0).
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion<'a, T> {
    pub item: &'a T,
    pub score: f64,
}

/// Static reference tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    procedures: Vec<ProcedureItem>,
    medicines: Vec<MedicineItem>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(default_procedures(), default_medicines())
    }
}

impl Catalog {
    pub fn new(procedures: Vec<ProcedureItem>, medicines: Vec<MedicineItem>) -> Self {
        Self {
            procedures,
            medicines,
        }
    }

    pub fn procedures(&self) -> &[ProcedureItem] {
        &self.procedures
    }

    pub fn medicines(&self) -> &[MedicineItem] {
        &self.medicines
    }

    /// Find a procedure by name or alias, falling back to the best fuzzy match.
    pub fn find_procedure(&self, query: &str) -> Option<&ProcedureItem> {
        if let Some(item) = self.procedures.iter().find(|p| p.matches(query)) {
            return Some(item);
        }
        self.suggest_procedures(query, 1)
            .into_iter()
            .next()
            .filter(|s| s.score >= MATCH_THRESHOLD)
            .map(|s| s.item)
    }

    /// Find a medicine by name or brand, falling back to the best fuzzy match.
    pub fn find_medicine(&self, query: &str) -> Option<&MedicineItem> {
        if let Some(item) = self.medicines.iter().find(|m| m.matches(query)) {
            return Some(item);
        }
        self.suggest_medicines(query, 1)
            .into_iter()
            .next()
            .filter(|s| s.score >= MATCH_THRESHOLD)
            .map(|s| s.item)
    }

    /// Rank procedures against a partial or misspelled query.
    pub fn suggest_procedures(&self, query: &str, limit: usize) -> Vec<Suggestion<'_, ProcedureItem>> {
        rank(&self.procedures, limit, |item| {
            let mut names = vec![item.name.as_str()];
            names.extend(item.aliases.iter().map(String::as_str));
            best_score(query, &names)
        })
    }

    /// Rank medicines against a partial or misspelled query.
    pub fn suggest_medicines(&self, query: &str, limit: usize) -> Vec<Suggestion<'_, MedicineItem>> {
        rank(&self.medicines, limit, |item| {
            let mut names = vec![item.name.as_str()];
            if let Some(brand) = &item.brand {
                names.push(brand.as_str());
            }
            best_score(query, &names)
        })
    }
}

fn rank<'a, T, F>(items: &'a [T], limit: usize, score: F) -> Vec<Suggestion<'a, T>>
where
    F: Fn(&T) -> f64,
{
    let mut suggestions: Vec<Suggestion<'a, T>> = items
        .iter()
        .map(|item| Suggestion {
            item,
            score: score(item),
        })
        .filter(|s| s.score > 0.0)
        .collect();

    suggestions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    suggestions.truncate(limit);
    suggestions
}

/// Best score of `query` against any of `names`. A name that starts with
/// the query scores as a full hit.
fn best_score(query: &str, names: &[&str]) -> f64 {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0.0;
    }

    names
        .iter()
        .map(|name| {
            let name = name.to_lowercase();
            if name.starts_with(&query) {
                1.0
            } else {
                fuzzy_match(&query, &name)
            }
        })
        .fold(0.0, f64::max)
}

/// Combined string similarity: Jaro-Winkler for typos, Levenshtein for overall shape.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    let jw = jaro_winkler(a, b);
    let lev = normalized_levenshtein(a, b);
    jw * 0.6 + lev * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_exact_lookup() {
        let catalog = Catalog::default();
        let item = catalog.find_procedure("scaling").unwrap();
        assert_eq!(item.name, "Scaling");
        assert_eq!(item.default_price, Decimal::from(800));
    }

    #[test]
    fn test_alias_lookup() {
        let catalog = Catalog::default();
        assert_eq!(catalog.find_procedure("root canal").unwrap().name, "RCT");
        assert_eq!(catalog.find_procedure("filling").unwrap().name, "Restoration");
    }

    #[test]
    fn test_typo_lookup() {
        let catalog = Catalog::default();
        assert_eq!(catalog.find_procedure("scalling").unwrap().name, "Scaling");
        assert_eq!(catalog.find_procedure("extracton").unwrap().name, "Extraction");
    }

    #[test]
    fn test_no_match() {
        let catalog = Catalog::default();
        assert!(catalog.find_procedure("appendectomy").is_none());
        assert!(catalog.find_procedure("").is_none());
    }

    #[test]
    fn test_medicine_lookup() {
        let catalog = Catalog::default();
        let item = catalog.find_medicine("combiflam").unwrap();
        assert_eq!(item.name, "Ibuprofen + Paracetamol");
        assert_eq!(item.default_dosage, "1-0-1");

        let item = catalog.find_medicine("Metrogil").unwrap();
        assert_eq!(item.name, "Metronidazole 400mg");
    }

    #[test]
    fn test_prefix_suggestions() {
        let catalog = Catalog::default();
        let suggestions = catalog.suggest_medicines("amox", 5);
        assert!(suggestions.len() >= 2);
        assert!(suggestions
            .iter()
            .take(2)
            .all(|s| s.item.name.starts_with("Amoxicillin")));
    }

    #[test]
    fn test_suggestion_limit() {
        let catalog = Catalog::default();
        assert_eq!(catalog.suggest_procedures("c", 3).len(), 3);
    }

    #[test]
    fn test_fuzzy_match() {
        assert!(fuzzy_match("scaling", "scaling") > 0.99);
        assert!(fuzzy_match("scalling", "scaling") > 0.85);
        assert!(fuzzy_match("implant", "scaling") < 0.6);
    }
}
