//! Text rendering of the visit log, as shown in the sheet's `Visit Log`
//! column and on the patient screen.

use rust_decimal::Decimal;

use crate::models::{LogEntry, PaymentNote, Settlement, Visit};

/// Placeholder for an empty list.
const NONE: &str = "-";

/// Render a single log entry.
pub fn render_entry(entry: &LogEntry) -> String {
    match entry {
        LogEntry::Visit(visit) => render_visit(visit),
        LogEntry::Payment(note) => render_payment(note),
    }
}

/// Render the whole log, oldest first, entries separated by a blank line.
pub fn render_log(entries: &[LogEntry]) -> String {
    entries
        .iter()
        .map(render_entry)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_visit(visit: &Visit) -> String {
    let treatments: Vec<String> = visit
        .treatments
        .iter()
        .map(|t| format!("{} ({})", t.procedure, money(t.cost)))
        .collect();
    let teeth: Vec<String> = visit.affected_teeth.iter().map(|t| t.fdi()).collect();
    let meds: Vec<String> = visit
        .prescription
        .iter()
        .map(|m| format!("{} ({}) - {}", m.medicine, m.dosage, m.duration))
        .collect();

    format!(
        "📅 {}\nTx: {}\nTeeth: {}\nRx: {}\nPaid: {}",
        visit.date,
        list(&treatments),
        list(&teeth),
        list(&meds),
        money(visit.paid)
    )
}

fn render_payment(note: &PaymentNote) -> String {
    let label = match note.settlement {
        Settlement::Received => "Payment received",
        Settlement::Cleared => "Balance cleared",
    };
    format!("📅 {}\n{}: {}", note.date, label, money(note.amount))
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        NONE.to_string()
    } else {
        items.join(", ")
    }
}

/// Two-decimal amount.
pub fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrescriptionLine, TreatmentLine};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn visit() -> Visit {
        Visit {
            visit_id: "v1".into(),
            date: date(),
            affected_teeth: ["UR6", "LR8"].iter().map(|t| t.parse().unwrap()).collect(),
            diagnosis: BTreeSet::new(),
            treatments: vec![
                TreatmentLine::new("Scaling", Decimal::from(800)),
                TreatmentLine::new("RCT", Decimal::new(350050, 2)),
            ],
            prescription: vec![PrescriptionLine::new("Amoxicillin 500mg", "1-0-1", "5 days")],
            billed: Decimal::new(430050, 2),
            paid: Decimal::from(500),
            notes: String::new(),
            next_visit: None,
        }
    }

    #[test]
    fn test_render_visit() {
        let text = render_entry(&LogEntry::Visit(visit()));
        assert_eq!(
            text,
            "📅 2024-03-01\nTx: Scaling (800.00), RCT (3500.50)\nTeeth: 16, 48\nRx: Amoxicillin 500mg (1-0-1) - 5 days\nPaid: 500.00"
        );
    }

    #[test]
    fn test_render_empty_visit() {
        let mut empty = visit();
        empty.treatments.clear();
        empty.prescription.clear();
        empty.affected_teeth.clear();
        empty.paid = Decimal::ZERO;

        let text = render_entry(&LogEntry::Visit(empty));
        assert_eq!(text, "📅 2024-03-01\nTx: -\nTeeth: -\nRx: -\nPaid: 0.00");
    }

    #[test]
    fn test_render_payments() {
        let received = LogEntry::Payment(PaymentNote {
            date: date(),
            amount: Decimal::from(300),
            settlement: Settlement::Received,
        });
        let cleared = LogEntry::Payment(PaymentNote {
            date: date(),
            amount: Decimal::new(-5025, 2),
            settlement: Settlement::Cleared,
        });

        assert_eq!(render_entry(&received), "📅 2024-03-01\nPayment received: 300.00");
        assert_eq!(render_entry(&cleared), "📅 2024-03-01\nBalance cleared: -50.25");
    }

    #[test]
    fn test_render_log_separator() {
        let entries = vec![
            LogEntry::Visit(visit()),
            LogEntry::Payment(PaymentNote {
                date: date(),
                amount: Decimal::from(300),
                settlement: Settlement::Received,
            }),
        ];
        let text = render_log(&entries);
        assert_eq!(text.matches("📅").count(), 2);
        assert!(text.contains("Paid: 500.00\n\n📅 2024-03-01\nPayment received"));
        assert_eq!(render_log(&[]), "");
    }
}
