//! Property tests for the running balance.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use sudantam_core::ledger::PatientBook;
use sudantam_core::models::{PatientIntake, VisitDraft};
use sudantam_core::LedgerConfig;

#[derive(Debug, Clone)]
enum Op {
    Visit { costs: Vec<u32>, paid: u32 },
    Payment(u32),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (prop::collection::vec(0u32..500_000, 0..4), 0u32..600_000)
            .prop_map(|(costs, paid)| Op::Visit { costs, paid }),
        2 => (0u32..300_000).prop_map(Op::Payment),
        1 => Just(Op::Clear),
    ]
}

fn paise(n: u32) -> Decimal {
    Decimal::new(n as i64, 2)
}

proptest! {
    #[test]
    fn pending_matches_reference(ops in prop::collection::vec(op(), 0..30), capped in any::<bool>()) {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let config = LedgerConfig { cap_payments_at_pending: capped, ..LedgerConfig::default() };
        let mut book = PatientBook::default();
        let id = book.register(PatientIntake::new("Asha", 30), today, &config).unwrap().id;

        let mut expected = Decimal::ZERO;
        let mut entries = 0usize;

        for op in ops {
            match op {
                Op::Visit { costs, paid } => {
                    let mut draft = VisitDraft::new();
                    for cost in &costs {
                        draft.add_treatment("Procedure", paise(*cost));
                    }
                    draft.paid_now = paise(paid);
                    book.record_visit(id, &draft, today).unwrap();
                    expected += costs.iter().map(|c| paise(*c)).sum::<Decimal>() - paise(paid);
                    entries += 1;
                }
                Op::Payment(amount) => {
                    let amount = paise(amount);
                    let result = book.record_payment(id, amount, today, &config);
                    if capped && amount > expected {
                        prop_assert!(result.is_err());
                    } else {
                        prop_assert_eq!(result.unwrap(), expected - amount);
                        expected -= amount;
                        entries += 1;
                    }
                }
                Op::Clear => {
                    if book.clear_balance(id, today).unwrap().is_some() {
                        entries += 1;
                    }
                    expected = Decimal::ZERO;
                }
            }

            let patient = book.get(id).unwrap();
            prop_assert_eq!(patient.pending_amount, expected);
            prop_assert_eq!(patient.log_balance(), expected);
            prop_assert_eq!(patient.visit_log.len(), entries);
        }
    }
}
