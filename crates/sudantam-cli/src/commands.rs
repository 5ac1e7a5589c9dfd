//! Subcommand handlers.

use anyhow::{anyhow, bail, Context};
use rust_decimal::Decimal;

use sudantam_core::export::{DuesReport, Invoice};
use sudantam_core::ledger::{money, render_log, teeth_history, Ledger, PatientDetails, SortKey};
use sudantam_core::models::{Gender, Patient, PatientIntake, VisitDraft};
use sudantam_core::store::{CsvStore, PatientStore, SqliteStore};
use sudantam_core::{to_fdi, Catalog};

use crate::settings::{Settings, StoreKind};
use crate::Command;

type CliLedger = Ledger<Box<dyn PatientStore>>;

fn open(settings: &Settings) -> anyhow::Result<CliLedger> {
    let store: Box<dyn PatientStore> = match settings.store {
        StoreKind::Sqlite => Box::new(
            SqliteStore::open(&settings.path)
                .with_context(|| format!("cannot open {}", settings.path.display()))?,
        ),
        StoreKind::Csv => Box::new(CsvStore::new(&settings.path)),
    };
    Ok(Ledger::with_config(store, settings.ledger.clone()))
}

fn parse_gender(value: &str) -> anyhow::Result<Gender> {
    value.parse::<Gender>().map_err(|e| anyhow!(e))
}

pub fn run(settings: &Settings, command: Command) -> anyhow::Result<()> {
    let catalog = Catalog::default();
    let currency = settings.ledger.currency_symbol.as_str();

    match command {
        Command::Tooth { designator } => {
            println!("{}", to_fdi(&designator)?);
        }
        Command::Catalog { query, limit } => {
            for s in catalog.suggest_procedures(&query, limit) {
                println!("Tx  {:<30} {:>10}", s.item.name, money(s.item.default_price));
            }
            for s in catalog.suggest_medicines(&query, limit) {
                println!(
                    "Rx  {:<30} {} - {}",
                    s.item.name, s.item.default_dosage, s.item.default_duration
                );
            }
        }
        Command::Register {
            name,
            age,
            gender,
            contact,
            conditions,
        } => {
            let mut intake = PatientIntake::new(name, age)
                .with_gender(parse_gender(&gender)?)
                .with_contact(contact);
            intake.medical_history = conditions;
            let patient = open(settings)?.register_patient(intake)?;
            println!("Registered #{} {}", patient.id, patient.name);
        }
        Command::Update {
            id,
            name,
            age,
            gender,
            contact,
            conditions,
        } => {
            let details = PatientDetails {
                name,
                age,
                gender: gender.as_deref().map(parse_gender).transpose()?,
                contact,
                medical_history: conditions,
            };
            let patient = open(settings)?.update_patient(id, details)?;
            print_patient(&patient, currency);
        }
        Command::Visit {
            id,
            teeth,
            diagnoses,
            treatments,
            prescriptions,
            paid,
            notes,
            next,
            draft_id,
        } => {
            let mut draft = VisitDraft::new();
            if let Some(draft_id) = draft_id {
                draft.draft_id = draft_id;
            }
            for tooth in &teeth {
                draft.add_tooth(tooth)?;
            }
            for tag in diagnoses {
                draft.add_diagnosis(tag);
            }
            for tx in &treatments {
                add_treatment(&mut draft, &catalog, tx)?;
            }
            for rx in &prescriptions {
                add_prescription(&mut draft, &catalog, rx)?;
            }
            draft.paid_now = paid;
            draft.notes = notes;
            draft.next_visit = next;

            let receipt = open(settings)?.record_visit(id, &draft)?;
            println!(
                "Visit {} billed {cur} {} paid {cur} {} pending {cur} {}",
                receipt.visit.visit_id,
                money(receipt.visit.billed),
                money(receipt.visit.paid),
                money(receipt.pending_amount),
                cur = currency
            );
        }
        Command::Pay { id, amount } => {
            let pending = open(settings)?.record_payment(id, amount)?;
            println!("Pending {} {}", currency, money(pending));
        }
        Command::Clear { id } => match open(settings)?.clear_balance(id)? {
            Some(amount) => println!("Cleared {} {}", currency, money(amount)),
            None => println!("Nothing to clear"),
        },
        Command::Search { query, sort } => {
            let sort: SortKey = sort.parse().map_err(|e: String| anyhow!(e))?;
            for patient in open(settings)?.search_patients(&query, sort)? {
                print_row(&patient, currency);
            }
        }
        Command::Show { id } => {
            let patient = open(settings)?.get_patient(id)?;
            print_patient(&patient, currency);
            let teeth: Vec<String> = teeth_history(&patient).iter().map(|t| t.fdi()).collect();
            if !teeth.is_empty() {
                println!("Teeth treated {}", teeth.join(", "));
            }
            if !patient.visit_log.is_empty() {
                println!("\n{}", render_log(&patient.visit_log));
            }
        }
        Command::Dues { csv } => {
            let ledger = open(settings)?;
            let patients = ledger.list_patients()?;
            let report = DuesReport::new(&patients, ledger.today(), currency);
            if csv {
                print!("{}", report.to_csv());
            } else {
                for row in &report.rows {
                    println!(
                        "#{:<5} {:<24} {:<12} {} {}",
                        row.patient_id,
                        row.name,
                        row.contact,
                        currency,
                        money(row.pending_amount)
                    );
                }
                println!("Total {} {}", currency, money(report.total_pending));
            }
        }
        Command::Delete { id } => {
            let removed = open(settings)?.delete_patient(id)?;
            println!("Deleted #{} {}", removed.id, removed.name);
        }
        Command::Invoice { id, format } => {
            let patient = open(settings)?.get_patient(id)?;
            let invoice = Invoice::for_latest_visit(&patient, currency)
                .ok_or_else(|| anyhow!("patient #{} has no visits", id))?;
            match format.as_str() {
                "text" => print!("{}", invoice.to_text()),
                "json" => println!("{}", invoice.to_json()?),
                "csv" => print!("{}", invoice.to_csv()),
                other => bail!("unknown invoice format: {}", other),
            }
        }
        Command::Verify { id } => {
            if open(settings)?.verify_history(id)? {
                println!("Log intact");
            } else {
                bail!("visit log of #{} does not match its hash chain", id);
            }
        }
    }
    Ok(())
}

/// `"Scaling"` takes the catalog fee; `"RCT=4000"` sets the fee. A priced
/// entry keeps the typed name unless it is exactly a catalog name or alias.
fn add_treatment(draft: &mut VisitDraft, catalog: &Catalog, arg: &str) -> anyhow::Result<()> {
    let (name, price) = match arg.split_once('=') {
        Some((name, price)) => {
            let price: Decimal = price
                .trim()
                .parse()
                .with_context(|| format!("bad price in {:?}", arg))?;
            (name.trim(), Some(price))
        }
        None => (arg.trim(), None),
    };

    match price {
        Some(price) => match catalog.procedures().iter().find(|item| item.matches(name)) {
            Some(item) => draft.add_procedure(item, Some(price)),
            None => draft.add_treatment(name, price),
        },
        None => {
            let item = catalog
                .find_procedure(name)
                .ok_or_else(|| anyhow!("unknown procedure {:?}; give a price as NAME=PRICE", name))?;
            draft.add_procedure(item, None);
        }
    }
    Ok(())
}

/// A catalog medicine, or `"name|dosage|duration"`.
fn add_prescription(draft: &mut VisitDraft, catalog: &Catalog, arg: &str) -> anyhow::Result<()> {
    let parts: Vec<&str> = arg.split('|').map(str::trim).collect();
    match parts.as_slice() {
        [name, dosage, duration] => draft.add_prescription(*name, *dosage, *duration),
        [name] => {
            let item = catalog
                .find_medicine(name)
                .ok_or_else(|| anyhow!("unknown medicine {:?}; use NAME|DOSAGE|DURATION", name))?;
            draft.add_medicine(item);
        }
        _ => bail!("expected NAME or NAME|DOSAGE|DURATION, got {:?}", arg),
    }
    Ok(())
}

fn print_row(patient: &Patient, currency: &str) {
    println!(
        "#{:<5} {:<24} {:<12} {} {} {}",
        patient.id,
        patient.name,
        patient.contact,
        patient.last_visit,
        currency,
        money(patient.pending_amount)
    );
}

fn print_patient(patient: &Patient, currency: &str) {
    println!("#{} {}", patient.id, patient.name);
    println!("Age {} {}", patient.age, patient.gender);
    if !patient.contact.is_empty() {
        println!("Contact {}", patient.contact);
    }
    if !patient.medical_history.is_empty() {
        let history: Vec<&str> = patient.medical_history.iter().map(String::as_str).collect();
        println!("History {}", history.join(", "));
    }
    println!("Last visit {}", patient.last_visit);
    if let Some(next) = patient.next_visit {
        println!("Next visit {}", next);
    }
    println!("Pending {} {}", currency, money(patient.pending_amount));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_treatment_from_catalog() {
        let catalog = Catalog::default();
        let mut draft = VisitDraft::new();
        add_treatment(&mut draft, &catalog, "scaling").unwrap();
        add_treatment(&mut draft, &catalog, "RCT=4000").unwrap();
        add_treatment(&mut draft, &catalog, "Night guard=2500").unwrap();

        assert_eq!(draft.treatments[0].procedure, "Scaling");
        assert_eq!(draft.treatments[0].cost, Decimal::from(800));
        assert_eq!(draft.treatments[1].cost, Decimal::from(4000));
        assert_eq!(draft.treatments[2].procedure, "Night guard");
        assert_eq!(draft.billed(), Some(Decimal::from(7300)));
    }

    #[test]
    fn test_add_treatment_priced_keeps_typed_name() {
        let catalog = Catalog::default();
        let mut draft = VisitDraft::new();
        add_treatment(&mut draft, &catalog, "Post=1200").unwrap();
        add_treatment(&mut draft, &catalog, "Crowns=5000").unwrap();
        add_treatment(&mut draft, &catalog, "rct = 4200").unwrap();

        assert_eq!(draft.treatments[0].procedure, "Post");
        assert_eq!(draft.treatments[0].cost, Decimal::from(1200));
        assert_eq!(draft.treatments[1].procedure, "Crowns");
        assert_eq!(draft.treatments[1].cost, Decimal::from(5000));
        assert_eq!(draft.treatments[2].procedure, "RCT");
        assert_eq!(draft.treatments[2].cost, Decimal::from(4200));
    }

    #[test]
    fn test_add_treatment_unknown_without_price() {
        let catalog = Catalog::default();
        let mut draft = VisitDraft::new();
        assert!(add_treatment(&mut draft, &catalog, "Xylophone therapy").is_err());
        assert!(add_treatment(&mut draft, &catalog, "RCT=lots").is_err());
        assert!(draft.treatments.is_empty());
    }

    fn csv_settings(dir: &tempfile::TempDir) -> Settings {
        Settings {
            store: StoreKind::Csv,
            path: dir.path().join("patients.csv"),
            ..Settings::default()
        }
    }

    #[test]
    fn test_run_without_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings {
            path: dir.path().join("missing").join("sudantam.db"),
            ..Settings::default()
        };

        run(&settings, Command::Tooth { designator: "UR6".into() }).unwrap();
        run(
            &settings,
            Command::Catalog {
                query: "crown".into(),
                limit: 3,
            },
        )
        .unwrap();
        assert!(run(&settings, Command::Show { id: 101 }).is_err());
    }

    #[test]
    fn test_run_visit_and_show() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = csv_settings(&dir);

        run(
            &settings,
            Command::Register {
                name: "Asha Rao".into(),
                age: 30,
                gender: "f".into(),
                contact: "98450 12345".into(),
                conditions: vec!["Allergy: penicillin, sulfa".into()],
            },
        )
        .unwrap();
        run(
            &settings,
            Command::Visit {
                id: 101,
                teeth: vec!["UR6".into(), "31".into()],
                diagnoses: vec!["Caries".into()],
                treatments: vec!["Post=1200".into()],
                prescriptions: vec![],
                paid: Decimal::from(200),
                notes: String::new(),
                next: None,
                draft_id: None,
            },
        )
        .unwrap();
        run(&settings, Command::Show { id: 101 }).unwrap();
        run(&settings, Command::Verify { id: 101 }).unwrap();

        let patients = CsvStore::new(&settings.path).load_all().unwrap();
        let asha = &patients[0];
        assert_eq!(asha.pending_amount, Decimal::from(1000));
        assert!(asha.medical_history.contains("Allergy: penicillin, sulfa"));
        let teeth: Vec<String> = teeth_history(asha).iter().map(|t| t.fdi()).collect();
        assert_eq!(teeth, vec!["16", "31"]);
    }

    #[test]
    fn test_add_prescription() {
        let catalog = Catalog::default();
        let mut draft = VisitDraft::new();
        add_prescription(&mut draft, &catalog, "Amoxicillin 500mg").unwrap();
        add_prescription(&mut draft, &catalog, "Chlorhexidine mouthwash | 10ml BD | 7 days").unwrap();

        assert_eq!(draft.prescription[0].dosage, "1-0-1");
        assert_eq!(draft.prescription[1].medicine, "Chlorhexidine mouthwash");
        assert_eq!(draft.prescription[1].duration, "7 days");
        assert!(add_prescription(&mut draft, &catalog, "a|b").is_err());
    }
}
