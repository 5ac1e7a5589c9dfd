//! Built-in price list and formulary.

use rust_decimal::Decimal;

use crate::models::{MedicineItem, ProcedureItem};

/// Default procedure fees (₹).
pub fn default_procedures() -> Vec<ProcedureItem> {
    vec![
        // Diagnostic
        ProcedureItem::new("Consultation", Decimal::from(200)).with_aliases(&["checkup", "opd"]),
        ProcedureItem::new("IOPA X-Ray", Decimal::from(150)).with_aliases(&["xray", "x-ray", "iopa"]),
        ProcedureItem::new("OPG", Decimal::from(500)).with_aliases(&["panoramic x-ray"]),
        // Preventive / periodontal
        ProcedureItem::new("Scaling", Decimal::from(800)).with_aliases(&["cleaning", "oral prophylaxis"]),
        ProcedureItem::new("Fluoride Application", Decimal::from(500)),
        ProcedureItem::new("Pit and Fissure Sealant", Decimal::from(600)).with_aliases(&["sealant"]),
        ProcedureItem::new("Curettage", Decimal::from(1500)),
        // Restorative
        ProcedureItem::new("Restoration", Decimal::from(1000)).with_aliases(&["filling", "gic", "composite"]),
        ProcedureItem::new("RCT", Decimal::from(3500)).with_aliases(&["root canal", "root canal treatment"]),
        ProcedureItem::new("Re-RCT", Decimal::from(5000)).with_aliases(&["retreatment"]),
        ProcedureItem::new("Pulpectomy", Decimal::from(2000)),
        ProcedureItem::new("Post and Core", Decimal::from(1500)),
        // Prosthodontic
        ProcedureItem::new("PFM Crown", Decimal::from(4000)).with_aliases(&["crown", "cap"]),
        ProcedureItem::new("Zirconia Crown", Decimal::from(9000)).with_aliases(&["zirconia"]),
        ProcedureItem::new("Complete Denture", Decimal::from(15000)).with_aliases(&["cd", "denture"]),
        ProcedureItem::new("Removable Partial Denture", Decimal::from(3000)).with_aliases(&["rpd"]),
        ProcedureItem::new("Implant", Decimal::from(25000)),
        // Surgical
        ProcedureItem::new("Extraction", Decimal::from(800)).with_aliases(&["ext", "removal"]),
        ProcedureItem::new("Surgical Extraction", Decimal::from(3000)).with_aliases(&["impaction", "disimpaction"]),
        ProcedureItem::new("Incision and Drainage", Decimal::from(1000)).with_aliases(&["i&d"]),
        // Cosmetic
        ProcedureItem::new("Bleaching", Decimal::from(6000)).with_aliases(&["whitening"]),
    ]
}

/// Default formulary with the clinic's usual dosage codes.
pub fn default_medicines() -> Vec<MedicineItem> {
    vec![
        // Antibiotics
        MedicineItem::new("Amoxicillin 500mg", "Antibiotic", "1-0-1", "5 days").with_brand("Novamox"),
        MedicineItem::new("Amoxicillin + Clavulanate 625mg", "Antibiotic", "1-0-1", "5 days").with_brand("Augmentin"),
        MedicineItem::new("Metronidazole 400mg", "Antibiotic", "1-1-1", "5 days").with_brand("Metrogyl"),
        MedicineItem::new("Azithromycin 500mg", "Antibiotic", "1-0-0", "3 days").with_brand("Azithral"),
        // Analgesics
        MedicineItem::new("Ibuprofen + Paracetamol", "Analgesic", "1-0-1", "3 days").with_brand("Combiflam"),
        MedicineItem::new("Ketorolac 10mg", "Analgesic", "SOS", "3 days").with_brand("Ketorol DT"),
        MedicineItem::new("Aceclofenac + Paracetamol", "Analgesic", "1-0-1", "3 days").with_brand("Zerodol-P"),
        MedicineItem::new("Paracetamol 650mg", "Analgesic", "SOS", "3 days").with_brand("Dolo 650"),
        // Gastroprotective
        MedicineItem::new("Pantoprazole 40mg", "Antacid", "1-0-0", "5 days").with_brand("Pan 40"),
        // Topical / rinses
        MedicineItem::new("Chlorhexidine Mouthwash 0.2%", "Antiseptic", "1-0-1", "7 days").with_brand("Hexidine"),
        MedicineItem::new("Lignocaine Gel 2%", "Local Anaesthetic", "SOS", "5 days").with_brand("Dologel"),
        MedicineItem::new("Potassium Nitrate Toothpaste", "Desensitizer", "1-0-1", "30 days").with_brand("Sensodyne"),
    ]
}
