use rand::seq::SliceRandom;
use std::io::Error;
use std::path::Path;

pub fn write_formulas_csv(path: &Path) -> Result<(), Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "id",
        "unit",
        "shift",
        "basis",
        "active",
        "threshold",
        "mode",
        "base_amount",
        "multiplier",
    ])?;
    wtr.write_record([
        "1",
        "general",
        "morning",
        "patient_count",
        "true",
        "10",
        "progressive",
        "50000",
        "2000",
    ])?;
    wtr.write_record([
        "2", "dental", "morning", "procedure", "true", "0", "per_unit", "25000", "",
    ])?;
    wtr.flush()?;
    Ok(())
}

/// Counts for `physicians` doctors, `rows_per_physician` submissions each,
/// all on the same date and shift, written in shuffled order. Every row is
/// 15 general + 3 insured patients.
pub fn generate_counts_csv(
    path: &Path,
    physicians: u32,
    rows_per_physician: u32,
) -> Result<(), Error> {
    let mut rows = Vec::new();
    let mut id = 1u64;
    for physician in 1..=physicians {
        for _ in 0..rows_per_physician {
            rows.push((id, physician));
            id += 1;
        }
    }
    rows.shuffle(&mut rand::thread_rng());

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["id", "date", "unit", "shift", "physician", "general", "insured"])?;
    for (id, physician) in rows {
        wtr.write_record([
            &id.to_string(),
            "2026-03-02",
            "general",
            "morning",
            &physician.to_string(),
            "15",
            "3",
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
