use crate::domain::fee::FeeBasis;
use crate::domain::formula::{ComputationMode, FeeFormula};
use crate::domain::money::Money;
use crate::domain::{RecordId, ServiceUnit, Shift};
use crate::error::{FeeError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ModeColumn {
    Fixed,
    PerUnit,
    Progressive,
}

/// One row of the formula configuration file. `multiplier` only applies to
/// progressive formulas and defaults to zero; `created_at` defaults to the
/// epoch so ties fall through to the id.
#[derive(Debug, Deserialize)]
struct FormulaRow {
    id: RecordId,
    unit: ServiceUnit,
    shift: Shift,
    basis: FeeBasis,
    active: bool,
    threshold: u32,
    mode: ModeColumn,
    base_amount: i64,
    #[serde(default)]
    multiplier: Option<i64>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl FormulaRow {
    fn into_formula(self) -> Result<FeeFormula> {
        let mode = match self.mode {
            ModeColumn::Fixed => ComputationMode::Fixed,
            ModeColumn::PerUnit => ComputationMode::PerUnit,
            ModeColumn::Progressive => ComputationMode::Progressive {
                multiplier: Money::non_negative(self.multiplier.unwrap_or(0))?,
            },
        };
        Ok(FeeFormula {
            id: self.id,
            unit: self.unit,
            shift: self.shift,
            basis: self.basis,
            active: self.active,
            threshold: self.threshold,
            mode,
            base_amount: Money::non_negative(self.base_amount)?,
            created_at: self.created_at.unwrap_or(DateTime::UNIX_EPOCH),
        })
    }
}

/// Reads fee formula configuration from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record
/// lengths, yielding `Result<FeeFormula>` lazily.
pub struct FormulaReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> FormulaReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn formulas(self) -> impl Iterator<Item = Result<FeeFormula>> {
        self.reader.into_deserialize::<FormulaRow>().map(|row| {
            row.map_err(FeeError::from)
                .and_then(FormulaRow::into_formula)
        })
    }
}
