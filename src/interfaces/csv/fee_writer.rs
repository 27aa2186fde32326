use crate::domain::fee::{FeeBasis, FeeRecord};
use crate::domain::validation::ValidationStatus;
use crate::domain::{Shift, StaffId};
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct LedgerRow<'a> {
    beneficiary: StaffId,
    date: NaiveDate,
    shift: Shift,
    basis: FeeBasis,
    amount: i64,
    status: ValidationStatus,
    flagged: bool,
    description: &'a str,
}

/// Writes the computed fee ledger as CSV.
pub struct FeeLedgerWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> FeeLedgerWriter<W> {
    pub fn new(dest: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(dest),
        }
    }

    pub fn write_records(&mut self, records: Vec<FeeRecord>) -> Result<()> {
        for record in &records {
            self.writer.serialize(LedgerRow {
                beneficiary: record.beneficiary,
                date: record.date,
                shift: record.shift,
                basis: record.basis,
                amount: record.amount.units(),
                status: record.validation.status,
                flagged: record.flagged_for_review,
                description: &record.description,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
