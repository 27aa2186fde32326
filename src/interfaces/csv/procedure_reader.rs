use crate::domain::procedure::ProcedureRecord;
use crate::domain::{PatientId, RecordId, ServiceUnit, Shift, StaffId};
use crate::error::{FeeError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct ProcedureRow {
    id: RecordId,
    date: NaiveDate,
    patient: PatientId,
    unit: ServiceUnit,
    shift: Shift,
    physician: Option<StaffId>,
    attendant: Option<StaffId>,
    price: i64,
    created_by: StaffId,
}

impl ProcedureRow {
    fn into_record(self) -> Result<ProcedureRecord> {
        ProcedureRecord::new(
            self.id,
            self.date,
            self.patient,
            self.unit,
            self.shift,
            self.physician,
            self.attendant,
            self.price,
            self.created_by,
        )
    }
}

/// Reads procedure submissions from a CSV source. Physician and attendant
/// columns may be empty.
pub struct ProcedureReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ProcedureReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn procedures(self) -> impl Iterator<Item = Result<ProcedureRecord>> {
        self.reader.into_deserialize::<ProcedureRow>().map(|row| {
            row.map_err(FeeError::from)
                .and_then(ProcedureRow::into_record)
        })
    }
}
