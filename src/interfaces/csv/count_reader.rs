use crate::domain::patient_count::DailyPatientCount;
use crate::domain::{RecordId, ServiceUnit, Shift, StaffId};
use crate::error::{FeeError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct CountRow {
    id: RecordId,
    date: NaiveDate,
    unit: ServiceUnit,
    shift: Shift,
    physician: StaffId,
    general: u32,
    insured: u32,
}

impl From<CountRow> for DailyPatientCount {
    fn from(row: CountRow) -> Self {
        DailyPatientCount::new(
            row.id,
            row.date,
            row.unit,
            row.shift,
            row.physician,
            row.general,
            row.insured,
            row.physician,
        )
    }
}

/// Reads daily patient count submissions from a CSV source.
pub struct PatientCountReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PatientCountReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn counts(self) -> impl Iterator<Item = Result<DailyPatientCount>> {
        self.reader
            .into_deserialize::<CountRow>()
            .map(|row| row.map_err(FeeError::from).map(DailyPatientCount::from))
    }
}
