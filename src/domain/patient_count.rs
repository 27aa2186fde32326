use crate::domain::fee::{FeeBasis, FeeKey};
use crate::domain::validation::ValidationState;
use crate::domain::{RecordId, ServiceUnit, Shift, StaffId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregated count of patients seen per unit, day, shift and physician.
///
/// Drives the per-day aggregate fee path, distinct from the per-procedure
/// path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPatientCount {
    pub id: RecordId,
    pub date: NaiveDate,
    pub unit: ServiceUnit,
    pub shift: Shift,
    pub physician: StaffId,
    pub general: u32,
    pub insured: u32,
    pub created_by: StaffId,
    pub validation: ValidationState,
}

impl DailyPatientCount {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RecordId,
        date: NaiveDate,
        unit: ServiceUnit,
        shift: Shift,
        physician: StaffId,
        general: u32,
        insured: u32,
        created_by: StaffId,
    ) -> Self {
        Self {
            id,
            date,
            unit,
            shift,
            physician,
            general,
            insured,
            created_by,
            validation: ValidationState::pending(),
        }
    }

    /// Observed quantity for fee purposes: general plus insured patients.
    pub fn total(&self) -> u32 {
        self.general.saturating_add(self.insured)
    }

    pub fn fee_key(&self) -> FeeKey {
        FeeKey {
            beneficiary: self.physician,
            date: self.date,
            basis: FeeBasis::PatientCount,
        }
    }
}
