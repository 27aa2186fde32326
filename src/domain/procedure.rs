use crate::domain::fee::{FeeBasis, FeeKey};
use crate::domain::money::Money;
use crate::domain::validation::ValidationState;
use crate::domain::{PatientId, RecordId, ServiceUnit, Shift, StaffId};
use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A clinical procedure performed on a patient, logged by staff and
/// validated before it is trusted for fee generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureRecord {
    pub id: RecordId,
    pub date: NaiveDate,
    pub patient: PatientId,
    pub unit: ServiceUnit,
    pub shift: Shift,
    pub physician: Option<StaffId>,
    pub attendant: Option<StaffId>,
    pub price: Money,
    pub created_by: StaffId,
    pub validation: ValidationState,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProcedureRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RecordId,
        date: NaiveDate,
        patient: PatientId,
        unit: ServiceUnit,
        shift: Shift,
        physician: Option<StaffId>,
        attendant: Option<StaffId>,
        price: i64,
        created_by: StaffId,
    ) -> Result<Self> {
        Ok(Self {
            id,
            date,
            patient,
            unit,
            shift,
            physician,
            attendant,
            price: Money::non_negative(price)?,
            created_by,
            validation: ValidationState::pending(),
            deleted_at: None,
        })
    }

    /// The staff member the fee accrues to: the physician when present,
    /// otherwise the attendant. A procedure with neither owes no fee.
    pub fn beneficiary(&self) -> Option<StaffId> {
        self.physician.or(self.attendant)
    }

    pub fn fee_key(&self) -> Option<FeeKey> {
        Some(FeeKey {
            beneficiary: self.beneficiary()?,
            date: self.date,
            basis: FeeBasis::Procedure,
        })
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
