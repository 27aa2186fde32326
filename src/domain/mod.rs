//! Domain entities, value objects and the ports they are stored behind.

pub mod audit;
pub mod clock;
pub mod entry;
pub mod fee;
pub mod formula;
pub mod money;
pub mod patient_count;
pub mod ports;
pub mod procedure;
pub mod validation;

use serde::{Deserialize, Serialize};

/// Staff member identifier (creators, validators, fee beneficiaries).
pub type StaffId = u32;

/// Identifier shared by validatable records and formulas.
pub type RecordId = u64;

/// Patient identifier.
pub type PatientId = u64;

/// Clinic department / service type a record or formula belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceUnit {
    General,
    Dental,
    Laboratory,
    Pharmacy,
    Emergency,
    Maternity,
}

/// Work shift a procedure or patient count is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Morning,
    Afternoon,
    Night,
}
