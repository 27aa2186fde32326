use crate::domain::validation::ValidationStatus;
use crate::domain::{RecordId, StaffId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    FinancialEntry,
    Procedure,
    PatientCount,
    Fee,
}

/// Append-only record of a validation transition.
///
/// Revert reasons live here rather than on the record's single current
/// comment field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub record_type: RecordType,
    pub record_id: RecordId,
    pub actor: StaffId,
    pub from: ValidationStatus,
    pub to: ValidationStatus,
    pub comment: Option<String>,
    pub at: DateTime<Utc>,
}
