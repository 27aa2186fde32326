use crate::domain::money::Money;
use crate::domain::validation::ValidationState;
use crate::domain::{RecordId, Shift, StaffId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a fee pays against: one record per procedure, or one per approved
/// daily patient aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeBasis {
    Procedure,
    PatientCount,
}

impl FeeBasis {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Procedure => "per-procedure",
            Self::PatientCount => "daily-patient-count",
        }
    }
}

impl fmt::Display for FeeBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Identity a fee record is deduplicated on: at most one record may exist
/// per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeeKey {
    pub beneficiary: StaffId,
    pub date: NaiveDate,
    pub basis: FeeBasis,
}

/// The source record a fee was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum SourceRef {
    Procedure(RecordId),
    PatientCount(RecordId),
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Procedure(id) => write!(f, "procedure #{id}"),
            Self::PatientCount(id) => write!(f, "patient count #{id}"),
        }
    }
}

/// A computed service fee owed to a staff member.
///
/// Generated exclusively from approved source records, so it is created
/// directly in approved state with the source's approver as validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRecord {
    pub beneficiary: StaffId,
    pub date: NaiveDate,
    pub shift: Shift,
    pub basis: FeeBasis,
    pub amount: Money,
    pub description: String,
    pub source: SourceRef,
    pub validation: ValidationState,
    /// Set when the source record was reverted after this fee was
    /// generated; the record itself is kept.
    pub flagged_for_review: bool,
}

impl FeeRecord {
    pub fn key(&self) -> FeeKey {
        FeeKey {
            beneficiary: self.beneficiary,
            date: self.date,
            basis: self.basis,
        }
    }
}

/// State-transition event emitted when a fee-participating record becomes
/// approved; the dispatcher consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeTrigger {
    pub source: SourceRef,
    pub approved_by: StaffId,
    pub approved_at: DateTime<Utc>,
}

/// Payload pushed to the downstream messaging collaborator after fee
/// generation completes or fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeNotification {
    pub source: SourceRef,
    pub beneficiary: Option<StaffId>,
    pub amount: Option<Money>,
    pub status: FeeNotificationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeNotificationStatus {
    Generated,
    Failed,
}

/// Entry surfaced to the operator failure queue after a job exhausts its
/// retry budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub source: SourceRef,
    pub error: String,
    pub attempts: u32,
    pub at: DateTime<Utc>,
}
