use crate::domain::money::Money;
use crate::domain::validation::ValidationState;
use crate::domain::{RecordId, StaffId};
use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Revenue,
    Expense,
}

/// Bookkeeping category of a revenue or expense line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryCategory {
    Consultation,
    MedicineSales,
    LabServices,
    Salaries,
    Supplies,
    Utilities,
    Other,
}

/// A revenue or expense line item awaiting validation.
///
/// Entries are never hard-deleted; `deleted_at` marks removal while the row
/// is kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialEntry {
    pub id: RecordId,
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub category: EntryCategory,
    pub amount: Money,
    pub note: String,
    pub created_by: StaffId,
    pub validation: ValidationState,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl FinancialEntry {
    pub fn new(
        id: RecordId,
        date: NaiveDate,
        kind: EntryKind,
        category: EntryCategory,
        amount: i64,
        note: impl Into<String>,
        created_by: StaffId,
    ) -> Result<Self> {
        Ok(Self {
            id,
            date,
            kind,
            category,
            amount: Money::non_negative(amount)?,
            note: note.into(),
            created_by,
            validation: ValidationState::pending(),
            deleted_at: None,
        })
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
