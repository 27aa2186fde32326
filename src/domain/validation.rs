use crate::domain::StaffId;
use crate::error::{FeeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Validation lifecycle attached to every financial and clinical record.
///
/// Invariant: approved/rejected always carry a validator and timestamp;
/// pending never does.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationState {
    pub status: ValidationStatus,
    pub validator: Option<StaffId>,
    pub validated_at: Option<DateTime<Utc>>,
    pub comment: Option<String>,
}

impl ValidationState {
    pub fn pending() -> Self {
        Self::default()
    }

    /// State for fee records generated from an already-approved source:
    /// created directly approved, never passing through manual review.
    pub fn approved_by(
        validator: StaffId,
        at: DateTime<Utc>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            status: ValidationStatus::Approved,
            validator: Some(validator),
            validated_at: Some(at),
            comment: Some(comment.into()),
        }
    }

    /// Allowed only from `pending`. The comment is optional.
    pub fn approve(
        &mut self,
        validator: StaffId,
        at: DateTime<Utc>,
        comment: Option<&str>,
    ) -> Result<()> {
        self.guard(ValidationStatus::Approved)?;
        self.status = ValidationStatus::Approved;
        self.validator = Some(validator);
        self.validated_at = Some(at);
        self.comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned);
        Ok(())
    }

    /// Allowed only from `pending`. A non-empty comment is mandatory;
    /// omission is a validation error, never silently defaulted.
    pub fn reject(&mut self, validator: StaffId, at: DateTime<Utc>, comment: &str) -> Result<()> {
        self.guard(ValidationStatus::Rejected)?;
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(FeeError::MissingValidationComment);
        }
        self.status = ValidationStatus::Rejected;
        self.validator = Some(validator);
        self.validated_at = Some(at);
        self.comment = Some(comment.to_owned());
        Ok(())
    }

    /// Administrative revert, allowed only from `approved` or `rejected`.
    /// Clears validator, timestamp and comment; the revert reason lives in
    /// the audit trail, not on the record.
    pub fn revert(&mut self) -> Result<()> {
        if self.status == ValidationStatus::Pending {
            return Err(FeeError::InvalidStateTransition {
                from: self.status,
                to: ValidationStatus::Pending,
            });
        }
        self.status = ValidationStatus::Pending;
        self.validator = None;
        self.validated_at = None;
        self.comment = None;
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.status == ValidationStatus::Pending
    }

    pub fn is_approved(&self) -> bool {
        self.status == ValidationStatus::Approved
    }

    fn guard(&self, to: ValidationStatus) -> Result<()> {
        if self.status != ValidationStatus::Pending {
            return Err(FeeError::InvalidStateTransition {
                from: self.status,
                to,
            });
        }
        Ok(())
    }
}
