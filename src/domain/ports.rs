use crate::domain::RecordId;
use crate::domain::audit::AuditEntry;
use crate::domain::entry::FinancialEntry;
use crate::domain::fee::{FeeBasis, FeeKey, FeeNotification, FeeRecord, JobFailure};
use crate::domain::formula::FeeFormula;
use crate::domain::patient_count::DailyPatientCount;
use crate::domain::procedure::ProcedureRecord;
use crate::domain::{ServiceUnit, Shift};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait FinancialEntryRepository: Send + Sync {
    async fn store(&self, entry: FinancialEntry) -> Result<()>;
    async fn get(&self, id: RecordId) -> Result<Option<FinancialEntry>>;
}

#[async_trait]
pub trait ProcedureRepository: Send + Sync {
    async fn store(&self, record: ProcedureRecord) -> Result<()>;
    async fn get(&self, id: RecordId) -> Result<Option<ProcedureRecord>>;
}

#[async_trait]
pub trait PatientCountRepository: Send + Sync {
    async fn store(&self, count: DailyPatientCount) -> Result<()>;
    async fn get(&self, id: RecordId) -> Result<Option<DailyPatientCount>>;
}

#[async_trait]
pub trait FeeFormulaRepository: Send + Sync {
    async fn store(&self, formula: FeeFormula) -> Result<()>;
    /// Active formulas for the tuple, in no particular order; the resolver
    /// sorts.
    async fn active_for(
        &self,
        unit: ServiceUnit,
        shift: Shift,
        basis: FeeBasis,
    ) -> Result<Vec<FeeFormula>>;
}

/// Outcome of the atomic create-if-absent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    AlreadyExists,
}

#[async_trait]
pub trait FeeRecordRepository: Send + Sync {
    /// Inserts unless a record with the same key already exists. The check
    /// and the insert must be atomic with respect to concurrent callers.
    async fn create_if_absent(&self, record: FeeRecord) -> Result<InsertOutcome>;
    async fn get(&self, key: &FeeKey) -> Result<Option<FeeRecord>>;
    /// Marks an existing record for re-review. No-op when the key is
    /// absent.
    async fn flag_for_review(&self, key: &FeeKey) -> Result<()>;
    /// Full ledger ordered by (date, beneficiary), for reporting.
    async fn all(&self) -> Result<Vec<FeeRecord>>;
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> Result<()>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, notification: &FeeNotification) -> Result<()>;
}

#[async_trait]
pub trait FailureQueue: Send + Sync {
    async fn push(&self, failure: JobFailure) -> Result<()>;
}

pub type EntryRepoRef = Arc<dyn FinancialEntryRepository>;
pub type ProcedureRepoRef = Arc<dyn ProcedureRepository>;
pub type PatientCountRepoRef = Arc<dyn PatientCountRepository>;
pub type FormulaRepoRef = Arc<dyn FeeFormulaRepository>;
pub type FeeRepoRef = Arc<dyn FeeRecordRepository>;
pub type AuditLogRef = Arc<dyn AuditLog>;
pub type NotifierRef = Arc<dyn Notifier>;
pub type FailureQueueRef = Arc<dyn FailureQueue>;
