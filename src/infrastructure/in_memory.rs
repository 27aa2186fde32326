use crate::domain::RecordId;
use crate::domain::audit::AuditEntry;
use crate::domain::entry::FinancialEntry;
use crate::domain::fee::{FeeBasis, FeeKey, FeeNotification, FeeRecord, JobFailure};
use crate::domain::formula::FeeFormula;
use crate::domain::patient_count::DailyPatientCount;
use crate::domain::ports::{
    AuditLog, FailureQueue, FeeFormulaRepository, FeeRecordRepository, FinancialEntryRepository,
    InsertOutcome, Notifier, PatientCountRepository, ProcedureRepository,
};
use crate::domain::procedure::ProcedureRecord;
use crate::domain::{ServiceUnit, Shift};
use crate::error::{FeeError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// A thread-safe in-memory store for financial entries.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access. Ideal for
/// testing or small batch runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryEntryRepository {
    rows: Arc<RwLock<HashMap<RecordId, FinancialEntry>>>,
}

impl InMemoryEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FinancialEntryRepository for InMemoryEntryRepository {
    async fn store(&self, entry: FinancialEntry) -> Result<()> {
        let mut rows = self.rows.write().await;
        rows.insert(entry.id, entry);
        Ok(())
    }

    async fn get(&self, id: RecordId) -> Result<Option<FinancialEntry>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).cloned())
    }
}

/// A thread-safe in-memory store for procedure records.
#[derive(Default, Clone)]
pub struct InMemoryProcedureRepository {
    rows: Arc<RwLock<HashMap<RecordId, ProcedureRecord>>>,
}

impl InMemoryProcedureRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProcedureRepository for InMemoryProcedureRepository {
    async fn store(&self, record: ProcedureRecord) -> Result<()> {
        let mut rows = self.rows.write().await;
        rows.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: RecordId) -> Result<Option<ProcedureRecord>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).cloned())
    }
}

/// A thread-safe in-memory store for daily patient counts.
#[derive(Default, Clone)]
pub struct InMemoryPatientCountRepository {
    rows: Arc<RwLock<HashMap<RecordId, DailyPatientCount>>>,
}

impl InMemoryPatientCountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatientCountRepository for InMemoryPatientCountRepository {
    async fn store(&self, count: DailyPatientCount) -> Result<()> {
        let mut rows = self.rows.write().await;
        rows.insert(count.id, count);
        Ok(())
    }

    async fn get(&self, id: RecordId) -> Result<Option<DailyPatientCount>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&id).cloned())
    }
}

/// A thread-safe in-memory store for fee formulas.
#[derive(Default, Clone)]
pub struct InMemoryFormulaRepository {
    rows: Arc<RwLock<HashMap<RecordId, FeeFormula>>>,
}

impl InMemoryFormulaRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeeFormulaRepository for InMemoryFormulaRepository {
    async fn store(&self, formula: FeeFormula) -> Result<()> {
        let mut rows = self.rows.write().await;
        rows.insert(formula.id, formula);
        Ok(())
    }

    async fn active_for(
        &self,
        unit: ServiceUnit,
        shift: Shift,
        basis: FeeBasis,
    ) -> Result<Vec<FeeFormula>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|f| f.active && f.unit == unit && f.shift == shift && f.basis == basis)
            .cloned()
            .collect())
    }
}

/// A thread-safe in-memory store for fee records, keyed by
/// (beneficiary, date, basis).
///
/// `create_if_absent` holds the write lock across the check and the
/// insert, so concurrent dispatches for the same key cannot both create.
#[derive(Default, Clone)]
pub struct InMemoryFeeRepository {
    rows: Arc<RwLock<HashMap<FeeKey, FeeRecord>>>,
}

impl InMemoryFeeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeeRecordRepository for InMemoryFeeRepository {
    async fn create_if_absent(&self, record: FeeRecord) -> Result<InsertOutcome> {
        let mut rows = self.rows.write().await;
        match rows.entry(record.key()) {
            Entry::Occupied(_) => Ok(InsertOutcome::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(InsertOutcome::Created)
            }
        }
    }

    async fn get(&self, key: &FeeKey) -> Result<Option<FeeRecord>> {
        let rows = self.rows.read().await;
        Ok(rows.get(key).cloned())
    }

    async fn flag_for_review(&self, key: &FeeKey) -> Result<()> {
        let mut rows = self.rows.write().await;
        if let Some(record) = rows.get_mut(key) {
            record.flagged_for_review = true;
        }
        Ok(())
    }

    async fn all(&self) -> Result<Vec<FeeRecord>> {
        let rows = self.rows.read().await;
        let mut records: Vec<FeeRecord> = rows.values().cloned().collect();
        records.sort_by_key(|r| (r.date, r.beneficiary));
        Ok(records)
    }
}

/// Append-only in-memory audit log.
#[derive(Default, Clone)]
pub struct InMemoryAuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, entry: AuditEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }
}

/// Operator-visible failure queue held in memory.
#[derive(Default, Clone)]
pub struct InMemoryFailureQueue {
    items: Arc<RwLock<Vec<JobFailure>>>,
}

impl InMemoryFailureQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn items(&self) -> Vec<JobFailure> {
        self.items.read().await.clone()
    }
}

#[async_trait]
impl FailureQueue for InMemoryFailureQueue {
    async fn push(&self, failure: JobFailure) -> Result<()> {
        let mut items = self.items.write().await;
        items.push(failure);
        Ok(())
    }
}

/// Collects delivered notifications; the test double for the messaging
/// collaborator.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<FeeNotification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<FeeNotification> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, notification: &FeeNotification) -> Result<()> {
        let mut sent = self.sent.write().await;
        sent.push(notification.clone());
        Ok(())
    }
}

/// Always refuses delivery; proves delivery failures never leak into the
/// fee pipeline.
#[derive(Default, Clone, Copy)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn deliver(&self, _notification: &FeeNotification) -> Result<()> {
        Err(FeeError::Transient("notification channel unavailable".into()))
    }
}

/// Logs the payload instead of delivering it anywhere; used by the CLI.
#[derive(Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, notification: &FeeNotification) -> Result<()> {
        info!(
            source = %notification.source,
            beneficiary = ?notification.beneficiary,
            amount = ?notification.amount,
            status = ?notification.status,
            "fee notification"
        );
        Ok(())
    }
}
