use crate::application::dispatcher::{DispatchOutcome, FeeDispatcher};
use crate::domain::RecordId;
use crate::domain::StaffId;
use crate::domain::audit::{AuditEntry, RecordType};
use crate::domain::clock::{Clock, SharedClock};
use crate::domain::entry::FinancialEntry;
use crate::domain::fee::{FeeRecord, FeeTrigger, SourceRef};
use crate::domain::patient_count::DailyPatientCount;
use crate::domain::ports::{
    AuditLog, AuditLogRef, EntryRepoRef, FeeRecordRepository, FeeRepoRef,
    FinancialEntryRepository, PatientCountRepoRef, PatientCountRepository, ProcedureRepoRef,
    ProcedureRepository,
};
use crate::domain::procedure::ProcedureRecord;
use crate::domain::validation::ValidationStatus;
use crate::error::{FeeError, Result};

/// The entry point for the validation workflow.
///
/// `ValidationEngine` owns the record repositories, the audit log and the
/// fee dispatcher. Approving a ProcedureRecord or DailyPatientCount
/// schedules fee generation; approving a FinancialEntry never does.
pub struct ValidationEngine {
    entries: EntryRepoRef,
    procedures: ProcedureRepoRef,
    counts: PatientCountRepoRef,
    fees: FeeRepoRef,
    audit: AuditLogRef,
    dispatcher: FeeDispatcher,
    clock: SharedClock,
}

impl ValidationEngine {
    pub fn new(
        entries: EntryRepoRef,
        procedures: ProcedureRepoRef,
        counts: PatientCountRepoRef,
        fees: FeeRepoRef,
        audit: AuditLogRef,
        dispatcher: FeeDispatcher,
        clock: SharedClock,
    ) -> Self {
        Self {
            entries,
            procedures,
            counts,
            fees,
            audit,
            dispatcher,
            clock,
        }
    }

    // ---- submissions -----------------------------------------------------

    pub async fn submit_entry(&self, entry: FinancialEntry) -> Result<()> {
        self.entries.store(entry).await
    }

    pub async fn submit_procedure(&self, record: ProcedureRecord) -> Result<()> {
        self.procedures.store(record).await
    }

    pub async fn submit_patient_count(&self, count: DailyPatientCount) -> Result<()> {
        self.counts.store(count).await
    }

    // ---- financial entries: validation only, never fee generation --------

    pub async fn approve_entry(
        &self,
        id: RecordId,
        validator: StaffId,
        comment: Option<&str>,
    ) -> Result<()> {
        let mut entry = self.require_entry(id).await?;
        let from = entry.validation.status;
        entry.validation.approve(validator, self.clock.now(), comment)?;
        self.entries.store(entry).await?;
        self.record_transition(
            RecordType::FinancialEntry,
            id,
            validator,
            from,
            ValidationStatus::Approved,
            comment.map(str::to_owned),
        )
        .await
    }

    pub async fn reject_entry(&self, id: RecordId, validator: StaffId, comment: &str) -> Result<()> {
        let mut entry = self.require_entry(id).await?;
        let from = entry.validation.status;
        entry.validation.reject(validator, self.clock.now(), comment)?;
        self.entries.store(entry).await?;
        self.record_transition(
            RecordType::FinancialEntry,
            id,
            validator,
            from,
            ValidationStatus::Rejected,
            Some(comment.to_owned()),
        )
        .await
    }

    pub async fn revert_entry(&self, id: RecordId, actor: StaffId, reason: &str) -> Result<()> {
        let mut entry = self.require_entry(id).await?;
        let from = entry.validation.status;
        entry.validation.revert()?;
        self.entries.store(entry).await?;
        self.record_transition(
            RecordType::FinancialEntry,
            id,
            actor,
            from,
            ValidationStatus::Pending,
            Some(reason.to_owned()),
        )
        .await
    }

    pub async fn soft_delete_entry(&self, id: RecordId) -> Result<()> {
        let mut entry = self.require_entry(id).await?;
        entry.deleted_at = Some(self.clock.now());
        self.entries.store(entry).await
    }

    // ---- procedures: approval schedules per-procedure fee generation -----

    pub async fn approve_procedure(
        &self,
        id: RecordId,
        validator: StaffId,
        comment: Option<&str>,
    ) -> Result<DispatchOutcome> {
        let mut record = self.require_procedure(id).await?;
        let from = record.validation.status;
        let approved_at = self.clock.now();
        record.validation.approve(validator, approved_at, comment)?;
        self.procedures.store(record).await?;
        self.record_transition(
            RecordType::Procedure,
            id,
            validator,
            from,
            ValidationStatus::Approved,
            comment.map(str::to_owned),
        )
        .await?;

        let trigger = FeeTrigger {
            source: SourceRef::Procedure(id),
            approved_by: validator,
            approved_at,
        };
        self.dispatcher.dispatch(&trigger).await
    }

    pub async fn reject_procedure(
        &self,
        id: RecordId,
        validator: StaffId,
        comment: &str,
    ) -> Result<()> {
        let mut record = self.require_procedure(id).await?;
        let from = record.validation.status;
        record.validation.reject(validator, self.clock.now(), comment)?;
        self.procedures.store(record).await?;
        self.record_transition(
            RecordType::Procedure,
            id,
            validator,
            from,
            ValidationStatus::Rejected,
            Some(comment.to_owned()),
        )
        .await
    }

    /// Reverts an approved or rejected procedure back to pending. A fee
    /// generated from it is kept but flagged for re-review.
    pub async fn revert_procedure(&self, id: RecordId, actor: StaffId, reason: &str) -> Result<()> {
        let mut record = self.require_procedure(id).await?;
        let from = record.validation.status;
        record.validation.revert()?;
        let fee_key = record.fee_key();
        self.procedures.store(record).await?;
        self.record_transition(
            RecordType::Procedure,
            id,
            actor,
            from,
            ValidationStatus::Pending,
            Some(reason.to_owned()),
        )
        .await?;
        if let Some(key) = fee_key {
            self.fees.flag_for_review(&key).await?;
        }
        Ok(())
    }

    pub async fn soft_delete_procedure(&self, id: RecordId) -> Result<()> {
        let mut record = self.require_procedure(id).await?;
        record.deleted_at = Some(self.clock.now());
        self.procedures.store(record).await
    }

    // ---- patient counts: approval schedules the daily aggregate fee ------

    pub async fn approve_patient_count(
        &self,
        id: RecordId,
        validator: StaffId,
        comment: Option<&str>,
    ) -> Result<DispatchOutcome> {
        let mut count = self.require_count(id).await?;
        let from = count.validation.status;
        let approved_at = self.clock.now();
        count.validation.approve(validator, approved_at, comment)?;
        self.counts.store(count).await?;
        self.record_transition(
            RecordType::PatientCount,
            id,
            validator,
            from,
            ValidationStatus::Approved,
            comment.map(str::to_owned),
        )
        .await?;

        let trigger = FeeTrigger {
            source: SourceRef::PatientCount(id),
            approved_by: validator,
            approved_at,
        };
        self.dispatcher.dispatch(&trigger).await
    }

    pub async fn reject_patient_count(
        &self,
        id: RecordId,
        validator: StaffId,
        comment: &str,
    ) -> Result<()> {
        let mut count = self.require_count(id).await?;
        let from = count.validation.status;
        count.validation.reject(validator, self.clock.now(), comment)?;
        self.counts.store(count).await?;
        self.record_transition(
            RecordType::PatientCount,
            id,
            validator,
            from,
            ValidationStatus::Rejected,
            Some(comment.to_owned()),
        )
        .await
    }

    /// Reverts an approved or rejected patient count back to pending. A fee
    /// generated from it is kept but flagged for re-review.
    pub async fn revert_patient_count(
        &self,
        id: RecordId,
        actor: StaffId,
        reason: &str,
    ) -> Result<()> {
        let mut count = self.require_count(id).await?;
        let from = count.validation.status;
        count.validation.revert()?;
        let fee_key = count.fee_key();
        self.counts.store(count).await?;
        self.record_transition(
            RecordType::PatientCount,
            id,
            actor,
            from,
            ValidationStatus::Pending,
            Some(reason.to_owned()),
        )
        .await?;
        self.fees.flag_for_review(&fee_key).await
    }

    // ---- reporting -------------------------------------------------------

    pub async fn fee_records(&self) -> Result<Vec<FeeRecord>> {
        self.fees.all().await
    }

    // ---- helpers ---------------------------------------------------------

    async fn require_entry(&self, id: RecordId) -> Result<FinancialEntry> {
        let entry = self
            .entries
            .get(id)
            .await?
            .ok_or_else(|| FeeError::NotFound(format!("financial entry #{id}")))?;
        if entry.is_deleted() {
            return Err(FeeError::Validation(format!(
                "financial entry #{id} is deleted"
            )));
        }
        Ok(entry)
    }

    async fn require_procedure(&self, id: RecordId) -> Result<ProcedureRecord> {
        let record = self
            .procedures
            .get(id)
            .await?
            .ok_or_else(|| FeeError::NotFound(format!("procedure #{id}")))?;
        if record.is_deleted() {
            return Err(FeeError::Validation(format!("procedure #{id} is deleted")));
        }
        Ok(record)
    }

    async fn require_count(&self, id: RecordId) -> Result<DailyPatientCount> {
        self.counts
            .get(id)
            .await?
            .ok_or_else(|| FeeError::NotFound(format!("patient count #{id}")))
    }

    async fn record_transition(
        &self,
        record_type: RecordType,
        record_id: RecordId,
        actor: StaffId,
        from: ValidationStatus,
        to: ValidationStatus,
        comment: Option<String>,
    ) -> Result<()> {
        self.audit
            .append(AuditEntry {
                record_type,
                record_id,
                actor,
                from,
                to,
                comment,
                at: self.clock.now(),
            })
            .await
    }
}
