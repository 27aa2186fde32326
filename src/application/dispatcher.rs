use crate::application::calculator;
use crate::application::notify::NotificationHook;
use crate::application::resolver::FormulaResolver;
use crate::domain::audit::{AuditEntry, RecordType};
use crate::domain::clock::{Clock, SharedClock};
use crate::domain::fee::{
    FeeKey, FeeNotification, FeeNotificationStatus, FeeRecord, FeeTrigger, JobFailure, SourceRef,
};
use crate::domain::ports::{
    AuditLog, AuditLogRef, FailureQueue, FailureQueueRef, FeeRecordRepository, FeeRepoRef,
    FormulaRepoRef, InsertOutcome, NotifierRef, PatientCountRepoRef, PatientCountRepository,
    ProcedureRepoRef, ProcedureRepository,
};
use crate::domain::validation::{ValidationState, ValidationStatus};
use crate::domain::{RecordId, ServiceUnit, Shift};
use crate::error::{FeeError, Result};
use std::time::Duration;
use tracing::{error, info, warn};

const JOB_ATTEMPTS: u32 = 3;
const JOB_TIMEOUT: Duration = Duration::from_secs(60);
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Result of a fee-generation dispatch. Duplicate suppression and
/// below-threshold quantities are successes, not failures.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A fee record was created and auto-approved.
    Created(FeeRecord),
    /// A record already existed for the key; no-op success.
    DuplicateSuppressed,
    /// Quantity below every threshold, no active formula, or nobody to
    /// pay.
    NoFeeOwed,
    /// The job gave up; the failure sits in the operator queue.
    Escalated,
}

/// Everything the pipeline needs once the source record has been loaded.
struct FeeJob {
    key: FeeKey,
    unit: ServiceUnit,
    shift: Shift,
    quantity: u32,
    description: String,
    source_record_id: RecordId,
}

/// Generates fee records from approved source events, at most once per
/// (beneficiary, date, basis) key.
///
/// Callers may dispatch the same trigger more than once (at-least-once
/// delivery); the atomic key check keeps the ledger single-shot.
pub struct FeeDispatcher {
    procedures: ProcedureRepoRef,
    counts: PatientCountRepoRef,
    resolver: FormulaResolver,
    fees: FeeRepoRef,
    audit: AuditLogRef,
    failures: FailureQueueRef,
    hook: NotificationHook,
    clock: SharedClock,
}

impl FeeDispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        procedures: ProcedureRepoRef,
        counts: PatientCountRepoRef,
        formulas: FormulaRepoRef,
        fees: FeeRepoRef,
        audit: AuditLogRef,
        failures: FailureQueueRef,
        notifier: NotifierRef,
        clock: SharedClock,
    ) -> Self {
        Self {
            procedures,
            counts,
            resolver: FormulaResolver::new(formulas),
            fees,
            audit,
            failures,
            hook: NotificationHook::new(notifier),
            clock,
        }
    }

    /// Runs the fee-generation job for one trigger. Transient faults are
    /// retried with backoff under a per-attempt timeout; exhausted or
    /// non-retryable jobs land in the operator failure queue, never
    /// silently dropped.
    pub async fn dispatch(&self, trigger: &FeeTrigger) -> Result<DispatchOutcome> {
        let mut last_error = String::new();
        for attempt in 1..=JOB_ATTEMPTS {
            match tokio::time::timeout(JOB_TIMEOUT, self.generate(trigger)).await {
                Ok(Ok(outcome)) => return Ok(outcome),
                Ok(Err(e)) if !e.is_transient() => {
                    return self.escalate(trigger, e.to_string(), attempt).await;
                }
                Ok(Err(e)) => {
                    last_error = e.to_string();
                    warn!(attempt, source = %trigger.source, error = %last_error, "fee generation attempt failed");
                }
                Err(_) => {
                    last_error = format!("attempt timed out after {}s", JOB_TIMEOUT.as_secs());
                    warn!(attempt, source = %trigger.source, "fee generation attempt timed out");
                }
            }
            if attempt < JOB_ATTEMPTS {
                tokio::time::sleep(RETRY_BASE_DELAY * 2u32.pow(attempt - 1)).await;
            }
        }
        self.escalate(trigger, last_error, JOB_ATTEMPTS).await
    }

    async fn escalate(
        &self,
        trigger: &FeeTrigger,
        error: String,
        attempts: u32,
    ) -> Result<DispatchOutcome> {
        error!(source = %trigger.source, %error, attempts, "fee generation failed, surfacing to operator queue");
        self.failures
            .push(JobFailure {
                source: trigger.source,
                error,
                attempts,
                at: self.clock.now(),
            })
            .await?;
        self.hook
            .send(FeeNotification {
                source: trigger.source,
                beneficiary: None,
                amount: None,
                status: FeeNotificationStatus::Failed,
            })
            .await;
        Ok(DispatchOutcome::Escalated)
    }

    async fn generate(&self, trigger: &FeeTrigger) -> Result<DispatchOutcome> {
        let Some(job) = self.load(trigger).await? else {
            info!(source = %trigger.source, "no beneficiary, no fee owed");
            return Ok(DispatchOutcome::NoFeeOwed);
        };

        let formula = self
            .resolver
            .resolve(job.unit, job.shift, job.key.basis, job.quantity)
            .await?;
        let Some(formula) = formula else {
            info!(source = %trigger.source, quantity = job.quantity, "no applicable formula, no fee owed");
            return Ok(DispatchOutcome::NoFeeOwed);
        };

        let amount = calculator::compute(&formula, job.quantity)?;
        let comment = format!("auto-approved from {}", trigger.source);
        let record = FeeRecord {
            beneficiary: job.key.beneficiary,
            date: job.key.date,
            shift: job.shift,
            basis: job.key.basis,
            amount,
            description: job.description,
            source: trigger.source,
            validation: ValidationState::approved_by(
                trigger.approved_by,
                trigger.approved_at,
                comment.clone(),
            ),
            flagged_for_review: false,
        };

        match self.fees.create_if_absent(record.clone()).await? {
            InsertOutcome::AlreadyExists => {
                info!(source = %trigger.source, "fee already recorded for beneficiary/date/basis, suppressing duplicate");
                Ok(DispatchOutcome::DuplicateSuppressed)
            }
            InsertOutcome::Created => {
                self.audit
                    .append(AuditEntry {
                        record_type: RecordType::Fee,
                        record_id: job.source_record_id,
                        actor: trigger.approved_by,
                        from: ValidationStatus::Pending,
                        to: ValidationStatus::Approved,
                        comment: Some(comment),
                        at: self.clock.now(),
                    })
                    .await?;
                self.hook
                    .send(FeeNotification {
                        source: trigger.source,
                        beneficiary: Some(record.beneficiary),
                        amount: Some(record.amount),
                        status: FeeNotificationStatus::Generated,
                    })
                    .await;
                Ok(DispatchOutcome::Created(record))
            }
        }
    }

    async fn load(&self, trigger: &FeeTrigger) -> Result<Option<FeeJob>> {
        match trigger.source {
            SourceRef::Procedure(id) => {
                let record = self
                    .procedures
                    .get(id)
                    .await?
                    .ok_or_else(|| FeeError::Transient(format!("procedure #{id} not found")))?;
                ensure_approved(&record.validation, trigger.source)?;
                let Some(key) = record.fee_key() else {
                    return Ok(None);
                };
                Ok(Some(FeeJob {
                    key,
                    unit: record.unit,
                    shift: record.shift,
                    quantity: 1,
                    description: format!(
                        "Per-procedure fee for procedure #{id} on {}",
                        record.date
                    ),
                    source_record_id: id,
                }))
            }
            SourceRef::PatientCount(id) => {
                let count = self
                    .counts
                    .get(id)
                    .await?
                    .ok_or_else(|| FeeError::Transient(format!("patient count #{id} not found")))?;
                ensure_approved(&count.validation, trigger.source)?;
                Ok(Some(FeeJob {
                    key: count.fee_key(),
                    unit: count.unit,
                    shift: count.shift,
                    quantity: count.total(),
                    description: format!(
                        "Daily patient count fee for {} patients on {}",
                        count.total(),
                        count.date
                    ),
                    source_record_id: id,
                }))
            }
        }
    }
}

fn ensure_approved(validation: &ValidationState, source: SourceRef) -> Result<()> {
    if !validation.is_approved() {
        return Err(FeeError::Validation(format!("{source} is not approved")));
    }
    Ok(())
}
