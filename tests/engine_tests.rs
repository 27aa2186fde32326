use chrono::{TimeZone, Utc};
use jaspel::application::dispatcher::{DispatchOutcome, FeeDispatcher};
use jaspel::application::engine::ValidationEngine;
use jaspel::domain::audit::RecordType;
use jaspel::domain::clock::FixedClock;
use jaspel::domain::entry::{EntryCategory, EntryKind, FinancialEntry};
use jaspel::domain::fee::FeeBasis;
use jaspel::domain::formula::{ComputationMode, FeeFormula};
use jaspel::domain::money::Money;
use jaspel::domain::patient_count::DailyPatientCount;
use jaspel::domain::ports::{
    FeeFormulaRepository, FeeRecordRepository, NotifierRef, PatientCountRepository,
};
use jaspel::domain::procedure::ProcedureRecord;
use jaspel::domain::validation::ValidationStatus;
use jaspel::domain::{ServiceUnit, Shift};
use jaspel::error::FeeError;
use jaspel::infrastructure::in_memory::{
    FailingNotifier, InMemoryAuditLog, InMemoryEntryRepository, InMemoryFailureQueue,
    InMemoryFeeRepository, InMemoryFormulaRepository, InMemoryPatientCountRepository,
    InMemoryProcedureRepository, RecordingNotifier,
};
use std::sync::Arc;

const VALIDATOR: u32 = 9;

struct Harness {
    engine: ValidationEngine,
    formulas: Arc<InMemoryFormulaRepository>,
    counts: Arc<InMemoryPatientCountRepository>,
    fees: Arc<InMemoryFeeRepository>,
    audit: Arc<InMemoryAuditLog>,
}

fn build(notifier: NotifierRef) -> Harness {
    let entries = Arc::new(InMemoryEntryRepository::new());
    let procedures = Arc::new(InMemoryProcedureRepository::new());
    let counts = Arc::new(InMemoryPatientCountRepository::new());
    let formulas = Arc::new(InMemoryFormulaRepository::new());
    let fees = Arc::new(InMemoryFeeRepository::new());
    let audit = Arc::new(InMemoryAuditLog::new());
    let failures = Arc::new(InMemoryFailureQueue::new());
    let clock = Arc::new(FixedClock::at(
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
    ));

    let dispatcher = FeeDispatcher::new(
        procedures.clone(),
        counts.clone(),
        formulas.clone(),
        fees.clone(),
        audit.clone(),
        failures,
        notifier,
        clock.clone(),
    );
    let engine = ValidationEngine::new(
        entries,
        procedures,
        counts.clone(),
        fees.clone(),
        audit.clone(),
        dispatcher,
        clock,
    );
    Harness {
        engine,
        formulas,
        counts,
        fees,
        audit,
    }
}

fn harness() -> (Harness, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    (build(notifier.clone()), notifier)
}

fn patient_formula(id: u64, threshold: u32, mode: ComputationMode, base: i64) -> FeeFormula {
    FeeFormula {
        id,
        unit: ServiceUnit::General,
        shift: Shift::Morning,
        basis: FeeBasis::PatientCount,
        active: true,
        threshold,
        mode,
        base_amount: Money::new(base),
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn count(id: u64, physician: u32, general: u32) -> DailyPatientCount {
    DailyPatientCount::new(
        id,
        chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        ServiceUnit::General,
        Shift::Morning,
        physician,
        general,
        0,
        physician,
    )
}

#[tokio::test]
async fn test_daily_count_end_to_end() {
    let (h, notifier) = harness();
    h.formulas
        .store(patient_formula(
            1,
            10,
            ComputationMode::Progressive {
                multiplier: Money::new(2_000),
            },
            50_000,
        ))
        .await
        .unwrap();

    h.engine.submit_patient_count(count(1, 5, 18)).await.unwrap();
    let outcome = h
        .engine
        .approve_patient_count(1, VALIDATOR, Some("totals match the register"))
        .await
        .unwrap();
    assert!(matches!(outcome, DispatchOutcome::Created(_)));

    let ledger = h.engine.fee_records().await.unwrap();
    assert_eq!(ledger.len(), 1);
    let fee = &ledger[0];
    assert_eq!(fee.beneficiary, 5);
    assert_eq!(fee.amount, Money::new(66_000)); // 50000 + (18-10)*2000
    assert_eq!(fee.validation.status, ValidationStatus::Approved);
    assert_eq!(fee.validation.validator, Some(VALIDATOR));
    assert!(!fee.flagged_for_review);

    // The approver saw it succeed; the beneficiary got the message.
    assert_eq!(notifier.sent().await.len(), 1);

    // A second approval attempt fails loudly instead of double-paying.
    let err = h
        .engine
        .approve_patient_count(1, VALIDATOR, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FeeError::InvalidStateTransition {
            from: ValidationStatus::Approved,
            ..
        }
    ));
    assert_eq!(h.engine.fee_records().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_below_threshold_count_is_a_silent_noop() {
    let (h, notifier) = harness();
    h.formulas
        .store(patient_formula(1, 10, ComputationMode::Fixed, 50_000))
        .await
        .unwrap();

    h.engine.submit_patient_count(count(1, 5, 4)).await.unwrap();
    let outcome = h
        .engine
        .approve_patient_count(1, VALIDATOR, None)
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::NoFeeOwed);
    assert!(h.engine.fee_records().await.unwrap().is_empty());
    assert!(notifier.sent().await.is_empty());
}

#[tokio::test]
async fn test_revert_flags_fee_and_reapproval_stays_idempotent() {
    let (h, _) = harness();
    h.formulas
        .store(patient_formula(1, 0, ComputationMode::PerUnit, 5_000))
        .await
        .unwrap();

    h.engine.submit_patient_count(count(1, 5, 12)).await.unwrap();
    h.engine
        .approve_patient_count(1, VALIDATOR, None)
        .await
        .unwrap();

    h.engine
        .revert_patient_count(1, 11, "entered against the wrong shift")
        .await
        .unwrap();

    // The fee is kept, flagged for re-review rather than deleted.
    let ledger = h.engine.fee_records().await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert!(ledger[0].flagged_for_review);

    // The count is pending again with its validation fields cleared.
    let reverted = h.counts.get(1).await.unwrap().unwrap();
    assert!(reverted.validation.is_pending());
    assert!(reverted.validation.validator.is_none());

    // Re-approving after the revert must not produce a second record.
    let outcome = h
        .engine
        .approve_patient_count(1, VALIDATOR, None)
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::DuplicateSuppressed);
    assert_eq!(h.engine.fee_records().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reject_requires_comment() {
    let (h, _) = harness();
    h.engine.submit_patient_count(count(1, 5, 12)).await.unwrap();

    let err = h
        .engine
        .reject_patient_count(1, VALIDATOR, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, FeeError::MissingValidationComment));

    let stored = h.counts.get(1).await.unwrap().unwrap();
    assert!(stored.validation.is_pending());
    assert!(stored.validation.validator.is_none());
    assert!(stored.validation.validated_at.is_none());

    h.engine
        .reject_patient_count(1, VALIDATOR, "duplicate submission")
        .await
        .unwrap();
    let stored = h.counts.get(1).await.unwrap().unwrap();
    assert_eq!(stored.validation.status, ValidationStatus::Rejected);
    assert_eq!(stored.validation.validator, Some(VALIDATOR));
    assert!(stored.validation.validated_at.is_some());
}

#[tokio::test]
async fn test_entry_approval_never_generates_fees() {
    let (h, notifier) = harness();
    // A formula exists, but financial entries must not reach the dispatcher.
    h.formulas
        .store(patient_formula(1, 0, ComputationMode::Fixed, 50_000))
        .await
        .unwrap();

    let entry = FinancialEntry::new(
        1,
        chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        EntryKind::Revenue,
        EntryCategory::Consultation,
        250_000,
        "morning consultations",
        5,
    )
    .unwrap();
    h.engine.submit_entry(entry).await.unwrap();
    h.engine
        .approve_entry(1, VALIDATOR, Some("matches the cash drawer"))
        .await
        .unwrap();

    assert!(h.engine.fee_records().await.unwrap().is_empty());
    assert!(notifier.sent().await.is_empty());

    let audit = h.audit.entries().await;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].record_type, RecordType::FinancialEntry);
    assert_eq!(audit[0].to, ValidationStatus::Approved);

    // Administrative revert works on entries too, and is audited.
    h.engine
        .revert_entry(1, 11, "posted to the wrong month")
        .await
        .unwrap();
    let audit = h.audit.entries().await;
    assert_eq!(audit.len(), 2);
    assert_eq!(audit[1].from, ValidationStatus::Approved);
    assert_eq!(audit[1].to, ValidationStatus::Pending);
    assert_eq!(
        audit[1].comment.as_deref(),
        Some("posted to the wrong month")
    );
}

#[tokio::test]
async fn test_procedure_fee_and_missing_beneficiary() {
    let (h, _) = harness();
    h.formulas
        .store(FeeFormula {
            id: 1,
            unit: ServiceUnit::Dental,
            shift: Shift::Morning,
            basis: FeeBasis::Procedure,
            active: true,
            threshold: 0,
            mode: ComputationMode::PerUnit,
            base_amount: Money::new(25_000),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        })
        .await
        .unwrap();

    let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let with_physician = ProcedureRecord::new(
        1,
        date,
        42,
        ServiceUnit::Dental,
        Shift::Morning,
        Some(5),
        Some(6),
        150_000,
        9,
    )
    .unwrap();
    h.engine.submit_procedure(with_physician).await.unwrap();
    let outcome = h
        .engine
        .approve_procedure(1, VALIDATOR, None)
        .await
        .unwrap();
    match outcome {
        DispatchOutcome::Created(fee) => {
            assert_eq!(fee.beneficiary, 5);
            assert_eq!(fee.basis, FeeBasis::Procedure);
            assert_eq!(fee.amount, Money::new(25_000));
        }
        other => panic!("expected Created, got {other:?}"),
    }

    // Nobody to pay: approval succeeds, no fee appears.
    let unstaffed = ProcedureRecord::new(
        2,
        date,
        43,
        ServiceUnit::Dental,
        Shift::Morning,
        None,
        None,
        80_000,
        9,
    )
    .unwrap();
    h.engine.submit_procedure(unstaffed).await.unwrap();
    let outcome = h
        .engine
        .approve_procedure(2, VALIDATOR, None)
        .await
        .unwrap();
    assert_eq!(outcome, DispatchOutcome::NoFeeOwed);
    assert_eq!(h.engine.fee_records().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_audit_trail_covers_every_transition() {
    let (h, _) = harness();
    h.formulas
        .store(patient_formula(1, 0, ComputationMode::Fixed, 50_000))
        .await
        .unwrap();

    h.engine.submit_patient_count(count(1, 5, 12)).await.unwrap();
    h.engine
        .approve_patient_count(1, VALIDATOR, None)
        .await
        .unwrap();
    h.engine
        .revert_patient_count(1, 11, "recount requested")
        .await
        .unwrap();

    let audit = h.audit.entries().await;
    assert_eq!(audit.len(), 3);

    assert_eq!(audit[0].record_type, RecordType::PatientCount);
    assert_eq!(audit[0].from, ValidationStatus::Pending);
    assert_eq!(audit[0].to, ValidationStatus::Approved);

    // The generated fee is auto-approved under the same approver.
    assert_eq!(audit[1].record_type, RecordType::Fee);
    assert_eq!(audit[1].actor, VALIDATOR);
    assert_eq!(audit[1].to, ValidationStatus::Approved);

    assert_eq!(audit[2].record_type, RecordType::PatientCount);
    assert_eq!(audit[2].from, ValidationStatus::Approved);
    assert_eq!(audit[2].to, ValidationStatus::Pending);
    assert_eq!(audit[2].comment.as_deref(), Some("recount requested"));
    assert_eq!(audit[2].actor, 11);
}

#[tokio::test]
async fn test_notification_failure_never_blocks_fee_creation() {
    let h = build(Arc::new(FailingNotifier));
    h.formulas
        .store(patient_formula(1, 0, ComputationMode::Fixed, 50_000))
        .await
        .unwrap();

    h.engine.submit_patient_count(count(1, 5, 12)).await.unwrap();
    let outcome = h
        .engine
        .approve_patient_count(1, VALIDATOR, None)
        .await
        .unwrap();
    assert!(matches!(outcome, DispatchOutcome::Created(_)));
    assert_eq!(h.fees.all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_soft_deleted_records_cannot_be_validated() {
    let (h, _) = harness();

    let entry = FinancialEntry::new(
        1,
        chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        EntryKind::Expense,
        EntryCategory::Supplies,
        40_000,
        "gauze restock",
        5,
    )
    .unwrap();
    h.engine.submit_entry(entry).await.unwrap();
    h.engine.soft_delete_entry(1).await.unwrap();

    let err = h.engine.approve_entry(1, VALIDATOR, None).await.unwrap_err();
    assert!(matches!(err, FeeError::Validation(_)));

    let date = chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let record = ProcedureRecord::new(
        2,
        date,
        42,
        ServiceUnit::Dental,
        Shift::Morning,
        Some(5),
        None,
        150_000,
        9,
    )
    .unwrap();
    h.engine.submit_procedure(record).await.unwrap();
    h.engine.soft_delete_procedure(2).await.unwrap();
    let err = h
        .engine
        .approve_procedure(2, VALIDATOR, None)
        .await
        .unwrap_err();
    assert!(matches!(err, FeeError::Validation(_)));
}

#[tokio::test]
async fn test_resolver_picks_highest_qualifying_threshold_end_to_end() {
    let (h, _) = harness();
    for (id, threshold, base) in [(1u64, 0u32, 10_000i64), (2, 10, 50_000), (3, 20, 90_000)] {
        h.formulas
            .store(patient_formula(id, threshold, ComputationMode::Fixed, base))
            .await
            .unwrap();
    }

    h.engine.submit_patient_count(count(1, 5, 15)).await.unwrap();
    let outcome = h
        .engine
        .approve_patient_count(1, VALIDATOR, None)
        .await
        .unwrap();
    match outcome {
        DispatchOutcome::Created(fee) => assert_eq!(fee.amount, Money::new(50_000)),
        other => panic!("expected Created, got {other:?}"),
    }
}
