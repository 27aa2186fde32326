use crate::domain::RecordId;
use crate::domain::audit::AuditEntry;
use crate::domain::entry::FinancialEntry;
use crate::domain::fee::{FeeBasis, FeeKey, FeeRecord, JobFailure};
use crate::domain::formula::FeeFormula;
use crate::domain::patient_count::DailyPatientCount;
use crate::domain::ports::{
    AuditLog, FailureQueue, FeeFormulaRepository, FeeRecordRepository, FinancialEntryRepository,
    InsertOutcome, PatientCountRepository, ProcedureRepository,
};
use crate::domain::procedure::ProcedureRecord;
use crate::domain::{ServiceUnit, Shift};
use crate::error::{FeeError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Column Family for revenue/expense entries.
pub const CF_ENTRIES: &str = "entries";
/// Column Family for procedure records.
pub const CF_PROCEDURES: &str = "procedures";
/// Column Family for daily patient counts.
pub const CF_COUNTS: &str = "counts";
/// Column Family for fee formulas.
pub const CF_FORMULAS: &str = "formulas";
/// Column Family for computed fee records.
pub const CF_FEES: &str = "fees";
/// Column Family for the append-only audit trail.
pub const CF_AUDIT: &str = "audit";
/// Column Family for the operator failure queue.
pub const CF_FAILURES: &str = "failures";

const ALL_CFS: [&str; 7] = [
    CF_ENTRIES,
    CF_PROCEDURES,
    CF_COUNTS,
    CF_FORMULAS,
    CF_FEES,
    CF_AUDIT,
    CF_FAILURES,
];

/// A persistent store implementation using RocksDB.
///
/// One Column Family per entity; values are serde_json. The struct is
/// thread-safe (`Clone` shares the underlying `Arc<DB>`), so the same
/// store backs every repository port.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    // Serialises fee check-and-insert; RocksDB has no unique constraint to
    // lean on, so the advisory lock lives at the store level.
    fee_insert_lock: Arc<Mutex<()>>,
    audit_seq: Arc<AtomicU64>,
    failure_seq: Arc<AtomicU64>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;
        let audit_seq = next_sequence(&db, CF_AUDIT)?;
        let failure_seq = next_sequence(&db, CF_FAILURES)?;

        Ok(Self {
            db: Arc::new(db),
            fee_insert_lock: Arc::new(Mutex::new(())),
            audit_seq: Arc::new(AtomicU64::new(audit_seq)),
            failure_seq: Arc::new(AtomicU64::new(failure_seq)),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| FeeError::Transient(format!("column family {name} not found")))
    }

    fn put<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, key, bytes)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }
}

/// The next free sequence number for an append-only column family.
fn next_sequence(db: &DB, cf_name: &str) -> Result<u64> {
    let cf = db
        .cf_handle(cf_name)
        .ok_or_else(|| FeeError::Transient(format!("column family {cf_name} not found")))?;
    let last = db.iterator_cf(cf, IteratorMode::End).next();
    match last {
        Some(item) => {
            let (key, _value) = item?;
            let bytes: [u8; 8] = key.as_ref().try_into().map_err(|_| {
                FeeError::Transient(format!("malformed sequence key in {cf_name}"))
            })?;
            Ok(u64::from_be_bytes(bytes) + 1)
        }
        None => Ok(0),
    }
}

fn fee_key_bytes(key: &FeeKey) -> Vec<u8> {
    format!("{}/{}/{}", key.beneficiary, key.date, key.basis.tag()).into_bytes()
}

#[async_trait]
impl FinancialEntryRepository for RocksDBStore {
    async fn store(&self, entry: FinancialEntry) -> Result<()> {
        self.put(CF_ENTRIES, &entry.id.to_be_bytes(), &entry)
    }

    async fn get(&self, id: RecordId) -> Result<Option<FinancialEntry>> {
        self.fetch(CF_ENTRIES, &id.to_be_bytes())
    }
}

#[async_trait]
impl ProcedureRepository for RocksDBStore {
    async fn store(&self, record: ProcedureRecord) -> Result<()> {
        self.put(CF_PROCEDURES, &record.id.to_be_bytes(), &record)
    }

    async fn get(&self, id: RecordId) -> Result<Option<ProcedureRecord>> {
        self.fetch(CF_PROCEDURES, &id.to_be_bytes())
    }
}

#[async_trait]
impl PatientCountRepository for RocksDBStore {
    async fn store(&self, count: DailyPatientCount) -> Result<()> {
        self.put(CF_COUNTS, &count.id.to_be_bytes(), &count)
    }

    async fn get(&self, id: RecordId) -> Result<Option<DailyPatientCount>> {
        self.fetch(CF_COUNTS, &id.to_be_bytes())
    }
}

#[async_trait]
impl FeeFormulaRepository for RocksDBStore {
    async fn store(&self, formula: FeeFormula) -> Result<()> {
        self.put(CF_FORMULAS, &formula.id.to_be_bytes(), &formula)
    }

    async fn active_for(
        &self,
        unit: ServiceUnit,
        shift: Shift,
        basis: FeeBasis,
    ) -> Result<Vec<FeeFormula>> {
        let formulas: Vec<FeeFormula> = self.scan(CF_FORMULAS)?;
        Ok(formulas
            .into_iter()
            .filter(|f| f.active && f.unit == unit && f.shift == shift && f.basis == basis)
            .collect())
    }
}

#[async_trait]
impl FeeRecordRepository for RocksDBStore {
    async fn create_if_absent(&self, record: FeeRecord) -> Result<InsertOutcome> {
        let key = fee_key_bytes(&record.key());
        let guard = self
            .fee_insert_lock
            .lock()
            .map_err(|_| FeeError::Transient("fee insert lock poisoned".into()))?;
        let cf = self.cf(CF_FEES)?;
        if self.db.get_pinned_cf(cf, &key)?.is_some() {
            return Ok(InsertOutcome::AlreadyExists);
        }
        let bytes = serde_json::to_vec(&record)?;
        self.db.put_cf(cf, &key, bytes)?;
        drop(guard);
        Ok(InsertOutcome::Created)
    }

    async fn get(&self, key: &FeeKey) -> Result<Option<FeeRecord>> {
        self.fetch(CF_FEES, &fee_key_bytes(key))
    }

    async fn flag_for_review(&self, key: &FeeKey) -> Result<()> {
        let bytes_key = fee_key_bytes(key);
        let guard = self
            .fee_insert_lock
            .lock()
            .map_err(|_| FeeError::Transient("fee insert lock poisoned".into()))?;
        if let Some(mut record) = self.fetch::<FeeRecord>(CF_FEES, &bytes_key)? {
            record.flagged_for_review = true;
            self.put(CF_FEES, &bytes_key, &record)?;
        }
        drop(guard);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<FeeRecord>> {
        let mut records: Vec<FeeRecord> = self.scan(CF_FEES)?;
        records.sort_by_key(|r| (r.date, r.beneficiary));
        Ok(records)
    }
}

#[async_trait]
impl AuditLog for RocksDBStore {
    async fn append(&self, entry: AuditEntry) -> Result<()> {
        let seq = self.audit_seq.fetch_add(1, Ordering::SeqCst);
        self.put(CF_AUDIT, &seq.to_be_bytes(), &entry)
    }
}

#[async_trait]
impl FailureQueue for RocksDBStore {
    async fn push(&self, failure: JobFailure) -> Result<()> {
        let seq = self.failure_seq.fetch_add(1, Ordering::SeqCst);
        self.put(CF_FAILURES, &seq.to_be_bytes(), &failure)
    }
}
