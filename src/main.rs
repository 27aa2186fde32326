use clap::Parser;
use jaspel::application::dispatcher::FeeDispatcher;
use jaspel::application::engine::ValidationEngine;
use jaspel::domain::StaffId;
use jaspel::domain::clock::{SharedClock, SystemClock};
use jaspel::domain::patient_count::DailyPatientCount;
use jaspel::domain::ports::{
    AuditLogRef, EntryRepoRef, FailureQueueRef, FeeFormulaRepository, FeeRepoRef, FormulaRepoRef,
    NotifierRef, PatientCountRepoRef, ProcedureRepoRef,
};
use jaspel::domain::procedure::ProcedureRecord;
use jaspel::infrastructure::in_memory::{
    InMemoryAuditLog, InMemoryEntryRepository, InMemoryFailureQueue, InMemoryFeeRepository,
    InMemoryFormulaRepository, InMemoryPatientCountRepository, InMemoryProcedureRepository,
    LogNotifier,
};
use jaspel::interfaces::csv::count_reader::PatientCountReader;
use jaspel::interfaces::csv::fee_writer::FeeLedgerWriter;
use jaspel::interfaces::csv::formula_reader::FormulaReader;
use jaspel::interfaces::csv::procedure_reader::ProcedureReader;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Daily patient count submissions CSV
    input: PathBuf,

    /// Fee formula configuration CSV
    #[arg(long)]
    formulas: PathBuf,

    /// Staff id validating the batch
    #[arg(long)]
    validator: StaffId,

    /// Optional procedure submissions CSV
    #[arg(long)]
    procedures: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

struct Wiring {
    engine: ValidationEngine,
    formulas: FormulaRepoRef,
}

fn in_memory_wiring() -> Wiring {
    let entries: EntryRepoRef = Arc::new(InMemoryEntryRepository::new());
    let procedures: ProcedureRepoRef = Arc::new(InMemoryProcedureRepository::new());
    let counts: PatientCountRepoRef = Arc::new(InMemoryPatientCountRepository::new());
    let formulas: FormulaRepoRef = Arc::new(InMemoryFormulaRepository::new());
    let fees: FeeRepoRef = Arc::new(InMemoryFeeRepository::new());
    let audit: AuditLogRef = Arc::new(InMemoryAuditLog::new());
    let failures: FailureQueueRef = Arc::new(InMemoryFailureQueue::new());
    let notifier: NotifierRef = Arc::new(LogNotifier);
    let clock: SharedClock = Arc::new(SystemClock);

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
    let engine = ValidationEngine::new(entries, procedures, counts, fees, audit, dispatcher, clock);
    Wiring { engine, formulas }
}

#[cfg(feature = "storage-rocksdb")]
fn rocksdb_wiring(path: &Path) -> Result<Wiring> {
    use jaspel::infrastructure::rocksdb::RocksDBStore;

    let store = RocksDBStore::open(path).into_diagnostic()?;
    let entries: EntryRepoRef = Arc::new(store.clone());
    let procedures: ProcedureRepoRef = Arc::new(store.clone());
    let counts: PatientCountRepoRef = Arc::new(store.clone());
    let formulas: FormulaRepoRef = Arc::new(store.clone());
    let fees: FeeRepoRef = Arc::new(store.clone());
    let audit: AuditLogRef = Arc::new(store.clone());
    let failures: FailureQueueRef = Arc::new(store);
    let notifier: NotifierRef = Arc::new(LogNotifier);
    let clock: SharedClock = Arc::new(SystemClock);

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
    let engine = ValidationEngine::new(entries, procedures, counts, fees, audit, dispatcher, clock);
    Ok(Wiring { engine, formulas })
}

fn build_wiring(db_path: Option<&Path>) -> Result<Wiring> {
    if let Some(path) = db_path {
        #[cfg(feature = "storage-rocksdb")]
        return rocksdb_wiring(path);
        #[cfg(not(feature = "storage-rocksdb"))]
        {
            let _ = path;
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
        }
    }
    Ok(in_memory_wiring())
}

async fn process_count(
    engine: &ValidationEngine,
    count: DailyPatientCount,
    validator: StaffId,
) -> jaspel::error::Result<()> {
    let id = count.id;
    engine.submit_patient_count(count).await?;
    engine.approve_patient_count(id, validator, None).await?;
    Ok(())
}

async fn process_procedure(
    engine: &ValidationEngine,
    record: ProcedureRecord,
    validator: StaffId,
) -> jaspel::error::Result<()> {
    let id = record.id;
    engine.submit_procedure(record).await?;
    engine.approve_procedure(id, validator, None).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let wiring = build_wiring(cli.db_path.as_deref())?;

    // Formula configuration
    let file = File::open(&cli.formulas).into_diagnostic()?;
    for formula in FormulaReader::new(file).formulas() {
        match formula {
            Ok(formula) => wiring.formulas.store(formula).await.into_diagnostic()?,
            Err(e) => eprintln!("Error reading formula: {e}"),
        }
    }

    // Submit and validate the day's patient counts
    let file = File::open(&cli.input).into_diagnostic()?;
    for count in PatientCountReader::new(file).counts() {
        match count {
            Ok(count) => {
                let id = count.id;
                if let Err(e) = process_count(&wiring.engine, count, cli.validator).await {
                    eprintln!("Error processing patient count #{id}: {e}");
                }
            }
            Err(e) => eprintln!("Error reading patient count: {e}"),
        }
    }

    // Procedures, when a file is given
    if let Some(path) = &cli.procedures {
        let file = File::open(path).into_diagnostic()?;
        for record in ProcedureReader::new(file).procedures() {
            match record {
                Ok(record) => {
                    let id = record.id;
                    if let Err(e) = process_procedure(&wiring.engine, record, cli.validator).await {
                        eprintln!("Error processing procedure #{id}: {e}");
                    }
                }
                Err(e) => eprintln!("Error reading procedure: {e}"),
            }
        }
    }

    // Output the fee ledger
    let records = wiring.engine.fee_records().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = FeeLedgerWriter::new(stdout.lock());
    writer.write_records(records).into_diagnostic()?;

    Ok(())
}
