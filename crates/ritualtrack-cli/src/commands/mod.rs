pub mod config;
pub mod confirm;
pub mod milestones;
pub mod name;
pub mod phase;
pub mod reset;
pub mod status;
pub mod task;
pub mod trend;
pub mod weight;

use std::error::Error;
use std::sync::Arc;

use ritualtrack_core::progress::{Outcome, ProgressStore, RecordBackend, SkipReason};
use ritualtrack_core::storage::database::DATABASE_FILE;
use ritualtrack_core::storage::snapshot::SNAPSHOT_DIR;
use ritualtrack_core::storage::{data_dir, Config, Database, SnapshotBackend, StorageBackend};
use ritualtrack_core::views::ProgressView;
use ritualtrack_core::{LocalIdentity, SystemClock};
use serde::Serialize;

pub type Store = ProgressStore<Box<dyn RecordBackend>>;
pub type CmdResult = Result<(), Box<dyn Error>>;

/// Open the configured record store for the local owner.
pub fn open_store() -> Result<Store, Box<dyn Error>> {
    let dir = data_dir()?;
    let config = Config::load_from(&dir)?;
    let protocol = config.protocol()?;

    let backend: Box<dyn RecordBackend> = match config.storage.backend {
        StorageBackend::Sqlite => Box::new(Database::open_at(&dir.join(DATABASE_FILE))?),
        StorageBackend::Snapshot => Box::new(SnapshotBackend::new(
            dir.join(SNAPSHOT_DIR),
            protocol.catalog.clone(),
        )?),
    };
    tracing::debug!(backend = backend.name(), dir = %dir.display(), "opening record store");

    let identity = LocalIdentity::new(&dir);
    Ok(ProgressStore::open(
        backend,
        &identity,
        Arc::new(SystemClock),
        protocol,
    )?)
}

/// The derived view, or an error when there is no owner to show.
pub fn current_view(store: &Store) -> Result<ProgressView, Box<dyn Error>> {
    store
        .view()
        .ok_or_else(|| "no local identity; nothing to show".into())
}

pub fn print_json<T: Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print `applied` on success, or why nothing happened.
pub fn report(outcome: Outcome, applied: &str) {
    match outcome {
        Outcome::Applied => println!("{applied}"),
        Outcome::Skipped(reason) => println!("skipped: {}", describe_skip(reason)),
    }
}

pub fn describe_skip(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::NoIdentity => "no local identity",
        SkipReason::AlreadyConfirmed => "today is already confirmed",
        SkipReason::UnknownTask => "no such task in today's checklist",
    }
}

pub fn format_weight(weight: Option<f64>) -> String {
    weight.map_or_else(|| "-".to_string(), |w| format!("{w:.1} kg"))
}
