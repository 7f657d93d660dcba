//! # Ritualtrack Core Library
//!
//! This library provides the core logic for ritualtrack, a daily-ritual and
//! weight-progress tracker. It follows a CLI-first philosophy: every
//! operation is available through the standalone `ritualtrack` binary, which
//! is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Protocol**: the phase table, task catalog and thresholds that define a
//!   journey, built in or loaded from TOML
//! - **Progress**: the per-owner record and the state store that mutates it
//!   through a [`RecordBackend`]
//! - **Views**: pure functions deriving phase, milestones, trend and copy
//! - **Storage**: SQLite and JSON snapshot record stores, TOML configuration
//!
//! ## Key Components
//!
//! - [`ProgressStore`]: owns one record and exposes the mutations
//! - [`ProgressView`]: every derived value for a record
//! - [`Database`]: SQLite record store
//! - [`SnapshotBackend`]: JSON blob record store with legacy migration
//! - [`Config`]: application configuration management

pub mod dates;
pub mod error;
pub mod identity;
pub mod progress;
pub mod protocol;
pub mod storage;
pub mod views;

pub use dates::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, Result, StoreError, ValidationError};
pub use identity::{IdentityProvider, LocalIdentity, OwnerId, StaticIdentity};
pub use progress::{
    MemoryBackend, Outcome, ProgressRecord, ProgressStore, RecordBackend, SkipReason, TaskState,
    WeightEntry, WeightKind,
};
pub use protocol::{Catalog, Phase, PhaseTable, Protocol, ProtocolRules, TaskDefinition};
pub use storage::{Config, Database, SnapshotBackend, StorageBackend};
pub use views::{Milestone, ProgressView, TrendCategory, TrendInterpretation};
