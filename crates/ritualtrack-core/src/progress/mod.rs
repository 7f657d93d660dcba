//! Progress record, record-store seam and the state store on top of it.

pub mod backend;
pub mod memory;
pub mod record;
pub mod store;

pub use backend::{Profile, ProfileField, RecordBackend};
pub use memory::MemoryBackend;
pub use record::{
    parse_weight_input, weight_lost, ProgressRecord, TaskState, WeightEntry, WeightKind,
};
pub use store::{Outcome, ProgressStore, SkipReason};
