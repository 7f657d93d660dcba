//! Owner identity for the progress store.
//!
//! The store only needs an opaque owner id. Without one it is "not yet
//! usable" and every mutation is skipped.
//!
//! Local owner ids look like `ritualtrack-<uuid>` and live in `owner_id.txt`
//! inside the data directory.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const OWNER_ID_FILE: &str = "owner_id.txt";
const OWNER_ID_PREFIX: &str = "ritualtrack-";

/// Opaque owner identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supplies the owner of the current session, if any.
pub trait IdentityProvider {
    fn current_owner(&self) -> Option<OwnerId>;
}

/// Identity fixed at construction. `None` models a signed-out session.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<OwnerId>);

impl StaticIdentity {
    pub fn signed_in(id: impl Into<String>) -> Self {
        Self(Some(OwnerId::new(id)))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_owner(&self) -> Option<OwnerId> {
        self.0.clone()
    }
}

/// Error type for local identity operations
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid owner ID format: {0}")]
    InvalidFormat(String),
}

/// Device-local identity backed by a generated id file.
#[derive(Debug, Clone)]
pub struct LocalIdentity {
    dir: PathBuf,
}

impl LocalIdentity {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Read the owner id, creating one on first use.
    pub fn get_or_create(&self) -> Result<OwnerId, IdentityError> {
        get_or_create_owner_id_at(&self.dir)
    }
}

impl IdentityProvider for LocalIdentity {
    fn current_owner(&self) -> Option<OwnerId> {
        match self.get_or_create() {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, dir = %self.dir.display(), "local identity unavailable");
                None
            }
        }
    }
}

/// Get or create the owner id stored in `path`.
pub fn get_or_create_owner_id_at(path: &Path) -> Result<OwnerId, IdentityError> {
    let id_path = path.join(OWNER_ID_FILE);

    if id_path.exists() {
        let content = fs::read_to_string(&id_path)?;
        let owner_id = content.trim().to_string();
        if owner_id.starts_with(OWNER_ID_PREFIX) {
            return Ok(OwnerId(owner_id));
        }
        return Err(IdentityError::InvalidFormat(owner_id));
    }

    let owner_id = format!("{}{}", OWNER_ID_PREFIX, Uuid::new_v4());

    if !path.exists() {
        fs::create_dir_all(path)?;
    }

    let mut file = fs::File::create(&id_path)?;
    writeln!(file, "{}", owner_id)?;
    tracing::info!(owner = %owner_id, "created local owner id");

    Ok(OwnerId(owner_id))
}
