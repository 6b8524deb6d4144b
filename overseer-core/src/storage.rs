//! Durable record storage boundary
use crate::record::PlayerRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The two durable record collections the store maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Crash-recovery snapshot of currently-connected players.
    Hot,
    /// Every player ever observed.
    Cold,
}

impl Tier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Cold => "cold",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {tier} tier: {source}")]
    Io {
        tier: Tier,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {tier} tier: {source}")]
    Decode {
        tier: Tier,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {tier} tier: {source}")]
    Encode {
        tier: Tier,
        #[source]
        source: serde_json::Error,
    },
}

/// Persistence seam for progression records.
///
/// The core depends only on round-trip fidelity: `save_records` followed by
/// `load_records` must reproduce an equivalent record sequence. Encoding,
/// layout, and medium belong to the implementation.
pub trait RecordStorage {
    /// Load every record of a tier. A tier that has never been written
    /// loads as an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the tier exists but cannot be read or decoded.
    fn load_records(&self, tier: Tier) -> Result<Vec<PlayerRecord>, StorageError>;

    /// Replace a tier's contents with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error when the records cannot be encoded or written.
    fn save_records(&mut self, tier: Tier, records: &[PlayerRecord]) -> Result<(), StorageError>;
}

/// In-memory storage holding each tier as its serialized JSON document.
///
/// Serializing for real keeps decode faults exercisable in tests; the
/// `corrupt` helper plants an undecodable document on purpose.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    documents: HashMap<Tier, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a tier with an undecodable document.
    pub fn corrupt(&mut self, tier: Tier) {
        self.documents.insert(tier, "{not json".to_string());
    }

    #[must_use]
    pub fn has_tier(&self, tier: Tier) -> bool {
        self.documents.contains_key(&tier)
    }
}

impl RecordStorage for MemoryStorage {
    fn load_records(&self, tier: Tier) -> Result<Vec<PlayerRecord>, StorageError> {
        match self.documents.get(&tier) {
            Some(document) => serde_json::from_str(document)
                .map_err(|source| StorageError::Decode { tier, source }),
            None => Ok(Vec::new()),
        }
    }

    fn save_records(&mut self, tier: Tier, records: &[PlayerRecord]) -> Result<(), StorageError> {
        let document = serde_json::to_string(records)
            .map_err(|source| StorageError::Encode { tier, source })?;
        self.documents.insert(tier, document);
        Ok(())
    }
}

/// One pretty-printed JSON document per tier under a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    data_dir: PathBuf,
}

impl JsonFileStorage {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    #[must_use]
    pub fn tier_path(&self, tier: Tier) -> PathBuf {
        let file_name = match tier {
            Tier::Hot => "hot_players.json",
            Tier::Cold => "cold_players.json",
        };
        self.data_dir.join(file_name)
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl RecordStorage for JsonFileStorage {
    fn load_records(&self, tier: Tier) -> Result<Vec<PlayerRecord>, StorageError> {
        let path = self.tier_path(tier);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text =
            fs::read_to_string(&path).map_err(|source| StorageError::Io { tier, source })?;
        serde_json::from_str(&text).map_err(|source| StorageError::Decode { tier, source })
    }

    fn save_records(&mut self, tier: Tier, records: &[PlayerRecord]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StorageError::Io { tier, source })?;
        let document = serde_json::to_string_pretty(records)
            .map_err(|source| StorageError::Encode { tier, source })?;
        fs::write(self.tier_path(tier), document)
            .map_err(|source| StorageError::Io { tier, source })
    }
}
