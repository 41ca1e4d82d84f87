//! Best-run record and its storage seam
//!
//! The sim tracks the record in memory (`ScoreTracker::high`); where it
//! survives between launches is a collaborator concern behind
//! [`HighScoreStore`]. A JSON file store covers native frontends; the
//! in-memory store covers tests and demo fallbacks.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a high-score store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("high score storage I/O: {0}")]
    Io(#[from] io::Error),
    #[error("high score data is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// On-disk shape of the record
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct HighScoreRecord {
    score: u64,
}

/// Durable storage for the best run, reduced to a read and a write.
///
/// Read once at startup, written once per ended session. Store failures are
/// the driver's problem; the sim never sees them.
pub trait HighScoreStore {
    /// Best score on record; a store with no record yet reports 0
    fn load(&self) -> Result<u64, StoreError>;
    /// Replace the record
    fn save(&mut self, score: u64) -> Result<(), StoreError>;
}

/// JSON file store for native frontends
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for JsonFileStore {
    fn load(&self) -> Result<u64, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No high score on record, starting fresh");
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };
        let record: HighScoreRecord = serde_json::from_str(&json)?;
        log::info!("Loaded high score {}", record.score);
        Ok(record.score)
    }

    fn save(&mut self, score: u64) -> Result<(), StoreError> {
        let json = serde_json::to_string(&HighScoreRecord { score })?;
        fs::write(&self.path, json)?;
        log::info!("High score {} saved", score);
        Ok(())
    }
}

/// In-memory store for tests and demo fallbacks
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStore {
    score: u64,
}

impl HighScoreStore for MemoryStore {
    fn load(&self) -> Result<u64, StoreError> {
        Ok(self.score)
    }

    fn save(&mut self, score: u64) -> Result<(), StoreError> {
        self.score = score;
        Ok(())
    }
}
