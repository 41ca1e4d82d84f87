//! Data-driven game balance
//!
//! Every behavioral knob of the simulation lives here so a frontend can
//! rebalance the game from a JSON file without touching sim code. Fixed
//! geometry (sprite footprints, the player's row) stays in [`crate::consts`].

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from reading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("tuning file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Simulation balance parameters
///
/// All distances are in playfield units (points), all durations in seconds.
/// Unknown fields in a tuning file are rejected; missing fields fall back to
/// the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    /// Playfield dimensions (width, height). Obstacles enter below y = 0 and
    /// exit above y = `playfield.y`.
    pub playfield: Vec2,

    // === Difficulty ===
    /// Scroll speed at session start
    pub initial_speed: f32,
    /// Flat speed increase applied once per step
    pub speed_increment: f32,
    /// Score awarded per step is `speed / score_divisor`, floored
    pub score_divisor: f32,

    // === Obstacles ===
    /// Seconds between obstacle spawns
    pub spawn_interval: f32,

    // === Player ===
    /// Lateral steering speed
    pub move_speed: f32,

    // === Pursuer ===
    /// Per-step spawn chance, expressed as `threshold` out of a 0..=1000 roll
    pub pursuer_spawn_threshold: u32,
    /// How long a pursuer chases before giving up
    pub chase_duration: f32,
    /// Seconds between pursuer re-aims at the player's column
    pub retarget_interval: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            // Portrait phone playfield
            playfield: Vec2::new(390.0, 844.0),

            // Difficulty
            initial_speed: 300.0,
            speed_increment: 0.1,
            score_divisor: 50.0,

            // Obstacles
            spawn_interval: 1.5,

            // Player
            move_speed: 400.0,

            // Pursuer: roughly one spawn attempt in 500 succeeds
            pursuer_spawn_threshold: 2,
            chase_duration: 5.0,
            retarget_interval: 0.5,
        }
    }
}

impl Tuning {
    /// Load tuning from a JSON file. Fields absent from the file keep their
    /// default values.
    pub fn load(path: &Path) -> Result<Self, TuningError> {
        let json = fs::read_to_string(path)?;
        let tuning = serde_json::from_str(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }
}
