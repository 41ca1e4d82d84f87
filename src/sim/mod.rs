//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and step-driven:
//! - One `step(dt)` per rendered frame, no internal timers or threads
//! - Seeded RNG only
//! - Stable entity order (spawn order, removal via retain sweeps)
//! - No rendering or platform dependencies

pub mod contact;
pub mod state;
pub mod tick;

pub use contact::{CollisionResolver, ContactCategory, ContactPair, Rect, detect_contacts};
pub use state::{
    Difficulty, GameEvent, GamePhase, GameSession, Intent, Obstacle, ObstacleKind, Player, Pursuer,
    ScoreTracker,
};
