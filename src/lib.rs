//! Slope Rush - an arcade slope-dodging game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (session state machine, spawning, contacts)
//! - `tuning`: Data-driven game balance
//! - `highscores`: Best-run record and storage seam
//!
//! Rendering, audio and raw touch handling are external collaborators: a
//! frontend drives the sim with one `step` per frame, reads entity positions
//! back for drawing, and feeds directional intent plus contact events in.

pub mod highscores;
pub mod sim;
pub mod tuning;

pub use sim::{GamePhase, GameSession};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Default fixed timestep (60 Hz, one sim step per rendered frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Player sprite footprint (square)
    pub const PLAYER_SIZE: f32 = 40.0;
    /// Pursuer footprint (square)
    pub const PURSUER_SIZE: f32 = 50.0;
    /// The player rides at this fraction of the playfield height
    pub const PLAYER_Y_FRACTION: f32 = 0.7;
}

/// Linear interpolation from `a` to `b` by `t` in [0, 1]
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
