//! Session state and core simulation types
//!
//! Everything a frontend reads back for drawing lives here.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::contact::{CollisionResolver, Rect};
use crate::consts::*;
use crate::lerp;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Attract screen, waiting for the first start
    Idle,
    /// Active gameplay
    Playing,
    /// Run ended on a collision; waiting for a restart
    GameOver,
}

/// Lifecycle notifications for the render collaborator.
///
/// The sim never draws; it tells the frontend what appeared and what went
/// away, and the frontend mirrors that with sprites however it likes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    SessionStarted,
    ObstacleSpawned { id: u32, kind: ObstacleKind },
    ObstacleRemoved { id: u32 },
    PursuerSpawned,
    PursuerRemoved,
    SessionEnded {
        score: u64,
        high_score: u64,
        new_record: bool,
    },
}

/// The player's desired lateral direction, as reported by the input
/// collaborator. Touch release maps to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Intent {
    Left,
    Right,
    #[default]
    None,
}

/// The skier. Lateral position is the only degree of freedom; the slope
/// scrolls underneath, so the world moves and the skier stays on its row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub size: Vec2,
    pub intent: Intent,
}

impl Player {
    pub fn new(playfield: Vec2) -> Self {
        Self {
            pos: start_position(playfield),
            size: Vec2::splat(PLAYER_SIZE),
            intent: Intent::None,
        }
    }

    /// Back to the start column, no residual intent
    pub fn reset(&mut self, playfield: Vec2) {
        self.pos = start_position(playfield);
        self.intent = Intent::None;
    }

    /// One step of lateral motion, clamped so the sprite never leaves the
    /// playfield
    pub fn apply_motion(&mut self, dt: f32, move_speed: f32, playfield_width: f32) {
        let dx = match self.intent {
            Intent::Left => -move_speed * dt,
            Intent::Right => move_speed * dt,
            Intent::None => return,
        };
        let half = self.size.x / 2.0;
        self.pos.x = (self.pos.x + dx).clamp(half, playfield_width - half);
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, self.size)
    }
}

fn start_position(playfield: Vec2) -> Vec2 {
    Vec2::new(playfield.x / 2.0, playfield.y * PLAYER_Y_FRACTION)
}

/// Obstacle varieties. Each has a fixed sprite footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Tree,
    Rock,
    RivalSkier,
    Pole,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 4] = [
        ObstacleKind::Tree,
        ObstacleKind::Rock,
        ObstacleKind::RivalSkier,
        ObstacleKind::Pole,
    ];

    /// Footprint (width, height)
    pub fn size(&self) -> Vec2 {
        match self {
            ObstacleKind::Tree => Vec2::new(40.0, 60.0),
            ObstacleKind::Rock => Vec2::new(50.0, 40.0),
            ObstacleKind::RivalSkier => Vec2::new(45.0, 60.0),
            ObstacleKind::Pole => Vec2::new(25.0, 90.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObstacleKind::Tree => "Tree",
            ObstacleKind::Rock => "Rock",
            ObstacleKind::RivalSkier => "Rival Skier",
            ObstacleKind::Pole => "Pole",
        }
    }
}

/// A hazard scrolling up the playfield (the world moves, not the skier)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    /// Sprite center
    pub pos: Vec2,
    /// Upward climb in units/s, fixed at spawn from the speed at that moment
    pub climb_rate: f32,
    /// Seconds until the obstacle has fully cleared the top edge
    pub travel_remaining: f32,
}

impl Obstacle {
    pub fn size(&self) -> Vec2 {
        self.kind.size()
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, self.size())
    }

    pub fn advance(&mut self, dt: f32) {
        self.pos.y += self.climb_rate * dt;
        self.travel_remaining -= dt;
    }

    /// True once the obstacle has finished its climb past the top edge
    pub fn expired(&self) -> bool {
        self.travel_remaining <= 0.0
    }
}

/// The chasing hazard. At most one exists at a time; it hunts the player's
/// column for a bounded chase, then gives up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pursuer {
    /// Sprite center
    pub pos: Vec2,
    /// Seconds of chase left before it gives up
    pub chase_remaining: f32,
    climb_rate: f32,
    /// Countdown to the next re-aim at the player's column
    retarget_in: f32,
    /// Current horizontal glide segment: from -> to over one retarget interval
    glide_from: f32,
    glide_to: f32,
    glide_elapsed: f32,
}

impl Pursuer {
    /// Enter from below at mid-screen, already locked onto the player's
    /// current column
    pub fn spawn(tuning: &Tuning, player_x: f32) -> Self {
        let x = tuning.playfield.x / 2.0;
        Self {
            pos: Vec2::new(x, -PURSUER_SIZE),
            chase_remaining: tuning.chase_duration,
            climb_rate: (tuning.playfield.y + PURSUER_SIZE * 2.0) / tuning.chase_duration,
            retarget_in: tuning.retarget_interval,
            glide_from: x,
            glide_to: player_x,
            glide_elapsed: 0.0,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::splat(PURSUER_SIZE)
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos, self.size())
    }

    /// One step of the chase: climb, glide toward the last captured column,
    /// re-aim when the retarget countdown lapses.
    ///
    /// The glide quantum is finished before any re-aim so that a glide which
    /// ends exactly on a retarget boundary reaches its captured column first.
    pub fn advance(&mut self, dt: f32, player_x: f32, retarget_interval: f32) {
        self.chase_remaining -= dt;
        self.pos.y += self.climb_rate * dt;

        self.glide_elapsed += dt;
        let t = (self.glide_elapsed / retarget_interval).min(1.0);
        self.pos.x = lerp(self.glide_from, self.glide_to, t);

        self.retarget_in -= dt;
        if self.retarget_in <= 0.0 {
            self.retarget_in += retarget_interval;
            self.glide_from = self.pos.x;
            self.glide_to = player_x;
            self.glide_elapsed = 0.0;
        }
    }

    /// True once the chase duration is spent
    pub fn done(&self) -> bool {
        self.chase_remaining <= 0.0
    }
}

/// Score for the current run plus the best on record
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreTracker {
    pub current: u64,
    pub high: u64,
}

impl ScoreTracker {
    /// Bank this step's points: `speed / divisor`, floored
    pub fn accrue(&mut self, speed: f32, divisor: f32) {
        self.current += (speed / divisor) as u64;
    }

    /// Fold the finished run into the record. True if it set a new best.
    pub fn finalize(&mut self) -> bool {
        let new_record = self.current > self.high;
        if new_record {
            self.high = self.current;
        }
        new_record
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}

/// Scroll-speed ramp. Ratchets up while Playing, never down.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Difficulty {
    pub speed: f32,
}

impl Difficulty {
    pub fn new(initial: f32) -> Self {
        Self { speed: initial }
    }

    /// Flat increase applied once per step (per-step on purpose: the ramp is
    /// tied to the frame cadence, not to wall time)
    pub fn advance(&mut self, increment: f32) {
        self.speed += increment;
    }

    pub fn reset(&mut self, initial: f32) {
        self.speed = initial;
    }
}

/// Complete session state. Created once per process and reset in place by
/// `start()`; a frontend reads its fields each frame for drawing.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Balance parameters, fixed for the session's lifetime
    pub tuning: Tuning,
    /// Current phase
    pub phase: GamePhase,
    /// Current run score + best on record
    pub score: ScoreTracker,
    /// Scroll-speed ramp
    pub difficulty: Difficulty,
    /// The skier
    pub player: Player,
    /// Live obstacles (stable order, removal via retain sweeps)
    pub obstacles: Vec<Obstacle>,
    /// The chasing hazard, when one is on screen
    pub pursuer: Option<Pursuer>,
    /// Accumulated Playing time toward the next obstacle spawn
    pub spawn_elapsed: f32,
    /// Queued contact events from the physics collaborator
    pub(crate) resolver: CollisionResolver,
    pub(crate) rng: Pcg32,
    /// Pending lifecycle notifications for the frontend
    events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameSession {
    /// Create a session with the given balance and seed, sitting in `Idle`
    /// until `start()` is called
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self {
            seed,
            phase: GamePhase::Idle,
            score: ScoreTracker::default(),
            difficulty: Difficulty::new(tuning.initial_speed),
            player: Player::new(tuning.playfield),
            obstacles: Vec::new(),
            pursuer: None,
            spawn_elapsed: 0.0,
            resolver: CollisionResolver::default(),
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            next_id: 1,
            tuning,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take the lifecycle notifications accumulated since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
