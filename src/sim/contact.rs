//! Contact classification and collision-driven termination
//!
//! The broad phase belongs to the physics collaborator: it watches sprites
//! overlap and reports contact *pairs*. The sim only classifies those pairs
//! and decides whether the session ends. A small AABB helper lets the
//! headless driver and the tests stand in for that collaborator.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::GameSession;

/// What a contact participant is. A closed set; no bitmasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactCategory {
    Player,
    Obstacle,
    Pursuer,
}

/// An unordered pair of contact participants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactPair {
    pub a: ContactCategory,
    pub b: ContactCategory,
}

impl ContactPair {
    pub fn new(a: ContactCategory, b: ContactCategory) -> Self {
        Self { a, b }
    }

    pub fn involves(&self, category: ContactCategory) -> bool {
        self.a == category || self.b == category
    }

    /// True for the pairs that end the session: the player against an
    /// obstacle or the pursuer, in either order
    pub fn is_terminating(&self) -> bool {
        self.involves(ContactCategory::Player)
            && (self.involves(ContactCategory::Obstacle) || self.involves(ContactCategory::Pursuer))
    }
}

/// Contact events reported since the last step, waiting to be resolved
#[derive(Debug, Clone, Default)]
pub struct CollisionResolver {
    pending: Vec<ContactPair>,
}

impl CollisionResolver {
    pub fn report(&mut self, pair: ContactPair) {
        self.pending.push(pair);
    }

    /// Drain the queue; true if anything in it ends the session. Duplicate
    /// reports of the same contact collapse into the one answer.
    pub fn take_terminating(&mut self) -> bool {
        let hit = self.pending.iter().any(ContactPair::is_terminating);
        self.pending.clear();
        hit
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Axis-aligned rectangle in sprite convention: center plus full size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub center: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Overlap test; touching edges count as contact
    pub fn intersects(&self, other: &Rect) -> bool {
        let d = (self.center - other.center).abs();
        d.x * 2.0 <= self.size.x + other.size.x && d.y * 2.0 <= self.size.y + other.size.y
    }
}

/// Stand-in broad phase: overlap every hazard against the player and report
/// the pairs a physics engine would. The demo driver and the scenario tests
/// feed these into `report_contact`; a real frontend may substitute its own
/// physics.
pub fn detect_contacts(session: &GameSession) -> Vec<ContactPair> {
    let mut contacts = Vec::new();
    let player = session.player.rect();

    for obstacle in &session.obstacles {
        if player.intersects(&obstacle.rect()) {
            contacts.push(ContactPair::new(
                ContactCategory::Player,
                ContactCategory::Obstacle,
            ));
        }
    }
    if let Some(pursuer) = &session.pursuer {
        if player.intersects(&pursuer.rect()) {
            contacts.push(ContactPair::new(
                ContactCategory::Player,
                ContactCategory::Pursuer,
            ));
        }
    }

    contacts
}
