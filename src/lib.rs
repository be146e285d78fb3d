//! Meteor Rush - A vertical-scrolling arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic game loop (input, spawning, motion, collisions)
//! - `score`: Running score, per-player last/best scores
//! - `highscores`: Best-score-per-player ranking table
//! - `persistence`: Key-value store abstraction (LocalStorage on web)
//! - `settings`: Data-driven game tuning

pub mod highscores;
pub mod persistence;
pub mod score;
pub mod settings;
pub mod sim;

pub use highscores::{RankingEntry, RankingTable};
pub use persistence::{KeyValueStore, MemoryStore, StoreError};
pub use score::{PlayerName, ResultsSummary, ScoreTracker};
pub use settings::{Difficulty, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one host frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Same timestep in milliseconds, for hosts that step a virtual clock
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;

    /// Reference viewport (portrait phone)
    pub const VIEWPORT_WIDTH: f32 = 360.0;
    pub const VIEWPORT_HEIGHT: f32 = 640.0;

    /// Background art is authored at the reference viewport size
    pub const BACKGROUND_WIDTH: f32 = 360.0;
    pub const BACKGROUND_HEIGHT: f32 = 640.0;

    /// Craft defaults
    pub const CRAFT_HALF_WIDTH: f32 = 24.0;
    pub const CRAFT_BOTTOM_OFFSET: f32 = 80.0;
    pub const CRAFT_SPEED: f32 = 300.0; // px/s

    /// Projectile defaults
    pub const PROJECTILE_SPEED: f32 = 480.0; // px/s, upward
    pub const PROJECTILE_RADIUS: f32 = 6.0;
    /// Projectiles spawn this far above the craft's center
    pub const PROJECTILE_MUZZLE_OFFSET: f32 = 30.0;

    /// Obstacle defaults
    pub const SPAWN_INTERVAL_MS: f64 = 1000.0;
    pub const SPAWN_MARGIN: f32 = 20.0;
    /// Obstacles appear this far above the top edge
    pub const SPAWN_Y: f32 = -40.0;
    pub const OBSTACLE_MIN_SPEED: f32 = 150.0; // px/s, downward
    pub const OBSTACLE_MAX_SPEED: f32 = 300.0;
    pub const EXPLOSION_RADIUS: f32 = 60.0;

    /// Craft vs obstacle proximity
    pub const CRAFT_HIT_RADIUS: f32 = 40.0;
    pub const CRAFT_BLAST_RADIUS: f32 = 120.0;

    /// Cooperative delays (simulated time)
    pub const DESTROY_DELAY_MS: f64 = 300.0;
    pub const GAME_OVER_DELAY_MS: f64 = 800.0;

    /// Points per obstacle destroyed by a projectile
    pub const POINTS_PER_KILL: u64 = 1;

    /// Culling bounds: projectiles above -50, obstacles 50 below the bottom edge
    pub const PROJECTILE_CULL_Y: f32 = -50.0;
    pub const OBSTACLE_CULL_MARGIN: f32 = 50.0;
}

/// Clamp `value` into `[min, max]`, tolerating an inverted range by
/// collapsing it to its midpoint.
#[inline]
pub fn clamp_span(value: f32, min: f32, max: f32) -> f32 {
    if min > max {
        return (min + max) * 0.5;
    }
    value.clamp(min, max)
}
