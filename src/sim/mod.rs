//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed motion step, simulated clock fed by the host
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod clock;
pub mod collision;
pub mod input;
pub mod layout;
pub mod motion;
pub mod schedule;
pub mod spawn;
pub mod state;
pub mod tick;

pub use autopilot::Autopilot;
pub use clock::SimClock;
pub use collision::{CollisionEvent, circles_overlap, resolve};
pub use input::{HostEvent, InputReceiver, InputSender, InputState, Key, channel};
pub use layout::Presentation;
pub use schedule::{TimedAction, Timers};
pub use spawn::SpawnScheduler;
pub use state::{
    Craft, Direction, EntityStore, Obstacle, ObstacleKind, ObstacleState, Projectile,
    SessionPhase, Viewport,
};
pub use tick::{GameEvent, GameLoop, Session};
