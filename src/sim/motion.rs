//! Per-tick motion
//!
//! Moves entities in place. Never creates or destroys anything.

use super::state::{Direction, EntityStore};
use crate::settings::Settings;

/// Advance craft, projectiles and obstacles by one fixed step of `dt` seconds
pub fn advance(store: &mut EntityStore, direction: Direction, settings: &Settings, dt: f32) {
    if let Some(craft) = store.craft.as_mut() {
        if craft.alive && direction != Direction::None {
            craft.shift(direction.sign() * settings.craft_speed * dt);
        }
    }

    for projectile in &mut store.projectiles {
        projectile.pos += projectile.vel * dt;
    }

    // Exploding obstacles have zero velocity, but skip them anyway so a
    // stale velocity can never move an explosion.
    for obstacle in store.obstacles.iter_mut().filter(|o| o.is_active()) {
        obstacle.pos += obstacle.vel * dt;
    }
}
