//! Obstacle spawning

use glam::Vec2;
use rand::Rng;

use super::state::{EntityStore, ObstacleKind, Viewport};
use crate::consts::SPAWN_Y;
use crate::settings::Settings;

/// Decides when to drop the next obstacle
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    /// Minimum simulated time between spawns (ms)
    pub interval_ms: f64,
    last_spawn: f64,
}

impl SpawnScheduler {
    /// Start counting from `now`; the first obstacle appears one interval later
    pub fn new(interval_ms: f64, now: f64) -> Self {
        Self {
            interval_ms,
            last_spawn: now,
        }
    }

    pub fn last_spawn(&self) -> f64 {
        self.last_spawn
    }

    /// Spawn at most one obstacle if the interval has elapsed.
    ///
    /// Time that passed beyond one interval is not caught up. Degenerate
    /// viewports skip the tick without touching the timer.
    pub fn maybe_spawn(
        &mut self,
        now: f64,
        viewport: Viewport,
        store: &mut EntityStore,
        settings: &Settings,
        rng: &mut impl Rng,
    ) -> Option<(u32, ObstacleKind)> {
        if now - self.last_spawn < self.interval_ms || viewport.is_degenerate() {
            return None;
        }

        let x = spawn_x(viewport.width, settings.spawn_margin, rng);
        let kind = ObstacleKind::ALL[rng.random_range(0..ObstacleKind::ALL.len())];
        let (lo, hi) = ordered(settings.obstacle_min_speed, settings.obstacle_max_speed);
        let speed = rng.random_range(lo..=hi);

        let id = store.add_obstacle(kind, Vec2::new(x, SPAWN_Y), speed, settings);
        self.last_spawn = now;
        log::debug!("Spawned {kind:?} #{id} at x={x:.1}, speed={speed:.1}");
        Some((id, kind))
    }
}

/// Uniform x in `[margin, width - margin]`; the margin shrinks on narrow screens
fn spawn_x(width: f32, margin: f32, rng: &mut impl Rng) -> f32 {
    let margin = margin.clamp(0.0, width * 0.5);
    let (lo, hi) = (margin, width - margin);
    if hi <= lo {
        return width * 0.5;
    }
    rng.random_range(lo..=hi)
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}
