//! Game settings and tuning
//!
//! Every gameplay constant the loop reads lives here so it can be tuned per
//! difficulty and persisted alongside scores.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence::{KeyValueStore, StoreError, keys};

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Minimum time between obstacle spawns (ms)
    pub fn spawn_interval_ms(&self) -> f64 {
        match self {
            Difficulty::Easy => 1500.0,
            Difficulty::Normal => SPAWN_INTERVAL_MS,
            Difficulty::Hard => 500.0,
        }
    }

    /// Obstacle fall speed range (px/s)
    pub fn obstacle_speed(&self) -> (f32, f32) {
        match self {
            Difficulty::Easy => (100.0, 200.0),
            Difficulty::Normal => (OBSTACLE_MIN_SPEED, OBSTACLE_MAX_SPEED),
            Difficulty::Hard => (300.0, 600.0),
        }
    }
}

/// Game tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Preset the spawn values were derived from
    pub difficulty: Difficulty,

    // === Viewport ===
    /// Viewport used until the host reports its real size
    pub viewport_width: f32,
    pub viewport_height: f32,

    // === Craft ===
    pub craft_speed: f32,
    pub craft_half_width: f32,
    /// Distance from the bottom edge to the craft's center
    pub craft_bottom_offset: f32,

    // === Projectiles ===
    pub projectile_speed: f32,
    pub projectile_radius: f32,

    // === Spawning ===
    pub spawn_interval_ms: f64,
    /// Horizontal keep-out on both sides when picking a spawn x
    pub spawn_margin: f32,
    pub obstacle_min_speed: f32,
    pub obstacle_max_speed: f32,

    // === Collisions ===
    /// Collision radius per obstacle kind: meteor A, meteor B, bomb
    pub obstacle_radii: [f32; 3],
    /// Collision radius of an obstacle while its explosion plays
    pub explosion_radius: f32,
    /// Craft vs active obstacle distance
    pub craft_hit_radius: f32,
    /// Craft vs exploding obstacle distance (only if `blast_hits_craft`)
    pub craft_blast_radius: f32,
    pub blast_hits_craft: bool,

    // === Timing ===
    pub destroy_delay_ms: f64,
    pub game_over_delay_ms: f64,

    // === Scoring ===
    pub points_per_kill: u64,

    // === Culling ===
    pub projectile_cull_y: f32,
    pub obstacle_cull_margin: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,

            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,

            craft_speed: CRAFT_SPEED,
            craft_half_width: CRAFT_HALF_WIDTH,
            craft_bottom_offset: CRAFT_BOTTOM_OFFSET,

            projectile_speed: PROJECTILE_SPEED,
            projectile_radius: PROJECTILE_RADIUS,

            spawn_interval_ms: SPAWN_INTERVAL_MS,
            spawn_margin: SPAWN_MARGIN,
            obstacle_min_speed: OBSTACLE_MIN_SPEED,
            obstacle_max_speed: OBSTACLE_MAX_SPEED,

            obstacle_radii: [28.0, 34.0, 22.0],
            explosion_radius: EXPLOSION_RADIUS,
            craft_hit_radius: CRAFT_HIT_RADIUS,
            craft_blast_radius: CRAFT_BLAST_RADIUS,
            blast_hits_craft: false,

            destroy_delay_ms: DESTROY_DELAY_MS,
            game_over_delay_ms: GAME_OVER_DELAY_MS,

            points_per_kill: POINTS_PER_KILL,

            projectile_cull_y: PROJECTILE_CULL_Y,
            obstacle_cull_margin: OBSTACLE_CULL_MARGIN,
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset (applies preset defaults)
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let mut settings = Self::default();
        settings.apply_difficulty(difficulty);
        settings
    }

    /// Apply a difficulty preset (updates spawn rate and fall speeds)
    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.spawn_interval_ms = difficulty.spawn_interval_ms();
        let (min, max) = difficulty.obstacle_speed();
        self.obstacle_min_speed = min;
        self.obstacle_max_speed = max;
    }

    /// Copy with every range non-empty and every magnitude non-negative
    pub fn sanitized(&self) -> Self {
        let mut s = self.clone();
        let non_neg = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let non_neg_ms = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };

        s.craft_speed = non_neg(s.craft_speed);
        s.craft_half_width = non_neg(s.craft_half_width);
        s.craft_bottom_offset = non_neg(s.craft_bottom_offset);
        s.projectile_speed = non_neg(s.projectile_speed);
        s.projectile_radius = non_neg(s.projectile_radius);
        s.spawn_interval_ms = non_neg_ms(s.spawn_interval_ms);
        s.spawn_margin = non_neg(s.spawn_margin);

        s.obstacle_min_speed = non_neg(s.obstacle_min_speed);
        s.obstacle_max_speed = non_neg(s.obstacle_max_speed);
        if s.obstacle_min_speed > s.obstacle_max_speed {
            std::mem::swap(&mut s.obstacle_min_speed, &mut s.obstacle_max_speed);
        }

        for r in &mut s.obstacle_radii {
            *r = non_neg(*r);
        }
        s.explosion_radius = non_neg(s.explosion_radius);
        s.craft_hit_radius = non_neg(s.craft_hit_radius);
        s.craft_blast_radius = non_neg(s.craft_blast_radius);

        s.destroy_delay_ms = non_neg_ms(s.destroy_delay_ms);
        s.game_over_delay_ms = non_neg_ms(s.game_over_delay_ms);
        s.obstacle_cull_margin = non_neg(s.obstacle_cull_margin);
        s
    }

    /// Load settings from the store; missing or malformed → defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(keys::SETTINGS) {
            Ok(Some(json)) => match serde_json::from_str::<Settings>(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings ({})", settings.difficulty.as_str());
                    return settings.sanitized();
                }
                Err(err) => log::warn!("Ignoring malformed settings: {err}"),
            },
            Ok(None) => {}
            Err(err) => log::warn!("Failed to read settings: {err}"),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to the store
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.set(keys::SETTINGS, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
