//! Entity types and the entity store
//!
//! Logical state only: positions, velocities and lifecycle flags. Sprites,
//! textures and the background are rebuilt from this by the host.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Active gameplay
    Playing,
    /// Frozen by the player
    Paused,
    /// Craft was hit; explosion playing, score already finalized
    GameOver,
    /// Host has been told to leave the play screen
    Ended,
}

/// Host viewport in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Zero, negative or non-finite sizes can't host a game
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// A usable bottom edge, even if the width is degenerate
    pub fn has_height(&self) -> bool {
        self.height.is_finite() && self.height > 0.0
    }
}

/// Horizontal movement intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    /// Unit sign along x
    pub fn sign(&self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
            Direction::None => 0.0,
        }
    }
}

/// The player's craft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Craft {
    pub pos: Vec2,
    pub min_x: f32,
    pub max_x: f32,
    pub alive: bool,
}

impl Craft {
    /// Place a craft horizontally centered near the bottom of `viewport`
    pub fn new(viewport: Viewport, settings: &Settings) -> Self {
        let mut craft = Self {
            pos: Vec2::ZERO,
            min_x: 0.0,
            max_x: 0.0,
            alive: true,
        };
        craft.fit_to(viewport, settings);
        craft
    }

    /// Recompute clamp bounds and the fixed row for `viewport`, keeping x
    /// where it is (clamped). A craft that was never placed is centered.
    /// Degenerate viewports leave the craft untouched.
    pub fn fit_to(&mut self, viewport: Viewport, settings: &Settings) -> bool {
        if viewport.is_degenerate() {
            return false;
        }
        let unplaced = self.min_x == 0.0 && self.max_x == 0.0;
        let half = settings.craft_half_width.min(viewport.width * 0.5);
        self.min_x = half;
        self.max_x = viewport.width - half;
        self.pos.y = (viewport.height - settings.craft_bottom_offset).max(0.0);
        self.pos.x = if unplaced {
            (self.min_x + self.max_x) * 0.5
        } else {
            crate::clamp_span(self.pos.x, self.min_x, self.max_x)
        };
        true
    }

    /// Shift horizontally, staying inside the bounds
    pub fn shift(&mut self, dx: f32) {
        self.pos.x = crate::clamp_span(self.pos.x + dx, self.min_x, self.max_x);
    }
}

/// A projectile fired by the craft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    /// Always points up (negative y)
    pub vel: Vec2,
    /// Simulated time of creation (ms)
    pub fired_at: f64,
}

/// Obstacle variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    MeteorA,
    MeteorB,
    Bomb,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 3] = [
        ObstacleKind::MeteorA,
        ObstacleKind::MeteorB,
        ObstacleKind::Bomb,
    ];

    pub fn index(&self) -> usize {
        match self {
            ObstacleKind::MeteorA => 0,
            ObstacleKind::MeteorB => 1,
            ObstacleKind::Bomb => 2,
        }
    }

    /// Texture key the host draws while active
    pub fn texture(&self) -> &'static str {
        match self {
            ObstacleKind::MeteorA => "meteor_a",
            ObstacleKind::MeteorB => "meteor_b",
            ObstacleKind::Bomb => "bomb",
        }
    }
}

/// Obstacle lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleState {
    Active,
    /// Exploding; purged once the removal timer fires
    Destroying { since: f64 },
}

/// A falling obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    pub pos: Vec2,
    /// Downward speed in px/s
    pub vel: Vec2,
    pub state: ObstacleState,
    /// Current collision radius (grows while exploding)
    pub radius: f32,
}

impl Obstacle {
    pub fn is_active(&self) -> bool {
        self.state == ObstacleState::Active
    }

    /// Switch to the explosion state: stop, widen the footprint.
    /// Returns false if it was already exploding.
    pub fn begin_destroying(&mut self, now: f64, explosion_radius: f32) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = ObstacleState::Destroying { since: now };
        self.vel = Vec2::ZERO;
        self.radius = self.radius.max(explosion_radius);
        true
    }

    /// Texture key the host draws for the current state
    pub fn texture(&self) -> &'static str {
        match self.state {
            ObstacleState::Active => self.kind.texture(),
            ObstacleState::Destroying { .. } => "explosion",
        }
    }
}

/// Owns every live entity of a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    /// None until a session starts
    pub craft: Option<Craft>,
    /// Sorted by id
    pub projectiles: Vec<Projectile>,
    /// Sorted by id
    pub obstacles: Vec<Obstacle>,
    /// Next entity ID
    next_id: u32,
}

impl EntityStore {
    /// Create a store holding a freshly placed craft
    pub fn with_craft(viewport: Viewport, settings: &Settings) -> Self {
        Self {
            craft: Some(Craft::new(viewport, settings)),
            projectiles: Vec::new(),
            obstacles: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    /// Fire a projectile from the craft's nose. None without a live craft.
    pub fn fire(&mut self, now: f64, settings: &Settings) -> Option<u32> {
        let origin = match &self.craft {
            Some(craft) if craft.alive => {
                craft.pos - Vec2::new(0.0, crate::consts::PROJECTILE_MUZZLE_OFFSET)
            }
            _ => return None,
        };
        let id = self.next_entity_id();
        self.projectiles.push(Projectile {
            id,
            pos: origin,
            vel: Vec2::new(0.0, -settings.projectile_speed),
            fired_at: now,
        });
        Some(id)
    }

    /// Add an obstacle in the active state
    pub fn add_obstacle(
        &mut self,
        kind: ObstacleKind,
        pos: Vec2,
        speed: f32,
        settings: &Settings,
    ) -> u32 {
        let id = self.next_entity_id();
        self.obstacles.push(Obstacle {
            id,
            kind,
            pos,
            vel: Vec2::new(0.0, speed),
            state: ObstacleState::Active,
            radius: settings.obstacle_radii[kind.index()],
        });
        id
    }

    pub fn obstacle(&self, id: u32) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    pub fn obstacle_mut(&mut self, id: u32) -> Option<&mut Obstacle> {
        self.obstacles.iter_mut().find(|o| o.id == id)
    }

    /// Remove an obstacle; true if it was present
    pub fn remove_obstacle(&mut self, id: u32) -> bool {
        let before = self.obstacles.len();
        self.obstacles.retain(|o| o.id != id);
        self.obstacles.len() != before
    }

    /// Remove a projectile; true if it was present
    pub fn remove_projectile(&mut self, id: u32) -> bool {
        let before = self.projectiles.len();
        self.projectiles.retain(|p| p.id != id);
        self.projectiles.len() != before
    }

    /// Drop projectiles that left the top. Returns how many were removed.
    pub fn cull_projectiles(&mut self, top_y: f32) -> usize {
        let before = self.projectiles.len();
        self.projectiles.retain(|p| p.pos.y >= top_y);
        before - self.projectiles.len()
    }

    /// Drop obstacles that fell past `bottom_y`. Returns the removed ids.
    pub fn cull_obstacles(&mut self, bottom_y: f32) -> Vec<u32> {
        let mut culled = Vec::new();
        self.obstacles.retain(|o| {
            let keep = o.pos.y <= bottom_y;
            if !keep {
                culled.push(o.id);
            }
            keep
        });
        culled
    }

    /// Ensure collections are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.projectiles.sort_by_key(|p| p.id);
        self.obstacles.sort_by_key(|o| o.id);
    }
}
