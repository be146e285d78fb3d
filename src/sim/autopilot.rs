//! Idle/demo mode - AI flies the craft
//!
//! Produces the same key events a player would, so the loop treats it like
//! any other input source.

use super::input::{HostEvent, Key};
use super::state::{Craft, Direction, EntityStore, Obstacle};
use crate::settings::Settings;

/// How far above the craft an obstacle counts as an immediate threat
const THREAT_RANGE: f32 = 180.0;
/// Horizontal dead zone when lining up a shot
const AIM_TOLERANCE: f32 = 6.0;

/// Key-driven AI pilot
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    held: Option<Key>,
    /// Alternates so every shot is a fresh key-down edge
    fire_held: bool,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget held keys (new session)
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Decide this tick's key events
    pub fn plan(&mut self, store: &EntityStore, settings: &Settings) -> Vec<HostEvent> {
        let mut events = Vec::new();
        let Some(craft) = store.craft.as_ref().filter(|c| c.alive) else {
            self.release(&mut events);
            return events;
        };

        let active = || store.obstacles.iter().filter(|o| o.is_active());

        // Dodge first: the closest obstacle about to reach the craft's row
        let threat = active()
            .filter(|o| is_threat(o, craft, settings))
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

        let direction = if let Some(threat) = threat {
            dodge(threat, craft)
        } else {
            // Line up under the lowest obstacle still above the craft
            let target = active()
                .filter(|o| o.pos.y < craft.pos.y - THREAT_RANGE)
                .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));
            match target {
                Some(o) if o.pos.x < craft.pos.x - AIM_TOLERANCE => Direction::Left,
                Some(o) if o.pos.x > craft.pos.x + AIM_TOLERANCE => Direction::Right,
                _ => Direction::None,
            }
        };
        self.steer(direction, &mut events);

        let aligned = active().any(|o| {
            o.pos.y < craft.pos.y && (o.pos.x - craft.pos.x).abs() <= o.radius
        });
        if self.fire_held {
            events.push(HostEvent::KeyUp(Key::Space));
            self.fire_held = false;
        } else if aligned {
            events.push(HostEvent::KeyDown(Key::Space));
            self.fire_held = true;
        }

        events
    }

    fn steer(&mut self, direction: Direction, events: &mut Vec<HostEvent>) {
        let wanted = match direction {
            Direction::Left => Some(Key::ArrowLeft),
            Direction::Right => Some(Key::ArrowRight),
            Direction::None => None,
        };
        if wanted == self.held {
            return;
        }
        if let Some(old) = self.held.take() {
            events.push(HostEvent::KeyUp(old));
        }
        if let Some(new) = wanted {
            events.push(HostEvent::KeyDown(new));
            self.held = Some(new);
        }
    }

    fn release(&mut self, events: &mut Vec<HostEvent>) {
        if let Some(old) = self.held.take() {
            events.push(HostEvent::KeyUp(old));
        }
        if self.fire_held {
            events.push(HostEvent::KeyUp(Key::Space));
            self.fire_held = false;
        }
    }
}

fn is_threat(o: &Obstacle, craft: &Craft, settings: &Settings) -> bool {
    let dy = craft.pos.y - o.pos.y;
    let reach = settings.craft_hit_radius + o.radius;
    dy > -settings.craft_hit_radius && dy < THREAT_RANGE && (o.pos.x - craft.pos.x).abs() < reach
}

/// Move away from the threat, or toward open space when pinned at an edge
fn dodge(threat: &Obstacle, craft: &Craft) -> Direction {
    let away = if threat.pos.x >= craft.pos.x {
        Direction::Left
    } else {
        Direction::Right
    };
    let pinned = match away {
        Direction::Left => craft.pos.x <= craft.min_x + 1.0,
        Direction::Right => craft.pos.x >= craft.max_x - 1.0,
        Direction::None => false,
    };
    if !pinned {
        return away;
    }
    match away {
        Direction::Left => Direction::Right,
        _ => Direction::Left,
    }
}
