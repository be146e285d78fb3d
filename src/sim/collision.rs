//! Collision detection
//!
//! Proximity checks between circles. [`resolve`] only reads the store and
//! reports what collided; the loop applies the outcome (scoring, state
//! changes, removals) so this stays easy to test in isolation.

use glam::Vec2;

use super::state::{EntityStore, Obstacle, ObstacleState};
use crate::settings::Settings;

/// Something the loop must act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEvent {
    /// A projectile struck an active obstacle
    Kill { projectile: u32, obstacle: u32 },
    /// An obstacle reached the craft
    CraftHit { obstacle: u32 },
}

/// Whether two circles overlap (touching counts)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance_squared(b) <= (ra + rb) * (ra + rb)
}

/// Distance at which the craft and `obstacle` collide, if they can at all
pub fn craft_threshold(obstacle: &Obstacle, settings: &Settings) -> Option<f32> {
    match obstacle.state {
        ObstacleState::Active => Some(settings.craft_hit_radius),
        ObstacleState::Destroying { .. } if settings.blast_hits_craft => {
            Some(settings.craft_blast_radius)
        }
        ObstacleState::Destroying { .. } => None,
    }
}

/// Detect this tick's collisions.
///
/// Projectile pass first, then the craft pass. Both walk entities in id
/// order. A projectile kills at most one obstacle and an obstacle dies at
/// most once; obstacles killed in the projectile pass count as exploding
/// for the craft pass.
pub fn resolve(store: &EntityStore, settings: &Settings) -> Vec<CollisionEvent> {
    let mut events = Vec::new();
    let mut killed: Vec<u32> = Vec::new();

    for projectile in &store.projectiles {
        let target = store.obstacles.iter().find(|o| {
            o.is_active()
                && !killed.contains(&o.id)
                && circles_overlap(projectile.pos, settings.projectile_radius, o.pos, o.radius)
        });
        if let Some(obstacle) = target {
            killed.push(obstacle.id);
            events.push(CollisionEvent::Kill {
                projectile: projectile.id,
                obstacle: obstacle.id,
            });
        }
    }

    let craft = match &store.craft {
        Some(craft) if craft.alive => craft,
        _ => return events,
    };

    for obstacle in &store.obstacles {
        let threshold = if killed.contains(&obstacle.id) {
            // Just started exploding this tick
            settings.blast_hits_craft.then_some(settings.craft_blast_radius)
        } else {
            craft_threshold(obstacle, settings)
        };
        let Some(threshold) = threshold else {
            continue;
        };
        if craft.pos.distance_squared(obstacle.pos) <= threshold * threshold {
            events.push(CollisionEvent::CraftHit {
                obstacle: obstacle.id,
            });
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{ObstacleKind, Viewport};

    fn setup() -> (EntityStore, Settings) {
        let settings = Settings::default();
        let store = EntityStore::with_craft(Viewport::new(360.0, 640.0), &settings);
        (store, settings)
    }

    fn craft_pos(store: &EntityStore) -> Vec2 {
        store.craft.as_ref().unwrap().pos
    }

    #[test]
    fn test_circles_overlap_symmetric() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert!(circles_overlap(a, 4.0, b, 6.0));
        assert!(circles_overlap(b, 6.0, a, 4.0));
        assert!(!circles_overlap(a, 4.0, b, 5.9));
        assert!(!circles_overlap(b, 5.9, a, 4.0));
    }

    #[test]
    fn test_projectile_kill() {
        let (mut store, settings) = setup();
        let obstacle = store.add_obstacle(
            ObstacleKind::MeteorA,
            Vec2::new(100.0, 100.0),
            0.0,
            &settings,
        );
        let projectile = store.fire(0.0, &settings).unwrap();
        store.projectiles[0].pos = Vec2::new(100.0, 130.0);

        assert_eq!(
            resolve(&store, &settings),
            vec![CollisionEvent::Kill { projectile, obstacle }]
        );
    }

    #[test]
    fn test_threshold_scales_with_kind() {
        let (mut store, settings) = setup();
        // 36px apart: inside meteor B (34 + 6) but outside bomb (22 + 6)
        store.add_obstacle(
            ObstacleKind::MeteorB,
            Vec2::new(100.0, 100.0),
            0.0,
            &settings,
        );
        store.add_obstacle(ObstacleKind::Bomb, Vec2::new(250.0, 100.0), 0.0, &settings);
        store.fire(0.0, &settings);
        store.fire(0.0, &settings);
        store.projectiles[0].pos = Vec2::new(100.0, 136.0);
        store.projectiles[1].pos = Vec2::new(250.0, 136.0);

        let events = resolve(&store, &settings);
        assert_eq!(events.len(), 1);
        let CollisionEvent::Kill { obstacle, .. } = events[0] else {
            panic!("expected a kill");
        };
        assert_eq!(store.obstacle(obstacle).unwrap().kind, ObstacleKind::MeteorB);
    }

    #[test]
    fn test_one_kill_per_obstacle() {
        let (mut store, settings) = setup();
        store.add_obstacle(
            ObstacleKind::MeteorA,
            Vec2::new(100.0, 100.0),
            0.0,
            &settings,
        );
        store.fire(0.0, &settings);
        store.fire(0.0, &settings);
        store.projectiles[0].pos = Vec2::new(100.0, 110.0);
        store.projectiles[1].pos = Vec2::new(100.0, 105.0);

        let events = resolve(&store, &settings);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_exploding_obstacle_not_hit_again() {
        let (mut store, settings) = setup();
        let id = store.add_obstacle(
            ObstacleKind::MeteorA,
            Vec2::new(100.0, 100.0),
            0.0,
            &settings,
        );
        store.obstacle_mut(id).unwrap().begin_destroying(0.0, settings.explosion_radius);
        store.fire(0.0, &settings);
        store.projectiles[0].pos = Vec2::new(100.0, 100.0);
        assert!(resolve(&store, &settings).is_empty());
    }

    #[test]
    fn test_craft_hit() {
        let (mut store, settings) = setup();
        let pos = craft_pos(&store);
        let near = store.add_obstacle(
            ObstacleKind::Bomb,
            pos + Vec2::new(0.0, -39.0),
            0.0,
            &settings,
        );
        store.add_obstacle(
            ObstacleKind::Bomb,
            pos + Vec2::new(0.0, -41.0),
            0.0,
            &settings,
        );

        assert_eq!(
            resolve(&store, &settings),
            vec![CollisionEvent::CraftHit { obstacle: near }]
        );
    }

    #[test]
    fn test_blast_radius_optional() {
        let (mut store, mut settings) = setup();
        let pos = craft_pos(&store);
        let id = store.add_obstacle(
            ObstacleKind::MeteorA,
            pos + Vec2::new(0.0, -100.0),
            0.0,
            &settings,
        );
        store.obstacle_mut(id).unwrap().begin_destroying(0.0, settings.explosion_radius);

        assert!(resolve(&store, &settings).is_empty());

        settings.blast_hits_craft = true;
        assert_eq!(
            resolve(&store, &settings),
            vec![CollisionEvent::CraftHit { obstacle: id }]
        );
    }

    #[test]
    fn test_kill_shields_craft_same_tick() {
        let (mut store, settings) = setup();
        let pos = craft_pos(&store);
        store.add_obstacle(
            ObstacleKind::MeteorA,
            pos + Vec2::new(0.0, -35.0),
            0.0,
            &settings,
        );
        store.fire(0.0, &settings);
        store.projectiles[0].pos = pos + Vec2::new(0.0, -35.0);

        let events = resolve(&store, &settings);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], CollisionEvent::Kill { .. }));
    }

    #[test]
    fn test_dead_craft_not_checked() {
        let (mut store, settings) = setup();
        let pos = craft_pos(&store);
        store.add_obstacle(ObstacleKind::MeteorA, pos, 0.0, &settings);
        store.craft.as_mut().unwrap().alive = false;
        assert!(resolve(&store, &settings).is_empty());
    }
}
