//! Game loop
//!
//! [`GameLoop`] owns one play session at a time and advances it once per host
//! frame. Each tick runs in a fixed order:
//!
//! 1. apply queued host events (keys, touches, resize, pause)
//! 2. advance simulated time and fire due timers
//! 3. move craft, projectiles and obstacles
//! 4. fire a projectile if requested, cull projectiles off the top
//! 5. maybe spawn an obstacle
//! 6. resolve collisions (projectiles first, then the craft)
//! 7. cull obstacles off the bottom
//!
//! Once the craft is hit the session is frozen in `GameOver`; only timers
//! keep running until the end-of-session signal fires.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::autopilot::Autopilot;
use super::clock::SimClock;
use super::collision::{self, CollisionEvent};
use super::input::{HostEvent, InputReceiver, InputState};
use super::layout::Presentation;
use super::motion;
use super::schedule::{TimedAction, Timers};
use super::spawn::SpawnScheduler;
use super::state::{Direction, EntityStore, ObstacleKind, SessionPhase, Viewport};
use crate::consts::SIM_DT;
use crate::persistence::KeyValueStore;
use crate::score::{self, PlayerName, ResultsSummary, ScoreTracker};
use crate::settings::Settings;

/// Notifications for the host (rendering, audio, navigation)
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ProjectileFired { id: u32 },
    ObstacleSpawned { id: u32, kind: ObstacleKind },
    /// Obstacle started exploding
    ObstacleHit { id: u32 },
    ObstacleRemoved { id: u32 },
    /// Live score display value
    ScoreChanged { score: u64 },
    CraftHit { obstacle: u32 },
    /// Score has been finalized; explosion still playing
    GameOver { score: u64 },
    /// Leave the play screen and show these results
    SessionEnded(ResultsSummary),
    Paused,
    Resumed,
    /// Background and craft sprites must be rebuilt
    LayoutRebuilt(Presentation),
}

/// State of one play session
#[derive(Debug)]
pub struct Session {
    pub phase: SessionPhase,
    pub player: PlayerName,
    pub store: EntityStore,
    pub viewport: Viewport,
    pub presentation: Presentation,
    /// Ticks simulated while playing
    pub ticks: u64,
    spawner: SpawnScheduler,
    timers: Timers,
    clock: SimClock,
    rng: Pcg32,
    result: Option<ResultsSummary>,
}

impl Session {
    /// Current simulated time (ms)
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Number of pending timers
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Finalized results, once the craft was hit
    pub fn result(&self) -> Option<&ResultsSummary> {
        self.result.as_ref()
    }
}

/// Drives sessions from host frames
pub struct GameLoop {
    settings: Settings,
    scores: ScoreTracker,
    input: InputState,
    receiver: Option<InputReceiver>,
    autopilot: Option<Autopilot>,
    session: Option<Session>,
    /// Last viewport reported by the host
    viewport: Viewport,
    seed: u64,
    /// Events raised between ticks (resize, pause)
    pending: Vec<GameEvent>,
}

impl GameLoop {
    pub fn new(settings: Settings, store: Box<dyn KeyValueStore>, seed: u64) -> Self {
        let settings = settings.sanitized();
        let viewport = Viewport::new(settings.viewport_width, settings.viewport_height);
        Self {
            settings,
            scores: ScoreTracker::new(store),
            input: InputState::new(),
            receiver: None,
            autopilot: None,
            session: None,
            viewport,
            seed,
            pending: Vec::new(),
        }
    }

    /// Build a loop whose settings come from the store itself
    pub fn from_store(store: Box<dyn KeyValueStore>, seed: u64) -> Self {
        let settings = Settings::load(store.as_ref());
        Self::new(settings, store, seed)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scores(&self) -> &ScoreTracker {
        &self.scores
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Mutable session access for hosts that stage entities (tutorials, tests)
    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    pub fn phase(&self) -> Option<SessionPhase> {
        self.session.as_ref().map(|s| s.phase)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Running score of the current session
    pub fn score(&self) -> u64 {
        self.scores.current()
    }

    /// Receive host events from another thread
    pub fn attach_input(&mut self, receiver: InputReceiver) {
        self.receiver = Some(receiver);
    }

    /// Let the built-in pilot play (demo/attract mode)
    pub fn set_autopilot(&mut self, enabled: bool) {
        if enabled && self.autopilot.is_none() {
            self.autopilot = Some(Autopilot::new());
        } else if !enabled {
            self.autopilot = None;
            self.input.clear();
        }
    }

    /// Start a new session for `player`, replacing any running one.
    /// `now_ms` is the host timestamp the session starts at.
    pub fn start(&mut self, player: PlayerName, now_ms: f64) {
        self.teardown();

        let store = EntityStore::with_craft(self.viewport, &self.settings);
        let session_seed = self.seed;
        self.seed = self.seed.wrapping_add(1);

        self.scores.begin(player.clone());
        if let Some(pilot) = self.autopilot.as_mut() {
            pilot.reset();
        }

        log::info!(
            "Session started for {} ({}x{}, seed {})",
            player,
            self.viewport.width,
            self.viewport.height,
            session_seed
        );

        self.session = Some(Session {
            phase: SessionPhase::Playing,
            player,
            store,
            viewport: self.viewport,
            presentation: Presentation::new(self.viewport),
            ticks: 0,
            spawner: SpawnScheduler::new(self.settings.spawn_interval_ms, 0.0),
            timers: Timers::new(),
            clock: SimClock::anchored(now_ms),
            rng: Pcg32::seed_from_u64(session_seed),
            result: None,
        });
    }

    /// Start a session for the name stored by the name-entry screen
    pub fn start_current_player(&mut self, now_ms: f64) {
        let player = score::current_player(self.scores.store());
        self.start(player, now_ms);
    }

    /// Tear the session down: cancel timers, detach input, drop entities.
    /// Returns the session's finalized results.
    pub fn end(&mut self) -> Option<ResultsSummary> {
        self.receiver = None;
        self.teardown()
    }

    /// Drop the session. A session quit before the craft was hit is
    /// finalized here so its score still counts.
    fn teardown(&mut self) -> Option<ResultsSummary> {
        self.input.clear();
        self.pending.clear();
        let mut session = self.session.take()?;
        let cancelled = session.timers.cancel_all();
        log::info!(
            "Session for {} torn down ({:?}, {} timers cancelled)",
            session.player,
            session.phase,
            cancelled
        );
        match session.result {
            Some(result) => Some(result),
            None => Some(self.scores.finalize(&session.player)),
        }
    }

    /// Apply one host event right away
    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::KeyDown(key) => self.input.key_down(key),
            HostEvent::KeyUp(key) => self.input.key_up(key),
            HostEvent::PointerDown { x } => self.input.pointer_down(x),
            HostEvent::PointerMove { x } => self.input.pointer_move(x),
            HostEvent::PointerUp => self.input.pointer_up(),
            HostEvent::FireButton => self.input.fire_button(),
            HostEvent::TogglePause => self.toggle_pause(),
            HostEvent::Resize { width, height } => {
                self.resize(width, height);
            }
        }
    }

    /// Pause or resume the session
    pub fn toggle_pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.phase {
            SessionPhase::Playing => {
                session.phase = SessionPhase::Paused;
                self.input.clear();
                self.pending.push(GameEvent::Paused);
                log::info!("Paused");
            }
            SessionPhase::Paused => {
                session.phase = SessionPhase::Playing;
                self.pending.push(GameEvent::Resumed);
                log::info!("Resumed");
            }
            SessionPhase::GameOver | SessionPhase::Ended => {}
        }
    }

    /// Viewport changed: refit the craft and rebuild bound-dependent visuals.
    ///
    /// Score, obstacles and projectiles are left exactly as they are.
    pub fn resize(&mut self, width: f32, height: f32) -> Option<Presentation> {
        let viewport = Viewport::new(width, height);
        self.viewport = viewport;
        let session = self.session.as_mut()?;
        session.viewport = viewport;

        if viewport.is_degenerate() {
            log::warn!("Ignoring degenerate viewport {width}x{height}");
            return None;
        }
        if let Some(craft) = session.store.craft.as_mut() {
            craft.fit_to(viewport, &self.settings);
        }
        session.presentation.rebuild(viewport);
        log::info!("Viewport resized to {width}x{height}");

        let layout = session.presentation;
        self.pending.push(GameEvent::LayoutRebuilt(layout));
        Some(layout)
    }

    /// Advance one frame. `now_ms` is the host's frame timestamp.
    pub fn tick(&mut self, now_ms: f64) -> Vec<GameEvent> {
        if let Some(receiver) = self.receiver.as_ref() {
            for event in receiver.drain() {
                self.handle_event(event);
            }
        }

        let mut events = std::mem::take(&mut self.pending);
        let Some(session) = self.session.as_mut() else {
            return events;
        };

        let frozen = session.phase == SessionPhase::Paused;
        let now = session.clock.advance(now_ms, frozen);
        if frozen {
            return events;
        }

        // Timers
        for action in session.timers.drain_due(now) {
            match action {
                TimedAction::RemoveObstacle(id) => {
                    if session.store.remove_obstacle(id) {
                        log::debug!("Obstacle #{id} removed after explosion");
                        events.push(GameEvent::ObstacleRemoved { id });
                    }
                }
                TimedAction::EndSession => {
                    if session.phase == SessionPhase::GameOver {
                        session.phase = SessionPhase::Ended;
                        log::info!("Session ended for {}", session.player);
                        if let Some(result) = session.result.clone() {
                            events.push(GameEvent::SessionEnded(result));
                        }
                    }
                }
            }
        }

        if session.phase != SessionPhase::Playing {
            return events;
        }
        session.ticks += 1;

        if let Some(pilot) = self.autopilot.as_mut() {
            for event in pilot.plan(&session.store, &self.settings) {
                match event {
                    HostEvent::KeyDown(key) => self.input.key_down(key),
                    HostEvent::KeyUp(key) => self.input.key_up(key),
                    HostEvent::FireButton => self.input.fire_button(),
                    _ => {}
                }
            }
        }

        let settings = &self.settings;
        let viewport = session.viewport;

        // Motion
        let direction = if viewport.is_degenerate() {
            Direction::None
        } else {
            self.input.direction(viewport.width)
        };
        motion::advance(&mut session.store, direction, settings, SIM_DT);

        // Fire
        if self.input.take_fire() {
            if let Some(id) = session.store.fire(now, settings) {
                events.push(GameEvent::ProjectileFired { id });
            }
        }
        session.store.cull_projectiles(settings.projectile_cull_y);

        // Spawn
        let spawned = session.spawner.maybe_spawn(
            now,
            viewport,
            &mut session.store,
            settings,
            &mut session.rng,
        );
        if let Some((id, kind)) = spawned {
            events.push(GameEvent::ObstacleSpawned { id, kind });
        }

        // Collisions
        for hit in collision::resolve(&session.store, settings) {
            match hit {
                CollisionEvent::Kill {
                    projectile,
                    obstacle,
                } => {
                    session.store.remove_projectile(projectile);
                    if explode(session, obstacle, now, settings, &mut events) {
                        let score = self.scores.add_points(settings.points_per_kill);
                        events.push(GameEvent::ScoreChanged { score });
                    }
                }
                CollisionEvent::CraftHit { obstacle } => {
                    explode(session, obstacle, now, settings, &mut events);
                    events.push(GameEvent::CraftHit { obstacle });

                    if session.phase == SessionPhase::Playing {
                        session.phase = SessionPhase::GameOver;
                        if let Some(craft) = session.store.craft.as_mut() {
                            craft.alive = false;
                        }
                        let summary = self.scores.finalize(&session.player);
                        log::info!(
                            "Game over for {}: score {} (best {})",
                            summary.player,
                            summary.last_score,
                            summary.best_score
                        );
                        events.push(GameEvent::GameOver {
                            score: summary.last_score,
                        });
                        session.result = Some(summary);
                        session
                            .timers
                            .schedule(now + settings.game_over_delay_ms, TimedAction::EndSession);
                    }
                }
            }
        }

        // Cull (only the height matters here)
        if viewport.has_height() {
            let bottom = viewport.height + settings.obstacle_cull_margin;
            for id in session.store.cull_obstacles(bottom) {
                events.push(GameEvent::ObstacleRemoved { id });
            }
        }

        session.store.normalize_order();
        events
    }
}

/// Put an obstacle into its explosion state and schedule its removal.
/// False if it was already exploding or is gone.
fn explode(
    session: &mut Session,
    id: u32,
    now: f64,
    settings: &Settings,
    events: &mut Vec<GameEvent>,
) -> bool {
    let Some(obstacle) = session.store.obstacle_mut(id) else {
        return false;
    };
    if !obstacle.begin_destroying(now, settings.explosion_radius) {
        return false;
    }
    session
        .timers
        .schedule(now + settings.destroy_delay_ms, TimedAction::RemoveObstacle(id));
    log::debug!("Obstacle #{id} hit");
    events.push(GameEvent::ObstacleHit { id });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT_MS;
    use crate::persistence::MemoryStore;
    use crate::sim::input::Key;
    use crate::sim::state::ObstacleState;
    use glam::Vec2;

    fn new_loop() -> GameLoop {
        GameLoop::new(Settings::default(), Box::new(MemoryStore::new()), 12345)
    }

    /// Default tuning without automatic spawns
    fn quiet() -> Settings {
        Settings {
            spawn_interval_ms: 1e12,
            ..Default::default()
        }
    }

    fn ana() -> PlayerName {
        PlayerName::parse("Ana").unwrap()
    }

    fn session_mut(game: &mut GameLoop) -> &mut Session {
        game.session.as_mut().unwrap()
    }

    #[test]
    fn test_tick_without_session_is_noop() {
        let mut game = new_loop();
        assert!(game.tick(0.0).is_empty());
        assert!(game.tick(1000.0).is_empty());
        assert!(game.phase().is_none());
    }

    #[test]
    fn test_start_creates_craft() {
        let mut game = new_loop();
        game.start(ana(), 500.0);
        let session = game.session().unwrap();
        assert_eq!(session.phase, SessionPhase::Playing);
        assert!(session.store.craft.is_some());
        assert!(session.store.obstacles.is_empty());
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_fire_once_per_press() {
        let mut game = new_loop();
        game.start(ana(), 0.0);
        game.handle_event(HostEvent::KeyDown(Key::Space));

        let mut fired = 0;
        let mut t = 0.0;
        for _ in 0..5 {
            t += SIM_DT_MS;
            fired += game
                .tick(t)
                .iter()
                .filter(|e| matches!(e, GameEvent::ProjectileFired { .. }))
                .count();
        }
        assert_eq!(fired, 1);
        assert_eq!(game.session().unwrap().store.projectiles.len(), 1);
    }

    #[test]
    fn test_kill_scores_and_removes_after_delay() {
        let mut game = new_loop();
        game.start(ana(), 0.0);
        let settings = game.settings().clone();
        let session = session_mut(&mut game);
        let id = session.store.add_obstacle(
            ObstacleKind::MeteorA,
            Vec2::new(100.0, 100.0),
            0.0,
            &settings,
        );
        session.store.fire(0.0, &settings);
        session.store.projectiles[0].pos = Vec2::new(100.0, 110.0);

        let events = game.tick(10.0);
        assert!(events.contains(&GameEvent::ObstacleHit { id }));
        assert!(events.contains(&GameEvent::ScoreChanged { score: 1 }));
        assert_eq!(game.score(), 1);
        let session = game.session().unwrap();
        assert!(session.store.projectiles.is_empty());
        assert!(matches!(
            session.store.obstacle(id).unwrap().state,
            ObstacleState::Destroying { .. }
        ));

        // Still there just before the delay
        assert!(game.tick(309.0).is_empty());
        assert!(game.session().unwrap().store.obstacle(id).is_some());

        let events = game.tick(310.0);
        assert_eq!(events, vec![GameEvent::ObstacleRemoved { id }]);
        assert!(game.session().unwrap().store.obstacle(id).is_none());
        assert!(!game.tick(2000.0).contains(&GameEvent::ObstacleRemoved { id }));
    }

    #[test]
    fn test_craft_hit_ends_session() {
        let mut game = new_loop();
        game.start(ana(), 0.0);
        let settings = game.settings().clone();
        let session = session_mut(&mut game);
        let pos = session.store.craft.as_ref().unwrap().pos;
        let id = session.store.add_obstacle(ObstacleKind::Bomb, pos, 0.0, &settings);

        let events = game.tick(16.0);
        assert!(events.contains(&GameEvent::CraftHit { obstacle: id }));
        assert!(events.contains(&GameEvent::GameOver { score: 0 }));
        assert_eq!(game.phase(), Some(SessionPhase::GameOver));
        assert!(!game.session().unwrap().store.craft.as_ref().unwrap().alive);

        // Explosion removed at +300ms, session handed back at +800ms
        let events = game.tick(316.0);
        assert_eq!(events, vec![GameEvent::ObstacleRemoved { id }]);
        assert!(game.tick(815.0).is_empty());

        let events = game.tick(816.0);
        assert_eq!(events.len(), 1);
        let GameEvent::SessionEnded(summary) = &events[0] else {
            panic!("expected SessionEnded, got {events:?}");
        };
        assert_eq!(summary.player, ana());
        assert_eq!(game.phase(), Some(SessionPhase::Ended));
        assert!(game.tick(5000.0).is_empty());
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut game = new_loop();
        game.start(ana(), 0.0);
        assert!(game.tick(16.0).is_empty());
        game.handle_event(HostEvent::TogglePause);
        assert_eq!(game.tick(32.0), vec![GameEvent::Paused]);

        // Ten seconds paused: nothing spawns
        assert!(game.tick(10_000.0).is_empty());
        assert_eq!(game.session().unwrap().now(), 16.0);

        game.handle_event(HostEvent::TogglePause);
        let events = game.tick(10_016.0);
        assert_eq!(events, vec![GameEvent::Resumed]);
        assert_eq!(game.session().unwrap().now(), 32.0);
        assert!(game.session().unwrap().store.obstacles.is_empty());
    }

    #[test]
    fn test_resize_keeps_entities_and_score() {
        let mut game = new_loop();
        game.start(ana(), 0.0);
        let settings = game.settings().clone();
        game.scores.add_points(4);
        let session = session_mut(&mut game);
        session.store.add_obstacle(
            ObstacleKind::MeteorB,
            Vec2::new(300.0, 200.0),
            0.0,
            &settings,
        );
        session.store.craft.as_mut().unwrap().pos.x = 330.0;

        let layout = game.resize(200.0, 500.0).unwrap();
        assert_eq!(layout.generation, 1);
        let session = game.session().unwrap();
        let craft = session.store.craft.as_ref().unwrap();
        assert_eq!(craft.max_x, 176.0);
        assert_eq!(craft.pos.x, 176.0);
        assert_eq!(craft.pos.y, 420.0);
        assert_eq!(session.store.obstacles[0].pos, Vec2::new(300.0, 200.0));
        assert_eq!(game.score(), 4);

        assert_eq!(game.tick(1.0), vec![GameEvent::LayoutRebuilt(layout)]);
    }

    #[test]
    fn test_degenerate_viewport_skips_spawning() {
        let mut game = new_loop();
        game.start(ana(), 0.0);
        assert!(game.resize(0.0, 0.0).is_none());
        game.handle_event(HostEvent::KeyDown(Key::ArrowLeft));
        let x0 = game.session().unwrap().store.craft.as_ref().unwrap().pos.x;
        let mut t = 0.0;
        for _ in 0..200 {
            t += 10.0;
            game.tick(t);
        }
        let session = game.session().unwrap();
        assert!(session.store.obstacles.is_empty());
        assert_eq!(session.store.craft.as_ref().unwrap().pos.x, x0);
    }

    #[test]
    fn test_zero_width_viewport_still_culls_obstacles() {
        let mut game = GameLoop::new(quiet(), Box::new(MemoryStore::new()), 7);
        game.start(ana(), 0.0);
        let settings = game.settings().clone();
        let id = session_mut(&mut game).store.add_obstacle(
            ObstacleKind::MeteorA,
            Vec2::new(20.0, 600.0),
            300.0,
            &settings,
        );
        assert!(game.resize(0.0, 640.0).is_none());

        let bound = 640.0 + settings.obstacle_cull_margin;
        let mut removed = false;
        let mut t = 0.0;
        for _ in 0..120 {
            t += SIM_DT_MS;
            removed |= game.tick(t).contains(&GameEvent::ObstacleRemoved { id });
            for o in &game.session().unwrap().store.obstacles {
                assert!(o.pos.y <= bound, "obstacle kept past {bound}: {}", o.pos.y);
            }
        }
        assert!(removed);
        assert!(game.session().unwrap().store.obstacles.is_empty());
    }

    #[test]
    fn test_start_on_degenerate_viewport_centers_craft_after_resize() {
        let mut game = new_loop();
        game.resize(0.0, 0.0);
        game.start(ana(), 0.0);
        game.resize(360.0, 640.0).unwrap();

        let craft = game.session().unwrap().store.craft.clone().unwrap();
        assert_eq!((craft.min_x, craft.max_x), (24.0, 336.0));
        assert_eq!(craft.pos.x, 180.0);
        assert_eq!(craft.pos.y, 560.0);
    }

    #[test]
    fn test_end_cancels_timers_and_detaches_input() {
        let mut game = new_loop();
        let (tx, rx) = crate::sim::input::channel();
        game.attach_input(rx);
        game.start(ana(), 0.0);
        let settings = game.settings().clone();
        let session = session_mut(&mut game);
        let pos = session.store.craft.as_ref().unwrap().pos;
        session.store.add_obstacle(ObstacleKind::Bomb, pos, 0.0, &settings);
        game.tick(16.0);
        assert_eq!(game.session().unwrap().pending_timers(), 2);

        let result = game.end().unwrap();
        assert_eq!(result.last_score, 0);
        assert!(game.session().is_none());
        assert!(!tx.send(HostEvent::FireButton));
        assert!(game.tick(5000.0).is_empty());
    }

    #[test]
    fn test_channel_input_applied_on_tick() {
        let mut game = new_loop();
        let (tx, rx) = crate::sim::input::channel();
        game.attach_input(rx);
        game.start(ana(), 0.0);
        tx.send(HostEvent::KeyDown(Key::ArrowRight));
        tx.send(HostEvent::FireButton);

        let x0 = game.session().unwrap().store.craft.as_ref().unwrap().pos.x;
        let events = game.tick(SIM_DT_MS);
        assert!(events.iter().any(|e| matches!(e, GameEvent::ProjectileFired { .. })));
        assert!(game.session().unwrap().store.craft.as_ref().unwrap().pos.x > x0);
    }

    #[test]
    fn test_determinism() {
        let run = || {
            let mut game = new_loop();
            game.start(ana(), 0.0);
            let mut t = 0.0;
            for _ in 0..600 {
                t += SIM_DT_MS;
                game.tick(t);
            }
            game.session()
                .unwrap()
                .store
                .obstacles
                .iter()
                .map(|o| (o.kind, o.pos.x.to_bits(), o.vel.y.to_bits()))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
