//! Meteor Rush entry point
//!
//! The web build embeds the library in a canvas host. Natively this runs a
//! headless demo: the autopilot plays sessions on a virtual 60 Hz clock and
//! the results are logged.
//!
//! Usage: `meteor-rush [easy|normal|hard] [player-name] [sessions]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use meteor_rush::consts::SIM_DT_MS;
    use meteor_rush::persistence::MemoryStore;
    use meteor_rush::score::register_player;
    use meteor_rush::sim::{GameEvent, GameLoop};
    use meteor_rush::{Difficulty, Settings};

    env_logger::init();
    log::info!("Meteor Rush (native) starting...");

    let mut args = std::env::args().skip(1);
    let difficulty = args
        .next()
        .and_then(|s| Difficulty::from_str(&s))
        .unwrap_or_default();
    let player = args.next().unwrap_or_else(|| "Demo".to_string());
    let sessions: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(3);

    let mut store = MemoryStore::new();
    let settings = Settings::from_difficulty(difficulty);
    if let Err(err) = settings.save(&mut store) {
        log::warn!("Could not store settings: {err}");
    }
    if register_player(&mut store, &player).is_none() {
        log::warn!("Empty player name, playing as the default player");
    }

    let mut game = GameLoop::from_store(Box::new(store), 0x5eed);
    game.set_autopilot(true);

    // Ten simulated minutes per session at most
    const MAX_TICKS: u32 = 60 * 60 * 10;

    for round in 1..=sessions {
        let mut t = 0.0;
        game.start_current_player(t);

        let mut summary = None;
        for _ in 0..MAX_TICKS {
            t += SIM_DT_MS;
            for event in game.tick(t) {
                match event {
                    GameEvent::ScoreChanged { score } => log::debug!("Score: {score}"),
                    GameEvent::SessionEnded(result) => summary = Some(result),
                    _ => {}
                }
            }
            if summary.is_some() {
                break;
            }
        }

        // A session that outlived the time limit is finalized on teardown
        let survived = summary.is_none();
        if let Some(result) = summary.or_else(|| game.end()) {
            println!(
                "Round {round} ({}): {} scored {} (best {}){}{}",
                difficulty.as_str(),
                result.player,
                result.last_score,
                result.best_score,
                if survived { " - survived" } else { "" },
                if result.is_new_record { " - new record!" } else { "" }
            );
        }
    }

    println!("\nRanking:");
    for (i, entry) in game.scores().ranking().entries().iter().enumerate() {
        println!("{:>2}. {:<16} {}", i + 1, entry.name, entry.score);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web host drives `GameLoop` directly; nothing to do here
}
