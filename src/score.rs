//! Score bookkeeping
//!
//! Tracks the running score of a session and, when the session ends,
//! persists it as the player's last score, updates their best score and
//! upserts the ranking table.
//!
//! Storage failures never interrupt play: the tracker switches to an
//! in-memory overlay for the rest of the session and keeps scoring.

use serde::{Deserialize, Serialize};

use crate::highscores::RankingTable;
use crate::persistence::{KeyValueStore, MemoryStore, StoreError, keys, read_score};

/// Name used when no player name was ever entered
pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// A validated (trimmed, non-empty) player name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerName(String);

impl PlayerName {
    /// Trim and validate a typed name
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PlayerName {
    fn default() -> Self {
        Self(DEFAULT_PLAYER_NAME.to_string())
    }
}

impl std::fmt::Display for PlayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store the name typed on the name-entry screen.
pub fn register_player(store: &mut dyn KeyValueStore, raw: &str) -> Option<PlayerName> {
    let name = PlayerName::parse(raw)?;
    if let Err(err) = store.set(keys::PLAYER_NAME, name.as_str()) {
        log::warn!("Could not store player name: {err}");
    }
    Some(name)
}

/// The player name last entered, or the default name
pub fn current_player(store: &dyn KeyValueStore) -> PlayerName {
    match store.get(keys::PLAYER_NAME) {
        Ok(Some(raw)) => PlayerName::parse(&raw).unwrap_or_default(),
        Ok(None) => PlayerName::default(),
        Err(err) => {
            log::warn!("Failed to read player name: {err}");
            PlayerName::default()
        }
    }
}

/// What the results screen shows after a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsSummary {
    pub player: PlayerName,
    pub last_score: u64,
    pub best_score: u64,
    /// Last score matched or beat the stored best
    pub is_new_record: bool,
    pub ranking: RankingTable,
}

/// Running score plus persisted last/best scores and the ranking table
pub struct ScoreTracker {
    store: Box<dyn KeyValueStore>,
    /// Writes that failed land here; reads check it first
    overlay: MemoryStore,
    degraded: bool,
    player: PlayerName,
    current: u64,
    /// Best score stored for `player` when the session started
    best_at_start: u64,
}

impl ScoreTracker {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            overlay: MemoryStore::new(),
            degraded: false,
            player: PlayerName::default(),
            current: 0,
            best_at_start: 0,
        }
    }

    /// Reset the running score for a new session
    pub fn begin(&mut self, player: PlayerName) {
        self.current = 0;
        self.best_at_start = self.best_score(&player);
        log::info!(
            "Scoring session for {} (best so far: {})",
            player,
            self.best_at_start
        );
        self.player = player;
    }

    /// Add points; returns the new running score
    pub fn add_points(&mut self, n: u64) -> u64 {
        self.current = self.current.saturating_add(n);
        self.current
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn player(&self) -> &PlayerName {
        &self.player
    }

    /// Best score for the HUD: the stored best, or the running score once it
    /// is higher. Nothing is persisted until `finalize`.
    pub fn display_best(&self) -> u64 {
        self.best_at_start.max(self.current)
    }

    /// Whether storage failed during this tracker's lifetime
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Last finalized score for `player`
    pub fn last_score(&self, player: &PlayerName) -> u64 {
        self.read_score(&keys::last_score(player.as_str()))
    }

    /// Best finalized score for `player`
    pub fn best_score(&self, player: &PlayerName) -> u64 {
        self.read_score(&keys::best_score(player.as_str()))
    }

    /// Current ranking table
    pub fn ranking(&self) -> RankingTable {
        if self.degraded && self.overlay.contains_key(keys::RANKING_TABLE) {
            return RankingTable::load(&self.overlay);
        }
        RankingTable::load(self.store.as_ref())
    }

    /// Persist the running score for `player`.
    ///
    /// Writes the last score, raises the best score if beaten and upserts the
    /// ranking table with the player's best.
    pub fn finalize(&mut self, player: &PlayerName) -> ResultsSummary {
        let score = self.current;
        let name = player.as_str();

        self.write(&keys::last_score(name), &score.to_string());

        let previous_best = self.best_score(player);
        let best = if score > previous_best {
            self.write(&keys::best_score(name), &score.to_string());
            log::info!("New best for {name}: {score} (was {previous_best})");
            score
        } else {
            previous_best
        };

        let mut ranking = self.ranking();
        if ranking.upsert(name, best) {
            self.save_ranking(&ranking);
        }

        ResultsSummary {
            player: player.clone(),
            last_score: score,
            best_score: best,
            is_new_record: score >= best,
            ranking,
        }
    }

    /// Summary of the stored results for the tracker's player
    pub fn summary(&self) -> ResultsSummary {
        let last_score = self.last_score(&self.player);
        let best_score = self.best_score(&self.player);
        ResultsSummary {
            player: self.player.clone(),
            last_score,
            best_score,
            is_new_record: last_score >= best_score,
            ranking: self.ranking(),
        }
    }

    /// Backing store (for the host's results screen)
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    fn read_score(&self, key: &str) -> u64 {
        if self.degraded && self.overlay.contains_key(key) {
            return read_score(&self.overlay, key);
        }
        read_score(self.store.as_ref(), key)
    }

    fn write(&mut self, key: &str, value: &str) {
        if !self.degraded {
            match self.store.set(key, value) {
                Ok(()) => return,
                Err(err) => self.degrade(&err),
            }
        }
        // MemoryStore writes cannot fail
        let _ = self.overlay.set(key, value);
    }

    fn save_ranking(&mut self, ranking: &RankingTable) {
        if !self.degraded {
            match ranking.save(self.store.as_mut()) {
                Ok(()) => return,
                Err(err) => self.degrade(&err),
            }
        }
        let _ = ranking.save(&mut self.overlay);
    }

    fn degrade(&mut self, err: &StoreError) {
        log::warn!("Score storage failed ({err}); keeping scores in memory for this session");
        self.degraded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};

    /// Reads succeed (empty), writes always fail
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Rejected {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            })
        }
    }

    fn ana() -> PlayerName {
        PlayerName::parse("Ana").unwrap()
    }

    fn tracker_with_score(score: u64) -> ScoreTracker {
        let mut tracker = ScoreTracker::new(Box::new(MemoryStore::new()));
        tracker.begin(ana());
        tracker.add_points(score);
        tracker
    }

    #[test]
    fn test_player_name_parse() {
        assert_eq!(PlayerName::parse("  Ana ").unwrap().as_str(), "Ana");
        assert!(PlayerName::parse("   ").is_none());
        assert!(PlayerName::parse("").is_none());
    }

    #[test]
    fn test_register_and_current_player() {
        let mut store = MemoryStore::new();
        assert_eq!(current_player(&store).as_str(), DEFAULT_PLAYER_NAME);
        assert!(register_player(&mut store, " ").is_none());
        assert_eq!(current_player(&store).as_str(), DEFAULT_PLAYER_NAME);

        register_player(&mut store, " Bo ").unwrap();
        assert_eq!(current_player(&store).as_str(), "Bo");
    }

    #[test]
    fn test_add_points_counts() {
        let mut tracker = ScoreTracker::new(Box::new(MemoryStore::new()));
        tracker.begin(ana());
        for _ in 0..7 {
            tracker.add_points(1);
        }
        assert_eq!(tracker.current(), 7);
        tracker.add_points(0);
        assert_eq!(tracker.current(), 7);
    }

    #[test]
    fn test_finalize_improves_best() {
        let mut tracker = tracker_with_score(4);
        let summary = tracker.finalize(&ana());
        assert_eq!(summary.last_score, 4);
        assert_eq!(summary.best_score, 4);
        assert!(summary.is_new_record);
        assert_eq!(tracker.best_score(&ana()), 4);
        assert_eq!(tracker.last_score(&ana()), 4);
        assert_eq!(tracker.ranking().score_of("Ana"), Some(4));
    }

    #[test]
    fn test_finalize_keeps_higher_best() {
        let mut tracker = tracker_with_score(5);
        tracker.finalize(&ana());

        tracker.begin(ana());
        tracker.add_points(3);
        let summary = tracker.finalize(&ana());
        assert_eq!(summary.last_score, 3);
        assert_eq!(summary.best_score, 5);
        assert!(!summary.is_new_record);
        assert_eq!(tracker.last_score(&ana()), 3);
        assert_eq!(tracker.ranking().score_of("Ana"), Some(5));
    }

    #[test]
    fn test_display_best() {
        let mut tracker = tracker_with_score(6);
        tracker.finalize(&ana());

        tracker.begin(ana());
        assert_eq!(tracker.display_best(), 6);
        tracker.add_points(9);
        assert_eq!(tracker.display_best(), 9);
        // Not persisted until finalize
        assert_eq!(tracker.best_score(&ana()), 6);
    }

    #[test]
    fn test_summary_reads_stored_values() {
        let mut tracker = tracker_with_score(2);
        tracker.finalize(&ana());
        let summary = tracker.summary();
        assert_eq!(summary.player, ana());
        assert_eq!(summary.last_score, 2);
        assert_eq!(summary.ranking.len(), 1);
    }

    #[test]
    fn test_storage_failure_degrades_to_memory() {
        let mut tracker = ScoreTracker::new(Box::new(ReadOnlyStore));
        tracker.begin(ana());
        tracker.add_points(3);
        let summary = tracker.finalize(&ana());

        assert!(tracker.is_degraded());
        assert_eq!(summary.best_score, 3);
        assert_eq!(tracker.last_score(&ana()), 3);
        assert_eq!(tracker.best_score(&ana()), 3);
        assert_eq!(tracker.ranking().score_of("Ana"), Some(3));
    }

    proptest! {
        #[test]
        fn prop_finalize_sequences_keep_ranking_consistent(
            rounds in prop::collection::vec((0usize..4, 0u64..50), 1..40),
        ) {
            let pool = ["Ana", "Bo", "Cy", "Dee"];
            let mut tracker = ScoreTracker::new(Box::new(MemoryStore::new()));
            let mut best: HashMap<&str, u64> = HashMap::new();
            for (i, score) in rounds {
                let name = PlayerName::parse(pool[i]).unwrap();
                tracker.begin(name.clone());
                tracker.add_points(score);
                let summary = tracker.finalize(&name);
                let e = best.entry(pool[i]).or_insert(score);
                *e = (*e).max(score);
                prop_assert_eq!(summary.best_score, best[pool[i]]);
                prop_assert_eq!(tracker.last_score(&name), score);
            }

            // Reload from the raw store, not the tracker's cached view
            let table = RankingTable::load(tracker.store());
            prop_assert_eq!(&table, &tracker.ranking());
            prop_assert_eq!(table.len(), best.len());

            let mut seen = HashSet::new();
            for entry in table.entries() {
                prop_assert!(seen.insert(entry.name.clone()));
                prop_assert_eq!(Some(&entry.score), best.get(entry.name.as_str()));
                let stored = read_score(tracker.store(), &keys::best_score(&entry.name));
                prop_assert_eq!(stored, entry.score);
            }
            for pair in table.entries().windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }
    }
}
