//! Best-score ranking table
//!
//! One entry per player name holding that player's best score, kept sorted
//! descending. Persisted as a JSON array under `rankingTable`.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StoreError, keys};

/// A single ranking entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub score: u64,
}

/// Ranking table, unique by name, sorted by score (descending)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankingTable {
    entries: Vec<RankingEntry>,
}

impl RankingTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a table from arbitrary entries, deduplicating and sorting them
    pub fn from_entries(entries: impl IntoIterator<Item = RankingEntry>) -> Self {
        let mut table = Self::new();
        for entry in entries {
            table.upsert(&entry.name, entry.score);
        }
        table
    }

    /// Entries in rank order
    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    /// Record `score` for `name`, keeping the maximum seen for that name.
    /// Returns true if the table changed.
    pub fn upsert(&mut self, name: &str, score: u64) -> bool {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) if score <= entry.score => return false,
            Some(entry) => entry.score = score,
            None => self.entries.push(RankingEntry {
                name: name.to_string(),
                score,
            }),
        }
        // Stable sort: equal scores keep their previous relative order
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        true
    }

    /// Best score recorded for `name`
    pub fn score_of(&self, name: &str) -> Option<u64> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.score)
    }

    /// Rank of `name` (1-indexed)
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name).map(|i| i + 1)
    }

    /// Get the rank a new score would achieve (1-indexed)
    pub fn potential_rank(&self, score: u64) -> usize {
        let rank = self.entries.iter().position(|e| score > e.score);
        rank.unwrap_or(self.entries.len()) + 1
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// The first `n` entries
    pub fn top(&self, n: usize) -> &[RankingEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a stored table, dropping rows that don't decode.
    ///
    /// Anything that isn't a JSON array yields an empty table.
    pub fn from_json_lenient(json: &str) -> Self {
        let rows = match serde_json::from_str::<Vec<serde_json::Value>>(json) {
            Ok(rows) => rows,
            Err(err) => {
                log::warn!("Discarding unreadable ranking table: {err}");
                return Self::new();
            }
        };

        let mut dropped = 0usize;
        let entries: Vec<RankingEntry> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<RankingEntry>(row) {
                Ok(entry) => Some(entry),
                Err(_) => {
                    dropped += 1;
                    None
                }
            })
            .collect();
        if dropped > 0 {
            log::warn!("Dropped {dropped} malformed ranking entries");
        }

        Self::from_entries(entries)
    }

    /// Load the ranking table from the store. Missing or unreadable → empty.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(keys::RANKING_TABLE) {
            Ok(Some(json)) => {
                let table = Self::from_json_lenient(&json);
                log::debug!("Loaded {} ranking entries", table.len());
                table
            }
            Ok(None) => Self::new(),
            Err(err) => {
                log::warn!("Failed to read ranking table: {err}");
                Self::new()
            }
        }
    }

    /// Save the ranking table to the store
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        store.set(keys::RANKING_TABLE, &json)?;
        log::debug!("Ranking table saved ({} entries)", self.entries.len());
        Ok(())
    }
}
