//! Best-of leaderboard
//!
//! Keeps the most exciting battles found so far as replay tokens. Where the
//! JSON is stored is up to the caller.

use serde::{Deserialize, Serialize};

use crate::simulator::BattleResult;

/// Maximum number of battles to keep
pub const MAX_BEST_OF: usize = 50;

/// Best battles, sorted by score descending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestOf {
    pub entries: Vec<BattleResult>,
}

fn same_battle(a: &BattleResult, b: &BattleResult) -> bool {
    a.seed == b.seed && a.weapon_left == b.weapon_left && a.weapon_right == b.weapon_right
}

impl BestOf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if a score would make the board
    pub fn qualifies(&self, score: f32) -> bool {
        if self.entries.len() < MAX_BEST_OF {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score.total)
    }

    /// Rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: f32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score.total);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    pub fn contains(&self, seed: u64, left: &str, right: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.seed == seed && e.weapon_left == left && e.weapon_right == right)
    }

    /// Insert a battle. Saving the same battle twice keeps one entry.
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify.
    pub fn save(&mut self, result: BattleResult) -> Option<usize> {
        if let Some(i) = self.entries.iter().position(|e| same_battle(e, &result)) {
            return Some(i + 1);
        }
        if !self.qualifies(result.score.total) {
            return None;
        }

        let pos = self
            .entries
            .iter()
            .position(|e| result.score.total > e.score.total);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, result);
                i + 1
            }
            None => {
                self.entries.push(result);
                self.entries.len()
            }
        };
        self.entries.truncate(MAX_BEST_OF);
        log::debug!("Best-of entry saved at rank {} ({} entries)", rank, self.entries.len());
        Some(rank)
    }

    /// Remove a battle by its replay token
    pub fn remove(&mut self, seed: u64, left: &str, right: &str) -> Option<BattleResult> {
        let i = self
            .entries
            .iter()
            .position(|e| e.seed == seed && e.weapon_left == left && e.weapon_right == right)?;
        Some(self.entries.remove(i))
    }

    pub fn top(&self, n: usize) -> &[BattleResult] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn top_score(&self) -> Option<f32> {
        self.entries.first().map(|e| e.score.total)
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
