use serde::Serialize;

use super::time::Tick;

/// Counters for one driver. Only ids, counts and scores; never board contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutoplayStats {
    pub ticks: u64,
    pub moves: u64,
    pub mismatches: u64,
    pub failed_ticks: u64,
    pub last_tick: Tick,
    pub last_score: Option<u64>,
    pub max_tile: Option<u32>,
}

impl AutoplayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&mut self, tick: Tick) {
        self.ticks += 1;
        self.last_tick = tick;
    }

    pub fn record_move(&mut self, mismatch: bool, score: Option<u64>, max_tile: Option<u32>) {
        self.moves += 1;
        if mismatch {
            self.mismatches += 1;
        }
        if score.is_some() {
            self.last_score = score;
        }
        self.max_tile = self.max_tile.max(max_tile);
    }

    pub fn record_failure(&mut self) {
        self.failed_ticks += 1;
    }
}
