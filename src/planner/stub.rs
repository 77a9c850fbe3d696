use std::future::Future;

use super::oracle::MoveOracle;
use crate::error::Result;
use crate::input::event::{KeyCode, Move};
use crate::state::snapshot::Grid;

/// Deterministic stand-in: cycles through a fixed move list, ignoring the board.
#[derive(Debug, Clone)]
pub struct CycleOracle {
    moves: Vec<Move>,
    next: usize,
}

impl CycleOracle {
    pub fn new(moves: Vec<Move>) -> Self {
        Self { moves, next: 0 }
    }
}

impl Default for CycleOracle {
    fn default() -> Self {
        Self::new(vec![Move::Up, Move::Right, Move::Down, Move::Left])
    }
}

impl MoveOracle for CycleOracle {
    fn decide(&mut self, _grid: &Grid) -> impl Future<Output = Result<KeyCode>> + Send {
        let mv = if self.moves.is_empty() {
            Move::Up
        } else {
            let mv = self.moves[self.next % self.moves.len()];
            self.next = self.next.wrapping_add(1);
            mv
        };
        async move { Ok(mv.key_code()) }
    }
}
