use serde::{Deserialize, Serialize};

use crate::error::{AutoplayError, Result};

pub const GRID_SIZE: usize = 4;

/// Shape of the game's persisted entry. Only `grid.cells` is required.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub grid: PersistedGrid,
    #[serde(default)]
    pub score: Option<u64>,
    #[serde(default)]
    pub over: bool,
    #[serde(default)]
    pub won: bool,
    #[serde(default)]
    pub keep_playing: bool,
}

/// Stored row-major: `cells[row][col]`.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistedGrid {
    pub cells: Vec<Vec<Option<PersistedCell>>>,
}

/// Any other cell metadata (position, merge history) is dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistedCell {
    pub value: u32,
}

/// 4x4 board in the oracle's orientation: `grid[x][y]` is source `cells[y][x]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid([[Option<u32>; GRID_SIZE]; GRID_SIZE]);

impl Grid {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: [[Option<u32>; GRID_SIZE]; GRID_SIZE]) -> Self {
        Grid(rows)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        self.0.get(x).and_then(|row| row.get(y)).copied().flatten()
    }

    pub fn rows(&self) -> &[[Option<u32>; GRID_SIZE]; GRID_SIZE] {
        &self.0
    }

    pub fn tiles(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        self.0.iter().enumerate().flat_map(|(x, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(y, cell)| cell.map(|v| (x, y, v)))
        })
    }

    pub fn max_tile(&self) -> Option<u32> {
        self.tiles().map(|(_, _, v)| v).max()
    }
}

impl GameState {
    /// Transposed projection of the stored cells. Fails unless exactly 4x4.
    pub fn to_grid(&self) -> Result<Grid> {
        let cells = &self.grid.cells;
        if cells.len() != GRID_SIZE || cells.iter().any(|row| row.len() != GRID_SIZE) {
            return Err(AutoplayError::GridShape {
                rows: cells.len(),
                cols: cells.iter().map(Vec::len).collect(),
            });
        }

        let mut out = [[None; GRID_SIZE]; GRID_SIZE];
        for (x, column) in out.iter_mut().enumerate() {
            for (y, slot) in column.iter_mut().enumerate() {
                *slot = cells[y][x].as_ref().map(|c| c.value);
            }
        }
        Ok(Grid(out))
    }
}

/// One tick's view of the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub grid: Grid,
    pub score: Option<u64>,
    pub over: bool,
    pub won: bool,
}

pub fn parse_snapshot(raw: &str) -> Result<Snapshot> {
    let state: GameState = serde_json::from_str(raw)?;
    Ok(Snapshot {
        grid: state.to_grid()?,
        score: state.score,
        over: state.over,
        won: state.won,
    })
}
