pub mod extractor;
pub mod snapshot;
pub mod source;

pub use extractor::Extractor;
pub use snapshot::{parse_snapshot, GameState, Grid, Snapshot, GRID_SIZE};
pub use source::{FileStateSource, MemoryStateSource, MemoryStorage, ScriptedStateSource, StateSource};
