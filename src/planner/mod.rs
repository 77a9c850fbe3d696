pub mod oracle;
pub mod stub;

pub use oracle::{FnOracle, MoveOracle};
pub use stub::CycleOracle;
