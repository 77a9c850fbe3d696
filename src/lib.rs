pub mod config;
pub mod error;
pub mod host;
pub mod input;
pub mod kernel;
pub mod planner;
pub mod services;
pub mod state;

// Re-export specific items for convenient access
pub use config::AutoplayConfig;
pub use error::{AutoplayError, Result};
pub use kernel::driver::{Autoplay, TickOutcome};
pub use kernel::lifecycle::{AutoplayHandle, DriverState};
