pub mod driver;
pub mod lifecycle;
pub mod telemetry;
pub mod time;

pub use driver::{Autoplay, DriverConfig, TickOutcome};
pub use lifecycle::{AutoplayHandle, DriverState, StopReason};
pub use telemetry::AutoplayStats;
