#[cfg(feature = "browser")]
pub mod browser;
pub mod recording;

pub use recording::{RecordingHost, RecordingLog};
