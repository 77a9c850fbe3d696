pub mod dispatcher;
pub mod event;

pub use dispatcher::{DispatchReport, Dispatcher, EventHost, KeyCodeMismatch};
pub use event::{InitPrimitive, KeyCode, Move, SyntheticKeyEvent};
