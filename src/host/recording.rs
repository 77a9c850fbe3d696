use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{AutoplayError, Result};
use crate::input::dispatcher::EventHost;
use crate::input::event::{EventId, InitPrimitive, KeyCode, ObservedProperties, PreparedKeyEvent, SyntheticKeyEvent};

type Listener = Box<dyn FnMut(&SyntheticKeyEvent) + Send>;

/// Everything the host has seen, shared between clones.
#[derive(Debug, Default, Clone)]
pub struct RecordingLog {
    pub delivered: Vec<SyntheticKeyEvent>,
    pub observed: Vec<ObservedProperties>,
    pub warnings: Vec<String>,
    pub primitive_detections: usize,
    pub primitives_used: Vec<InitPrimitive>,
}

/// In-process event host.
///
/// With overrides honoured it behaves like a page where property overrides
/// stick. Without them it mimics an engine that drops the key code passed to
/// `initKeyboardEvent`, so the read-back is 0.
pub struct RecordingHost {
    primitive: InitPrimitive,
    honor_overrides: bool,
    next_id: u64,
    pending: HashMap<EventId, SyntheticKeyEvent>,
    log: Arc<Mutex<RecordingLog>>,
    listener: Option<Listener>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new(InitPrimitive::InitKeyboardEvent)
    }
}

impl RecordingHost {
    pub fn new(primitive: InitPrimitive) -> Self {
        Self {
            primitive,
            honor_overrides: true,
            next_id: 0,
            pending: HashMap::new(),
            log: Arc::new(Mutex::new(RecordingLog::default())),
            listener: None,
        }
    }

    pub fn ignoring_overrides(mut self) -> Self {
        self.honor_overrides = false;
        self
    }

    /// Runs on every delivered event, standing in for the game's keydown handler.
    pub fn on_deliver<F>(mut self, listener: F) -> Self
    where
        F: FnMut(&SyntheticKeyEvent) + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Shared view of the log that stays valid after the host moves into a driver.
    pub fn log_handle(&self) -> Arc<Mutex<RecordingLog>> {
        Arc::clone(&self.log)
    }

    pub fn log(&self) -> RecordingLog {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, RecordingLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn observe(&self, event: &SyntheticKeyEvent, primitive: InitPrimitive) -> ObservedProperties {
        let (key_code, which) = if self.honor_overrides {
            (event.key_code(), event.which())
        } else {
            match primitive {
                InitPrimitive::InitKeyboardEvent => (KeyCode(0), KeyCode(0)),
                InitPrimitive::InitKeyEvent => (event.key_code(), KeyCode(primitive.char_code(event.key_code()))),
            }
        };
        ObservedProperties {
            key_code,
            which,
            meta_key: event.meta_key(),
            shift_key: event.shift_key(),
            target_tag: Some(event.target().tag_name.clone()),
        }
    }
}

impl EventHost for RecordingHost {
    fn detect_primitive(&mut self) -> impl Future<Output = Result<InitPrimitive>> + Send {
        self.lock().primitive_detections += 1;
        let primitive = self.primitive;
        async move { Ok(primitive) }
    }

    fn prepare(
        &mut self,
        event: &SyntheticKeyEvent,
        primitive: InitPrimitive,
    ) -> impl Future<Output = Result<PreparedKeyEvent>> + Send {
        self.next_id += 1;
        let id = EventId(self.next_id);
        let observed = self.observe(event, primitive);
        self.pending.insert(id, event.clone());
        {
            let mut log = self.lock();
            log.primitives_used.push(primitive);
            log.observed.push(observed.clone());
        }
        async move { Ok(PreparedKeyEvent { id, observed }) }
    }

    fn deliver(&mut self, prepared: PreparedKeyEvent) -> impl Future<Output = Result<()>> + Send {
        let result = match self.pending.remove(&prepared.id) {
            Some(event) => {
                if let Some(listener) = self.listener.as_mut() {
                    listener(&event);
                }
                self.lock().delivered.push(event);
                Ok(())
            }
            None => Err(AutoplayError::Host(format!("unknown event {:?}", prepared.id))),
        };
        async move { result }
    }

    fn warn(&mut self, message: &str) -> impl Future<Output = Result<()>> + Send {
        self.lock().warnings.push(message.to_string());
        async move { Ok(()) }
    }
}
