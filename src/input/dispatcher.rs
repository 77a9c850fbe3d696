use std::future::Future;
use tracing::{debug, error};

use super::event::{InitPrimitive, KeyCode, PreparedKeyEvent, SyntheticKeyEvent};
use crate::config::DEFAULT_TARGET_TAG;
use crate::error::Result;

/// Adapter over the environment that owns the document's event pipeline.
pub trait EventHost: Send {
    /// Which initialisation primitive this environment exposes.
    fn detect_primitive(&mut self) -> impl Future<Output = Result<InitPrimitive>> + Send;

    /// Construct the low-level event with the value object's properties
    /// applied, and report what the constructed event reads back.
    fn prepare(
        &mut self,
        event: &SyntheticKeyEvent,
        primitive: InitPrimitive,
    ) -> impl Future<Output = Result<PreparedKeyEvent>> + Send;

    /// Hand the constructed event to the document, synchronously from the page's view.
    fn deliver(&mut self, prepared: PreparedKeyEvent) -> impl Future<Output = Result<()>> + Send;

    /// Blocking, user-visible warning.
    fn warn(&mut self, message: &str) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCodeMismatch {
    pub requested: KeyCode,
    pub key_code: KeyCode,
    pub which: KeyCode,
}

impl KeyCodeMismatch {
    pub fn message(&self) -> String {
        format!(
            "keyCode mismatch: requested {}, got {} (which {})",
            self.requested, self.key_code, self.which
        )
    }
}

#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub event: SyntheticKeyEvent,
    pub primitive: InitPrimitive,
    pub mismatch: Option<KeyCodeMismatch>,
}

pub struct Dispatcher<H> {
    host: H,
    primitive: Option<InitPrimitive>,
    target_tag: String,
}

impl<H: EventHost> Dispatcher<H> {
    pub fn new(host: H) -> Self {
        Self::with_target_tag(host, DEFAULT_TARGET_TAG)
    }

    pub fn with_target_tag(host: H, target_tag: &str) -> Self {
        Self {
            host,
            primitive: None,
            target_tag: target_tag.to_string(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Primitive in use, once the first press has detected it.
    pub fn primitive(&self) -> Option<InitPrimitive> {
        self.primitive
    }

    /// Build, verify and deliver one key press.
    ///
    /// A read-back mismatch raises the host warning and is reported, but the
    /// event is still delivered.
    pub async fn press(&mut self, code: KeyCode) -> Result<DispatchReport> {
        let event = SyntheticKeyEvent::key_down(code, &self.target_tag);

        let primitive = match self.primitive {
            Some(p) => p,
            None => {
                let p = self.host.detect_primitive().await?;
                debug!("Event host uses {:?}", p);
                self.primitive = Some(p);
                p
            }
        };

        let prepared = self.host.prepare(&event, primitive).await?;

        let mismatch = if prepared.observed.key_code != code {
            let mismatch = KeyCodeMismatch {
                requested: code,
                key_code: prepared.observed.key_code,
                which: prepared.observed.which,
            };
            let message = mismatch.message();
            error!("{}", message);
            if let Err(e) = self.host.warn(&message).await {
                error!("Mismatch warning could not be shown: {}", e);
            }
            Some(mismatch)
        } else {
            None
        };

        self.host.deliver(prepared).await?;
        debug!("Dispatched keydown {}", code);

        Ok(DispatchReport {
            event,
            primitive,
            mismatch,
        })
    }
}
