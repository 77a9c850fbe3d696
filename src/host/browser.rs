//! Chrome DevTools Protocol adapters for a live game tab.
//!
//! Event construction and delivery run as small scripts inside the page so the
//! game's own `document` keydown listener receives the event.

use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::error::{AutoplayError, Result};
use crate::input::dispatcher::EventHost;
use crate::input::event::{EventId, InitPrimitive, KeyCode, ObservedProperties, PreparedKeyEvent, SyntheticKeyEvent};
use crate::planner::oracle::MoveOracle;
use crate::state::snapshot::Grid;
use crate::state::source::StateSource;

fn cdp(e: CdpError) -> AutoplayError {
    AutoplayError::Host(e.to_string())
}

async fn evaluate<T: DeserializeOwned>(page: &Page, script: String) -> Result<T> {
    let result = page.evaluate(script).await.map_err(cdp)?;
    let value = result.value().cloned().unwrap_or(serde_json::Value::Null);
    Ok(serde_json::from_value(value)?)
}

/// A connected browser and the tab running the game.
pub struct BrowserSession {
    pub browser: Browser,
    pub page: Page,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    pub async fn connect(config: &BrowserConfig) -> Result<Self> {
        let (browser, mut handler) = Browser::connect(config.ws_url.clone()).await.map_err(cdp)?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("CDP handler stopped: {}", e);
                    break;
                }
            }
        });

        let pages = browser.pages().await.map_err(cdp)?;
        let mut chosen = None;
        for page in pages {
            let url = page.url().await.map_err(cdp)?.unwrap_or_default();
            let matches = match &config.page_url_contains {
                Some(needle) => url.contains(needle.as_str()),
                None => true,
            };
            if matches {
                info!("Attached to tab {}", url);
                chosen = Some(page);
                break;
            }
        }

        let page = chosen.ok_or_else(|| AutoplayError::Host("no matching browser tab".into()))?;
        Ok(Self { browser, page, handler })
    }

    pub fn state_source(&self, storage_key: &str) -> LocalStorageSource {
        LocalStorageSource {
            page: self.page.clone(),
            key: storage_key.to_string(),
        }
    }

    pub fn event_host(&self) -> PageEventHost {
        PageEventHost {
            page: self.page.clone(),
            next_id: 0,
        }
    }

    pub fn oracle(&self, expression: &str) -> PageOracle {
        PageOracle {
            page: self.page.clone(),
            expression: expression.to_string(),
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// `window.localStorage[key]` of the game tab.
pub struct LocalStorageSource {
    page: Page,
    key: String,
}

impl StateSource for LocalStorageSource {
    fn read(&mut self) -> impl Future<Output = Result<Option<String>>> + Send {
        let page = self.page.clone();
        let key = serde_json::to_string(&self.key).unwrap_or_default();
        async move { evaluate::<Option<String>>(&page, format!("window.localStorage.getItem({key})")).await }
    }
}

/// Builds the event in-page with accessor overrides and keeps it until delivery.
pub struct PageEventHost {
    page: Page,
    next_id: u64,
}

const DETECT_SCRIPT: &str = "typeof document.createEvent('KeyboardEvent').initKeyboardEvent === 'function' \
     ? 'initKeyboardEvent' : 'initKeyEvent'";

fn prepare_script(spec: &str, id: u64, primitive: InitPrimitive) -> String {
    let init = match primitive {
        InitPrimitive::InitKeyboardEvent => "ev.initKeyboardEvent",
        InitPrimitive::InitKeyEvent => "ev.initKeyEvent",
    };
    format!(
        r#"(() => {{
  const spec = {spec};
  const k = spec.keyCode;
  const fixed = (v) => ({{ get: () => v, configurable: true }});
  const ev = document.createEvent('KeyboardEvent');
  Object.defineProperty(ev, 'keyCode', fixed(k));
  Object.defineProperty(ev, 'which', fixed(spec.which));
  {init}(spec.type, spec.bubbles, spec.cancelable, document.defaultView,
    spec.ctrlKey, spec.altKey, spec.shiftKey, spec.metaKey, k, {char_code});
  Object.defineProperty(ev, 'keyCode', fixed(k));
  Object.defineProperty(ev, 'which', fixed(spec.which));
  Object.defineProperty(ev, 'target', fixed(spec.target));
  Object.defineProperty(ev, 'metaKey', fixed(spec.metaKey));
  Object.defineProperty(ev, 'shiftKey', fixed(spec.shiftKey));
  const pending = (window.__autoplayPending = window.__autoplayPending || {{}});
  pending[{id}] = ev;
  return {{
    keyCode: ev.keyCode,
    which: ev.which,
    metaKey: ev.metaKey,
    shiftKey: ev.shiftKey,
    targetTag: ev.target ? ev.target.tagName : null
  }};
}})()"#,
        char_code = match primitive {
            InitPrimitive::InitKeyboardEvent => "k",
            InitPrimitive::InitKeyEvent => "0",
        },
    )
}

fn deliver_script(id: u64) -> String {
    format!(
        r#"(() => {{
  const pending = window.__autoplayPending || {{}};
  const ev = pending[{id}];
  delete pending[{id}];
  if (!ev) return false;
  document.dispatchEvent(ev);
  return true;
}})()"#
    )
}

impl EventHost for PageEventHost {
    fn detect_primitive(&mut self) -> impl Future<Output = Result<InitPrimitive>> + Send {
        let page = self.page.clone();
        async move { evaluate::<InitPrimitive>(&page, DETECT_SCRIPT.to_string()).await }
    }

    fn prepare(
        &mut self,
        event: &SyntheticKeyEvent,
        primitive: InitPrimitive,
    ) -> impl Future<Output = Result<PreparedKeyEvent>> + Send {
        self.next_id += 1;
        let id = self.next_id;
        let page = self.page.clone();
        let spec = serde_json::to_string(event);
        async move {
            let script = prepare_script(&spec?, id, primitive);
            let observed = evaluate::<ObservedProperties>(&page, script).await?;
            Ok(PreparedKeyEvent {
                id: EventId(id),
                observed,
            })
        }
    }

    fn deliver(&mut self, prepared: PreparedKeyEvent) -> impl Future<Output = Result<()>> + Send {
        let page = self.page.clone();
        async move {
            let EventId(id) = prepared.id;
            if evaluate::<bool>(&page, deliver_script(id)).await? {
                Ok(())
            } else {
                Err(AutoplayError::Host(format!("event {id} vanished before delivery")))
            }
        }
    }

    /// `window.alert` blocks the evaluation until someone dismisses it.
    fn warn(&mut self, message: &str) -> impl Future<Output = Result<()>> + Send {
        let page = self.page.clone();
        let message = serde_json::to_string(message).unwrap_or_default();
        async move {
            evaluate::<serde_json::Value>(&page, format!("window.alert({message})")).await?;
            Ok(())
        }
    }
}

/// Oracle living in the page, called as `<expression>(grid)`.
pub struct PageOracle {
    page: Page,
    expression: String,
}

impl MoveOracle for PageOracle {
    fn decide(&mut self, grid: &Grid) -> impl Future<Output = Result<KeyCode>> + Send {
        let page = self.page.clone();
        let call = serde_json::to_string(grid).map(|g| format!("{}({})", self.expression, g));
        async move {
            let call = call?;
            debug!("Oracle call: {}", call);
            evaluate::<u32>(&page, call)
                .await
                .map(KeyCode)
                .map_err(|e| AutoplayError::Oracle(e.to_string()))
        }
    }
}
