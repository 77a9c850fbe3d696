use std::time::Duration;
use tracing::{debug, info};

use super::lifecycle::DriverState;
use super::telemetry::AutoplayStats;
use super::time::Tick;
use crate::config::{AutoplayConfig, TickFailurePolicy, DEFAULT_TICK_MS};
use crate::error::{AutoplayError, Result};
use crate::input::dispatcher::{Dispatcher, EventHost};
use crate::input::event::{KeyCode, Move};
use crate::planner::oracle::MoveOracle;
use crate::state::extractor::Extractor;
use crate::state::source::StateSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A move was chosen and dispatched.
    Moved { key: KeyCode, mismatch: bool },
    /// No persisted game state. Nothing was asked or dispatched.
    NoState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    pub interval: Duration,
    pub on_failure: TickFailurePolicy,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_TICK_MS),
            on_failure: TickFailurePolicy::Continue,
        }
    }
}

impl From<&AutoplayConfig> for DriverConfig {
    fn from(config: &AutoplayConfig) -> Self {
        Self {
            interval: config.tick_interval(),
            on_failure: config.on_tick_failure,
        }
    }
}

/// Poll, decide, dispatch. Owns its three collaborators.
pub struct Autoplay<S, O, H> {
    pub(crate) extractor: Extractor<S>,
    pub(crate) oracle: O,
    pub(crate) dispatcher: Dispatcher<H>,
    pub(crate) config: DriverConfig,
    pub(crate) stats: AutoplayStats,
    pub(crate) tick: Tick,
    pub(crate) state: DriverState,
}

impl<S, O, H> Autoplay<S, O, H>
where
    S: StateSource,
    O: MoveOracle,
    H: EventHost,
{
    pub fn new(source: S, oracle: O, host: H) -> Self {
        Self::with_parts(Extractor::new(source), oracle, Dispatcher::new(host), DriverConfig::default())
    }

    pub fn with_parts(extractor: Extractor<S>, oracle: O, dispatcher: Dispatcher<H>, config: DriverConfig) -> Self {
        Self {
            extractor,
            oracle,
            dispatcher,
            config,
            stats: AutoplayStats::new(),
            tick: Tick::new(),
            state: DriverState::Idle,
        }
    }

    pub fn with_config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Idle until started; Stopped once a run has ended.
    pub fn state(&self) -> DriverState {
        self.state
    }

    pub(crate) fn enter(&mut self, next: DriverState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(AutoplayError::Transition { from: self.state, to: next });
        }
        debug!("Driver {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    pub fn stats(&self) -> &AutoplayStats {
        &self.stats
    }

    pub fn source(&self) -> &S {
        self.extractor.source()
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn host(&self) -> &H {
        self.dispatcher.host()
    }

    /// One poll-decide-dispatch cycle. Failures are returned, never retried.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        self.tick = self.tick.next();
        self.stats.record_tick(self.tick);

        let Some(snapshot) = self.extractor.extract().await? else {
            info!("Tick {}: game state gone", self.tick);
            return Ok(TickOutcome::NoState);
        };

        let key = self.oracle.decide(&snapshot.grid).await?;
        let report = self.dispatcher.press(key).await?;
        let mismatch = report.mismatch.is_some();

        self.stats.record_move(mismatch, snapshot.score, snapshot.grid.max_tile());
        debug!(
            "Tick {}: key {} {:?} (score {:?}, over {}, won {})",
            self.tick,
            key,
            Move::from_key_code(key),
            snapshot.score,
            snapshot.over,
            snapshot.won
        );

        Ok(TickOutcome::Moved { key, mismatch })
    }
}
