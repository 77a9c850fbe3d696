use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::driver::{Autoplay, TickOutcome};
use crate::config::TickFailurePolicy;
use crate::error::{AutoplayError, Result};
use crate::input::dispatcher::EventHost;
use crate::planner::oracle::MoveOracle;
use crate::state::source::StateSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    Stopped,
}

impl DriverState {
    /// Idle -> Running on start, Running -> Stopped, Stopped -> Running on a fresh start.
    pub fn can_transition_to(self, next: DriverState) -> bool {
        matches!(
            (self, next),
            (DriverState::Idle, DriverState::Running)
                | (DriverState::Running, DriverState::Stopped)
                | (DriverState::Stopped, DriverState::Running)
        )
    }
}

/// Why the loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    GameStateGone,
    Cancelled,
    TickFailed(String),
}

/// Publishes Stopped when the run task ends, unwinding included.
struct StoppedOnDrop(watch::Sender<DriverState>);

impl Drop for StoppedOnDrop {
    fn drop(&mut self) {
        self.0.send_replace(DriverState::Stopped);
    }
}

/// Control surface for a running driver.
pub struct AutoplayHandle<S, O, H> {
    state: watch::Receiver<DriverState>,
    cancel: CancellationToken,
    task: JoinHandle<(Autoplay<S, O, H>, StopReason)>,
}

impl<S, O, H> Autoplay<S, O, H>
where
    S: StateSource + 'static,
    O: MoveOracle + 'static,
    H: EventHost + 'static,
{
    /// Idle or Stopped -> Running. The first tick fires one interval after the call.
    pub fn start(mut self) -> Result<AutoplayHandle<S, O, H>> {
        self.enter(DriverState::Running)?;
        let (state_tx, state_rx) = watch::channel(self.state);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let published = StoppedOnDrop(state_tx);
            let mut driver = self;
            let reason = driver.run(token).await;
            drop(published);
            (driver, reason)
        });

        Ok(AutoplayHandle {
            state: state_rx,
            cancel,
            task,
        })
    }

    async fn run(&mut self, cancel: CancellationToken) -> StopReason {
        let period = self.config.interval;
        info!("Autoplay started. Tick: {}ms", period.as_millis());

        let mut cadence = interval_at(Instant::now() + period, period);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let reason = loop {
            tokio::select! {
                _ = cancel.cancelled() => break StopReason::Cancelled,
                _ = cadence.tick() => {}
            }

            match self.tick().await {
                Ok(TickOutcome::NoState) => break StopReason::GameStateGone,
                Ok(TickOutcome::Moved { .. }) => {}
                Err(e) => {
                    self.stats.record_failure();
                    match self.config.on_failure {
                        TickFailurePolicy::Continue => warn!("Tick {} failed: {}", self.tick, e),
                        TickFailurePolicy::Stop => {
                            error!("Tick {} failed, stopping: {}", self.tick, e);
                            break StopReason::TickFailed(e.to_string());
                        }
                    }
                }
            }
        };

        if let Err(e) = self.enter(DriverState::Stopped) {
            error!("{}", e);
        }
        info!(
            "Autoplay stopped ({:?}) after {} ticks, {} moves, {} mismatches, {} failed ticks",
            reason, self.stats.ticks, self.stats.moves, self.stats.mismatches, self.stats.failed_ticks
        );
        reason
    }
}

impl<S, O, H> AutoplayHandle<S, O, H> {
    pub fn state(&self) -> DriverState {
        *self.state.borrow()
    }

    /// Cooperative: observed between ticks, never mid-tick.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the loop has left Running, whether it ended or panicked.
    pub async fn stopped(&mut self) {
        if let Err(e) = self.state.wait_for(|s| *s == DriverState::Stopped).await {
            warn!("Driver state channel closed: {}", e);
        }
    }

    /// Waits for the loop to end and hands the driver back, ready for a fresh `start`.
    pub async fn join(self) -> Result<(Autoplay<S, O, H>, StopReason)> {
        self.task.await.map_err(|e| AutoplayError::Join(e.to_string()))
    }
}
