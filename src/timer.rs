// src/timer.rs

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::{
    services::session_engine::TimeoutEvent,
    state::{SharedState, lock_state},
};

/// Periodic driver of the session countdown.
///
/// Each tick runs the engine's timeout check under the state lock, so it
/// never interleaves with a user operation. Timeouts are forwarded on the
/// channel returned by `spawn`.
///
/// Dropping the countdown cancels the task. The channel closes with it.
pub struct Countdown {
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        state: SharedState,
        period: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<TimeoutEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let event = lock_state(&state).tick();
                if let Some(event) = event {
                    if tx.send(event).is_err() {
                        tracing::debug!("Timeout receiver dropped, event discarded");
                    }
                }
            }
        });

        tracing::debug!("Countdown started with period {:?}", period);
        (Self { handle: Some(handle) }, rx)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancels the task and waits until it is gone.
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            match handle.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::error!("Countdown task failed: {:?}", e),
            }
            tracing::debug!("Countdown stopped");
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
