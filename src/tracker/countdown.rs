//! Cancellable periodic task driving the reconnect countdown.

use std::ops::ControlFlow;
use std::time::Duration;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Handle to a running countdown task.
///
/// Dropping the handle detaches the task; only `cancel` stops it early.
#[derive(Debug)]
pub struct Countdown {
    task: JoinHandle<()>,
}

impl Countdown {
    /// Call `on_tick` every `period`, starting one period from now, until it
    /// returns `ControlFlow::Break`.
    ///
    /// Fails when called outside a Tokio runtime.
    pub fn start<F>(period: Duration, mut on_tick: F) -> Result<Self, TryCurrentError>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let handle = Handle::try_current()?;
        let task = handle.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
        });
        Ok(Self { task })
    }

    pub fn cancel(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
