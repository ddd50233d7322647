use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Countdown period of a running quiz.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One elapsed countdown period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick;

/// Background task that emits a `TimerTick` every period.
///
/// The task is aborted on `stop` or drop, so an abandoned session never
/// receives a stale tick.
#[derive(Debug)]
pub struct QuizTimer {
    handle: JoinHandle<()>,
}

impl QuizTimer {
    /// Spawn the ticking task on the current runtime.
    ///
    /// The first tick arrives one full period after the call.
    #[must_use]
    pub fn start(period: Duration) -> (Self, mpsc::Receiver<TimerTick>) {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(TimerTick).await.is_err() {
                    break;
                }
            }
        });
        (Self { handle }, rx)
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for QuizTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
