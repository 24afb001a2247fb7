use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::debug;

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A shared repeating timer. Every clone observes the same tick counter.
///
/// The first tick fires as soon as the clock starts. The timer task stops
/// when the last clone is dropped.
#[derive(Clone)]
pub struct RefreshClock {
    ticks:  watch::Receiver<u64>,
    period: Option<Duration>,
    _task:  Option<Arc<AbortOnDrop>>,
}

impl RefreshClock {
    /// Spawns the timer task. Must be called from within a tokio runtime.
    pub fn start(period: Duration) -> Self {
        let (tx, rx) = watch::channel(0u64);
        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let mut tick = 0;
                tx.send_modify(|t| {
                    *t += 1;
                    tick = *t;
                });
                debug!(tick, period = ?period, "refresh clock tick");
            }
        });

        Self {
            ticks:  rx,
            period: Some(period),
            _task:  Some(Arc::new(AbortOnDrop(task))),
        }
    }

    /// A clock that only ticks when the returned driver says so.
    pub fn manual() -> (Self, ClockDriver) {
        let (tx, rx) = watch::channel(0u64);
        let clock = Self {
            ticks:  rx,
            period: None,
            _task:  None,
        };
        (clock, ClockDriver(tx))
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Number of ticks emitted so far.
    pub fn ticks(&self) -> u64 {
        *self.ticks.borrow()
    }

    /// A receiver that only reports ticks emitted after this call.
    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        let mut rx = self.ticks.clone();
        rx.borrow_and_update();
        rx
    }
}

/// Drives a [`RefreshClock::manual`] clock. Dropping it stops the clock for good.
pub struct ClockDriver(watch::Sender<u64>);

impl ClockDriver {
    pub fn tick(&self) {
        self.0.send_modify(|t| *t += 1);
    }
}
