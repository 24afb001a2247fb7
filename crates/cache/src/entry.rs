use crate::{
    CacheKey,
    clock::RefreshClock,
    fetch::{Fetch, FetchResult, fetch_or_default},
    keyed::Granularity,
    signal::{InvalidationSignal, Scope},
};
use faststr::FastStr;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::{
    sync::{broadcast, broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Uninitialized,
    Fetching,
    HasValue,
    /// Explicitly invalidated. A held entry leaves this state with its next
    /// fetch, an idle one is dropped from its cache and never leaves it.
    Cleared,
}

/// Everything a pipeline needs besides its own entry.
pub(crate) struct Shared<T, F> {
    pub(crate) name:        FastStr,
    pub(crate) fetcher:     F,
    pub(crate) default:     T,
    pub(crate) clock:       RefreshClock,
    pub(crate) signal:      InvalidationSignal,
    pub(crate) granularity: Granularity,
}

struct Lifecycle {
    state:       EntryState,
    subscribers: usize,
    /// Bumped on every pipeline start so an aborted pipeline can never publish.
    epoch:       u64,
    pipeline:    Option<JoinHandle<()>>,
    /// Set by an invalidation until the next publish.
    stale:       bool,
}

pub(crate) struct Entry<K, T> {
    key:       K,
    label:     FastStr,
    value:     watch::Sender<Option<Arc<T>>>,
    lifecycle: Mutex<Lifecycle>,
}

/// Type-erased view of an entry held by observations.
pub(crate) trait Subscription: Send + Sync {
    fn release(&self);
    fn state(&self) -> EntryState;
}

impl<K, T> Entry<K, T>
where
    K: CacheKey,
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(key: K) -> Self {
        let (value, _) = watch::channel(None);
        Self {
            label: key.to_string().into(),
            key,
            value,
            lifecycle: Mutex::new(Lifecycle {
                state:       EntryState::Uninitialized,
                subscribers: 0,
                epoch:       0,
                pipeline:    None,
                stale:       false,
            }),
        }
    }

    pub(crate) fn label(&self) -> &FastStr {
        &self.label
    }

    pub(crate) fn current_state(&self) -> EntryState {
        self.lifecycle.lock().state
    }

    pub(crate) fn watch(&self) -> watch::Receiver<Option<Arc<T>>> {
        self.value.subscribe()
    }

    /// Registers one subscriber, starting the pipeline if none is running.
    pub(crate) fn acquire<F>(self: &Arc<Self>, shared: &Arc<Shared<T, F>>)
    where
        F: Fetch<K, T>,
    {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.subscribers += 1;
        if lifecycle.pipeline.is_none() {
            lifecycle.epoch += 1;
            let epoch = lifecycle.epoch;
            debug!(cache = %shared.name, key = %self.label, epoch, "starting refresh pipeline");
            let pipeline = drive(self.clone(), shared.clone(), epoch);
            lifecycle.pipeline = Some(tokio::spawn(pipeline));
        }
    }

    /// Marks the entry invalidated and reports whether anyone still holds it.
    pub(crate) fn clear(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.state = EntryState::Cleared;
        lifecycle.stale = true;
        lifecycle.subscribers > 0
    }

    fn begin_fetch(&self, epoch: u64) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.epoch != epoch {
            return false;
        }
        lifecycle.state = EntryState::Fetching;
        true
    }

    /// Returns false when the pipeline that produced `result` is no longer current.
    ///
    /// A skipped refetch of an invalidated entry publishes `default`, so a value
    /// fetched before the precondition lapsed is not served on.
    fn publish(&self, epoch: u64, result: FetchResult<T>, default: &T) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.epoch != epoch || lifecycle.pipeline.is_none() {
            return false;
        }
        let value = match result {
            FetchResult::Skipped if lifecycle.stale && self.value.borrow().is_some() => {
                Some(default.clone())
            }
            result => result.into_value(),
        };
        if let Some(value) = value {
            self.value.send_replace(Some(Arc::new(value)));
        }
        lifecycle.stale = false;
        lifecycle.state = self.settled_state();
        true
    }

    fn settled_state(&self) -> EntryState {
        if self.value.borrow().is_some() {
            EntryState::HasValue
        } else {
            EntryState::Uninitialized
        }
    }
}

impl<K, T> Subscription for Entry<K, T>
where
    K: CacheKey,
    T: Clone + Send + Sync + 'static,
{
    fn release(&self) {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.subscribers = lifecycle.subscribers.saturating_sub(1);
        if lifecycle.subscribers > 0 {
            return;
        }
        if let Some(pipeline) = lifecycle.pipeline.take() {
            debug!(key = %self.label, "last subscriber left, stopping refresh pipeline");
            pipeline.abort();
        }
        if lifecycle.state == EntryState::Fetching {
            lifecycle.state = self.settled_state();
        }
    }

    fn state(&self) -> EntryState {
        self.current_state()
    }
}

enum Trigger {
    Tick,
    Invalidated,
}

struct Triggers {
    ticks:         watch::Receiver<u64>,
    invalidations: broadcast::Receiver<Scope>,
    key:           FastStr,
    granularity:   Granularity,
}

impl Triggers {
    /// Waits for the next clock tick or relevant invalidation. `None` once
    /// either source has shut down.
    async fn next(&mut self) -> Option<Trigger> {
        loop {
            tokio::select! {
                changed = self.ticks.changed() => {
                    return changed.ok().map(|_| Trigger::Tick);
                }
                scope = self.invalidations.recv() => match scope {
                    Ok(scope) if self.covers(&scope) => return Some(Trigger::Invalidated),
                    Ok(_) => continue,
                    Err(RecvError::Lagged(missed)) => {
                        debug!(key = %self.key, missed, "invalidations lagged, refreshing");
                        return Some(Trigger::Invalidated);
                    }
                    Err(RecvError::Closed) => return None,
                },
            }
        }
    }

    fn covers(&self, scope: &Scope) -> bool {
        match self.granularity {
            Granularity::Kind => true,
            Granularity::Key => scope.covers(&self.key),
        }
    }
}

/// The per-entry loop: fetch now, then again on every trigger. A trigger that
/// arrives while a fetch is pending drops that fetch and starts a new one, so
/// a slow older response never lands after a newer one.
async fn drive<K, T, F>(entry: Arc<Entry<K, T>>, shared: Arc<Shared<T, F>>, epoch: u64)
where
    K: CacheKey,
    T: Clone + Send + Sync + 'static,
    F: Fetch<K, T>,
{
    let mut triggers = Triggers {
        ticks:         shared.clock.subscribe(),
        invalidations: shared.signal.subscribe(),
        key:           entry.label().clone(),
        granularity:   shared.granularity,
    };

    loop {
        if !entry.begin_fetch(epoch) {
            return;
        }
        trace!(cache = %shared.name, key = %entry.label(), "fetching");

        let fetch = fetch_or_default(&shared.fetcher, &entry.key, &shared.default);
        tokio::pin!(fetch);

        let superseded = tokio::select! {
            result = &mut fetch => {
                if !entry.publish(epoch, result, &shared.default) {
                    return;
                }
                false
            }
            trigger = triggers.next() => match trigger {
                Some(_) => {
                    debug!(cache = %shared.name, key = %entry.label(), "fetch superseded by newer trigger");
                    true
                }
                None => return,
            },
        };

        if !superseded {
            match triggers.next().await {
                Some(Trigger::Tick) => trace!(key = %entry.label(), "tick"),
                Some(Trigger::Invalidated) => debug!(key = %entry.label(), "invalidated"),
                None => return,
            }
        }
    }
}
