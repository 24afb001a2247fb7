use crate::{
    CacheKey,
    clock::RefreshClock,
    entry::{Entry, EntryState, Shared},
    fetch::Fetch,
    observation::Observation,
    signal::{InvalidationSignal, Scope},
};
use dashmap::DashMap;
use faststr::FastStr;
use std::{sync::Arc, time::Duration};
use tracing::info;

const DEFAULT_PERIOD: Duration = Duration::from_secs(10);

/// Which cached keys an invalidation refreshes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Granularity {
    /// Any invalidation refreshes every key of the kind.
    #[default]
    Kind,
    /// `invalidate(Some(key))` refreshes only that key.
    Key,
}

/// Lazily creates one refresh pipeline per key and shares it between all
/// observers of that key.
///
/// Entries are never evicted on their own, only [`KeyedCache::invalidate`]
/// removes them, and only once nobody observes them. A key therefore never
/// has more than one live pipeline.
pub struct KeyedCache<K, T, F> {
    entries: Arc<DashMap<K, Arc<Entry<K, T>>>>,
    shared:  Arc<Shared<T, F>>,
}

impl<K, T, F> Clone for KeyedCache<K, T, F> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            shared:  self.shared.clone(),
        }
    }
}

impl<K, T, F> KeyedCache<K, T, F>
where
    K: CacheKey,
    T: Clone + Send + Sync + 'static,
    F: Fetch<K, T>,
{
    /// Returns the shared observation for `key`, creating the entry on first use.
    /// Must be called from within a tokio runtime.
    pub fn get_or_create(&self, key: K) -> Observation<T> {
        let slot = self.entries.entry(key.clone()).or_insert_with(|| {
            info!(cache = %self.shared.name, %key, "creating cache entry");
            Arc::new(Entry::new(key))
        });
        // Acquired under the shard lock so `invalidate` cannot drop the entry
        // between lookup and subscription.
        slot.acquire(&self.shared);
        let entry = Arc::clone(&*slot);
        drop(slot);

        Observation::new(entry.watch(), entry)
    }

    /// With a key, clears only that entry, otherwise clears every entry. Then
    /// fires the kind's invalidation signal so live pipelines refetch now.
    ///
    /// Cleared entries nobody observes are removed, so the next observer
    /// starts from scratch. Observed ones stay in place and are refetched.
    pub fn invalidate(&self, key: Option<&K>) {
        let scope = match key {
            Some(key) => {
                self.entries
                    .remove_if(key, |_, entry| !entry.clear());
                info!(cache = %self.shared.name, %key, "invalidating cache entry");
                Scope::Key(key.to_string().into())
            }
            None => {
                self.entries.retain(|_, entry| entry.clear());
                info!(cache = %self.shared.name, "invalidating all cache entries");
                Scope::All
            }
        };
        self.shared.signal.fire(scope);
    }

    pub fn state(&self, key: &K) -> EntryState {
        self.entries
            .get(key)
            .map(|entry| entry.current_state())
            .unwrap_or(EntryState::Uninitialized)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn signal(&self) -> &InvalidationSignal {
        &self.shared.signal
    }

    pub fn clock(&self) -> &RefreshClock {
        &self.shared.clock
    }
}

pub struct CacheBuilder<T, F> {
    name:        FastStr,
    fetcher:     F,
    default:     T,
    clock:       Option<RefreshClock>,
    signal:      Option<InvalidationSignal>,
    granularity: Granularity,
}

impl<T, F> CacheBuilder<T, F> {
    /// `default` is published whenever a fetch fails.
    pub fn new(name: impl Into<FastStr>, fetcher: F, default: T) -> Self {
        Self {
            name: name.into(),
            fetcher,
            default,
            clock: None,
            signal: None,
            granularity: Granularity::default(),
        }
    }

    /// Share a clock with other caches of the same service.
    pub fn clock(mut self, clock: RefreshClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share an invalidation signal with other caches of the same kind.
    pub fn signal(mut self, signal: InvalidationSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Starts a private 10 second clock when none was given, which needs a
    /// tokio runtime.
    pub fn build<K>(self) -> KeyedCache<K, T, F>
    where
        K: CacheKey,
        T: Clone + Send + Sync + 'static,
        F: Fetch<K, T>,
    {
        let shared = Shared {
            name:        self.name,
            fetcher:     self.fetcher,
            default:     self.default,
            clock:       self.clock.unwrap_or_else(|| RefreshClock::start(DEFAULT_PERIOD)),
            signal:      self.signal.unwrap_or_default(),
            granularity: self.granularity,
        };
        KeyedCache {
            entries: Arc::new(DashMap::new()),
            shared:  Arc::new(shared),
        }
    }
}
