//! Keyed refresh-and-cache engine.
//!
//! A [`KeyedCache`] hands out one shared [`Observation`] per key. Each live
//! entry runs a single pipeline task that fetches on every [`RefreshClock`]
//! tick or [`InvalidationSignal`] fire, drops a pending fetch when a newer
//! trigger arrives, and replays the latest value to every subscriber. Fetch
//! failures never reach subscribers, they are replaced by the cache's default.

mod clock;
mod entry;
mod fetch;
mod keyed;
mod observation;
mod signal;

pub use clock::{ClockDriver, RefreshClock};
pub use entry::EntryState;
pub use fetch::{Fetch, FetchResult, FnFetch, Guarded, fetch_or_default};
pub use keyed::{CacheBuilder, Granularity, KeyedCache};
pub use observation::Observation;
pub use signal::{InvalidationSignal, Scope};

use std::{fmt::Display, hash::Hash};

/// Anything usable as a cache key. `Display` is used for logging and for
/// matching key-scoped invalidations.
pub trait CacheKey: Eq + Hash + Clone + Display + Send + Sync + 'static {}

impl<K> CacheKey for K where K: Eq + Hash + Clone + Display + Send + Sync + 'static {}
