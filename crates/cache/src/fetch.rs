use std::fmt::Display;
use tracing::{debug, warn};

/// One network call for a key.
pub trait Fetch<K, T>: Send + Sync + 'static {
    type Error: Display + Send;

    fn fetch(&self, key: &K) -> impl Future<Output = Result<T, Self::Error>> + Send;

    /// Checked before every fetch. When false no request is issued and
    /// nothing is published for that trigger.
    fn ready(&self, _key: &K) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult<T> {
    Fresh(T),
    /// The fetch failed and the cache default was substituted.
    Fallback(T),
    Skipped,
}

impl<T> FetchResult<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Fresh(v) | Self::Fallback(v) => Some(v),
            Self::Skipped => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}

/// Runs `fetcher` for `key`, replacing any error with a clone of `default`.
///
/// Callers cannot tell a genuinely empty answer from a failed one, only the
/// `warn!` emitted here records the failure.
pub async fn fetch_or_default<K, T, F>(fetcher: &F, key: &K, default: &T) -> FetchResult<T>
where
    K: Display,
    T: Clone,
    F: Fetch<K, T>,
{
    if !fetcher.ready(key) {
        debug!(%key, "fetch preconditions not met, skipping");
        return FetchResult::Skipped;
    }

    match fetcher.fetch(key).await {
        Ok(value) => FetchResult::Fresh(value),
        Err(e) => {
            warn!(%key, "fetch failed, using default: {e}");
            FetchResult::Fallback(default.clone())
        }
    }
}

/// Adapts an async closure taking an owned key.
#[derive(Clone)]
pub struct FnFetch<F>(F);

impl<F> FnFetch<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<K, T, E, F, Fut> Fetch<K, T> for FnFetch<F>
where
    K: Clone,
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send,
    E: Display + Send,
{
    type Error = E;

    fn fetch(&self, key: &K) -> impl Future<Output = Result<T, E>> + Send {
        (self.0)(key.clone())
    }
}

/// Adds a precondition in front of another fetcher.
#[derive(Clone)]
pub struct Guarded<F, P> {
    inner:        F,
    precondition: P,
}

impl<F, P> Guarded<F, P> {
    pub fn new(inner: F, precondition: P) -> Self {
        Self {
            inner,
            precondition,
        }
    }
}

impl<K, T, F, P> Fetch<K, T> for Guarded<F, P>
where
    F: Fetch<K, T>,
    P: Fn(&K) -> bool + Send + Sync + 'static,
{
    type Error = F::Error;

    fn fetch(&self, key: &K) -> impl Future<Output = Result<T, Self::Error>> + Send {
        self.inner.fetch(key)
    }

    fn ready(&self, key: &K) -> bool {
        (self.precondition)(key) && self.inner.ready(key)
    }
}
