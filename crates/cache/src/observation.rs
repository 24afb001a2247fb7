use crate::entry::{EntryState, Subscription};
use futures_util::Stream;
use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, ready},
};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

struct SubscriberGuard(Arc<dyn Subscription>);

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// A subscriber's view of one cache entry.
///
/// Yields the latest value immediately if one has been fetched, then every
/// newer value. Never errors and never ends while held. Dropping the last
/// observation of an entry stops its polling.
pub struct Observation<T> {
    values: WatchStream<Option<Arc<T>>>,
    peek:   watch::Receiver<Option<Arc<T>>>,
    guard:  SubscriberGuard,
}

impl<T> Observation<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(rx: watch::Receiver<Option<Arc<T>>>, entry: Arc<dyn Subscription>) -> Self {
        Self {
            values: WatchStream::new(rx.clone()),
            peek:   rx,
            guard:  SubscriberGuard(entry),
        }
    }

    /// The value held right now, without waiting.
    pub fn latest(&self) -> Option<Arc<T>> {
        self.peek.borrow().clone()
    }

    /// The held value, or the first one fetched if none has arrived yet.
    pub async fn value(&self) -> Option<Arc<T>> {
        let mut rx = self.peek.clone();
        let value = rx.wait_for(Option::is_some).await.ok()?;
        value.clone()
    }

    pub fn state(&self) -> EntryState {
        self.guard.0.state()
    }
}

impl<T> Stream for Observation<T>
where
    T: Send + Sync + 'static,
{
    type Item = Arc<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.values).poll_next(cx)) {
                Some(Some(value)) => return Poll::Ready(Some(value)),
                Some(None) => continue,
                None => return Poll::Ready(None),
            }
        }
    }
}
