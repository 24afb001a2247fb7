use faststr::FastStr;
use tokio::sync::broadcast;
use tracing::debug;

const CAPACITY: usize = 64;

/// What an invalidation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    /// The `Display` form of one key.
    Key(FastStr),
}

impl Scope {
    pub fn covers(&self, key: &str) -> bool {
        match self {
            Self::All => true,
            Self::Key(k) => k.as_str() == key,
        }
    }
}

/// Manual refresh trigger for one entity kind. Clones share the same channel,
/// so several caches of a service can be refreshed by the same fire.
#[derive(Debug, Clone)]
pub struct InvalidationSignal {
    sender: broadcast::Sender<Scope>,
}

impl Default for InvalidationSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl InvalidationSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self { sender }
    }

    /// Returns the number of live pipelines that received the signal.
    pub fn fire(&self, scope: Scope) -> usize {
        let receivers = self.sender.send(scope.clone()).unwrap_or_default();
        debug!(?scope, receivers, "invalidation fired");
        receivers
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Scope> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_covers() {
        assert!(Scope::All.covers("project-1"));
        assert!(Scope::Key("project-1".into()).covers("project-1"));
        assert!(!Scope::Key("project-1".into()).covers("project-2"));
    }

    #[tokio::test]
    async fn test_fire_without_receivers() {
        let signal = InvalidationSignal::new();
        assert_eq!(signal.fire(Scope::All), 0);

        let mut rx = signal.subscribe();
        let clone = signal.clone();
        assert_eq!(clone.fire(Scope::Key("a".into())), 1);
        assert_eq!(rx.recv().await.unwrap(), Scope::Key("a".into()));
    }
}
