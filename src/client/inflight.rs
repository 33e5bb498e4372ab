//! Usage: In-flight request registry (at most one live dispatch per request identity).

use super::identity::RequestIdentity;
use crate::shared::mutex_ext::MutexExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct InFlightEntry {
    dispatch_id: u64,
    cancel: CancellationToken,
}

/// Handle for one registered dispatch.
#[derive(Debug, Clone)]
pub(crate) struct DispatchTicket {
    pub(crate) identity: RequestIdentity,
    pub(crate) dispatch_id: u64,
    pub(crate) cancel: CancellationToken,
}

#[derive(Debug, Default)]
pub(crate) struct InFlightRegistry {
    entries: Mutex<HashMap<RequestIdentity, InFlightEntry>>,
    next_dispatch_id: AtomicU64,
}

impl InFlightRegistry {
    /// Cancel any pending dispatch with the same identity, then register a new one.
    pub(crate) fn register(&self, identity: RequestIdentity) -> DispatchTicket {
        let dispatch_id = self.next_dispatch_id.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = CancellationToken::new();

        let mut entries = self.entries.lock_or_recover();
        if let Some(previous) = entries.remove(&identity) {
            tracing::debug!(
                identity = %identity,
                superseded_dispatch_id = previous.dispatch_id,
                dispatch_id,
                "cancelling superseded in-flight request"
            );
            previous.cancel.cancel();
        }
        entries.insert(
            identity.clone(),
            InFlightEntry {
                dispatch_id,
                cancel: cancel.clone(),
            },
        );

        DispatchTicket {
            identity,
            dispatch_id,
            cancel,
        }
    }

    /// Drop the entry for a settled dispatch. A no-op when the entry is absent
    /// or already belongs to a newer dispatch. Returns whether anything was removed.
    pub(crate) fn complete(&self, ticket: &DispatchTicket) -> bool {
        self.entries
            .with_recovered(|entries| match entries.get(&ticket.identity) {
                Some(entry) if entry.dispatch_id == ticket.dispatch_id => {
                    entries.remove(&ticket.identity);
                    true
                }
                _ => false,
            })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.with_recovered(|entries| entries.len())
    }

    #[cfg(test)]
    pub(crate) fn current_dispatch_id(&self, identity: &RequestIdentity) -> Option<u64> {
        self.entries
            .with_recovered(|entries| entries.get(identity).map(|entry| entry.dispatch_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn identity(path: &str) -> RequestIdentity {
        RequestIdentity::new(&Method::GET, Some(path))
    }

    #[test]
    fn register_supersedes_previous_dispatch() {
        let registry = InFlightRegistry::default();
        let first = registry.register(identity("/data"));
        let second = registry.register(identity("/data"));

        assert!(first.cancel.is_cancelled());
        assert!(!second.cancel.is_cancelled());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.current_dispatch_id(&identity("/data")),
            Some(second.dispatch_id)
        );
    }

    #[test]
    fn distinct_identities_do_not_interfere() {
        let registry = InFlightRegistry::default();
        let a = registry.register(identity("/a"));
        let b = registry.register(identity("/b"));
        assert!(!a.cancel.is_cancelled());
        assert!(!b.cancel.is_cancelled());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn complete_is_idempotent_and_ignores_superseded_tickets() {
        let registry = InFlightRegistry::default();
        let first = registry.register(identity("/data"));
        let second = registry.register(identity("/data"));

        assert!(!registry.complete(&first));
        assert_eq!(registry.len(), 1);

        assert!(registry.complete(&second));
        assert!(!registry.complete(&second));
        assert_eq!(registry.len(), 0);
    }
}
