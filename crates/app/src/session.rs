//! Observable session context.
//!
//! Holds the signed-in identity and broadcasts every change on a
//! [`tokio::sync::watch`] channel. Route gates and trackers subscribe to it
//! rather than polling the identity store.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::StoreError;
use crate::models::Identity;
use crate::store::IdentityStore;

/// What caused the latest session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Nothing has been resolved yet.
    Initial,
    /// First resolution after startup.
    Started,
    /// Re-read after a sign-in or profile change.
    Refreshed,
    SignedOut,
}

/// Snapshot published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub event: SessionEvent,
    /// Incremented on every publish, so two identical identities can still
    /// be told apart as separate refreshes.
    pub generation: u64,
}

impl SessionState {
    const fn initial() -> Self {
        Self {
            identity: None,
            event: SessionEvent::Initial,
            generation: 0,
        }
    }

    /// Whether the session has been resolved at least once.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.event != SessionEvent::Initial
    }
}

struct SessionInner {
    identities: Arc<dyn IdentityStore>,
    tx: watch::Sender<SessionState>,
}

/// Shared session handle. Clones observe the same state.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

impl SessionContext {
    #[must_use]
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        let (tx, _) = watch::channel(SessionState::initial());
        Self {
            inner: Arc::new(SessionInner { identities, tx }),
        }
    }

    /// Resolve the initial session.
    ///
    /// # Errors
    ///
    /// Returns the identity store error. The state stays `Initial`.
    pub async fn start(&self) -> Result<Option<Identity>, StoreError> {
        self.resolve(SessionEvent::Started).await
    }

    /// Re-read the identity and publish it.
    ///
    /// # Errors
    ///
    /// Returns the identity store error. The previous state is kept.
    pub async fn refresh(&self) -> Result<Option<Identity>, StoreError> {
        self.resolve(SessionEvent::Refreshed).await
    }

    /// Sign out and publish the empty session.
    ///
    /// # Errors
    ///
    /// Returns the identity store error. Nothing is published on failure.
    pub async fn sign_out(&self) -> Result<(), StoreError> {
        self.inner.identities.sign_out().await?;
        self.publish(None, SessionEvent::SignedOut);
        tracing::info!("Signed out");
        Ok(())
    }

    /// Current identity.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.inner.tx.borrow().identity.clone()
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.tx.borrow().clone()
    }

    /// Receive every future state. The current state is marked as seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.tx.subscribe()
    }

    /// The identity store behind this session.
    #[must_use]
    pub fn identities(&self) -> Arc<dyn IdentityStore> {
        Arc::clone(&self.inner.identities)
    }

    async fn resolve(&self, event: SessionEvent) -> Result<Option<Identity>, StoreError> {
        let identity = self.inner.identities.current_identity().await?;
        tracing::debug!(
            ?event,
            identity = identity.as_ref().map(|i| i.id.to_string()),
            "Session resolved"
        );
        self.publish(identity.clone(), event);
        Ok(identity)
    }

    fn publish(&self, identity: Option<Identity>, event: SessionEvent) {
        self.inner.tx.send_modify(|state| {
            state.identity = identity;
            state.event = event;
            state.generation += 1;
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mindwell_core::Email;

    use super::*;
    use crate::store::MemoryBackend;
    use crate::store::memory::Operation;

    #[tokio::test]
    async fn test_start_publishes_identity() {
        let backend = MemoryBackend::new();
        let email = Email::parse("alex@x.com").unwrap();
        backend.register(&email).unwrap();
        let identity = backend.sign_in(&email).unwrap();

        let session = SessionContext::new(Arc::new(backend));
        let mut rx = session.subscribe();
        assert!(!session.state().is_resolved());

        session.start().await.unwrap();
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.event, SessionEvent::Started);
        assert_eq!(state.identity, Some(identity));
        assert_eq!(state.generation, 1);
    }

    #[tokio::test]
    async fn test_refresh_bumps_generation() {
        let backend = MemoryBackend::new();
        let session = SessionContext::new(Arc::new(backend));
        session.start().await.unwrap();
        session.refresh().await.unwrap();
        let state = session.state();
        assert_eq!(state.event, SessionEvent::Refreshed);
        assert_eq!(state.generation, 2);
        assert!(state.identity.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_identity() {
        let backend = MemoryBackend::new();
        let email = Email::parse("alex@x.com").unwrap();
        backend.register(&email).unwrap();
        backend.sign_in(&email).unwrap();

        let session = SessionContext::new(Arc::new(backend.clone()));
        session.start().await.unwrap();
        assert!(session.identity().is_some());

        session.sign_out().await.unwrap();
        assert!(session.identity().is_none());
        assert_eq!(session.state().event, SessionEvent::SignedOut);
        assert!(backend.current_identity().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_state() {
        let backend = MemoryBackend::new();
        let session = SessionContext::new(Arc::new(backend.clone()));
        session.start().await.unwrap();

        backend
            .fail_next(Operation::CurrentIdentity, StoreError::NotAuthenticated)
            .unwrap();
        assert!(session.refresh().await.is_err());
        assert_eq!(session.state().event, SessionEvent::Started);
        assert_eq!(session.state().generation, 1);
    }
}
