//! Top-level route gate.
//!
//! Decides whether the user belongs in onboarding or the main application
//! and re-decides on every session change, so finishing onboarding or
//! following a magic link moves the user without reloading anything.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::Identity;
use crate::session::{SessionContext, SessionState};
use crate::store::ProfileStore;

/// Where the user should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Session not resolved yet.
    Loading,
    Onboarding,
    Main,
}

/// Route for a resolved session.
///
/// Only a profile with `onboarding_completed` set leads to `Main`. A failed
/// profile lookup is treated like a missing profile.
pub async fn resolve_route(identity: Option<&Identity>, profiles: &dyn ProfileStore) -> Route {
    let Some(identity) = identity else {
        return Route::Onboarding;
    };

    match profiles.find_by_identity(identity.id).await {
        Ok(Some(profile)) if profile.onboarding_completed() => Route::Main,
        Ok(_) => Route::Onboarding,
        Err(e) => {
            tracing::warn!(identity = %identity.id, error = %e, "Profile lookup failed");
            Route::Onboarding
        }
    }
}

async fn route_for(state: &SessionState, profiles: &dyn ProfileStore) -> Route {
    if state.is_resolved() {
        resolve_route(state.identity.as_ref(), profiles).await
    } else {
        Route::Loading
    }
}

/// Background task that keeps the current [`Route`] up to date.
///
/// Dropping the gate stops the task.
pub struct RouteGate {
    rx: watch::Receiver<Route>,
    task: JoinHandle<()>,
}

impl RouteGate {
    /// Start following `session`.
    #[must_use]
    pub fn spawn(session: &SessionContext, profiles: Arc<dyn ProfileStore>) -> Self {
        let (tx, rx) = watch::channel(Route::Loading);
        let mut sessions = session.subscribe();

        let task = tokio::spawn(async move {
            loop {
                let state = sessions.borrow_and_update().clone();
                let route = route_for(&state, profiles.as_ref()).await;
                tracing::debug!(?route, generation = state.generation, "Route resolved");
                tx.send_replace(route);

                if sessions.changed().await.is_err() {
                    break;
                }
            }
        });

        Self { rx, task }
    }

    /// Latest resolved route.
    #[must_use]
    pub fn current(&self) -> Route {
        *self.rx.borrow()
    }

    /// Receive every route change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.rx.clone()
    }

    /// Wait until the gate reaches `route`.
    ///
    /// Returns `None` if the gate task stopped first.
    pub async fn wait_for(&self, route: Route) -> Option<Route> {
        let mut rx = self.rx.clone();
        rx.wait_for(|current| *current == route).await.ok().map(|r| *r)
    }
}

impl Drop for RouteGate {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use mindwell_core::{AlertPreferences, Email};

    use super::*;
    use crate::error::StoreError;
    use crate::models::ProfileFields;
    use crate::store::MemoryBackend;
    use crate::store::memory::Operation;

    fn fields(completed: bool) -> ProfileFields {
        ProfileFields {
            full_name: "Alex Kim".to_string(),
            age: Some(29),
            email: None,
            gender: None,
            medical_history: None,
            current_medications: None,
            alert_preferences: AlertPreferences::default(),
            onboarding_completed: completed,
        }
    }

    fn signed_in(backend: &MemoryBackend) -> Identity {
        let email = Email::parse("alex@x.com").unwrap();
        backend.register(&email).unwrap();
        backend.sign_in(&email).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_route() {
        let backend = MemoryBackend::new();
        assert_eq!(resolve_route(None, &backend).await, Route::Onboarding);

        let identity = signed_in(&backend);
        assert_eq!(
            resolve_route(Some(&identity), &backend).await,
            Route::Onboarding
        );

        backend.insert(identity.id, fields(false)).await.unwrap();
        assert_eq!(
            resolve_route(Some(&identity), &backend).await,
            Route::Onboarding
        );

        backend.update_by_identity(identity.id, fields(true)).await.unwrap();
        assert_eq!(resolve_route(Some(&identity), &backend).await, Route::Main);
    }

    #[tokio::test]
    async fn test_lookup_error_routes_to_onboarding() {
        let backend = MemoryBackend::new();
        let identity = signed_in(&backend);
        backend.insert(identity.id, fields(true)).await.unwrap();
        backend
            .fail_next(Operation::FindProfile, StoreError::NotAuthenticated)
            .unwrap();
        assert_eq!(
            resolve_route(Some(&identity), &backend).await,
            Route::Onboarding
        );
    }

    #[tokio::test]
    async fn test_gate_follows_session_events() {
        let backend = MemoryBackend::new();
        let session = SessionContext::new(Arc::new(backend.clone()));
        let gate = RouteGate::spawn(&session, Arc::new(backend.clone()));
        assert_eq!(gate.current(), Route::Loading);

        session.start().await.unwrap();
        let route = tokio::time::timeout(Duration::from_secs(2), gate.wait_for(Route::Onboarding))
            .await
            .unwrap();
        assert_eq!(route, Some(Route::Onboarding));

        let identity = signed_in(&backend);
        backend.insert(identity.id, fields(true)).await.unwrap();
        session.refresh().await.unwrap();
        let route = tokio::time::timeout(Duration::from_secs(2), gate.wait_for(Route::Main))
            .await
            .unwrap();
        assert_eq!(route, Some(Route::Main));
    }
}
