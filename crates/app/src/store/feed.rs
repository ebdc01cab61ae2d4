//! Submission change subscriptions.
//!
//! A [`SubmissionFeed`] turns backend changes into a per-email stream of
//! [`ChangeEvent`]s. Two implementations ship here: [`BroadcastFeed`], an
//! in-process hub that publishers push into, and [`PollingFeed`], which
//! re-reads the latest submission on an interval.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use mindwell_core::{Email, Submission};

use super::SubmissionReader;
use crate::error::StoreError;

const SUBSCRIPTION_BUFFER: usize = 32;

/// A submission row after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub submission: Submission,
}

/// A live subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::Receiver<ChangeEvent>,
    task: JoinHandle<()>,
}

impl Subscription {
    fn new(events: mpsc::Receiver<ChangeEvent>, task: JoinHandle<()>) -> Self {
        Self { events, task }
    }

    /// Wait for the next change. Returns `None` once the feed has closed.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Stop receiving changes.
    pub fn unsubscribe(self) {
        self.task.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Source of submission change events.
#[async_trait]
pub trait SubmissionFeed: Send + Sync {
    /// Subscribe to changes of submissions owned by `email`.
    ///
    /// Changes made after this returns are guaranteed to be delivered.
    async fn subscribe(&self, email: &Email) -> Result<Subscription, StoreError>;
}

/// In-process change hub.
#[derive(Debug, Clone)]
pub struct BroadcastFeed {
    tx: broadcast::Sender<Submission>,
}

impl Default for BroadcastFeed {
    fn default() -> Self {
        Self::new(64)
    }
}

impl BroadcastFeed {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a changed row to every matching subscriber.
    pub fn publish(&self, submission: Submission) {
        // No subscribers is not an error.
        let _ = self.tx.send(submission);
    }
}

#[async_trait]
impl SubmissionFeed for BroadcastFeed {
    async fn subscribe(&self, email: &Email) -> Result<Subscription, StoreError> {
        let mut rx = self.tx.subscribe();
        let (out, events) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let email = email.clone();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(submission) if submission.user_email == email => {
                        if out.send(ChangeEvent { submission }).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Submission feed subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Subscription::new(events, task))
    }
}

/// Feed that polls the latest submission for changes.
#[derive(Clone)]
pub struct PollingFeed {
    reader: Arc<dyn SubmissionReader>,
    interval: Duration,
}

impl PollingFeed {
    #[must_use]
    pub fn new(reader: Arc<dyn SubmissionReader>, interval: Duration) -> Self {
        Self { reader, interval }
    }
}

#[async_trait]
impl SubmissionFeed for PollingFeed {
    async fn subscribe(&self, email: &Email) -> Result<Subscription, StoreError> {
        // The current row is the baseline; only later changes are emitted.
        let mut last = self.reader.latest_by_email(email).await?;
        let (out, events) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let reader = Arc::clone(&self.reader);
        let interval = self.interval;
        let email = email.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match reader.latest_by_email(&email).await {
                    Ok(Some(submission)) if last.as_ref() != Some(&submission) => {
                        last = Some(submission.clone());
                        if out.send(ChangeEvent { submission }).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Submission poll failed"),
                }
            }
        });

        Ok(Subscription::new(events, task))
    }
}
