//! Supervisor for the pipelined crawl's URL queue
//!
//! The supervisor owns the only sender of the URL queue. It dispatches
//! URLs while the page budget allows, tracks how many dispatched pages are
//! still in flight, and closes the queue once nothing is in flight and
//! either the budget is spent or the listing is exhausted. Closing the URL
//! queue is what shuts the pipeline down.

use std::fmt;
use tokio::sync::mpsc::Sender;
use url::Url;

/// Why the URL queue was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The page budget was spent
    BudgetSpent,

    /// The last page had no next page
    Exhausted,

    /// The fetch stage stopped receiving URLs
    FetchStageGone,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BudgetSpent => write!(f, "page budget spent"),
            Self::Exhausted => write!(f, "listing exhausted"),
            Self::FetchStageGone => write!(f, "fetch stage stopped"),
        }
    }
}

/// Tracks dispatched and completed pages against the page budget
pub struct Supervisor {
    urls: Option<Sender<Url>>,
    budget: usize,
    dispatched: usize,
    completed: usize,
    closed: Option<CloseReason>,
}

impl Supervisor {
    /// Creates a supervisor owning the URL queue sender
    pub fn new(urls: Sender<Url>, budget: usize) -> Self {
        Self {
            urls: Some(urls),
            budget,
            dispatched: 0,
            completed: 0,
            closed: None,
        }
    }

    /// Number of pages dispatched but not yet completed
    pub fn in_flight(&self) -> usize {
        self.dispatched - self.completed
    }

    /// Number of pages dispatched so far
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    /// Returns why the queue was closed, if it was
    pub fn closed(&self) -> Option<CloseReason> {
        self.closed
    }

    pub fn is_open(&self) -> bool {
        self.closed.is_none()
    }

    /// Sends a URL to the fetch stage if the budget allows
    ///
    /// Returns false when the URL was not dispatched: the budget is spent,
    /// the queue is closed, or the fetch stage is gone (the queue is then
    /// closed).
    pub async fn dispatch(&mut self, url: Url) -> bool {
        if self.dispatched >= self.budget {
            tracing::debug!(
                "Page budget of {} spent, not dispatching {}",
                self.budget,
                url
            );
            return false;
        }

        let Some(urls) = &self.urls else {
            return false;
        };

        tracing::debug!("Dispatching page {}: {}", self.dispatched + 1, url);

        if urls.send(url).await.is_err() {
            self.close(CloseReason::FetchStageGone);
            return false;
        }

        self.dispatched += 1;
        true
    }

    /// Records a completed page and follows its next page, if any
    ///
    /// Closes the queue once no page is in flight. Returns whether the
    /// queue is still open.
    pub async fn complete(&mut self, next: Option<Url>) -> bool {
        self.completed += 1;
        tracing::debug!(
            "Completed page {} of at most {}",
            self.completed,
            self.budget
        );

        let followed = match next {
            Some(url) => self.dispatch(url).await,
            None => false,
        };

        if !followed && self.is_open() && self.in_flight() == 0 {
            let reason = if self.dispatched >= self.budget {
                CloseReason::BudgetSpent
            } else {
                CloseReason::Exhausted
            };
            self.close(reason);
        }

        self.is_open()
    }

    fn close(&mut self, reason: CloseReason) {
        if self.urls.take().is_some() {
            tracing::info!(
                "Closing URL queue after {} pages: {}",
                self.dispatched,
                reason
            );
            self.closed = Some(reason);
        }
    }
}
