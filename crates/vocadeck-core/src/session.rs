//! Per-run state: images already assigned and the abort flag

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct AbortState {
    raised: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation shared between the CLI and the fetch loop
///
/// Once raised, no new provider calls are issued and a provider call that is
/// waiting out a rate limit is abandoned.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AbortState>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.raised.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    pub fn is_aborted(&self) -> bool {
        self.0.raised.load(Ordering::SeqCst)
    }

    /// Resolves once the signal is raised
    pub async fn aborted(&self) {
        loop {
            let notified = self.0.notify.notified();
            tokio::pin!(notified);
            // register before checking the flag so a concurrent abort is not missed
            notified.as_mut().enable();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}

/// Counters reported at the end of a run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStats {
    pub cache_hits: u64,
    pub provider_calls: u64,
    pub provider_errors: u64,
    pub relaxed_searches: u64,
    pub fallbacks: u64,
}

/// State scoped to one deck-building run
///
/// Guarantees that no image URL is handed to two notes of the same run.
#[derive(Debug, Default)]
pub struct FetchSession {
    used_images: HashSet<String>,
    pub stats: FetchStats,
    abort: AbortSignal,
}

impl FetchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session observing an externally owned abort signal
    pub fn with_abort(abort: AbortSignal) -> Self {
        Self {
            abort,
            ..Default::default()
        }
    }

    pub fn used_images(&self) -> &HashSet<String> {
        &self.used_images
    }

    pub fn is_used(&self, url: &str) -> bool {
        self.used_images.contains(url)
    }

    /// Record an assignment; returns false if the URL was already taken
    pub fn mark_used(&mut self, url: &str) -> bool {
        self.used_images.insert(url.to_string())
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_aborted()
    }

    pub fn abort_signal(&self) -> &AbortSignal {
        &self.abort
    }
}
