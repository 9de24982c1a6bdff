//! Short-lived release cache with in-flight request deduplication.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;

use crate::error::ResolveError;

use super::{Provider, ReleaseInfo, RepositoryRef};

/// Outcome of the last upstream request for one repository.
struct Fetched {
    fetched_at: Instant,
    outcome: Result<Vec<ReleaseInfo>, ResolveError>,
}

impl Fetched {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.outcome.is_ok() && self.fetched_at.elapsed() < ttl
    }
}

type Slot = Arc<tokio::sync::Mutex<Option<Fetched>>>;

/// Wraps a provider so that callers asking for the same repository share one
/// upstream request.
///
/// A successful listing is reused for `ttl`. Callers that were already waiting
/// while a request was in flight share its outcome, failures included, even
/// with a zero TTL. Later callers never see a cached failure.
pub struct CachingProvider<P: Provider> {
    inner: P,
    ttl: Duration,
    slots: DashMap<RepositoryRef, Slot>,
}

impl<P: Provider> CachingProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            slots: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self, repo: &RepositoryRef) -> Slot {
        self.slots.entry(repo.clone()).or_default().clone()
    }

    /// Drop slots nobody is waiting on whose outcome can no longer be reused.
    fn evict_expired(&self) {
        let ttl = self.ttl;
        self.slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(fetched) => fetched.as_ref().is_some_and(|f| f.is_fresh(ttl)),
                Err(_) => true,
            }
        });
    }

    async fn fetch(&self, repo: &RepositoryRef) -> Result<Vec<ReleaseInfo>, ResolveError> {
        let requested_at = Instant::now();
        let slot = self.slot(repo);
        let mut last = slot.lock().await;

        if let Some(fetched) = last.as_ref() {
            if fetched.fetched_at >= requested_at {
                debug!("Sharing the outcome of a concurrent request for {}", repo);
                return fetched.outcome.clone();
            }
            if fetched.is_fresh(self.ttl) {
                debug!("Using cached releases of {}", repo);
                return fetched.outcome.clone();
            }
        }

        let outcome = self.inner.list_releases(repo).await;
        *last = Some(Fetched {
            fetched_at: Instant::now(),
            outcome: outcome.clone(),
        });
        outcome
    }
}

#[async_trait]
impl<P: Provider> Provider for CachingProvider<P> {
    fn api_url(&self) -> &str {
        self.inner.api_url()
    }

    async fn list_releases(&self, repo: &RepositoryRef) -> Result<Vec<ReleaseInfo>, ResolveError> {
        let outcome = self.fetch(repo).await;
        self.evict_expired();
        outcome
    }
}
