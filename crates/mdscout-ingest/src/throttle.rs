//! Cooperative throttling of remote calls
//!
//! UniProt and RCSB are public services without an API key; mdscout keeps a
//! fixed pause after each call. The pause policy sits behind [`Throttle`] so
//! tests can run without waiting and other policies can be swapped in.

use crate::config::Delays;
use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;

/// Which kind of call just completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pause {
    /// One page of the RCSB criteria search
    SearchPage,
    /// One polymer or non-polymer entity fetch
    EntityLookup,
    /// One structure examined by the direct flow
    DirectDetail,
    /// One structure examined for a UniProt candidate
    CandidateDetail,
}

/// Pause policy applied after remote calls
#[async_trait]
pub trait Throttle: Send + Sync {
    async fn pause(&self, kind: Pause);
}

/// Sleeps for a fixed duration per call kind
#[derive(Debug, Clone, Default)]
pub struct FixedDelay {
    delays: Delays,
}

impl FixedDelay {
    pub fn new(delays: Delays) -> Self {
        Self { delays }
    }

    pub fn delay_for(&self, kind: Pause) -> Duration {
        match kind {
            Pause::SearchPage => self.delays.search_page,
            Pause::EntityLookup => self.delays.entity_lookup,
            Pause::DirectDetail => self.delays.direct_detail,
            Pause::CandidateDetail => self.delays.candidate_detail,
        }
    }
}

#[async_trait]
impl Throttle for FixedDelay {
    async fn pause(&self, kind: Pause) {
        let delay = self.delay_for(kind);
        if !delay.is_zero() {
            trace!(?kind, delay_ms = delay.as_millis() as u64, "Throttling");
            tokio::time::sleep(delay).await;
        }
    }
}

/// Never waits
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Throttle for NoDelay {
    async fn pause(&self, _kind: Pause) {}
}

/// Records every pause instead of waiting
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingThrottle {
    pauses: std::sync::Mutex<Vec<Pause>>,
}

#[cfg(test)]
impl RecordingThrottle {
    pub(crate) fn count(&self, kind: Pause) -> usize {
        self.pauses
            .lock()
            .map(|pauses| pauses.iter().filter(|p| **p == kind).count())
            .unwrap_or(0)
    }

    pub(crate) fn total(&self) -> usize {
        self.pauses.lock().map(|pauses| pauses.len()).unwrap_or(0)
    }
}

#[cfg(test)]
#[async_trait]
impl Throttle for RecordingThrottle {
    async fn pause(&self, kind: Pause) {
        if let Ok(mut pauses) = self.pauses.lock() {
            pauses.push(kind);
        }
    }
}
