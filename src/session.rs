//! Background availability fetches for one dashboard session.
//!
//! A submit starts exactly one fetch on the runtime and blocks further
//! submits until it finishes. Every fetch is stamped with a sequence number
//! and only the result of the latest one is kept, so a late answer from a
//! superseded fetch can never replace a newer result. A finished fetch
//! replaces the previous readings; it never merges with them.

use anyhow::anyhow;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, warn};

use crate::models::AvailabilityReading;
use crate::services::catalog_api::AvailabilityApi;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("fetch {0} is still running")]
    InFlight(u64),
}

#[derive(Debug, Clone, Default)]
struct SessionState {
    latest: u64,
    completed: u64,
    running: bool,
    official_id: String,
    county: String,
    readings: Arc<Vec<AvailabilityReading>>,
    error: Option<String>,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, Default)]
pub struct FetchSnapshot {
    /// Sequence number of the fetch whose result is held, 0 before any.
    pub seq: u64,
    /// Sequence number of the most recent submit.
    pub latest: u64,
    pub running: bool,
    pub official_id: String,
    pub county: String,
    pub readings: Arc<Vec<AvailabilityReading>>,
    /// Set when the latest fetch failed; its readings are then empty.
    pub error: Option<String>,
}

pub struct FetchSession {
    source: Arc<dyn AvailabilityApi>,
    timeout: Duration,
    state: watch::Sender<SessionState>,
}

impl FetchSession {
    pub fn new(source: Arc<dyn AvailabilityApi>, timeout: Duration) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            source,
            timeout,
            state,
        }
    }

    /// Issues a new sequence number and marks the session busy. A running
    /// fetch is superseded when `supersede` is set, otherwise it blocks.
    fn advance(
        &self,
        official_id: &str,
        county: &str,
        supersede: bool,
    ) -> Result<u64, SubmitError> {
        let mut outcome = Ok(0);
        self.state.send_if_modified(|s| {
            if s.running && !supersede {
                outcome = Err(SubmitError::InFlight(s.latest));
                return false;
            }
            s.latest += 1;
            s.running = true;
            s.official_id = official_id.to_string();
            s.county = county.to_string();
            outcome = Ok(s.latest);
            true
        });
        outcome
    }

    /// Stores the outcome of fetch `seq`. Returns `false` and drops the
    /// result when a newer fetch has been started since.
    pub fn complete(&self, seq: u64, result: anyhow::Result<Vec<AvailabilityReading>>) -> bool {
        let mut accepted = false;
        self.state.send_if_modified(|s| {
            if seq != s.latest {
                return false;
            }
            match result {
                Ok(readings) => {
                    s.readings = Arc::new(readings);
                    s.error = None;
                }
                Err(ref e) => {
                    s.readings = Arc::new(Vec::new());
                    s.error = Some(format!("{e:#}"));
                }
            }
            s.completed = seq;
            s.running = false;
            accepted = true;
            true
        });

        if !accepted {
            debug!(seq, "Discarded result of superseded fetch");
        }
        accepted
    }

    /// Starts a background fetch unless one is already running.
    pub fn submit(self: &Arc<Self>, official_id: &str, county: &str) -> Result<u64, SubmitError> {
        let seq = self.advance(official_id, county, false)?;

        let session = Arc::clone(self);
        let official_id = official_id.to_string();
        let county = county.to_string();
        let span = tracing::info_span!("fetch", seq, official_id = %official_id, county = %county);

        tokio::spawn(
            async move {
                info!("Fetch started");
                let started = Instant::now();

                // a panicking source must still settle the session
                let mut fetch = {
                    let source = Arc::clone(&session.source);
                    let official_id = official_id.clone();
                    let county = county.clone();
                    tokio::spawn(
                        async move { source.fetch_availability(&official_id, &county).await }
                            .in_current_span(),
                    )
                };

                let result = match tokio::time::timeout(session.timeout, &mut fetch).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) if e.is_panic() => Err(anyhow!("fetch task panicked")),
                    Ok(Err(e)) => Err(anyhow!("fetch task failed: {e}")),
                    Err(_) => {
                        fetch.abort();
                        Err(anyhow!(
                            "fetch timed out after {}s",
                            session.timeout.as_secs_f64()
                        ))
                    }
                };

                match &result {
                    Ok(readings) => info!(
                        readings = readings.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Fetch finished"
                    ),
                    Err(e) => error!(error = %e, "Fetch failed"),
                }

                if !session.complete(seq, result) {
                    warn!("Fetch result arrived after a newer submit");
                }
            }
            .instrument(span),
        );

        Ok(seq)
    }

    pub fn snapshot(&self) -> FetchSnapshot {
        let s = self.state.borrow();
        FetchSnapshot {
            seq: s.completed,
            latest: s.latest,
            running: s.running,
            official_id: s.official_id.clone(),
            county: s.county.clone(),
            readings: Arc::clone(&s.readings),
            error: s.error.clone(),
        }
    }

    /// Resolves once no fetch is running.
    pub async fn wait_idle(&self) -> FetchSnapshot {
        let mut rx = self.state.subscribe();
        // the sender lives in self, so the channel cannot close here
        let _ = rx.wait_for(|s| !s.running).await;
        self.snapshot()
    }
}

/// Sessions left untouched this long are dropped with their readings.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

struct Entry {
    session: Arc<FetchSession>,
    last_seen: Instant,
}

/// Sessions keyed by the client-supplied session id.
///
/// Only [`SessionRegistry::get`] creates sessions. Every access sweeps out
/// sessions idle for longer than the TTL unless a fetch is still running.
pub struct SessionRegistry {
    source: Arc<dyn AvailabilityApi>,
    timeout: Duration,
    idle_ttl: Duration,
    sessions: Mutex<HashMap<String, Entry>>,
}

impl SessionRegistry {
    pub fn new(source: Arc<dyn AvailabilityApi>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            idle_ttl: DEFAULT_IDLE_TTL,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let ttl = self.idle_ttl;
        let before = sessions.len();
        sessions.retain(|_, e| e.last_seen.elapsed() < ttl || e.session.snapshot().running);
        if sessions.len() < before {
            debug!(evicted = before - sessions.len(), "Dropped idle sessions");
        }
        sessions
    }

    /// Returns the session for `id`, creating it on first use.
    pub fn get(&self, id: &str) -> Arc<FetchSession> {
        let mut sessions = self.lock();
        let entry = sessions.entry(id.to_string()).or_insert_with(|| {
            debug!(session = id, "New dashboard session");
            Entry {
                session: Arc::new(FetchSession::new(Arc::clone(&self.source), self.timeout)),
                last_seen: Instant::now(),
            }
        });
        entry.last_seen = Instant::now();
        Arc::clone(&entry.session)
    }

    /// Looks up an existing session without creating one.
    pub fn find(&self, id: &str) -> Option<Arc<FetchSession>> {
        let mut sessions = self.lock();
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(Arc::clone(&entry.session))
    }

    /// State of `id`, or an empty snapshot for an unknown session.
    pub fn snapshot(&self, id: &str) -> FetchSnapshot {
        self.find(id).map(|s| s.snapshot()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
