use crate::classify::classify;
use crate::clock::{Clock, SystemClock};
use crate::error::Error;
use crate::model::{Config, ProcessStatus, Sample, StoreKey};
use crate::store::Store;
use std::future::Future;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::{debug, info, instrument, warn};

// No-op macros when tracing is disabled.
#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($tt:tt)*) => {{}};
}
#[cfg(not(feature = "tracing"))]
macro_rules! info {
    ($($tt:tt)*) => {{}};
}
#[cfg(not(feature = "tracing"))]
macro_rules! warn {
    ($($tt:tt)*) => {{}};
}

/// Drives the claim/poll/complete loop that gives distributed, at-least-once
/// callers exactly-once processing. This is the public API: `try_start`,
/// `complete`, `protect`, `protect_either`.
pub struct Coordinator<Id, ProcessorId> {
    store: Arc<dyn Store<Id, ProcessorId>>,
    config: Config<ProcessorId>,
    clock: Arc<dyn Clock>,
}

impl<Id, ProcessorId> Coordinator<Id, ProcessorId>
where
    Id: StoreKey + std::fmt::Debug,
    ProcessorId: StoreKey + std::fmt::Debug,
{
    pub fn new(store: Arc<dyn Store<Id, ProcessorId>>, config: Config<ProcessorId>) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Construct with an injected [`Clock`] — used by tests that need
    /// deterministic control over "now" without sleeping real durations.
    pub fn with_clock(
        store: Arc<dyn Store<Id, ProcessorId>>,
        config: Config<ProcessorId>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    /// Atomically attempt to claim processing of `id`.
    ///
    /// Returns `Ok(Sample::NotSeen)` when the caller should do the work
    /// (either no record existed, or the prior claimant timed out and is
    /// presumed abandoned). Returns `Ok(Sample::Seen)` when the work is
    /// already done. Polls while a peer is in flight, up to
    /// `max_poll_duration`, after which it fails with
    /// `Error::PollingTimeout` rather than silently taking over.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(id = ?id)))]
    pub async fn try_start(&self, id: Id) -> Result<Sample, Error> {
        let processor_id = self.config.processor_id.clone();
        let max_processing_time = self.config.max_processing_time;
        let poll_strategy = &self.config.poll_strategy;

        let t0 = self.clock.now();
        let mut poll_no: u32 = 0;
        let mut delay = poll_strategy.initial_delay;

        loop {
            let now = self.clock.now();
            debug!("attempting to claim");
            let prior = self.store.claim(id.clone(), processor_id.clone(), now).await?;

            let status = match &prior {
                None => ProcessStatus::NotStarted,
                Some(process) => classify(process, now, max_processing_time),
            };

            match status {
                ProcessStatus::NotStarted => {
                    info!("no previous record, proceeding as new owner");
                    return Ok(Sample::NotSeen);
                }
                ProcessStatus::Timeout => {
                    info!("previous claimant timed out, reclaiming");
                    return Ok(Sample::NotSeen);
                }
                ProcessStatus::Completed => {
                    info!("already completed");
                    return Ok(Sample::Seen);
                }
                ProcessStatus::Started => {
                    let elapsed = now
                        .duration_since(t0)
                        .map_err(|e| Error::Internal(e.to_string()))?;

                    if elapsed >= poll_strategy.max_poll_duration {
                        warn!("exceeded max poll duration waiting on an in-flight peer");
                        return Err(Error::PollingTimeout);
                    }

                    debug!(poll_no, ?delay, "peer still running, polling");
                    tokio::time::sleep(delay).await;
                    delay = poll_strategy.next_delay(poll_no, delay);
                    poll_no += 1;
                }
            }
        }
    }

    /// Mark a process as completed, stamping `completed_at`/`expires_on`.
    /// Idempotent: calling it more than once just moves the timestamps
    /// forward.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(id = ?id)))]
    pub async fn complete(&self, id: Id) -> Result<(), Error> {
        let now = self.clock.now();
        self.store
            .commit(id, self.config.processor_id.clone(), now, self.config.ttl)
            .await
    }

    /// Delete the `(id, processorId)` record outright, ahead of its TTL —
    /// an operator escape hatch outside the normal claim/poll/complete
    /// protocol.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(id = ?id)))]
    pub async fn invalidate(&self, id: Id) -> Result<(), Error> {
        self.store.invalidate(id, self.config.processor_id.clone()).await
    }

    /// Run `process` exactly once across distributed callers.
    ///
    /// On `NotSeen`, runs `process` and calls `complete` only if it
    /// succeeds, returning `Some(value)`. On `Seen`, returns `None`
    /// without running `process`. If `process` fails, `complete` is not
    /// called and the error propagates — the record stays `Started` and
    /// becomes reclaimable after `max_processing_time`.
    pub async fn protect<F, Fut, A>(&self, id: Id, process: F) -> Result<Option<A>, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<A, Error>>,
    {
        match self.try_start(id.clone()).await? {
            Sample::NotSeen => {
                let value = process().await?;
                self.complete(id).await?;
                Ok(Some(value))
            }
            Sample::Seen => Ok(None),
        }
    }

    /// Run exactly one of `if_not_seen` or `if_seen`, then call `complete`
    /// in both cases — an explicit, intentional difference from
    /// [`Coordinator::protect`]: the caller is stating that both branches
    /// are safe to mark completed, e.g. to consume the dedup slot from the
    /// losing side too. If the chosen branch fails, `complete` is skipped
    /// and the error propagates, same as `protect`.
    pub async fn protect_either<FNotSeen, FutNotSeen, FSeen, FutSeen, A>(
        &self,
        id: Id,
        if_not_seen: FNotSeen,
        if_seen: FSeen,
    ) -> Result<A, Error>
    where
        FNotSeen: FnOnce() -> FutNotSeen,
        FutNotSeen: Future<Output = Result<A, Error>>,
        FSeen: FnOnce() -> FutSeen,
        FutSeen: Future<Output = Result<A, Error>>,
    {
        let value = match self.try_start(id.clone()).await? {
            Sample::NotSeen => if_not_seen().await?,
            Sample::Seen => if_seen().await?,
        };
        self.complete(id).await?;
        Ok(value)
    }
}
