use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// A value usable as the `id` or `processor_id` component of a [`Process`]
/// key: anything with a total `Serialize`/`DeserializeOwned` round trip to
/// a store scalar. Expressed as a trait bound rather than runtime
/// reflection.
pub trait StoreKey: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> StoreKey for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// The two-valued result of `try_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// No prior completed or live claim was observed; the caller must do
    /// the work and call `complete`.
    NotSeen,
    /// The work has already been handled by some claimant.
    Seen,
}

/// Output of the status classifier.
///
/// `NotStarted` is never produced by [`crate::classify::classify`] itself —
/// it is synthesized by the coordinator when the store reports no prior
/// record at all, i.e. when there is no classifier input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    NotStarted,
    Started,
    Timeout,
    Completed,
}

/// TTL expiration timestamp, epoch-seconds resolution to match the store's
/// TTL attribute convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct Expiration {
    pub instant: SystemTime,
}

impl Expiration {
    pub fn new(instant: SystemTime) -> Self {
        Self { instant }
    }

    pub fn from_ttl(now: SystemTime, ttl: Duration) -> Self {
        Self { instant: now + ttl }
    }
}

/// The persisted per-process record.
///
/// Deliberately carries no result value: losers observe [`Sample::Seen`]
/// and run an alternate branch of their own, never the winner's result.
#[derive(Debug, Clone)]
pub struct Process<Id, ProcessorId> {
    pub id: Id,
    pub processor_id: ProcessorId,
    /// Set once by the first successful claim. Immutable thereafter.
    pub started_at: SystemTime,
    /// Set at most once, by the claimant that calls `complete`.
    pub completed_at: Option<SystemTime>,
    /// Present iff `completed_at` is present.
    pub expires_on: Option<Expiration>,
}

impl<Id, ProcessorId> Process<Id, ProcessorId> {
    pub fn new(id: Id, processor_id: ProcessorId, started_at: SystemTime) -> Self {
        Self {
            id,
            processor_id,
            started_at,
            completed_at: None,
            expires_on: None,
        }
    }
}

/// The delay sequence and overall deadline governing how long `try_start`
/// waits on an in-flight peer.
///
/// A pure value: `initial_delay`, `max_poll_duration`, and a pure
/// `next_delay(poll_no, prev_delay) -> delay` function. The built-in
/// [`PollStrategy::exponential`] policy is `min(prev_delay * multiplier,
/// cap)`; [`PollStrategy::linear`] holds the delay constant. Callers may
/// supply any other pure function via [`PollStrategy::new`].
#[derive(Clone)]
pub struct PollStrategy {
    pub initial_delay: Duration,
    pub max_poll_duration: Duration,
    next_delay: Arc<dyn Fn(u32, Duration) -> Duration + Send + Sync>,
}

impl fmt::Debug for PollStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollStrategy")
            .field("initial_delay", &self.initial_delay)
            .field("max_poll_duration", &self.max_poll_duration)
            .finish_non_exhaustive()
    }
}

impl PollStrategy {
    /// Build a poll strategy from an arbitrary pure `next_delay` function.
    pub fn new(
        initial_delay: Duration,
        max_poll_duration: Duration,
        next_delay: impl Fn(u32, Duration) -> Duration + Send + Sync + 'static,
    ) -> Self {
        Self {
            initial_delay,
            max_poll_duration,
            next_delay: Arc::new(next_delay),
        }
    }

    /// Constant delay between polls.
    pub fn linear(delay: Duration, max_poll_duration: Duration) -> Self {
        Self::new(delay, max_poll_duration, |_poll_no, prev_delay| prev_delay)
    }

    /// Exponential backoff with a cap: `min(prev_delay * multiplier, cap)`.
    pub fn exponential(
        initial_delay: Duration,
        multiplier: f64,
        cap: Duration,
        max_poll_duration: Duration,
    ) -> Self {
        Self::new(initial_delay, max_poll_duration, move |_poll_no, prev_delay| {
            prev_delay.mul_f64(multiplier).min(cap)
        })
    }

    pub fn next_delay(&self, poll_no: u32, prev_delay: Duration) -> Duration {
        (self.next_delay)(poll_no, prev_delay)
    }
}

/// Configuration surface, minus the table name, which belongs to the
/// concrete [`crate::store::Store`] implementation rather than the
/// coordinator itself.
#[derive(Debug, Clone)]
pub struct Config<ProcessorId> {
    pub processor_id: ProcessorId,
    /// A `Started` record older than this is considered abandoned.
    pub max_processing_time: Duration,
    /// Added to `completed_at` to produce `expires_on`. Mandatory, so a
    /// completed record always gets an expiry.
    pub ttl: Duration,
    pub poll_strategy: PollStrategy,
}

impl<ProcessorId> Config<ProcessorId> {
    pub fn new(
        processor_id: ProcessorId,
        max_processing_time: Duration,
        ttl: Duration,
        poll_strategy: PollStrategy,
    ) -> Self {
        Self {
            processor_id,
            max_processing_time,
            ttl,
            poll_strategy,
        }
    }
}
