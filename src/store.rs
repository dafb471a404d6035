use crate::error::Error;
use crate::model::Process;
use async_trait::async_trait;
use std::time::{Duration, SystemTime};

/// Abstraction over the external, strongly-consistent key-value store.
/// Both operations must be idempotent at the store level;
/// conditional-update linearisation on the store side is the only source
/// of ordering the coordinator relies on.
#[async_trait]
pub trait Store<Id, ProcessorId>: Send + Sync {
    /// Conditionally set `started_at := now` on the item keyed by
    /// `(id, processor_id)` if it is not already present, returning the
    /// **prior** attribute set atomically (return-old-values semantics —
    /// without this, two claimants can both observe "no prior record").
    ///
    /// `Ok(None)` means no prior item existed (the caller's claim created
    /// the record). `Ok(Some(process))` is the prior state, classified by
    /// [`crate::classify::classify`] to decide what the caller should do.
    async fn claim(
        &self,
        id: Id,
        processor_id: ProcessorId,
        now: SystemTime,
    ) -> Result<Option<Process<Id, ProcessorId>>, Error>;

    /// Unconditionally set `completed_at := now` and
    /// `expires_on := now + ttl`. No precondition: a completion raced in
    /// after a timeout is still a valid completion, last writer wins.
    async fn commit(
        &self,
        id: Id,
        processor_id: ProcessorId,
        now: SystemTime,
        ttl: Duration,
    ) -> Result<(), Error>;

    /// Delete the `(id, processor_id)` item outright: an operator escape
    /// hatch to clear a slot ahead of its TTL, outside the normal
    /// claim/poll/complete protocol.
    async fn invalidate(&self, id: Id, processor_id: ProcessorId) -> Result<(), Error>;
}
