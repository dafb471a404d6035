//! Test doubles shared across the integration test binaries: a `Store`
//! backed by an in-memory map (reproducing DynamoDB's `if_not_exists` +
//! return-old-values claim semantics without a running DynamoDB Local) and
//! a `Clock` an individual test can drive by hand.

use async_trait::async_trait;
use dedupe_rs::{Clock, Error, Expiration, Process, Store, StoreKey};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

pub struct InMemoryStore<Id, ProcessorId> {
    items: Mutex<HashMap<(Id, ProcessorId), Process<Id, ProcessorId>>>,
}

impl<Id, ProcessorId> Default for InMemoryStore<Id, ProcessorId>
where
    Id: Eq + Hash,
    ProcessorId: Eq + Hash,
{
    fn default() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<Id, ProcessorId> Store<Id, ProcessorId> for InMemoryStore<Id, ProcessorId>
where
    Id: StoreKey + Eq + Hash,
    ProcessorId: StoreKey + Eq + Hash,
{
    async fn claim(
        &self,
        id: Id,
        processor_id: ProcessorId,
        now: SystemTime,
    ) -> Result<Option<Process<Id, ProcessorId>>, Error> {
        let mut items = self.items.lock().unwrap();
        let key = (id.clone(), processor_id.clone());

        match items.get(&key) {
            Some(prior) => Ok(Some(prior.clone())),
            None => {
                items.insert(key, Process::new(id, processor_id, now));
                Ok(None)
            }
        }
    }

    async fn commit(
        &self,
        id: Id,
        processor_id: ProcessorId,
        now: SystemTime,
        ttl: Duration,
    ) -> Result<(), Error> {
        let mut items = self.items.lock().unwrap();
        let key = (id.clone(), processor_id.clone());
        let process = items
            .entry(key)
            .or_insert_with(|| Process::new(id, processor_id, now));
        process.completed_at = Some(now);
        process.expires_on = Some(Expiration::from_ttl(now, ttl));
        Ok(())
    }

    async fn invalidate(&self, id: Id, processor_id: ProcessorId) -> Result<(), Error> {
        self.items.lock().unwrap().remove(&(id, processor_id));
        Ok(())
    }
}

/// A clock an individual test can drive by hand, to exercise
/// `max_processing_time`/`max_poll_duration` arithmetic without sleeping
/// the corresponding wall-clock durations.
pub struct FakeClock {
    now: Mutex<SystemTime>,
}

impl FakeClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap()
    }
}
