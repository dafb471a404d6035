use crate::model::{Process, ProcessStatus};
use std::time::{Duration, SystemTime};

/// Classifies a process record's status as of `now`. Rules evaluated in
/// order:
///
/// 1. `completed_at` set -> `Completed`.
/// 2. Else `started_at + max_processing_time <= now` -> `Timeout`.
/// 3. Else -> `Started`.
///
/// `NotStarted` is not produced here — the coordinator returns it directly
/// when the store reports no prior record, since there is no classifier
/// input in that case.
///
/// Boundary choice: a record is timed out at the instant
/// `started_at + max_processing_time` itself, not only strictly after it.
/// Treating that instant as still `Started` would mean a caller who waits
/// exactly `max_processing_time` before retrying is denied reclaim by a
/// one-tick clock-resolution fluke; including the boundary in `Timeout`
/// makes "wait at least max_processing_time, then retry" a reliable
/// reclaim strategy instead of one that depends on how the two instants
/// happen to compare.
pub fn classify<Id, ProcessorId>(
    process: &Process<Id, ProcessorId>,
    now: SystemTime,
    max_processing_time: Duration,
) -> ProcessStatus {
    if process.completed_at.is_some() {
        return ProcessStatus::Completed;
    }

    let timed_out = now
        .duration_since(process.started_at)
        .is_ok_and(|elapsed| elapsed >= max_processing_time);

    if timed_out {
        return ProcessStatus::Timeout;
    }

    ProcessStatus::Started
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn process_at(started_at: SystemTime, completed_at: Option<SystemTime>) -> Process<String, String> {
        Process {
            id: "id".to_string(),
            processor_id: "processor".to_string(),
            started_at,
            completed_at,
            expires_on: None,
        }
    }

    #[test]
    fn completed_wins_even_past_max_processing_time() {
        let started_at = SystemTime::UNIX_EPOCH;
        let completed_at = started_at + Duration::from_secs(1);
        let now = started_at + Duration::from_secs(1_000_000);
        let process = process_at(started_at, Some(completed_at));

        assert_eq!(
            classify(&process, now, Duration::from_secs(10)),
            ProcessStatus::Completed
        );
    }

    #[test]
    fn started_before_the_timeout_budget_elapses() {
        let started_at = SystemTime::UNIX_EPOCH;
        let now = started_at + Duration::from_millis(50);
        let process = process_at(started_at, None);

        assert_eq!(
            classify(&process, now, Duration::from_millis(100)),
            ProcessStatus::Started
        );
    }

    #[test]
    fn timeout_exactly_at_the_boundary() {
        let started_at = SystemTime::UNIX_EPOCH;
        let max_processing_time = Duration::from_millis(100);
        let now = started_at + max_processing_time;
        let process = process_at(started_at, None);

        assert_eq!(
            classify(&process, now, max_processing_time),
            ProcessStatus::Timeout
        );
    }

    #[test]
    fn timeout_well_past_the_boundary() {
        let started_at = SystemTime::UNIX_EPOCH;
        let now = started_at + Duration::from_secs(3600);
        let process = process_at(started_at, None);

        assert_eq!(
            classify(&process, now, Duration::from_millis(100)),
            ProcessStatus::Timeout
        );
    }
}
