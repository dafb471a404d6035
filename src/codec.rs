//! Mapping between the in-memory [`Process`] entity and DynamoDB's
//! attribute representation. Optional fields encode as "attribute
//! absent", never as an explicit null.

use crate::error::Error;
use crate::model::{Expiration, Process, StoreKey};
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub fn epoch_millis(instant: SystemTime) -> Result<i64, Error> {
    instant
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .map_err(|e| Error::Internal(e.to_string()))
}

pub fn epoch_secs(instant: SystemTime) -> Result<i64, Error> {
    instant
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .map_err(|e| Error::Internal(e.to_string()))
}

pub fn encode_key<Id: StoreKey, ProcessorId: StoreKey>(
    id: &Id,
    processor_id: &ProcessorId,
) -> Result<(AttributeValue, AttributeValue), Error> {
    let id_s = serde_json::to_string(id)?;
    let processor_id_s = serde_json::to_string(processor_id)?;
    Ok((AttributeValue::S(id_s), AttributeValue::S(processor_id_s)))
}

/// Encode a full [`Process`] into a DynamoDB item. [`crate::dynamodb::DynamoDbStore`]
/// never calls this directly — it only issues partial `UpdateItem`
/// expressions — but it is the encoding half of the codec's round trip,
/// exercised by this module's own tests.
pub fn encode_process<Id, ProcessorId>(
    process: &Process<Id, ProcessorId>,
) -> Result<HashMap<String, AttributeValue>, Error>
where
    Id: StoreKey,
    ProcessorId: StoreKey,
{
    let mut attributes = HashMap::new();
    attributes.insert(
        "id".to_string(),
        AttributeValue::S(serde_json::to_string(&process.id)?),
    );
    attributes.insert(
        "processorId".to_string(),
        AttributeValue::S(serde_json::to_string(&process.processor_id)?),
    );
    attributes.insert(
        "startedAt".to_string(),
        AttributeValue::N(epoch_millis(process.started_at)?.to_string()),
    );
    if let Some(completed_at) = process.completed_at {
        attributes.insert(
            "completedAt".to_string(),
            AttributeValue::N(epoch_millis(completed_at)?.to_string()),
        );
    }
    if let Some(expires_on) = process.expires_on {
        attributes.insert(
            "expiresOn".to_string(),
            AttributeValue::N(epoch_secs(expires_on.instant)?.to_string()),
        );
    }
    Ok(attributes)
}

pub fn decode_process<Id, ProcessorId>(
    mut attributes: HashMap<String, AttributeValue>,
) -> Result<Process<Id, ProcessorId>, Error>
where
    Id: StoreKey,
    ProcessorId: StoreKey,
{
    let id = required_string(&mut attributes, "id")?;
    let id: Id = serde_json::from_str(&id)?;

    let processor_id = required_string(&mut attributes, "processorId")?;
    let processor_id: ProcessorId = serde_json::from_str(&processor_id)?;

    let started_at = required_epoch_millis(&mut attributes, "startedAt")?;
    let completed_at = optional_epoch_millis(&mut attributes, "completedAt")?;
    let expires_on = optional_epoch_secs(&mut attributes, "expiresOn")?.map(Expiration::new);

    Ok(Process {
        id,
        processor_id,
        started_at,
        completed_at,
        expires_on,
    })
}

fn required_string(attributes: &mut HashMap<String, AttributeValue>, key: &str) -> Result<String, Error> {
    attributes
        .remove(key)
        .and_then(|v| v.as_s().ok().cloned())
        .ok_or_else(|| Error::Decoding(format!("missing '{key}' field")))
}

fn required_epoch_millis(
    attributes: &mut HashMap<String, AttributeValue>,
    key: &str,
) -> Result<SystemTime, Error> {
    let value = attributes
        .remove(key)
        .ok_or_else(|| Error::Decoding(format!("missing '{key}' field")))?;
    let millis = value
        .as_n()
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| Error::Decoding(format!("invalid '{key}' field")))?;
    Ok(UNIX_EPOCH + Duration::from_millis(millis as u64))
}

/// Absent means unset. An explicit stored `NULL` is rejected rather than
/// silently treated as absent.
fn optional_epoch_millis(
    attributes: &mut HashMap<String, AttributeValue>,
    key: &str,
) -> Result<Option<SystemTime>, Error> {
    match attributes.remove(key) {
        None => Ok(None),
        Some(AttributeValue::Null(_)) => Err(Error::Decoding(format!(
            "'{key}' stored as explicit null; only attribute-absent encodes 'unset'"
        ))),
        Some(value) => {
            let millis = value
                .as_n()
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| Error::Decoding(format!("invalid '{key}' field")))?;
            Ok(Some(UNIX_EPOCH + Duration::from_millis(millis as u64)))
        }
    }
}

fn optional_epoch_secs(
    attributes: &mut HashMap<String, AttributeValue>,
    key: &str,
) -> Result<Option<SystemTime>, Error> {
    match attributes.remove(key) {
        None => Ok(None),
        Some(AttributeValue::Null(_)) => Err(Error::Decoding(format!(
            "'{key}' stored as explicit null; only attribute-absent encodes 'unset'"
        ))),
        Some(value) => {
            let secs = value
                .as_n()
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| Error::Decoding(format!("invalid '{key}' field")))?;
            Ok(Some(UNIX_EPOCH + Duration::from_secs(secs as u64)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample_process() -> Process<String, String> {
        let started_at = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        Process {
            id: "signal-1".to_string(),
            processor_id: "processor-a".to_string(),
            started_at,
            completed_at: None,
            expires_on: None,
        }
    }

    #[test]
    fn round_trips_a_process_with_no_completion() {
        let process = sample_process();
        let attributes = encode_process(&process).unwrap();
        let decoded: Process<String, String> = decode_process(attributes).unwrap();

        assert_eq!(decoded.id, process.id);
        assert_eq!(decoded.processor_id, process.processor_id);
        assert_eq!(decoded.started_at, process.started_at);
        assert_eq!(decoded.completed_at, None);
        assert_eq!(decoded.expires_on, None);
    }

    #[test]
    fn round_trips_a_completed_process() {
        let mut process = sample_process();
        let completed_at = process.started_at + Duration::from_secs(5);
        process.completed_at = Some(completed_at);
        process.expires_on = Some(Expiration::from_ttl(completed_at, Duration::from_secs(3600)));

        let attributes = encode_process(&process).unwrap();
        let decoded: Process<String, String> = decode_process(attributes).unwrap();

        assert_eq!(decoded.completed_at, Some(completed_at));
        // expires_on round trips to second resolution only.
        let expected_secs = epoch_secs(process.expires_on.unwrap().instant).unwrap();
        let decoded_secs = epoch_secs(decoded.expires_on.unwrap().instant).unwrap();
        assert_eq!(decoded_secs, expected_secs);
    }

    #[test]
    fn missing_required_field_is_a_decoding_error() {
        let mut attributes = encode_process(&sample_process()).unwrap();
        attributes.remove("startedAt");

        let result: Result<Process<String, String>, Error> = decode_process(attributes);
        assert!(matches!(result, Err(Error::Decoding(_))));
    }

    #[test]
    fn explicit_null_on_an_optional_field_is_rejected_not_treated_as_absent() {
        let mut attributes = encode_process(&sample_process()).unwrap();
        attributes.insert("completedAt".to_string(), AttributeValue::Null(true));

        let result: Result<Process<String, String>, Error> = decode_process(attributes);
        assert!(matches!(result, Err(Error::Decoding(_))));
    }
}
