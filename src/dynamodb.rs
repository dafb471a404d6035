use crate::codec::{decode_process, encode_key, epoch_millis, epoch_secs};
use crate::error::Error;
use crate::model::{Process, StoreKey};
use crate::store::Store;
use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use std::time::{Duration, SystemTime};

/// DynamoDB-backed [`Store`] implementation.
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl DynamoDbStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl<Id, ProcessorId> Store<Id, ProcessorId> for DynamoDbStore
where
    Id: StoreKey,
    ProcessorId: StoreKey,
{
    async fn claim(
        &self,
        id: Id,
        processor_id: ProcessorId,
        now: SystemTime,
    ) -> Result<Option<Process<Id, ProcessorId>>, Error> {
        let (id_av, processor_id_av) = encode_key(&id, &processor_id)?;
        let now_millis = epoch_millis(now)?;

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("id", id_av)
            .key("processorId", processor_id_av)
            .update_expression("SET startedAt = if_not_exists(startedAt, :value)")
            .expression_attribute_values(":value", AttributeValue::N(now_millis.to_string()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await?;

        match result.attributes {
            Some(attributes) if !attributes.is_empty() => Ok(Some(decode_process(attributes)?)),
            _ => Ok(None),
        }
    }

    async fn commit(
        &self,
        id: Id,
        processor_id: ProcessorId,
        now: SystemTime,
        ttl: Duration,
    ) -> Result<(), Error> {
        let (id_av, processor_id_av) = encode_key(&id, &processor_id)?;
        let now_millis = epoch_millis(now)?;
        let expires_on_secs = epoch_secs(now + ttl)?;

        self.client
            .update_item()
            .table_name(&self.table_name)
            .key("id", id_av)
            .key("processorId", processor_id_av)
            .update_expression("SET completedAt = :completedAt, expiresOn = :expiresOn")
            .expression_attribute_values(":completedAt", AttributeValue::N(now_millis.to_string()))
            .expression_attribute_values(":expiresOn", AttributeValue::N(expires_on_secs.to_string()))
            .send()
            .await?;

        Ok(())
    }

    async fn invalidate(&self, id: Id, processor_id: ProcessorId) -> Result<(), Error> {
        let (id_av, processor_id_av) = encode_key(&id, &processor_id)?;

        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", id_av)
            .key("processorId", processor_id_av)
            .send()
            .await?;

        Ok(())
    }
}
