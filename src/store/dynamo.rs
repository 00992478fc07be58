//! DynamoDB-backed store.

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::ProvideErrorMetadata;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, Select, TransactWriteItem, Update};
use tracing::info;

use crate::core::config::StoreConfig;

use super::{
    CancelCode, Item, ItemKey, Precondition, QueryFilter, QueryRequest, QueryResponse, SelectMode,
    StoreClient, StoreError, UpdateExpression, WriteOp,
};

const THROTTLE_CODES: [&str; 3] = [
    "ProvisionedThroughputExceededException",
    "ThrottlingException",
    "RequestLimitExceeded",
];

/// Production [`StoreClient`] over one DynamoDB table with string `PK`/`SK` keys.
///
/// No retry policy of its own; throttling surfaces as
/// [`StoreError::Throttled`] and the caller decides.
#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    /// Builds the long-lived client from the ambient AWS environment. Call once
    /// at startup and hand clones to the repositories.
    pub async fn connect(config: &StoreConfig) -> Self {
        let shared_config = aws_config::from_env().load().await;
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&shared_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        let client = Client::from_conf(builder.build());
        info!(table = %config.table, "connected to DynamoDB");

        Self {
            client,
            table: config.table.clone(),
        }
    }
}

fn classify(code: Option<&str>, message: String) -> StoreError {
    if code == Some("ConditionalCheckFailedException") {
        StoreError::ConditionFailed
    } else if code.is_some_and(|c| THROTTLE_CODES.contains(&c)) {
        StoreError::Throttled(message)
    } else {
        StoreError::Other(message)
    }
}

fn key_attributes(key: &ItemKey) -> Item {
    let mut map = Item::new();
    key.attach(&mut map);
    map
}

fn condition_expression(precondition: Precondition) -> Option<String> {
    match precondition {
        Precondition::None => None,
        Precondition::MustNotExist => Some("attribute_not_exists(PK)".to_string()),
        Precondition::MustExist => Some("attribute_exists(PK)".to_string()),
    }
}

fn key_from_attributes(item: &Item) -> Result<ItemKey, StoreError> {
    let pk = item.get("PK").and_then(|v| v.as_s().ok());
    let sk = item.get("SK").and_then(|v| v.as_s().ok());
    match (pk, sk) {
        (Some(pk), Some(sk)) => Ok(ItemKey::new(pk.clone(), sk.clone())),
        _ => Err(StoreError::Other(
            "continuation key is missing PK/SK".to_string(),
        )),
    }
}

fn transact_item(table: &str, op: WriteOp) -> Result<TransactWriteItem, StoreError> {
    let built = match op {
        WriteOp::Put {
            key,
            mut item,
            precondition,
        } => {
            key.attach(&mut item);
            let put = Put::builder()
                .table_name(table)
                .set_item(Some(item))
                .set_condition_expression(condition_expression(precondition))
                .build()
                .map_err(|e| StoreError::Other(format!("building transactional put: {e}")))?;
            TransactWriteItem::builder().put(put).build()
        }
        WriteOp::Update {
            key,
            expression,
            precondition,
        } => {
            let update = Update::builder()
                .table_name(table)
                .set_key(Some(key_attributes(&key)))
                .update_expression(expression.expression)
                .set_expression_attribute_names(Some(expression.names))
                .set_expression_attribute_values(Some(expression.values))
                .set_condition_expression(condition_expression(precondition))
                .build()
                .map_err(|e| StoreError::Other(format!("building transactional update: {e}")))?;
            TransactWriteItem::builder().update(update).build()
        }
        WriteOp::Delete { key, precondition } => {
            let delete = Delete::builder()
                .table_name(table)
                .set_key(Some(key_attributes(&key)))
                .set_condition_expression(condition_expression(precondition))
                .build()
                .map_err(|e| StoreError::Other(format!("building transactional delete: {e}")))?;
            TransactWriteItem::builder().delete(delete).build()
        }
    };
    Ok(built)
}

#[async_trait]
impl StoreClient for DynamoStore {
    async fn get_item(&self, key: &ItemKey) -> Result<Option<Item>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .set_key(Some(key_attributes(key)))
            .send()
            .await
            .map_err(|e| classify(e.code(), format!("dynamodb get_item: {e}")))?;
        Ok(output.item)
    }

    async fn put_item(
        &self,
        key: &ItemKey,
        item: Item,
        precondition: Precondition,
    ) -> Result<(), StoreError> {
        let mut stored = item;
        key.attach(&mut stored);
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(stored))
            .set_condition_expression(condition_expression(precondition))
            .send()
            .await
            .map_err(|e| classify(e.code(), format!("dynamodb put_item: {e}")))?;
        Ok(())
    }

    async fn update_item(
        &self,
        key: &ItemKey,
        expression: &UpdateExpression,
        precondition: Precondition,
    ) -> Result<(), StoreError> {
        self.client
            .update_item()
            .table_name(&self.table)
            .set_key(Some(key_attributes(key)))
            .update_expression(expression.expression.clone())
            .set_expression_attribute_names(Some(expression.names.clone()))
            .set_expression_attribute_values(Some(expression.values.clone()))
            .set_condition_expression(condition_expression(precondition))
            .send()
            .await
            .map_err(|e| classify(e.code(), format!("dynamodb update_item: {e}")))?;
        Ok(())
    }

    async fn delete_item(
        &self,
        key: &ItemKey,
        precondition: Precondition,
    ) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .set_key(Some(key_attributes(key)))
            .set_condition_expression(condition_expression(precondition))
            .send()
            .await
            .map_err(|e| classify(e.code(), format!("dynamodb delete_item: {e}")))?;
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, StoreError> {
        let mut key_condition = String::from("PK = :pk");
        let mut builder = self
            .client
            .query()
            .table_name(&self.table)
            .expression_attribute_values(":pk", AttributeValue::S(request.partition.clone()));

        if let Some(prefix) = &request.sort_prefix {
            key_condition.push_str(" AND begins_with(SK, :sk)");
            builder = builder.expression_attribute_values(":sk", AttributeValue::S(prefix.clone()));
        }
        builder = builder.key_condition_expression(key_condition);

        if let Some(filter) = &request.filter {
            builder = match filter {
                QueryFilter::Equals { attribute, value } => builder
                    .filter_expression("#f = :f")
                    .expression_attribute_names("#f", attribute.clone())
                    .expression_attribute_values(":f", value.clone()),
                QueryFilter::NonEmpty { attribute } => builder
                    .filter_expression("attribute_exists(#f) AND size(#f) > :zero")
                    .expression_attribute_names("#f", attribute.clone())
                    .expression_attribute_values(":zero", AttributeValue::N("0".to_string())),
            };
        }

        builder = match &request.select {
            SelectMode::AllAttributes => builder.select(Select::AllAttributes),
            SelectMode::CountOnly => builder.select(Select::Count),
            SelectMode::KeysOnly => builder.projection_expression("PK, SK"),
            SelectMode::Projection(attributes) => {
                let mut placeholders = Vec::with_capacity(attributes.len());
                for (index, attribute) in attributes.iter().enumerate() {
                    let placeholder = format!("#p{index}");
                    builder =
                        builder.expression_attribute_names(placeholder.clone(), attribute.clone());
                    placeholders.push(placeholder);
                }
                builder.projection_expression(placeholders.join(", "))
            }
        };

        if let Some(limit) = request.limit {
            builder = builder.limit(limit);
        }
        if let Some(start) = &request.start_key {
            builder = builder
                .exclusive_start_key("PK", AttributeValue::S(start.pk.clone()))
                .exclusive_start_key("SK", AttributeValue::S(start.sk.clone()));
        }

        let output = builder
            .send()
            .await
            .map_err(|e| classify(e.code(), format!("dynamodb query: {e}")))?;

        let last_key = output
            .last_evaluated_key
            .as_ref()
            .map(key_from_attributes)
            .transpose()?;
        Ok(QueryResponse {
            items: output.items.unwrap_or_default(),
            count: i64::from(output.count),
            last_key,
        })
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut transact_items = Vec::with_capacity(ops.len());
        for op in ops {
            transact_items.push(transact_item(&self.table, op)?);
        }

        let result = self
            .client
            .transact_write_items()
            .set_transact_items(Some(transact_items))
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let service = err.into_service_error();
                if let TransactWriteItemsError::TransactionCanceledException(canceled) = &service {
                    let reasons = canceled
                        .cancellation_reasons()
                        .iter()
                        .map(|reason| CancelCode::from_wire(reason.code()))
                        .collect();
                    return Err(StoreError::TransactionCanceled { reasons });
                }
                Err(classify(
                    service.code(),
                    format!("dynamodb transact_write_items: {service}"),
                ))
            }
        }
    }
}
