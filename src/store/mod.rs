//! Backend abstraction over the single table.
//!
//! Everything above this module speaks in raw attribute maps, full primary keys
//! and existence preconditions; everything below maps those onto DynamoDB or an
//! in-memory table with the same observable semantics.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use thiserror::Error;

pub mod dynamo;
pub mod expression;
pub mod memory;

pub use dynamo::DynamoStore;
pub use expression::{UpdateExpression, build_update_expression};
pub use memory::MemoryStore;

/// Raw attribute map of one stored item.
pub type Item = HashMap<String, AttributeValue>;

/// Full primary key of one physical item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey {
    pub pk: String,
    pub sk: String,
}

impl ItemKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }

    /// Copies the key into the item's `PK`/`SK` attributes.
    pub(crate) fn attach(&self, item: &mut Item) {
        item.insert("PK".to_string(), AttributeValue::S(self.pk.clone()));
        item.insert("SK".to_string(), AttributeValue::S(self.sk.clone()));
    }
}

/// Existence requirement checked against the item at the same full key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precondition {
    #[default]
    None,
    MustNotExist,
    MustExist,
}

/// One write inside a transaction.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Put {
        key: ItemKey,
        item: Item,
        precondition: Precondition,
    },
    Update {
        key: ItemKey,
        expression: UpdateExpression,
        precondition: Precondition,
    },
    Delete {
        key: ItemKey,
        precondition: Precondition,
    },
}

impl WriteOp {
    #[must_use]
    pub fn key(&self) -> &ItemKey {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Update { key, .. } | WriteOp::Delete { key, .. } => {
                key
            }
        }
    }

    #[must_use]
    pub fn precondition(&self) -> Precondition {
        match self {
            WriteOp::Put { precondition, .. }
            | WriteOp::Update { precondition, .. }
            | WriteOp::Delete { precondition, .. } => *precondition,
        }
    }
}

/// Attribute filter applied after the key condition, before projection.
#[derive(Debug, Clone)]
pub enum QueryFilter {
    /// Attribute equals the value.
    Equals {
        attribute: String,
        value: AttributeValue,
    },
    /// Attribute holds a non-empty string.
    NonEmpty { attribute: String },
}

/// Which attributes a query returns.
#[derive(Debug, Clone, Default)]
pub enum SelectMode {
    #[default]
    AllAttributes,
    CountOnly,
    KeysOnly,
    Projection(Vec<String>),
}

/// One single-partition range query.
///
/// `limit` counts items matching the key condition, before the filter runs, the
/// way DynamoDB's `Limit` does.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub partition: String,
    pub sort_prefix: Option<String>,
    pub filter: Option<QueryFilter>,
    pub select: SelectMode,
    pub limit: Option<i32>,
    pub start_key: Option<ItemKey>,
}

impl QueryRequest {
    pub fn new(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort_prefix: None,
            filter: None,
            select: SelectMode::AllAttributes,
            limit: None,
            start_key: None,
        }
    }

    #[must_use]
    pub fn with_sort_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sort_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_select(mut self, select: SelectMode) -> Self {
        self.select = select;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_start_key(mut self, key: ItemKey) -> Self {
        self.start_key = Some(key);
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct QueryResponse {
    /// Matching items, projected per the select mode; empty for a count query.
    pub items: Vec<Item>,
    /// Matching items on this page, counted after the filter.
    pub count: i64,
    /// Continuation cursor, present whenever the limit cut the page short. Set
    /// even when no further matching items exist; only its absence proves the
    /// partition is exhausted.
    pub last_key: Option<ItemKey>,
}

/// Per-item outcome of a canceled transaction, index-aligned with the ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCode {
    /// This op did not cause the cancellation.
    None,
    ConditionFailed,
    Throttled,
    Other,
}

impl CancelCode {
    #[must_use]
    pub fn from_wire(code: Option<&str>) -> Self {
        match code {
            Some("ConditionalCheckFailed") => CancelCode::ConditionFailed,
            Some("ThrottlingError" | "ProvisionedThroughputExceeded") => CancelCode::Throttled,
            Some("None") | None => CancelCode::None,
            Some(_) => CancelCode::Other,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A single-item write's precondition did not hold.
    #[error("conditional check failed")]
    ConditionFailed,

    /// A transaction was rolled back; one reason per op, in op order.
    #[error("transaction canceled: {reasons:?}")]
    TransactionCanceled { reasons: Vec<CancelCode> },

    #[error("throttled: {0}")]
    Throttled(String),

    #[error("{0}")]
    Other(String),
}

/// Backend surface the repositories run on.
///
/// Implemented by [`DynamoStore`] for production and [`MemoryStore`] for tests and
/// local development.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Point read of one item.
    async fn get_item(&self, key: &ItemKey) -> Result<Option<Item>, StoreError>;

    /// Writes the item, replacing whatever is at the key.
    async fn put_item(
        &self,
        key: &ItemKey,
        item: Item,
        precondition: Precondition,
    ) -> Result<(), StoreError>;

    /// Applies a `SET` update to the item at the key.
    async fn update_item(
        &self,
        key: &ItemKey,
        expression: &UpdateExpression,
        precondition: Precondition,
    ) -> Result<(), StoreError>;

    /// Removes the item at the key.
    async fn delete_item(&self, key: &ItemKey, precondition: Precondition)
    -> Result<(), StoreError>;

    /// Range query within one partition.
    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, StoreError>;

    /// Applies every op or none of them.
    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;
}
