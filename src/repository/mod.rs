//! One repository per entity, plus the machinery they share.
//!
//! Repositories are generic over [`StoreClient`] so the same code runs against
//! DynamoDB in production and the in-memory store in tests. Each one owns the
//! fan-out to its entity's physical copies; callers only ever see domain types.

pub mod advance;
pub mod department;
pub mod expense;
pub mod image;
pub mod keys;
pub mod page;
pub mod project;
pub mod txn;
pub mod user;

pub use advance::AdvanceRepository;
pub use department::DepartmentRepository;
pub use expense::ExpenseRepository;
pub use image::ImageMetadataRepository;
pub use project::ProjectRepository;
pub use user::UserRepository;

use aws_sdk_dynamodb::types::AttributeValue;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::models::RequestFilter;
use crate::errors::{EntityKind, RepoError};
use crate::store::{Item, QueryFilter, QueryRequest, SelectMode, StoreClient};

use keys::KeyScheme;

const STATUS_ATTRIBUTE: &str = "Status";
const AMOUNT_ATTRIBUTE: &str = "Amount";

/// Milliseconds since the epoch, the timestamp unit everywhere in the table.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub(crate) fn parse_item<T: DeserializeOwned>(item: Item, kind: EntityKind) -> Result<T, RepoError> {
    serde_dynamo::from_item(item)
        .map_err(|e| RepoError::Internal(format!("failed to parse stored {kind}: {e}")))
}

pub(crate) fn to_item<T: Serialize>(entity: &T, kind: EntityKind) -> Result<Item, RepoError> {
    serde_dynamo::to_item(entity)
        .map_err(|e| RepoError::Internal(format!("failed to serialize {kind}: {e}")))
}

/// Query for an expense or advance listing: the owner's partition when the
/// filter names a user, the global listing otherwise, with an optional status
/// filter on top.
pub(crate) fn scoped_listing(scheme: KeyScheme, filter: &RequestFilter) -> QueryRequest {
    let request = if filter.user_id.is_empty() {
        QueryRequest::new(scheme.listing_partition()).with_sort_prefix(scheme.listing_sort_prefix())
    } else {
        QueryRequest::new(KeyScheme::USER.owner_partition(&filter.user_id))
            .with_sort_prefix(scheme.owned_sort_prefix())
    };
    match filter.status {
        Some(status) => request.with_filter(QueryFilter::Equals {
            attribute: STATUS_ATTRIBUTE.to_string(),
            value: AttributeValue::S(status.as_str().to_string()),
        }),
        None => request,
    }
}

/// Sums the `Amount` attribute over every item the query matches, reading only
/// that attribute. No matches sum to zero.
pub(crate) async fn sum_amounts<S: StoreClient>(
    store: &S,
    request: QueryRequest,
) -> Result<Decimal, RepoError> {
    let request = request.with_select(SelectMode::Projection(vec![AMOUNT_ATTRIBUTE.to_string()]));
    let items = page::collect_all(store, request).await?;

    let mut total = Decimal::ZERO;
    for item in items {
        let Some(value) = item.get(AMOUNT_ATTRIBUTE) else {
            continue;
        };
        let AttributeValue::N(raw) = value else {
            return Err(RepoError::Internal(format!(
                "stored amount is not a number attribute: {value:?}"
            )));
        };
        let amount: Decimal = raw
            .parse()
            .map_err(|e| RepoError::Internal(format!("stored amount {raw:?} did not parse: {e}")))?;
        total += amount;
    }
    Ok(total)
}
