//! In-memory store for tests and local development.

use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;

use super::{
    CancelCode, Item, ItemKey, Precondition, QueryFilter, QueryRequest, QueryResponse, SelectMode,
    StoreClient, StoreError, UpdateExpression, WriteOp,
};

type MapKey = (String, String);

/// In-memory [`StoreClient`] with DynamoDB-faithful semantics.
///
/// Conditional failures, per-op cancellation reasons, limit counting and
/// continuation cursors behave like the real table so the repositories can be
/// exercised without one. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Arc<Mutex<BTreeMap<MapKey, Item>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physical items currently stored, all copies counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<MapKey, Item>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn map_key(key: &ItemKey) -> MapKey {
    (key.pk.clone(), key.sk.clone())
}

fn check(precondition: Precondition, exists: bool) -> Result<(), StoreError> {
    match precondition {
        Precondition::None => Ok(()),
        Precondition::MustNotExist if !exists => Ok(()),
        Precondition::MustExist if exists => Ok(()),
        _ => Err(StoreError::ConditionFailed),
    }
}

fn matches_filter(filter: Option<&QueryFilter>, item: &Item) -> bool {
    match filter {
        None => true,
        Some(QueryFilter::Equals { attribute, value }) => item.get(attribute) == Some(value),
        Some(QueryFilter::NonEmpty { attribute }) => {
            matches!(item.get(attribute), Some(AttributeValue::S(s)) if !s.is_empty())
        }
    }
}

fn project(select: &SelectMode, key: &MapKey, item: &Item) -> Option<Item> {
    match select {
        SelectMode::AllAttributes => Some(item.clone()),
        SelectMode::CountOnly => None,
        SelectMode::KeysOnly => {
            let mut out = Item::new();
            ItemKey::new(key.0.clone(), key.1.clone()).attach(&mut out);
            Some(out)
        }
        SelectMode::Projection(attributes) => {
            let mut out = Item::new();
            for attribute in attributes {
                if let Some(value) = item.get(attribute) {
                    out.insert(attribute.clone(), value.clone());
                }
            }
            Some(out)
        }
    }
}

enum Planned {
    Write(MapKey, Item),
    Remove(MapKey),
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get_item(&self, key: &ItemKey) -> Result<Option<Item>, StoreError> {
        Ok(self.lock().get(&map_key(key)).cloned())
    }

    async fn put_item(
        &self,
        key: &ItemKey,
        item: Item,
        precondition: Precondition,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let map_key = map_key(key);
        check(precondition, guard.contains_key(&map_key))?;

        let mut stored = item;
        key.attach(&mut stored);
        guard.insert(map_key, stored);
        Ok(())
    }

    async fn update_item(
        &self,
        key: &ItemKey,
        expression: &UpdateExpression,
        precondition: Precondition,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let map_key = map_key(key);
        check(precondition, guard.contains_key(&map_key))?;

        // An unconditional update upserts, like UpdateItem does.
        let entry = guard.entry(map_key).or_insert_with(|| {
            let mut fresh = Item::new();
            key.attach(&mut fresh);
            fresh
        });
        expression.apply(entry)
    }

    async fn delete_item(
        &self,
        key: &ItemKey,
        precondition: Precondition,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let map_key = map_key(key);
        check(precondition, guard.contains_key(&map_key))?;
        guard.remove(&map_key);
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryResponse, StoreError> {
        if let Some(limit) = request.limit
            && limit < 1
        {
            return Err(StoreError::Other(format!("query limit must be >= 1, got {limit}")));
        }

        let guard = self.lock();
        let partition = request.partition.clone();
        let lower = match &request.start_key {
            Some(start) if start.pk != partition => {
                return Err(StoreError::Other(
                    "start key belongs to a different partition".to_string(),
                ));
            }
            Some(start) => Bound::Excluded((partition.clone(), start.sk.clone())),
            None => Bound::Included((partition.clone(), String::new())),
        };

        let limit = request.limit.map(i64::from);
        let mut items = Vec::new();
        let mut count: i64 = 0;
        let mut scanned: i64 = 0;
        let mut last_scanned: Option<ItemKey> = None;

        for (key, item) in guard.range((lower, Bound::Unbounded)) {
            if key.0 != partition {
                break;
            }
            if let Some(prefix) = &request.sort_prefix
                && !key.1.starts_with(prefix.as_str())
            {
                continue;
            }
            if limit.is_some_and(|l| scanned >= l) {
                break;
            }
            scanned += 1;
            last_scanned = Some(ItemKey::new(key.0.clone(), key.1.clone()));

            if !matches_filter(request.filter.as_ref(), item) {
                continue;
            }
            count += 1;
            if let Some(projected) = project(&request.select, key, item) {
                items.push(projected);
            }
        }

        // The cursor is set whenever the limit was reached, even if nothing
        // follows it. Callers learn the partition is exhausted one page later.
        let last_key = match limit {
            Some(l) if scanned == l => last_scanned,
            _ => None,
        };

        Ok(QueryResponse {
            items,
            count,
            last_key,
        })
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut guard = self.lock();

        let mut seen = HashSet::new();
        for op in &ops {
            if !seen.insert(map_key(op.key())) {
                return Err(StoreError::Other(format!(
                    "transaction touches ({}, {}) more than once",
                    op.key().pk,
                    op.key().sk
                )));
            }
        }

        let mut reasons = Vec::with_capacity(ops.len());
        let mut planned = Vec::with_capacity(ops.len());
        let mut canceled = false;

        for op in &ops {
            let map_key = map_key(op.key());
            if check(op.precondition(), guard.contains_key(&map_key)).is_err() {
                canceled = true;
                reasons.push(CancelCode::ConditionFailed);
                continue;
            }
            reasons.push(CancelCode::None);

            match op {
                WriteOp::Put { key, item, .. } => {
                    let mut stored = item.clone();
                    key.attach(&mut stored);
                    planned.push(Planned::Write(map_key, stored));
                }
                WriteOp::Update {
                    key, expression, ..
                } => {
                    let mut stored = guard.get(&map_key).cloned().unwrap_or_else(|| {
                        let mut fresh = Item::new();
                        key.attach(&mut fresh);
                        fresh
                    });
                    expression.apply(&mut stored)?;
                    planned.push(Planned::Write(map_key, stored));
                }
                WriteOp::Delete { .. } => planned.push(Planned::Remove(map_key)),
            }
        }

        if canceled {
            return Err(StoreError::TransactionCanceled { reasons });
        }

        for change in planned {
            match change {
                Planned::Write(key, item) => {
                    guard.insert(key, item);
                }
                Planned::Remove(key) => {
                    guard.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::build_update_expression;
    use super::*;

    fn item_with(attribute: &str, value: &str) -> Item {
        let mut item = Item::new();
        item.insert(
            attribute.to_string(),
            AttributeValue::S(value.to_string()),
        );
        item
    }

    fn seed(store: &MemoryStore, pk: &str, sks: &[&str]) {
        let mut guard = store.lock();
        for sk in sks {
            let key = ItemKey::new(pk, *sk);
            let mut item = Item::new();
            key.attach(&mut item);
            guard.insert((pk.to_string(), (*sk).to_string()), item);
        }
    }

    #[tokio::test]
    async fn conditional_put_fails_when_item_exists() {
        let store = MemoryStore::new();
        let key = ItemKey::new("USER#u-1", "DETAILS");

        store
            .put_item(&key, item_with("Name", "a"), Precondition::MustNotExist)
            .await
            .unwrap();
        let err = store
            .put_item(&key, item_with("Name", "b"), Precondition::MustNotExist)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::ConditionFailed));
    }

    #[tokio::test]
    async fn must_exist_update_fails_on_missing_item() {
        let store = MemoryStore::new();
        let expression = build_update_expression(&item_with("Name", "x"));

        let err = store
            .update_item(
                &ItemKey::new("USER#missing", "DETAILS"),
                &expression,
                Precondition::MustExist,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::ConditionFailed));
    }

    #[tokio::test]
    async fn query_honors_sort_prefix_and_limit() {
        let store = MemoryStore::new();
        seed(
            &store,
            "USER",
            &["DETAILS#1#a", "DETAILS#2#b", "DETAILS#3#c", "EMAIL#x"],
        );

        let page = store
            .query(
                QueryRequest::new("USER")
                    .with_sort_prefix("DETAILS#")
                    .with_limit(2),
            )
            .await
            .unwrap();

        assert_eq!(page.count, 2);
        assert_eq!(page.items.len(), 2);
        let cursor = page.last_key.unwrap();
        assert_eq!(cursor.sk, "DETAILS#2#b");

        let rest = store
            .query(
                QueryRequest::new("USER")
                    .with_sort_prefix("DETAILS#")
                    .with_limit(2)
                    .with_start_key(cursor),
            )
            .await
            .unwrap();
        assert_eq!(rest.count, 1);
        assert!(rest.last_key.is_none());
    }

    #[tokio::test]
    async fn cursor_is_set_when_limit_lands_on_the_last_item() {
        let store = MemoryStore::new();
        seed(&store, "EXPENSE", &["DETAILS#1#a", "DETAILS#2#b"]);

        let page = store
            .query(QueryRequest::new("EXPENSE").with_limit(2))
            .await
            .unwrap();
        assert_eq!(page.count, 2);
        let cursor = page.last_key.expect("limit reached, cursor expected");

        let rest = store
            .query(
                QueryRequest::new("EXPENSE")
                    .with_limit(2)
                    .with_start_key(cursor),
            )
            .await
            .unwrap();
        assert_eq!(rest.count, 0);
        assert!(rest.last_key.is_none());
    }

    #[tokio::test]
    async fn limit_counts_scanned_items_not_filter_matches() {
        let store = MemoryStore::new();
        {
            let mut guard = store.lock();
            for (sk, status) in [
                ("DETAILS#1#a", "PENDING"),
                ("DETAILS#2#b", "APPROVED"),
                ("DETAILS#3#c", "PENDING"),
            ] {
                let key = ItemKey::new("EXPENSE", sk);
                let mut item = item_with("Status", status);
                key.attach(&mut item);
                guard.insert(("EXPENSE".to_string(), sk.to_string()), item);
            }
        }

        let page = store
            .query(
                QueryRequest::new("EXPENSE")
                    .with_filter(QueryFilter::Equals {
                        attribute: "Status".to_string(),
                        value: AttributeValue::S("PENDING".to_string()),
                    })
                    .with_limit(2),
            )
            .await
            .unwrap();

        // Two items scanned, only the first matches the filter.
        assert_eq!(page.count, 1);
        assert_eq!(page.items.len(), 1);
        assert!(page.last_key.is_some());
    }

    #[tokio::test]
    async fn canceled_transaction_reports_per_op_reasons_and_writes_nothing() {
        let store = MemoryStore::new();
        let taken = ItemKey::new("USER", "EMAIL#a@example.com");
        store
            .put_item(&taken, item_with("UserID", "u-1"), Precondition::None)
            .await
            .unwrap();

        let ops = vec![
            WriteOp::Put {
                key: ItemKey::new("USER#u-2", "DETAILS"),
                item: item_with("UserID", "u-2"),
                precondition: Precondition::MustNotExist,
            },
            WriteOp::Put {
                key: taken.clone(),
                item: item_with("UserID", "u-2"),
                precondition: Precondition::MustNotExist,
            },
        ];
        let err = store.transact_write(ops).await.unwrap_err();

        match err {
            StoreError::TransactionCanceled { reasons } => {
                assert_eq!(reasons, vec![CancelCode::None, CancelCode::ConditionFailed]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Nothing was applied, including the op whose precondition held.
        assert!(
            store
                .get_item(&ItemKey::new("USER#u-2", "DETAILS"))
                .await
                .unwrap()
                .is_none()
        );
        let kept = store.get_item(&taken).await.unwrap().unwrap();
        assert_eq!(kept["UserID"], AttributeValue::S("u-1".to_string()));
    }

    #[tokio::test]
    async fn transaction_rejects_duplicate_keys() {
        let store = MemoryStore::new();
        let key = ItemKey::new("USER#u-1", "DETAILS");
        let ops = vec![
            WriteOp::Put {
                key: key.clone(),
                item: Item::new(),
                precondition: Precondition::None,
            },
            WriteOp::Delete {
                key,
                precondition: Precondition::None,
            },
        ];

        assert!(matches!(
            store.transact_write(ops).await,
            Err(StoreError::Other(_))
        ));
    }
}
