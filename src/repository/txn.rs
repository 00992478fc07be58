//! Multi-copy write transactions.

use tracing::warn;

use crate::errors::{EntityKind, RepoError};
use crate::store::{
    CancelCode, Item, ItemKey, Precondition, StoreClient, StoreError, UpdateExpression, WriteOp,
};

/// Ordered set of writes applied atomically.
///
/// Each op carries its own existence precondition, and on cancellation the
/// failing op's precondition decides the domain error: a failed must-not-exist
/// is a conflict, a failed must-exist is a missing record.
#[derive(Debug, Default)]
pub struct Transaction {
    ops: Vec<WriteOp>,
}

impl Transaction {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: ItemKey, item: Item, precondition: Precondition) {
        self.ops.push(WriteOp::Put {
            key,
            item,
            precondition,
        });
    }

    pub fn update(&mut self, key: ItemKey, expression: UpdateExpression, precondition: Precondition) {
        self.ops.push(WriteOp::Update {
            key,
            expression,
            precondition,
        });
    }

    pub fn delete(&mut self, key: ItemKey, precondition: Precondition) {
        self.ops.push(WriteOp::Delete { key, precondition });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Commits every op or none of them, attributing failures to `kind`.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` or `NotFound` when a precondition did not hold,
    /// `Throttled` when the backend shed load, `Internal` otherwise.
    pub async fn commit<S: StoreClient>(self, store: &S, kind: EntityKind) -> Result<(), RepoError> {
        let preconditions: Vec<Precondition> = self.ops.iter().map(WriteOp::precondition).collect();

        match store.transact_write(self.ops).await {
            Ok(()) => Ok(()),
            Err(StoreError::TransactionCanceled { reasons }) => {
                Err(classify_cancellation(&preconditions, &reasons, kind))
            }
            Err(other) => Err(RepoError::from(other)),
        }
    }
}

fn classify_cancellation(
    preconditions: &[Precondition],
    reasons: &[CancelCode],
    kind: EntityKind,
) -> RepoError {
    for (index, reason) in reasons.iter().enumerate() {
        match reason {
            CancelCode::ConditionFailed => {
                return match preconditions.get(index) {
                    Some(Precondition::MustNotExist) => RepoError::AlreadyExists(kind),
                    Some(Precondition::MustExist) => RepoError::NotFound(kind),
                    _ => RepoError::Internal(format!(
                        "unconditional write reported a failed condition at index {index}"
                    )),
                };
            }
            CancelCode::Throttled => {
                return RepoError::Throttled(format!("transaction canceled at index {index}"));
            }
            CancelCode::None | CancelCode::Other => {}
        }
    }
    warn!(?reasons, "transaction canceled without a conditional failure");
    RepoError::Internal(format!("transaction canceled: {reasons:?}"))
}
