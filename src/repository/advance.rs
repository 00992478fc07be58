//! Advance storage.

use rust_decimal::Decimal;

use crate::core::models::{Advance, RequestFilter, RequestStatus};
use crate::errors::{EntityKind, RepoError};
use crate::store::{Precondition, QueryFilter, StoreClient, build_update_expression};

use super::keys::KeyScheme;
use super::txn::Transaction;
use super::{now_millis, page, parse_item, scoped_listing, sum_amounts, to_item};

const RECONCILED_EXPENSE_ATTRIBUTE: &str = "ReconciledExpenseID";

/// Advances keep three copies: the canonical record, the global listing entry,
/// and a copy scoped under the owning user.
#[derive(Debug, Clone)]
pub struct AdvanceRepository<S> {
    store: S,
}

impl<S: StoreClient> AdvanceRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates the advance. Assigns an id when `id` is empty and stamps both
    /// timestamps when `created_at` is zero.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when the id is already taken.
    pub async fn save(&self, advance: Advance) -> Result<Advance, RepoError> {
        let mut advance = advance;
        if advance.id.is_empty() {
            advance.id = uuid::Uuid::new_v4().to_string();
        }
        if advance.created_at == 0 {
            advance.created_at = now_millis();
            advance.updated_at = advance.created_at;
        }

        let item = to_item(&advance, EntityKind::Advance)?;
        let mut txn = Transaction::new();
        txn.put(
            KeyScheme::ADVANCE.canonical(&advance.id),
            item.clone(),
            Precondition::MustNotExist,
        );
        txn.put(
            KeyScheme::ADVANCE.listing(advance.created_at, &advance.id),
            item.clone(),
            Precondition::MustNotExist,
        );
        txn.put(
            KeyScheme::ADVANCE.owned(
                KeyScheme::USER,
                &advance.user_id,
                advance.created_at,
                &advance.id,
            ),
            item,
            Precondition::MustNotExist,
        );
        txn.commit(&self.store, EntityKind::Advance).await?;
        Ok(advance)
    }

    pub async fn get(&self, advance_id: &str) -> Result<Option<Advance>, RepoError> {
        let item = self
            .store
            .get_item(&KeyScheme::ADVANCE.canonical(advance_id))
            .await?;
        item.map(|item| parse_item(item, EntityKind::Advance))
            .transpose()
    }

    /// One offset page of advances, oldest first, plus the exact total of
    /// matching advances. Scopes to the owner when `filter.user_id` is set,
    /// otherwise serves the global listing.
    pub async fn get_all(&self, filter: &RequestFilter) -> Result<(Vec<Advance>, i64), RepoError> {
        let request = scoped_listing(KeyScheme::ADVANCE, filter);
        let (items, total) =
            page::offset_page(&self.store, request, filter.page, filter.limit).await?;
        let advances = items
            .into_iter()
            .map(|item| parse_item(item, EntityKind::Advance))
            .collect::<Result<_, _>>()?;
        Ok((advances, total))
    }

    /// Sum of advance amounts, optionally scoped to one user and one status.
    /// No matching advances sum to zero.
    pub async fn sum(
        &self,
        user_id: &str,
        status: Option<RequestStatus>,
    ) -> Result<Decimal, RepoError> {
        let filter = RequestFilter {
            user_id: user_id.to_string(),
            status,
            ..RequestFilter::default()
        };
        sum_amounts(&self.store, scoped_listing(KeyScheme::ADVANCE, &filter)).await
    }

    /// Sum of the advances already settled against an expense, scoped the same
    /// way as [`Self::sum`].
    pub async fn reconciled_sum(&self, user_id: &str) -> Result<Decimal, RepoError> {
        let filter = RequestFilter {
            user_id: user_id.to_string(),
            ..RequestFilter::default()
        };
        let request = scoped_listing(KeyScheme::ADVANCE, &filter).with_filter(QueryFilter::NonEmpty {
            attribute: RECONCILED_EXPENSE_ATTRIBUTE.to_string(),
        });
        sum_amounts(&self.store, request).await
    }

    /// Rewrites the mutable attributes on every copy. `id`, `user_id` and
    /// `created_at` never change.
    ///
    /// # Errors
    ///
    /// `NotFound` when the advance does not exist.
    pub async fn update(&self, advance: Advance) -> Result<Advance, RepoError> {
        let Some(existing) = self.get(&advance.id).await? else {
            return Err(RepoError::NotFound(EntityKind::Advance));
        };

        let mut advance = advance;
        advance.user_id = existing.user_id.clone();
        advance.created_at = existing.created_at;
        advance.updated_at = now_millis();

        let mut attributes = to_item(&advance, EntityKind::Advance)?;
        attributes.remove("AdvanceID");
        attributes.remove("UserID");
        attributes.remove("CreatedAt");
        let expression = build_update_expression(&attributes);

        let mut txn = Transaction::new();
        txn.update(
            KeyScheme::ADVANCE.canonical(&advance.id),
            expression.clone(),
            Precondition::MustExist,
        );
        txn.update(
            KeyScheme::ADVANCE.listing(existing.created_at, &advance.id),
            expression.clone(),
            Precondition::MustExist,
        );
        txn.update(
            KeyScheme::ADVANCE.owned(
                KeyScheme::USER,
                &existing.user_id,
                existing.created_at,
                &advance.id,
            ),
            expression,
            Precondition::MustExist,
        );
        txn.commit(&self.store, EntityKind::Advance).await?;
        Ok(advance)
    }
}
