//! Expense storage.

use rust_decimal::Decimal;

use crate::core::models::{Expense, RequestFilter, RequestStatus};
use crate::errors::{EntityKind, RepoError};
use crate::store::{Precondition, StoreClient, build_update_expression};

use super::keys::KeyScheme;
use super::txn::Transaction;
use super::{now_millis, page, parse_item, scoped_listing, sum_amounts, to_item};

/// Expenses keep three copies: the canonical record, the global listing entry,
/// and a copy scoped under the owning user.
#[derive(Debug, Clone)]
pub struct ExpenseRepository<S> {
    store: S,
}

impl<S: StoreClient> ExpenseRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates the expense. Assigns an id when `id` is empty and stamps both
    /// timestamps when `created_at` is zero.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when the id is already taken.
    pub async fn save(&self, expense: Expense) -> Result<Expense, RepoError> {
        let mut expense = expense;
        if expense.id.is_empty() {
            expense.id = uuid::Uuid::new_v4().to_string();
        }
        if expense.created_at == 0 {
            expense.created_at = now_millis();
            expense.updated_at = expense.created_at;
        }

        let item = to_item(&expense, EntityKind::Expense)?;
        let mut txn = Transaction::new();
        txn.put(
            KeyScheme::EXPENSE.canonical(&expense.id),
            item.clone(),
            Precondition::MustNotExist,
        );
        txn.put(
            KeyScheme::EXPENSE.listing(expense.created_at, &expense.id),
            item.clone(),
            Precondition::MustNotExist,
        );
        txn.put(
            KeyScheme::EXPENSE.owned(
                KeyScheme::USER,
                &expense.user_id,
                expense.created_at,
                &expense.id,
            ),
            item,
            Precondition::MustNotExist,
        );
        txn.commit(&self.store, EntityKind::Expense).await?;
        Ok(expense)
    }

    pub async fn get(&self, expense_id: &str) -> Result<Option<Expense>, RepoError> {
        let item = self
            .store
            .get_item(&KeyScheme::EXPENSE.canonical(expense_id))
            .await?;
        item.map(|item| parse_item(item, EntityKind::Expense))
            .transpose()
    }

    /// One offset page of expenses, oldest first, plus the exact total of
    /// matching expenses. Scopes to the owner when `filter.user_id` is set,
    /// otherwise serves the global listing.
    pub async fn get_all(&self, filter: &RequestFilter) -> Result<(Vec<Expense>, i64), RepoError> {
        let request = scoped_listing(KeyScheme::EXPENSE, filter);
        let (items, total) =
            page::offset_page(&self.store, request, filter.page, filter.limit).await?;
        let expenses = items
            .into_iter()
            .map(|item| parse_item(item, EntityKind::Expense))
            .collect::<Result<_, _>>()?;
        Ok((expenses, total))
    }

    /// Sum of expense amounts, optionally scoped to one user and one status.
    /// No matching expenses sum to zero.
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
        sum_amounts(&self.store, scoped_listing(KeyScheme::EXPENSE, &filter)).await
    }

    /// Rewrites the mutable attributes on every copy. `id`, `user_id` and
    /// `created_at` never change.
    ///
    /// # Errors
    ///
    /// `NotFound` when the expense does not exist.
    pub async fn update(&self, expense: Expense) -> Result<Expense, RepoError> {
        let Some(existing) = self.get(&expense.id).await? else {
            return Err(RepoError::NotFound(EntityKind::Expense));
        };

        let mut expense = expense;
        expense.user_id = existing.user_id.clone();
        expense.created_at = existing.created_at;
        expense.updated_at = now_millis();

        let mut attributes = to_item(&expense, EntityKind::Expense)?;
        attributes.remove("ExpenseID");
        attributes.remove("UserID");
        attributes.remove("CreatedAt");
        let expression = build_update_expression(&attributes);

        let mut txn = Transaction::new();
        txn.update(
            KeyScheme::EXPENSE.canonical(&expense.id),
            expression.clone(),
            Precondition::MustExist,
        );
        txn.update(
            KeyScheme::EXPENSE.listing(existing.created_at, &expense.id),
            expression.clone(),
            Precondition::MustExist,
        );
        txn.update(
            KeyScheme::EXPENSE.owned(
                KeyScheme::USER,
                &existing.user_id,
                existing.created_at,
                &expense.id,
            ),
            expression,
            Precondition::MustExist,
        );
        txn.commit(&self.store, EntityKind::Expense).await?;
        Ok(expense)
    }
}
