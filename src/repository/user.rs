//! User storage.

use tracing::debug;

use crate::core::models::User;
use crate::errors::{EntityKind, RepoError};
use crate::store::{Precondition, QueryRequest, StoreClient, build_update_expression};

use super::keys::{EMAIL, KeyScheme};
use super::txn::Transaction;
use super::{now_millis, page, parse_item, to_item};

/// Users live as three physical copies: the canonical record, the global
/// listing entry, and an email lookup that doubles as the uniqueness claim.
#[derive(Debug, Clone)]
pub struct UserRepository<S> {
    store: S,
}

impl<S: StoreClient> UserRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates the user. Assigns an id when `id` is empty and stamps both
    /// timestamps when `created_at` is zero.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when the id or the email is already taken.
    pub async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut user = user;
        if user.id.is_empty() {
            user.id = uuid::Uuid::new_v4().to_string();
        }
        if user.created_at == 0 {
            user.created_at = now_millis();
            user.updated_at = user.created_at;
        }

        let item = to_item(&user, EntityKind::User)?;
        let mut txn = Transaction::new();
        txn.put(
            KeyScheme::USER.canonical(&user.id),
            item.clone(),
            Precondition::MustNotExist,
        );
        txn.put(
            KeyScheme::USER.lookup(EMAIL, &user.email),
            item.clone(),
            Precondition::MustNotExist,
        );
        txn.put(
            KeyScheme::USER.listing(user.created_at, &user.id),
            item,
            Precondition::MustNotExist,
        );
        txn.commit(&self.store, EntityKind::User).await?;

        debug!(user_id = %user.id, "saved user");
        Ok(user)
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<User>, RepoError> {
        let item = self
            .store
            .get_item(&KeyScheme::USER.canonical(user_id))
            .await?;
        item.map(|item| parse_item(item, EntityKind::User)).transpose()
    }

    /// Point read through the email lookup copy.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let item = self
            .store
            .get_item(&KeyScheme::USER.lookup(EMAIL, email))
            .await?;
        item.map(|item| parse_item(item, EntityKind::User)).transpose()
    }

    /// Every user, oldest first.
    pub async fn get_all(&self) -> Result<Vec<User>, RepoError> {
        let request = QueryRequest::new(KeyScheme::USER.listing_partition())
            .with_sort_prefix(KeyScheme::USER.listing_sort_prefix());
        let items = page::collect_all(&self.store, request).await?;
        items
            .into_iter()
            .map(|item| parse_item(item, EntityKind::User))
            .collect()
    }

    /// Rewrites the mutable attributes on every copy. `id` and `created_at`
    /// never change, and an empty `password_hash` keeps the stored hash.
    ///
    /// # Errors
    ///
    /// `NotFound` when the user does not exist; `AlreadyExists` when changing
    /// to an email another user already claimed.
    pub async fn update(&self, user: User) -> Result<User, RepoError> {
        let Some(existing) = self.get(&user.id).await? else {
            return Err(RepoError::NotFound(EntityKind::User));
        };

        let mut user = user;
        user.created_at = existing.created_at;
        user.updated_at = now_millis();
        if user.password_hash.is_empty() {
            user.password_hash = existing.password_hash.clone();
        }

        let mut attributes = to_item(&user, EntityKind::User)?;
        attributes.remove("UserID");
        attributes.remove("CreatedAt");
        let expression = build_update_expression(&attributes);

        let mut txn = Transaction::new();
        txn.update(
            KeyScheme::USER.canonical(&user.id),
            expression.clone(),
            Precondition::MustExist,
        );
        txn.update(
            KeyScheme::USER.listing(existing.created_at, &user.id),
            expression.clone(),
            Precondition::MustExist,
        );

        if user.email == existing.email {
            txn.update(
                KeyScheme::USER.lookup(EMAIL, &existing.email),
                expression,
                Precondition::MustExist,
            );
        } else {
            // The email lookup moves keys: drop the old claim, stake the new one.
            let item = to_item(&user, EntityKind::User)?;
            txn.delete(KeyScheme::USER.lookup(EMAIL, &existing.email), Precondition::None);
            txn.put(
                KeyScheme::USER.lookup(EMAIL, &user.email),
                item,
                Precondition::MustNotExist,
            );
        }

        txn.commit(&self.store, EntityKind::User).await?;
        Ok(user)
    }

    /// Removes every copy of the user in one transaction.
    ///
    /// # Errors
    ///
    /// `NotFound` when the user does not exist.
    pub async fn delete(&self, user_id: &str) -> Result<(), RepoError> {
        let Some(existing) = self.get(user_id).await? else {
            return Err(RepoError::NotFound(EntityKind::User));
        };

        let mut txn = Transaction::new();
        txn.delete(KeyScheme::USER.canonical(&existing.id), Precondition::None);
        txn.delete(
            KeyScheme::USER.lookup(EMAIL, &existing.email),
            Precondition::None,
        );
        txn.delete(
            KeyScheme::USER.listing(existing.created_at, &existing.id),
            Precondition::None,
        );
        txn.commit(&self.store, EntityKind::User).await?;

        debug!(user_id = %existing.id, "deleted user");
        Ok(())
    }
}
