//! Department storage.

use crate::core::models::Department;
use crate::errors::{EntityKind, RepoError};
use crate::store::{Precondition, QueryRequest, StoreClient, build_update_expression};

use super::keys::KeyScheme;
use super::txn::Transaction;
use super::{now_millis, page, parse_item, to_item};

/// Departments keep two copies: the canonical record and the global listing
/// entry.
#[derive(Debug, Clone)]
pub struct DepartmentRepository<S> {
    store: S,
}

impl<S: StoreClient> DepartmentRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates the department. Assigns an id when `id` is empty and stamps both
    /// timestamps when `created_at` is zero.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when the id is already taken.
    pub async fn save(&self, department: Department) -> Result<Department, RepoError> {
        let mut department = department;
        if department.id.is_empty() {
            department.id = uuid::Uuid::new_v4().to_string();
        }
        if department.created_at == 0 {
            department.created_at = now_millis();
            department.updated_at = department.created_at;
        }

        let item = to_item(&department, EntityKind::Department)?;
        let mut txn = Transaction::new();
        txn.put(
            KeyScheme::DEPARTMENT.canonical(&department.id),
            item.clone(),
            Precondition::MustNotExist,
        );
        txn.put(
            KeyScheme::DEPARTMENT.listing(department.created_at, &department.id),
            item,
            Precondition::MustNotExist,
        );
        txn.commit(&self.store, EntityKind::Department).await?;
        Ok(department)
    }

    pub async fn get(&self, department_id: &str) -> Result<Option<Department>, RepoError> {
        let item = self
            .store
            .get_item(&KeyScheme::DEPARTMENT.canonical(department_id))
            .await?;
        item.map(|item| parse_item(item, EntityKind::Department))
            .transpose()
    }

    /// Every department, oldest first.
    pub async fn get_all(&self) -> Result<Vec<Department>, RepoError> {
        let request = QueryRequest::new(KeyScheme::DEPARTMENT.listing_partition())
            .with_sort_prefix(KeyScheme::DEPARTMENT.listing_sort_prefix());
        let items = page::collect_all(&self.store, request).await?;
        items
            .into_iter()
            .map(|item| parse_item(item, EntityKind::Department))
            .collect()
    }

    /// Rewrites the mutable attributes on both copies. `id` and `created_at`
    /// never change.
    ///
    /// # Errors
    ///
    /// `NotFound` when the department does not exist.
    pub async fn update(&self, department: Department) -> Result<Department, RepoError> {
        let Some(existing) = self.get(&department.id).await? else {
            return Err(RepoError::NotFound(EntityKind::Department));
        };

        let mut department = department;
        department.created_at = existing.created_at;
        department.updated_at = now_millis();

        let mut attributes = to_item(&department, EntityKind::Department)?;
        attributes.remove("DepartmentID");
        attributes.remove("CreatedAt");
        let expression = build_update_expression(&attributes);

        let mut txn = Transaction::new();
        txn.update(
            KeyScheme::DEPARTMENT.canonical(&department.id),
            expression.clone(),
            Precondition::MustExist,
        );
        txn.update(
            KeyScheme::DEPARTMENT.listing(existing.created_at, &department.id),
            expression,
            Precondition::MustExist,
        );
        txn.commit(&self.store, EntityKind::Department).await?;
        Ok(department)
    }
}
