//! Project storage.

use crate::core::models::Project;
use crate::errors::{EntityKind, RepoError};
use crate::store::{Precondition, QueryRequest, StoreClient, build_update_expression};

use super::keys::KeyScheme;
use super::txn::Transaction;
use super::{now_millis, page, parse_item, to_item};

/// Projects keep three copies: the canonical record, the global listing entry,
/// and a copy scoped under the owning department.
#[derive(Debug, Clone)]
pub struct ProjectRepository<S> {
    store: S,
}

impl<S: StoreClient> ProjectRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates the project. Assigns an id when `id` is empty and stamps both
    /// timestamps when `created_at` is zero.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when the id is already taken.
    pub async fn save(&self, project: Project) -> Result<Project, RepoError> {
        let mut project = project;
        if project.id.is_empty() {
            project.id = uuid::Uuid::new_v4().to_string();
        }
        if project.created_at == 0 {
            project.created_at = now_millis();
            project.updated_at = project.created_at;
        }

        let item = to_item(&project, EntityKind::Project)?;
        let mut txn = Transaction::new();
        txn.put(
            KeyScheme::PROJECT.canonical(&project.id),
            item.clone(),
            Precondition::MustNotExist,
        );
        txn.put(
            KeyScheme::PROJECT.listing(project.created_at, &project.id),
            item.clone(),
            Precondition::MustNotExist,
        );
        txn.put(
            KeyScheme::PROJECT.owned(
                KeyScheme::DEPARTMENT,
                &project.department_id,
                project.created_at,
                &project.id,
            ),
            item,
            Precondition::MustNotExist,
        );
        txn.commit(&self.store, EntityKind::Project).await?;
        Ok(project)
    }

    pub async fn get(&self, project_id: &str) -> Result<Option<Project>, RepoError> {
        let item = self
            .store
            .get_item(&KeyScheme::PROJECT.canonical(project_id))
            .await?;
        item.map(|item| parse_item(item, EntityKind::Project))
            .transpose()
    }

    /// Every project, oldest first.
    pub async fn get_all(&self) -> Result<Vec<Project>, RepoError> {
        let request = QueryRequest::new(KeyScheme::PROJECT.listing_partition())
            .with_sort_prefix(KeyScheme::PROJECT.listing_sort_prefix());
        let items = page::collect_all(&self.store, request).await?;
        items
            .into_iter()
            .map(|item| parse_item(item, EntityKind::Project))
            .collect()
    }

    /// Rewrites the mutable attributes on every copy. `id` and `created_at`
    /// never change; changing `department_id` relocates the department-scoped
    /// copy in the same transaction.
    ///
    /// # Errors
    ///
    /// `NotFound` when the project does not exist.
    pub async fn update(&self, project: Project) -> Result<Project, RepoError> {
        let Some(existing) = self.get(&project.id).await? else {
            return Err(RepoError::NotFound(EntityKind::Project));
        };

        let mut project = project;
        project.created_at = existing.created_at;
        project.updated_at = now_millis();

        let mut attributes = to_item(&project, EntityKind::Project)?;
        attributes.remove("ProjectID");
        attributes.remove("CreatedAt");
        let expression = build_update_expression(&attributes);

        let mut txn = Transaction::new();
        txn.update(
            KeyScheme::PROJECT.canonical(&project.id),
            expression.clone(),
            Precondition::MustExist,
        );
        txn.update(
            KeyScheme::PROJECT.listing(existing.created_at, &project.id),
            expression.clone(),
            Precondition::MustExist,
        );

        let current_owner_key = KeyScheme::PROJECT.owned(
            KeyScheme::DEPARTMENT,
            &existing.department_id,
            existing.created_at,
            &project.id,
        );
        if project.department_id == existing.department_id {
            txn.update(current_owner_key, expression, Precondition::MustExist);
        } else {
            // The scoped copy moves partitions with its owner.
            let item = to_item(&project, EntityKind::Project)?;
            txn.delete(current_owner_key, Precondition::None);
            txn.put(
                KeyScheme::PROJECT.owned(
                    KeyScheme::DEPARTMENT,
                    &project.department_id,
                    existing.created_at,
                    &project.id,
                ),
                item,
                Precondition::None,
            );
        }

        txn.commit(&self.store, EntityKind::Project).await?;
        Ok(project)
    }
}
