//! Image upload metadata.

use crate::core::models::ImageMetadata;
use crate::errors::{EntityKind, RepoError};
use crate::store::{Precondition, StoreClient, StoreError};

use super::keys::KeyScheme;
use super::{parse_item, to_item};

/// Records which user uploaded an image. The image URL is the identity, so a
/// single canonical item is the only copy.
#[derive(Debug, Clone)]
pub struct ImageMetadataRepository<S> {
    store: S,
}

impl<S: StoreClient> ImageMetadataRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// `AlreadyExists` when metadata for the URL was already recorded.
    pub async fn save(&self, image_url: &str, metadata: ImageMetadata) -> Result<(), RepoError> {
        let item = to_item(&metadata, EntityKind::Image)?;
        let result = self
            .store
            .put_item(
                &KeyScheme::IMAGE.canonical(image_url),
                item,
                Precondition::MustNotExist,
            )
            .await;
        match result {
            Ok(()) => Ok(()),
            Err(StoreError::ConditionFailed) => Err(RepoError::AlreadyExists(EntityKind::Image)),
            Err(other) => Err(RepoError::from(other)),
        }
    }

    pub async fn get(&self, image_url: &str) -> Result<Option<ImageMetadata>, RepoError> {
        let item = self
            .store
            .get_item(&KeyScheme::IMAGE.canonical(image_url))
            .await?;
        item.map(|item| parse_item(item, EntityKind::Image))
            .transpose()
    }

    /// Removing metadata that was never recorded is not an error.
    pub async fn delete(&self, image_url: &str) -> Result<(), RepoError> {
        self.store
            .delete_item(&KeyScheme::IMAGE.canonical(image_url), Precondition::None)
            .await?;
        Ok(())
    }
}
