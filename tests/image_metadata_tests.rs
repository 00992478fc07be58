use watch_expense_store::core::models::ImageMetadata;
use watch_expense_store::errors::{EntityKind, RepoError};
use watch_expense_store::repository::ImageMetadataRepository;
use watch_expense_store::store::MemoryStore;

const URL: &str = "https://files.example.com/receipts/42.png";

#[tokio::test]
async fn test_save_then_get_returns_the_uploader() {
    let repo = ImageMetadataRepository::new(MemoryStore::new());

    repo.save(URL, ImageMetadata { user_id: "u-1".to_string() })
        .await
        .unwrap();

    let loaded = repo.get(URL).await.unwrap().unwrap();
    assert_eq!(loaded.user_id, "u-1");
}

#[tokio::test]
async fn test_get_missing_metadata_is_none() {
    let repo = ImageMetadataRepository::new(MemoryStore::new());
    assert!(repo.get(URL).await.unwrap().is_none());
}

#[tokio::test]
async fn test_saving_the_same_url_twice_reports_already_exists() {
    let repo = ImageMetadataRepository::new(MemoryStore::new());
    repo.save(URL, ImageMetadata { user_id: "u-1".to_string() })
        .await
        .unwrap();

    let err = repo
        .save(URL, ImageMetadata { user_id: "u-2".to_string() })
        .await
        .unwrap_err();

    assert!(matches!(err, RepoError::AlreadyExists(EntityKind::Image)));
    // The first uploader keeps the record.
    let kept = repo.get(URL).await.unwrap().unwrap();
    assert_eq!(kept.user_id, "u-1");
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let repo = ImageMetadataRepository::new(MemoryStore::new());
    repo.save(URL, ImageMetadata { user_id: "u-1".to_string() })
        .await
        .unwrap();

    repo.delete(URL).await.unwrap();
    assert!(repo.get(URL).await.unwrap().is_none());

    // Deleting again is not an error.
    repo.delete(URL).await.unwrap();
}
