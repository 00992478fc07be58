use aws_sdk_dynamodb::types::AttributeValue;
use rust_decimal::Decimal;

use watch_expense_store::core::models::Project;
use watch_expense_store::errors::{EntityKind, RepoError};
use watch_expense_store::repository::ProjectRepository;
use watch_expense_store::store::{Item, ItemKey, MemoryStore, Precondition, QueryRequest, StoreClient};

fn sample_project(id: &str, department_id: &str) -> Project {
    Project {
        id: id.to_string(),
        name: "Meter rollout".to_string(),
        description: "Field deployment".to_string(),
        budget: Decimal::from(50_000),
        start_date: 1_704_067_200_000,
        end_date: 1_719_705_600_000,
        department_id: department_id.to_string(),
        created_at: 0,
        updated_at: 0,
    }
}

async fn department_scoped_ids(store: &MemoryStore, department_id: &str) -> Vec<String> {
    let response = store
        .query(
            QueryRequest::new(format!("DEPARTMENT#{department_id}"))
                .with_sort_prefix("PROJECT#"),
        )
        .await
        .unwrap();
    response
        .items
        .iter()
        .map(|item| item["ProjectID"].as_s().unwrap().clone())
        .collect()
}

#[tokio::test]
async fn test_save_writes_three_copies() {
    let store = MemoryStore::new();
    let repo = ProjectRepository::new(store.clone());

    repo.save(sample_project("p-1", "d-1")).await.unwrap();

    assert_eq!(store.len(), 3);
    assert_eq!(department_scoped_ids(&store, "d-1").await, vec!["p-1"]);
}

#[tokio::test]
async fn test_save_twice_reports_already_exists() {
    let repo = ProjectRepository::new(MemoryStore::new());
    repo.save(sample_project("p-1", "d-1")).await.unwrap();

    let err = repo.save(sample_project("p-1", "d-2")).await.unwrap_err();

    assert!(matches!(err, RepoError::AlreadyExists(EntityKind::Project)));
}

#[tokio::test]
async fn test_update_missing_project_reports_not_found() {
    let repo = ProjectRepository::new(MemoryStore::new());

    let err = repo.update(sample_project("ghost", "d-1")).await.unwrap_err();

    assert!(matches!(err, RepoError::NotFound(EntityKind::Project)));
}

#[tokio::test]
async fn test_update_keeps_created_at_and_refreshes_all_copies() {
    let repo = ProjectRepository::new(MemoryStore::new());
    let saved = repo.save(sample_project("p-1", "d-1")).await.unwrap();

    let mut changed = saved.clone();
    changed.budget = Decimal::from(75_000);
    let updated = repo.update(changed).await.unwrap();

    assert_eq!(updated.created_at, saved.created_at);
    let loaded = repo.get("p-1").await.unwrap().unwrap();
    assert_eq!(loaded.budget, Decimal::from(75_000));
    let all = repo.get_all().await.unwrap();
    assert_eq!(all[0].budget, Decimal::from(75_000));
}

#[tokio::test]
async fn test_changing_department_moves_the_scoped_copy() {
    let store = MemoryStore::new();
    let repo = ProjectRepository::new(store.clone());
    let saved = repo.save(sample_project("p-1", "d-1")).await.unwrap();

    let mut changed = saved.clone();
    changed.department_id = "d-2".to_string();
    repo.update(changed).await.unwrap();

    assert!(department_scoped_ids(&store, "d-1").await.is_empty());
    assert_eq!(department_scoped_ids(&store, "d-2").await, vec!["p-1"]);
    // Total copy count is unchanged by the move.
    assert_eq!(store.len(), 3);

    // Canonical and listing reads still work and carry the new owner.
    let loaded = repo.get("p-1").await.unwrap().unwrap();
    assert_eq!(loaded.department_id, "d-2");
    assert_eq!(loaded.created_at, saved.created_at);
    let all = repo.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].department_id, "d-2");
}

#[tokio::test]
async fn test_get_all_returns_projects_oldest_first() {
    let repo = ProjectRepository::new(MemoryStore::new());
    let mut older = sample_project("p-1", "d-1");
    older.created_at = 1_000;
    let mut newer = sample_project("p-2", "d-1");
    newer.created_at = 2_000;
    repo.save(newer).await.unwrap();
    repo.save(older).await.unwrap();

    let all = repo.get_all().await.unwrap();

    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, "p-1");
    assert_eq!(all[1].id, "p-2");
}

#[tokio::test]
async fn test_parses_items_written_with_numeric_dates() {
    let store = MemoryStore::new();
    let repo = ProjectRepository::new(store.clone());

    // Seeded the way the other services sharing the table write projects:
    // dates and timestamps are number attributes.
    let mut item = Item::new();
    item.insert("ProjectID".to_string(), AttributeValue::S("p-1".to_string()));
    item.insert("Name".to_string(), AttributeValue::S("Meter rollout".to_string()));
    item.insert(
        "Description".to_string(),
        AttributeValue::S("Field deployment".to_string()),
    );
    item.insert("Budget".to_string(), AttributeValue::N("50000".to_string()));
    item.insert(
        "StartDate".to_string(),
        AttributeValue::N("1704067200000".to_string()),
    );
    item.insert(
        "EndDate".to_string(),
        AttributeValue::N("1719705600000".to_string()),
    );
    item.insert("DepartmentID".to_string(), AttributeValue::S("d-1".to_string()));
    item.insert(
        "CreatedAt".to_string(),
        AttributeValue::N("1704000000000".to_string()),
    );
    item.insert(
        "UpdatedAt".to_string(),
        AttributeValue::N("1704000000000".to_string()),
    );
    store
        .put_item(
            &ItemKey::new("PROJECT#p-1", "DETAILS"),
            item,
            Precondition::None,
        )
        .await
        .unwrap();

    let loaded = repo.get("p-1").await.unwrap().unwrap();

    assert_eq!(loaded.start_date, 1_704_067_200_000);
    assert_eq!(loaded.end_date, 1_719_705_600_000);
    assert_eq!(loaded.budget, Decimal::from(50_000));
    assert_eq!(loaded.created_at, 1_704_000_000_000);
}

#[tokio::test]
async fn test_save_stores_dates_as_number_attributes() {
    let store = MemoryStore::new();
    let repo = ProjectRepository::new(store.clone());

    repo.save(sample_project("p-1", "d-1")).await.unwrap();

    let item = store
        .get_item(&ItemKey::new("PROJECT#p-1", "DETAILS"))
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(item["StartDate"], AttributeValue::N(_)));
    assert!(matches!(item["EndDate"], AttributeValue::N(_)));
}
