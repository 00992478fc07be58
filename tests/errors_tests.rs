use std::error::Error;

use watch_expense_store::errors::{EntityKind, RepoError};
use watch_expense_store::store::{CancelCode, StoreError};

#[test]
fn test_repo_error_implements_error_trait() {
    fn assert_error<T: Error>(_: &T) {}

    let error = RepoError::Internal("boom".to_string());
    assert_error(&error);
}

#[test]
fn test_repo_error_display() {
    let error = RepoError::NotFound(EntityKind::Expense);
    assert_eq!(format!("{error}"), "expense not found");

    let error = RepoError::AlreadyExists(EntityKind::User);
    assert_eq!(format!("{error}"), "user already exists");

    let error = RepoError::AlreadyExists(EntityKind::Image);
    assert_eq!(format!("{error}"), "image metadata already exists");

    let error = RepoError::Throttled("slow down".to_string());
    assert_eq!(format!("{error}"), "data store throttled the request: slow down");
}

#[test]
fn test_store_error_conversions() {
    let throttled: RepoError = StoreError::Throttled("busy".to_string()).into();
    assert!(matches!(throttled, RepoError::Throttled(_)));

    let other: RepoError = StoreError::Other("io".to_string()).into();
    assert!(matches!(other, RepoError::Internal(_)));

    let condition: RepoError = StoreError::ConditionFailed.into();
    assert!(matches!(condition, RepoError::Internal(_)));
}

#[test]
fn test_canceled_transaction_with_throttle_reason_converts_to_throttled() {
    let canceled = StoreError::TransactionCanceled {
        reasons: vec![CancelCode::None, CancelCode::Throttled],
    };
    let repo_err: RepoError = canceled.into();
    assert!(matches!(repo_err, RepoError::Throttled(_)));

    let canceled = StoreError::TransactionCanceled {
        reasons: vec![CancelCode::Other],
    };
    let repo_err: RepoError = canceled.into();
    assert!(matches!(repo_err, RepoError::Internal(_)));
}

#[test]
fn test_entity_kind_labels() {
    assert_eq!(EntityKind::User.as_str(), "user");
    assert_eq!(EntityKind::Project.as_str(), "project");
    assert_eq!(EntityKind::Department.as_str(), "department");
    assert_eq!(EntityKind::Expense.as_str(), "expense");
    assert_eq!(EntityKind::Advance.as_str(), "advance");
    assert_eq!(EntityKind::Image.as_str(), "image metadata");
}
