//! Persistence layer for the WatchExpense approval backend.
//!
//! Every entity lives in one DynamoDB table under string `PK`/`SK` keys, stored as
//! several physical copies so each read pattern is a key lookup or a
//! single-partition query: a canonical record, a global listing entry, and where
//! needed an owner-scoped entry or a uniqueness lookup. The repositories keep the
//! copies consistent with conditional and transactional writes.
//!
//! # Architecture
//!
//! - `store` hides the table behind the [`store::StoreClient`] trait, with
//!   [`store::DynamoStore`] for production and [`store::MemoryStore`] for tests
//!   and local development
//! - `repository` holds one repository per entity plus the shared key scheme,
//!   transaction composer and pagination walker
//! - `core` carries the domain models and environment configuration
//! - serde_dynamo converts models to and from raw attribute maps
//!
//! # Example
//!
//! ```no_run
//! use rust_decimal::Decimal;
//! use watch_expense_store::core::models::Department;
//! use watch_expense_store::repository::DepartmentRepository;
//! use watch_expense_store::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Set up structured logging
//!     watch_expense_store::setup_logging();
//!
//!     let repo = DepartmentRepository::new(MemoryStore::new());
//!     let saved = repo
//!         .save(Department {
//!             id: String::new(),
//!             name: "Platform".to_string(),
//!             budget: Decimal::from(10_000),
//!             created_at: 0,
//!             updated_at: 0,
//!         })
//!         .await?;
//!
//!     println!("created department {}", saved.id);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod errors;
pub mod repository;
pub mod store;

/// Configure structured logging with JSON format.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. It should be called once at the start of the
/// application.
///
/// # Example
///
/// ```
/// // Initialize structured logging at startup
/// watch_expense_store::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    tracing_subscriber::registry().with(fmt_layer).init();
}
