//! Domain models stored in the table.
//!
//! Field renames pin the attribute names the existing table already uses, so the
//! data stays readable by the other services sharing it. Money fields are
//! [`Decimal`] and land as DynamoDB number attributes; timestamps are milliseconds
//! since the epoch. Parsing ignores unknown attributes and defaults absent ones.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Review lifecycle of an expense or advance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Reviewed,
}

impl RequestStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Reviewed => "REVIEWED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Employee,
}

/// An employee account. Email doubles as a uniqueness key in the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "UserID", default)]
    pub id: String,
    #[serde(rename = "EmployeeId", default)]
    pub employee_id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Already hashed by the service layer; never a plain password.
    #[serde(rename = "PasswordHash", default)]
    pub password_hash: String,
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Role")]
    pub role: UserRole,
    #[serde(rename = "ProjectID", default)]
    pub project_id: String,
    #[serde(rename = "DepartmentID", default)]
    pub department_id: String,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: i64,
    #[serde(rename = "UpdatedAt", default)]
    pub updated_at: i64,
}

/// A receipt attached to an expense, stored inline on the expense item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    #[serde(rename = "BillID", default)]
    pub id: String,
    #[serde(rename = "Amount", with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "AttachmentURL", default)]
    pub attachment_url: String,
}

/// A reimbursement request raised by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "ExpenseID", default)]
    pub id: String,
    /// Owner; fixed for the lifetime of the expense.
    #[serde(rename = "UserID", default)]
    pub user_id: String,
    #[serde(rename = "Amount", with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Purpose", default)]
    pub purpose: String,
    #[serde(rename = "Status")]
    pub status: RequestStatus,
    #[serde(rename = "IsReconciled", default)]
    pub is_reconciled: bool,
    #[serde(rename = "ApprovedBy", default)]
    pub approved_by: Option<String>,
    #[serde(rename = "ApprovedAt", default)]
    pub approved_at: Option<i64>,
    #[serde(rename = "ReviewedBy", default)]
    pub reviewed_by: Option<String>,
    #[serde(rename = "ReviewedAt", default)]
    pub reviewed_at: Option<i64>,
    #[serde(rename = "Bills", default)]
    pub bills: Vec<Bill>,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: i64,
    #[serde(rename = "UpdatedAt", default)]
    pub updated_at: i64,
}

/// A cash advance request raised by a user ahead of spending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advance {
    #[serde(rename = "AdvanceID", default)]
    pub id: String,
    /// Owner; fixed for the lifetime of the advance.
    #[serde(rename = "UserID", default)]
    pub user_id: String,
    #[serde(rename = "Amount", with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Purpose", default)]
    pub purpose: String,
    #[serde(rename = "Status")]
    pub status: RequestStatus,
    /// Set once the advance is settled against an expense.
    #[serde(rename = "ReconciledExpenseID", default)]
    pub reconciled_expense_id: Option<String>,
    #[serde(rename = "ApprovedBy", default)]
    pub approved_by: Option<String>,
    #[serde(rename = "ApprovedAt", default)]
    pub approved_at: Option<i64>,
    #[serde(rename = "ReviewedBy", default)]
    pub reviewed_by: Option<String>,
    #[serde(rename = "ReviewedAt", default)]
    pub reviewed_at: Option<i64>,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: i64,
    #[serde(rename = "UpdatedAt", default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "ProjectID", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Budget", with = "rust_decimal::serde::float")]
    pub budget: Decimal,
    /// Planned start, milliseconds since the epoch.
    #[serde(rename = "StartDate", default)]
    pub start_date: i64,
    /// Planned end, milliseconds since the epoch.
    #[serde(rename = "EndDate", default)]
    pub end_date: i64,
    /// Owning department; moving it relocates the department-scoped copy.
    #[serde(rename = "DepartmentID", default)]
    pub department_id: String,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: i64,
    #[serde(rename = "UpdatedAt", default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    #[serde(rename = "DepartmentID", default)]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Budget", with = "rust_decimal::serde::float")]
    pub budget: Decimal,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: i64,
    #[serde(rename = "UpdatedAt", default)]
    pub updated_at: i64,
}

/// Who uploaded an image; the image URL itself is the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    #[serde(rename = "UserID", default)]
    pub user_id: String,
}

/// Options for the paginated expense and advance listings.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    /// Owner scope; empty selects the global listing.
    pub user_id: String,
    /// Keep only requests in this status.
    pub status: Option<RequestStatus>,
    /// Zero-based page index.
    pub page: i32,
    /// Page size.
    pub limit: i32,
}
