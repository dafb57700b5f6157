// src/models/mod.rs

mod month;

pub use month::SalaryMonth;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// ─── Employee ─────────────────────────────────────────────────────────────────

// sqlx 0.8: custom Postgres enums need #[sqlx(type_name = "...")] on the enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "employee_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

/// Read-only view of an employee as kept by the employee directory.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub full_name: String,
    #[schema(example = "500.00")]
    pub base_salary: Decimal,
    #[schema(example = "50.00")]
    pub allowance: Decimal,
    pub status: EmployeeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ─── Adjustments ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "adjustment_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentType {
    Bonus,
    Deduction,
    Advance,
}

/// PENDING until a salary settlement for the adjustment's month consumes it.
/// PROCESSED is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "adjustment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentStatus {
    Pending,
    Processed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeAdjustment {
    pub id: Uuid,
    pub employee_id: Uuid,
    #[serde(rename = "type")]
    pub adjustment_type: AdjustmentType,
    #[schema(example = "100.00")]
    pub amount: Decimal,
    #[schema(value_type = String, format = Date, example = "2025-01-15")]
    pub date: NaiveDate,
    pub description: Option<String>,
    pub status: AdjustmentStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdjustmentRequest {
    pub employee_id: Uuid,
    #[serde(rename = "type")]
    pub adjustment_type: AdjustmentType,
    #[schema(value_type = String, example = "100.00")]
    pub amount: Decimal,
    #[schema(value_type = String, format = Date, example = "2025-01-15")]
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// A freshly created adjustment. Advances also carry the ledger entry that
/// paid them out.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentCreated {
    #[serde(flatten)]
    pub adjustment: EmployeeAdjustment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<LedgerTransaction>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListAdjustmentsQuery {
    /// Format: "YYYY-MM"
    pub month: Option<String>,
    pub status: Option<AdjustmentStatus>,
}

// ─── Ledger ───────────────────────────────────────────────────────────────────

pub const SALARY_CATEGORY: &str = "employee salaries";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "transaction_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
}

impl PaymentMethod {
    pub fn settles_salaries(&self) -> bool {
        matches!(self, PaymentMethod::Cash | PaymentMethod::BankTransfer)
    }
}

/// Immutable cash movement written by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub category: String,
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub employee_id: Option<Uuid>,
    pub branch_id: Uuid,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// ─── Salary ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalaryDetailsQuery {
    /// Format: "YYYY-MM"
    pub month: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryTotals {
    pub total_bonuses: Decimal,
    pub total_deductions: Decimal,
    pub total_advances: Decimal,
    pub net_salary: Decimal,
}

/// Preview of what settling `salary_month` would pay right now. A settled
/// month also carries its payment.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryDetails {
    pub employee: Employee,
    #[schema(value_type = String, example = "2025-01")]
    pub salary_month: SalaryMonth,
    pub base_salary: Decimal,
    pub allowance: Decimal,
    pub gross_salary: Decimal,
    pub pending_adjustments: Vec<EmployeeAdjustment>,
    pub summary: SalaryTotals,
    pub already_paid: bool,
    /// The settlement of `salary_month`, once it has been paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_payment: Option<SalaryPayment>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaySalaryRequest {
    pub employee_id: Uuid,
    /// Format: "YYYY-MM"
    pub salary_month: String,
    #[schema(value_type = String, format = Date, example = "2025-02-01")]
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// One executed settlement. At most one exists per employee and month.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryPayment {
    pub id: Uuid,
    pub employee_id: Uuid,
    #[schema(example = "2025-01")]
    pub salary_month: String,
    #[schema(value_type = String, format = Date)]
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub gross_salary: Decimal,
    pub total_bonuses: Decimal,
    pub total_deductions: Decimal,
    pub total_advances: Decimal,
    pub net_salary: Decimal,
    pub transaction_id: Uuid,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// ─── Audit ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "audit_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ─── JWT Claims ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Manager,
    Accountant,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: UserRole,
    pub branch_id: Option<Uuid>,
    pub exp: usize,
    pub iat: usize,
}
