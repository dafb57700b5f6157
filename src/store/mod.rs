// src/store/mod.rs

pub mod memory;
pub mod postgres;

use crate::{
    errors::AppResult,
    models::{
        AdjustmentStatus, AdjustmentType, AuditAction, Employee, EmployeeAdjustment,
        LedgerTransaction, PaymentMethod, SalaryMonth, SalaryPayment, TransactionType,
    },
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

pub use memory::{FailPoint, MemoryStore};
pub use postgres::PgStore;

#[derive(Debug, Clone)]
pub struct NewAdjustment {
    pub employee_id: Uuid,
    pub adjustment_type: AdjustmentType,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewLedgerTransaction {
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    pub employee_id: Option<Uuid>,
    pub branch_id: Uuid,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewSalaryPayment {
    pub employee_id: Uuid,
    pub salary_month: SalaryMonth,
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
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub user_id: Uuid,
    pub action: AuditAction,
    pub entity_type: &'static str,
    pub entity_id: Uuid,
    pub details: serde_json::Value,
}

/// Filters for listing an employee's adjustments. `None` means any.
#[derive(Debug, Clone, Default)]
pub struct AdjustmentFilter {
    pub status: Option<AdjustmentStatus>,
    pub month: Option<SalaryMonth>,
}

/// Reads outside a unit of work plus the entry point for opening one.
#[async_trait]
pub trait PayrollStore: Send + Sync {
    async fn find_employee(&self, employee_id: Uuid) -> AppResult<Option<Employee>>;

    /// Newest first by date.
    async fn list_adjustments(
        &self,
        employee_id: Uuid,
        filter: &AdjustmentFilter,
    ) -> AppResult<Vec<EmployeeAdjustment>>;

    /// Newest month first.
    async fn list_salary_payments(&self, employee_id: Uuid) -> AppResult<Vec<SalaryPayment>>;

    async fn find_salary_payment(
        &self,
        employee_id: Uuid,
        salary_month: SalaryMonth,
    ) -> AppResult<Option<SalaryPayment>>;

    async fn record_audit(&self, entry: NewAuditEntry) -> AppResult<()>;

    async fn ping(&self) -> AppResult<()>;

    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}

/// All writes of one business command. Nothing is visible to other callers
/// until `commit`; dropping the unit of work discards every write.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Loads the employee and holds it locked until the unit of work ends, so
    /// settlements and new adjustments for one employee never interleave.
    async fn lock_employee(&mut self, employee_id: Uuid) -> AppResult<Option<Employee>>;

    /// PENDING adjustments dated within `[from, to]`, oldest first.
    async fn pending_adjustments(
        &mut self,
        employee_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<EmployeeAdjustment>>;

    async fn find_salary_payment(
        &mut self,
        employee_id: Uuid,
        salary_month: SalaryMonth,
    ) -> AppResult<Option<SalaryPayment>>;

    async fn insert_ledger_transaction(
        &mut self,
        new: NewLedgerTransaction,
    ) -> AppResult<LedgerTransaction>;

    async fn insert_adjustment(&mut self, new: NewAdjustment) -> AppResult<EmployeeAdjustment>;

    /// Flips the given adjustments from PENDING to PROCESSED and returns how
    /// many actually changed. Adjustments that are not PENDING are left alone.
    async fn mark_adjustments_processed(&mut self, ids: &[Uuid]) -> AppResult<u64>;

    /// Fails with `AlreadyPaid` if the employee already has a payment for the month.
    async fn insert_salary_payment(&mut self, new: NewSalaryPayment) -> AppResult<SalaryPayment>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
