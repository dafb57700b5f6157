// src/store/postgres.rs

use super::{
    AdjustmentFilter, NewAdjustment, NewAuditEntry, NewLedgerTransaction, NewSalaryPayment,
    PayrollStore, UnitOfWork,
};
use crate::{
    errors::{AppError, AppResult},
    models::{
        AdjustmentStatus, Employee, EmployeeAdjustment, LedgerTransaction, SalaryMonth,
        SalaryPayment,
    },
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const EMPLOYEE_COLUMNS: &str =
    "id, branch_id, full_name, base_salary, allowance, status, created_at, updated_at";

const ADJUSTMENT_COLUMNS: &str = "id, employee_id, adjustment_type, amount, date, description, \
     status, created_by, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "id, transaction_type, amount, category, date, employee_id, \
     branch_id, payment_method, notes, created_by, created_at";

const PAYMENT_COLUMNS: &str = "id, employee_id, salary_month, payment_date, payment_method, \
     gross_salary, total_bonuses, total_deductions, total_advances, net_salary, \
     transaction_id, notes, created_by, created_at";

/// One salary payment per employee and month.
const EMPLOYEE_MONTH_KEY: &str = "salary_payments_employee_month_key";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PayrollStore for PgStore {
    async fn find_employee(&self, employee_id: Uuid) -> AppResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1"
        ))
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    async fn list_adjustments(
        &self,
        employee_id: Uuid,
        filter: &AdjustmentFilter,
    ) -> AppResult<Vec<EmployeeAdjustment>> {
        let (from, to) = match filter.month {
            Some(month) => (Some(month.first_day()), Some(month.last_day())),
            None => (None, None),
        };

        let adjustments = sqlx::query_as::<_, EmployeeAdjustment>(&format!(
            r#"SELECT {ADJUSTMENT_COLUMNS}
               FROM employee_adjustments
               WHERE employee_id = $1
                 AND ($2::adjustment_status IS NULL OR status = $2)
                 AND ($3::date IS NULL OR date >= $3)
                 AND ($4::date IS NULL OR date <= $4)
               ORDER BY date DESC, created_at DESC"#
        ))
        .bind(employee_id)
        .bind(filter.status)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(adjustments)
    }

    async fn list_salary_payments(&self, employee_id: Uuid) -> AppResult<Vec<SalaryPayment>> {
        let payments = sqlx::query_as::<_, SalaryPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM salary_payments \
             WHERE employee_id = $1 ORDER BY salary_month DESC"
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    async fn find_salary_payment(
        &self,
        employee_id: Uuid,
        salary_month: SalaryMonth,
    ) -> AppResult<Option<SalaryPayment>> {
        let payment = sqlx::query_as::<_, SalaryPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM salary_payments \
             WHERE employee_id = $1 AND salary_month = $2"
        ))
        .bind(employee_id)
        .bind(salary_month.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn record_audit(&self, entry: NewAuditEntry) -> AppResult<()> {
        sqlx::query(
            r#"INSERT INTO audit_logs (id, user_id, action, entity_type, entity_id, details, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, NOW())"#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.details)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// A unit of work backed by one Postgres transaction. sqlx rolls the
/// transaction back when it is dropped uncommitted.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_employee(&mut self, employee_id: Uuid) -> AppResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1 FOR UPDATE"
        ))
        .bind(employee_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(employee)
    }

    async fn pending_adjustments(
        &mut self,
        employee_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<EmployeeAdjustment>> {
        let adjustments = sqlx::query_as::<_, EmployeeAdjustment>(&format!(
            r#"SELECT {ADJUSTMENT_COLUMNS}
               FROM employee_adjustments
               WHERE employee_id = $1 AND status = $2 AND date BETWEEN $3 AND $4
               ORDER BY date, created_at
               FOR UPDATE"#
        ))
        .bind(employee_id)
        .bind(AdjustmentStatus::Pending)
        .bind(from)
        .bind(to)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(adjustments)
    }

    async fn find_salary_payment(
        &mut self,
        employee_id: Uuid,
        salary_month: SalaryMonth,
    ) -> AppResult<Option<SalaryPayment>> {
        let payment = sqlx::query_as::<_, SalaryPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM salary_payments \
             WHERE employee_id = $1 AND salary_month = $2"
        ))
        .bind(employee_id)
        .bind(salary_month.to_string())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(payment)
    }

    async fn insert_ledger_transaction(
        &mut self,
        new: NewLedgerTransaction,
    ) -> AppResult<LedgerTransaction> {
        let transaction = sqlx::query_as::<_, LedgerTransaction>(&format!(
            r#"INSERT INTO transactions (
                id, transaction_type, amount, category, date, employee_id,
                branch_id, payment_method, notes, created_by, created_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,NOW())
            RETURNING {TRANSACTION_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(new.transaction_type)
        .bind(new.amount)
        .bind(new.category)
        .bind(new.date)
        .bind(new.employee_id)
        .bind(new.branch_id)
        .bind(new.payment_method)
        .bind(new.notes)
        .bind(new.created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(transaction)
    }

    async fn insert_adjustment(&mut self, new: NewAdjustment) -> AppResult<EmployeeAdjustment> {
        let adjustment = sqlx::query_as::<_, EmployeeAdjustment>(&format!(
            r#"INSERT INTO employee_adjustments (
                id, employee_id, adjustment_type, amount, date, description,
                status, created_by, created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,NOW(),NOW())
            RETURNING {ADJUSTMENT_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(new.employee_id)
        .bind(new.adjustment_type)
        .bind(new.amount)
        .bind(new.date)
        .bind(new.description)
        .bind(AdjustmentStatus::Pending)
        .bind(new.created_by)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(adjustment)
    }

    async fn mark_adjustments_processed(&mut self, ids: &[Uuid]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"UPDATE employee_adjustments
               SET status = $1, updated_at = NOW()
               WHERE id = ANY($2) AND status = $3"#,
        )
        .bind(AdjustmentStatus::Processed)
        .bind(ids)
        .bind(AdjustmentStatus::Pending)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn insert_salary_payment(&mut self, new: NewSalaryPayment) -> AppResult<SalaryPayment> {
        let salary_month = new.salary_month.to_string();

        sqlx::query_as::<_, SalaryPayment>(&format!(
            r#"INSERT INTO salary_payments (
                id, employee_id, salary_month, payment_date, payment_method,
                gross_salary, total_bonuses, total_deductions, total_advances, net_salary,
                transaction_id, notes, created_by, created_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,NOW())
            RETURNING {PAYMENT_COLUMNS}"#
        ))
        .bind(Uuid::new_v4())
        .bind(new.employee_id)
        .bind(&salary_month)
        .bind(new.payment_date)
        .bind(new.payment_method)
        .bind(new.gross_salary)
        .bind(new.total_bonuses)
        .bind(new.total_deductions)
        .bind(new.total_advances)
        .bind(new.net_salary)
        .bind(new.transaction_id)
        .bind(new.notes)
        .bind(new.created_by)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some(EMPLOYEE_MONTH_KEY) =>
            {
                AppError::AlreadyPaid {
                    month: salary_month.clone(),
                }
            }
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(db_err.message().to_string())
            }
            other => AppError::Database(other),
        })
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(db_err.message().to_string())
            }
            other => AppError::Database(other),
        })
    }
}
