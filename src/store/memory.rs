// src/store/memory.rs

use super::{
    AdjustmentFilter, NewAdjustment, NewAuditEntry, NewLedgerTransaction, NewSalaryPayment,
    PayrollStore, UnitOfWork,
};
use crate::{
    errors::{AppError, AppResult},
    models::{
        AdjustmentStatus, AuditEntry, Employee, EmployeeAdjustment, LedgerTransaction,
        SalaryMonth, SalaryPayment,
    },
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// A write that can be made to fail once, to exercise rollback paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertLedgerTransaction,
    InsertAdjustment,
    MarkAdjustmentsProcessed,
    InsertSalaryPayment,
    Commit,
    RecordAudit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    employees: HashMap<Uuid, Employee>,
    adjustments: Vec<EmployeeAdjustment>,
    transactions: Vec<LedgerTransaction>,
    salary_payments: Vec<SalaryPayment>,
    audit_log: Vec<AuditEntry>,
}

/// Process-local store. Units of work are serialized: each one holds the whole
/// state exclusively and writes to a private copy that replaces the state on commit.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_point: Arc<StdMutex<Option<FailPoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_employee(&self, employee: Employee) {
        self.state
            .lock()
            .await
            .employees
            .insert(employee.id, employee);
    }

    /// Arms a one-shot failure for the next time `point` is reached.
    pub fn fail_next(&self, point: FailPoint) {
        *self.fail_point.lock().unwrap_or_else(|e| e.into_inner()) = Some(point);
    }

    pub async fn adjustments(&self) -> Vec<EmployeeAdjustment> {
        self.state.lock().await.adjustments.clone()
    }

    pub async fn transactions(&self) -> Vec<LedgerTransaction> {
        self.state.lock().await.transactions.clone()
    }

    pub async fn salary_payments(&self) -> Vec<SalaryPayment> {
        self.state.lock().await.salary_payments.clone()
    }

    pub async fn audit_log(&self) -> Vec<AuditEntry> {
        self.state.lock().await.audit_log.clone()
    }
}

fn trip(fail_point: &StdMutex<Option<FailPoint>>, point: FailPoint) -> AppResult<()> {
    let mut armed = fail_point.lock().unwrap_or_else(|e| e.into_inner());
    if *armed == Some(point) {
        *armed = None;
        return Err(AppError::Internal(format!("injected failure at {:?}", point)));
    }
    Ok(())
}

fn find_payment(
    state: &MemoryState,
    employee_id: Uuid,
    salary_month: SalaryMonth,
) -> Option<SalaryPayment> {
    let salary_month = salary_month.to_string();
    state
        .salary_payments
        .iter()
        .find(|p| p.employee_id == employee_id && p.salary_month == salary_month)
        .cloned()
}

#[async_trait]
impl PayrollStore for MemoryStore {
    async fn find_employee(&self, employee_id: Uuid) -> AppResult<Option<Employee>> {
        Ok(self.state.lock().await.employees.get(&employee_id).cloned())
    }

    async fn list_adjustments(
        &self,
        employee_id: Uuid,
        filter: &AdjustmentFilter,
    ) -> AppResult<Vec<EmployeeAdjustment>> {
        let state = self.state.lock().await;
        let mut adjustments: Vec<_> = state
            .adjustments
            .iter()
            .filter(|a| a.employee_id == employee_id)
            .filter(|a| filter.status.is_none_or(|s| a.status == s))
            .filter(|a| filter.month.is_none_or(|m| m.contains(a.date)))
            .cloned()
            .collect();
        adjustments.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(adjustments)
    }

    async fn list_salary_payments(&self, employee_id: Uuid) -> AppResult<Vec<SalaryPayment>> {
        let state = self.state.lock().await;
        let mut payments: Vec<_> = state
            .salary_payments
            .iter()
            .filter(|p| p.employee_id == employee_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.salary_month.cmp(&a.salary_month));
        Ok(payments)
    }

    async fn find_salary_payment(
        &self,
        employee_id: Uuid,
        salary_month: SalaryMonth,
    ) -> AppResult<Option<SalaryPayment>> {
        let state = self.state.lock().await;
        Ok(find_payment(&state, employee_id, salary_month))
    }

    async fn record_audit(&self, entry: NewAuditEntry) -> AppResult<()> {
        trip(&self.fail_point, FailPoint::RecordAudit)?;
        self.state.lock().await.audit_log.push(AuditEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            action: entry.action,
            entity_type: entry.entity_type.to_string(),
            entity_id: entry.entity_id,
            details: entry.details,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            staged,
            fail_point: Arc::clone(&self.fail_point),
        }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    fail_point: Arc<StdMutex<Option<FailPoint>>>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_employee(&mut self, employee_id: Uuid) -> AppResult<Option<Employee>> {
        Ok(self.staged.employees.get(&employee_id).cloned())
    }

    async fn pending_adjustments(
        &mut self,
        employee_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<EmployeeAdjustment>> {
        let mut adjustments: Vec<_> = self
            .staged
            .adjustments
            .iter()
            .filter(|a| a.employee_id == employee_id)
            .filter(|a| a.status == AdjustmentStatus::Pending)
            .filter(|a| a.date >= from && a.date <= to)
            .cloned()
            .collect();
        adjustments.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(adjustments)
    }

    async fn find_salary_payment(
        &mut self,
        employee_id: Uuid,
        salary_month: SalaryMonth,
    ) -> AppResult<Option<SalaryPayment>> {
        Ok(find_payment(&self.staged, employee_id, salary_month))
    }

    async fn insert_ledger_transaction(
        &mut self,
        new: NewLedgerTransaction,
    ) -> AppResult<LedgerTransaction> {
        trip(&self.fail_point, FailPoint::InsertLedgerTransaction)?;
        let transaction = LedgerTransaction {
            id: Uuid::new_v4(),
            transaction_type: new.transaction_type,
            amount: new.amount,
            category: new.category,
            date: new.date,
            employee_id: new.employee_id,
            branch_id: new.branch_id,
            payment_method: new.payment_method,
            notes: new.notes,
            created_by: new.created_by,
            created_at: Utc::now(),
        };
        self.staged.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn insert_adjustment(&mut self, new: NewAdjustment) -> AppResult<EmployeeAdjustment> {
        trip(&self.fail_point, FailPoint::InsertAdjustment)?;
        if !self.staged.employees.contains_key(&new.employee_id) {
            return Err(AppError::Conflict(format!(
                "Employee {} does not exist",
                new.employee_id
            )));
        }
        let now = Utc::now();
        let adjustment = EmployeeAdjustment {
            id: Uuid::new_v4(),
            employee_id: new.employee_id,
            adjustment_type: new.adjustment_type,
            amount: new.amount,
            date: new.date,
            description: new.description,
            status: AdjustmentStatus::Pending,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        self.staged.adjustments.push(adjustment.clone());
        Ok(adjustment)
    }

    async fn mark_adjustments_processed(&mut self, ids: &[Uuid]) -> AppResult<u64> {
        trip(&self.fail_point, FailPoint::MarkAdjustmentsProcessed)?;
        let now = Utc::now();
        let mut changed = 0;
        for adjustment in self
            .staged
            .adjustments
            .iter_mut()
            .filter(|a| ids.contains(&a.id) && a.status == AdjustmentStatus::Pending)
        {
            adjustment.status = AdjustmentStatus::Processed;
            adjustment.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn insert_salary_payment(&mut self, new: NewSalaryPayment) -> AppResult<SalaryPayment> {
        trip(&self.fail_point, FailPoint::InsertSalaryPayment)?;
        let salary_month = new.salary_month.to_string();
        if self
            .staged
            .salary_payments
            .iter()
            .any(|p| p.employee_id == new.employee_id && p.salary_month == salary_month)
        {
            return Err(AppError::AlreadyPaid {
                month: salary_month,
            });
        }
        let payment = SalaryPayment {
            id: Uuid::new_v4(),
            employee_id: new.employee_id,
            salary_month,
            payment_date: new.payment_date,
            payment_method: new.payment_method,
            gross_salary: new.gross_salary,
            total_bonuses: new.total_bonuses,
            total_deductions: new.total_deductions,
            total_advances: new.total_advances,
            net_salary: new.net_salary,
            transaction_id: new.transaction_id,
            notes: new.notes,
            created_by: new.created_by,
            created_at: Utc::now(),
        };
        self.staged.salary_payments.push(payment.clone());
        Ok(payment)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        trip(&self.fail_point, FailPoint::Commit)?;
        let MemoryUnitOfWork {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }
}
