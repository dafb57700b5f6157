// src/services/payroll.rs

use crate::{
    auth::AuthUser,
    errors::{AppError, AppResult},
    models::{
        AdjustmentCreated, AdjustmentStatus, AdjustmentType, AuditAction, CreateAdjustmentRequest,
        Employee, EmployeeAdjustment, ListAdjustmentsQuery, PaySalaryRequest, PaymentMethod,
        SALARY_CATEGORY, SalaryDetails, SalaryMonth, SalaryPayment, TransactionType,
    },
    services::salary::{SalaryBreakdown, positive_amount},
    store::{
        AdjustmentFilter, NewAdjustment, NewAuditEntry, NewLedgerTransaction, NewSalaryPayment,
        PayrollStore,
    },
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Adjustments dated before this are treated as typos.
const EARLIEST_ADJUSTMENT_DATE: (i32, u32, u32) = (2000, 1, 1);

/// Payroll adjustments, salary previews and salary settlement.
#[derive(Clone)]
pub struct PayrollService {
    store: Arc<dyn PayrollStore>,
}

impl PayrollService {
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        Self { store }
    }

    /// Records a bonus, deduction or advance for an employee.
    ///
    /// An advance is cash leaving the till today, so it is written to the
    /// ledger in the same unit of work as the adjustment itself.
    #[instrument(skip_all, fields(employee_id = %req.employee_id, kind = ?req.adjustment_type, user_id = %auth.id))]
    pub async fn create_adjustment(
        &self,
        auth: &AuthUser,
        req: CreateAdjustmentRequest,
    ) -> AppResult<AdjustmentCreated> {
        let amount = positive_amount(req.amount)?;
        validate_adjustment_date(req.date)?;
        let description = clean_text(req.description);

        let mut uow = self.store.begin().await?;
        let employee = uow
            .lock_employee(req.employee_id)
            .await?
            .ok_or_else(|| employee_not_found(req.employee_id))?;
        ensure_branch_access(auth, &employee)?;

        // A settled month can no longer consume adjustments.
        let month = SalaryMonth::containing(req.date);
        if uow.find_salary_payment(employee.id, month).await?.is_some() {
            warn!(
                "Adjustment dated {} rejected: {} already paid to employee {}",
                req.date, month, employee.id
            );
            return Err(AppError::AlreadyPaid {
                month: month.to_string(),
            });
        }

        let transaction = if req.adjustment_type == AdjustmentType::Advance {
            let notes = match &description {
                Some(text) => format!("Salary advance for {}: {}", employee.full_name, text),
                None => format!("Salary advance for {}", employee.full_name),
            };
            let transaction = uow
                .insert_ledger_transaction(NewLedgerTransaction {
                    transaction_type: TransactionType::Expense,
                    amount,
                    category: SALARY_CATEGORY.to_string(),
                    date: req.date,
                    employee_id: Some(employee.id),
                    branch_id: employee.branch_id,
                    payment_method: PaymentMethod::Cash,
                    notes: Some(notes),
                    created_by: auth.id,
                })
                .await?;
            Some(transaction)
        } else {
            None
        };

        let adjustment = uow
            .insert_adjustment(NewAdjustment {
                employee_id: employee.id,
                adjustment_type: req.adjustment_type,
                amount,
                date: req.date,
                description,
                created_by: auth.id,
            })
            .await?;

        uow.commit().await?;

        info!(
            "Adjustment {} ({:?} {}) recorded for employee {}",
            adjustment.id, adjustment.adjustment_type, adjustment.amount, employee.id
        );

        self.audit(NewAuditEntry {
            user_id: auth.id,
            action: AuditAction::Create,
            entity_type: "EmployeeAdjustment",
            entity_id: adjustment.id,
            details: json!({
                "employeeId": employee.id,
                "type": adjustment.adjustment_type,
                "amount": adjustment.amount,
                "date": adjustment.date,
                "transactionId": transaction.as_ref().map(|t| t.id),
            }),
        })
        .await;

        Ok(AdjustmentCreated {
            adjustment,
            transaction,
        })
    }

    /// Computes what settling `month` would pay the employee right now, or
    /// returns the payment that already settled it. Read-only.
    #[instrument(skip(self, auth), fields(user_id = %auth.id))]
    pub async fn salary_details(
        &self,
        auth: &AuthUser,
        employee_id: Uuid,
        month: &str,
    ) -> AppResult<SalaryDetails> {
        let month: SalaryMonth = month.parse()?;
        let employee = self.accessible_employee(auth, employee_id).await?;

        let pending = self
            .store
            .list_adjustments(
                employee.id,
                &AdjustmentFilter {
                    status: Some(AdjustmentStatus::Pending),
                    month: Some(month),
                },
            )
            .await?;

        let breakdown = SalaryBreakdown::compute(&employee, &pending);
        let salary_payment = self.store.find_salary_payment(employee.id, month).await?;

        Ok(SalaryDetails {
            salary_month: month,
            already_paid: salary_payment.is_some(),
            salary_payment,
            base_salary: breakdown.base_salary,
            allowance: breakdown.allowance,
            gross_salary: breakdown.gross_salary,
            pending_adjustments: pending,
            summary: breakdown.totals(),
            employee,
        })
    }

    /// Settles one month of salary for one employee.
    ///
    /// Within a single unit of work: consumes every PENDING adjustment dated in
    /// the month, writes the salary expense to the ledger and records the
    /// payment. A month can be settled once per employee.
    #[instrument(skip_all, fields(employee_id = %req.employee_id, month = %req.salary_month, user_id = %auth.id))]
    pub async fn pay_salary(
        &self,
        auth: &AuthUser,
        req: PaySalaryRequest,
    ) -> AppResult<SalaryPayment> {
        let month: SalaryMonth = req.salary_month.parse()?;
        if !req.payment_method.settles_salaries() {
            return Err(AppError::Validation(format!(
                "Payment method {:?} cannot be used for salaries",
                req.payment_method
            )));
        }
        if req.payment_date < month.first_day() {
            return Err(AppError::Validation(format!(
                "Payment date {} is before salary month {}",
                req.payment_date, month
            )));
        }
        let notes = clean_text(req.notes);

        let mut uow = self.store.begin().await?;
        let employee = uow
            .lock_employee(req.employee_id)
            .await?
            .ok_or_else(|| employee_not_found(req.employee_id))?;
        ensure_branch_access(auth, &employee)?;

        if uow.find_salary_payment(employee.id, month).await?.is_some() {
            warn!("Salary for {} already paid to employee {}", month, employee.id);
            return Err(AppError::AlreadyPaid {
                month: month.to_string(),
            });
        }

        let pending = uow
            .pending_adjustments(employee.id, month.first_day(), month.last_day())
            .await?;
        let breakdown = SalaryBreakdown::compute(&employee, &pending);

        if breakdown.net_salary < Decimal::ZERO {
            warn!(
                "Net salary {} for employee {} in {} is negative",
                breakdown.net_salary, employee.id, month
            );
            return Err(AppError::Validation(format!(
                "Net salary for {} is negative ({}); deductions and advances exceed pay and need manual reconciliation",
                month, breakdown.net_salary
            )));
        }

        let adjustment_ids: Vec<Uuid> = pending.iter().map(|a| a.id).collect();
        let processed = uow.mark_adjustments_processed(&adjustment_ids).await?;
        if processed != adjustment_ids.len() as u64 {
            return Err(AppError::Conflict(format!(
                "Adjustments for employee {} changed during settlement",
                employee.id
            )));
        }

        let transaction = uow
            .insert_ledger_transaction(NewLedgerTransaction {
                transaction_type: TransactionType::Expense,
                amount: breakdown.net_salary,
                category: SALARY_CATEGORY.to_string(),
                date: req.payment_date,
                employee_id: Some(employee.id),
                branch_id: employee.branch_id,
                payment_method: req.payment_method,
                notes: Some(format!("Salary for {} - {}", month, employee.full_name)),
                created_by: auth.id,
            })
            .await?;

        let payment = uow
            .insert_salary_payment(NewSalaryPayment {
                employee_id: employee.id,
                salary_month: month,
                payment_date: req.payment_date,
                payment_method: req.payment_method,
                gross_salary: breakdown.gross_salary,
                total_bonuses: breakdown.total_bonuses,
                total_deductions: breakdown.total_deductions,
                total_advances: breakdown.total_advances,
                net_salary: breakdown.net_salary,
                transaction_id: transaction.id,
                notes,
                created_by: auth.id,
            })
            .await?;

        uow.commit().await?;

        info!(
            "Salary {} paid to employee {}: net {} ({} adjustments processed)",
            month,
            employee.id,
            payment.net_salary,
            adjustment_ids.len()
        );

        self.audit(NewAuditEntry {
            user_id: auth.id,
            action: AuditAction::Create,
            entity_type: "SalaryPayment",
            entity_id: payment.id,
            details: json!({
                "employeeId": employee.id,
                "salaryMonth": payment.salary_month,
                "netSalary": payment.net_salary,
                "transactionId": transaction.id,
                "processedAdjustments": adjustment_ids,
            }),
        })
        .await;

        for adjustment_id in &adjustment_ids {
            self.audit(NewAuditEntry {
                user_id: auth.id,
                action: AuditAction::Update,
                entity_type: "EmployeeAdjustment",
                entity_id: *adjustment_id,
                details: json!({
                    "status": { "from": AdjustmentStatus::Pending, "to": AdjustmentStatus::Processed },
                    "salaryPaymentId": payment.id,
                }),
            })
            .await;
        }

        Ok(payment)
    }

    #[instrument(skip(self, auth, query), fields(user_id = %auth.id))]
    pub async fn list_adjustments(
        &self,
        auth: &AuthUser,
        employee_id: Uuid,
        query: ListAdjustmentsQuery,
    ) -> AppResult<Vec<EmployeeAdjustment>> {
        let month = query.month.as_deref().map(str::parse::<SalaryMonth>).transpose()?;
        let employee = self.accessible_employee(auth, employee_id).await?;

        self.store
            .list_adjustments(
                employee.id,
                &AdjustmentFilter {
                    status: query.status,
                    month,
                },
            )
            .await
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.id))]
    pub async fn list_salary_payments(
        &self,
        auth: &AuthUser,
        employee_id: Uuid,
    ) -> AppResult<Vec<SalaryPayment>> {
        let employee = self.accessible_employee(auth, employee_id).await?;
        self.store.list_salary_payments(employee.id).await
    }

    async fn accessible_employee(&self, auth: &AuthUser, employee_id: Uuid) -> AppResult<Employee> {
        let employee = self
            .store
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| employee_not_found(employee_id))?;
        ensure_branch_access(auth, &employee)?;
        Ok(employee)
    }

    // The business command has already committed; a lost audit line is logged, not raised.
    async fn audit(&self, entry: NewAuditEntry) {
        let entity_id = entry.entity_id;
        if let Err(e) = self.store.record_audit(entry).await {
            warn!("Audit log write failed for {}: {}", entity_id, e);
        }
    }
}

fn employee_not_found(employee_id: Uuid) -> AppError {
    AppError::NotFound(format!("Employee {} not found", employee_id))
}

fn ensure_branch_access(auth: &AuthUser, employee: &Employee) -> AppResult<()> {
    if auth.can_access_branch(employee.branch_id) {
        Ok(())
    } else {
        warn!(
            "User {} ({:?}) denied access to employee {} of branch {}",
            auth.id, auth.role, employee.id, employee.branch_id
        );
        Err(AppError::Forbidden(format!(
            "Employee {} belongs to another branch",
            employee.id
        )))
    }
}

fn validate_adjustment_date(date: NaiveDate) -> AppResult<()> {
    let (year, month, day) = EARLIEST_ADJUSTMENT_DATE;
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(earliest) if date < earliest => Err(AppError::Validation(format!(
            "Adjustment date {} is before {}",
            date, earliest
        ))),
        _ => Ok(()),
    }
}

fn clean_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
