// src/handlers/payroll.rs

use crate::{
    auth::AuthUser,
    errors::AppResult,
    handlers::{AppJson, AppQuery},
    models::{
        AdjustmentCreated, CreateAdjustmentRequest, EmployeeAdjustment, ListAdjustmentsQuery,
        PaySalaryRequest, SalaryDetails, SalaryDetailsQuery, SalaryPayment,
    },
    services::payroll::PayrollService,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

/// Record a bonus, deduction or advance for an employee.
/// Advances are paid out in cash immediately and also create a ledger expense.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/adjustments",
    request_body = CreateAdjustmentRequest,
    responses(
        (status = 201, description = "Adjustment created", body = AdjustmentCreated),
        (status = 400, description = "Invalid amount, date or type"),
        (status = 403, description = "Employee belongs to another branch"),
        (status = 404, description = "Employee not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Adjustments"
)]
pub async fn create_adjustment(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateAdjustmentRequest>,
) -> AppResult<(StatusCode, Json<AdjustmentCreated>)> {
    let payroll = PayrollService::new(Arc::clone(&state.store));
    let created = payroll.create_adjustment(&auth, body).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// List an employee's adjustments, optionally filtered by month and status
#[utoipa::path(
    get,
    path = "/api/v1/payroll/employee/{employee_id}/adjustments",
    params(
        ("employee_id" = Uuid, Path, description = "Employee ID"),
        ListAdjustmentsQuery,
    ),
    responses(
        (status = 200, description = "List of adjustments", body = Vec<EmployeeAdjustment>),
        (status = 403, description = "Employee belongs to another branch"),
        (status = 404, description = "Employee not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Adjustments"
)]
pub async fn list_adjustments(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
    AppQuery(query): AppQuery<ListAdjustmentsQuery>,
) -> AppResult<Json<Vec<EmployeeAdjustment>>> {
    let payroll = PayrollService::new(Arc::clone(&state.store));
    let adjustments = payroll.list_adjustments(&auth, employee_id, query).await?;

    Ok(Json(adjustments))
}

/// Preview an employee's salary for a month: gross pay, pending adjustments and net
#[utoipa::path(
    get,
    path = "/api/v1/payroll/employee/{employee_id}/salary-details",
    params(
        ("employee_id" = Uuid, Path, description = "Employee ID"),
        SalaryDetailsQuery,
    ),
    responses(
        (status = 200, description = "Salary summary", body = SalaryDetails),
        (status = 400, description = "Month is not in YYYY-MM format"),
        (status = 403, description = "Employee belongs to another branch"),
        (status = 404, description = "Employee not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salaries"
)]
pub async fn get_salary_details(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
    AppQuery(query): AppQuery<SalaryDetailsQuery>,
) -> AppResult<Json<SalaryDetails>> {
    let payroll = PayrollService::new(Arc::clone(&state.store));
    let details = payroll
        .salary_details(&auth, employee_id, &query.month)
        .await?;

    Ok(Json(details))
}

/// Pay an employee's salary for a month.
/// Locks in the month's pending adjustments and records the salary expense.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/pay-salary",
    request_body = PaySalaryRequest,
    responses(
        (status = 201, description = "Salary paid", body = SalaryPayment),
        (status = 400, description = "Invalid month, payment date or method, or negative net salary"),
        (status = 403, description = "Employee belongs to another branch"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Salary for this month was already paid"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salaries"
)]
pub async fn pay_salary(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(body): AppJson<PaySalaryRequest>,
) -> AppResult<(StatusCode, Json<SalaryPayment>)> {
    let payroll = PayrollService::new(Arc::clone(&state.store));
    let payment = payroll.pay_salary(&auth, body).await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// List an employee's salary payments, newest month first
#[utoipa::path(
    get,
    path = "/api/v1/payroll/employee/{employee_id}/salary-payments",
    params(("employee_id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "List of salary payments", body = Vec<SalaryPayment>),
        (status = 403, description = "Employee belongs to another branch"),
        (status = 404, description = "Employee not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Salaries"
)]
pub async fn list_salary_payments(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(employee_id): Path<Uuid>,
) -> AppResult<Json<Vec<SalaryPayment>>> {
    let payroll = PayrollService::new(Arc::clone(&state.store));
    let payments = payroll.list_salary_payments(&auth, employee_id).await?;

    Ok(Json(payments))
}
