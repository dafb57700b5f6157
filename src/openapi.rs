// src/openapi.rs

use crate::models::{
    AdjustmentCreated, AdjustmentStatus, AdjustmentType, CreateAdjustmentRequest, Employee,
    EmployeeAdjustment, EmployeeStatus, LedgerTransaction, PaySalaryRequest, PaymentMethod,
    SalaryDetails, SalaryPayment, SalaryTotals, TransactionType,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Branch Payroll API",
        version = "1.0.0",
        description = "Payroll back office for a multi-branch restaurant. \
            Records employee bonuses, deductions and cash advances, previews monthly \
            salaries and settles them against the expense ledger.",
        license(name = "MIT")
    ),
    paths(
        // Adjustments
        crate::handlers::payroll::create_adjustment,
        crate::handlers::payroll::list_adjustments,
        // Salaries
        crate::handlers::payroll::get_salary_details,
        crate::handlers::payroll::pay_salary,
        crate::handlers::payroll::list_salary_payments,
    ),
    components(
        schemas(
            Employee, EmployeeStatus,
            CreateAdjustmentRequest, AdjustmentCreated, EmployeeAdjustment,
            AdjustmentType, AdjustmentStatus,
            LedgerTransaction, TransactionType, PaymentMethod,
            SalaryDetails, SalaryTotals, PaySalaryRequest, SalaryPayment,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Adjustments", description = "Bonuses, deductions and cash advances"),
        (name = "Salaries", description = "Preview and pay monthly salaries"),
    )
)]
pub struct ApiDoc;
