#![allow(dead_code)]

use branch_payroll::{
    auth::{ActorScope, AuthUser},
    models::{
        AdjustmentType, CreateAdjustmentRequest, Employee, EmployeeStatus, PaySalaryRequest,
        PaymentMethod, UserRole,
    },
    services::payroll::PayrollService,
    store::MemoryStore,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn employee(branch_id: Uuid, base_salary: Decimal, allowance: Decimal) -> Employee {
    Employee {
        id: Uuid::new_v4(),
        branch_id,
        full_name: "Rami Khalil".to_string(),
        base_salary,
        allowance,
        status: EmployeeStatus::Active,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn admin() -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        role: UserRole::Admin,
        scope: ActorScope::Unrestricted,
    }
}

pub fn accountant(branch_id: Uuid) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        role: UserRole::Accountant,
        scope: ActorScope::Branch(branch_id),
    }
}

pub fn adjustment(
    employee: &Employee,
    adjustment_type: AdjustmentType,
    amount: Decimal,
    date: NaiveDate,
) -> CreateAdjustmentRequest {
    CreateAdjustmentRequest {
        employee_id: employee.id,
        adjustment_type,
        amount,
        date,
        description: None,
    }
}

pub fn pay(employee: &Employee, month: &str, payment_date: NaiveDate) -> PaySalaryRequest {
    PaySalaryRequest {
        employee_id: employee.id,
        salary_month: month.to_string(),
        payment_date,
        payment_method: PaymentMethod::Cash,
        notes: None,
    }
}

pub struct Fixture {
    pub store: MemoryStore,
    pub payroll: PayrollService,
    pub employee: Employee,
}

/// One employee on 500.00 base and 50.00 allowance.
pub async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let employee = employee(Uuid::new_v4(), dec!(500.00), dec!(50.00));
    store.insert_employee(employee.clone()).await;
    let payroll = PayrollService::new(Arc::new(store.clone()));
    Fixture {
        store,
        payroll,
        employee,
    }
}

/// BONUS 100.00, DEDUCTION 30.00 and ADVANCE 20.00, all in January 2025.
pub async fn seed_january(fx: &Fixture, auth: &AuthUser) {
    for (kind, amount, day) in [
        (AdjustmentType::Bonus, dec!(100.00), 5),
        (AdjustmentType::Deduction, dec!(30.00), 12),
        (AdjustmentType::Advance, dec!(20.00), 20),
    ] {
        fx.payroll
            .create_adjustment(auth, adjustment(&fx.employee, kind, amount, date(2025, 1, day)))
            .await
            .unwrap();
    }
}
