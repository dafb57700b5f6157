// src/services/salary.rs

use crate::{
    errors::AppError,
    models::{AdjustmentType, Employee, EmployeeAdjustment, SalaryTotals},
};
use rust_decimal::Decimal;

/// Money is carried with two fractional digits everywhere.
pub const MONEY_SCALE: u32 = 2;

/// Validates a caller-supplied money amount: strictly positive and at most
/// two fractional digits. Returns it rescaled to exactly two digits.
pub fn positive_amount(amount: Decimal) -> Result<Decimal, AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Amount must be greater than zero".to_string(),
        ));
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(AppError::Validation(format!(
            "Amount {} has more than {} decimal places",
            amount, MONEY_SCALE
        )));
    }
    let mut amount = amount;
    amount.rescale(MONEY_SCALE);
    Ok(amount)
}

/// Salary for one employee and month, before anything is paid.
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryBreakdown {
    pub base_salary: Decimal,
    pub allowance: Decimal,
    pub gross_salary: Decimal,
    pub total_bonuses: Decimal,
    pub total_deductions: Decimal,
    pub total_advances: Decimal,
    pub net_salary: Decimal,
}

impl SalaryBreakdown {
    /// Sums every adjustment given; the caller decides which ones are due.
    /// The net is not clamped and may come out negative.
    pub fn compute(employee: &Employee, adjustments: &[EmployeeAdjustment]) -> Self {
        let total_of = |kind: AdjustmentType| -> Decimal {
            adjustments
                .iter()
                .filter(|a| a.adjustment_type == kind)
                .map(|a| a.amount)
                .sum()
        };

        let total_bonuses = total_of(AdjustmentType::Bonus);
        let total_deductions = total_of(AdjustmentType::Deduction);
        let total_advances = total_of(AdjustmentType::Advance);

        let gross_salary = employee.base_salary + employee.allowance;
        let net_salary = gross_salary + total_bonuses - total_deductions - total_advances;

        SalaryBreakdown {
            base_salary: employee.base_salary,
            allowance: employee.allowance,
            gross_salary,
            total_bonuses,
            total_deductions,
            total_advances,
            net_salary,
        }
    }

    pub fn totals(&self) -> SalaryTotals {
        SalaryTotals {
            total_bonuses: self.total_bonuses,
            total_deductions: self.total_deductions,
            total_advances: self.total_advances,
            net_salary: self.net_salary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdjustmentStatus, EmployeeStatus};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn employee(base: Decimal, allowance: Decimal) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            full_name: "Sami Haddad".to_string(),
            base_salary: base,
            allowance,
            status: EmployeeStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn adjustment(employee: &Employee, kind: AdjustmentType, amount: Decimal) -> EmployeeAdjustment {
        EmployeeAdjustment {
            id: Uuid::new_v4(),
            employee_id: employee.id,
            adjustment_type: kind,
            amount,
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            description: None,
            status: AdjustmentStatus::Pending,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn no_adjustments_nets_the_gross() {
        let emp = employee(dec!(500.00), dec!(50.00));
        let breakdown = SalaryBreakdown::compute(&emp, &[]);
        assert_eq!(breakdown.gross_salary, dec!(550.00));
        assert_eq!(breakdown.total_bonuses, Decimal::ZERO);
        assert_eq!(breakdown.total_deductions, Decimal::ZERO);
        assert_eq!(breakdown.total_advances, Decimal::ZERO);
        assert_eq!(breakdown.net_salary, dec!(550.00));
    }

    #[test]
    fn partitions_adjustments_by_type() {
        let emp = employee(dec!(500.00), dec!(50.00));
        let adjustments = vec![
            adjustment(&emp, AdjustmentType::Bonus, dec!(100.00)),
            adjustment(&emp, AdjustmentType::Deduction, dec!(30.00)),
            adjustment(&emp, AdjustmentType::Advance, dec!(20.00)),
        ];
        let breakdown = SalaryBreakdown::compute(&emp, &adjustments);
        assert_eq!(breakdown.gross_salary, dec!(550.00));
        assert_eq!(breakdown.total_bonuses, dec!(100.00));
        assert_eq!(breakdown.total_deductions, dec!(30.00));
        assert_eq!(breakdown.total_advances, dec!(20.00));
        assert_eq!(breakdown.net_salary, dec!(600.00));
        assert_eq!(breakdown.net_salary.to_string(), "600.00");
    }

    #[test]
    fn sums_are_exact_for_fractional_cents() {
        let emp = employee(dec!(0.10), dec!(0.20));
        let adjustments: Vec<_> = (0..10)
            .map(|_| adjustment(&emp, AdjustmentType::Bonus, dec!(0.10)))
            .chain((0..3).map(|_| adjustment(&emp, AdjustmentType::Advance, dec!(0.10))))
            .collect();
        let breakdown = SalaryBreakdown::compute(&emp, &adjustments);
        assert_eq!(breakdown.gross_salary, dec!(0.30));
        assert_eq!(breakdown.total_bonuses, dec!(1.00));
        assert_eq!(breakdown.total_advances, dec!(0.30));
        assert_eq!(
            breakdown.gross_salary + breakdown.total_bonuses
                - breakdown.total_deductions
                - breakdown.total_advances,
            breakdown.net_salary
        );
        assert_eq!(breakdown.net_salary, dec!(1.00));
    }

    #[test]
    fn net_can_go_negative() {
        let emp = employee(dec!(100.00), dec!(0.00));
        let adjustments = vec![
            adjustment(&emp, AdjustmentType::Advance, dec!(80.00)),
            adjustment(&emp, AdjustmentType::Deduction, dec!(40.00)),
        ];
        let breakdown = SalaryBreakdown::compute(&emp, &adjustments);
        assert_eq!(breakdown.net_salary, dec!(-20.00));
    }

    #[test]
    fn amounts_must_be_positive_cents() {
        assert_eq!(positive_amount(dec!(12.5)).unwrap().to_string(), "12.50");
        assert_eq!(positive_amount(dec!(7)).unwrap().to_string(), "7.00");
        assert_eq!(positive_amount(dec!(3.100)).unwrap().to_string(), "3.10");
        for bad in [dec!(0), dec!(-1.00), dec!(0.001), dec!(10.555)] {
            assert!(matches!(positive_amount(bad), Err(AppError::Validation(_))));
        }
    }
}
