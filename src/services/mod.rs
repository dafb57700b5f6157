pub mod payroll;
pub mod salary;
