//! Employee Store
//!
//! Durable storage of employees and their dependants.
//!
//! # Invariants
//! - `empId` is unique and never rewritten after creation.
//! - Dependants only exist while their owner does; replacing them is
//!   all-or-nothing.
//! - A non-null `manager` names an existing employee and never closes a
//!   cycle. Deleting a manager clears the reference on its reports.

pub mod hierarchy;
pub mod memory;
pub mod mysql;

pub use memory::MemoryEmployeeStore;
pub use mysql::MySqlEmployeeStore;

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{Dependant, EmployeePatch, EmployeeRecord, NewEmployee};
use crate::utils::validation::FieldError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("{field} '{value}' already exists")]
    DuplicateKey { field: &'static str, value: String },

    #[error("employee '{0}' not found")]
    NotFound(String),

    #[error("{field}: {reason}")]
    Integrity { field: &'static str, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl StoreError {
    pub fn duplicate_emp_id(emp_id: &str) -> Self {
        StoreError::DuplicateKey {
            field: "empId",
            value: emp_id.to_string(),
        }
    }
}

impl From<Vec<FieldError>> for StoreError {
    fn from(errors: Vec<FieldError>) -> Self {
        StoreError::Validation(errors)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Employee Store contract. Every operation addresses employees by `empId`
/// except [`EmployeeStore::dependants_of`], which reads dependant rows by
/// their owner's surrogate id.
#[allow(async_fn_in_trait)]
pub trait EmployeeStore {
    /// Insert the employee and its dependants in one unit of work.
    async fn create_employee(&self, new: NewEmployee) -> StoreResult<EmployeeRecord>;

    /// Employee with dependants and the resolved manager summary.
    async fn get_employee(&self, emp_id: &str) -> StoreResult<EmployeeRecord>;

    /// All employees in insertion order, each with its dependants.
    async fn list_employees(&self) -> StoreResult<Vec<EmployeeRecord>>;

    /// Apply a partial update. A supplied dependant list replaces the
    /// current one inside the same unit of work.
    async fn update_employee(&self, emp_id: &str, patch: EmployeePatch)
    -> StoreResult<EmployeeRecord>;

    /// Destroy every dependant of the employee, then create `dependants`.
    async fn replace_dependants(
        &self,
        emp_id: &str,
        dependants: Vec<Dependant>,
    ) -> StoreResult<Vec<Dependant>>;

    /// Delete dependants, clear `manager` on direct reports, delete the
    /// employee.
    async fn delete_employee(&self, emp_id: &str) -> StoreResult<()>;

    async fn count_employees(&self) -> StoreResult<u64>;

    /// Dependant rows owned by the given surrogate id.
    async fn dependants_of(&self, employee_id: u64) -> StoreResult<Vec<Dependant>>;

    /// `None` reinstates the employee.
    async fn set_relieving_date(
        &self,
        emp_id: &str,
        date: Option<NaiveDate>,
    ) -> StoreResult<EmployeeRecord> {
        self.update_employee(emp_id, EmployeePatch::relieving(date))
            .await
    }
}
