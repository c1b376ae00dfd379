pub mod dependant;
pub mod employee;
mod serde_helpers;

pub use dependant::{Dependant, OwnedDependant};
pub use employee::{
    Employee, EmployeePatch, EmployeeProfile, EmployeeRecord, EmployeeStatus, ManagerSummary,
    NewEmployee, RelievingDateUpdate,
};
