//! In-process Employee Store.
//!
//! Holds the whole dataset behind one async mutex. Each operation keeps the
//! lock for its full duration, so callers never observe a half-applied
//! write. Selected with `DATABASE_URL=memory` and used by the test suite.

use std::sync::Arc;

use futures::lock::Mutex;
use tracing::debug;

use super::hierarchy::{ManagerLookup, validate_manager};
use super::{EmployeeStore, StoreError, StoreResult};
use crate::model::dependant::validate_dependants;
use crate::model::{
    Dependant, Employee, EmployeePatch, EmployeeRecord, ManagerSummary, NewEmployee,
};

#[derive(Clone, Default)]
pub struct MemoryEmployeeStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    last_id: u64,
    employees: Vec<Employee>,
    dependants: Vec<(u64, Dependant)>,
}

impl MemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Inner {
    fn find(&self, emp_id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.emp_id == emp_id)
    }

    fn position(&self, emp_id: &str) -> StoreResult<usize> {
        self.employees
            .iter()
            .position(|e| e.emp_id == emp_id)
            .ok_or_else(|| StoreError::NotFound(emp_id.to_string()))
    }

    fn dependants_of(&self, employee_id: u64) -> Vec<Dependant> {
        self.dependants
            .iter()
            .filter(|(owner, _)| *owner == employee_id)
            .map(|(_, d)| d.clone())
            .collect()
    }

    fn replace_dependants(&mut self, employee_id: u64, dependants: Vec<Dependant>) {
        self.dependants.retain(|(owner, _)| *owner != employee_id);
        self.dependants
            .extend(dependants.into_iter().map(|d| (employee_id, d)));
    }

    fn record(&self, employee: &Employee, resolve_manager: bool) -> EmployeeRecord {
        let manager = if resolve_manager {
            employee
                .profile
                .manager
                .as_deref()
                .and_then(|m| self.find(m))
                .map(|m| ManagerSummary {
                    first_name: m.profile.first_name.clone(),
                    last_name: m.profile.last_name.clone(),
                    emp_id: m.emp_id.clone(),
                })
        } else {
            None
        };
        EmployeeRecord::new(employee.clone(), self.dependants_of(employee.id), manager)
    }
}

impl ManagerLookup for Inner {
    async fn manager_of(&mut self, emp_id: &str) -> StoreResult<Option<Option<String>>> {
        Ok(self.find(emp_id).map(|e| e.profile.manager.clone()))
    }
}

impl EmployeeStore for MemoryEmployeeStore {
    async fn create_employee(&self, mut new: NewEmployee) -> StoreResult<EmployeeRecord> {
        new.profile.clear_blank_manager();
        new.validate()?;

        let mut inner = self.inner.lock().await;
        if inner.find(&new.emp_id).is_some() {
            return Err(StoreError::duplicate_emp_id(&new.emp_id));
        }
        validate_manager(&mut *inner, &new.emp_id, new.profile.manager.as_deref()).await?;

        inner.last_id += 1;
        let employee = Employee {
            id: inner.last_id,
            emp_id: new.emp_id,
            profile: new.profile,
        };
        inner.replace_dependants(employee.id, new.dependants);
        inner.employees.push(employee.clone());

        debug!(emp_id = %employee.emp_id, id = employee.id, "Employee stored in memory");
        Ok(inner.record(&employee, true))
    }

    async fn get_employee(&self, emp_id: &str) -> StoreResult<EmployeeRecord> {
        let inner = self.inner.lock().await;
        let employee = inner
            .find(emp_id)
            .ok_or_else(|| StoreError::NotFound(emp_id.to_string()))?;
        Ok(inner.record(employee, true))
    }

    async fn list_employees(&self) -> StoreResult<Vec<EmployeeRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .employees
            .iter()
            .map(|e| inner.record(e, false))
            .collect())
    }

    async fn update_employee(
        &self,
        emp_id: &str,
        patch: EmployeePatch,
    ) -> StoreResult<EmployeeRecord> {
        let mut inner = self.inner.lock().await;
        let pos = inner.position(emp_id)?;

        let mut profile = inner.employees[pos].profile.clone();
        patch.apply(&mut profile);

        let mut violations = patch.check_emp_id(emp_id);
        violations.extend(profile.validate());
        if let Some(dependants) = &patch.dependants {
            violations.extend(validate_dependants(dependants));
        }
        violations.into_result()?;

        if patch.touches_manager() {
            validate_manager(&mut *inner, emp_id, profile.manager.as_deref()).await?;
        }

        let id = inner.employees[pos].id;
        inner.employees[pos].profile = profile;
        if let Some(dependants) = patch.dependants {
            inner.replace_dependants(id, dependants);
        }

        let employee = inner.employees[pos].clone();
        Ok(inner.record(&employee, true))
    }

    async fn replace_dependants(
        &self,
        emp_id: &str,
        dependants: Vec<Dependant>,
    ) -> StoreResult<Vec<Dependant>> {
        let mut inner = self.inner.lock().await;
        let pos = inner.position(emp_id)?;
        validate_dependants(&dependants).into_result()?;

        let id = inner.employees[pos].id;
        inner.replace_dependants(id, dependants);
        Ok(inner.dependants_of(id))
    }

    async fn delete_employee(&self, emp_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let pos = inner.position(emp_id)?;
        let id = inner.employees[pos].id;

        inner.dependants.retain(|(owner, _)| *owner != id);
        for report in inner
            .employees
            .iter_mut()
            .filter(|e| e.profile.manager.as_deref() == Some(emp_id))
        {
            report.profile.manager = None;
        }
        inner.employees.remove(pos);
        Ok(())
    }

    async fn count_employees(&self) -> StoreResult<u64> {
        Ok(self.inner.lock().await.employees.len() as u64)
    }

    async fn dependants_of(&self, employee_id: u64) -> StoreResult<Vec<Dependant>> {
        Ok(self.inner.lock().await.dependants_of(employee_id))
    }
}
