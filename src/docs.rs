use crate::api::employee::{DependantsResponse, EmployeeMutationResponse, EmployeeQuery};
use crate::model::{
    Dependant, Employee, EmployeePatch, EmployeeProfile, EmployeeRecord, EmployeeStatus,
    ManagerSummary, NewEmployee, RelievingDateUpdate,
};
use crate::utils::validation::FieldError;
use utoipa::OpenApi;
use utoipa::openapi::{self, server::Server};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Records API",
        version = "1.0.0",
        description = r#"
## Employee Records

Stores employees and the dependants declared against them.

### Key Features
- **Employees**
  - Create, list, view, update and delete employee profiles
  - Every route addresses an employee by its business id (`empId`)
  - Reporting line through `manager`, resolved to a summary on lookup
- **Dependants**
  - Created with the employee; an update carrying `dependants` replaces the whole set
  - Deleted together with their employee
- **Relieving**
  - `PATCH` sets or clears the relieving date; `status` is `RELIEVED` whenever one is set

Paths are relative to the server entry, which carries the configured
API prefix (`/api` by default).

### Response Format
- JSON, camelCase fields, dates as `YYYY-MM-DD`
- Client errors: `{ "message", "field" }` or `{ "message", "errors": [{ "field", "reason" }] }`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::set_relieving_date,
        crate::api::employee::replace_dependants,
        crate::api::employee::delete_employee
    ),
    components(
        schemas(
            Employee,
            EmployeeProfile,
            EmployeeRecord,
            EmployeeStatus,
            ManagerSummary,
            Dependant,
            NewEmployee,
            EmployeePatch,
            RelievingDateUpdate,
            EmployeeQuery,
            EmployeeMutationResponse,
            DependantsResponse,
            FieldError
        )
    ),
    tags(
        (name = "Employee", description = "Employee and dependant records"),
    )
)]
pub struct ApiDoc;

/// The OpenAPI document with its server entry set to the mounted prefix.
pub fn api_doc(api_prefix: &str) -> openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.servers = Some(vec![Server::new(api_prefix)]);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_entry_follows_the_prefix() {
        let doc = api_doc("/v1");
        let servers = doc.servers.unwrap();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].url, "/v1");
        assert!(doc.paths.paths.contains_key("/employees/{emp_id}"));
        assert!(doc.paths.paths.contains_key("/employees/{emp_id}/dependants"));
    }
}
