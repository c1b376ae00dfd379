use crate::{
    model::{
        Dependant, EmployeePatch, EmployeeRecord, NewEmployee, RelievingDateUpdate,
    },
    service::{RecordService, ServiceError},
    store::EmployeeStore,
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    /// Filter by derived status
    #[schema(example = "ACTIVE")]
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeMutationResponse {
    #[schema(example = "Employee created successfully")]
    pub message: String,
    pub employee: EmployeeRecord,
}

#[derive(Serialize, ToSchema)]
pub struct DependantsResponse {
    #[schema(example = "Dependants replaced successfully")]
    pub message: String,
    pub dependants: Vec<Dependant>,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/employees",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = EmployeeMutationResponse),
        (status = 400, description = "Validation failed, duplicate empId or unknown manager", body = Object, example = json!({
            "message": "Employee with empId 'EMP100' already exists",
            "field": "empId"
        })),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "message": "Something went wrong, contact the system admin"
        }))
    ),
    tag = "Employee"
)]
pub async fn create_employee<S: EmployeeStore>(
    service: web::Data<RecordService<S>>,
    payload: web::Json<NewEmployee>,
) -> Result<HttpResponse, ServiceError> {
    let employee = service.create(payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(EmployeeMutationResponse {
        message: "Employee created successfully".to_string(),
        employee,
    }))
}

#[utoipa::path(
    get,
    path = "/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "All employees with their dependants", body = [EmployeeRecord]),
        (status = 400, description = "Unknown status filter")
    ),
    tag = "Employee"
)]
pub async fn list_employees<S: EmployeeStore>(
    service: web::Data<RecordService<S>>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, ServiceError> {
    let employees = service.list(query.status.as_deref()).await?;
    debug!(count = employees.len(), status = ?query.status, "Listing employees");

    Ok(HttpResponse::Ok().json(employees))
}

/// Get Employee by empId
#[utoipa::path(
    get,
    path = "/employees/{emp_id}",
    params(
        ("emp_id", Path, description = "Employee business id")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeRecord),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn get_employee<S: EmployeeStore>(
    service: web::Data<RecordService<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let employee = service.get(&path).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Update Employee
///
/// Absent fields are left untouched. A `dependants` array replaces the
/// employee's whole dependant set.
#[utoipa::path(
    put,
    path = "/employees/{emp_id}",
    params(
        ("emp_id", Path, description = "Employee business id")
    ),
    request_body = EmployeePatch,
    responses(
        (status = 200, description = "Employee updated successfully", body = EmployeeMutationResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn update_employee<S: EmployeeStore>(
    service: web::Data<RecordService<S>>,
    path: web::Path<String>,
    body: web::Json<EmployeePatch>,
) -> Result<HttpResponse, ServiceError> {
    let employee = service.update(&path, body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(EmployeeMutationResponse {
        message: "Employee updated successfully".to_string(),
        employee,
    }))
}

/// Relieve (or reinstate) an employee
#[utoipa::path(
    patch,
    path = "/employees/{emp_id}",
    params(
        ("emp_id", Path, description = "Employee business id")
    ),
    request_body = RelievingDateUpdate,
    responses(
        (status = 200, description = "Relieving date updated", body = EmployeeRecord),
        (status = 400, description = "relievingDate missing"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
pub async fn set_relieving_date<S: EmployeeStore>(
    service: web::Data<RecordService<S>>,
    path: web::Path<String>,
    body: web::Json<RelievingDateUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let emp_id = path.into_inner();
    let employee = service
        .set_relieving_date(&emp_id, body.into_inner().relieving_date)
        .await?;
    info!(emp_id = %emp_id, status = %employee.status, "Relieving date changed");

    Ok(HttpResponse::Ok().json(employee))
}

/// Replace every dependant of an employee
#[utoipa::path(
    put,
    path = "/employees/{emp_id}/dependants",
    params(
        ("emp_id", Path, description = "Employee business id")
    ),
    request_body = [Dependant],
    responses(
        (status = 200, description = "Dependants replaced", body = DependantsResponse),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
pub async fn replace_dependants<S: EmployeeStore>(
    service: web::Data<RecordService<S>>,
    path: web::Path<String>,
    body: web::Json<Vec<Dependant>>,
) -> Result<HttpResponse, ServiceError> {
    let dependants = service
        .replace_dependants(&path, body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(DependantsResponse {
        message: "Dependants replaced successfully".to_string(),
        dependants,
    }))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/employees/{emp_id}",
    params(
        ("emp_id", Path, description = "Employee business id")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Employee and associated dependants deleted successfully"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error", body = Object)
    ),
    tag = "Employee"
)]
pub async fn delete_employee<S: EmployeeStore>(
    service: web::Data<RecordService<S>>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    service.delete(&path).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee and associated dependants deleted successfully"
    })))
}
