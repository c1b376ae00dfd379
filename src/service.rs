//! Record Service
//!
//! Turns store results into caller-facing outcomes. Client errors carry an
//! actionable message; storage failures are logged here and leave the
//! process as a generic 500.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::model::{Dependant, EmployeePatch, EmployeeRecord, EmployeeStatus, NewEmployee};
use crate::store::{EmployeeStore, StoreError};
use crate::utils::validation::FieldError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong, contact the system admin";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Employee with {field} '{value}' already exists")]
    Duplicate { field: &'static str, value: String },

    #[error("Invalid {field}: {reason}")]
    Integrity { field: &'static str, reason: String },

    #[error("Employee not found")]
    NotFound,

    #[error("Something went wrong, contact the system admin")]
    Internal,
}

impl ServiceError {
    pub fn invalid(field: &str, reason: &str) -> Self {
        ServiceError::Validation(vec![FieldError::new(field, reason)])
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(errors) => ServiceError::Validation(errors),
            StoreError::DuplicateKey { field, value } => ServiceError::Duplicate { field, value },
            StoreError::Integrity { field, reason } => ServiceError::Integrity { field, reason },
            StoreError::NotFound(emp_id) => {
                warn!(emp_id = %emp_id, "Employee not found");
                ServiceError::NotFound
            }
            StoreError::Storage(e) => {
                error!(error = %e, "Employee store failure");
                ServiceError::Internal
            }
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_)
            | ServiceError::Duplicate { .. }
            | ServiceError::Integrity { .. } => StatusCode::BAD_REQUEST,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let body = match self {
            ServiceError::Validation(errors) => json!({ "message": message, "errors": errors }),
            ServiceError::Duplicate { field, .. } | ServiceError::Integrity { field, .. } => {
                json!({ "message": message, "field": field })
            }
            ServiceError::NotFound => json!({ "message": message }),
            ServiceError::Internal => json!({ "message": INTERNAL_ERROR_MESSAGE }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Request-facing wrapper over an [`EmployeeStore`].
pub struct RecordService<S> {
    store: S,
}

impl<S: EmployeeStore> RecordService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create(&self, new: NewEmployee) -> ServiceResult<EmployeeRecord> {
        Ok(self.store.create_employee(new).await?)
    }

    pub async fn get(&self, emp_id: &str) -> ServiceResult<EmployeeRecord> {
        Ok(self.store.get_employee(emp_id).await?)
    }

    /// All employees, optionally narrowed to one derived status.
    pub async fn list(&self, status: Option<&str>) -> ServiceResult<Vec<EmployeeRecord>> {
        let status = status
            .map(|s| {
                s.parse::<EmployeeStatus>()
                    .map_err(|_| ServiceError::invalid("status", "must be ACTIVE or RELIEVED"))
            })
            .transpose()?;

        let mut employees = self.store.list_employees().await?;
        if let Some(status) = status {
            employees.retain(|e| e.status == status);
        }
        Ok(employees)
    }

    pub async fn update(&self, emp_id: &str, patch: EmployeePatch) -> ServiceResult<EmployeeRecord> {
        Ok(self.store.update_employee(emp_id, patch).await?)
    }

    pub async fn replace_dependants(
        &self,
        emp_id: &str,
        dependants: Vec<Dependant>,
    ) -> ServiceResult<Vec<Dependant>> {
        Ok(self.store.replace_dependants(emp_id, dependants).await?)
    }

    pub async fn set_relieving_date(
        &self,
        emp_id: &str,
        date: Option<Option<NaiveDate>>,
    ) -> ServiceResult<EmployeeRecord> {
        let date = date
            .ok_or_else(|| ServiceError::invalid("relievingDate", "relievingDate is required"))?;
        Ok(self.store.set_relieving_date(emp_id, date).await?)
    }

    pub async fn delete(&self, emp_id: &str) -> ServiceResult<()> {
        Ok(self.store.delete_employee(emp_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEmployeeStore;
    use actix_web::body::to_bytes;

    async fn body_of(err: ServiceError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn validation_lists_every_field() {
        let err = ServiceError::from(StoreError::Validation(vec![
            FieldError::new("firstName", "firstName is required"),
            FieldError::new("personalEmail", "must be a valid email address"),
        ]));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "firstName");
        assert_eq!(body["errors"][1]["reason"], "must be a valid email address");
    }

    #[actix_web::test]
    async fn duplicate_names_the_field() {
        let err = ServiceError::from(StoreError::duplicate_emp_id("EMP100"));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "empId");
        assert_eq!(body["message"], "Employee with empId 'EMP100' already exists");
    }

    #[actix_web::test]
    async fn not_found_is_message_only() {
        let (status, body) = body_of(StoreError::NotFound("X".into()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Employee not found" }));
    }

    #[actix_web::test]
    async fn storage_failures_do_not_leak_detail() {
        let err = ServiceError::from(StoreError::Storage(sqlx::Error::PoolTimedOut));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": INTERNAL_ERROR_MESSAGE }));
    }

    #[actix_web::test]
    async fn list_filters_by_status() {
        let service = RecordService::new(MemoryEmployeeStore::new());
        for emp_id in ["EMP1", "EMP2"] {
            let mut new = NewEmployee {
                emp_id: emp_id.into(),
                ..Default::default()
            };
            new.profile.first_name = "Ann".into();
            new.profile.last_name = "Lee".into();
            new.profile.mobile_number = "555".into();
            new.profile.personal_email = "ann@mail.com".into();
            service.create(new).await.unwrap();
        }
        service
            .set_relieving_date("EMP2", Some(NaiveDate::from_ymd_opt(2025, 1, 31)))
            .await
            .unwrap();

        let relieved = service.list(Some("relieved")).await.unwrap();
        assert_eq!(relieved.len(), 1);
        assert_eq!(relieved[0].emp_id(), "EMP2");
        assert_eq!(service.list(None).await.unwrap().len(), 2);
        assert!(matches!(
            service.list(Some("retired")).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[actix_web::test]
    async fn relieving_date_must_be_supplied() {
        let service = RecordService::new(MemoryEmployeeStore::new());
        match service.set_relieving_date("EMP1", None).await.unwrap_err() {
            ServiceError::Validation(errors) => assert_eq!(errors[0].field, "relievingDate"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
