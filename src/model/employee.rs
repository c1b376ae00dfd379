use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use super::dependant::{Dependant, validate_dependants};
use super::serde_helpers;
use crate::utils::db_utils::{ColumnValue, SqlValue};
use crate::utils::validation::{FieldError, Violations};

/// Every employee attribute except the two identities (`id`, `empId`).
/// Missing keys deserialize to defaults so that absent required fields show
/// up as validation errors rather than parse failures.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeProfile {
    #[schema(example = "Ann")]
    pub first_name: String,
    #[schema(nullable = true)]
    pub middle_name: Option<String>,
    #[schema(example = "Lee")]
    pub last_name: String,

    #[schema(example = "Engineering", nullable = true)]
    pub business_unit: Option<String>,
    #[serde(deserialize_with = "serde_helpers::date")]
    #[schema(example = "2023-01-15", format = "date", value_type = Option<String>)]
    pub date_of_joining_full_time: Option<NaiveDate>,
    #[serde(deserialize_with = "serde_helpers::date")]
    #[schema(format = "date", value_type = Option<String>)]
    pub date_of_joining_internship: Option<NaiveDate>,
    /// Null while the employee is active.
    #[serde(deserialize_with = "serde_helpers::date")]
    #[schema(format = "date", value_type = Option<String>)]
    pub relieving_date: Option<NaiveDate>,
    #[schema(example = "Software Engineer", nullable = true)]
    pub designation: Option<String>,

    #[serde(deserialize_with = "serde_helpers::date")]
    #[schema(example = "1990-05-20", format = "date", value_type = Option<String>)]
    pub date_of_birth: Option<NaiveDate>,
    #[schema(example = "9876543210")]
    pub mobile_number: String,
    #[schema(example = "ann.lee@personal.com", format = "email")]
    pub personal_email: String,
    #[schema(example = "ann.lee@company.com", format = "email", nullable = true)]
    pub company_email: Option<String>,

    pub permanent_address: Option<String>,
    pub correspondence_address: Option<String>,

    #[schema(example = "O+", nullable = true)]
    pub blood_group: Option<String>,
    #[schema(example = "Married", nullable = true)]
    pub marital_status: Option<String>,
    #[serde(deserialize_with = "serde_helpers::date")]
    #[schema(format = "date", value_type = Option<String>)]
    pub anniversary_date: Option<NaiveDate>,

    pub bank_name: Option<String>,
    pub name_as_on_bank_account: Option<String>,
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub pan_number: Option<String>,
    pub aadhaar_number: Option<String>,

    /// `empId` of this employee's manager. Blank reads as no manager.
    #[serde(deserialize_with = "serde_helpers::blank_as_none")]
    #[schema(example = "EMP002", nullable = true)]
    pub manager: Option<String>,
}

impl EmployeeProfile {
    /// A blank `manager` means the employee has none.
    pub fn clear_blank_manager(&mut self) {
        if self.manager.as_deref().is_some_and(|m| m.trim().is_empty()) {
            self.manager = None;
        }
    }

    pub fn validate(&self) -> Violations {
        let mut v = Violations::new();
        v.require("firstName", &self.first_name);
        v.require("lastName", &self.last_name);
        v.require("mobileNumber", &self.mobile_number);
        v.require_email("personalEmail", &self.personal_email);
        v.optional_email("companyEmail", self.company_email.as_deref());
        v
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum EmployeeStatus {
    Active,
    Relieved,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "EMP100")]
    pub emp_id: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub profile: EmployeeProfile,
}

impl Employee {
    /// Any relieving date, past or future, marks the employee as relieved.
    pub fn status(&self) -> EmployeeStatus {
        if self.profile.relieving_date.is_some() {
            EmployeeStatus::Relieved
        } else {
            EmployeeStatus::Active
        }
    }
}

/// Name fields of the employee a `manager` reference resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagerSummary {
    #[schema(example = "Sarah")]
    pub first_name: String,
    #[schema(example = "Wilson")]
    pub last_name: String,
    #[schema(example = "EMP002")]
    pub emp_id: String,
}

/// Employee as returned to callers: the row, its derived status, its
/// dependants and, on single lookups, the resolved manager.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    #[serde(flatten)]
    pub employee: Employee,
    pub status: EmployeeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_details: Option<ManagerSummary>,
    pub dependants: Vec<Dependant>,
}

impl EmployeeRecord {
    pub fn new(
        employee: Employee,
        dependants: Vec<Dependant>,
        manager_details: Option<ManagerSummary>,
    ) -> Self {
        Self {
            status: employee.status(),
            employee,
            manager_details,
            dependants,
        }
    }

    pub fn emp_id(&self) -> &str {
        &self.employee.emp_id
    }
}

/// Create payload: identity, attributes and the initial dependant set.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NewEmployee {
    #[schema(example = "EMP100")]
    pub emp_id: String,
    #[serde(flatten)]
    pub profile: EmployeeProfile,
    pub dependants: Vec<Dependant>,
}

impl NewEmployee {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Violations::new();
        v.require("empId", &self.emp_id);
        v.extend(self.profile.validate());
        v.extend(validate_dependants(&self.dependants));
        v.into_result()
    }
}

/// Partial update. For required attributes `None` means "unchanged"; for
/// nullable ones the outer `None` means "unchanged" and `Some(None)` clears.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePatch {
    /// Accepted only when equal to the addressed employee's `empId`.
    pub emp_id: Option<String>,
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub middle_name: Option<Option<String>>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub business_unit: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option_date")]
    #[schema(format = "date", value_type = Option<String>)]
    pub date_of_joining_full_time: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option_date")]
    #[schema(format = "date", value_type = Option<String>)]
    pub date_of_joining_internship: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option_date")]
    #[schema(format = "date", value_type = Option<String>)]
    pub relieving_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub designation: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option_date")]
    #[schema(format = "date", value_type = Option<String>)]
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub mobile_number: Option<String>,
    pub personal_email: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub company_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub permanent_address: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub correspondence_address: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub blood_group: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub marital_status: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option_date")]
    #[schema(format = "date", value_type = Option<String>)]
    pub anniversary_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub bank_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub name_as_on_bank_account: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub account_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub ifsc_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub pan_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option")]
    #[schema(value_type = Option<String>)]
    pub aadhaar_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "serde_helpers::double_option_blank")]
    #[schema(value_type = Option<String>)]
    pub manager: Option<Option<String>>,
    /// When present, replaces the whole dependant set.
    pub dependants: Option<Vec<Dependant>>,
}

impl EmployeePatch {
    pub fn relieving(date: Option<NaiveDate>) -> Self {
        Self {
            relieving_date: Some(date),
            ..Self::default()
        }
    }

    pub fn check_emp_id(&self, current: &str) -> Violations {
        let mut v = Violations::new();
        if let Some(emp_id) = &self.emp_id
            && emp_id != current
        {
            v.push("empId", "empId cannot be changed");
        }
        v
    }

    /// Writes every supplied attribute into `profile` and returns the
    /// touched columns with their new values.
    pub fn apply(&self, p: &mut EmployeeProfile) -> Vec<ColumnValue> {
        let mut changes = Vec::new();
        let c = &mut changes;
        assign(&mut p.first_name, &self.first_name, "first_name", c);
        assign(&mut p.middle_name, &self.middle_name, "middle_name", c);
        assign(&mut p.last_name, &self.last_name, "last_name", c);
        assign(&mut p.business_unit, &self.business_unit, "business_unit", c);
        assign(
            &mut p.date_of_joining_full_time,
            &self.date_of_joining_full_time,
            "date_of_joining_full_time",
            c,
        );
        assign(
            &mut p.date_of_joining_internship,
            &self.date_of_joining_internship,
            "date_of_joining_internship",
            c,
        );
        assign(&mut p.relieving_date, &self.relieving_date, "relieving_date", c);
        assign(&mut p.designation, &self.designation, "designation", c);
        assign(&mut p.date_of_birth, &self.date_of_birth, "date_of_birth", c);
        assign(&mut p.mobile_number, &self.mobile_number, "mobile_number", c);
        assign(&mut p.personal_email, &self.personal_email, "personal_email", c);
        assign(&mut p.company_email, &self.company_email, "company_email", c);
        assign(
            &mut p.permanent_address,
            &self.permanent_address,
            "permanent_address",
            c,
        );
        assign(
            &mut p.correspondence_address,
            &self.correspondence_address,
            "correspondence_address",
            c,
        );
        assign(&mut p.blood_group, &self.blood_group, "blood_group", c);
        assign(&mut p.marital_status, &self.marital_status, "marital_status", c);
        assign(&mut p.anniversary_date, &self.anniversary_date, "anniversary_date", c);
        assign(&mut p.bank_name, &self.bank_name, "bank_name", c);
        assign(
            &mut p.name_as_on_bank_account,
            &self.name_as_on_bank_account,
            "name_as_on_bank_account",
            c,
        );
        assign(&mut p.account_number, &self.account_number, "account_number", c);
        assign(&mut p.ifsc_code, &self.ifsc_code, "ifsc_code", c);
        assign(&mut p.pan_number, &self.pan_number, "pan_number", c);
        assign(&mut p.aadhaar_number, &self.aadhaar_number, "aadhaar_number", c);
        let manager = self
            .manager
            .clone()
            .map(|m| m.filter(|v| !v.trim().is_empty()));
        assign(&mut p.manager, &manager, "manager", c);
        changes
    }

    pub fn touches_manager(&self) -> bool {
        self.manager.is_some()
    }
}

fn assign<T>(slot: &mut T, value: &Option<T>, column: &'static str, changes: &mut Vec<ColumnValue>)
where
    T: Clone + Into<SqlValue>,
{
    if let Some(value) = value {
        *slot = value.clone();
        changes.push(ColumnValue {
            column,
            value: value.clone().into(),
        });
    }
}

/// `PATCH` body: only the relieving date, which must be present (a date or
/// `null` to reinstate).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelievingDateUpdate {
    #[serde(default, deserialize_with = "serde_helpers::double_option_date")]
    #[schema(example = "2025-03-31", format = "date", value_type = Option<String>)]
    pub relieving_date: Option<Option<NaiveDate>>,
}
