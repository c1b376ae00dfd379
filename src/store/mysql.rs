//! MySQL Employee Store.
//!
//! Every operation that writes more than one statement runs in a single
//! transaction; surrogate ids come from `AUTO_INCREMENT`.

use std::collections::HashMap;

use sqlx::{MySql, MySqlConnection, MySqlPool, QueryBuilder};
use tracing::{debug, info};

use super::hierarchy::{ManagerLookup, validate_manager};
use super::{EmployeeStore, StoreError, StoreResult};
use crate::model::dependant::validate_dependants;
use crate::model::{
    Dependant, Employee, EmployeePatch, EmployeeRecord, ManagerSummary, NewEmployee,
    OwnedDependant,
};
use crate::utils::db_utils::{build_update_sql, execute_update};

const EMPLOYEE_COLUMNS: &str = "id, emp_id, first_name, middle_name, last_name, business_unit,
    date_of_joining_full_time, date_of_joining_internship, relieving_date, designation,
    date_of_birth, mobile_number, personal_email, company_email, permanent_address,
    correspondence_address, blood_group, marital_status, anniversary_date, bank_name,
    name_as_on_bank_account, account_number, ifsc_code, pan_number, aadhaar_number, manager";

const INSERT_EMPLOYEE_SQL: &str = r#"
    INSERT INTO employees
    (emp_id, first_name, middle_name, last_name, business_unit,
     date_of_joining_full_time, date_of_joining_internship, relieving_date, designation,
     date_of_birth, mobile_number, personal_email, company_email, permanent_address,
     correspondence_address, blood_group, marital_status, anniversary_date, bank_name,
     name_as_on_bank_account, account_number, ifsc_code, pan_number, aadhaar_number, manager)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

#[derive(Clone)]
pub struct MySqlEmployeeStore {
    pool: MySqlPool,
}

impl MySqlEmployeeStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

struct ConnLookup<'a> {
    conn: &'a mut MySqlConnection,
}

impl ManagerLookup for ConnLookup<'_> {
    async fn manager_of(&mut self, emp_id: &str) -> StoreResult<Option<Option<String>>> {
        let manager =
            sqlx::query_scalar::<_, Option<String>>("SELECT manager FROM employees WHERE emp_id = ?")
                .bind(emp_id)
                .fetch_optional(&mut *self.conn)
                .await?;
        Ok(manager)
    }
}

/// `lock` takes a row lock for the rest of the transaction.
async fn fetch_employee(
    conn: &mut MySqlConnection,
    emp_id: &str,
    lock: bool,
) -> StoreResult<Option<Employee>> {
    let sql = format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE emp_id = ?{}",
        if lock { " FOR UPDATE" } else { "" }
    );
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(emp_id)
        .fetch_optional(conn)
        .await?;
    Ok(employee)
}

async fn fetch_dependants(
    conn: &mut MySqlConnection,
    employee_id: u64,
) -> StoreResult<Vec<Dependant>> {
    let dependants = sqlx::query_as::<_, Dependant>(
        "SELECT name, relationship, mobile_number FROM dependants WHERE employee_id = ? ORDER BY id",
    )
    .bind(employee_id)
    .fetch_all(conn)
    .await?;
    Ok(dependants)
}

async fn fetch_manager(
    conn: &mut MySqlConnection,
    emp_id: &str,
) -> StoreResult<Option<ManagerSummary>> {
    let manager = sqlx::query_as::<_, ManagerSummary>(
        "SELECT first_name, last_name, emp_id FROM employees WHERE emp_id = ?",
    )
    .bind(emp_id)
    .fetch_optional(conn)
    .await?;
    Ok(manager)
}

async fn load_record(conn: &mut MySqlConnection, emp_id: &str) -> StoreResult<EmployeeRecord> {
    let employee = fetch_employee(conn, emp_id, false)
        .await?
        .ok_or_else(|| StoreError::NotFound(emp_id.to_string()))?;
    let dependants = fetch_dependants(conn, employee.id).await?;
    let manager = match employee.profile.manager.as_deref() {
        Some(manager) => fetch_manager(conn, manager).await?,
        None => None,
    };
    Ok(EmployeeRecord::new(employee, dependants, manager))
}

async fn insert_employee(conn: &mut MySqlConnection, new: &NewEmployee) -> StoreResult<u64> {
    let p = &new.profile;
    let result = sqlx::query(INSERT_EMPLOYEE_SQL)
        .bind(&new.emp_id)
        .bind(&p.first_name)
        .bind(&p.middle_name)
        .bind(&p.last_name)
        .bind(&p.business_unit)
        .bind(p.date_of_joining_full_time)
        .bind(p.date_of_joining_internship)
        .bind(p.relieving_date)
        .bind(&p.designation)
        .bind(p.date_of_birth)
        .bind(&p.mobile_number)
        .bind(&p.personal_email)
        .bind(&p.company_email)
        .bind(&p.permanent_address)
        .bind(&p.correspondence_address)
        .bind(&p.blood_group)
        .bind(&p.marital_status)
        .bind(p.anniversary_date)
        .bind(&p.bank_name)
        .bind(&p.name_as_on_bank_account)
        .bind(&p.account_number)
        .bind(&p.ifsc_code)
        .bind(&p.pan_number)
        .bind(&p.aadhaar_number)
        .bind(&p.manager)
        .execute(conn)
        .await
        .map_err(|e| map_insert_error(e, &new.emp_id))?;
    Ok(result.last_insert_id())
}

/// A concurrent insert can still win the race past the existence check; the
/// unique index turns that into the same duplicate error.
fn map_insert_error(err: sqlx::Error, emp_id: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
    {
        return StoreError::duplicate_emp_id(emp_id);
    }
    StoreError::Storage(err)
}

async fn insert_dependants(
    conn: &mut MySqlConnection,
    employee_id: u64,
    dependants: &[Dependant],
) -> StoreResult<()> {
    if dependants.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::<MySql>::new(
        "INSERT INTO dependants (employee_id, name, relationship, mobile_number) ",
    );
    builder.push_values(dependants, |mut row, d| {
        row.push_bind(employee_id)
            .push_bind(&d.name)
            .push_bind(&d.relationship)
            .push_bind(&d.mobile_number);
    });
    builder.build().execute(conn).await?;
    Ok(())
}

async fn replace_dependants_in(
    conn: &mut MySqlConnection,
    employee_id: u64,
    dependants: &[Dependant],
) -> StoreResult<()> {
    let removed = sqlx::query("DELETE FROM dependants WHERE employee_id = ?")
        .bind(employee_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    insert_dependants(conn, employee_id, dependants).await?;
    debug!(
        employee_id,
        removed,
        created = dependants.len(),
        "Dependants replaced"
    );
    Ok(())
}

impl EmployeeStore for MySqlEmployeeStore {
    async fn create_employee(&self, mut new: NewEmployee) -> StoreResult<EmployeeRecord> {
        new.profile.clear_blank_manager();
        new.validate()?;

        let mut tx = self.pool.begin().await?;
        if fetch_employee(&mut tx, &new.emp_id, true).await?.is_some() {
            return Err(StoreError::duplicate_emp_id(&new.emp_id));
        }
        validate_manager(
            &mut ConnLookup { conn: &mut tx },
            &new.emp_id,
            new.profile.manager.as_deref(),
        )
        .await?;

        let id = insert_employee(&mut tx, &new).await?;
        insert_dependants(&mut tx, id, &new.dependants).await?;
        let record = load_record(&mut tx, &new.emp_id).await?;
        tx.commit().await?;

        info!(emp_id = %new.emp_id, id, dependants = new.dependants.len(), "Employee created");
        Ok(record)
    }

    async fn get_employee(&self, emp_id: &str) -> StoreResult<EmployeeRecord> {
        let mut conn = self.pool.acquire().await?;
        load_record(&mut conn, emp_id).await
    }

    async fn list_employees(&self) -> StoreResult<Vec<EmployeeRecord>> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&mut *conn)
            .await?;

        let rows = sqlx::query_as::<_, OwnedDependant>(
            "SELECT employee_id, name, relationship, mobile_number FROM dependants ORDER BY id",
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut by_owner: HashMap<u64, Vec<Dependant>> = HashMap::new();
        for row in rows {
            by_owner.entry(row.employee_id).or_default().push(row.dependant);
        }

        debug!(count = employees.len(), "Fetched employees");
        Ok(employees
            .into_iter()
            .map(|e| {
                let dependants = by_owner.remove(&e.id).unwrap_or_default();
                EmployeeRecord::new(e, dependants, None)
            })
            .collect())
    }

    async fn update_employee(
        &self,
        emp_id: &str,
        patch: EmployeePatch,
    ) -> StoreResult<EmployeeRecord> {
        let mut tx = self.pool.begin().await?;
        let current = fetch_employee(&mut tx, emp_id, true)
            .await?
            .ok_or_else(|| StoreError::NotFound(emp_id.to_string()))?;

        let mut profile = current.profile.clone();
        let changes = patch.apply(&mut profile);

        let mut violations = patch.check_emp_id(emp_id);
        violations.extend(profile.validate());
        if let Some(dependants) = &patch.dependants {
            violations.extend(validate_dependants(dependants));
        }
        violations.into_result()?;

        if patch.touches_manager() {
            validate_manager(
                &mut ConnLookup { conn: &mut tx },
                emp_id,
                profile.manager.as_deref(),
            )
            .await?;
        }

        if let Some(update) = build_update_sql("employees", &changes, "id", current.id) {
            debug!(sql = %update.sql, emp_id, "Updating employee");
            execute_update(&mut tx, update).await?;
        }
        if let Some(dependants) = &patch.dependants {
            replace_dependants_in(&mut tx, current.id, dependants).await?;
        }

        let record = load_record(&mut tx, emp_id).await?;
        tx.commit().await?;

        info!(emp_id, columns = changes.len(), "Employee updated");
        Ok(record)
    }

    async fn replace_dependants(
        &self,
        emp_id: &str,
        dependants: Vec<Dependant>,
    ) -> StoreResult<Vec<Dependant>> {
        let mut tx = self.pool.begin().await?;
        let employee = fetch_employee(&mut tx, emp_id, true)
            .await?
            .ok_or_else(|| StoreError::NotFound(emp_id.to_string()))?;
        validate_dependants(&dependants).into_result()?;

        replace_dependants_in(&mut tx, employee.id, &dependants).await?;
        let stored = fetch_dependants(&mut tx, employee.id).await?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn delete_employee(&self, emp_id: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let employee = fetch_employee(&mut tx, emp_id, true)
            .await?
            .ok_or_else(|| StoreError::NotFound(emp_id.to_string()))?;

        let dependants = sqlx::query("DELETE FROM dependants WHERE employee_id = ?")
            .bind(employee.id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let reports = sqlx::query("UPDATE employees SET manager = NULL WHERE manager = ?")
            .bind(emp_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(employee.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(emp_id, dependants, reports, "Employee deleted");
        Ok(())
    }

    async fn count_employees(&self) -> StoreResult<u64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.max(0) as u64)
    }

    async fn dependants_of(&self, employee_id: u64) -> StoreResult<Vec<Dependant>> {
        let mut conn = self.pool.acquire().await?;
        fetch_dependants(&mut conn, employee_id).await
    }
}

/// These run against a real server and only when `TEST_DATABASE_URL`
/// points at a scratch database.
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use sqlx::Executor;
    use sqlx::mysql::MySqlPoolOptions;

    async fn test_store() -> Option<MySqlEmployeeStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        // Strict mode turns an oversized value into an error instead of a
        // silent truncation.
        let pool = MySqlPoolOptions::new()
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET SESSION sql_mode = CONCAT(@@sql_mode, ',STRICT_ALL_TABLES')")
                        .await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        Some(MySqlEmployeeStore::new(pool))
    }

    fn unique_emp_id(tag: &str) -> String {
        format!("T{}-{tag}", Utc::now().timestamp_micros())
    }

    fn new_employee(emp_id: &str, dependants: Vec<Dependant>) -> NewEmployee {
        let mut new = NewEmployee {
            emp_id: emp_id.into(),
            dependants,
            ..Default::default()
        };
        new.profile.first_name = "Ann".into();
        new.profile.last_name = "Lee".into();
        new.profile.mobile_number = "555-0100".into();
        new.profile.personal_email = "ann@personal.com".into();
        new.profile.date_of_joining_full_time = NaiveDate::from_ymd_opt(2023, 1, 15);
        new
    }

    fn bob() -> Dependant {
        Dependant {
            name: "Bob Lee".into(),
            relationship: "spouse".into(),
            mobile_number: "555-0101".into(),
        }
    }

    #[actix_web::test]
    async fn employee_lifecycle() {
        let Some(store) = test_store().await else {
            return;
        };
        let emp_id = unique_emp_id("life");

        let created = store
            .create_employee(new_employee(&emp_id, vec![bob()]))
            .await
            .unwrap();
        let id = created.employee.id;
        assert_eq!(created.dependants, vec![bob()]);

        let listed = store.list_employees().await.unwrap();
        let mine = listed.iter().find(|r| r.emp_id() == emp_id).unwrap();
        assert_eq!(mine.dependants.len(), 1);

        let patch = EmployeePatch {
            designation: Some(Some("Lead".into())),
            dependants: Some(vec![]),
            ..Default::default()
        };
        let updated = store.update_employee(&emp_id, patch).await.unwrap();
        assert_eq!(updated.employee.profile.designation.as_deref(), Some("Lead"));
        assert!(updated.dependants.is_empty());

        let date = NaiveDate::from_ymd_opt(2025, 3, 31);
        let relieved = store.set_relieving_date(&emp_id, date).await.unwrap();
        assert_eq!(relieved.employee.profile.relieving_date, date);

        store.replace_dependants(&emp_id, vec![bob()]).await.unwrap();
        store.delete_employee(&emp_id).await.unwrap();
        assert!(matches!(
            store.get_employee(&emp_id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(store.dependants_of(id).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn duplicate_emp_id_is_rejected() {
        let Some(store) = test_store().await else {
            return;
        };
        let emp_id = unique_emp_id("dup");
        store
            .create_employee(new_employee(&emp_id, vec![]))
            .await
            .unwrap();

        let err = store
            .create_employee(new_employee(&emp_id, vec![bob()]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));

        let first = store.get_employee(&emp_id).await.unwrap();
        assert!(first.dependants.is_empty());
        store.delete_employee(&emp_id).await.unwrap();
    }

    #[actix_web::test]
    async fn deleting_a_manager_clears_reports() {
        let Some(store) = test_store().await else {
            return;
        };
        let boss = unique_emp_id("boss");
        let report = unique_emp_id("report");
        store
            .create_employee(new_employee(&boss, vec![]))
            .await
            .unwrap();
        let mut new = new_employee(&report, vec![]);
        new.profile.manager = Some(boss.clone());
        let created = store.create_employee(new).await.unwrap();
        assert_eq!(
            created.manager_details.map(|m| m.emp_id),
            Some(boss.clone())
        );

        store.delete_employee(&boss).await.unwrap();
        let orphan = store.get_employee(&report).await.unwrap();
        assert_eq!(orphan.employee.profile.manager, None);
        store.delete_employee(&report).await.unwrap();
    }

    /// Passes validation but overflows `dependants.name VARCHAR(255)`, so the
    /// insert fails inside the transaction.
    fn oversized() -> Dependant {
        Dependant {
            name: "x".repeat(300),
            relationship: "child".into(),
            mobile_number: "555-0102".into(),
        }
    }

    #[actix_web::test]
    async fn failed_dependant_insert_leaves_no_employee() {
        let Some(store) = test_store().await else {
            return;
        };
        let emp_id = unique_emp_id("atomic");
        let before = store.count_employees().await.unwrap();

        let err = store
            .create_employee(new_employee(&emp_id, vec![bob(), oversized()]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));

        assert!(matches!(
            store.get_employee(&emp_id).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.count_employees().await.unwrap(), before);
    }

    #[actix_web::test]
    async fn failed_replacement_keeps_previous_dependants() {
        let Some(store) = test_store().await else {
            return;
        };
        let emp_id = unique_emp_id("keep");
        store
            .create_employee(new_employee(&emp_id, vec![bob()]))
            .await
            .unwrap();

        let err = store
            .replace_dependants(&emp_id, vec![oversized()])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));

        let patch = EmployeePatch {
            designation: Some(Some("Lead".into())),
            dependants: Some(vec![oversized()]),
            ..Default::default()
        };
        assert!(store.update_employee(&emp_id, patch).await.is_err());

        let kept = store.get_employee(&emp_id).await.unwrap();
        assert_eq!(kept.dependants, vec![bob()]);
        assert_eq!(kept.employee.profile.designation, None);
        store.delete_employee(&emp_id).await.unwrap();
    }
}
