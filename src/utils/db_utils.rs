use chrono::NaiveDate;
use sqlx::MySqlConnection;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Date(NaiveDate),
    NullString,
    NullDate,
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::String(value)
    }
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(SqlValue::NullString, SqlValue::String)
    }
}

impl From<Option<NaiveDate>> for SqlValue {
    fn from(value: Option<NaiveDate>) -> Self {
        value.map_or(SqlValue::NullDate, SqlValue::Date)
    }
}

/// A column assignment produced by applying a patch. Column names are
/// compile-time constants, never taken from request input.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue {
    pub column: &'static str,
    pub value: SqlValue,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
pub fn build_update_sql(
    table: &str,
    changes: &[ColumnValue],
    id_column: &str,
    id_value: u64,
) -> Option<SqlUpdate> {
    if changes.is_empty() {
        return None;
    }

    // Build SET clause
    let set_clause = changes
        .iter()
        .map(|c| format!("{} = ?", c.column))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values: Vec<SqlValue> = changes.iter().map(|c| c.value.clone()).collect();

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Some(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(
    conn: &mut MySqlConnection,
    update: SqlUpdate,
) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::NullString => query.bind(None::<String>),
            SqlValue::NullDate => query.bind(None::<NaiveDate>),
        };
    }

    let result = query.execute(conn).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_set_clause_in_change_order() {
        let changes = vec![
            ColumnValue {
                column: "designation",
                value: SqlValue::from("Lead".to_string()),
            },
            ColumnValue {
                column: "relieving_date",
                value: SqlValue::from(None::<NaiveDate>),
            },
        ];

        let update = build_update_sql("employees", &changes, "id", 7).unwrap();
        assert_eq!(
            update.sql,
            "UPDATE employees SET designation = ?, relieving_date = ? WHERE id = ?"
        );
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("Lead".into()),
                SqlValue::NullDate,
                SqlValue::U64(7),
            ]
        );
    }

    #[test]
    fn no_changes_means_no_statement() {
        assert!(build_update_sql("employees", &[], "id", 1).is_none());
    }
}
