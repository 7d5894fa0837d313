use anyhow::{Context, Result};
use contracts::system::users::UserRole;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalespersonRef {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCountRow {
    pub salesperson_id: String,
    pub status: String,
    pub count: i64,
}

/// Every VENDEDOR account, active or not, ordered by username
pub async fn list_salespeople<C: ConnectionTrait>(db: &C) -> Result<Vec<SalespersonRef>> {
    let rows = db
        .query_all(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT id, username FROM sys_users WHERE role = ? ORDER BY username",
            [UserRole::Vendedor.code().into()],
        ))
        .await
        .context("Failed to load salespeople")?;

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        result.push(SalespersonRef {
            id: row.try_get("", "id")?,
            username: row.try_get("", "username")?,
        });
    }
    Ok(result)
}

pub async fn count_by_salesperson_and_status<C: ConnectionTrait>(
    db: &C,
) -> Result<Vec<StatusCountRow>> {
    let sql = r#"
        SELECT salesperson_id, status, COUNT(*) AS count
        FROM a002_service_task
        GROUP BY salesperson_id, status
    "#;

    let rows = db
        .query_all(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
        .await
        .context("Failed to count service tasks")?;

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        result.push(StatusCountRow {
            salesperson_id: row.try_get("", "salesperson_id")?,
            status: row.try_get("", "status")?,
            count: row.try_get("", "count")?,
        });
    }
    Ok(result)
}
