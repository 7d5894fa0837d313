use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

/// One spreadsheet line: a task joined with its client and salesperson
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub salesperson: String,
    pub tax_id: String,
    pub legal_name: String,
    pub municipality: String,
    pub revenue: f64,
    pub comparison_flag: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

pub async fn load_report_rows<C: ConnectionTrait>(db: &C) -> Result<Vec<ReportRow>> {
    let sql = r#"
        SELECT
            u.username AS salesperson,
            c.tax_id,
            c.legal_name,
            c.municipality,
            t.revenue,
            t.comparison_flag,
            t.status,
            t.created_at,
            t.responded_at
        FROM a002_service_task t
        JOIN a001_client c ON c.id = t.client_id
        JOIN sys_users u ON u.id = t.salesperson_id
        ORDER BY u.username ASC, t.created_at ASC
    "#;

    let rows = db
        .query_all(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
        .await
        .context("Failed to load service tasks for report")?;

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        result.push(ReportRow {
            salesperson: row.try_get("", "salesperson")?,
            tax_id: row.try_get("", "tax_id")?,
            legal_name: row.try_get("", "legal_name")?,
            municipality: row.try_get("", "municipality")?,
            revenue: row.try_get("", "revenue")?,
            comparison_flag: row.try_get("", "comparison_flag")?,
            status: row.try_get("", "status")?,
            created_at: row.try_get("", "created_at")?,
            responded_at: row.try_get("", "responded_at")?,
        });
    }

    Ok(result)
}
