use anyhow::Result;
use contracts::dashboards::d400_salesperson_summary::{
    SalespersonStats, SalespersonSummaryResponse, StatusCounts,
};
use contracts::domain::a002_service_task::aggregate::TaskStatus;
use sea_orm::ConnectionTrait;
use std::collections::HashMap;

use super::repository::{self, SalespersonRef, StatusCountRow};

pub async fn get_summary<C: ConnectionTrait>(db: &C) -> Result<SalespersonSummaryResponse> {
    let salespeople = repository::list_salespeople(db).await?;
    let counts = repository::count_by_salesperson_and_status(db).await?;
    Ok(build_summary(salespeople, &counts))
}

/// One row per salesperson (zero when no tasks) plus column totals
pub fn build_summary(
    salespeople: Vec<SalespersonRef>,
    counts: &[StatusCountRow],
) -> SalespersonSummaryResponse {
    let mut by_salesperson: HashMap<&str, StatusCounts> = HashMap::new();
    for row in counts {
        match row.status.parse::<TaskStatus>() {
            Ok(status) => by_salesperson
                .entry(row.salesperson_id.as_str())
                .or_default()
                .add(status, row.count.max(0) as u64),
            Err(e) => tracing::warn!("Ignoring {} task(s): {}", row.count, e),
        }
    }

    let mut summary = StatusCounts::default();
    let salespeople: Vec<SalespersonStats> = salespeople
        .into_iter()
        .map(|s| {
            let counts = by_salesperson.get(s.id.as_str()).copied().unwrap_or_default();
            summary.merge(&counts);
            SalespersonStats {
                id: s.id,
                username: s.username,
                counts,
            }
        })
        .collect();

    SalespersonSummaryResponse {
        salespeople,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a002_service_task::repository::{self as task_repository, tests::seed_task};
    use crate::shared::data::db;
    use crate::system::users::repository::tests::insert_user;
    use contracts::system::users::UserRole;

    fn sp(id: &str, username: &str) -> SalespersonRef {
        SalespersonRef {
            id: id.into(),
            username: username.into(),
        }
    }

    fn count(id: &str, status: &str, count: i64) -> StatusCountRow {
        StatusCountRow {
            salesperson_id: id.into(),
            status: status.into(),
            count,
        }
    }

    #[test]
    fn test_build_summary() {
        let response = build_summary(
            vec![sp("a", "ANA"), sp("b", "BIA")],
            &[
                count("a", "PENDING", 2),
                count("a", "CLOSED_ACCOUNT", 1),
                count("a", "WILL_SERVE", 3),
                count("ghost", "PENDING", 7),
            ],
        );

        assert_eq!(response.salespeople.len(), 2);
        let ana = &response.salespeople[0].counts;
        assert_eq!((ana.pending, ana.will_serve, ana.closed_account), (2, 3, 1));
        assert_eq!(ana.total, 6);
        assert_eq!(response.salespeople[1].counts, StatusCounts::default());
        assert_eq!(response.summary.total, 6);
        assert_eq!(response.summary.pending, 2);
    }

    #[tokio::test]
    async fn test_summary_from_database() {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        let maria = insert_user(&conn, "MARIA", UserRole::Vendedor, true).await;
        let djalma = insert_user(&conn, "DJALMA", UserRole::Vendedor, true).await;
        insert_user(&conn, "admin", UserRole::Admin, true).await;

        seed_task(&conn, "111", &djalma.id, 0.0, "").await;
        let mut answered = seed_task(&conn, "222", &djalma.id, 0.0, "").await;
        answered.respond(TaskStatus::CannotServe).unwrap();
        task_repository::save_response(&conn, &answered).await.unwrap();

        let response = get_summary(&conn).await.unwrap();
        let names: Vec<_> = response.salespeople.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(names, vec!["DJALMA", "MARIA"]);
        assert_eq!(response.salespeople[0].counts.pending, 1);
        assert_eq!(response.salespeople[0].counts.cannot_serve, 1);
        assert_eq!(response.salespeople[1].id, maria.id);
        assert_eq!(response.salespeople[1].counts.total, 0);
        assert_eq!(response.summary.total, 2);
    }
}
