use contracts::domain::a002_service_task::aggregate::{
    PendingServiceTask, ServiceTask, ServiceTaskId, TaskStatus,
};
use contracts::domain::common::AggregateId;
use sea_orm::ConnectionTrait;
use thiserror::Error;

use super::repository;

#[derive(Debug, Error)]
pub enum ServiceTaskError {
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Service task not found or not assigned to you")]
    NotFoundOrNotOwned,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Parse an answer status; PENDING is not an answer
pub fn parse_response_status(raw: &str) -> Result<TaskStatus, ServiceTaskError> {
    raw.parse::<TaskStatus>()
        .ok()
        .filter(TaskStatus::is_response)
        .ok_or_else(|| ServiceTaskError::InvalidStatus(raw.to_string()))
}

pub async fn list_pending<C: ConnectionTrait>(
    db: &C,
    salesperson_id: &str,
) -> anyhow::Result<Vec<PendingServiceTask>> {
    repository::list_pending_for_salesperson(db, salesperson_id).await
}

/// Record the salesperson's answer on one of their own tasks
pub async fn update_status<C: ConnectionTrait>(
    db: &C,
    task_id: &str,
    salesperson_id: &str,
    raw_status: &str,
) -> Result<ServiceTask, ServiceTaskError> {
    let status = parse_response_status(raw_status)?;

    // A malformed id cannot match any task
    let id = ServiceTaskId::from_string(task_id).map_err(|_| ServiceTaskError::NotFoundOrNotOwned)?;

    let mut task = repository::get_by_id(db, &id)
        .await?
        .filter(|t| t.is_owned_by(salesperson_id))
        .ok_or(ServiceTaskError::NotFoundOrNotOwned)?;

    task.respond(status).map_err(ServiceTaskError::InvalidStatus)?;
    repository::save_response(db, &task).await?;

    tracing::info!(
        "Service task {} answered {} by {}",
        task.id.as_string(),
        task.status,
        salesperson_id
    );
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a002_service_task::repository::tests::seed_task;
    use crate::shared::data::db;
    use crate::system::users::repository::tests::insert_user;
    use contracts::system::users::UserRole;

    #[test]
    fn test_parse_response_status() {
        assert_eq!(parse_response_status("WILL_SERVE").unwrap(), TaskStatus::WillServe);
        assert_eq!(
            parse_response_status("NAO_CONSIGO_ATENDER").unwrap(),
            TaskStatus::CannotServe
        );
        assert!(matches!(
            parse_response_status("PENDING"),
            Err(ServiceTaskError::InvalidStatus(_))
        ));
        assert!(matches!(
            parse_response_status("DONE"),
            Err(ServiceTaskError::InvalidStatus(_))
        ));
    }

    #[tokio::test]
    async fn test_owner_can_answer() {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        let djalma = insert_user(&conn, "DJALMA", UserRole::Vendedor, true).await;
        let task = seed_task(&conn, "111", &djalma.id, 0.0, "").await;

        let updated = update_status(&conn, &task.id.as_string(), &djalma.id, "WILL_SERVE")
            .await
            .unwrap();

        assert_eq!(updated.status, TaskStatus::WillServe);
        assert!(updated.responded_at.is_some());
        assert!(list_pending(&conn, &djalma.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_salesperson_is_rejected() {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        let djalma = insert_user(&conn, "DJALMA", UserRole::Vendedor, true).await;
        let maria = insert_user(&conn, "MARIA", UserRole::Vendedor, true).await;
        let task = seed_task(&conn, "111", &djalma.id, 0.0, "").await;

        let err = update_status(&conn, &task.id.as_string(), &maria.id, "CANNOT_SERVE")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceTaskError::NotFoundOrNotOwned));

        let pending = list_pending(&conn, &djalma.id).await.unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids() {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        let djalma = insert_user(&conn, "DJALMA", UserRole::Vendedor, true).await;

        let unknown = ServiceTaskId::new_v4().as_string();
        for id in [unknown.as_str(), "not-a-uuid"] {
            let err = update_status(&conn, id, &djalma.id, "CLOSED_ACCOUNT")
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceTaskError::NotFoundOrNotOwned));
        }
    }

    #[tokio::test]
    async fn test_invalid_status_checked_first() {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        let err = update_status(&conn, "whatever", "u-1", "PENDING")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceTaskError::InvalidStatus(_)));
    }
}
