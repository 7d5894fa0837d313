use anyhow::{Context, Result};
use contracts::domain::a001_client::aggregate::{Client, ClientId};
use contracts::domain::a002_service_task::aggregate::{
    PendingServiceTask, ServiceTask, ServiceTaskId, TaskStatus,
};
use contracts::domain::common::AggregateId;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::domain::a001_client::repository as client_repository;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_service_task")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub client_id: String,
    pub salesperson_id: String,
    pub revenue: f64,
    pub comparison_flag: String,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub responded_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "client_repository::Entity",
        from = "Column::ClientId",
        to = "client_repository::Column::Id"
    )]
    Client,
}

impl Related<client_repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ServiceTask {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self> {
        Ok(ServiceTask {
            id: ServiceTaskId::from_string(&m.id).map_err(|e| anyhow::anyhow!(e))?,
            client_id: ClientId::from_string(&m.client_id).map_err(|e| anyhow::anyhow!(e))?,
            salesperson_id: m.salesperson_id,
            revenue: m.revenue,
            comparison_flag: m.comparison_flag,
            status: m.status.parse::<TaskStatus>().map_err(|e| anyhow::anyhow!(e))?,
            created_at: m.created_at,
            responded_at: m.responded_at,
        })
    }
}

pub async fn insert<C: ConnectionTrait>(db: &C, task: &ServiceTask) -> Result<()> {
    let active_model = ActiveModel {
        id: Set(task.id.as_string()),
        client_id: Set(task.client_id.as_string()),
        salesperson_id: Set(task.salesperson_id.clone()),
        revenue: Set(task.revenue),
        comparison_flag: Set(task.comparison_flag.clone()),
        status: Set(task.status.code().to_string()),
        created_at: Set(task.created_at),
        responded_at: Set(task.responded_at),
    };
    Entity::insert(active_model)
        .exec_without_returning(db)
        .await
        .context("Failed to insert service task")?;
    Ok(())
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: &ServiceTaskId) -> Result<Option<ServiceTask>> {
    let model = Entity::find_by_id(id.as_string()).one(db).await?;
    model.map(ServiceTask::try_from).transpose()
}

/// Persist the salesperson's answer
pub async fn save_response<C: ConnectionTrait>(db: &C, task: &ServiceTask) -> Result<()> {
    let active = ActiveModel {
        id: Set(task.id.as_string()),
        status: Set(task.status.code().to_string()),
        responded_at: Set(task.responded_at),
        ..Default::default()
    };
    Entity::update(active)
        .exec(db)
        .await
        .with_context(|| format!("Failed to update service task {}", task.id.as_string()))?;
    Ok(())
}

/// PENDING tasks of a salesperson with their clients, newest first
pub async fn list_pending_for_salesperson<C: ConnectionTrait>(
    db: &C,
    salesperson_id: &str,
) -> Result<Vec<PendingServiceTask>> {
    let rows = Entity::find()
        .find_also_related(client_repository::Entity)
        .filter(Column::SalespersonId.eq(salesperson_id))
        .filter(Column::Status.eq(TaskStatus::Pending.code()))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await
        .context("Failed to load pending service tasks")?;

    let mut pending = Vec::with_capacity(rows.len());
    for (task, client) in rows {
        let client = client
            .ok_or_else(|| anyhow::anyhow!("Service task {} has no client", task.id))?;
        pending.push(PendingServiceTask::new(
            ServiceTask::try_from(task)?,
            Client::try_from(client)?,
        ));
    }
    Ok(pending)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::shared::data::db;
    use crate::system::users::repository::tests::insert_user;
    use contracts::domain::a001_client::aggregate::ClientUpsert;
    use contracts::domain::a002_service_task::aggregate::{AttentionReason, NewServiceTask};
    use contracts::system::users::UserRole;
    use sea_orm::DatabaseConnection;

    pub(crate) async fn seed_task(
        conn: &DatabaseConnection,
        tax_id: &str,
        salesperson_id: &str,
        revenue: f64,
        flag: &str,
    ) -> ServiceTask {
        let client = client_repository::upsert(
            conn,
            &ClientUpsert {
                tax_id: tax_id.into(),
                legal_name: format!("CLIENT {}", tax_id),
                municipality: "CAMPINAS".into(),
                credit_status: "OK".into(),
            },
        )
        .await
        .unwrap();
        let task = ServiceTask::new_pending(
            NewServiceTask {
                salesperson_id: salesperson_id.into(),
                revenue,
                comparison_flag: flag.into(),
            },
            client.id,
        );
        insert(conn, &task).await.unwrap();
        task
    }

    #[tokio::test]
    async fn test_pending_list_is_scoped_to_owner_and_status() {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        let djalma = insert_user(&conn, "DJALMA", UserRole::Vendedor, true).await;
        let maria = insert_user(&conn, "MARIA", UserRole::Vendedor, true).await;

        let first = seed_task(&conn, "111", &djalma.id, 0.0, "VER").await;
        let mut answered = seed_task(&conn, "222", &djalma.id, 0.0, "").await;
        seed_task(&conn, "333", &maria.id, 0.0, "").await;

        answered.respond(TaskStatus::CannotServe).unwrap();
        save_response(&conn, &answered).await.unwrap();

        let pending = list_pending_for_salesperson(&conn, &djalma.id).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].task.id, first.id);
        assert_eq!(pending[0].client.tax_id, "111");
        assert_eq!(pending[0].attention_reason, Some(AttentionReason::OutsideRegion));
    }

    #[tokio::test]
    async fn test_save_response_round_trip() {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        let djalma = insert_user(&conn, "DJALMA", UserRole::Vendedor, true).await;
        let mut task = seed_task(&conn, "111", &djalma.id, 12.5, "").await;

        task.respond(TaskStatus::ClosedAccount).unwrap();
        save_response(&conn, &task).await.unwrap();

        let stored = get_by_id(&conn, &task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::ClosedAccount);
        assert!(stored.responded_at.is_some());
        assert_eq!(stored.revenue, 12.5);
    }
}
