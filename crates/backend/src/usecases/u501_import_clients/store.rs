use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use contracts::domain::a001_client::aggregate::ClientUpsert;
use contracts::domain::a002_service_task::aggregate::{NewServiceTask, ServiceTask, ServiceTaskId};
use contracts::system::users::User;
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::domain::{a001_client, a002_service_task};
use crate::system::users::repository as users_repository;

/// Salesperson usernames mapped to user ids, loaded once per import
#[derive(Debug, Clone, Default)]
pub struct SalespersonDirectory {
    by_username: HashMap<String, String>,
}

impl SalespersonDirectory {
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            by_username: users.into_iter().map(|u| (u.username, u.id)).collect(),
        }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            by_username: pairs
                .into_iter()
                .map(|(name, id)| (name.to_string(), id.to_string()))
                .collect(),
        }
    }

    /// Exact username match
    pub fn resolve(&self, username: &str) -> Option<&str> {
        self.by_username.get(username).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_username.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_username.is_empty()
    }
}

/// Storage used by the import pipeline
#[async_trait]
pub trait ImportStore: Send + Sync {
    async fn salesperson_directory(&self) -> Result<SalespersonDirectory>;

    /// Upsert the client by tax id, then insert a PENDING task for it.
    /// Both writes succeed or neither does.
    async fn persist_row(&self, client: &ClientUpsert, task: &NewServiceTask) -> Result<ServiceTaskId>;
}

pub struct SeaOrmImportStore<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SeaOrmImportStore<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ImportStore for SeaOrmImportStore<'_> {
    async fn salesperson_directory(&self) -> Result<SalespersonDirectory> {
        let salespeople = users_repository::list_active_salespeople(self.db).await?;
        Ok(SalespersonDirectory::from_users(salespeople))
    }

    async fn persist_row(&self, client: &ClientUpsert, task: &NewServiceTask) -> Result<ServiceTaskId> {
        let txn = self.db.begin().await?;

        let client = a001_client::repository::upsert(&txn, client).await?;
        let task = ServiceTask::new_pending(task.clone(), client.id);
        a002_service_task::repository::insert(&txn, &task).await?;

        txn.commit().await?;
        Ok(task.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db;
    use crate::system::users::repository::tests::insert_user;
    use contracts::system::users::UserRole;
    use sea_orm::EntityTrait;

    fn client(name: &str) -> ClientUpsert {
        ClientUpsert {
            tax_id: "11.111.111/0001-11".into(),
            legal_name: name.into(),
            municipality: "CAMPINAS".into(),
            credit_status: "OK".into(),
        }
    }

    fn task(salesperson_id: &str) -> NewServiceTask {
        NewServiceTask {
            salesperson_id: salesperson_id.into(),
            revenue: 0.0,
            comparison_flag: "VER".into(),
        }
    }

    #[tokio::test]
    async fn test_directory_holds_active_salespeople() {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        let djalma = insert_user(&conn, "DJALMA", UserRole::Vendedor, true).await;
        insert_user(&conn, "admin", UserRole::Admin, true).await;
        insert_user(&conn, "GONE", UserRole::Vendedor, false).await;

        let directory = SeaOrmImportStore::new(&conn)
            .salesperson_directory()
            .await
            .unwrap();

        assert_eq!(directory.len(), 1);
        assert_eq!(directory.resolve("DJALMA"), Some(djalma.id.as_str()));
        assert_eq!(directory.resolve("admin"), None);
    }

    #[tokio::test]
    async fn test_same_tax_id_twice_gives_one_client_two_tasks() {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        let djalma = insert_user(&conn, "DJALMA", UserRole::Vendedor, true).await;
        let store = SeaOrmImportStore::new(&conn);

        let first = store.persist_row(&client("ACME"), &task(&djalma.id)).await.unwrap();
        let second = store
            .persist_row(&client("ACME LTDA"), &task(&djalma.id))
            .await
            .unwrap();
        assert_ne!(first, second);

        let clients = a001_client::repository::Entity::find().all(&conn).await.unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].legal_name, "ACME LTDA");

        let tasks = a002_service_task::repository::Entity::find().all(&conn).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.status == "PENDING" && t.client_id == clients[0].id));
    }

    #[tokio::test]
    async fn test_failed_task_insert_rolls_back_client() {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        let store = SeaOrmImportStore::new(&conn);

        // unknown salesperson id violates the foreign key
        let result = store.persist_row(&client("ACME"), &task("no-such-user")).await;
        assert!(result.is_err());

        let clients = a001_client::repository::Entity::find().all(&conn).await.unwrap();
        assert!(clients.is_empty());
    }
}
