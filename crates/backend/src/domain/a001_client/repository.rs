use anyhow::{Context, Result};
use chrono::Utc;
use contracts::domain::a001_client::aggregate::{Client, ClientId, ClientUpsert};
use contracts::domain::common::{AggregateId, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_client")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub tax_id: String,
    pub legal_name: String,
    pub municipality: String,
    pub credit_status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::domain::a002_service_task::repository::Entity")]
    ServiceTasks,
}

impl Related<crate::domain::a002_service_task::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceTasks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Client {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self> {
        Ok(Client {
            id: ClientId::from_string(&m.id).map_err(|e| anyhow::anyhow!(e))?,
            tax_id: m.tax_id,
            legal_name: m.legal_name,
            municipality: m.municipality,
            credit_status: m.credit_status,
            metadata: EntityMetadata {
                created_at: m.created_at,
                updated_at: m.updated_at,
            },
        })
    }
}

fn to_active_model(client: &Client) -> ActiveModel {
    ActiveModel {
        id: Set(client.id.as_string()),
        tax_id: Set(client.tax_id.clone()),
        legal_name: Set(client.legal_name.clone()),
        municipality: Set(client.municipality.clone()),
        credit_status: Set(client.credit_status.clone()),
        created_at: Set(client.metadata.created_at),
        updated_at: Set(client.metadata.updated_at),
    }
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: &ClientId) -> Result<Option<Client>> {
    let model = Entity::find_by_id(id.as_string()).one(db).await?;
    model.map(Client::try_from).transpose()
}

pub async fn find_by_tax_id<C: ConnectionTrait>(db: &C, tax_id: &str) -> Result<Option<Client>> {
    let model = Entity::find()
        .filter(Column::TaxId.eq(tax_id))
        .one(db)
        .await
        .context("Failed to look up client by tax id")?;
    model.map(Client::try_from).transpose()
}

pub async fn insert<C: ConnectionTrait>(db: &C, client: &Client) -> Result<()> {
    Entity::insert(to_active_model(client))
        .exec_without_returning(db)
        .await
        .with_context(|| format!("Failed to insert client {}", client.tax_id))?;
    Ok(())
}

/// Overwrites the descriptive fields; tax id and creation time stay
pub async fn update<C: ConnectionTrait>(db: &C, client: &Client) -> Result<()> {
    let mut active = to_active_model(client);
    active.tax_id = sea_orm::ActiveValue::NotSet;
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.updated_at = Set(Utc::now());
    Entity::update(active)
        .exec(db)
        .await
        .with_context(|| format!("Failed to update client {}", client.tax_id))?;
    Ok(())
}

/// Create the client for this tax id or refresh the existing one
pub async fn upsert<C: ConnectionTrait>(db: &C, data: &ClientUpsert) -> Result<Client> {
    match find_by_tax_id(db, &data.tax_id).await? {
        Some(mut existing) => {
            existing.refresh(data);
            update(db, &existing).await?;
            Ok(existing)
        }
        None => {
            let client = Client::new_for_insert(data.clone());
            client.validate().map_err(|e| anyhow::anyhow!(e))?;
            insert(db, &client).await?;
            Ok(client)
        }
    }
}
