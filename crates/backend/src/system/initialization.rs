use anyhow::Result;
use contracts::system::users::{CreateUserDto, UserRole};

use crate::shared::config::{AuthConfig, SeedConfig};
use crate::shared::data::db::get_connection;
use crate::system::users::{repository, service};

const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Ensure an ADMIN account exists (create `admin` when there is none)
pub async fn ensure_admin_user_exists(auth: &AuthConfig) -> Result<()> {
    let conn = get_connection();
    if repository::count_by_role(conn, UserRole::Admin).await? > 0 {
        return Ok(());
    }

    if repository::get_by_username(conn, DEFAULT_ADMIN_USERNAME)
        .await?
        .is_some()
    {
        tracing::warn!(
            "No ADMIN account exists and username '{}' is taken by another role",
            DEFAULT_ADMIN_USERNAME
        );
        return Ok(());
    }

    tracing::info!("No admin found. Creating default admin user...");

    let admin_dto = CreateUserDto {
        username: DEFAULT_ADMIN_USERNAME.to_string(),
        password: auth.default_admin_password.clone(),
        email: None,
        full_name: Some("Administrator".to_string()),
        role: UserRole::Admin,
    };

    let admin_id = service::create(admin_dto, None).await?;

    tracing::warn!("Default admin user created (id {})", admin_id);
    tracing::warn!("Username: {}. Change the configured default password.", DEFAULT_ADMIN_USERNAME);

    Ok(())
}

/// Create configured salesperson accounts that do not exist yet
pub async fn seed_salespeople(seed: &SeedConfig) -> Result<()> {
    let conn = get_connection();
    let mut created = 0usize;

    for username in seed.salespeople.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if repository::get_by_username(conn, username).await?.is_some() {
            continue;
        }

        let dto = CreateUserDto {
            username: username.to_string(),
            password: seed.salesperson_password.clone(),
            email: None,
            full_name: None,
            role: UserRole::Vendedor,
        };
        service::create(dto, None).await?;
        created += 1;
    }

    if created > 0 {
        tracing::info!("Seeded {} salesperson account(s)", created);
    }

    Ok(())
}
