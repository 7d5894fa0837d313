use anyhow::Result;
use chrono::Utc;
use contracts::system::users::{ChangePasswordDto, CreateUserDto, UpdateUserDto, User};
use thiserror::Error;

use super::repository;
use crate::shared::data::db::get_connection;
use crate::system::auth::password;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,
    #[error("Username '{0}' already exists")]
    UsernameTaken(String),
    #[error("{0}")]
    Invalid(String),
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Invalid old password")]
    WrongPassword,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

fn validate_email(email: Option<&str>) -> Result<(), UserError> {
    match email.map(str::trim) {
        Some(e) if !e.is_empty() && !e.contains('@') => {
            Err(UserError::Invalid(format!("Invalid email '{}'", e)))
        }
        _ => Ok(()),
    }
}

fn validate_new_password(raw: &str) -> Result<(), UserError> {
    password::validate_password_strength(raw).map_err(|e| UserError::Invalid(e.to_string()))
}

/// Who may change whose password. Returns whether the old password must be checked.
fn password_change_policy(requester: &User, target_id: &str) -> Result<bool, UserError> {
    if requester.id == target_id {
        Ok(true)
    } else if requester.is_admin() {
        Ok(false)
    } else {
        Err(UserError::PermissionDenied)
    }
}

pub async fn create(dto: CreateUserDto, created_by: Option<String>) -> Result<String, UserError> {
    let username = dto.username.trim().to_string();
    if username.is_empty() {
        return Err(UserError::Invalid("Username cannot be empty".into()));
    }
    validate_email(dto.email.as_deref())?;
    validate_new_password(&dto.password)?;

    let conn = get_connection();
    if repository::get_by_username(conn, &username).await?.is_some() {
        return Err(UserError::UsernameTaken(username));
    }

    let password_hash = password::hash_password(&dto.password)?;
    let now = Utc::now().to_rfc3339();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username,
        email: dto.email,
        full_name: dto.full_name,
        role: dto.role,
        is_active: true,
        created_at: now.clone(),
        updated_at: now,
        last_login_at: None,
        created_by,
    };

    repository::create_with_password(conn, &user, &password_hash).await?;

    tracing::info!("User {} created with role {}", user.username, user.role);
    Ok(user.id)
}

pub async fn update(dto: UpdateUserDto) -> Result<(), UserError> {
    validate_email(dto.email.as_deref())?;

    let mut user = repository::get_by_id(&dto.id).await?.ok_or(UserError::NotFound)?;
    user.email = dto.email;
    user.full_name = dto.full_name;
    user.is_active = dto.is_active;
    user.role = dto.role;
    user.updated_at = Utc::now().to_rfc3339();

    repository::update(&user).await?;
    Ok(())
}

pub async fn delete(id: &str) -> Result<bool> {
    repository::delete(id).await
}

pub async fn get_by_id(id: &str) -> Result<Option<User>> {
    repository::get_by_id(id).await
}

pub async fn list_all() -> Result<Vec<User>> {
    repository::list_all().await
}

/// Users change their own password by giving the old one; admins reset anyone else's.
pub async fn change_password(dto: ChangePasswordDto, requester_id: &str) -> Result<(), UserError> {
    let requester = repository::get_by_id(requester_id).await?.ok_or(UserError::NotFound)?;
    let check_old = password_change_policy(&requester, &dto.user_id)?;

    repository::get_by_id(&dto.user_id).await?.ok_or(UserError::NotFound)?;
    validate_new_password(&dto.new_password)?;

    if check_old {
        let old = dto.old_password.as_deref().ok_or(UserError::WrongPassword)?;
        let current_hash = repository::get_password_hash(&dto.user_id)
            .await?
            .ok_or(UserError::WrongPassword)?;
        if !password::verify_password(old, &current_hash)? {
            return Err(UserError::WrongPassword);
        }
    }

    let new_hash = password::hash_password(&dto.new_password)?;
    repository::update_password(&dto.user_id, &new_hash).await?;

    tracing::info!("Password of user {} changed by {}", dto.user_id, requester.username);
    Ok(())
}

/// Verify user credentials (for login)
pub async fn verify_credentials(username: &str, password: &str) -> Result<Option<User>> {
    let user = match repository::get_by_username(get_connection(), username).await? {
        Some(u) => u,
        None => return Ok(None),
    };

    if !user.is_active {
        return Err(anyhow::anyhow!("User account is inactive"));
    }

    let password_hash = repository::get_password_hash(&user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Password hash not found"))?;

    if !password::verify_password(password, &password_hash)? {
        return Ok(None);
    }

    if let Err(e) = repository::update_last_login(&user.id).await {
        tracing::warn!("Failed to record login of {}: {}", user.username, e);
    }

    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::system::users::UserRole;

    fn user(id: &str, role: UserRole) -> User {
        User {
            id: id.into(),
            username: id.to_uppercase(),
            email: None,
            full_name: None,
            role,
            is_active: true,
            created_at: String::new(),
            updated_at: String::new(),
            last_login_at: None,
            created_by: None,
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email(None).is_ok());
        assert!(validate_email(Some("  ")).is_ok());
        assert!(validate_email(Some("vendas@empresa.com.br")).is_ok());
        assert!(matches!(validate_email(Some("vendas")), Err(UserError::Invalid(_))));
    }

    #[test]
    fn test_password_change_policy() {
        let admin = user("a1", UserRole::Admin);
        let seller = user("v1", UserRole::Vendedor);

        assert!(password_change_policy(&seller, "v1").unwrap());
        assert!(password_change_policy(&admin, "a1").unwrap());
        assert!(!password_change_policy(&admin, "v1").unwrap());
        assert!(matches!(
            password_change_policy(&seller, "a1"),
            Err(UserError::PermissionDenied)
        ));
    }

    #[test]
    fn test_short_password_is_invalid_input() {
        assert!(matches!(validate_new_password("12345"), Err(UserError::Invalid(_))));
        assert!(validate_new_password("123456").is_ok());
    }
}
