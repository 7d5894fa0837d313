use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use sha2::{Digest, Sha256};

/// Only the SHA-256 of a refresh token is ever persisted
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub async fn store<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    token: &str,
    expires_at: &str,
) -> Result<()> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO sys_refresh_tokens (id, user_id, token_hash, expires_at, created_at)
         VALUES (?, ?, ?, ?, ?)",
        [
            uuid::Uuid::new_v4().to_string().into(),
            user_id.to_string().into(),
            hash_token(token).into(),
            expires_at.to_string().into(),
            Utc::now().to_rfc3339().into(),
        ],
    ))
    .await
    .with_context(|| format!("Failed to store refresh token for user {}", user_id))?;

    Ok(())
}

/// Owner of a live token; None when unknown, expired or revoked.
pub async fn find_user_id<C: ConnectionTrait>(db: &C, token: &str) -> Result<Option<String>> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT user_id FROM sys_refresh_tokens
             WHERE token_hash = ? AND expires_at > ? AND revoked_at IS NULL",
            [hash_token(token).into(), Utc::now().to_rfc3339().into()],
        ))
        .await?;

    row.map(|r| r.try_get::<String>("", "user_id"))
        .transpose()
        .map_err(Into::into)
}

pub async fn revoke<C: ConnectionTrait>(db: &C, token: &str) -> Result<()> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_refresh_tokens SET revoked_at = ? WHERE token_hash = ? AND revoked_at IS NULL",
        [Utc::now().to_rfc3339().into(), hash_token(token).into()],
    ))
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db;
    use crate::system::users::repository::tests::insert_user;
    use contracts::system::users::UserRole;

    #[test]
    fn test_token_hash_is_stable_hex() {
        let a = hash_token("0b1c");
        assert_eq!(a, hash_token("0b1c"));
        assert_ne!(a, hash_token("0b1d"));
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_live_token_resolves_until_revoked() {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        let user = insert_user(&conn, "DJALMA", UserRole::Vendedor, true).await;
        let expires = (Utc::now() + chrono::Duration::days(1)).to_rfc3339();

        store(&conn, &user.id, "token-1", &expires).await.unwrap();
        assert_eq!(find_user_id(&conn, "token-1").await.unwrap(), Some(user.id.clone()));
        assert_eq!(find_user_id(&conn, "token-2").await.unwrap(), None);

        revoke(&conn, "token-1").await.unwrap();
        assert_eq!(find_user_id(&conn, "token-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_token_is_ignored() {
        let conn = db::connect("sqlite::memory:").await.unwrap();
        let user = insert_user(&conn, "admin", UserRole::Admin, true).await;
        let expired = (Utc::now() - chrono::Duration::minutes(5)).to_rfc3339();

        store(&conn, &user.id, "old", &expired).await.unwrap();
        assert_eq!(find_user_id(&conn, "old").await.unwrap(), None);
    }
}
