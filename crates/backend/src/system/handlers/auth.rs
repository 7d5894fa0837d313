use axum::{extract::Json, http::StatusCode};
use contracts::system::auth::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, UserInfo};
use contracts::system::users::User;

use crate::shared::data::db::get_connection;
use crate::system::auth::{extractor::CurrentUser, jwt, refresh_tokens};
use crate::system::users::service as user_service;

fn internal(context: &'static str) -> impl Fn(anyhow::Error) -> StatusCode {
    move |e| {
        tracing::error!("{}: {}", context, e);
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// POST /api/system/auth/login
pub async fn login(Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>, StatusCode> {
    // Inactive accounts are rejected like bad credentials
    let user = user_service::verify_credentials(&request.username, &request.password)
        .await
        .map_err(|e| {
            tracing::warn!("Login of {} rejected: {}", request.username, e);
            StatusCode::UNAUTHORIZED
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let access_token = jwt::generate_access_token(&user.id, &user.username, user.role)
        .await
        .map_err(internal("Failed to sign access token"))?;

    let refresh_token = jwt::generate_refresh_token();
    refresh_tokens::store(
        get_connection(),
        &user.id,
        &refresh_token,
        &jwt::calculate_refresh_token_expiration(),
    )
    .await
    .map_err(internal("Failed to store refresh token"))?;

    tracing::info!("User {} logged in as {}", user.username, user.role);

    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
        user: user_info(user),
    }))
}

/// POST /api/system/auth/refresh
pub async fn refresh(Json(request): Json<RefreshRequest>) -> Result<Json<RefreshResponse>, StatusCode> {
    let user_id = refresh_tokens::find_user_id(get_connection(), &request.refresh_token)
        .await
        .map_err(internal("Failed to look up refresh token"))?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user = user_service::get_by_id(&user_id)
        .await
        .map_err(internal("Failed to load user"))?
        .filter(|u| u.is_active)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let access_token = jwt::generate_access_token(&user.id, &user.username, user.role)
        .await
        .map_err(internal("Failed to sign access token"))?;

    Ok(Json(RefreshResponse { access_token }))
}

/// POST /api/system/auth/logout
pub async fn logout(Json(request): Json<RefreshRequest>) -> Result<StatusCode, StatusCode> {
    refresh_tokens::revoke(get_connection(), &request.refresh_token)
        .await
        .map_err(internal("Failed to revoke refresh token"))?;

    Ok(StatusCode::OK)
}

/// GET /api/system/auth/me
pub async fn current_user(CurrentUser(claims): CurrentUser) -> Result<Json<UserInfo>, StatusCode> {
    let user = user_service::get_by_id(&claims.sub)
        .await
        .map_err(internal("Failed to load user"))?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(user_info(user)))
}

fn user_info(user: User) -> UserInfo {
    UserInfo {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
        email: user.email,
        role: user.role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::system::users::UserRole;

    #[test]
    fn test_user_info_carries_role() {
        let user = User {
            id: "u1".into(),
            username: "DJALMA".into(),
            email: None,
            full_name: Some("Djalma".into()),
            role: UserRole::Vendedor,
            is_active: true,
            created_at: String::new(),
            updated_at: String::new(),
            last_login_at: None,
            created_by: None,
        };
        let info = user_info(user);
        assert_eq!(info.role, UserRole::Vendedor);
        assert_eq!(info.username, "DJALMA");
    }
}
