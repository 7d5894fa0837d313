use axum::{
    extract::{Json, Path},
    http::StatusCode,
};
use contracts::system::users::{ChangePasswordDto, CreateUserDto, UpdateUserDto, User};
use serde_json::json;

use crate::system::auth::extractor::CurrentUser;
use crate::system::users::service::{self as user_service, UserError};

fn status_for(e: &UserError) -> StatusCode {
    match e {
        UserError::NotFound => StatusCode::NOT_FOUND,
        UserError::UsernameTaken(_) => StatusCode::CONFLICT,
        UserError::Invalid(_) | UserError::WrongPassword => StatusCode::BAD_REQUEST,
        UserError::PermissionDenied => StatusCode::FORBIDDEN,
        UserError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(action: &'static str) -> impl Fn(UserError) -> StatusCode {
    move |e| {
        let status = status_for(&e);
        if status.is_server_error() {
            tracing::error!("Failed to {}: {}", action, e);
        } else {
            tracing::warn!("Rejected {}: {}", action, e);
        }
        status
    }
}

/// GET /api/system/users
pub async fn list_users() -> Result<Json<Vec<User>>, StatusCode> {
    user_service::list_all().await.map(Json).map_err(|e| {
        tracing::error!("Failed to list users: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// GET /api/system/users/:id
pub async fn get_user(Path(id): Path<String>) -> Result<Json<User>, StatusCode> {
    user_service::get_by_id(&id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// POST /api/system/users
pub async fn create_user(
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<CreateUserDto>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let id = user_service::create(dto, Some(claims.sub))
        .await
        .map_err(reject("create user"))?;

    Ok(Json(json!({ "id": id })))
}

/// PUT /api/system/users/:id
pub async fn update_user(
    Path(id): Path<String>,
    Json(mut dto): Json<UpdateUserDto>,
) -> Result<StatusCode, StatusCode> {
    dto.id = id;
    user_service::update(dto).await.map_err(reject("update user"))?;

    Ok(StatusCode::OK)
}

/// DELETE /api/system/users/:id
pub async fn delete_user(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    if claims.sub == id {
        return Err(StatusCode::BAD_REQUEST);
    }

    match user_service::delete(&id).await {
        Ok(true) => Ok(StatusCode::OK),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to delete user {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/system/users/:id/change-password
pub async fn change_password(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    Json(mut dto): Json<ChangePasswordDto>,
) -> Result<StatusCode, StatusCode> {
    dto.user_id = id;
    user_service::change_password(dto, &claims.sub)
        .await
        .map_err(reject("change password"))?;

    Ok(StatusCode::OK)
}
