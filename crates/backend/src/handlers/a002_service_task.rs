use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a002_service_task::aggregate::{
    PendingServiceTask, ServiceTask, UpdateStatusRequest,
};
use serde_json::json;

use crate::domain::a002_service_task::service::{self, ServiceTaskError};
use crate::shared::data::db::get_connection;
use crate::system::auth::extractor::CurrentUser;

/// GET /api/service-tasks/pending
pub async fn list_pending(
    user: CurrentUser,
) -> Result<Json<Vec<PendingServiceTask>>, StatusCode> {
    match service::list_pending(get_connection(), user.user_id()).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to list pending service tasks: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// PATCH /api/service-tasks/:id
pub async fn update_status(
    user: CurrentUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ServiceTask>, (StatusCode, Json<serde_json::Value>)> {
    match service::update_status(get_connection(), &id, user.user_id(), &request.status).await {
        Ok(task) => Ok(Json(task)),
        Err(e) => {
            let status = match &e {
                ServiceTaskError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
                ServiceTaskError::NotFoundOrNotOwned => StatusCode::FORBIDDEN,
                ServiceTaskError::Storage(err) => {
                    tracing::error!("Failed to update service task {}: {:#}", id, err);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            Err((status, Json(json!({ "error": e.to_string() }))))
        }
    }
}
