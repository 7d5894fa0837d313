use axum::{http::StatusCode, Json};
use contracts::dashboards::d400_salesperson_summary::SalespersonSummaryResponse;

use crate::dashboards::d400_salesperson_summary::service;
use crate::shared::data::db::get_connection;

/// GET /api/dashboard/summary
pub async fn get_summary() -> Result<Json<SalespersonSummaryResponse>, StatusCode> {
    match service::get_summary(get_connection()).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to build dashboard summary: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
