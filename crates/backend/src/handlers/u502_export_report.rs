use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::shared::data::db::get_connection;
use crate::usecases::u502_export_report::{export_service_tasks, REPORT_CONTENT_TYPE, REPORT_FILE_NAME};

/// GET /api/reports/service-tasks
pub async fn download() -> Result<impl IntoResponse, StatusCode> {
    let buffer = export_service_tasks(get_connection()).await.map_err(|e| {
        tracing::error!("Failed to generate report: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let disposition = format!("attachment; filename=\"{}\"", REPORT_FILE_NAME);
    Ok((
        [
            (header::CONTENT_TYPE, REPORT_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
