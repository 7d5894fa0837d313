use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use contracts::usecases::u501_import_clients::request::ColumnMapping;
use contracts::usecases::u501_import_clients::response::{ImportReport, UploadResponse};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::shared::data::db::get_connection;
use crate::usecases::u501_import_clients::{self, parser, ImportError, SeaOrmImportStore};

struct UploadParts {
    file: Option<Vec<u8>>,
    mapping: Option<String>,
}

async fn read_parts(multipart: &mut Multipart) -> Result<UploadParts, ImportError> {
    let mut parts = UploadParts {
        file: None,
        mapping: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ImportError::Upload(e.to_string()))?
    {
        match field.name() {
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ImportError::Upload(e.to_string()))?;
                parts.file = Some(bytes.to_vec());
            }
            Some("mapping") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ImportError::Upload(e.to_string()))?;
                parts.mapping = Some(text);
            }
            _ => {}
        }
    }

    Ok(parts)
}

/// Client exports run well past axum's 2 MB default
pub fn body_limit(max_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_bytes)
}

async fn run_upload(
    db: &DatabaseConnection,
    multipart: &mut Multipart,
) -> Result<ImportReport, ImportError> {
    let parts = read_parts(multipart).await?;
    let file = parts.file.ok_or(ImportError::MissingFile)?;

    let mapping_json = parts
        .mapping
        .ok_or_else(|| ImportError::InvalidMapping("mapping part is missing".to_string()))?;
    let mapping: ColumnMapping = serde_json::from_str(&mapping_json)
        .map_err(|e| ImportError::InvalidMapping(e.to_string()))?;

    let text = parser::decode_upload(&file)?;
    let store = SeaOrmImportStore::new(db);
    u501_import_clients::execute(&store, text, &mapping).await
}

/// POST /api/admin/upload
pub async fn upload(multipart: Multipart) -> Response {
    upload_into(get_connection(), multipart).await
}

async fn upload_into(db: &DatabaseConnection, mut multipart: Multipart) -> Response {
    match run_upload(db, &mut multipart).await {
        Ok(report) => (StatusCode::OK, Json(UploadResponse::from(report))).into_response(),
        Err(e) if e.is_bad_request() => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": e.to_string() })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Client import failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to process the spreadsheet.",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
