//! File upload handler.

use axum::{
    extract::{Multipart, State},
    Json,
};
use insights::UploadReceipt;

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// POST /api/v1/upload
///
/// Expects a multipart form with a `file` field.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadReceipt>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("file field has no file name".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let receipt = state.gateway.upload(&filename, bytes.to_vec()).await?;
        return Ok(Json(receipt));
    }

    Err(ApiError::BadRequest("missing multipart field 'file'".to_string()))
}
