use std::sync::Arc;

use axum::{
    extract::multipart::MultipartError,
    extract::{Multipart, State},
    Json,
};
use filebay_core::AppError;
use filebay_storage::{PlacedFile, StoreError};
use serde::Serialize;

use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(rename = "fileUrl")]
    pub file_url: String,
}

/// Upload handler
///
/// Accepts a single multipart field named `file`, validates it against the
/// upload policy, and streams it into the storage root. The body is never
/// buffered whole in memory; the placer enforces the byte ceiling mid-stream
/// and discards partial output on any failure, including client aborts.
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let mut placed: Option<PlacedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        HttpAppError::from(AppError::InvalidInput(format!(
            "Failed to read multipart body: {}",
            e
        )))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        if let Some(prev) = placed.take() {
            // Second `file` field: undo the first placement before rejecting.
            if let Err(e) = state.store.remove(&prev.stored_name).await {
                tracing::warn!(
                    error = %e,
                    stored_name = %prev.stored_name,
                    "failed to clean up after rejected multi-file upload"
                );
            }
            return Err(AppError::InvalidInput(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            )
            .into());
        }

        let original_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "file".to_string());
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let stream = Box::pin(futures::stream::unfold(field, |mut field| async move {
            match field.chunk().await {
                Ok(Some(chunk)) => Some((Ok(chunk), field)),
                Ok(None) => None,
                Err(e) => Some((Err(stream_read_error(e)), field)),
            }
        }));

        let placed_file = state
            .store
            .place(&original_name, &content_type, None, &state.policy, stream)
            .await?;
        placed = Some(placed_file);
    }

    let placed = placed
        .ok_or_else(|| HttpAppError::from(AppError::InvalidInput("No file provided".to_string())))?;

    Ok(Json(UploadResponse {
        success: true,
        file_url: state.store.public_url(&placed.stored_name),
    }))
}

/// Classify a multipart read failure. A body-limit overrun surfaces as a
/// `LengthLimitError` somewhere in the source chain; anything else is a
/// genuine transport failure.
fn stream_read_error(err: MultipartError) -> StoreError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = source {
        if e.downcast_ref::<http_body_util::LengthLimitError>().is_some() {
            return StoreError::BodyLimit;
        }
        source = e.source();
    }
    StoreError::UploadFailed(format!("failed to read upload stream: {}", err))
}
