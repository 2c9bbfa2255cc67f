use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Delete handler
///
/// The requested name is validated against the storage root by the remover;
/// anything that resolves outside it is rejected before disk is touched.
#[tracing::instrument(skip(state, body), fields(operation = "delete_file"))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<DeleteRequest>,
) -> Result<Json<DeleteResponse>, HttpAppError> {
    state.store.remove(&body.file_name).await?;

    Ok(Json(DeleteResponse {
        success: true,
        message: "File deleted successfully".to_string(),
    }))
}
