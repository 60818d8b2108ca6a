use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};

use common::channel::http::{FetchRequest, FetchResponse};
use common::channel::ChannelError;

use crate::http_server::ProviderState;

pub async fn handler(
    State(state): State<ProviderState>,
    Json(req): Json<FetchRequest>,
) -> Result<impl IntoResponse, FetchError> {
    let units = state
        .channel()
        .fetch(&req.address, req.access.as_ref())
        .await?;
    tracing::debug!(address = %req.address, units = units.len(), "fetch");

    Ok((http::StatusCode::OK, Json(FetchResponse { units })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Fetch failed: {0}")]
    Channel(#[from] ChannelError),
}

impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        match self {
            FetchError::Channel(e) => {
                tracing::error!(error = %e, "fetch failed");
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to fetch: {}", e),
                )
                    .into_response()
            }
        }
    }
}
