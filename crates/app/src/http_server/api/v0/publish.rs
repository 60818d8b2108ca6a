use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};

use common::channel::http::{PublishRequest, PublishResponse};
use common::channel::ChannelError;

use crate::http_server::ProviderState;

pub async fn handler(
    State(state): State<ProviderState>,
    Json(req): Json<PublishRequest>,
) -> Result<impl IntoResponse, PublishError> {
    let PublishRequest { unit, access, pow } = req;
    tracing::debug!(
        address = %unit.address,
        index = unit.index,
        total = unit.total,
        restricted = access.is_some(),
        depth = pow.depth,
        min_weight_magnitude = pow.min_weight_magnitude,
        "publish"
    );

    let ack = state.channel().publish(unit, access.as_ref()).await?;

    Ok((http::StatusCode::OK, Json(PublishResponse { ack })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Publish failed: {0}")]
    Channel(#[from] ChannelError),
}

impl IntoResponse for PublishError {
    fn into_response(self) -> Response {
        match self {
            PublishError::Channel(ChannelError::Rejected(msg)) => (
                http::StatusCode::BAD_REQUEST,
                format!("Unit rejected: {}", msg),
            )
                .into_response(),
            PublishError::Channel(e) => {
                tracing::error!(error = %e, "publish failed");
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to publish: {}", e),
                )
                    .into_response()
            }
        }
    }
}
