use axum::routing::post;
use axum::Router;

pub mod fetch;
pub mod publish;

use crate::http_server::ProviderState;

pub fn router(state: ProviderState) -> Router<ProviderState> {
    Router::new()
        .route("/publish", post(publish::handler))
        .route("/fetch", post(fetch::handler))
        .with_state(state)
}
