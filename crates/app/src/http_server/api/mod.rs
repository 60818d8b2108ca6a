use axum::Router;

pub mod v0;

use super::ProviderState;

pub fn router(state: ProviderState) -> Router<ProviderState> {
    Router::new()
        .nest("/v0", v0::router(state.clone()))
        .with_state(state)
}
