use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use super::ProviderState;

pub fn router() -> Router<ProviderState> {
    Router::new().route("/livez", get(livez))
}

async fn livez() -> Response {
    let msg = serde_json::json!({"status": "ok"});
    (StatusCode::OK, Json(msg)).into_response()
}
