use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Unknown routes; JSON for provider clients, plain text for everyone else
pub async fn not_found_handler(uri: Uri, headers: HeaderMap) -> Response {
    tracing::debug!(path = %uri.path(), "no route");

    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"));

    if wants_json {
        let msg = serde_json::json!({"msg": "not found", "path": uri.path()});
        (StatusCode::NOT_FOUND, Json(msg)).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain")],
            "not found",
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn test_json_clients_get_json() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let response = not_found_handler(Uri::from_static("/nope"), headers).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_plain_clients_get_text() {
        let response = not_found_handler(Uri::from_static("/nope"), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    }
}
