use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_LENGTH, Request},
    middleware::Next,
    response::Response,
};
use serde_json::{json, Value};

/// Fills the `path` field of error envelopes. `AppError::into_response`
/// cannot see the request URI, so it emits an empty placeholder which this
/// layer replaces on the way out. Success responses pass through untouched.
pub async fn error_path_middleware(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    if !(response.status().is_client_error() || response.status().is_server_error()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return Response::from_parts(parts, Body::empty()),
    };

    if let Ok(mut value) = serde_json::from_slice::<Value>(&bytes) {
        if value.get("error").is_some() {
            value["path"] = json!(path);
            if let Ok(rewritten) = serde_json::to_vec(&value) {
                parts.headers.remove(CONTENT_LENGTH);
                return Response::from_parts(parts, Body::from(rewritten));
            }
        }
    }

    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{middleware, Router};
    use serde_json::Value as Json;
    use shared_models::error::AppError;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route(
                "/broken",
                get(|| async {
                    Err::<&str, _>(AppError::not_found("DOCUMENT_NOT_FOUND", "Documento no encontrado"))
                }),
            )
            .layer(middleware::from_fn(error_path_middleware))
    }

    async fn body_value(response: Response) -> Json {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn injects_request_path_into_error_envelope() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/broken")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_value(response).await;
        assert_eq!(body["path"], "/broken");
        assert_eq!(body["error"]["code"], "DOCUMENT_NOT_FOUND");
    }

    #[tokio::test]
    async fn leaves_success_responses_untouched() {
        let response = app()
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"fine");
    }
}
