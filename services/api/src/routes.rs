use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use community_portal::backend::RemoteBackend;
use community_portal::community::Portal;
use serde_json::json;

/// Portal API plus the health, readiness, and metrics endpoints.
pub(crate) fn with_portal_routes<B>(portal: &Portal<B>) -> Router
where
    B: RemoteBackend + 'static,
{
    portal
        .router()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = json!({
        "status": if ready { "ready" } else { "initializing" },
        "backend": state.backend.label(),
    });

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::BackendMode;
    use axum::body::Body;
    use axum::http::Request;
    use community_portal::backend::InMemoryBackend;
    use community_portal::config::PortalConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        let portal = Portal::new(Arc::new(InMemoryBackend::new()), &PortalConfig::default());
        with_portal_routes(&portal).layer(Extension(state))
    }

    fn state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            backend: BackendMode::InMemory,
        }
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn readiness_tracks_the_flag() {
        let state = state(false);
        let readiness = Arc::clone(&state.readiness);
        let router = app(state);

        let response = router
            .clone()
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        readiness.store(true, Ordering::Release);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["backend"], "in-memory");
    }

    #[tokio::test]
    async fn health_and_portal_routes_share_the_router() {
        let router = app(state(true));
        let response = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(Request::get("/api/v1/news").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn metrics_are_rendered_as_prometheus_text() {
        let response = app(state(true))
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }
}
