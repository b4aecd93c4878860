use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use hireloop::marketplace::{lifecycle_router, LifecycleService, StatusNotifier};
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct ReadinessReport {
    pub(crate) status: &'static str,
    pub(crate) database: &'static str,
}

pub(crate) fn with_lifecycle_routes<N>(service: Arc<LifecycleService<N>>) -> Router
where
    N: StatusNotifier + 'static,
{
    lifecycle_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Ready once the listener is bound and the store answers a round trip.
pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if !state.readiness.load(Ordering::Relaxed) {
        let report = ReadinessReport {
            status: "initializing",
            database: "unknown",
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(report));
    }

    if state.database.ping().await {
        let report = ReadinessReport {
            status: "ready",
            database: "ok",
        };
        (StatusCode::OK, Json(report))
    } else {
        let report = ReadinessReport {
            status: "degraded",
            database: "unreachable",
        };
        (StatusCode::SERVICE_UNAVAILABLE, Json(report))
    }
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
    use crate::infra::LoggingNotifier;
    use axum::body::Body;
    use axum::http::Request;
    use hireloop::marketplace::TransitionPolicy;
    use hireloop::persistence::Database;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    async fn app(ready: bool) -> (Router, Database) {
        let database = Database::in_memory().await.expect("in-memory database");
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            database: database.clone(),
        };
        let service = Arc::new(LifecycleService::new(
            database.clone(),
            TransitionPolicy::default(),
            Arc::new(LoggingNotifier),
        ));
        (
            with_lifecycle_routes(service).layer(Extension(state)),
            database,
        )
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&body).unwrap_or_default())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (router, _) = app(false).await;
        let (status, body) = get(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_waits_for_the_listener() {
        let (router, _) = app(false).await;
        let (status, body) = get(router, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");
    }

    #[tokio::test]
    async fn readiness_checks_the_database() {
        let (router, database) = app(true).await;
        let (status, body) = get(router.clone(), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], "ok");

        database.close().await;
        let (status, body) = get(router, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["database"], "unreachable");
    }

    #[tokio::test]
    async fn metrics_are_plain_text() {
        let (router, _) = app(true).await;
        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn lifecycle_routes_are_mounted() {
        let (router, _) = app(true).await;
        let (status, body) = get(router, "/jobs").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalJobs"], 0);
        assert_eq!(body["currentPage"], 1);
    }
}
