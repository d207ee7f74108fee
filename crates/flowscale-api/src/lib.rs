//! flowscale-api — the daemon's HTTP surface and in-process wiring.
//!
//! Routes:
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/` | Run one metric refresh cycle synchronously |
//! | GET | `/healthz` | Liveness probe |
//! | GET | `/metrics` | Scaling gauges in Prometheus text format |
//!
//! Also provides [`InProcessScaleClient`], the default [`ScaleClient`]
//! binding the metric-provider stage directly to the in-process scaler
//! stage.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tracing::error;

use flow_core::{ScaleRequest, ScaleResponse};
use flowscale_engine::{ScalersManager, ScalingMetrics};
use flowscale_provider::{Orchestrator, ScaleClient};

/// Scale client that calls the in-process scaler stage.
///
/// The manager is behind a mutex, which serializes scale batches: an
/// overlapping on-demand refresh waits for the in-flight batch instead of
/// interleaving stabilizer updates.
pub struct InProcessScaleClient {
    manager: tokio::sync::Mutex<ScalersManager>,
}

impl InProcessScaleClient {
    pub fn new(manager: ScalersManager) -> Self {
        Self {
            manager: tokio::sync::Mutex::new(manager),
        }
    }
}

#[async_trait]
impl ScaleClient for InProcessScaleClient {
    async fn scale(&self, request: ScaleRequest) -> anyhow::Result<ScaleResponse> {
        let mut manager = self.manager.lock().await;
        Ok(manager.scale(&request).await)
    }
}

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub metrics: Arc<ScalingMetrics>,
}

/// Build the daemon's router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(refresh))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// POST / — run one refresh cycle.
async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    match state.orchestrator.refresh_metrics().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            error!(error = %e, "failed to refresh metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to refresh metrics",
            )
        }
    }
}

/// GET /healthz — liveness.
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// GET /metrics — Prometheus exposition.
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, state.metrics.render_prometheus())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use flowscale_auth::{AuthResolver, StubSecretStore};
    use flowscale_config::{ConfigProvider, StubParameterStore};
    use flowscale_engine::InMemoryComputePlane;
    use flowscale_provider::StateProvider;
    use flowscale_triggers::BuilderFactory;

    async fn test_state() -> AppState {
        let yaml = r#"
apiVersion: flowscale.dev/v1alpha1
kind: FlowScaleConfig
spec:
  scaledObjects:
    - spec:
        scaleTargetRef:
          name: projects/acme/locations/us-central1/services/api
        triggers:
          - type: cron
            metadata:
              start: "00:00"
              end: "12:00"
              desiredInstances: "2"
"#;
        let provider =
            ConfigProvider::new(Box::new(StubParameterStore::new().with_document("cfg", yaml)));
        let config = Arc::new(provider.load("cfg").await.unwrap());

        let metrics = Arc::new(ScalingMetrics::new());
        let plane = Arc::new(InMemoryComputePlane::new());
        let manager = ScalersManager::with_metrics(plane, false, metrics.clone());
        let scale_client = Arc::new(InProcessScaleClient::new(manager));

        let orchestrator = Arc::new(Orchestrator::new(
            scale_client,
            config,
            BuilderFactory::new(
                AuthResolver::new(Arc::new(StubSecretStore::new())),
                Duration::from_secs(2),
            ),
            StateProvider::new(),
        ));

        AppState {
            orchestrator,
            metrics,
        }
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let router = build_router(test_state().await);
        let response = router
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn refresh_requires_post() {
        let router = build_router(test_state().await);
        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn post_runs_a_cycle() {
        let router = build_router(test_state().await);
        let response = router
            .oneshot(Request::post("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_registry() {
        let state = test_state().await;
        state.metrics.record_instance_counts("w", 3, 2);
        let router = build_router(state);

        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("flowscale_recommended_instance_count"));
    }
}
