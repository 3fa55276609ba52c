//! Router assembly.

use axum::{Router, middleware};

use crate::api::handlers::{health, status};
use crate::api::middleware::{global_error_handler, logging_middleware, request_id_middleware};
use crate::state::AppState;

/// Builds the application router.
///
/// Middleware added last runs first: request ID, then logging, then the
/// JSON error rewriting closest to the handlers.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new().merge(health::health_routes());

    if state.status.enabled {
        router = router.merge(status::status_routes(state.clone()));
    }

    router
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApplicationConfig, StatusConfig};
    use crate::jobs::{Job, JobRunner};
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn state_with(status: StatusConfig) -> AppState {
        let runner = JobRunner::start(&[2]).await.unwrap();
        AppState::new(runner, status, ApplicationConfig::default())
    }

    fn request_from(uri: &str, peer: &str) -> Request<Body> {
        let peer: SocketAddr = peer.parse().unwrap();
        Request::builder()
            .uri(uri)
            .extension(ConnectInfo(peer))
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_from_loopback() {
        let state = state_with(StatusConfig::default()).await;
        let job = Arc::new(Job::from_fn("report", || async {}));
        let id = state.runner.schedule("@every 1h", job).await.unwrap();

        let response = create_router(state.clone())
            .oneshot(request_from("/jobrunner/status", "127.0.0.1:40000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = json_body(response).await;
        assert_eq!(body["jobrunner"][0]["id"], id.to_string());
        assert_eq!(body["jobrunner"][0]["job"]["status"], "IDLE");

        state.runner.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_rejects_remote_peer() {
        let state = state_with(StatusConfig::default()).await;

        let response = create_router(state.clone())
            .oneshot(request_from("/jobrunner/status", "10.0.0.8:40000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["message"], "10.0.0.8:40000 is not local");

        state.runner.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_forwarded_address_judged_when_trusted() {
        let state = state_with(StatusConfig {
            enabled: true,
            accept_proxy_address: true,
        })
        .await;

        let mut request = request_from("/jobrunner/status", "127.0.0.1:40000");
        request
            .headers_mut()
            .insert("x-forwarded-for", "198.51.100.4".parse().unwrap());
        let response = create_router(state.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["message"], "198.51.100.4 is not local");

        state.runner.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_entry_is_not_found() {
        let state = state_with(StatusConfig::default()).await;
        let uri = format!("/jobrunner/status/{}", uuid::Uuid::new_v4());

        let response = create_router(state.clone())
            .oneshot(request_from(&uri, "[::1]:40000"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], "NOT_FOUND");

        state.runner.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_entry_id_is_json_bad_request() {
        let state = state_with(StatusConfig::default()).await;

        let response = create_router(state.clone())
            .oneshot(request_from("/jobrunner/status/not-a-uuid", "127.0.0.1:1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "BAD_REQUEST");

        state.runner.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_disabled_hides_route() {
        let state = state_with(StatusConfig {
            enabled: false,
            accept_proxy_address: false,
        })
        .await;

        let response = create_router(state.clone())
            .oneshot(request_from("/jobrunner/status", "127.0.0.1:1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        state.runner.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let state = state_with(StatusConfig::default()).await;

        let response = create_router(state.clone())
            .oneshot(request_from("/health", "10.0.0.8:1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["runner"]["pool_size"], 2);

        state.runner.shutdown().await.unwrap();
    }
}
