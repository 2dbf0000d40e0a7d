use axum::{
    body::Bytes,
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use log::info;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::broker::Publisher;
use crate::error::GatewayError;
use crate::event::RawTrap;

#[derive(Clone)]
struct AppState {
    publisher: Arc<dyn Publisher>,
    channel: String,
}

pub fn router(publisher: Arc<dyn Publisher>, channel: impl Into<String>) -> Router {
    let state = AppState { publisher, channel: channel.into() };

    Router::new()
        .route("/trap", post(receive_trap))
        .route("/health", get(health))
        .with_state(Arc::new(state))
}

async fn receive_trap(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, GatewayError> {
    let trap = RawTrap::from_http_body(&body)?;
    let payload = trap.to_payload()?;

    state.publisher.publish(&state.channel, &payload).await?;
    info!("Published trap to {} (source {})", state.channel, trap.source_label());

    Ok(Json(json!({ "status": "ok" })))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{MemoryBroker, Subscription};
    use crate::error::BrokerError;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    #[derive(Default)]
    struct CountingPublisher {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Publisher for CountingPublisher {
        async fn publish(&self, channel: &str, _payload: &str) -> Result<(), BrokerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BrokerError::Closed { channel: channel.to_string() });
            }
            Ok(())
        }
    }

    fn post_trap(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/trap")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_valid_trap_is_published_once() {
        let broker = MemoryBroker::default();
        let mut traps = broker.subscribe("traps").unwrap();
        let app = router(Arc::new(broker.clone()), "traps");

        let body = r#"{"source_ip":"10.0.0.1","oid":"1.3.6.1.6.3.1.1.5.3","counter":18446744073709551616}"#;
        let response = app.oneshot(post_trap(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "status": "ok" }));
        assert_eq!(traps.next_payload().await.unwrap(), body);
    }

    #[tokio::test]
    async fn test_missing_source_ip_is_rejected_without_publish() {
        let publisher = Arc::new(CountingPublisher::default());
        let app = router(publisher.clone(), "traps");

        let response = app.oneshot(post_trap(r#"{"oid":"1.3.6.1"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["detail"].as_str().unwrap().contains("source_ip"));
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_json_and_non_object_are_bad_requests() {
        let publisher = Arc::new(CountingPublisher::default());

        for body in ["{broken", "\"source_ip\"", "[]"] {
            let app = router(publisher.clone(), "traps");
            let response = app.oneshot(post_trap(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", body);
        }
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_publish_failure_is_a_server_error() {
        let publisher = Arc::new(CountingPublisher { fail: true, ..Default::default() });
        let app = router(publisher.clone(), "traps");

        let response = app.oneshot(post_trap(r#"{"source_ip":"10.0.0.1"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(publisher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(Arc::new(CountingPublisher::default()), "traps");
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
