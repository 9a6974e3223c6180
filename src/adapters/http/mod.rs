//! HTTP inbound adapter.
//!
//! Serves the browser page, the SSE change stream and a small status endpoint.

mod sse;

use crate::adapters::broadcast::Broadcaster;
use crate::config::WatchConfig;
use crate::error::ServerError;
use axum::{
    extract::State,
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

const INDEX_HTML: &str = include_str!("../../../assets/index.html");

#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Arc<Broadcaster>,
    pub config: Arc<WatchConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/events", get(sse::stream))
        .route("/status", get(status))
        .with_state(state)
}

/// Bind the listener and serve until `shutdown` fires.
pub async fn serve(state: AppState, shutdown: CancellationToken) -> Result<(), ServerError> {
    let addr = state.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("Listening at {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(ServerError::Serve)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    watch_dir: String,
    scan_interval_secs: u64,
    subscribers: usize,
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        watch_dir: state.config.watch_dir.display().to_string(),
        scan_interval_secs: state.config.scan_interval.as_secs(),
        subscribers: state.broadcaster.subscriber_count(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::path::PathBuf;
    use std::time::Duration;
    use tower::ServiceExt;

    pub(crate) fn test_state() -> AppState {
        AppState {
            broadcaster: Arc::new(Broadcaster::default()),
            config: Arc::new(WatchConfig {
                addr: String::from("127.0.0.1"),
                port: String::from("0"),
                watch_dir: PathBuf::from("/srv/watched"),
                scan_interval: Duration::from_secs(2),
                event_buffer: 128,
            }),
        }
    }

    pub(crate) fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_index_serves_page() {
        let response = router(test_state()).oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("new EventSource(\"/events\")"));
    }

    #[tokio::test]
    async fn test_status_reports_subscribers() {
        let state = test_state();
        let _subscription = state.broadcaster.subscribe();

        let response = router(state).oneshot(get("/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let status: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(status["subscribers"], 1);
        assert_eq!(status["scan_interval_secs"], 2);
        assert_eq!(status["watch_dir"], "/srv/watched");
    }

    #[tokio::test]
    async fn test_serve_reports_bind_failure() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let mut state = test_state();
        state.config = Arc::new(WatchConfig {
            port: port.to_string(),
            ..(*state.config).clone()
        });

        let err = serve(state, CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
    }
}
