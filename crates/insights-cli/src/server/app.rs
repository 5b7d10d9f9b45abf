//! Axum application setup.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(state.max_body_size())),
        )
        .route("/process", post(handlers::process))
        .route("/cancel", post(handlers::cancel))
        .route("/status", get(handlers::status))
        .route("/insights", get(handlers::insights))
        .route("/events/:file_id", get(handlers::events));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the web server.
pub async fn run_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use insights::{
        InsightConfig, JobStatus, MemoryJobStore, MemoryUploadStore, Orchestrator, UploadGateway,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "X-INSIGHTS-BOUNDARY";

    fn test_state() -> AppState {
        let config = InsightConfig::default();
        let store = Arc::new(MemoryJobStore::new());
        let uploads = Arc::new(MemoryUploadStore::new());
        AppState::new(
            UploadGateway::new(config.clone(), store.clone(), uploads.clone()),
            Orchestrator::new(config, store, uploads),
        )
    }

    fn multipart(filename: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
            b = BOUNDARY,
            f = filename,
            c = content
        );
        Request::builder()
            .method("POST")
            .uri("/api/v1/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = create_router(test_state()).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_upload_process_insights() {
        let state = test_state();
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(multipart("sales.csv", "sales\n10\n10\n10\n1000\n10"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let receipt = json_body(response).await;
        assert_eq!(receipt["status"], "pending");
        assert_eq!(receipt["preview"][0][0], "sales");
        let file_id = receipt["file_id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/process", serde_json::json!({ "file_id": file_id })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(json_body(response).await["status"], "processing");

        let job = state.orchestrator.wait(&file_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);

        let response = app
            .clone()
            .oneshot(get(&format!("/api/v1/status?file_id={}", file_id)))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["status"], "completed");

        let response = app
            .oneshot(get(&format!("/api/v1/insights?file_id={}", file_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report = json_body(response).await;
        assert!(report["total_insights"].as_u64().unwrap() >= 3);
    }

    #[tokio::test]
    async fn test_second_process_conflicts() {
        let state = test_state();
        let app = create_router(state.clone());
        let receipt = state
            .gateway
            .upload("a.csv", b"v\n1\n2\n3\n".to_vec())
            .await
            .unwrap();
        state.orchestrator.submit_processing(&receipt.file_id).await.unwrap();
        state.orchestrator.wait(&receipt.file_id).await.unwrap();

        let response = app
            .oneshot(post_json(
                "/api/v1/process",
                serde_json::json!({ "file_id": receipt.file_id }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert_eq!(body["error"], "invalid_state");
        assert_eq!(body["status_code"], 409);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let state = test_state();
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(get("/api/v1/status?file_id=missing"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let receipt = state
            .gateway
            .upload("a.csv", b"v\n1\n2\n".to_vec())
            .await
            .unwrap();
        let response = app
            .clone()
            .oneshot(get(&format!("/api/v1/insights?file_id={}", receipt.file_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["error"], "not_ready");

        let response = app
            .clone()
            .oneshot(multipart("notes.pdf", "hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(multipart("empty.csv", "a,b"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "parse_error");
    }

    #[tokio::test]
    async fn test_events_for_finished_job() {
        let state = test_state();
        let app = create_router(state.clone());
        let receipt = state
            .gateway
            .upload("a.csv", b"v\n1\n2\n3\n".to_vec())
            .await
            .unwrap();
        state.orchestrator.submit_processing(&receipt.file_id).await.unwrap();
        state.orchestrator.wait(&receipt.file_id).await.unwrap();

        let response = app
            .oneshot(get(&format!("/api/v1/events/{}", receipt.file_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("event: status_update"));
        assert!(text.contains("\"status\":\"completed\""));
    }
}
