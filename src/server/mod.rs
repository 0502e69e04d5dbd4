//! HTTP surface: upload extraction, summarization and static files

mod error;
mod routes;
mod state;

pub use state::AppState;

use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::{Config, ServerConfig};

pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let index = ServeFile::new(server.static_dir.join("index.html"));

    Router::new()
        .merge(routes::routes())
        .route_service("/", index)
        .nest_service("/static", ServeDir::new(&server.static_dir))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &Config, state: AppState) -> anyhow::Result<()> {
    let addr = config.server.bind_addr()?;
    let app = create_router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::StubBackend;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "mailbrief-test-boundary";

    fn router(backend: Arc<StubBackend>, static_dir: &std::path::Path) -> Router {
        let mut config = Config::default();
        config.server.static_dir = static_dir.to_path_buf();
        let state = AppState::with_backend(backend, &config).unwrap();
        create_router(state, &config.server)
    }

    /// `(field name, optional file name, contents)`
    fn multipart_body(fields: &[(&str, Option<&str>, &[u8])]) -> Body {
        let mut body = Vec::new();
        for (name, filename, data) in fields {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            let disposition = match filename {
                Some(file) => format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                ),
                None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    fn multipart_request(uri: &str, fields: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(multipart_body(fields))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_parse_eml_upload() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(StubBackend::replying("unused"), dir.path());
        let eml = b"From: a@b.com\r\nSubject: Test\r\n\r\nHello\n\nUnsubscribe here\nBye";

        let response = app
            .oneshot(multipart_request(
                "/parse",
                &[("file", Some("message.eml"), eml.as_slice())],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["sender"], "a@b.com");
        assert_eq!(body["subject"], "Test");
        assert_eq!(body["body"], "Hello");
    }

    #[tokio::test]
    async fn test_parse_msg_upload() {
        use crate::mail::msg::tests::{build_msg, html_binary, unicode};

        let dir = tempfile::tempdir().unwrap();
        let app = router(StubBackend::replying("unused"), dir.path());
        let msg = build_msg(&[
            unicode(0x0037, "Weekly"),
            unicode(0x1000, ""),
            html_binary("<p>Hi</p><script>evil()</script>"),
        ]);

        let response = app
            .oneshot(multipart_request(
                "/parse",
                &[("file", Some("Weekly.MSG"), msg.as_slice())],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["subject"], "Weekly");
        assert_eq!(body["body"], "Hi");
        assert!(body["sender"].is_null());
    }

    #[tokio::test]
    async fn test_parse_corrupt_msg_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(StubBackend::replying("unused"), dir.path());

        let response = app
            .oneshot(multipart_request(
                "/parse",
                &[("file", Some("broken.msg"), b"definitely not cfb".as_slice())],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .contains("Failed to parse Outlook message")
        );
    }

    #[tokio::test]
    async fn test_parse_without_file_field() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(StubBackend::replying("unused"), dir.path());

        let response = app
            .oneshot(multipart_request(
                "/parse",
                &[("note", None, b"no file here".as_slice())],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn test_summarise_urlencoded() {
        let dir = tempfile::tempdir().unwrap();
        let backend = StubBackend::replying("  A short summary.\n");
        let app = router(backend.clone(), dir.path());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/summarise")
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("text=Hello+world&prompt=Summarize%3A"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["summary"], "A short summary.");
        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0], "Summarize:\n\nHello world");
    }

    #[tokio::test]
    async fn test_summarise_multipart() {
        let dir = tempfile::tempdir().unwrap();
        let backend = StubBackend::replying("ok");
        let app = router(backend.clone(), dir.path());

        let response = app
            .oneshot(multipart_request(
                "/summarise",
                &[
                    ("text", None, b"Body text".as_slice()),
                    ("prompt", None, b"TL;DR".as_slice()),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(backend.prompts.lock().unwrap()[0], "TL;DR\n\nBody text");
    }

    #[tokio::test]
    async fn test_summarise_missing_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let backend = StubBackend::replying("ok");
        let app = router(backend.clone(), dir.path());

        let response = app
            .oneshot(multipart_request(
                "/summarise",
                &[("text", None, b"Body text".as_slice())],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Missing field `prompt`");
        assert!(backend.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summarise_gateway_failure() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(StubBackend::failing("quota exceeded"), dir.path());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/summarise")
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("text=x&prompt=y"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_static_index_and_health_checks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>mailbrief</h1>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        let app = router(StubBackend::replying("unused"), dir.path());

        let response = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<h1>mailbrief</h1>");

        let response = app
            .clone()
            .oneshot(Request::get("/static/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/livez").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
