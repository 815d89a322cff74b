//! HTTP server echoing request metadata.
//!
//! Routes:
//!   GET|POST /                 → index.html with the request record embedded
//!   GET|POST /static/{*path}   → asset from the static directory
//!   GET|POST anything else     → 404 with the request record as JSON

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, Query, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

use probe_common::config::Config;
use probe_common::RequestRecord;

use crate::page;

pub const NOT_FOUND_MESSAGE: &str = "Route not found, but here's your request info:";

/// Shared state for route handlers.
#[derive(Clone)]
pub struct AppState {
    static_dir: PathBuf,
    template_path: PathBuf,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        AppState {
            static_dir: config.static_dir.clone(),
            template_path: config.template_path(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EchoBody<'a> {
    message: &'static str,
    request_info: &'a RequestRecord,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_page).post(root_page))
        .route("/static/{*path}", get(static_asset).post(static_asset))
        .fallback(echo)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server. Blocks until `shutdown` is set.
pub async fn run(config: &Config, shutdown: Arc<AtomicBool>) -> anyhow::Result<()> {
    let app = router(AppState::new(config));

    let listen_addr = config.listen_addr();
    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Probe server listening on http://{listen_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
        }
    })
    .await?;

    Ok(())
}

/// Snapshot the request line, headers, decoded query and peer address.
fn record_request(req: &Request) -> RequestRecord {
    let uri = req.uri();
    let url = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    let mut builder = RequestRecord::builder(req.method().as_str(), url);
    for (name, value) in req.headers() {
        builder = builder.header(name.as_str(), &String::from_utf8_lossy(value.as_bytes()));
    }

    let query = Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_else(|e| {
            debug!("undecodable query in {url}: {e}");
            Vec::new()
        });
    builder = builder.query(query);

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        builder = builder.ip(addr.ip().to_string());
    }

    let record = builder.build();
    info!("Request processed for url \"{}\"", record.url());
    record
}

// ── route handlers ───────────────────────────────────────────────────────

async fn root_page(State(state): State<AppState>, req: Request) -> Response {
    let record = record_request(&req);

    let html = match tokio::fs::read_to_string(&state.template_path).await {
        Ok(html) => html,
        Err(e) => {
            error!(
                "Error reading HTML template {}: {e}",
                state.template_path.display()
            );
            return internal_error();
        }
    };

    match page::inject_request_info(&html, &record) {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Cannot serialise request info: {e}");
            internal_error()
        }
    }
}

async fn static_asset(
    State(state): State<AppState>,
    Path(path): Path<String>,
    req: Request,
) -> Response {
    record_request(&req);

    let Some(file_path) = page::resolve_asset(&state.static_dir, &path) else {
        debug!("refusing static path {path:?}");
        return not_found();
    };

    match tokio::fs::read(&file_path).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, page::content_type_for(&file_path))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            debug!("static asset {} unavailable: {e}", file_path.display());
            not_found()
        }
    }
}

async fn echo(req: Request) -> Response {
    if req.method() != Method::GET && req.method() != Method::POST {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, POST")],
        )
            .into_response();
    }

    let record = record_request(&req);
    (
        StatusCode::NOT_FOUND,
        Json(EchoBody {
            message: NOT_FOUND_MESSAGE,
            request_info: &record,
        }),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Internal Server Error",
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Not Found",
    )
        .into_response()
}

// ─── tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const TEMPLATE: &str =
        "<!DOCTYPE html><html><head><title>Probe</title></head><body></body></html>";

    fn app(dir: &std::path::Path) -> Router {
        let config = Config {
            static_dir: dir.to_path_buf(),
            ..Config::default()
        };
        router(AppState::new(&config))
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), TEMPLATE).unwrap();
        std::fs::write(dir.path().join("style.css"), "body{}").unwrap();
        std::fs::write(dir.path().join("manifest.json"), "{}").unwrap();
        dir
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let ct = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, ct, body.to_vec())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_echo_json_for_unknown_route() {
        let dir = fixture();
        let req = Request::builder()
            .uri("/foo?bar=1")
            .header("X-Custom", "Value")
            .body(Body::empty())
            .unwrap();
        let (status, ct, body) = send(app(dir.path()), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(ct.as_deref(), Some("application/json"));

        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["message"], NOT_FOUND_MESSAGE);
        let info = &v["requestInfo"];
        assert_eq!(info["method"], "GET");
        assert_eq!(info["url"], "/foo?bar=1");
        assert_eq!(info["pathname"], "/foo");
        assert_eq!(info["query"]["bar"], "1");
        assert_eq!(info["headers"]["x-custom"], "Value");
        assert!(info["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_echo_decodes_query_and_accepts_post() {
        let dir = fixture();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/thing?name=a%20b&x=1&x=2")
            .body(Body::from("ignored"))
            .unwrap();
        let (status, _, body) = send(app(dir.path()), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["requestInfo"]["method"], "POST");
        assert_eq!(v["requestInfo"]["query"]["name"], "a b");
        assert_eq!(v["requestInfo"]["query"]["x"], "2");
    }

    #[tokio::test]
    async fn test_echo_rejects_other_methods() {
        let dir = fixture();
        let req = Request::builder()
            .method(Method::DELETE)
            .uri("/foo")
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(app(dir.path()), req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_root_embeds_request_info() {
        let dir = fixture();
        let req = Request::builder()
            .uri("/?cap=3")
            .header("User-Agent", "probe-test")
            .body(Body::empty())
            .unwrap();
        let (status, ct, body) = send(app(dir.path()), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ct.as_deref(), Some("text/html; charset=utf-8"));

        let html = String::from_utf8(body).unwrap();
        assert_eq!(html.matches("window.requestInfo").count(), 1);
        assert!(html.find("window.requestInfo").unwrap() < html.find("</head>").unwrap());
        assert!(html.contains("\"userAgent\": \"probe-test\""));
        assert!(html.contains("\"cap\": \"3\""));
    }

    #[tokio::test]
    async fn test_root_missing_template_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _, body) = send(app(dir.path()), get("/")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, b"Internal Server Error");
    }

    #[tokio::test]
    async fn test_static_content_types() {
        let dir = fixture();
        let (status, ct, body) = send(app(dir.path()), get("/static/style.css")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ct.as_deref(), Some("text/css"));
        assert_eq!(body, b"body{}");

        let (_, ct, _) = send(app(dir.path()), get("/static/manifest.json")).await;
        assert_eq!(ct.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_static_missing_is_plain_404() {
        let dir = fixture();
        let (status, ct, body) = send(app(dir.path()), get("/static/nope.js")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(ct.as_deref(), Some("text/plain; charset=utf-8"));
        assert_eq!(body, b"Not Found");
    }

    #[tokio::test]
    async fn test_static_traversal_refused() {
        let dir = fixture();
        let (status, _, body) =
            send(app(dir.path()), get("/static/..%2Findex.html")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, b"Not Found");
    }
}
