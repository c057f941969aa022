//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single dispatching fallback handler
//! - Wire up middleware (tracing, timeout, request ID, panic recovery)
//! - Serve directory listings, file contents and hex dumps under a root
//! - Serve on a supervised listener until shutdown

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, Request, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::io::AsyncReadExt;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::base::hex_dump;
use crate::config::ServerConfig;
use crate::fs::{canonical_path, mime_type, read_entries, sort_entries, EntryInfo, SortBy, SortDirection};
use crate::lifecycle::ShutdownListener;
use crate::net::Listener;
use crate::web::{
    json_panic_layer, json_success, log_errors, ErrorLog, ResponseKind, Route, TemplateError, TemplateStore,
    TemplateWatcher, WebError, WebResultExt,
};

const INDEX_TEMPLATE: &str = "index.html";

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("cannot serve root {path}: {source}")]
    Root { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Templates(#[from] TemplateError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Index,
    Health,
    Files,
    HexDump,
}

/// Application state injected into handlers.
#[derive(Clone)]
struct AppState {
    root: Arc<PathBuf>,
    hexdump_limit: usize,
    templates: Option<Arc<TemplateStore>>,
    routes: Arc<Vec<(Route, Endpoint)>>,
}

/// HTTP server exposing a directory tree.
pub struct FileServer {
    router: Router,
    root: PathBuf,
    _template_watcher: Option<TemplateWatcher>,
}

impl FileServer {
    /// Build the server. Templates, when configured, are loaded and watched.
    pub fn new(config: &ServerConfig) -> Result<Self, ServerError> {
        let root = canonical_path(&config.root).map_err(|source| ServerError::Root {
            path: config.root.clone(),
            source,
        })?;

        let (templates, watcher) = match &config.templates {
            Some(t) => {
                let store = TemplateStore::load(&t.dir, &t.pattern)?;
                let watcher = store.watch()?;
                (Some(store), Some(watcher))
            }
            None => (None, None),
        };

        let state = AppState {
            root: Arc::new(root.clone()),
            hexdump_limit: config.hexdump_limit,
            templates,
            routes: Arc::new(route_table()),
        };

        Ok(Self {
            router: Self::build_router(config, state),
            root,
            _template_watcher: watcher,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(axum::middleware::from_fn_with_state(ErrorLog::default(), log_errors))
            .layer(json_panic_layer())
            .layer(TimeoutLayer::new(config.request_timeout()))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let request_id = req
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The canonical directory being served.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then finish in-flight
    /// requests.
    pub async fn run(self, listener: Listener, shutdown: ShutdownListener) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, root = %self.root.display(), "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn route_table() -> Vec<(Route, Endpoint)> {
    vec![
        (Route::exact("/"), Endpoint::Index),
        (Route::exact("/index.html"), Endpoint::Index),
        (Route::exact_ignore_slash("/health"), Endpoint::Health),
        (Route::simple("/files"), Endpoint::Files),
        (Route::simple("/hexdump"), Endpoint::HexDump),
    ]
}

#[derive(Debug, Default, Deserialize)]
struct ListingParams {
    sort: Option<String>,
    order: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListingEntry {
    name: String,
    is_dir: bool,
    size: u64,
    modified: u64,
}

impl From<EntryInfo> for ListingEntry {
    fn from(info: EntryInfo) -> Self {
        Self {
            modified: info.modified_unix_secs(),
            name: info.name,
            is_dir: info.is_dir,
            size: info.size,
        }
    }
}

async fn dispatch(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
    uri: Uri,
) -> Result<Response, WebError> {
    let path = uri.path();
    let matched = state
        .routes
        .iter()
        .find_map(|(route, endpoint)| route.remainder(path).map(|rest| (*endpoint, rest)));

    match matched {
        Some((Endpoint::Index, _)) => index(&state),
        Some((Endpoint::Health, _)) => Ok(json_success(json!({ "ok": true })).into_response()),
        Some((Endpoint::Files, rest)) => files(&state, rest, params).await,
        Some((Endpoint::HexDump, rest)) => hexdump(&state, rest).await,
        None => Err(WebError::new(
            format!("no route for {path}"),
            StatusCode::NOT_FOUND,
            ResponseKind::Json,
        )),
    }
}

fn index(state: &AppState) -> Result<Response, WebError> {
    let context = json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    });
    match &state.templates {
        Some(templates) if templates.contains(INDEX_TEMPLATE) => {
            let page = templates
                .render(INDEX_TEMPLATE, &context)
                .or_html_error(StatusCode::INTERNAL_SERVER_ERROR)?;
            Ok(Html(page).into_response())
        }
        _ => Ok(json_success(context).into_response()),
    }
}

async fn files(state: &AppState, rest: &str, params: ListingParams) -> Result<Response, WebError> {
    let path = resolve(&state.root, rest)?;
    let metadata = tokio::fs::metadata(&path)
        .await
        .or_json_error(StatusCode::INTERNAL_SERVER_ERROR)?;

    if metadata.is_dir() {
        let sort_by = parse_param::<SortBy>(params.sort.as_deref())?;
        let direction = parse_param::<SortDirection>(params.order.as_deref())?;
        let entries = tokio::task::spawn_blocking(move || {
            read_entries(&path).map(|mut entries| {
                sort_entries(&mut entries, sort_by, direction);
                entries
            })
        })
        .await
        .or_json_error(StatusCode::INTERNAL_SERVER_ERROR)?
        .or_json_error(StatusCode::INTERNAL_SERVER_ERROR)?;

        let entries: Vec<ListingEntry> = entries.into_iter().map(ListingEntry::from).collect();
        tracing::debug!(path = rest, count = entries.len(), "Directory listed");
        return Ok(json_success(json!({ "path": rest, "entries": entries })).into_response());
    }

    let bytes = tokio::fs::read(&path)
        .await
        .or_json_error(StatusCode::INTERNAL_SERVER_ERROR)?;
    let content_type = mime_type(&path).unwrap_or("application/octet-stream");
    let mut rsp = bytes.into_response();
    if let Ok(value) = HeaderValue::from_str(content_type) {
        rsp.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    Ok(rsp)
}

async fn hexdump(state: &AppState, rest: &str) -> Result<Response, WebError> {
    let path = resolve(&state.root, rest)?;
    let file = tokio::fs::File::open(&path)
        .await
        .or_json_error(StatusCode::INTERNAL_SERVER_ERROR)?;
    if file
        .metadata()
        .await
        .or_json_error(StatusCode::INTERNAL_SERVER_ERROR)?
        .is_dir()
    {
        return Err(WebError::new(
            format!("{rest} is a directory"),
            StatusCode::BAD_REQUEST,
            ResponseKind::Json,
        ));
    }

    let mut bytes = Vec::new();
    file.take(state.hexdump_limit as u64)
        .read_to_end(&mut bytes)
        .await
        .or_json_error(StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        hex_dump(&bytes),
    )
        .into_response())
}

fn parse_param<T>(value: Option<&str>) -> Result<T, WebError>
where
    T: std::str::FromStr + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v.parse::<T>().or_json_error(StatusCode::BAD_REQUEST),
        None => Ok(T::default()),
    }
}

/// Map a request path under `root` to a file, refusing anything that
/// resolves outside it.
fn resolve(root: &Path, rest: &str) -> Result<PathBuf, WebError> {
    let candidate = root.join(rest.trim_start_matches('/'));
    let resolved = canonical_path(&candidate).map_err(|e| {
        let status = match e.kind() {
            io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
            io::ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        WebError::new(format!("{rest}: {e}"), status, ResponseKind::Json)
    })?;

    if !resolved.starts_with(root) {
        tracing::warn!(path = rest, "Path escapes the served root");
        return Err(WebError::new(
            format!("{rest} is outside the served root"),
            StatusCode::FORBIDDEN,
            ResponseKind::Json,
        ));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::fs;
    use tower::ServiceExt;

    fn fixture() -> (tempfile::TempDir, FileServer) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/readme.txt"), "hello").unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.bin"), [0u8, 1, 2, b'A']).unwrap();
        let config = ServerConfig {
            root: dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        let server = FileServer::new(&config).unwrap();
        (dir, server)
    }

    async fn get(server: &FileServer, uri: &str) -> (StatusCode, String, String) {
        let rsp = server
            .router()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = rsp.status();
        let ctype = rsp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = to_bytes(rsp.into_body(), usize::MAX).await.unwrap();
        (status, ctype, String::from_utf8_lossy(&body).into_owned())
    }

    #[tokio::test]
    async fn health_and_index() {
        let (_dir, server) = fixture();
        let (status, _, body) = get(&server, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"statusCode":200,"result":{"ok":true}}"#);

        let (status, ctype, body) = get(&server, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(ctype.starts_with("application/json"));
        assert!(body.contains("\"name\":\"groundwork\""));
    }

    #[tokio::test]
    async fn index_renders_template_with_server_context() {
        let root = tempfile::tempdir().unwrap();
        let templates = tempfile::tempdir().unwrap();
        fs::write(templates.path().join("index.html"), "<h1>{{ name }} {{ version }}</h1>").unwrap();
        let server = FileServer::new(&ServerConfig {
            root: root.path().to_path_buf(),
            templates: Some(crate::config::TemplatesConfig {
                dir: templates.path().to_path_buf(),
                pattern: "*.html".to_string(),
            }),
            ..ServerConfig::default()
        })
        .unwrap();

        let (status, ctype, body) = get(&server, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(ctype.starts_with("text/html"));
        assert_eq!(body, format!("<h1>groundwork {}</h1>", env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn lists_directories_first() {
        let (_dir, server) = fixture();
        let (status, _, body) = get(&server, "/files").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        let names: Vec<&str> = value["result"]["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["docs", "a.bin", "b.json"]);

        let (_, _, body) = get(&server, "/files?sort=name&order=desc").await;
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["result"]["entries"][1]["name"], "b.json");
    }

    #[tokio::test]
    async fn serves_file_with_mime_type() {
        let (_dir, server) = fixture();
        let (status, ctype, body) = get(&server, "/files/docs/readme.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ctype, "text/plain");
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn hexdump_renders_text() {
        let (_dir, server) = fixture();
        let (status, ctype, body) = get(&server, "/hexdump/a.bin").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ctype, "text/plain; charset=utf-8");
        assert!(body.starts_with("00 01 02 41"));
    }

    #[tokio::test]
    async fn rejects_missing_escaping_and_bad_params() {
        let (_dir, server) = fixture();
        let (status, _, body) = get(&server, "/files/nope.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("\"statusCode\":404"));

        let (status, _, _) = get(&server, "/files/docs/../../").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = get(&server, "/files?sort=colour").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = get(&server, "/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn echoes_request_id() {
        let (_dir, server) = fixture();
        let rsp = server
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(rsp.headers().contains_key("x-request-id"));
    }
}
