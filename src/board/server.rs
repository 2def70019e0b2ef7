use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, http::StatusCode, response::IntoResponse};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::api::{self, AppState};
use super::db::{BoardDb, DbHandle};

/// Configuration for the board server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Prebuilt single-page frontend to serve for non-API paths.
    pub static_dir: Option<PathBuf>,
    pub dev_mode: bool,
    pub strict_reorder: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            db_path: PathBuf::from("data/board.db"),
            static_dir: Some(PathBuf::from("frontend/dist")),
            dev_mode: false,
            strict_reorder: false,
        }
    }
}

/// Build the full application router: API routes, then the static frontend
/// for every other path, with SPA routing falling back to `index.html`.
pub fn build_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let router = api::api_router().with_state(state);
    let router = match static_dir.filter(|dir| dir.is_dir()) {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        ),
        None => router.fallback(frontend_missing),
    };
    router.layer(TraceLayer::new_for_http())
}

async fn frontend_missing() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        "Frontend not found. Build it into the configured static directory.",
    )
}

/// Open the database at `path`, creating its parent directory first.
pub fn open_database(path: &Path) -> Result<BoardDb> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    BoardDb::new(path).context("Failed to initialize board database")
}

/// Start the board server and run until Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let db = open_database(&config.db_path)?;
    tracing::info!(db = %config.db_path.display(), "Board database ready");

    let state = Arc::new(AppState {
        db: DbHandle::new(db),
        strict_reorder: config.strict_reorder,
    });

    let mut app = build_router(state, config.static_dir.as_deref());

    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    tracing::info!(%local_addr, dev_mode = config.dev_mode, strict_reorder = config.strict_reorder, "Server listening");
    println!("Tackboard running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router(static_dir: Option<&Path>) -> Router {
        let db = BoardDb::new_in_memory().unwrap();
        let state = Arc::new(AppState {
            db: DbHandle::new(db),
            strict_reorder: false,
        });
        build_router(state, static_dir)
    }

    fn frontend_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>board app</html>").unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/app.js"), "console.log('hi');").unwrap();
        dir
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_health_via_full_router() {
        let (status, _) = get(test_router(None), "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_routes_mounted() {
        let dir = frontend_dir();
        let (status, body) = get(test_router(Some(dir.path())), "/api/columns").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Backlog"));
    }

    #[tokio::test]
    async fn test_unknown_api_path_is_not_spa() {
        let dir = frontend_dir();
        let (status, body) = get(test_router(Some(dir.path())), "/api/missing/thing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Not found"));
    }

    #[tokio::test]
    async fn test_static_files_served() {
        let dir = frontend_dir();
        let (status, body) = get(test_router(Some(dir.path())), "/assets/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("console.log"));
    }

    #[tokio::test]
    async fn test_spa_fallback_serves_index_html() {
        let dir = frontend_dir();
        let (status, body) = get(test_router(Some(dir.path())), "/some/client/route").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("board app"));

        let (status, body) = get(test_router(Some(dir.path())), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("board app"));
    }

    #[tokio::test]
    async fn test_missing_frontend_is_not_found() {
        let missing = PathBuf::from("/definitely/not/a/frontend");
        let (status, body) = get(test_router(Some(&missing)), "/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Frontend not found"));

        let (status, _) = get(test_router(None), "/index.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_open_database_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/board.db");
        open_database(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_path, PathBuf::from("data/board.db"));
        assert!(!config.dev_mode);
        assert!(!config.strict_reorder);
    }
}
