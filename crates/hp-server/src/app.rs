//! Router construction.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use hp_build::RELOAD_SCRIPT_PATH;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::middleware::headers;
use crate::state::AppState;

/// Create the application router.
///
/// Serves the reload client (when enabled) and falls back to the files in
/// `dist/`; directory requests resolve to their `index.html`.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new();

    if state.reload_script.is_some() {
        router = router.route(RELOAD_SCRIPT_PATH, get(reload_script));
    }

    router = router
        .fallback_service(ServeDir::new(&state.dist_dir))
        .layer(
            ServiceBuilder::new()
                .layer(headers::no_cache_layer())
                .layer(headers::content_type_options_layer()),
        );

    if state.verbose {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

async fn reload_script(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        state.reload_script.clone().unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use axum::body::Body;
    use axum::http::{HeaderMap, Request, StatusCode};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;
    use crate::live_reload;

    fn router(dist: &Path, with_reload: bool) -> Router {
        create_router(Arc::new(AppState {
            dist_dir: dist.to_path_buf(),
            reload_script: with_reload.then(|| live_reload::reload_script("/sha256.txt", 1000)),
            verbose: false,
        }))
    }

    fn write_dist(dist: &Path) {
        fs::create_dir_all(dist.join("blog")).unwrap();
        fs::write(dist.join("index.html"), "<h1>Home</h1>").unwrap();
        fs::write(dist.join("blog/index.html"), "<h1>Blog</h1>").unwrap();
        fs::write(dist.join("sha256.txt"), "abc123").unwrap();
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, HeaderMap, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_serves_root_index() {
        let dir = tempfile::tempdir().unwrap();
        write_dist(dir.path());

        let (status, _, body) = get(router(dir.path(), false), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>Home</h1>");
    }

    #[tokio::test]
    async fn test_serves_nested_index() {
        let dir = tempfile::tempdir().unwrap();
        write_dist(dir.path());

        let (status, _, body) = get(router(dir.path(), false), "/blog/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>Blog</h1>");
    }

    #[tokio::test]
    async fn test_directory_without_slash_redirects() {
        let dir = tempfile::tempdir().unwrap();
        write_dist(dir.path());

        let (status, headers, _) = get(router(dir.path(), false), "/blog").await;

        assert!(status.is_redirection());
        assert_eq!(headers[header::LOCATION], "/blog/");
    }

    #[tokio::test]
    async fn test_marker_is_not_cacheable() {
        let dir = tempfile::tempdir().unwrap();
        write_dist(dir.path());

        let (status, headers, body) = get(router(dir.path(), false), "/sha256.txt").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "abc123");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }

    #[tokio::test]
    async fn test_missing_file_is_404_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        write_dist(dir.path());

        let (status, headers, _) = get(router(dir.path(), false), "/nope.txt").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    }

    #[tokio::test]
    async fn test_reload_script_served_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        write_dist(dir.path());

        let (status, headers, body) = get(router(dir.path(), true), RELOAD_SCRIPT_PATH).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "text/javascript; charset=utf-8"
        );
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert!(body.contains(r#""/sha256.txt""#));
    }

    #[tokio::test]
    async fn test_reload_script_absent_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        write_dist(dir.path());

        let (status, _, _) = get(router(dir.path(), false), RELOAD_SCRIPT_PATH).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
