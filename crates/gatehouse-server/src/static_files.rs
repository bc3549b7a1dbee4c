//! Static file serving for the browser client.

use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

const NOT_FOUND_BODY: &str = "Not Found";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type for a file, by extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") => "text/html",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("ico") => "image/x-icon",
        Some("svg") => "image/svg+xml",
        Some("txt") => "text/plain",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Files under a root directory, with `/` mapped to an index file.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_file: String,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, index_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index_file: index_file.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path to a file under the root.
    ///
    /// Returns `None` for paths that would leave the root.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = request_path.trim_start_matches('/');
        let relative = if relative.is_empty() {
            self.index_file.as_str()
        } else {
            relative
        };

        let mut resolved = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(resolved)
    }

    /// Serve the file for `request_path`, or a plain-text 404.
    pub async fn serve(&self, request_path: &str) -> Response {
        let Some(path) = self.resolve(request_path) else {
            tracing::debug!(path = %request_path, "Rejected static path");
            return not_found();
        };

        match tokio::fs::read(&path).await {
            Ok(contents) => {
                let mut response = Response::new(Body::from(contents));
                response.headers_mut().insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static(content_type_for(&path)),
                );
                response
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Static file not served");
                not_found()
            }
        }
    }
}

/// Plain-text 404.
pub fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(CONTENT_TYPE, "text/plain")],
        NOT_FOUND_BODY,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn body_string(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn site() -> (TempDir, StaticFiles) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        std::fs::create_dir(dir.path().join("js")).unwrap();
        std::fs::write(dir.path().join("js/app.js"), "console.log(1)").unwrap();
        let files = StaticFiles::new(dir.path(), "index.html");
        (dir, files)
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("a.html")), "text/html");
        assert_eq!(content_type_for(Path::new("a.js")), "text/javascript");
        assert_eq!(content_type_for(Path::new("a.CSS")), "text/css");
        assert_eq!(content_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.svg")), "image/svg+xml");
        assert_eq!(content_type_for(Path::new("a.wasm")), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("Makefile")), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let files = StaticFiles::new("/srv/site", "index.html");
        assert_eq!(
            files.resolve("/"),
            Some(PathBuf::from("/srv/site/index.html"))
        );
        assert_eq!(
            files.resolve("/js/./app.js"),
            Some(PathBuf::from("/srv/site/js/app.js"))
        );
        assert_eq!(files.resolve("/../etc/passwd"), None);
        assert_eq!(files.resolve("/js/../../secret"), None);
    }

    #[tokio::test]
    async fn test_serve_index_and_nested_file() {
        let (_dir, files) = site();

        let index = files.serve("/").await;
        assert_eq!(index.status(), StatusCode::OK);
        assert_eq!(index.headers()[CONTENT_TYPE], "text/html");
        assert_eq!(body_string(index).await, "<h1>home</h1>");

        let script = files.serve("/js/app.js").await;
        assert_eq!(script.headers()[CONTENT_TYPE], "text/javascript");
    }

    #[tokio::test]
    async fn test_missing_file_is_plain_404() {
        let (_dir, files) = site();

        let response = files.serve("/nope.css").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(body_string(response).await, "Not Found");
    }

    #[tokio::test]
    async fn test_directory_is_404() {
        let (_dir, files) = site();
        assert_eq!(files.serve("/js").await.status(), StatusCode::NOT_FOUND);
    }
}
