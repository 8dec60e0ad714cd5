//! Serve a local asset directory as if it were the origin

use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::{Method, Request, Response, ResponseType};
use crate::network::Fetcher;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use url::{Origin, Url};

/// Answers same-origin requests from files under `root`.
///
/// `scope` is stripped from request paths before mapping them to files, and a
/// path ending in `/` maps to its `index.html`. A missing directory root is
/// reported as a network failure, so pointing at an unmounted volume behaves
/// like being offline.
pub struct DirFetcher {
    root: PathBuf,
    origin: Origin,
    scope: String,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>, origin: &Url, scope: &str) -> Self {
        Self {
            root: root.into(),
            origin: origin.origin(),
            scope: scope.to_string(),
        }
    }

    /// Map a URL path to a file under the root, rejecting traversal
    fn resolve(&self, url_path: &str) -> Option<PathBuf> {
        let relative = url_path
            .strip_prefix(self.scope.as_str())
            .or_else(|| url_path.strip_prefix('/'))?;
        let relative = if relative.is_empty() || relative.ends_with('/') {
            format!("{}index.html", relative)
        } else {
            relative.to_string()
        };

        let path = Path::new(&relative);
        if path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(path))
    }
}

/// Content type from a file extension
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "webmanifest" => "application/manifest+json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl Fetcher for DirFetcher {
    async fn fetch(&self, request: &Request) -> ShellcacheResult<Response> {
        let url = request.url.as_str();
        if request.url.origin() != self.origin {
            return Err(ShellcacheError::network(url, "origin not served by this directory"));
        }
        if !fs::metadata(&self.root).await.is_ok_and(|m| m.is_dir()) {
            return Err(ShellcacheError::network(
                url,
                format!("asset directory {} is unavailable", self.root.display()),
            ));
        }

        let Some(path) = self.resolve(request.url.path()) else {
            return Ok(Response::new(404, "Not Found"));
        };

        match fs::read(&path).await {
            Ok(body) => {
                let body = if request.method == Method::Head { vec![] } else { body };
                Ok(Response::new(200, body)
                    .with_header("Content-Type", content_type_for(&path))
                    .with_kind(ResponseType::Basic))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Response::new(404, "Not Found").with_header("Content-Type", "text/plain"))
            }
            Err(e) => Err(ShellcacheError::network(url, e.to_string())),
        }
    }

    fn fetcher_name(&self) -> &'static str {
        "directory"
    }
}
