//! HTTP fetcher backed by ureq
//!
//! ureq is blocking, so each request runs on tokio's blocking pool.
//! Redirects are not followed: a 3xx comes back as an `OpaqueRedirect`
//! response, which the controller passes through without caching.

use crate::error::{ShellcacheError, ShellcacheResult};
use crate::http::{Headers, Method, Request, Response, ResponseType};
use crate::network::Fetcher;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::{Origin, Url};

/// Fetches from a live HTTP origin
pub struct HttpFetcher {
    agent: ureq::Agent,
    origin: Origin,
}

impl HttpFetcher {
    /// Create a fetcher for requests made on behalf of `origin`
    pub fn new(origin: &Url, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            agent,
            origin: origin.origin(),
        }
    }

    /// Classify a response relative to the controller's origin
    fn response_type(&self, url: &Url, status: u16, headers: &Headers) -> ResponseType {
        if (300..400).contains(&status) {
            ResponseType::OpaqueRedirect
        } else if url.origin() == self.origin {
            ResponseType::Basic
        } else if headers.contains("access-control-allow-origin") {
            ResponseType::Cors
        } else {
            ResponseType::Opaque
        }
    }

    fn fetch_blocking(agent: &ureq::Agent, request: &Request) -> ShellcacheResult<Response> {
        let url = request.url.as_str();
        let mut builder = match request.method {
            Method::Get => agent.get(url),
            Method::Head => agent.head(url),
            other => {
                return Err(ShellcacheError::network(
                    url,
                    format!("{} is never fetched by the controller", other),
                ))
            }
        };
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        let mut response = builder
            .call()
            .map_err(|e| ShellcacheError::network(url, e.to_string()))?;

        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| ShellcacheError::network(url, format!("reading body: {}", e)))?;

        let mut out = Response::new(status, body);
        out.headers = headers;
        Ok(out)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> ShellcacheResult<Response> {
        let agent = self.agent.clone();
        let owned = request.clone();

        let mut response = tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, &owned))
            .await
            .map_err(|e| ShellcacheError::Internal(format!("fetch task failed: {}", e)))??;

        response.kind = self.response_type(&request.url, response.status, &response.headers);
        debug!(
            "{} {} -> {} ({})",
            request.method, request.url, response.status, response.kind
        );
        Ok(response)
    }

    fn fetcher_name(&self) -> &'static str {
        "http"
    }
}
