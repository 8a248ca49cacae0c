//! The proxy facade: director → forwarding client → response rewriter.
//!
//! # Responsibilities
//! - Prepare each request with the director
//! - Forward it with the pooled hyper client
//! - Rewrite the backend response before handing it back
//! - Map transport and rewrite failures to 502 Bad Gateway
//!
//! # Design Decisions
//! - A failed rewrite discards the response; a 502 is sent instead
//! - Request bodies are streamed, only rewritten response bodies are buffered
//! - No retries: one backend, one attempt

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::ProxyConfig;
use crate::error::BackendError;
use crate::http::director::{decode_path, BackendTarget, Director, OriginalPath};
use crate::http::forwarding;
use crate::http::request::request_id_of;
use crate::http::rewriter::ResponseRewriter;
use crate::modifier::ModifierChain;
use crate::observability::metrics;

/// Tunables for the forwarding side.
#[derive(Debug, Clone)]
pub struct ProxyOptions {
    /// Backend connect timeout.
    pub connect_timeout: Duration,
    /// Largest body a body modifier will buffer.
    pub max_body_bytes: usize,
    /// Forward the client's Host header instead of the backend authority.
    pub preserve_host: bool,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self::from_config(&ProxyConfig::default())
    }
}

impl ProxyOptions {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.timeouts.connect_secs),
            max_body_bytes: config.body.max_buffer_bytes,
            preserve_host: config.backend.preserve_host,
        }
    }
}

/// Single-backend reverse proxy with modifier support.
#[derive(Clone)]
pub struct RoutingProxy {
    director: Director,
    rewriter: ResponseRewriter,
    client: Client<HttpConnector, Body>,
    preserve_host: bool,
}

impl RoutingProxy {
    /// Create a proxy for `backend_url`, freezing `chain` for both phases.
    pub fn new(
        backend_url: &str,
        chain: ModifierChain,
        options: ProxyOptions,
    ) -> Result<Self, BackendError> {
        let target = BackendTarget::parse(backend_url)?;
        let chain = Arc::new(chain);

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(options.connect_timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        tracing::info!(
            backend = %backend_url,
            modifiers = chain.len(),
            "Routing proxy initialized"
        );

        Ok(Self {
            director: Director::new(target, chain.clone()),
            rewriter: ResponseRewriter::new(chain, options.max_body_bytes),
            client,
            preserve_host: options.preserve_host,
        })
    }

    pub fn director(&self) -> &Director {
        &self.director
    }

    pub fn rewriter(&self) -> &ResponseRewriter {
        &self.rewriter
    }

    /// Forward one request and return the (possibly rewritten) response.
    ///
    /// Never fails: errors become 502 responses.
    pub async fn forward(&self, mut req: Request<Body>, client_addr: Option<SocketAddr>) -> Response<Body> {
        let start = Instant::now();
        let method = req.method().to_string();
        let request_id = request_id_of(&req);
        let original_path = decode_path(req.uri().path());

        self.director.prepare_request(&mut req);
        self.prepare_headers(&mut req, client_addr);

        let response = match self.client.request(req).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(request_id = %request_id, path = %original_path, error = %e, "Upstream error");
                metrics::record_upstream_error();
                metrics::record_request(&method, 502, start);
                return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
            }
        };

        let mut response = into_proxy_response(response, &original_path);

        if let Err(e) = self.rewriter.rewrite_response(&original_path, &mut response).await {
            tracing::error!(
                request_id = %request_id,
                path = %original_path,
                error = %e,
                "Response rewrite failed, discarding backend response"
            );
            metrics::record_rewrite_failure(e.reason());
            metrics::record_request(&method, 502, start);
            return (StatusCode::BAD_GATEWAY, "Response rewrite failed").into_response();
        }

        let status = response.status();
        tracing::debug!(
            request_id = %request_id,
            path = %original_path,
            status = %status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request proxied"
        );
        metrics::record_request(&method, status.as_u16(), start);
        response
    }

    fn prepare_headers(&self, req: &mut Request<Body>, client_addr: Option<SocketAddr>) {
        let headers = req.headers_mut();
        forwarding::strip_hop_by_hop(headers);

        if let Some(addr) = client_addr {
            forwarding::append_forwarded_for(headers, addr.ip());
        }

        if !self.preserve_host {
            forwarding::set_host(headers, self.director.target().authority());
        }
    }
}

fn into_proxy_response(response: Response<Incoming>, original_path: &str) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    forwarding::strip_hop_by_hop(&mut parts.headers);
    parts.extensions.insert(OriginalPath(original_path.to_string()));
    Response::from_parts(parts, Body::new(body))
}
