//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a catch-all proxy handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind server to listener
//! - Hand every request to the routing proxy
//! - Shut down gracefully on signal

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::SetupError;
use crate::http::proxy::{ProxyOptions, RoutingProxy};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::modifier::ModifierChain;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<RoutingProxy>,
}

/// HTTP server for the routing proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server whose modifier chain comes from `config.modifiers`.
    pub fn new(config: ProxyConfig) -> Result<Self, SetupError> {
        let chain = ModifierChain::from_config(&config.modifiers)?;
        Self::with_chain(config, chain)
    }

    /// Create a server with a caller-built chain.
    ///
    /// `config.modifiers` is ignored; use [`ModifierChain::from_config`] and
    /// register further modifiers on the result to combine both.
    pub fn with_chain(config: ProxyConfig, chain: ModifierChain) -> Result<Self, SetupError> {
        let proxy = RoutingProxy::new(
            &config.backend.url,
            chain,
            ProxyOptions::from_config(&config),
        )?;

        let state = AppState {
            proxy: Arc::new(proxy),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend.url,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Catch-all handler: every path goes to the backend.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    state.proxy.forward(request, Some(addr)).await
}
