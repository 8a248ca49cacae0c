//! Routing proxy: a single-backend reverse proxy with path-scoped
//! request/response modifiers.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http::server ──▶ http::proxy ──▶ director ──▶ hyper client ──▶ Backend
//!                                     │                                          │
//!     Client ◀───────────────────── rewriter ◀───────────────────────────────────┘
//!
//!     director and rewriter share one frozen Arc<ModifierChain>
//! ```
//!
//! # Example
//!
//! ```no_run
//! use routing_proxy::modifier::{ModifierChain, ModifierDescriptor};
//! use routing_proxy::http::{ProxyOptions, RoutingProxy};
//!
//! let mut chain = ModifierChain::new();
//! chain
//!     .register(
//!         ModifierDescriptor::new(r"\.html$")
//!             .disable_encoding()
//!             .on_body(|_, body| body.to_ascii_uppercase().into()),
//!     )
//!     .unwrap();
//!
//! let proxy = RoutingProxy::new("http://127.0.0.1:3000/app", chain, ProxyOptions::default());
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod modifier;
pub mod observability;

pub use config::ProxyConfig;
pub use error::{BackendError, BoxError, ModifierError, RewriteError, SetupError};
pub use http::{HttpServer, RoutingProxy};
pub use lifecycle::Shutdown;
pub use modifier::{ModifierChain, ModifierDescriptor};
