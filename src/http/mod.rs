//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → proxy.rs (facade)
//!         → director.rs (backend URL, User-Agent, request modifiers)
//!         → forwarding.rs (hop-by-hop, X-Forwarded-For, Host)
//!         → hyper client → backend
//!         → rewriter.rs (response modifiers, body rewrite, Content-Length)
//!     → Send to client
//! ```

pub mod director;
pub mod forwarding;
pub mod proxy;
pub mod request;
pub mod rewriter;
pub mod server;

pub use director::{decode_path, BackendTarget, Director, OriginalPath};
pub use proxy::{ProxyOptions, RoutingProxy};
pub use request::X_REQUEST_ID;
pub use rewriter::ResponseRewriter;
pub use server::HttpServer;
