//! Path-scoped request/response modifiers.
//!
//! # Data Flow
//! ```text
//! Setup:
//!     ModifierDescriptor (pattern + optional hooks)
//!     → ModifierChain::register (compile pattern, append)
//!     → Arc<ModifierChain> (frozen, shared)
//!
//! Serving:
//!     Director          → chain.matching(path) → request hooks
//!     ResponseRewriter  → chain.matching(path) → response hooks, body hooks
//! ```
//!
//! # Design Decisions
//! - Chains are compiled at startup, immutable at runtime
//! - Strict registration order, no priority sorting
//! - Every hook is optional

pub mod chain;
pub mod declarative;
pub mod descriptor;
pub mod matcher;

pub use chain::ModifierChain;
pub use declarative::DeclarativeError;
pub use descriptor::{BodyFn, Modifier, ModifierDescriptor, RequestFn, ResponseFn};
pub use matcher::PathMatcher;
