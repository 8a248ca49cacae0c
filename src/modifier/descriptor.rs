//! Modifier descriptors and their compiled form.
//!
//! A [`ModifierDescriptor`] is what callers build during setup. Registering it
//! on a [`ModifierChain`](super::ModifierChain) compiles the path pattern and
//! yields an immutable [`Modifier`].
//!
//! Hooks mutate the request/response in place. They only ever see objects
//! owned by the request currently being handled and must not retain them.

use std::fmt;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Request, Response};

use super::matcher::PathMatcher;
use crate::error::{BoxError, ModifierError};

/// Request-phase hook. Must be total: there is no error channel.
pub type RequestFn = Arc<dyn Fn(&mut Request<Body>) + Send + Sync>;

/// Response-phase hook for status and headers.
pub type ResponseFn = Arc<dyn Fn(&mut Response<Body>) -> Result<(), BoxError> + Send + Sync>;

/// Response-phase hook that rewrites the fully buffered body.
pub type BodyFn = Arc<dyn Fn(&Response<Body>, Bytes) -> Bytes + Send + Sync>;

/// Uncompiled modifier, built during setup.
#[derive(Clone, Default)]
pub struct ModifierDescriptor {
    /// Regular expression matched against the incoming request path.
    pub matching_path: String,
    /// Force an empty `Accept-Encoding` so bodies arrive uncompressed.
    pub disable_encoding: bool,
    pub request_fn: Option<RequestFn>,
    pub response_fn: Option<ResponseFn>,
    pub body_fn: Option<BodyFn>,
}

impl ModifierDescriptor {
    /// Create an inert descriptor for the given path pattern.
    pub fn new(matching_path: impl Into<String>) -> Self {
        Self {
            matching_path: matching_path.into(),
            ..Self::default()
        }
    }

    pub fn disable_encoding(mut self) -> Self {
        self.disable_encoding = true;
        self
    }

    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request<Body>) + Send + Sync + 'static,
    {
        self.request_fn = Some(Arc::new(f));
        self
    }

    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Response<Body>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.response_fn = Some(Arc::new(f));
        self
    }

    pub fn on_body<F>(mut self, f: F) -> Self
    where
        F: Fn(&Response<Body>, Bytes) -> Bytes + Send + Sync + 'static,
    {
        self.body_fn = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ModifierDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifierDescriptor")
            .field("matching_path", &self.matching_path)
            .field("disable_encoding", &self.disable_encoding)
            .field("request_fn", &self.request_fn.is_some())
            .field("response_fn", &self.response_fn.is_some())
            .field("body_fn", &self.body_fn.is_some())
            .finish()
    }
}

/// A registered, immutable modifier.
#[derive(Clone)]
pub struct Modifier {
    matcher: PathMatcher,
    disable_encoding: bool,
    request_fn: Option<RequestFn>,
    response_fn: Option<ResponseFn>,
    body_fn: Option<BodyFn>,
}

impl Modifier {
    /// Compile a descriptor. Fails if the path pattern is invalid.
    pub fn compile(descriptor: ModifierDescriptor) -> Result<Self, ModifierError> {
        let matcher = PathMatcher::compile(&descriptor.matching_path)?;
        Ok(Self {
            matcher,
            disable_encoding: descriptor.disable_encoding,
            request_fn: descriptor.request_fn,
            response_fn: descriptor.response_fn,
            body_fn: descriptor.body_fn,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn disables_encoding(&self) -> bool {
        self.disable_encoding
    }

    pub fn response_fn(&self) -> Option<&ResponseFn> {
        self.response_fn.as_ref()
    }

    pub fn body_fn(&self) -> Option<&BodyFn> {
        self.body_fn.as_ref()
    }

    /// Run the request phase of this modifier.
    ///
    /// `path` is the original incoming path; `req` has already been pointed
    /// at the backend. Does nothing when the path does not match.
    pub fn apply_request(&self, path: &str, req: &mut Request<Body>) {
        if !self.matches(path) {
            return;
        }

        if let Some(request_fn) = &self.request_fn {
            request_fn(&mut *req);
        }

        if self.disable_encoding {
            req.headers_mut()
                .insert(header::ACCEPT_ENCODING, HeaderValue::from_static(""));
        }
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifier")
            .field("pattern", &self.pattern())
            .field("disable_encoding", &self.disable_encoding)
            .field("request_fn", &self.request_fn.is_some())
            .field("response_fn", &self.response_fn.is_some())
            .field("body_fn", &self.body_fn.is_some())
            .finish()
    }
}
