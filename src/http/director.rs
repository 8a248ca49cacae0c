//! Request phase: point the request at the backend and run request modifiers.
//!
//! # Responsibilities
//! - Join the backend base path with the incoming path
//! - Merge the backend base query with the incoming query
//! - Pin an empty User-Agent when the client sent none
//! - Run request hooks of matching modifiers, in chain order
//!
//! # Design Decisions
//! - Modifiers match against the original incoming path, percent-decoded,
//!   in both phases; the raw path is what gets forwarded
//! - Never fails: request hooks have no error channel
//! - The chain is injected as `Arc<ModifierChain>`, never captured mutably

use std::str::FromStr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::uri::{Authority, Scheme};
use axum::http::{header, HeaderValue, Request, Uri};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::BackendError;
use crate::modifier::ModifierChain;

/// The decoded incoming request path, before it was rewritten for the backend.
///
/// Inserted into request extensions by the director and copied onto the
/// response by the proxy, so hooks can tell which path was matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPath(pub String);

/// The parsed backend base URL.
#[derive(Debug, Clone)]
pub struct BackendTarget {
    scheme: Scheme,
    authority: Authority,
    path: String,
    query: String,
}

impl BackendTarget {
    /// Parse a base URL such as `http://10.0.0.5:8080/api?key=1`.
    pub fn parse(url: &str) -> Result<Self, BackendError> {
        let url = Url::parse(url)?;
        if url.scheme() != "http" {
            return Err(BackendError::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = url.host_str().ok_or(BackendError::MissingHost)?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            scheme: Scheme::HTTP,
            authority: Authority::from_str(&authority)?,
            path: url.path().to_string(),
            query: url.query().unwrap_or_default().to_string(),
        })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Join two path segments with exactly one `/` at the junction.
pub fn join_path(base: &str, incoming: &str) -> String {
    match (base.ends_with('/'), incoming.starts_with('/')) {
        (true, true) => format!("{}{}", base, &incoming[1..]),
        (false, false) => format!("{}/{}", base, incoming),
        _ => format!("{}{}", base, incoming),
    }
}

/// Percent-decode a raw URI path for modifier matching.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Concatenate two raw query strings, adding `&` only between non-empty parts.
pub fn merge_query(base: &str, incoming: &str) -> String {
    if base.is_empty() || incoming.is_empty() {
        format!("{}{}", base, incoming)
    } else {
        format!("{}&{}", base, incoming)
    }
}

/// Rewrites requests for the backend and runs request-phase modifiers.
#[derive(Debug, Clone)]
pub struct Director {
    target: BackendTarget,
    chain: Arc<ModifierChain>,
}

impl Director {
    pub fn new(target: BackendTarget, chain: Arc<ModifierChain>) -> Self {
        Self { target, chain }
    }

    pub fn target(&self) -> &BackendTarget {
        &self.target
    }

    /// Compute the outbound `(path, query)` for an incoming path and raw query.
    pub fn build_outbound_url(&self, incoming_path: &str, incoming_query: &str) -> (String, String) {
        (
            join_path(&self.target.path, incoming_path),
            merge_query(&self.target.query, incoming_query),
        )
    }

    /// Prepare a request for forwarding, in place.
    pub fn prepare_request(&self, req: &mut Request<Body>) {
        let original_path = decode_path(req.uri().path());
        let (path, query) =
            self.build_outbound_url(req.uri().path(), req.uri().query().unwrap_or_default());

        let path_and_query = if query.is_empty() {
            path
        } else {
            format!("{}?{}", path, query)
        };

        match Uri::builder()
            .scheme(self.target.scheme.clone())
            .authority(self.target.authority.clone())
            .path_and_query(path_and_query)
            .build()
        {
            Ok(uri) => *req.uri_mut() = uri,
            Err(e) => {
                tracing::error!(path = %original_path, error = %e, "Failed to build outbound URI");
            }
        }

        // Keep the forwarding client from announcing itself.
        if !req.headers().contains_key(header::USER_AGENT) {
            req.headers_mut()
                .insert(header::USER_AGENT, HeaderValue::from_static(""));
        }

        for modifier in self.chain.iter() {
            modifier.apply_request(&original_path, req);
        }

        tracing::debug!(
            original_path = %original_path,
            outbound = %req.uri(),
            "Request prepared"
        );

        req.extensions_mut().insert(OriginalPath(original_path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ModifierDescriptor;

    fn director(base: &str, chain: ModifierChain) -> Director {
        Director::new(BackendTarget::parse(base).unwrap(), Arc::new(chain))
    }

    fn request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/api/", "/v1/x"), "/api/v1/x");
        assert_eq!(join_path("/api", "v1/x"), "/api/v1/x");
        assert_eq!(join_path("/api", "/v1/x"), "/api/v1/x");
        assert_eq!(join_path("/api/", "v1/x"), "/api/v1/x");
        assert_eq!(join_path("/", "/"), "/");
    }

    #[test]
    fn test_merge_query() {
        assert_eq!(merge_query("a=1", ""), "a=1");
        assert_eq!(merge_query("", "b=2"), "b=2");
        assert_eq!(merge_query("a=1", "b=2"), "a=1&b=2");
        assert_eq!(merge_query("", ""), "");
    }

    #[test]
    fn test_backend_target_parse() {
        let target = BackendTarget::parse("http://10.0.0.5:8080/base?key=1").unwrap();
        assert_eq!(target.authority().as_str(), "10.0.0.5:8080");
        assert_eq!(target.path(), "/base");
        assert_eq!(target.query(), "key=1");

        let target = BackendTarget::parse("http://backend.internal").unwrap();
        assert_eq!(target.authority().as_str(), "backend.internal");
        assert_eq!(target.path(), "/");
        assert_eq!(target.query(), "");

        assert!(matches!(
            BackendTarget::parse("https://secure.example.com"),
            Err(BackendError::UnsupportedScheme(_))
        ));
        assert!(matches!(BackendTarget::parse("not a url"), Err(BackendError::Parse(_))));
    }

    #[test]
    fn test_prepare_rewrites_uri() {
        let director = director("http://127.0.0.1:3000/api/?key=1", ModifierChain::new());

        let mut req = request("/v1/users?page=2");
        director.prepare_request(&mut req);
        assert_eq!(
            req.uri().to_string(),
            "http://127.0.0.1:3000/api/v1/users?key=1&page=2"
        );

        let mut req = request("/health");
        director.prepare_request(&mut req);
        assert_eq!(req.uri().to_string(), "http://127.0.0.1:3000/api/health?key=1");
    }

    #[test]
    fn test_prepare_without_base_path() {
        let director = director("http://127.0.0.1:3000", ModifierChain::new());

        let mut req = request("/a/b?c=d");
        director.prepare_request(&mut req);
        assert_eq!(req.uri().to_string(), "http://127.0.0.1:3000/a/b?c=d");
        assert_eq!(
            req.extensions().get::<OriginalPath>(),
            Some(&OriginalPath("/a/b".into()))
        );
    }

    #[test]
    fn test_user_agent_shim() {
        let director = director("http://127.0.0.1:3000", ModifierChain::new());

        let mut req = request("/");
        director.prepare_request(&mut req);
        assert_eq!(req.headers()[header::USER_AGENT], "");

        let mut req = Request::builder()
            .uri("/")
            .header(header::USER_AGENT, "curl/8.0")
            .body(Body::empty())
            .unwrap();
        director.prepare_request(&mut req);
        assert_eq!(req.headers()[header::USER_AGENT], "curl/8.0");
    }

    #[test]
    fn test_request_hooks_run_in_order_against_original_path() {
        let mut chain = ModifierChain::new();
        chain
            .register(ModifierDescriptor::new("^/api").on_request(|req| {
                req.headers_mut().append("x-trail", HeaderValue::from_static("first"));
            }))
            .unwrap();
        chain
            .register(ModifierDescriptor::new("^/backend").on_request(|req| {
                req.headers_mut().append("x-trail", HeaderValue::from_static("rewritten"));
            }))
            .unwrap();
        chain
            .register(ModifierDescriptor::new("users$").on_request(|req| {
                req.headers_mut().append("x-trail", HeaderValue::from_static("second"));
            }))
            .unwrap();
        let director = director("http://127.0.0.1:3000/backend", chain);

        let mut req = request("/api/users");
        director.prepare_request(&mut req);

        assert_eq!(req.uri().path(), "/backend/api/users");
        let trail: Vec<_> = req
            .headers()
            .get_all("x-trail")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(trail, vec!["first", "second"]);
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/my%20file"), "/my file");
        assert_eq!(decode_path("/plain/path"), "/plain/path");
        assert_eq!(decode_path("/caf%C3%A9"), "/café");
        assert_eq!(decode_path("/bad%FF"), "/bad\u{FFFD}");
        assert_eq!(decode_path("/100%"), "/100%");
    }

    #[test]
    fn test_encoded_path_matches_decoded_but_forwards_raw() {
        let mut chain = ModifierChain::new();
        chain
            .register(ModifierDescriptor::new("^/my file$").on_request(|req| {
                req.headers_mut().insert("x-matched", HeaderValue::from_static("yes"));
            }))
            .unwrap();
        let director = director("http://127.0.0.1:3000/base", chain);

        let mut req = request("/my%20file?x=1");
        director.prepare_request(&mut req);

        assert_eq!(req.headers()["x-matched"], "yes");
        assert_eq!(req.uri().to_string(), "http://127.0.0.1:3000/base/my%20file?x=1");
        assert_eq!(
            req.extensions().get::<OriginalPath>(),
            Some(&OriginalPath("/my file".into()))
        );
    }

    #[test]
    fn test_disable_encoding_only_on_match() {
        let mut chain = ModifierChain::new();
        chain
            .register(ModifierDescriptor::new("\\.html$").disable_encoding())
            .unwrap();
        let director = director("http://127.0.0.1:3000", chain);

        let mut req = Request::builder()
            .uri("/index.html")
            .header(header::ACCEPT_ENCODING, "gzip")
            .body(Body::empty())
            .unwrap();
        director.prepare_request(&mut req);
        assert_eq!(req.headers()[header::ACCEPT_ENCODING], "");

        let mut req = Request::builder()
            .uri("/app.js")
            .header(header::ACCEPT_ENCODING, "gzip")
            .body(Body::empty())
            .unwrap();
        director.prepare_request(&mut req);
        assert_eq!(req.headers()[header::ACCEPT_ENCODING], "gzip");
    }
}
