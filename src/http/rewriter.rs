//! Response phase: run response modifiers and rewrite bodies.
//!
//! # Responsibilities
//! - Run response hooks of matching modifiers, in chain order
//! - Buffer the body for body hooks and install the rewritten bytes
//! - Keep Content-Length consistent with the rewritten body
//!
//! # Design Decisions
//! - Per modifier, the response hook runs before the body hook
//! - Body hooks chain: each sees the previous hook's output
//! - First failure aborts; the caller must discard the response

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Response};

use crate::error::RewriteError;
use crate::modifier::ModifierChain;

/// Applies response-phase modifiers.
#[derive(Debug, Clone)]
pub struct ResponseRewriter {
    chain: Arc<ModifierChain>,
    max_body_bytes: usize,
}

impl ResponseRewriter {
    pub fn new(chain: Arc<ModifierChain>, max_body_bytes: usize) -> Self {
        Self {
            chain,
            max_body_bytes,
        }
    }

    /// Rewrite `resp`, produced for a request whose original path was `path`.
    ///
    /// On error the response may be partially modified and must not be
    /// delivered to the client.
    pub async fn rewrite_response(
        &self,
        path: &str,
        resp: &mut Response<Body>,
    ) -> Result<(), RewriteError> {
        for modifier in self.chain.matching(path) {
            if let Some(response_fn) = modifier.response_fn() {
                response_fn(&mut *resp).map_err(|source| RewriteError::Modifier {
                    pattern: modifier.pattern().to_string(),
                    source,
                })?;
            }

            if let Some(body_fn) = modifier.body_fn() {
                // Taking the body drops the original stream once it is read.
                let body = std::mem::take(resp.body_mut());
                let bytes = axum::body::to_bytes(body, self.max_body_bytes)
                    .await
                    .map_err(RewriteError::BodyRead)?;
                let original_len = bytes.len();

                let rewritten = body_fn(&*resp, bytes);
                tracing::trace!(
                    pattern = %modifier.pattern(),
                    original_len,
                    rewritten_len = rewritten.len(),
                    "Response body rewritten"
                );
                replace_body(resp, rewritten);
            }
        }

        Ok(())
    }
}

/// Install `bytes` as the body and make the length headers agree with it.
fn replace_body(resp: &mut Response<Body>, bytes: Bytes) {
    let len = bytes.len();
    *resp.body_mut() = Body::from(bytes);

    let headers = resp.headers_mut();
    headers.remove(header::TRANSFER_ENCODING);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
}
