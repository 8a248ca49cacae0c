//! Modifiers built from configuration.
//!
//! Config files cannot carry functions, so `[[modifiers]]` entries describe a
//! fixed set of edits that are turned into hooks here:
//! - `request_headers` → request hook
//! - `response_headers` → response hook (never fails)
//! - `body_replace` → body hook

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use regex::bytes::Regex;

use super::descriptor::{Modifier, ModifierDescriptor};
use crate::config::{HeaderRules, ModifierConfig};
use crate::error::ModifierError;

/// Errors raised while turning a `[[modifiers]]` entry into a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum DeclarativeError {
    #[error(transparent)]
    Pattern(#[from] ModifierError),

    #[error("invalid body_replace pattern {pattern:?}: {source}")]
    BodyPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid header name {0:?}")]
    HeaderName(String),

    #[error("invalid value for header {0:?}")]
    HeaderValue(String),
}

/// Header edits with names and values already parsed.
#[derive(Debug, Clone)]
struct CompiledHeaderRules {
    set: Vec<(HeaderName, HeaderValue)>,
    remove: Vec<HeaderName>,
}

impl CompiledHeaderRules {
    fn compile(rules: &HeaderRules) -> Result<Self, DeclarativeError> {
        let set = rules
            .set
            .iter()
            .map(|(name, value)| {
                let header = parse_name(name)?;
                let value = HeaderValue::from_str(value)
                    .map_err(|_| DeclarativeError::HeaderValue(name.clone()))?;
                Ok((header, value))
            })
            .collect::<Result<Vec<_>, DeclarativeError>>()?;

        let remove = rules
            .remove
            .iter()
            .map(|name| parse_name(name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { set, remove })
    }

    fn apply(&self, headers: &mut HeaderMap) {
        for name in &self.remove {
            headers.remove(name);
        }
        for (name, value) in &self.set {
            headers.insert(name.clone(), value.clone());
        }
    }
}

fn parse_name(name: &str) -> Result<HeaderName, DeclarativeError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| DeclarativeError::HeaderName(name.to_string()))
}

fn replace_all(rules: &[(Regex, String)], body: Bytes) -> Bytes {
    let mut current = body;
    for (regex, replacement) in rules {
        let replaced = regex.replace_all(&current, replacement.as_bytes()).into_owned();
        current = Bytes::from(replaced);
    }
    current
}

/// Turn a config entry into a descriptor.
///
/// The `matching_path` itself is compiled later, at registration.
pub fn compile(config: &ModifierConfig) -> Result<ModifierDescriptor, DeclarativeError> {
    let mut descriptor = ModifierDescriptor::new(config.matching_path.clone());
    descriptor.disable_encoding = config.disable_encoding;

    if !config.request_headers.is_empty() {
        let rules = CompiledHeaderRules::compile(&config.request_headers)?;
        descriptor = descriptor.on_request(move |req| rules.apply(req.headers_mut()));
    }

    if !config.response_headers.is_empty() {
        let rules = CompiledHeaderRules::compile(&config.response_headers)?;
        descriptor = descriptor.on_response(move |resp| {
            rules.apply(resp.headers_mut());
            Ok(())
        });
    }

    if !config.body_replace.is_empty() {
        let rules = config
            .body_replace
            .iter()
            .map(|r| {
                Regex::new(&r.pattern)
                    .map(|regex| (regex, r.replacement.clone()))
                    .map_err(|source| DeclarativeError::BodyPattern {
                        pattern: r.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        descriptor = descriptor.on_body(move |_, body| replace_all(&rules, body));
    }

    Ok(descriptor)
}

/// Check that a config entry would register cleanly.
pub fn check(config: &ModifierConfig) -> Result<(), DeclarativeError> {
    Modifier::compile(compile(config)?)?;
    Ok(())
}
