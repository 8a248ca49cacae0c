//! Path matching for modifiers.
//!
//! # Design Decisions
//! - Unanchored search: `api` matches `/v1/api/x`
//! - Callers anchor with `^`/`$` when they want whole-path matches
//! - Compiled once at registration, immutable afterwards

use regex::Regex;

use crate::error::ModifierError;

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    regex: Regex,
}

impl PathMatcher {
    /// Compile a regular expression into a matcher.
    pub fn compile(pattern: &str) -> Result<Self, ModifierError> {
        let regex = Regex::new(pattern).map_err(|source| ModifierError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    /// Returns true if the pattern matches anywhere in `path`.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}
