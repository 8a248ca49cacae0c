//! Ordered modifier chain.
//!
//! # Design Decisions
//! - Registration order is application order, for both phases
//! - No sorting by specificity: later modifiers see earlier effects
//! - Mutable only while exclusively owned; shared as `Arc<ModifierChain>`

use super::declarative::{self, DeclarativeError};
use super::descriptor::{Modifier, ModifierDescriptor};
use crate::config::ModifierConfig;
use crate::error::ModifierError;

/// An ordered list of registered modifiers.
#[derive(Debug, Clone, Default)]
pub struct ModifierChain {
    modifiers: Vec<Modifier>,
}

impl ModifierChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and append a modifier.
    ///
    /// On failure the chain is left unchanged.
    pub fn register(&mut self, descriptor: ModifierDescriptor) -> Result<(), ModifierError> {
        let modifier = Modifier::compile(descriptor)?;
        tracing::debug!(
            pattern = %modifier.pattern(),
            position = self.modifiers.len(),
            "Modifier registered"
        );
        self.modifiers.push(modifier);
        Ok(())
    }

    /// Build a chain from the declarative `[[modifiers]]` config, in file order.
    pub fn from_config(configs: &[ModifierConfig]) -> Result<Self, DeclarativeError> {
        let mut chain = Self::new();
        for config in configs {
            chain.register(declarative::compile(config)?)?;
        }
        Ok(chain)
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter()
    }

    /// Modifiers whose pattern matches `path`, in registration order.
    pub fn matching<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Modifier> + 'a {
        self.modifiers.iter().filter(move |m| m.matches(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeaderRules;

    #[test]
    fn test_register_preserves_order() {
        let mut chain = ModifierChain::new();
        chain.register(ModifierDescriptor::new("^/b")).unwrap();
        chain.register(ModifierDescriptor::new("^/a")).unwrap();
        chain.register(ModifierDescriptor::new("")).unwrap();

        let patterns: Vec<_> = chain.iter().map(|m| m.pattern()).collect();
        assert_eq!(patterns, vec!["^/b", "^/a", ""]);
    }

    #[test]
    fn test_invalid_pattern_leaves_chain_unchanged() {
        let mut chain = ModifierChain::new();
        chain.register(ModifierDescriptor::new("^/ok")).unwrap();

        let err = chain.register(ModifierDescriptor::new("(")).unwrap_err();
        assert!(matches!(err, ModifierError::InvalidPattern { .. }));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_matching_filters_by_path() {
        let mut chain = ModifierChain::new();
        chain.register(ModifierDescriptor::new("^/api")).unwrap();
        chain.register(ModifierDescriptor::new("\\.js$")).unwrap();
        chain.register(ModifierDescriptor::new("users")).unwrap();

        let hits: Vec<_> = chain.matching("/api/users").map(|m| m.pattern()).collect();
        assert_eq!(hits, vec!["^/api", "users"]);
        assert_eq!(chain.matching("/favicon.ico").count(), 0);
    }

    #[test]
    fn test_from_config_keeps_file_order() {
        let configs = vec![
            ModifierConfig {
                matching_path: "^/first".into(),
                ..Default::default()
            },
            ModifierConfig {
                matching_path: "^/second".into(),
                disable_encoding: true,
                response_headers: HeaderRules {
                    remove: vec!["server".into()],
                    ..Default::default()
                },
                ..Default::default()
            },
        ];

        let chain = ModifierChain::from_config(&configs).unwrap();
        assert_eq!(chain.len(), 2);
        let modifiers: Vec<_> = chain.iter().collect();
        assert_eq!(modifiers[0].pattern(), "^/first");
        assert!(modifiers[1].disables_encoding());
        assert!(modifiers[1].response_fn().is_some());
    }

    #[test]
    fn test_from_config_rejects_bad_pattern() {
        let configs = vec![ModifierConfig {
            matching_path: "[unclosed".into(),
            ..Default::default()
        }];
        assert!(ModifierChain::from_config(&configs).is_err());
    }
}
