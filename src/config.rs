//! Framework configuration.
//!
//! A [`Config`] travels with a [`ComponentDef`](crate::component::ComponentDef).
//! Nested components created by a parent inherit the parent's config.

/// Attribute that carries explicit sibling keys unless configured otherwise.
pub const DEFAULT_KEY_ATTRIBUTE: &str = "data-hkey";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Attribute read as a node's explicit key.
    pub key_attribute: String,
    /// Keep whitespace-only text nodes produced by render output.
    pub preserve_whitespace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_attribute: DEFAULT_KEY_ATTRIBUTE.to_string(),
            preserve_whitespace: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key_attribute(mut self, name: impl Into<String>) -> Self {
        self.key_attribute = name.into();
        self
    }

    pub fn with_preserve_whitespace(mut self, preserve: bool) -> Self {
        self.preserve_whitespace = preserve;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.key_attribute, "data-hkey");
        assert!(!config.preserve_whitespace);
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .with_key_attribute("key")
            .with_preserve_whitespace(true);
        assert_eq!(config.key_attribute, "key");
        assert!(config.preserve_whitespace);
    }
}
