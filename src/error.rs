//! Error types.

use thiserror::Error;

use crate::types::Key;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything the framework reports to callers.
///
/// All errors surface synchronously from the operation that triggered them.
/// Nothing is retried and nothing is swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A render function produced markup that is not well formed.
    #[error("malformed markup at byte {offset}: {message}")]
    Markup { offset: usize, message: String },

    /// `attach_to` on an instance that is already attached or destroyed.
    #[error("cannot attach: {0}")]
    Attach(String),

    /// An operation on a destroyed (or not yet attached) instance.
    #[error("lifecycle violation: {0}")]
    Lifecycle(String),

    /// Two siblings in one rendered tree share a key.
    #[error("duplicate key `{key}` among the children of <{parent}>")]
    KeyCollision { key: Key, parent: String },

    /// A delegation selector could not be parsed.
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
}

impl Error {
    pub(crate) fn markup(offset: usize, message: impl Into<String>) -> Self {
        Self::Markup {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn selector(selector: &str, message: impl Into<String>) -> Self {
        Self::Selector {
            selector: selector.to_string(),
            message: message.into(),
        }
    }

    pub fn is_markup(&self) -> bool {
        matches!(self, Self::Markup { .. })
    }

    pub fn is_key_collision(&self) -> bool {
        matches!(self, Self::KeyCollision { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::markup(4, "unexpected `>`");
        assert_eq!(err.to_string(), "malformed markup at byte 4: unexpected `>`");

        let err = Error::KeyCollision {
            key: Key::Explicit("a".into()),
            parent: "ul".into(),
        };
        assert_eq!(err.to_string(), "duplicate key `a` among the children of <ul>");
        assert!(err.is_key_collision());
    }
}
