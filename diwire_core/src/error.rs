//! Error types.

use std::error::Error as StdError;
use std::sync::Arc;

/// [`Error`] is an error that can be raised while resolving a key.
///
/// Every variant carries the key that failed, so the caller can act on it without walking the
/// resolution again.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The key is not registered and does not name a constructible class.
    #[error("`{key}` is not registered and does not name a constructible class")]
    NotFound { key: String },

    /// A constructor parameter cannot be inferred from its declaration.
    #[error(
        "cannot auto-resolve parameter `{parameter}` (#{index}) of `{class}`: \
         scalar parameter has no default value"
    )]
    AutoResolution {
        class: String,
        parameter: String,
        index: usize,
    },

    /// A key was requested again while it was still being resolved.
    #[error("dependency cycle detected: {}", .chain.join(" -> "))]
    Cycle { chain: Vec<String> },

    /// The resolution chain grew past the configured limit.
    #[error("resolving `{key}` exceeded the limit of {limit} nested dependencies")]
    DepthExceeded { key: String, limit: usize },

    /// Invoking a constructor, factory or method with concrete arguments failed.
    #[error("failed to resolve `{key}`{}: {source}", site(.argument, .method))]
    Resolution {
        key: String,
        argument: Option<usize>,
        method: Option<String>,
        #[source]
        source: Arc<dyn StdError + Send + Sync + 'static>,
    },

    /// An error raised by application code, not yet attributed to a key.
    #[error(transparent)]
    Other(Arc<dyn StdError + Send + Sync + 'static>),
}

/// [`ArgumentError`] describes why a concrete argument list was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ArgumentError {
    #[error("missing argument")]
    Missing,
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: String,
    },
    #[error("unexpected argument")]
    Unexpected,
    #[error("method `{0}` is not declared on the target class")]
    UnknownMethod(String),
}

#[allow(clippy::ref_option)]
fn site(argument: &Option<usize>, method: &Option<String>) -> String {
    match (argument, method) {
        (Some(index), Some(method)) => format!(" (argument #{index} of method `{method}`)"),
        (Some(index), None) => format!(" (argument #{index})"),
        (None, Some(method)) => format!(" (method `{method}`)"),
        (None, None) => String::new(),
    }
}

impl Error {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Other(Arc::from(err.into()))
    }

    /// Creates a [`Error::Resolution`] for `key` that is not tied to a specific argument.
    pub fn resolution<E>(key: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Resolution {
            key: key.into(),
            argument: None,
            method: None,
            source: Arc::from(source.into()),
        }
    }

    /// Attributes the error to the argument at `index`.
    ///
    /// Has no effect on variants other than [`Error::Resolution`].
    #[must_use]
    pub fn at_argument(mut self, index: usize) -> Self {
        if let Self::Resolution { argument, .. } = &mut self {
            *argument = Some(index);
        }
        self
    }

    /// Attributes the error to the method call `name`.
    ///
    /// Has no effect on variants other than [`Error::Resolution`].
    #[must_use]
    pub fn in_method(mut self, name: impl Into<String>) -> Self {
        if let Self::Resolution { method, .. } = &mut self {
            *method = Some(name.into());
        }
        self
    }

    /// Turns an unattributed [`Error::Other`] into a [`Error::Resolution`] of `key`.
    ///
    /// Errors that already name a key are returned unchanged.
    #[must_use]
    pub fn attribute_to(self, key: &str) -> Self {
        match self {
            Self::Other(source) => Self::Resolution {
                key: key.to_owned(),
                argument: None,
                method: None,
                source,
            },
            other => other,
        }
    }

    /// Returns the key this error is about, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::NotFound { key }
            | Self::DepthExceeded { key, .. }
            | Self::Resolution { key, .. } => Some(key.as_str()),
            Self::AutoResolution { class, .. } => Some(class.as_str()),
            Self::Cycle { chain } => chain.last().map(String::as_str),
            Self::Other(_) => None,
        }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_not_found_for(&self, key: &str) -> bool {
        matches!(self, Self::NotFound { key: k } if k == key)
    }

    pub const fn is_auto_resolution(&self) -> bool {
        matches!(self, Self::AutoResolution { .. })
    }

    pub const fn is_cycle(&self) -> bool {
        matches!(self, Self::Cycle { .. })
    }

    pub const fn is_depth_exceeded(&self) -> bool {
        matches!(self, Self::DepthExceeded { .. })
    }

    pub const fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. })
    }

    pub const fn is_other(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

/// [`Result`] is an alias to [`core::result::Result`] with [`Error`] as the
/// default error type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_display() {
        let err = Error::resolution("db", ArgumentError::Missing).at_argument(2);
        assert_eq!(err.to_string(), "failed to resolve `db` (argument #2): missing argument");

        let err = err.in_method("connect");
        assert_eq!(
            err.to_string(),
            "failed to resolve `db` (argument #2 of method `connect`): missing argument"
        );
    }

    #[test]
    fn test_cycle_display() {
        let err = Error::Cycle {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "dependency cycle detected: a -> b -> a");
        assert_eq!(err.key(), Some("a"));
    }

    #[test]
    fn test_attribute_to() {
        let err = Error::other("boom").attribute_to("foo");
        assert!(err.is_resolution());
        assert_eq!(err.key(), Some("foo"));
        assert_eq!(err.to_string(), "failed to resolve `foo`: boom");

        let err = Error::not_found("bar").attribute_to("foo");
        assert!(err.is_not_found_for("bar"));
    }

    #[test]
    fn test_source() {
        let err = Error::resolution("foo", ArgumentError::Unexpected);
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "unexpected argument");
    }
}
