//! Error types for loginmux operations.

use thiserror::Error;

/// Result type alias using [`LoginmuxError`].
pub type Result<T> = std::result::Result<T, LoginmuxError>;

/// Errors that can occur while storing or looking up logins.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
#[derive(Debug, Error)]
pub enum LoginmuxError {
    /// Hostname cannot be represented as a keychain network entry.
    ///
    /// Inside the facade this only ever selects the fallback store; callers
    /// see it only when talking to a [`Keychain`](crate::Keychain) directly.
    #[error("hostname not supported by the keychain: {0}")]
    UnsupportedHost(String),

    /// No stored login matched.
    #[error("no matching login found: {0}")]
    NotFound(String),

    /// New login data matched neither a full login nor a known property set.
    #[error("unsupported login data: {0}")]
    UnsupportedInputShape(String),

    /// Operation is reserved but not implemented by this storage.
    #[error("not yet implemented: {0}")]
    NotImplemented(String),

    /// Login values violate the storage contract (nulls, newlines, ...).
    #[error("invalid login: {0}")]
    InvalidLogin(String),

    /// Entry already exists (cannot create duplicate).
    #[error("login already exists: {0}")]
    AlreadyExists(String),

    /// Store refused access to the entry.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Store operation failed with context.
    #[error("{store}: {operation} {hostname}: {source}")]
    StoreOperation {
        /// Store name
        store: String,
        /// Operation name (find, create, delete, etc.)
        operation: String,
        /// Hostname the operation was about
        hostname: String,
        /// Underlying error
        #[source]
        source: Box<LoginmuxError>,
    },

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LoginmuxError {
    /// Creates a store operation error with context.
    ///
    /// This wraps an underlying error with information about which store,
    /// operation, and hostname caused the failure.
    ///
    /// # Example
    ///
    /// ```
    /// use loginmux::LoginmuxError;
    ///
    /// let err = LoginmuxError::PermissionDenied("item locked".to_string());
    /// let wrapped = LoginmuxError::store_op(
    ///     "keychain",
    ///     "create",
    ///     "https://example.com",
    ///     err,
    /// );
    ///
    /// assert_eq!(
    ///     wrapped.to_string(),
    ///     "keychain: create https://example.com: permission denied: item locked"
    /// );
    /// ```
    pub fn store_op(
        store: impl Into<String>,
        operation: impl Into<String>,
        hostname: impl Into<String>,
        err: LoginmuxError,
    ) -> Self {
        Self::StoreOperation {
            store: store.into(),
            operation: operation.into(),
            hostname: hostname.into(),
            source: Box::new(err),
        }
    }

    /// Returns the innermost error, looking through [`StoreOperation`](Self::StoreOperation) wrappers.
    pub fn root(&self) -> &LoginmuxError {
        match self {
            Self::StoreOperation { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = LoginmuxError::NotFound("https://example.com".to_string());
        assert_eq!(err.to_string(), "no matching login found: https://example.com");

        let err = LoginmuxError::NotImplemented("search_logins()".to_string());
        assert_eq!(err.to_string(), "not yet implemented: search_logins()");
    }

    #[test]
    fn test_store_operation_error() {
        let inner = LoginmuxError::AlreadyExists("alice".to_string());
        let err = LoginmuxError::store_op("keychain", "create", "https://example.com", inner);

        let error_string = err.to_string();
        assert!(error_string.contains("keychain"));
        assert!(error_string.contains("create"));
        assert!(error_string.contains("https://example.com"));
    }

    #[test]
    fn test_error_source_chain() {
        let inner = LoginmuxError::NotFound("test".to_string());
        let outer = LoginmuxError::store_op("fallback", "modify", "test", inner);

        assert!(outer.source().is_some());
        assert!(matches!(outer.root(), LoginmuxError::NotFound(_)));
    }
}
