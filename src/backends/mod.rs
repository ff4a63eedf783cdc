//! Store implementations.
//!
//! The in-memory stores stand in for a platform keychain and for the legacy
//! login database in tests and demos. Both record every trait call in a
//! [`CallLog`]; handing the same log to both stores captures the order in
//! which the facade consulted them.

#[cfg(feature = "mock")]
pub mod memory_keychain;

#[cfg(feature = "mock")]
pub mod memory_logins;

#[cfg(feature = "mock")]
use crate::LoginmuxError;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared, ordered record of store calls.
///
/// # Example
///
/// ```
/// use loginmux::backends::CallLog;
///
/// let log = CallLog::new();
/// log.record("memory-keychain", "create_record");
/// log.record("memory-logins", "add_login");
///
/// assert_eq!(log.count("create_record"), 1);
/// assert_eq!(
///     log.entries(),
///     vec!["memory-keychain.create_record", "memory-logins.add_login"]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<(String, &'static str)>>>,
}

impl CallLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a call.
    pub fn record(&self, store: &str, operation: &'static str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((store.to_string(), operation));
    }

    /// Number of recorded calls to `operation`, across all stores.
    pub fn count(&self, operation: &str) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, op)| *op == operation)
            .count()
    }

    /// Number of recorded calls made to `store`.
    pub fn count_for(&self, store: &str) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(s, _)| s == store)
            .count()
    }

    /// Total number of recorded calls.
    pub fn total(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Calls in order, formatted as `store.operation`.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(store, op)| format!("{}.{}", store, op))
            .collect()
    }

    /// Forgets every recorded call.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Rebuilds an injected error so it can be returned more than once.
#[cfg(feature = "mock")]
pub(crate) fn replay_error(err: &LoginmuxError) -> LoginmuxError {
    match err {
        LoginmuxError::UnsupportedHost(s) => LoginmuxError::UnsupportedHost(s.clone()),
        LoginmuxError::NotFound(s) => LoginmuxError::NotFound(s.clone()),
        LoginmuxError::UnsupportedInputShape(s) => LoginmuxError::UnsupportedInputShape(s.clone()),
        LoginmuxError::NotImplemented(s) => LoginmuxError::NotImplemented(s.clone()),
        LoginmuxError::InvalidLogin(s) => LoginmuxError::InvalidLogin(s.clone()),
        LoginmuxError::AlreadyExists(s) => LoginmuxError::AlreadyExists(s.clone()),
        LoginmuxError::PermissionDenied(s) => LoginmuxError::PermissionDenied(s.clone()),
        other => LoginmuxError::Other(anyhow::anyhow!("{}", other)),
    }
}
