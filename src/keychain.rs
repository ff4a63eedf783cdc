//! Keychain trait for the primary (native) credential store.
//!
//! This module defines the [`Keychain`] trait the facade dispatches to first.
//! Implementations wrap a platform secret store that keeps internet-password
//! entries keyed by network attributes.

use crate::native::{NativeKey, NativeQuery, NativeRecord, RecordHandle};
use crate::Result;
use async_trait::async_trait;

/// A native secret store holding internet-password entries.
///
/// All implementations must be `Send + Sync` and handle their own internal
/// synchronization; the facade shares one instance through an `Arc` and
/// holds no locks of its own.
///
/// # Implementations
///
/// - **Testing**: [`MemoryKeychain`](crate::backends::memory_keychain::MemoryKeychain)
///   with error injection and call counting
#[async_trait]
pub trait Keychain: Send + Sync {
    // ========================================================================
    // Metadata
    // ========================================================================

    /// Returns the store name (e.g., "memory-keychain").
    fn name(&self) -> &str;

    // ========================================================================
    // Queries
    // ========================================================================

    /// Finds every entry matching `query`.
    ///
    /// Attributes constrained with [`FieldMatch::Any`](crate::FieldMatch::Any)
    /// are ignored; [`FieldMatch::Absent`](crate::FieldMatch::Absent) only
    /// matches entries where the attribute is unset or empty.
    async fn find_records(&self, query: &NativeQuery) -> Result<Vec<NativeRecord>>;

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Creates a new entry.
    ///
    /// # Errors
    ///
    /// - [`LoginmuxError::UnsupportedHost`](crate::LoginmuxError::UnsupportedHost):
    ///   the key has no protocol or server
    /// - [`LoginmuxError::AlreadyExists`](crate::LoginmuxError::AlreadyExists):
    ///   an entry with the same attributes exists
    /// - [`LoginmuxError::PermissionDenied`](crate::LoginmuxError::PermissionDenied):
    ///   the store refused the write
    async fn create_record(&self, key: &NativeKey, secret: &str) -> Result<NativeRecord>;

    /// Replaces the attributes and secret of an existing entry.
    ///
    /// # Errors
    ///
    /// - [`LoginmuxError::NotFound`](crate::LoginmuxError::NotFound):
    ///   the entry no longer exists
    async fn update_record(
        &self,
        handle: &RecordHandle,
        key: &NativeKey,
        secret: &str,
    ) -> Result<NativeRecord>;

    /// Deletes an entry.
    ///
    /// # Errors
    ///
    /// - [`LoginmuxError::NotFound`](crate::LoginmuxError::NotFound):
    ///   the entry no longer exists
    async fn delete_record(&self, handle: &RecordHandle) -> Result<()>;
}
