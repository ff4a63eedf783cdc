//! In-memory keychain for testing.
//!
//! This keychain keeps entries in memory with support for error injection
//! and call recording, so code using the facade can be tested without a
//! platform secret store.

use crate::backends::{replay_error, CallLog};
use crate::native::{NativeKey, NativeQuery, NativeRecord, RecordHandle};
use crate::{Keychain, LoginmuxError, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

const NAME: &str = "memory-keychain";

/// In-memory keychain.
///
/// Entries are returned in insertion order. Every trait call is recorded in
/// the keychain's [`CallLog`]; helper methods such as [`insert`](Self::insert)
/// are not.
///
/// # Example
///
/// ```
/// use loginmux::backends::memory_keychain::MemoryKeychain;
/// use loginmux::native::{NativeKey, NativeQuery, Protocol};
/// use loginmux::{Keychain, LoginmuxError};
///
/// #[tokio::main]
/// async fn main() -> loginmux::Result<()> {
///     let mut keychain = MemoryKeychain::new();
///
///     // Pre-populate with an entry written by another application
///     keychain
///         .insert(
///             NativeKey {
///                 protocol: Some(Protocol::Https),
///                 server_name: Some("example.com".to_string()),
///                 ..Default::default()
///             },
///             "secret",
///         )
///         .await;
///
///     // Test error conditions
///     keychain.find_error = Some(LoginmuxError::PermissionDenied("locked".to_string()));
///
///     let result = keychain.find_records(&NativeQuery::wildcard()).await;
///     assert!(result.is_err());
///     assert_eq!(keychain.calls().count("find_records"), 1);
///
///     Ok(())
/// }
/// ```
pub struct MemoryKeychain {
    records: RwLock<Vec<NativeRecord>>,
    calls: CallLog,

    /// Error to return from `find_records()`
    pub find_error: Option<LoginmuxError>,
    /// Error to return from `create_record()`
    pub create_error: Option<LoginmuxError>,
    /// Error to return from `update_record()`
    pub update_error: Option<LoginmuxError>,
    /// Error to return from `delete_record()`
    pub delete_error: Option<LoginmuxError>,
}

impl MemoryKeychain {
    /// Creates an empty keychain with its own call log.
    pub fn new() -> Self {
        Self::with_call_log(CallLog::new())
    }

    /// Creates an empty keychain recording into `calls`.
    pub fn with_call_log(calls: CallLog) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            calls,
            find_error: None,
            create_error: None,
            update_error: None,
            delete_error: None,
        }
    }

    /// Handle to the call log.
    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    /// Adds an entry directly, bypassing validation and call recording.
    ///
    /// Useful for entries "written by another application", which may lack
    /// attributes this crate always sets.
    pub async fn insert(&self, key: NativeKey, secret: impl Into<String>) -> NativeRecord {
        let record = NativeRecord::new(key, secret);
        self.records.write().await.push(record.clone());
        record
    }

    /// Snapshot of every entry, without call recording.
    pub async fn records(&self) -> Vec<NativeRecord> {
        self.records.read().await.clone()
    }

    /// Number of entries.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if the keychain holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for MemoryKeychain {
    fn default() -> Self {
        Self::new()
    }
}

/// Attribute identity of an entry; blank strings and port 0 count as unset,
/// and server names compare case-insensitively.
fn same_identity(a: &NativeKey, b: &NativeKey) -> bool {
    fn blank(v: &Option<String>) -> Option<&str> {
        v.as_deref().filter(|s| !s.is_empty())
    }

    blank(&a.account_name) == blank(&b.account_name)
        && a.protocol == b.protocol
        && blank(&a.server_name).map(str::to_ascii_lowercase)
            == blank(&b.server_name).map(str::to_ascii_lowercase)
        && a.port.filter(|p| *p != 0) == b.port.filter(|p| *p != 0)
        && a.auth_type == b.auth_type
        && blank(&a.security_domain) == blank(&b.security_domain)
}

#[async_trait]
impl Keychain for MemoryKeychain {
    fn name(&self) -> &str {
        NAME
    }

    async fn find_records(&self, query: &NativeQuery) -> Result<Vec<NativeRecord>> {
        self.calls.record(NAME, "find_records");
        if let Some(ref err) = self.find_error {
            return Err(replay_error(err));
        }

        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| query.matches(&record.key))
            .cloned()
            .collect())
    }

    async fn create_record(&self, key: &NativeKey, secret: &str) -> Result<NativeRecord> {
        self.calls.record(NAME, "create_record");
        if let Some(ref err) = self.create_error {
            return Err(replay_error(err));
        }

        if !key.is_network_key() {
            return Err(LoginmuxError::UnsupportedHost(
                "internet password entries need a protocol and a server".to_string(),
            ));
        }

        let mut records = self.records.write().await;
        if records.iter().any(|r| same_identity(&r.key, key)) {
            return Err(LoginmuxError::AlreadyExists(format!(
                "{} on {}",
                key.account_name.as_deref().unwrap_or_default(),
                key.server_name.as_deref().unwrap_or_default()
            )));
        }

        let record = NativeRecord::new(key.clone(), secret);
        records.push(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        handle: &RecordHandle,
        key: &NativeKey,
        secret: &str,
    ) -> Result<NativeRecord> {
        self.calls.record(NAME, "update_record");
        if let Some(ref err) = self.update_error {
            return Err(replay_error(err));
        }

        let mut records = self.records.write().await;
        if records
            .iter()
            .any(|r| r.handle != *handle && same_identity(&r.key, key))
        {
            return Err(LoginmuxError::AlreadyExists(format!(
                "{} on {}",
                key.account_name.as_deref().unwrap_or_default(),
                key.server_name.as_deref().unwrap_or_default()
            )));
        }

        let record = records
            .iter_mut()
            .find(|r| r.handle == *handle)
            .ok_or_else(|| LoginmuxError::NotFound(handle.to_string()))?;

        record.key = key.clone();
        record.secret = secret.to_string();
        record.modified = Utc::now();
        Ok(record.clone())
    }

    async fn delete_record(&self, handle: &RecordHandle) -> Result<()> {
        self.calls.record(NAME, "delete_record");
        if let Some(ref err) = self.delete_error {
            return Err(replay_error(err));
        }

        let mut records = self.records.write().await;
        let index = records
            .iter()
            .position(|r| r.handle == *handle)
            .ok_or_else(|| LoginmuxError::NotFound(handle.to_string()))?;
        records.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{AuthType, Protocol};
    use crate::FieldMatch;

    fn key(server: &str, account: &str) -> NativeKey {
        NativeKey {
            account_name: Some(account.to_string()),
            protocol: Some(Protocol::Https),
            server_name: Some(server.to_string()),
            port: Some(443),
            auth_type: Some(AuthType::HtmlForm),
            security_domain: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let keychain = MemoryKeychain::new();
        keychain.create_record(&key("a.com", "alice"), "pw").await.unwrap();
        keychain.create_record(&key("b.com", "bob"), "pw").await.unwrap();

        let mut query = NativeQuery::wildcard();
        query.server_name = FieldMatch::Exact("b.com".to_string());

        let found = keychain.find_records(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key.account_name.as_deref(), Some("bob"));
        assert_eq!(keychain.calls().count("create_record"), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_non_network_key() {
        let keychain = MemoryKeychain::new();
        let err = keychain
            .create_record(&NativeKey::default(), "pw")
            .await
            .unwrap_err();

        assert!(matches!(err, LoginmuxError::UnsupportedHost(_)));
        assert!(keychain.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate() {
        let keychain = MemoryKeychain::new();
        keychain.create_record(&key("a.com", "alice"), "pw").await.unwrap();

        let mut same = key("a.com", "alice");
        same.security_domain = Some(String::new());
        let err = keychain.create_record(&same, "other").await.unwrap_err();

        assert!(matches!(err, LoginmuxError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_update_record() {
        let keychain = MemoryKeychain::new();
        let record = keychain.insert(key("a.com", "alice"), "old").await;

        let updated = keychain
            .update_record(&record.handle, &key("a.com", "alice"), "new")
            .await
            .unwrap();

        assert_eq!(updated.secret, "new");
        assert_eq!(updated.handle, record.handle);
        assert!(updated.modified >= record.modified);
    }

    #[tokio::test]
    async fn test_update_rejects_collision_with_other_entry() {
        let keychain = MemoryKeychain::new();
        keychain.insert(key("a.com", "alice"), "pw").await;
        let bob = keychain.insert(key("a.com", "bob"), "pw").await;

        let err = keychain
            .update_record(&bob.handle, &key("a.com", "alice"), "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, LoginmuxError::AlreadyExists(_)));

        // updating an entry in place is not a collision
        keychain
            .update_record(&bob.handle, &key("a.com", "bob"), "new")
            .await
            .unwrap();
        assert_eq!(keychain.len().await, 2);
    }

    #[tokio::test]
    async fn test_delete_record() {
        let keychain = MemoryKeychain::new();
        let record = keychain.insert(key("a.com", "alice"), "pw").await;

        keychain.delete_record(&record.handle).await.unwrap();
        assert!(keychain.is_empty().await);

        let err = keychain.delete_record(&record.handle).await.unwrap_err();
        assert!(matches!(err, LoginmuxError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_error_injection() {
        let mut keychain = MemoryKeychain::new();
        keychain.create_error = Some(LoginmuxError::PermissionDenied("denied".to_string()));

        let result = keychain.create_record(&key("a.com", "alice"), "pw").await;
        assert!(matches!(result, Err(LoginmuxError::PermissionDenied(_))));
        assert_eq!(keychain.len().await, 0);
    }
}
