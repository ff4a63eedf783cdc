//! Login storage that prefers the keychain.
//!
//! [`KeychainStorage`] answers the host login manager from the platform
//! keychain and hands anything the keychain cannot hold to a fallback
//! [`LoginStorage`]. See [`fallback`](crate::fallback) for the read tiers.
//!
//! # Routing
//!
//! | Operation | Keychain | Fallback store |
//! |-----------|----------|----------------|
//! | `add_login` | always tried first | on any keychain error |
//! | `remove_login`, `modify_login` | exact key | unsupported hostnames |
//! | `find_logins`, `count_logins` | exact, then relaxed key | unsupported hostnames or no match |
//! | `get_all_logins`, `remove_all_logins` | every entry | never |
//! | disabled hosts, saving preference | never | always |
//! | `search_logins` | not implemented | not implemented |

use crate::classifier::is_supported;
use crate::fallback::{FallbackCoordinator, NativeLookup};
use crate::mapper;
use crate::native::{NativeQuery, NativeRecord};
use crate::validation::validate_login;
use crate::{
    Config, Keychain, LoginInfo, LoginProperties, LoginQuery, LoginStorage, LoginmuxError,
    NewLoginData, Result,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

const NAME: &str = "keychain-storage";

/// Outcome of [`KeychainStorage::import_from_fallback`].
#[derive(Debug, Default)]
pub struct ImportSummary {
    /// Logins moved into the keychain
    pub imported: usize,
    /// Logins left in the fallback store because the keychain cannot hold them
    pub skipped: usize,
    /// Logins that could not be moved, with the reason
    pub failed: Vec<LoginmuxError>,
}

/// Keychain-first implementation of [`LoginStorage`].
///
/// # Example
///
/// ```
/// use loginmux::backends::memory_keychain::MemoryKeychain;
/// use loginmux::backends::memory_logins::MemoryLoginStore;
/// use loginmux::{KeychainStorage, LoginInfo, LoginQuery, LoginStorage};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> loginmux::Result<()> {
///     let keychain = Arc::new(MemoryKeychain::new());
///     let fallback = Arc::new(MemoryLoginStore::new());
///     let storage = KeychainStorage::new(keychain.clone(), fallback.clone());
///
///     // Network origins go to the keychain
///     storage
///         .add_login(&LoginInfo::new_form("https://example.com", "", "alice", "pw"))
///         .await?;
///     assert_eq!(keychain.len().await, 1);
///
///     // Internal pages cannot be represented there
///     storage
///         .add_login(&LoginInfo::new_form("chrome://app", "", "alice", "pw"))
///         .await?;
///     assert_eq!(fallback.len().await, 1);
///
///     let found = storage
///         .find_logins(&LoginQuery::new("https://example.com", Some(""), None))
///         .await?;
///     assert_eq!(found[0].username, "alice");
///     Ok(())
/// }
/// ```
pub struct KeychainStorage {
    keychain: Arc<dyn Keychain>,
    fallback: Arc<dyn LoginStorage>,
    coordinator: FallbackCoordinator,
    config: Config,
}

impl KeychainStorage {
    /// Creates the facade with the default [`Config`].
    pub fn new(keychain: Arc<dyn Keychain>, fallback: Arc<dyn LoginStorage>) -> Self {
        Self::with_config(keychain, fallback, Config::default())
    }

    /// Creates the facade with an explicit configuration.
    pub fn with_config(
        keychain: Arc<dyn Keychain>,
        fallback: Arc<dyn LoginStorage>,
        config: Config,
    ) -> Self {
        let coordinator = FallbackCoordinator::new(keychain.clone(), &config);
        Self {
            keychain,
            fallback,
            coordinator,
            config,
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Moves logins from the fallback store into the keychain.
    ///
    /// Logins whose hostname the keychain cannot represent stay where they
    /// are. A login is removed from the fallback store only after the
    /// keychain accepted it; if that removal fails, the new keychain entry
    /// is deleted again so the login lives in exactly one store.
    ///
    /// # Errors
    ///
    /// Fails only if the fallback store cannot be enumerated. Per-login
    /// failures are collected in [`ImportSummary::failed`].
    pub async fn import_from_fallback(&self) -> Result<ImportSummary> {
        let logins = self.fallback.get_all_logins().await?;
        let mut summary = ImportSummary::default();

        for login in logins {
            if !is_supported(&login.hostname) {
                summary.skipped += 1;
                continue;
            }

            match self.import_one(&login).await {
                Ok(()) => summary.imported += 1,
                Err(err) => {
                    warn!(hostname = %login.hostname, error = %err, "Failed to import login");
                    summary.failed.push(err);
                }
            }
        }

        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            "Import from fallback store finished"
        );
        Ok(summary)
    }

    async fn import_one(&self, login: &LoginInfo) -> Result<()> {
        let record = self
            .keychain
            .create_record(&mapper::key_for_login(login), &login.password)
            .await
            .map_err(|e| {
                LoginmuxError::store_op(&self.config.keychain_label, "import", &login.hostname, e)
            })?;

        if let Err(err) = self.fallback.remove_login(login).await {
            if let Err(rollback) = self.keychain.delete_record(&record.handle).await {
                warn!(
                    hostname = %login.hostname,
                    error = %rollback,
                    "Could not undo keychain entry after failed import"
                );
            }
            return Err(LoginmuxError::store_op(
                self.fallback.name(),
                "import",
                &login.hostname,
                err,
            ));
        }

        Ok(())
    }

    /// Moves a keychain entry into the fallback store as `updated`.
    ///
    /// The fallback copy is written first; the keychain entry is deleted
    /// only once that succeeded, and the copy is removed again if the
    /// delete fails.
    async fn migrate_to_fallback(
        &self,
        record: &NativeRecord,
        updated: &LoginInfo,
    ) -> Result<()> {
        self.fallback.add_login(updated).await?;

        if let Err(err) = self.keychain.delete_record(&record.handle).await {
            if let Err(rollback) = self.fallback.remove_login(updated).await {
                warn!(
                    hostname = %updated.hostname,
                    error = %rollback,
                    "Could not undo fallback copy after failed keychain delete"
                );
            }
            return Err(err);
        }

        Ok(())
    }

    /// Locates the keychain entry for `login`, or `NotFound`.
    async fn locate_or_not_found(&self, login: &LoginInfo) -> Result<NativeRecord> {
        self.coordinator
            .locate(login)
            .await?
            .ok_or_else(|| LoginmuxError::NotFound(login.hostname.clone()))
    }

    async fn all_records(&self) -> Result<Vec<NativeRecord>> {
        self.keychain.find_records(&NativeQuery::wildcard()).await
    }
}

fn to_logins(records: &[NativeRecord]) -> Vec<LoginInfo> {
    records.iter().filter_map(mapper::login_for_record).collect()
}

#[async_trait]
impl LoginStorage for KeychainStorage {
    fn name(&self) -> &str {
        NAME
    }

    async fn init(&self) -> Result<()> {
        debug!(fallback = self.fallback.name(), "init");
        self.fallback.init().await
    }

    fn ui_busy(&self) -> bool {
        self.fallback.ui_busy()
    }

    async fn add_login(&self, login: &LoginInfo) -> Result<()> {
        debug!(hostname = %login.hostname, "add_login");

        let key = mapper::key_for_login(login);
        match self.keychain.create_record(&key, &login.password).await {
            Ok(_) => {
                info!(hostname = %login.hostname, keychain = %self.config.keychain_label, "Login added");
                Ok(())
            }
            Err(err) => {
                info!(
                    hostname = %login.hostname,
                    error = %err,
                    "Keychain rejected login; adding to fallback store"
                );
                self.fallback.add_login(login).await
            }
        }
    }

    async fn remove_login(&self, login: &LoginInfo) -> Result<()> {
        debug!(hostname = %login.hostname, "remove_login");

        if !is_supported(&login.hostname) {
            info!(hostname = %login.hostname, "Hostname not supported by keychain; using fallback store");
            return self.fallback.remove_login(login).await;
        }

        match self.coordinator.locate(login).await? {
            Some(record) => {
                self.keychain.delete_record(&record.handle).await?;
                info!(hostname = %login.hostname, "Login successfully removed");
            }
            None => info!(hostname = %login.hostname, "No matching login found"),
        }
        Ok(())
    }

    async fn modify_login(&self, old_login: &LoginInfo, new_data: &NewLoginData) -> Result<()> {
        debug!(hostname = %old_login.hostname, "modify_login");

        if !is_supported(&old_login.hostname) {
            info!(hostname = %old_login.hostname, "Hostname not supported by keychain; using fallback store");
            return self.fallback.modify_login(old_login, new_data).await;
        }

        let record = self.locate_or_not_found(old_login).await?;
        let mut current = mapper::login_for_record(&record).unwrap_or_else(|| old_login.clone());
        // form input names have no keychain slot
        current.username_field = old_login.username_field.clone();
        current.password_field = old_login.password_field.clone();

        let updated = new_data.apply_to(&current)?;
        validate_login(&updated)?;

        if !is_supported(&updated.hostname) {
            info!(
                from = %old_login.hostname,
                to = %updated.hostname,
                "New hostname not supported by keychain; moving login to fallback store"
            );
            return self.migrate_to_fallback(&record, &updated).await;
        }

        let key = mapper::key_for_login(&updated);
        self.keychain
            .update_record(&record.handle, &key, &updated.password)
            .await?;
        info!(hostname = %updated.hostname, "Login successfully modified");
        Ok(())
    }

    async fn remove_all_logins(&self) -> Result<()> {
        debug!("remove_all_logins");

        for record in self.all_records().await? {
            info!(
                server = record.key.server_name.as_deref().unwrap_or_default(),
                "Deleting keychain entry"
            );
            self.keychain.delete_record(&record.handle).await?;
        }
        Ok(())
    }

    async fn get_all_logins(&self) -> Result<Vec<LoginInfo>> {
        debug!("get_all_logins");
        Ok(to_logins(&self.all_records().await?))
    }

    async fn find_logins(&self, query: &LoginQuery) -> Result<Vec<LoginInfo>> {
        debug!(?query, "find_logins");

        match self.coordinator.lookup(query).await? {
            NativeLookup::Found { tier, records } => {
                debug!(?tier, count = records.len(), "answered from keychain");
                Ok(to_logins(&records))
            }
            NativeLookup::Fallback(reason) => {
                info!(hostname = %query.hostname, %reason, "Using fallback store");
                self.fallback.find_logins(query).await
            }
        }
    }

    async fn count_logins(&self, query: &LoginQuery) -> Result<usize> {
        debug!(?query, "count_logins");

        match self.coordinator.lookup(query).await? {
            NativeLookup::Found { records, .. } => Ok(to_logins(&records).len()),
            NativeLookup::Fallback(reason) => {
                info!(hostname = %query.hostname, %reason, "Using fallback store");
                self.fallback.count_logins(query).await
            }
        }
    }

    async fn search_logins(&self, _criteria: &LoginProperties) -> Result<Vec<LoginInfo>> {
        Err(LoginmuxError::NotImplemented("search_logins()".to_string()))
    }

    async fn get_all_disabled_hosts(&self) -> Result<Vec<String>> {
        self.fallback.get_all_disabled_hosts().await
    }

    async fn get_login_saving_enabled(&self, hostname: &str) -> Result<bool> {
        self.fallback.get_login_saving_enabled(hostname).await
    }

    async fn set_login_saving_enabled(&self, hostname: &str, enabled: bool) -> Result<()> {
        self.fallback.set_login_saving_enabled(hostname, enabled).await
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::backends::memory_keychain::MemoryKeychain;
    use crate::backends::memory_logins::MemoryLoginStore;
    use crate::backends::CallLog;

    struct Fixture {
        keychain: Arc<MemoryKeychain>,
        fallback: Arc<MemoryLoginStore>,
        storage: KeychainStorage,
        calls: CallLog,
    }

    fn fixture_with(keychain: MemoryKeychain, fallback: MemoryLoginStore) -> Fixture {
        let calls = keychain.calls();
        let keychain = Arc::new(keychain);
        let fallback = Arc::new(fallback);
        let storage = KeychainStorage::new(keychain.clone(), fallback.clone());
        Fixture {
            keychain,
            fallback,
            storage,
            calls,
        }
    }

    fn fixture() -> Fixture {
        let calls = CallLog::new();
        fixture_with(
            MemoryKeychain::with_call_log(calls.clone()),
            MemoryLoginStore::with_call_log(calls),
        )
    }

    #[tokio::test]
    async fn test_add_falls_back_on_keychain_error() {
        let calls = CallLog::new();
        let mut keychain = MemoryKeychain::with_call_log(calls.clone());
        keychain.create_error = Some(LoginmuxError::PermissionDenied("locked".to_string()));
        let f = fixture_with(keychain, MemoryLoginStore::with_call_log(calls));

        let login = LoginInfo::new_form("https://example.com", "", "alice", "pw");
        f.storage.add_login(&login).await.unwrap();

        assert!(f.keychain.is_empty().await);
        assert_eq!(f.fallback.logins().await, vec![login]);
    }

    #[tokio::test]
    async fn test_add_surfaces_fallback_error() {
        let calls = CallLog::new();
        let mut fallback = MemoryLoginStore::with_call_log(calls.clone());
        fallback.add_error = Some(LoginmuxError::PermissionDenied("read-only".to_string()));
        let f = fixture_with(MemoryKeychain::with_call_log(calls), fallback);

        let err = f
            .storage
            .add_login(&LoginInfo::new_form("chrome://app", "", "alice", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoginmuxError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_modify_migrates_to_unsupported_host() {
        let f = fixture();
        let login = LoginInfo::new_form("https://example.com", "", "alice", "pw");
        f.storage.add_login(&login).await.unwrap();

        let props = LoginProperties::new().set("hostname", "chrome://app");
        f.storage.modify_login(&login, &props.into()).await.unwrap();

        assert!(f.keychain.is_empty().await);
        let moved = f.fallback.logins().await;
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].hostname, "chrome://app");
        assert_eq!(moved[0].username, "alice");
    }

    #[tokio::test]
    async fn test_modify_migration_keeps_form_field_names() {
        let f = fixture();
        let login = LoginInfo::new_form("https://example.com", "", "alice", "pw")
            .with_fields("user", "pass");
        f.storage.add_login(&login).await.unwrap();

        let props = LoginProperties::new().set("hostname", "chrome://app");
        f.storage.modify_login(&login, &props.into()).await.unwrap();

        let moved = f.fallback.logins().await;
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].username_field, "user");
        assert_eq!(moved[0].password_field, "pass");
    }

    #[tokio::test]
    async fn test_modify_migration_keeps_keychain_entry_when_fallback_add_fails() {
        let calls = CallLog::new();
        let mut fallback = MemoryLoginStore::with_call_log(calls.clone());
        fallback.add_error = Some(LoginmuxError::PermissionDenied("read-only".to_string()));
        let f = fixture_with(MemoryKeychain::with_call_log(calls), fallback);

        let login = LoginInfo::new_form("https://example.com", "", "alice", "pw");
        f.storage.add_login(&login).await.unwrap();

        let props = LoginProperties::new().set("hostname", "chrome://app");
        let err = f
            .storage
            .modify_login(&login, &props.into())
            .await
            .unwrap_err();

        assert!(matches!(err, LoginmuxError::PermissionDenied(_)));
        assert_eq!(f.keychain.len().await, 1);
        assert!(f.fallback.is_empty().await);
        assert_eq!(f.calls.count("delete_record"), 0);

        let found = f
            .storage
            .find_logins(&LoginQuery::new("https://example.com", Some(""), None))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_modify_migration_undoes_fallback_copy_when_delete_fails() {
        let calls = CallLog::new();
        let mut keychain = MemoryKeychain::with_call_log(calls.clone());
        keychain.delete_error = Some(LoginmuxError::PermissionDenied("locked".to_string()));
        let f = fixture_with(keychain, MemoryLoginStore::with_call_log(calls));

        let login = LoginInfo::new_form("https://example.com", "", "alice", "pw");
        f.storage.add_login(&login).await.unwrap();

        let props = LoginProperties::new().set("hostname", "chrome://app");
        let err = f
            .storage
            .modify_login(&login, &props.into())
            .await
            .unwrap_err();

        assert!(matches!(err, LoginmuxError::PermissionDenied(_)));
        assert_eq!(f.keychain.len().await, 1);
        assert!(f.fallback.is_empty().await);
    }

    #[tokio::test]
    async fn test_modify_rejects_invalid_result() {
        let f = fixture();
        let login = LoginInfo::new_form("https://example.com", "", "alice", "pw");
        f.storage.add_login(&login).await.unwrap();

        let props = LoginProperties::new().set("httpRealm", "Members");
        let err = f
            .storage
            .modify_login(&login, &props.into())
            .await
            .unwrap_err();
        assert!(matches!(err, LoginmuxError::InvalidLogin(_)));
    }

    #[tokio::test]
    async fn test_search_not_implemented() {
        let f = fixture();
        let err = f
            .storage
            .search_logins(&LoginProperties::new().set("username", "alice"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "not yet implemented: search_logins()");
        assert_eq!(f.calls.total(), 0);
    }

    #[tokio::test]
    async fn test_saving_preferences_delegate() {
        let f = fixture();
        f.storage
            .set_login_saving_enabled("https://example.com", false)
            .await
            .unwrap();

        assert!(!f
            .storage
            .get_login_saving_enabled("https://example.com")
            .await
            .unwrap());
        assert_eq!(f.calls.count_for("memory-keychain"), 0);
    }

    #[tokio::test]
    async fn test_import_from_fallback() {
        let f = fixture();
        f.fallback
            .insert(LoginInfo::new_form("https://example.com", "", "alice", "pw"))
            .await;
        f.fallback
            .insert(LoginInfo::new_form("chrome://app", "", "bob", "pw"))
            .await;

        let summary = f.storage.import_from_fallback().await.unwrap();

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped, 1);
        assert!(summary.failed.is_empty());
        assert_eq!(f.keychain.len().await, 1);
        assert_eq!(f.fallback.logins().await[0].hostname, "chrome://app");
    }

    #[tokio::test]
    async fn test_import_rolls_back_when_fallback_keeps_login() {
        let calls = CallLog::new();
        let mut fallback = MemoryLoginStore::with_call_log(calls.clone());
        fallback.remove_error = Some(LoginmuxError::PermissionDenied("read-only".to_string()));
        let f = fixture_with(MemoryKeychain::with_call_log(calls), fallback);
        f.fallback
            .insert(LoginInfo::new_form("https://example.com", "", "alice", "pw"))
            .await;

        let summary = f.storage.import_from_fallback().await.unwrap();

        assert_eq!(summary.imported, 0);
        assert_eq!(summary.failed.len(), 1);
        assert!(matches!(
            summary.failed[0].root(),
            LoginmuxError::PermissionDenied(_)
        ));
        assert!(f.keychain.is_empty().await);
        assert_eq!(f.fallback.len().await, 1);
    }
}
