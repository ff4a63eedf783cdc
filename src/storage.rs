//! The login-manager storage contract.
//!
//! [`LoginStorage`] is the fixed interface the host login manager talks to.
//! The generic fallback store implements it, and so does
//! [`KeychainStorage`](crate::KeychainStorage), which layers the keychain in
//! front of a fallback store of the same shape.

use crate::{LoginInfo, LoginProperties, LoginQuery, LoginmuxError, NewLoginData, Result};
use async_trait::async_trait;

/// Login storage as required by the host login manager.
///
/// # Example
///
/// ```
/// use loginmux::backends::memory_logins::MemoryLoginStore;
/// use loginmux::{LoginInfo, LoginQuery, LoginStorage};
///
/// #[tokio::main]
/// async fn main() -> loginmux::Result<()> {
///     let store = MemoryLoginStore::new();
///     store.init().await?;
///
///     let login = LoginInfo::new_form("chrome://app", "", "alice", "pw");
///     store.add_login(&login).await?;
///
///     let found = store
///         .find_logins(&LoginQuery::new("chrome://app", Some(""), None))
///         .await?;
///     assert_eq!(found.len(), 1);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait LoginStorage: Send + Sync {
    // ========================================================================
    // Metadata
    // ========================================================================

    /// Returns the storage name (e.g., "keychain", "memory-logins").
    fn name(&self) -> &str;

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Prepares the storage for use.
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Whether the storage is waiting on user interaction.
    fn ui_busy(&self) -> bool {
        false
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Stores a new login.
    async fn add_login(&self, login: &LoginInfo) -> Result<()>;

    /// Removes a stored login.
    async fn remove_login(&self, login: &LoginInfo) -> Result<()>;

    /// Changes a stored login.
    ///
    /// # Errors
    ///
    /// - [`LoginmuxError::NotFound`]: `old_login` is not stored
    /// - [`LoginmuxError::UnsupportedInputShape`]: `new_data` names unknown properties
    async fn modify_login(&self, old_login: &LoginInfo, new_data: &NewLoginData) -> Result<()>;

    /// Removes every stored login.
    async fn remove_all_logins(&self) -> Result<()>;

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns every stored login.
    async fn get_all_logins(&self) -> Result<Vec<LoginInfo>>;

    /// Returns logins matching `query`.
    async fn find_logins(&self, query: &LoginQuery) -> Result<Vec<LoginInfo>>;

    /// Counts logins matching `query`.
    async fn count_logins(&self, query: &LoginQuery) -> Result<usize>;

    /// Returns logins whose named properties equal `criteria`.
    async fn search_logins(&self, _criteria: &LoginProperties) -> Result<Vec<LoginInfo>> {
        Err(LoginmuxError::NotImplemented("search_logins()".to_string()))
    }

    // ========================================================================
    // Per-host saving preferences
    // ========================================================================

    /// Returns hosts for which login saving is disabled.
    async fn get_all_disabled_hosts(&self) -> Result<Vec<String>>;

    /// Whether login saving is enabled for `hostname`.
    async fn get_login_saving_enabled(&self, hostname: &str) -> Result<bool>;

    /// Enables or disables login saving for `hostname`.
    async fn set_login_saving_enabled(&self, hostname: &str, enabled: bool) -> Result<()>;
}
