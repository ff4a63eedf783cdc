//! In-memory login store for testing.
//!
//! Stands in for the legacy login database behind the keychain facade. It
//! implements the full [`LoginStorage`] contract, including
//! `search_logins`, and records every call in a [`CallLog`].

use crate::backends::{replay_error, CallLog};
use crate::login::LoginProperty;
use crate::validation::{validate_hostname, validate_login};
use crate::{
    LoginInfo, LoginProperties, LoginQuery, LoginStorage, LoginmuxError, NewLoginData, Result,
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use tokio::sync::RwLock;

const NAME: &str = "memory-logins";

/// In-memory login store.
///
/// # Example
///
/// ```
/// use loginmux::backends::memory_logins::MemoryLoginStore;
/// use loginmux::{LoginInfo, LoginProperties, LoginStorage};
///
/// #[tokio::main]
/// async fn main() -> loginmux::Result<()> {
///     let store = MemoryLoginStore::new();
///     store
///         .add_login(&LoginInfo::new_form("chrome://app", "", "alice", "pw"))
///         .await?;
///
///     let found = store
///         .search_logins(&LoginProperties::new().set("username", "alice"))
///         .await?;
///     assert_eq!(found.len(), 1);
///     Ok(())
/// }
/// ```
pub struct MemoryLoginStore {
    logins: RwLock<Vec<LoginInfo>>,
    disabled_hosts: RwLock<BTreeSet<String>>,
    calls: CallLog,

    /// Error to return from `add_login()`
    pub add_error: Option<LoginmuxError>,
    /// Error to return from `remove_login()`
    pub remove_error: Option<LoginmuxError>,
    /// Error to return from `modify_login()`
    pub modify_error: Option<LoginmuxError>,
    /// Error to return from `find_logins()` and `count_logins()`
    pub find_error: Option<LoginmuxError>,
}

impl MemoryLoginStore {
    /// Creates an empty store with its own call log.
    pub fn new() -> Self {
        Self::with_call_log(CallLog::new())
    }

    /// Creates an empty store recording into `calls`.
    pub fn with_call_log(calls: CallLog) -> Self {
        Self {
            logins: RwLock::new(Vec::new()),
            disabled_hosts: RwLock::new(BTreeSet::new()),
            calls,
            add_error: None,
            remove_error: None,
            modify_error: None,
            find_error: None,
        }
    }

    /// Handle to the call log.
    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    /// Adds a login directly, bypassing validation and call recording.
    pub async fn insert(&self, login: LoginInfo) {
        self.logins.write().await.push(login);
    }

    /// Snapshot of every stored login, without call recording.
    pub async fn logins(&self) -> Vec<LoginInfo> {
        self.logins.read().await.clone()
    }

    /// Number of stored logins.
    pub async fn len(&self) -> usize {
        self.logins.read().await.len()
    }

    /// Returns true if no logins are stored.
    pub async fn is_empty(&self) -> bool {
        self.logins.read().await.is_empty()
    }

    fn injected(&self, err: &Option<LoginmuxError>) -> Result<()> {
        match err {
            Some(err) => Err(replay_error(err)),
            None => Ok(()),
        }
    }
}

impl Default for MemoryLoginStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks every criterion against a login's properties.
fn matches_criteria(
    login: &LoginInfo,
    criteria: &[(LoginProperty, Option<&str>)],
) -> bool {
    criteria
        .iter()
        .all(|(property, expected)| match property.read(login) {
            Some(actual) => actual == *expected,
            None => true,
        })
}

#[async_trait]
impl LoginStorage for MemoryLoginStore {
    fn name(&self) -> &str {
        NAME
    }

    async fn add_login(&self, login: &LoginInfo) -> Result<()> {
        self.calls.record(NAME, "add_login");
        self.injected(&self.add_error)?;
        validate_login(login)?;

        let mut logins = self.logins.write().await;
        if logins.iter().any(|stored| stored.matches(login, true)) {
            return Err(LoginmuxError::AlreadyExists(format!(
                "{} on {}",
                login.username, login.hostname
            )));
        }

        logins.push(login.clone());
        Ok(())
    }

    async fn remove_login(&self, login: &LoginInfo) -> Result<()> {
        self.calls.record(NAME, "remove_login");
        self.injected(&self.remove_error)?;

        let mut logins = self.logins.write().await;
        let index = logins
            .iter()
            .position(|stored| stored.matches(login, false))
            .ok_or_else(|| LoginmuxError::NotFound(login.hostname.clone()))?;
        logins.remove(index);
        Ok(())
    }

    async fn modify_login(&self, old_login: &LoginInfo, new_data: &NewLoginData) -> Result<()> {
        self.calls.record(NAME, "modify_login");
        self.injected(&self.modify_error)?;

        let mut logins = self.logins.write().await;
        let index = logins
            .iter()
            .position(|stored| stored.matches(old_login, false))
            .ok_or_else(|| LoginmuxError::NotFound(old_login.hostname.clone()))?;

        let updated = new_data.apply_to(&logins[index])?;
        validate_login(&updated)?;

        let duplicate = logins
            .iter()
            .enumerate()
            .any(|(i, stored)| i != index && stored.matches(&updated, true));
        if duplicate {
            return Err(LoginmuxError::AlreadyExists(format!(
                "{} on {}",
                updated.username, updated.hostname
            )));
        }

        logins[index] = updated;
        Ok(())
    }

    async fn remove_all_logins(&self) -> Result<()> {
        self.calls.record(NAME, "remove_all_logins");
        self.logins.write().await.clear();
        Ok(())
    }

    async fn get_all_logins(&self) -> Result<Vec<LoginInfo>> {
        self.calls.record(NAME, "get_all_logins");
        Ok(self.logins.read().await.clone())
    }

    async fn find_logins(&self, query: &LoginQuery) -> Result<Vec<LoginInfo>> {
        self.calls.record(NAME, "find_logins");
        self.injected(&self.find_error)?;

        let logins = self.logins.read().await;
        Ok(logins
            .iter()
            .filter(|login| query.matches(login))
            .cloned()
            .collect())
    }

    async fn count_logins(&self, query: &LoginQuery) -> Result<usize> {
        self.calls.record(NAME, "count_logins");
        self.injected(&self.find_error)?;

        let logins = self.logins.read().await;
        Ok(logins.iter().filter(|login| query.matches(login)).count())
    }

    async fn search_logins(&self, criteria: &LoginProperties) -> Result<Vec<LoginInfo>> {
        self.calls.record(NAME, "search_logins");
        self.injected(&self.find_error)?;

        let criteria = criteria
            .iter()
            .map(|(name, value)| {
                LoginProperty::from_name(name)
                    .map(|property| (property, value.as_deref()))
                    .ok_or_else(|| {
                        LoginmuxError::UnsupportedInputShape(format!(
                            "unknown login property: {}",
                            name
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let logins = self.logins.read().await;
        Ok(logins
            .iter()
            .filter(|login| matches_criteria(login, &criteria))
            .cloned()
            .collect())
    }

    async fn get_all_disabled_hosts(&self) -> Result<Vec<String>> {
        self.calls.record(NAME, "get_all_disabled_hosts");
        Ok(self.disabled_hosts.read().await.iter().cloned().collect())
    }

    async fn get_login_saving_enabled(&self, hostname: &str) -> Result<bool> {
        self.calls.record(NAME, "get_login_saving_enabled");
        validate_hostname(hostname)?;
        Ok(!self.disabled_hosts.read().await.contains(hostname))
    }

    async fn set_login_saving_enabled(&self, hostname: &str, enabled: bool) -> Result<()> {
        self.calls.record(NAME, "set_login_saving_enabled");
        validate_hostname(hostname)?;

        let mut hosts = self.disabled_hosts.write().await;
        if enabled {
            hosts.remove(hostname);
        } else {
            hosts.insert(hostname.to_string());
        }
        Ok(())
    }
}
