//! Logical login data structures shared by every store.

use crate::{FieldMatch, LoginmuxError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A website login as seen by the host login manager.
///
/// A login is either form-based (`form_submit_url` is set) or HTTP-auth based
/// (`http_realm` is set), never both. `hostname` is the origin the login
/// belongs to, e.g. `https://example.com`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInfo {
    /// Origin of the login page (scheme, host and non-default port)
    pub hostname: String,

    /// Origin the login form submits to; `Some("")` means any form target
    #[serde(rename = "formSubmitURL")]
    pub form_submit_url: Option<String>,

    /// HTTP authentication realm
    #[serde(rename = "httpRealm")]
    pub http_realm: Option<String>,

    /// Username (may be empty)
    pub username: String,

    /// Password
    pub password: String,

    /// Name of the username input in the login form
    #[serde(rename = "usernameField")]
    pub username_field: String,

    /// Name of the password input in the login form
    #[serde(rename = "passwordField")]
    pub password_field: String,
}

impl LoginInfo {
    /// Creates a form login.
    ///
    /// # Example
    ///
    /// ```
    /// use loginmux::LoginInfo;
    ///
    /// let login = LoginInfo::new_form(
    ///     "https://example.com",
    ///     "https://example.com",
    ///     "alice",
    ///     "hunter2",
    /// );
    /// assert!(login.is_form_login());
    /// assert_eq!(login.http_realm, None);
    /// ```
    pub fn new_form(
        hostname: impl Into<String>,
        form_submit_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            form_submit_url: Some(form_submit_url.into()),
            http_realm: None,
            username: username.into(),
            password: password.into(),
            username_field: String::new(),
            password_field: String::new(),
        }
    }

    /// Creates an HTTP-auth login for the given realm.
    pub fn new_http_auth(
        hostname: impl Into<String>,
        http_realm: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            form_submit_url: None,
            http_realm: Some(http_realm.into()),
            username: username.into(),
            password: password.into(),
            username_field: String::new(),
            password_field: String::new(),
        }
    }

    /// Sets the form input names.
    pub fn with_fields(
        mut self,
        username_field: impl Into<String>,
        password_field: impl Into<String>,
    ) -> Self {
        self.username_field = username_field.into();
        self.password_field = password_field.into();
        self
    }

    /// Returns true if this is a form-based login.
    pub fn is_form_login(&self) -> bool {
        self.form_submit_url.is_some()
    }

    /// Loose comparison used for duplicate detection.
    ///
    /// Compares hostname, realm, username and (unless `ignore_password`)
    /// password. Form targets match when equal or when either side is the
    /// empty "any target" value.
    pub fn matches(&self, other: &LoginInfo, ignore_password: bool) -> bool {
        if self.hostname != other.hostname
            || self.http_realm != other.http_realm
            || self.username != other.username
        {
            return false;
        }

        if !ignore_password && self.password != other.password {
            return false;
        }

        match (&self.form_submit_url, &other.form_submit_url) {
            (Some(a), Some(b)) => a == b || a.is_empty() || b.is_empty(),
            (a, b) => a == b,
        }
    }

    /// Applies a property bag, returning the updated login.
    ///
    /// Properties that neither store shape can hold (login metadata such as
    /// `timesUsed`) are accepted and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`LoginmuxError::UnsupportedInputShape`] for unknown property
    /// names or for clearing a property that cannot be null.
    pub fn with_properties(&self, properties: &LoginProperties) -> Result<LoginInfo> {
        let mut updated = self.clone();

        for (name, value) in properties.iter() {
            let property = LoginProperty::from_name(name).ok_or_else(|| {
                LoginmuxError::UnsupportedInputShape(format!("unknown login property: {}", name))
            })?;

            let required = |value: &Option<String>| {
                value.clone().ok_or_else(|| {
                    LoginmuxError::UnsupportedInputShape(format!("{} cannot be null", name))
                })
            };

            match property {
                LoginProperty::Hostname => updated.hostname = required(value)?,
                LoginProperty::FormSubmitUrl => updated.form_submit_url = value.clone(),
                LoginProperty::HttpRealm => updated.http_realm = value.clone(),
                LoginProperty::Username => updated.username = required(value)?,
                LoginProperty::Password => updated.password = required(value)?,
                LoginProperty::UsernameField => updated.username_field = required(value)?,
                LoginProperty::PasswordField => updated.password_field = required(value)?,
                LoginProperty::Meta => {}
            }
        }

        Ok(updated)
    }
}

impl fmt::Debug for LoginInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInfo")
            .field("hostname", &self.hostname)
            .field("form_submit_url", &self.form_submit_url)
            .field("http_realm", &self.http_realm)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("username_field", &self.username_field)
            .field("password_field", &self.password_field)
            .finish()
    }
}

/// Lookup criteria for `find_logins` and `count_logins`.
///
/// Each nullable field follows the host contract: `None` matches only logins
/// where the field is absent, `Some("")` matches any value. The hostname
/// matches any host when empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginQuery {
    /// Origin to match
    pub hostname: String,
    /// Form target constraint
    pub form_submit_url: Option<String>,
    /// HTTP realm constraint
    pub http_realm: Option<String>,
}

impl LoginQuery {
    /// Creates a query from raw contract values.
    pub fn new(
        hostname: impl Into<String>,
        form_submit_url: Option<&str>,
        http_realm: Option<&str>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            form_submit_url: form_submit_url.map(str::to_string),
            http_realm: http_realm.map(str::to_string),
        }
    }

    /// Query for form logins on `hostname` submitting to `form_submit_url`.
    pub fn form(hostname: impl Into<String>, form_submit_url: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            form_submit_url: Some(form_submit_url.into()),
            http_realm: None,
        }
    }

    /// Query for HTTP-auth logins on `hostname` in `http_realm`.
    pub fn http_auth(hostname: impl Into<String>, http_realm: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            form_submit_url: None,
            http_realm: Some(http_realm.into()),
        }
    }

    /// Hostname constraint.
    pub fn hostname_match(&self) -> FieldMatch<String> {
        if self.hostname.is_empty() {
            FieldMatch::Any
        } else {
            FieldMatch::Exact(self.hostname.clone())
        }
    }

    /// Form target constraint.
    pub fn form_submit_url_match(&self) -> FieldMatch<String> {
        FieldMatch::from_contract(self.form_submit_url.as_deref())
    }

    /// Realm constraint.
    pub fn http_realm_match(&self) -> FieldMatch<String> {
        FieldMatch::from_contract(self.http_realm.as_deref())
    }

    /// Returns the requested realm when it is a concrete, non-empty value.
    pub fn concrete_realm(&self) -> Option<&str> {
        self.http_realm.as_deref().filter(|r| !r.is_empty())
    }

    /// Tests a stored login against this query using exact string matching.
    pub fn matches(&self, login: &LoginInfo) -> bool {
        self.hostname_match().matches(Some(&login.hostname))
            && self
                .form_submit_url_match()
                .matches(login.form_submit_url.as_ref())
            && self.http_realm_match().matches(login.http_realm.as_ref())
    }
}

/// Named login properties, as passed to `modify_login` and `search_logins`.
///
/// Property names are the host contract's (`hostname`, `formSubmitURL`,
/// `httpRealm`, `username`, `password`, `usernameField`, `passwordField`,
/// plus login metadata). A `None` value sets the property to null.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginProperties {
    values: BTreeMap<String, Option<String>>,
}

impl LoginProperties {
    /// Creates an empty property bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property to a value.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), Some(value.into()));
        self
    }

    /// Sets a property to null.
    pub fn clear(mut self, name: impl Into<String>) -> Self {
        self.values.insert(name.into(), None);
        self
    }

    /// Returns a property value; the outer `Option` is presence.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.values.get(name).map(Option::as_deref)
    }

    /// Iterates over all properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<String>)> {
        self.values.iter()
    }

    /// Number of properties in the bag.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the bag has no properties.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// New data for `modify_login`: either a replacement login or a property bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewLoginData {
    /// Overwrite every field from this login
    Full(LoginInfo),
    /// Overwrite only the named properties
    Partial(LoginProperties),
}

impl NewLoginData {
    /// Produces the login that results from applying this data to `current`.
    pub fn apply_to(&self, current: &LoginInfo) -> Result<LoginInfo> {
        match self {
            Self::Full(login) => Ok(login.clone()),
            Self::Partial(properties) => current.with_properties(properties),
        }
    }
}

impl From<LoginInfo> for NewLoginData {
    fn from(login: LoginInfo) -> Self {
        Self::Full(login)
    }
}

impl From<LoginProperties> for NewLoginData {
    fn from(properties: LoginProperties) -> Self {
        Self::Partial(properties)
    }
}

/// Known property names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoginProperty {
    Hostname,
    FormSubmitUrl,
    HttpRealm,
    Username,
    Password,
    UsernameField,
    PasswordField,
    /// Login metadata neither store shape keeps
    Meta,
}

impl LoginProperty {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "hostname" => Some(Self::Hostname),
            "formSubmitURL" => Some(Self::FormSubmitUrl),
            "httpRealm" => Some(Self::HttpRealm),
            "username" => Some(Self::Username),
            "password" => Some(Self::Password),
            "usernameField" => Some(Self::UsernameField),
            "passwordField" => Some(Self::PasswordField),
            "guid" | "timeCreated" | "timeLastUsed" | "timePasswordChanged" | "timesUsed"
            | "timesUsedIncrement" => Some(Self::Meta),
            _ => None,
        }
    }

    /// Reads this property from a login; `None` for metadata.
    pub(crate) fn read(self, login: &LoginInfo) -> Option<Option<&str>> {
        match self {
            Self::Hostname => Some(Some(login.hostname.as_str())),
            Self::FormSubmitUrl => Some(login.form_submit_url.as_deref()),
            Self::HttpRealm => Some(login.http_realm.as_deref()),
            Self::Username => Some(Some(login.username.as_str())),
            Self::Password => Some(Some(login.password.as_str())),
            Self::UsernameField => Some(Some(login.username_field.as_str())),
            Self::PasswordField => Some(Some(login.password_field.as_str())),
            Self::Meta => None,
        }
    }
}
