//! Input validation for logins and per-host preferences.
//!
//! The stored format of the fallback store is line-oriented, so values
//! written in plain text must not carry line breaks. Nothing may carry a
//! NUL byte.

use crate::{LoginInfo, LoginmuxError, Result};

/// Characters that would break the line-oriented storage format.
const LINE_BREAKS: [char; 2] = ['\r', '\n'];

/// Validates a login before it is stored.
///
/// This function rejects logins that could not be read back correctly:
/// - Empty hostname or password
/// - Both or neither of form target and HTTP realm set
/// - NUL bytes in any field
/// - Line breaks in any plain-text field
/// - A lone `.` as username field or form target (reserved by the format)
/// - A hostname containing `" ("`, which is ambiguous in host lists
///
/// # Errors
///
/// Returns [`LoginmuxError::InvalidLogin`] if validation fails.
///
/// # Example
///
/// ```
/// use loginmux::validation::validate_login;
/// use loginmux::LoginInfo;
///
/// let login = LoginInfo::new_form("https://example.com", "", "alice", "pw");
/// assert!(validate_login(&login).is_ok());
///
/// let login = LoginInfo::new_form("https://example.com", "", "alice", "");
/// assert!(validate_login(&login).is_err());
/// ```
pub fn validate_login(login: &LoginInfo) -> Result<()> {
    if login.hostname.is_empty() {
        return Err(invalid("hostname cannot be empty"));
    }

    if login.password.is_empty() {
        return Err(invalid("password cannot be empty"));
    }

    match (&login.form_submit_url, &login.http_realm) {
        (Some(_), Some(_)) => {
            return Err(invalid("formSubmitURL and httpRealm cannot both be set"));
        }
        (None, None) => {
            return Err(invalid("one of formSubmitURL or httpRealm must be set"));
        }
        _ => {}
    }

    let fields = [
        ("hostname", Some(login.hostname.as_str())),
        ("formSubmitURL", login.form_submit_url.as_deref()),
        ("httpRealm", login.http_realm.as_deref()),
        ("username", Some(login.username.as_str())),
        ("password", Some(login.password.as_str())),
        ("usernameField", Some(login.username_field.as_str())),
        ("passwordField", Some(login.password_field.as_str())),
    ];

    for (name, value) in fields {
        let Some(value) = value else { continue };
        if value.contains('\0') {
            return Err(invalid(format!("{} contains null byte", name)));
        }
    }

    // username and password are stored encrypted; everything else is plain text
    for (name, value) in fields {
        if matches!(name, "username" | "password") {
            continue;
        }
        let Some(value) = value else { continue };
        if value.contains(LINE_BREAKS) {
            return Err(invalid(format!("{} contains a line break", name)));
        }
    }

    if login.username_field == "." {
        return Err(invalid("usernameField cannot be \".\""));
    }

    if login.form_submit_url.as_deref() == Some(".") {
        return Err(invalid("formSubmitURL cannot be \".\""));
    }

    if login.hostname.contains(" (") {
        return Err(invalid("hostname cannot contain \" (\""));
    }

    Ok(())
}

/// Validates a hostname used for the login-saving preference.
///
/// # Errors
///
/// Returns [`LoginmuxError::InvalidLogin`] for an empty hostname, a lone
/// `.`, or one containing NUL bytes or line breaks.
pub fn validate_hostname(hostname: &str) -> Result<()> {
    if hostname.is_empty() {
        return Err(invalid("hostname cannot be empty"));
    }

    if hostname == "." {
        return Err(invalid("hostname cannot be \".\""));
    }

    if hostname.contains('\0') || hostname.contains(LINE_BREAKS) {
        return Err(invalid("hostname contains control characters"));
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> LoginmuxError {
    LoginmuxError::InvalidLogin(message.into())
}
