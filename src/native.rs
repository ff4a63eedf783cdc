//! Keychain-native key, query and record shapes.
//!
//! Internet-password entries in a platform keychain are keyed by network
//! attributes rather than by the logical login fields. These types mirror
//! that attribute set; [`mapper`](crate::mapper) converts between the two.

use crate::FieldMatch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Network protocol attribute of an internet-password entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// `http`
    Http,
    /// `https`
    Https,
    /// `ftp`
    Ftp,
    /// `ftps`
    Ftps,
    /// `imap`
    Imap,
    /// `imaps`
    Imaps,
    /// `pop3`
    Pop3,
    /// `pop3s`
    Pop3s,
    /// `smtp`
    Smtp,
    /// `ldap`
    Ldap,
    /// `ldaps`
    Ldaps,
    /// `socks`
    Socks,
}

impl Protocol {
    /// Maps a URL scheme to a protocol. Scheme matching is case-insensitive.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            "ftp" => Some(Self::Ftp),
            "ftps" => Some(Self::Ftps),
            "imap" => Some(Self::Imap),
            "imaps" => Some(Self::Imaps),
            "pop3" | "pop" => Some(Self::Pop3),
            "pop3s" | "pops" => Some(Self::Pop3s),
            "smtp" => Some(Self::Smtp),
            "ldap" => Some(Self::Ldap),
            "ldaps" => Some(Self::Ldaps),
            "socks" => Some(Self::Socks),
            _ => None,
        }
    }

    /// URL scheme for this protocol.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Ftp => "ftp",
            Self::Ftps => "ftps",
            Self::Imap => "imap",
            Self::Imaps => "imaps",
            Self::Pop3 => "pop3",
            Self::Pop3s => "pop3s",
            Self::Smtp => "smtp",
            Self::Ldap => "ldap",
            Self::Ldaps => "ldaps",
            Self::Socks => "socks",
        }
    }

    /// Well-known port for this protocol.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
            Self::Ftp => 21,
            Self::Ftps => 990,
            Self::Imap => 143,
            Self::Imaps => 993,
            Self::Pop3 => 110,
            Self::Pop3s => 995,
            Self::Smtp => 25,
            Self::Ldap => 389,
            Self::Ldaps => 636,
            Self::Socks => 1080,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.scheme())
    }
}

/// Authentication type attribute of an internet-password entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// Unspecified
    Default,
    /// HTTP basic authentication
    HttpBasic,
    /// HTTP digest authentication
    HttpDigest,
    /// NTLM
    Ntlm,
    /// HTML form login
    HtmlForm,
}

/// Attribute key of a keychain entry.
///
/// Every attribute is optional: entries written by other applications often
/// leave some of them unset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NativeKey {
    /// Account (username)
    pub account_name: Option<String>,
    /// Network protocol
    pub protocol: Option<Protocol>,
    /// Server host name
    pub server_name: Option<String>,
    /// Server port; 0 is read as unset
    pub port: Option<u16>,
    /// Authentication type
    pub auth_type: Option<AuthType>,
    /// Security domain (HTTP realm or form target)
    pub security_domain: Option<String>,
}

impl NativeKey {
    /// Returns true if the key names a network location.
    ///
    /// Keychains can only create internet-password entries for such keys.
    pub fn is_network_key(&self) -> bool {
        self.protocol.is_some() && self.server_name.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Security domain, with an empty string read as unset.
    pub fn security_domain(&self) -> Option<&str> {
        self.security_domain.as_deref().filter(|d| !d.is_empty())
    }
}

/// Attribute query against a keychain.
///
/// Uses the same wildcard semantics as the logical contract: [`FieldMatch::Any`]
/// ignores the attribute, [`FieldMatch::Absent`] requires it unset. Empty
/// string attributes count as unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeQuery {
    /// Account constraint
    pub account_name: FieldMatch<String>,
    /// Protocol constraint
    pub protocol: FieldMatch<Protocol>,
    /// Server constraint
    pub server_name: FieldMatch<String>,
    /// Port constraint
    pub port: FieldMatch<u16>,
    /// Authentication type constraint
    pub auth_type: FieldMatch<AuthType>,
    /// Security domain constraint
    pub security_domain: FieldMatch<String>,
}

impl NativeQuery {
    /// Query matching every entry.
    pub fn wildcard() -> Self {
        Self {
            account_name: FieldMatch::Any,
            protocol: FieldMatch::Any,
            server_name: FieldMatch::Any,
            port: FieldMatch::Any,
            auth_type: FieldMatch::Any,
            security_domain: FieldMatch::Any,
        }
    }

    /// Tests an entry key against this query.
    pub fn matches(&self, key: &NativeKey) -> bool {
        self.account_name.matches_str(key.account_name.as_deref())
            && self.protocol.matches(key.protocol.as_ref())
            && self
                .server_name
                .matches_str_ignore_case(key.server_name.as_deref())
            && self.port.matches(key.port.filter(|p| *p != 0).as_ref())
            && self.auth_type.matches(key.auth_type.as_ref())
            && self.security_domain.matches_str(key.security_domain.as_deref())
    }
}

/// Opaque reference to a keychain entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordHandle(pub Uuid);

impl RecordHandle {
    /// Creates a fresh random handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A keychain entry: attributes plus secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeRecord {
    /// Entry handle
    pub handle: RecordHandle,
    /// Entry attributes
    pub key: NativeKey,
    /// Password data
    pub secret: String,
    /// When the entry was created
    pub created: DateTime<Utc>,
    /// When the entry was last modified
    pub modified: DateTime<Utc>,
}

impl NativeRecord {
    /// Creates a record with a fresh handle and current timestamps.
    pub fn new(key: NativeKey, secret: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            handle: RecordHandle::new(),
            key,
            secret: secret.into(),
            created: now,
            modified: now,
        }
    }
}

impl std::fmt::Debug for NativeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeRecord")
            .field("handle", &self.handle)
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("created", &self.created)
            .field("modified", &self.modified)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(domain: Option<&str>) -> NativeKey {
        NativeKey {
            account_name: Some("alice".to_string()),
            protocol: Some(Protocol::Http),
            server_name: Some("example.com".to_string()),
            port: None,
            auth_type: Some(AuthType::HttpBasic),
            security_domain: domain.map(str::to_string),
        }
    }

    #[test]
    fn test_protocol_schemes() {
        assert_eq!(Protocol::from_scheme("HTTPS"), Some(Protocol::Https));
        assert_eq!(Protocol::from_scheme("chrome"), None);
        assert_eq!(Protocol::Https.default_port(), 443);
        assert_eq!(Protocol::Ftp.to_string(), "ftp");
    }

    #[test]
    fn test_wildcard_matches_everything() {
        assert!(NativeQuery::wildcard().matches(&NativeKey::default()));
        assert!(NativeQuery::wildcard().matches(&key(Some("Members"))));
    }

    #[test]
    fn test_empty_domain_is_absent() {
        let mut query = NativeQuery::wildcard();
        query.security_domain = FieldMatch::Absent;

        assert!(query.matches(&key(Some(""))));
        assert!(query.matches(&key(None)));
        assert!(!query.matches(&key(Some("Members"))));
        assert_eq!(key(Some("")).security_domain(), None);
    }

    #[test]
    fn test_zero_port_is_absent() {
        let mut query = NativeQuery::wildcard();
        query.port = FieldMatch::ExactOrAbsent(80);

        let mut zero = key(None);
        zero.port = Some(0);
        assert!(query.matches(&zero));

        query.port = FieldMatch::Exact(8080);
        assert!(!query.matches(&zero));
    }

    #[test]
    fn test_network_key() {
        assert!(key(None).is_network_key());
        assert!(!NativeKey::default().is_network_key());
    }

    #[test]
    fn test_record_debug_redacts_secret() {
        let record = NativeRecord::new(key(None), "s3cret");
        assert!(!format!("{:?}", record).contains("s3cret"));
    }
}
