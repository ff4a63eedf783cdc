//! Conversion between logical logins and keychain attribute keys.
//!
//! The hostname decomposes into protocol, server and port. The HTTP realm
//! goes into the security domain verbatim. The keychain has no form-target
//! attribute, so form logins are marked with [`AuthType::HtmlForm`] and
//! carry their form target in the security domain as well. The auth type
//! tells the two uses apart on the way back.
//!
//! Form input names (`usernameField`/`passwordField`) have no native slot
//! and are dropped; converting a record back leaves them empty.

use crate::classifier::{parse_origin, Origin};
use crate::native::{AuthType, NativeKey, NativeQuery, NativeRecord, Protocol};
use crate::{FieldMatch, LoginInfo, LoginQuery};

/// Builds the search query for `find_logins`/`count_logins` criteria.
///
/// Returns `None` if the hostname cannot be represented in the keychain.
pub fn query_for_search(query: &LoginQuery) -> Option<NativeQuery> {
    let origin = parse_origin(&query.hostname)?;
    let (auth_type, security_domain) =
        mode_constraints(query.form_submit_url_match(), query.http_realm_match());

    Some(NativeQuery {
        account_name: FieldMatch::Any,
        protocol: FieldMatch::Exact(origin.protocol),
        server_name: FieldMatch::Exact(origin.host.clone()),
        port: port_constraint(&origin),
        auth_type,
        security_domain,
    })
}

/// Builds the query that locates the stored entry for a specific login.
///
/// Returns `None` if the hostname cannot be represented in the keychain.
pub fn query_for_login(login: &LoginInfo) -> Option<NativeQuery> {
    let origin = parse_origin(&login.hostname)?;

    let (auth_type, security_domain) = match (&login.http_realm, &login.form_submit_url) {
        (Some(realm), _) => (
            FieldMatch::Except(AuthType::HtmlForm),
            FieldMatch::exact_or_blank(realm),
        ),
        (None, Some(target)) if target.is_empty() => {
            (FieldMatch::Exact(AuthType::HtmlForm), FieldMatch::Absent)
        }
        (None, Some(target)) => (
            FieldMatch::Exact(AuthType::HtmlForm),
            FieldMatch::ExactOrAbsent(target.clone()),
        ),
        (None, None) => (FieldMatch::Except(AuthType::HtmlForm), FieldMatch::Absent),
    };

    Some(NativeQuery {
        account_name: FieldMatch::exact_or_blank(&login.username),
        protocol: FieldMatch::Exact(origin.protocol),
        server_name: FieldMatch::Exact(origin.host.clone()),
        port: port_constraint(&origin),
        auth_type,
        security_domain,
    })
}

/// Drops the security-domain constraint from a query.
pub fn relax(query: &NativeQuery) -> NativeQuery {
    NativeQuery {
        security_domain: FieldMatch::Any,
        ..query.clone()
    }
}

/// Builds the attribute key to store a login under.
///
/// Never fails: for a hostname the keychain cannot represent, protocol,
/// server and port stay unset and the keychain rejects the key on create.
pub fn key_for_login(login: &LoginInfo) -> NativeKey {
    let origin = parse_origin(&login.hostname);

    let (auth_type, security_domain) = match (&login.http_realm, &login.form_submit_url) {
        (Some(realm), _) => (AuthType::HttpBasic, non_empty(realm)),
        (None, Some(target)) => (AuthType::HtmlForm, non_empty(target)),
        (None, None) => (AuthType::Default, None),
    };

    NativeKey {
        account_name: non_empty(&login.username),
        protocol: origin.as_ref().map(|o| o.protocol),
        server_name: origin.as_ref().map(|o| o.host.clone()),
        port: origin.as_ref().map(Origin::effective_port),
        auth_type: Some(auth_type),
        security_domain,
    }
}

/// Converts a keychain entry back into a login.
///
/// Returns `None` for entries without a protocol or server, which have no
/// hostname to report.
pub fn login_for_record(record: &NativeRecord) -> Option<LoginInfo> {
    let key = &record.key;
    let protocol = key.protocol?;
    let server = key.server_name.as_deref().filter(|s| !s.is_empty())?;
    let domain = key.security_domain().unwrap_or_default().to_string();

    let (form_submit_url, http_realm) = match key.auth_type {
        Some(AuthType::HtmlForm) => (Some(domain), None),
        _ => (None, Some(domain)),
    };

    Some(LoginInfo {
        hostname: hostname_for(protocol, server, key.port),
        form_submit_url,
        http_realm,
        username: key.account_name.clone().unwrap_or_default(),
        password: record.secret.clone(),
        username_field: String::new(),
        password_field: String::new(),
    })
}

/// Reassembles a hostname, omitting the protocol's default port.
///
/// The server is lowercased, as the URL parser does for the hostnames the
/// host application passes in.
pub fn hostname_for(protocol: Protocol, server: &str, port: Option<u16>) -> String {
    let server = server.to_ascii_lowercase();
    match port {
        Some(port) if port != 0 && port != protocol.default_port() => {
            format!("{}://{}:{}", protocol.scheme(), server, port)
        }
        _ => format!("{}://{}", protocol.scheme(), server),
    }
}

fn port_constraint(origin: &Origin) -> FieldMatch<u16> {
    match origin.explicit_port {
        Some(port) => FieldMatch::Exact(port),
        // entries written by other applications often leave the default port unset
        None => FieldMatch::ExactOrAbsent(origin.protocol.default_port()),
    }
}

/// Lowers the form-target and realm constraints of a search.
///
/// A concrete realm wins over a concrete form target.
fn mode_constraints(
    form: FieldMatch<String>,
    realm: FieldMatch<String>,
) -> (FieldMatch<AuthType>, FieldMatch<String>) {
    match (form, realm) {
        (_, FieldMatch::Exact(realm)) => {
            (FieldMatch::Except(AuthType::HtmlForm), FieldMatch::Exact(realm))
        }
        (FieldMatch::Exact(target), _) => (
            FieldMatch::Exact(AuthType::HtmlForm),
            FieldMatch::ExactOrAbsent(target),
        ),
        (FieldMatch::Any, FieldMatch::Any) => (FieldMatch::Any, FieldMatch::Any),
        (_, FieldMatch::Any) => (FieldMatch::Except(AuthType::HtmlForm), FieldMatch::Any),
        (FieldMatch::Any, _) => (FieldMatch::Exact(AuthType::HtmlForm), FieldMatch::Any),
        _ => (FieldMatch::Except(AuthType::HtmlForm), FieldMatch::Absent),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_for_http_auth_login() {
        let login = LoginInfo::new_http_auth("http://example.com", "Members", "bob", "pw");
        let key = key_for_login(&login);

        assert_eq!(key.protocol, Some(Protocol::Http));
        assert_eq!(key.server_name.as_deref(), Some("example.com"));
        assert_eq!(key.port, Some(80));
        assert_eq!(key.auth_type, Some(AuthType::HttpBasic));
        assert_eq!(key.security_domain.as_deref(), Some("Members"));
        assert_eq!(key.account_name.as_deref(), Some("bob"));
    }

    #[test]
    fn test_key_for_form_login() {
        let login = LoginInfo::new_form(
            "https://example.com:8443",
            "https://auth.example.com",
            "alice",
            "pw",
        );
        let key = key_for_login(&login);

        assert_eq!(key.port, Some(8443));
        assert_eq!(key.auth_type, Some(AuthType::HtmlForm));
        assert_eq!(key.security_domain.as_deref(), Some("https://auth.example.com"));
    }

    #[test]
    fn test_key_for_unsupported_host_is_not_network_key() {
        let login = LoginInfo::new_form("chrome://browser", "", "alice", "pw");
        let key = key_for_login(&login);
        assert!(!key.is_network_key());
        assert_eq!(key.account_name.as_deref(), Some("alice"));
    }

    #[test]
    fn test_login_for_record_inverts_key() {
        let login = LoginInfo::new_form(
            "https://example.com:8443",
            "https://auth.example.com",
            "alice",
            "pw",
        )
        .with_fields("user", "pass");

        let record = NativeRecord::new(key_for_login(&login), "pw");
        let back = login_for_record(&record).unwrap();

        assert_eq!(back.hostname, login.hostname);
        assert_eq!(back.form_submit_url, login.form_submit_url);
        assert_eq!(back.http_realm, None);
        assert_eq!(back.username, "alice");
        assert_eq!(back.password, "pw");
        assert!(back.username_field.is_empty());
        assert!(back.password_field.is_empty());
    }

    #[test]
    fn test_login_for_record_without_server() {
        let record = NativeRecord::new(NativeKey::default(), "pw");
        assert!(login_for_record(&record).is_none());
    }

    #[test]
    fn test_login_for_record_never_invents_realm() {
        let key = NativeKey {
            protocol: Some(Protocol::Http),
            server_name: Some("example.com".to_string()),
            security_domain: Some(String::new()),
            ..Default::default()
        };
        let login = login_for_record(&NativeRecord::new(key, "pw")).unwrap();

        assert_eq!(login.hostname, "http://example.com");
        assert_eq!(login.http_realm.as_deref(), Some(""));
        assert_eq!(login.username, "");
    }

    #[test]
    fn test_search_query_for_realm() {
        let query = query_for_search(&LoginQuery::http_auth("http://example.com", "Members"))
            .unwrap();

        assert_eq!(query.security_domain, FieldMatch::Exact("Members".to_string()));
        assert_eq!(query.auth_type, FieldMatch::Except(AuthType::HtmlForm));
        assert_eq!(query.port, FieldMatch::ExactOrAbsent(80));
        assert!(query.account_name.is_any());
        assert!(relax(&query).security_domain.is_any());
    }

    #[test]
    fn test_search_query_lowering_table() {
        let host = "https://example.com";

        let q = query_for_search(&LoginQuery::new(host, Some(""), Some(""))).unwrap();
        assert!(q.auth_type.is_any() && q.security_domain.is_any());

        let q = query_for_search(&LoginQuery::new(host, None, Some(""))).unwrap();
        assert_eq!(q.auth_type, FieldMatch::Except(AuthType::HtmlForm));
        assert!(q.security_domain.is_any());

        let q = query_for_search(&LoginQuery::new(host, Some(""), None)).unwrap();
        assert_eq!(q.auth_type, FieldMatch::Exact(AuthType::HtmlForm));

        let q = query_for_search(&LoginQuery::form(host, "https://a.example.com")).unwrap();
        assert_eq!(
            q.security_domain,
            FieldMatch::ExactOrAbsent("https://a.example.com".to_string())
        );

        let q = query_for_search(&LoginQuery::new(host, None, None)).unwrap();
        assert_eq!(q.security_domain, FieldMatch::Absent);
    }

    #[test]
    fn test_search_query_unsupported() {
        assert!(query_for_search(&LoginQuery::new("chrome://browser", Some(""), None)).is_none());
    }

    #[test]
    fn test_login_query_matches_own_key() {
        let login = LoginInfo::new_http_auth("http://example.com:8080", "Admin", "bob", "pw");
        let query = query_for_login(&login).unwrap();
        assert!(query.matches(&key_for_login(&login)));

        let other = LoginInfo::new_http_auth("http://example.com:8080", "Admin", "eve", "pw");
        assert!(!query.matches(&key_for_login(&other)));
    }

    #[test]
    fn test_hostname_for_ports() {
        assert_eq!(hostname_for(Protocol::Https, "a.com", Some(443)), "https://a.com");
        assert_eq!(hostname_for(Protocol::Https, "a.com", Some(0)), "https://a.com");
        assert_eq!(hostname_for(Protocol::Http, "a.com", Some(8080)), "http://a.com:8080");
        assert_eq!(hostname_for(Protocol::Http, "a.com", None), "http://a.com");
        assert_eq!(hostname_for(Protocol::Https, "A.Com", None), "https://a.com");
    }
}
