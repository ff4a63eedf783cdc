//! Decides which hostnames the keychain can represent.
//!
//! Keychain internet-password entries need a protocol and a server. Host
//! application pseudo-origins such as `chrome://browser` or
//! `moz-extension://...` have neither in any meaningful sense, so logins for
//! them always live in the fallback store.

use crate::native::Protocol;
use url::Url;

/// A hostname decomposed into keychain network attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    /// Protocol from the scheme
    pub protocol: Protocol,
    /// Host, as serialized by the URL parser
    pub host: String,
    /// Port written in the hostname, if it differs from the protocol default
    pub explicit_port: Option<u16>,
}

impl Origin {
    /// Port to store: the explicit one or the protocol default.
    pub fn effective_port(&self) -> u16 {
        self.explicit_port
            .unwrap_or_else(|| self.protocol.default_port())
    }
}

/// Returns true if logins for `hostname` can be stored in the keychain.
///
/// # Example
///
/// ```
/// use loginmux::classifier::is_supported;
///
/// assert!(is_supported("https://example.com"));
/// assert!(is_supported("http://example.com:8080"));
/// assert!(!is_supported("chrome://browser"));
/// assert!(!is_supported("not a url"));
/// ```
pub fn is_supported(hostname: &str) -> bool {
    parse_origin(hostname).is_some()
}

/// Parses `hostname` into network attributes, or `None` if unsupported.
pub fn parse_origin(hostname: &str) -> Option<Origin> {
    let url = Url::parse(hostname).ok()?;
    let protocol = Protocol::from_scheme(url.scheme())?;
    let host = url.host_str().filter(|h| !h.is_empty())?;

    // url only strips default ports for the schemes it knows about
    let explicit_port = url
        .port()
        .filter(|port| *port != protocol.default_port());

    Some(Origin {
        protocol,
        host: host.to_string(),
        explicit_port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_origins_supported() {
        assert!(is_supported("http://example.com"));
        assert!(is_supported("https://login.example.com:8443"));
        assert!(is_supported("ftp://files.example.com"));
        assert!(is_supported("http://[::1]:8080"));
        assert!(is_supported("imap://mail.example.com"));
    }

    #[test]
    fn test_internal_origins_unsupported() {
        assert!(!is_supported("chrome://browser"));
        assert!(!is_supported("moz-extension://4b1c8f0e"));
        assert!(!is_supported("about:config"));
        assert!(!is_supported("file:///etc/passwd"));
        assert!(!is_supported("example.com"));
        assert!(!is_supported(""));
    }

    #[test]
    fn test_parse_origin_ports() {
        let origin = parse_origin("http://example.com").unwrap();
        assert_eq!(origin.protocol, Protocol::Http);
        assert_eq!(origin.host, "example.com");
        assert_eq!(origin.explicit_port, None);
        assert_eq!(origin.effective_port(), 80);

        let origin = parse_origin("https://example.com:443").unwrap();
        assert_eq!(origin.explicit_port, None);

        let origin = parse_origin("imap://mail.example.com:143").unwrap();
        assert_eq!(origin.explicit_port, None);

        let origin = parse_origin("https://example.com:8443").unwrap();
        assert_eq!(origin.explicit_port, Some(8443));
        assert_eq!(origin.effective_port(), 8443);
    }
}
