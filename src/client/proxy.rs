//! Proxy address parsing.

use crate::error::{RestClientError, RestClientResult};

/// `<host>:<port>` of an HTTP proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAddress {
    pub host: String,
    pub port: u16,
}

impl ProxyAddress {
    /// Split at the last colon, so bracketed IPv6 hosts keep theirs.
    pub fn parse(address: &str) -> RestClientResult<Self> {
        let idx = match address.rfind(':') {
            Some(idx) if idx != 0 && idx != address.len() - 1 => idx,
            _ => return Err(RestClientError::InvalidProxyAddress(address.to_string())),
        };

        let port = address[idx + 1..]
            .trim()
            .parse::<u16>()
            .map_err(|_| RestClientError::InvalidProxyPort(address.to_string()))?;

        Ok(Self {
            host: address[..idx].to_string(),
            port,
        })
    }

    /// `http://<host>:<port>`
    pub fn to_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_and_port() {
        let proxy = ProxyAddress::parse("localhost:1234").unwrap();
        assert_eq!(proxy.host, "localhost");
        assert_eq!(proxy.port, 1234);
        assert_eq!(proxy.to_url(), "http://localhost:1234");
    }

    #[test]
    fn test_ipv6_splits_at_last_colon() {
        let proxy = ProxyAddress::parse("[::1]:3128").unwrap();
        assert_eq!(proxy.host, "[::1]");
        assert_eq!(proxy.port, 3128);
    }

    #[test]
    fn test_malformed_addresses() {
        for bad in ["badproxy", "host:", ":80"] {
            let err = ProxyAddress::parse(bad).unwrap_err();
            assert!(matches!(err, RestClientError::InvalidProxyAddress(_)), "{}", bad);
            assert!(err.to_string().contains(bad));
        }

        let err = ProxyAddress::parse("host:abc").unwrap_err();
        assert!(matches!(err, RestClientError::InvalidProxyPort(_)));
        assert!(err.to_string().contains("host:abc"));
    }
}
