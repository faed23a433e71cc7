//! Host[:port] patterns for the allow-list and the trusted-proxy list.
//!
//! # Matching rules
//! - Host comparison is exact (no wildcards, no subnet math)
//! - A pattern with a port matches only that port
//! - A pattern without a port matches any port on that host

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

/// Port value used when a forwarded address did not carry one.
///
/// Port-qualified patterns never match it; port-less patterns do.
pub const UNKNOWN_PORT: u16 = 0;

/// A client address as seen by the proxy: either the literal TCP peer
/// or an address asserted by a trusted upstream proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr {
    pub host: String,
    pub port: u16,
}

impl ClientAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Build from the accepted socket's peer address.
    pub fn from_socket(addr: SocketAddr) -> Self {
        Self {
            host: addr.ip().to_string(),
            port: addr.port(),
        }
    }

    /// Parse one `X-Forwarded-For` list entry.
    ///
    /// Accepts `host`, `host:port` and `[v6]:port`. An entry without a
    /// port gets [`UNKNOWN_PORT`]. Returns `None` for empty or malformed
    /// entries so the caller can treat the header as absent.
    pub fn parse_forwarded(entry: &str) -> Option<Self> {
        let (host, port) = split_host_port(entry.trim())?;
        Some(Self {
            host: host.to_string(),
            port: port.unwrap_or(UNKNOWN_PORT),
        })
    }
}

impl fmt::Display for ClientAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Error produced when a configured pattern cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid host pattern {pattern:?}: {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: &'static str,
}

/// A configured `host[:port]` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPattern {
    host: String,
    port: Option<u16>,
}

impl HostPattern {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Exact host match; port must match only when the pattern names one.
    pub fn matches(&self, addr: &ClientAddr) -> bool {
        if self.host != addr.host {
            return false;
        }
        match self.port {
            Some(port) => port == addr.port,
            None => true,
        }
    }
}

impl FromStr for HostPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (host, port) = split_host_port(trimmed).ok_or(PatternError {
            pattern: s.to_string(),
            reason: "expected host or host:port",
        })?;
        if host.is_empty() {
            return Err(PatternError {
                pattern: s.to_string(),
                reason: "empty host",
            });
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => f.write_str(&self.host),
        }
    }
}

/// Return whether any pattern in the list matches the address.
pub fn any_match(patterns: &[HostPattern], addr: &ClientAddr) -> bool {
    patterns.iter().any(|p| p.matches(addr))
}

/// Split `host`, `host:port`, `[v6]` or `[v6]:port` into host and optional port.
///
/// A bare IPv6 address (more than one colon, no brackets) is taken as a
/// host without a port. Returns `None` when the input is empty or the
/// port does not parse.
fn split_host_port(s: &str) -> Option<(&str, Option<u16>)> {
    if s.is_empty() {
        return None;
    }

    if let Some(rest) = s.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        if host.is_empty() {
            return None;
        }
        return match tail.strip_prefix(':') {
            Some(port) => Some((host, Some(port.parse().ok()?))),
            None if tail.is_empty() => Some((host, None)),
            None => None,
        };
    }

    match s.matches(':').count() {
        0 => Some((s, None)),
        1 => {
            let (host, port) = s.split_once(':')?;
            if host.is_empty() {
                return None;
            }
            Some((host, Some(port.parse().ok()?)))
        }
        // Bare IPv6 address.
        _ => Some((s, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_without_port_matches_any_port() {
        let pattern: HostPattern = "10.0.0.1".parse().unwrap();
        assert!(pattern.matches(&ClientAddr::new("10.0.0.1", 4312)));
        assert!(pattern.matches(&ClientAddr::new("10.0.0.1", UNKNOWN_PORT)));
        assert!(!pattern.matches(&ClientAddr::new("10.0.0.2", 4312)));
    }

    #[test]
    fn pattern_with_port_requires_exact_port() {
        let pattern: HostPattern = "10.0.0.1:9200".parse().unwrap();
        assert!(pattern.matches(&ClientAddr::new("10.0.0.1", 9200)));
        assert!(!pattern.matches(&ClientAddr::new("10.0.0.1", 9201)));
        assert!(!pattern.matches(&ClientAddr::new("10.0.0.1", UNKNOWN_PORT)));
    }

    #[test]
    fn ipv6_patterns_parse() {
        let bare: HostPattern = "::1".parse().unwrap();
        assert_eq!(bare.host(), "::1");
        assert_eq!(bare.port(), None);

        let bracketed: HostPattern = "[2001:db8::1]:9200".parse().unwrap();
        assert_eq!(bracketed.host(), "2001:db8::1");
        assert_eq!(bracketed.port(), Some(9200));
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        assert!("".parse::<HostPattern>().is_err());
        assert!(":9200".parse::<HostPattern>().is_err());
        assert!("host:notaport".parse::<HostPattern>().is_err());
        assert!("[::1".parse::<HostPattern>().is_err());
    }

    #[test]
    fn forwarded_entry_defaults_to_unknown_port() {
        let addr = ClientAddr::parse_forwarded(" 203.0.113.5 ").unwrap();
        assert_eq!(addr, ClientAddr::new("203.0.113.5", UNKNOWN_PORT));

        let with_port = ClientAddr::parse_forwarded("203.0.113.5:8080").unwrap();
        assert_eq!(with_port, ClientAddr::new("203.0.113.5", 8080));

        assert!(ClientAddr::parse_forwarded("").is_none());
        assert!(ClientAddr::parse_forwarded("host:bogus").is_none());
    }

    #[test]
    fn any_match_checks_all_entries() {
        let patterns: Vec<HostPattern> = ["10.0.0.1", "192.168.1.5:8080"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert!(any_match(&patterns, &ClientAddr::new("10.0.0.1", 1)));
        assert!(any_match(&patterns, &ClientAddr::new("192.168.1.5", 8080)));
        assert!(!any_match(&patterns, &ClientAddr::new("192.168.1.5", 8081)));
        assert!(!any_match(&[], &ClientAddr::new("10.0.0.1", 1)));
    }
}
