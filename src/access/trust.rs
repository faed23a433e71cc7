//! Trusted-proxy header resolution.
//!
//! # Responsibilities
//! - Decide whether the immediate TCP peer may assert a client identity
//! - Derive the effective client address from `X-Forwarded-For`
//! - Record credentials forwarded by a trusted peer
//!
//! Trust is a capability check on the direct peer, never a scored
//! heuristic, and never transitive past the first hop: only the first
//! entry of a forwarded-for list is believed, the rest is discarded.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::access::pattern::{any_match, ClientAddr, HostPattern};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Basic-auth credentials carried on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Extract Basic credentials from the `Authorization` header.
    ///
    /// Anything other than a well-formed `Basic` value is treated as no
    /// credentials; the dispatcher will challenge.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let encoded = value.strip_prefix("Basic ")?;
        let decoded = BASE64.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        if username.is_empty() {
            return None;
        }
        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Per-request identity facts, immutable once computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    /// The literal socket peer.
    pub direct: ClientAddr,
    /// The client address after trust resolution. Equals `direct` unless
    /// a trusted peer asserted otherwise.
    pub effective: ClientAddr,
    /// Credentials asserted by a trusted peer. An identification hint
    /// only; authentication is still the authorizer's call.
    pub forwarded_credentials: Option<Credentials>,
}

/// Resolve the effective client identity for one request.
///
/// Headers from an untrusted peer are ignored entirely, regardless of
/// their presence, since an untrusted peer must not be able to spoof
/// identity or origin.
pub fn resolve(direct: ClientAddr, headers: &HeaderMap, trusted: &[HostPattern]) -> ClientContext {
    if !any_match(trusted, &direct) {
        if headers.contains_key(X_FORWARDED_FOR) {
            tracing::debug!(
                peer = %direct,
                "Ignoring forwarding headers from untrusted peer"
            );
        }
        return ClientContext {
            effective: direct.clone(),
            direct,
            forwarded_credentials: None,
        };
    }

    let effective = first_forwarded_for(headers).unwrap_or_else(|| direct.clone());
    let forwarded_credentials = Credentials::from_headers(headers);

    if effective != direct {
        tracing::debug!(
            peer = %direct,
            effective = %effective,
            "Accepted forwarded client address from trusted proxy"
        );
    }

    ClientContext {
        direct,
        effective,
        forwarded_credentials,
    }
}

/// First address of the `X-Forwarded-For` list, if parseable.
///
/// A malformed or empty list is treated as if the header were absent.
fn first_forwarded_for(headers: &HeaderMap) -> Option<ClientAddr> {
    let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
    let first = value.split(',').next()?;
    ClientAddr::parse_forwarded(first)
}
