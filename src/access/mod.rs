//! Identity and access subsystem.
//!
//! # Data Flow
//! ```text
//! accepted connection (peer address + headers)
//!     → trust.rs (trusted-proxy check, effective address, forwarded creds)
//!     → anonymous.rs (allow-list: may the request skip the challenge?)
//!     → authorize.rs (collaborator verdict: Allowed/Denied/NeedsChallenge)
//!     → dispatcher acts on the verdict
//! ```
//!
//! # Design Decisions
//! - Header trust is a pure function of (peer address, trusted list)
//! - Allow-list and trusted-proxy list share one pattern grammar
//! - The authorizer is a trait object so the policy engine stays opaque

pub mod anonymous;
pub mod authorize;
pub mod pattern;
pub mod trust;

use thiserror::Error;

pub use anonymous::is_anonymous_eligible;
pub use authorize::{AccessDecision, Authorizer, Identity, StaticAuthorizer};
pub use pattern::{ClientAddr, HostPattern, PatternError};
pub use trust::{ClientContext, Credentials};

use crate::config::AccessConfig;

/// Compiled access policy: the configured pattern lists, parsed once at
/// startup.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    pub allow_from: Vec<HostPattern>,
    pub trusted_proxies: Vec<HostPattern>,
}

#[derive(Debug, Error)]
pub enum AccessPolicyError {
    #[error("allow_from: {0}")]
    AllowFrom(#[source] PatternError),
    #[error("trusted_proxies: {0}")]
    TrustedProxies(#[source] PatternError),
}

impl AccessPolicy {
    pub fn from_config(config: &AccessConfig) -> Result<Self, AccessPolicyError> {
        let allow_from = config
            .allow_from
            .iter()
            .map(|s| s.parse().map_err(AccessPolicyError::AllowFrom))
            .collect::<Result<Vec<_>, _>>()?;
        let trusted_proxies = config
            .trusted_proxies
            .iter()
            .map(|s| s.parse().map_err(AccessPolicyError::TrustedProxies))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            allow_from,
            trusted_proxies,
        })
    }
}
