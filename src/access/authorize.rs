//! Authorization collaborator seam.
//!
//! # Responsibilities
//! - Define the narrow capability interface the dispatcher consumes
//! - Provide a config-backed implementation for static user/role policy
//!
//! # Design Decisions
//! - The rule engine behind `authorize` is a separate policy domain; the
//!   core only sees the tagged verdict (Allowed/Denied/NeedsChallenge)
//! - A client that resolves to zero roles is Denied, even when anonymous
//!   eligibility waived the challenge

use std::collections::HashMap;

use async_trait::async_trait;

use crate::access::pattern::ClientAddr;
use crate::access::trust::Credentials;
use crate::config::AccessConfig;

/// The identity a request presents for authorization.
#[derive(Debug, Clone)]
pub enum Identity {
    /// No credentials; admitted via the anonymous allow-list.
    Anonymous(ClientAddr),
    /// Basic credentials from the request.
    Credentials(Credentials),
}

/// Verdict of the authorization collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Proceed, with the roles the identity resolved to.
    Allowed(Vec<String>),
    /// Refuse outright; no challenge will help.
    Denied,
    /// The client must (re)authenticate.
    NeedsChallenge,
}

/// Capability interface for the authorization policy engine.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, identity: &Identity) -> AccessDecision;
}

struct UserEntry {
    password: String,
    roles: Vec<String>,
}

/// Authorizer backed by the static users/roles section of the config.
pub struct StaticAuthorizer {
    users: HashMap<String, UserEntry>,
    anonymous_roles: Vec<String>,
}

impl StaticAuthorizer {
    pub fn from_config(config: &AccessConfig) -> Self {
        let users = config
            .users
            .iter()
            .map(|u| {
                (
                    u.name.clone(),
                    UserEntry {
                        password: u.password.clone(),
                        roles: u.roles.clone(),
                    },
                )
            })
            .collect();
        Self {
            users,
            anonymous_roles: config.anonymous_roles.clone(),
        }
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn authorize(&self, identity: &Identity) -> AccessDecision {
        match identity {
            Identity::Anonymous(addr) => {
                if self.anonymous_roles.is_empty() {
                    tracing::info!(client = %addr, "Anonymous client resolved to no roles");
                    AccessDecision::Denied
                } else {
                    AccessDecision::Allowed(self.anonymous_roles.clone())
                }
            }
            Identity::Credentials(credentials) => match self.users.get(&credentials.username) {
                Some(entry) if entry.password == credentials.password => {
                    if entry.roles.is_empty() {
                        tracing::info!(
                            user = %credentials.username,
                            "Authenticated client resolved to no roles"
                        );
                        AccessDecision::Denied
                    } else {
                        AccessDecision::Allowed(entry.roles.clone())
                    }
                }
                _ => {
                    tracing::debug!(user = %credentials.username, "Authentication failed");
                    AccessDecision::NeedsChallenge
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserConfig;

    fn authorizer(anonymous_roles: Vec<String>) -> StaticAuthorizer {
        StaticAuthorizer::from_config(&AccessConfig {
            anonymous_roles,
            users: vec![
                UserConfig {
                    name: "kibana".into(),
                    password: "secret".into(),
                    roles: vec!["kibana-user".into()],
                },
                UserConfig {
                    name: "roleless".into(),
                    password: "secret".into(),
                    roles: vec![],
                },
            ],
            ..AccessConfig::default()
        })
    }

    fn creds(user: &str, pass: &str) -> Identity {
        Identity::Credentials(Credentials {
            username: user.into(),
            password: pass.into(),
        })
    }

    #[tokio::test]
    async fn valid_credentials_yield_roles() {
        let decision = authorizer(vec![]).authorize(&creds("kibana", "secret")).await;
        assert_eq!(decision, AccessDecision::Allowed(vec!["kibana-user".into()]));
    }

    #[tokio::test]
    async fn wrong_password_or_unknown_user_is_challenged() {
        let auth = authorizer(vec![]);
        assert_eq!(
            auth.authorize(&creds("kibana", "wrong")).await,
            AccessDecision::NeedsChallenge
        );
        assert_eq!(
            auth.authorize(&creds("nobody", "secret")).await,
            AccessDecision::NeedsChallenge
        );
    }

    #[tokio::test]
    async fn zero_roles_means_denied_not_challenged() {
        let auth = authorizer(vec![]);
        assert_eq!(
            auth.authorize(&creds("roleless", "secret")).await,
            AccessDecision::Denied
        );
        assert_eq!(
            auth.authorize(&Identity::Anonymous(ClientAddr::new("127.0.0.1", 1)))
                .await,
            AccessDecision::Denied
        );
    }

    #[tokio::test]
    async fn anonymous_roles_admit_anonymous_clients() {
        let auth = authorizer(vec!["monitoring".into()]);
        assert_eq!(
            auth.authorize(&Identity::Anonymous(ClientAddr::new("127.0.0.1", 1)))
                .await,
            AccessDecision::Allowed(vec!["monitoring".into()])
        );
    }
}
