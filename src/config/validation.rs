//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the node list is non-empty and addresses are well-formed
//! - Check access patterns parse under the host[:port] grammar
//! - Validate value ranges (timeouts > 0, body limit > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function over the deserialized config
//! - Runs before the config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::access::pattern::HostPattern;
use crate::config::schema::ProxyConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g. `access.allow_from`).
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

/// Validate the configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(err(
            "listener.bind_address",
            format!("not a socket address: {:?}", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(err("listener.max_connections", "must be greater than zero"));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            errors.push(err("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.is_empty() {
            errors.push(err("listener.tls.key_path", "must not be empty"));
        }
    }

    if config.nodes.is_empty() {
        errors.push(err("nodes", "at least one backend node is required"));
    }
    for (i, node) in config.nodes.iter().enumerate() {
        let field = format!("nodes[{}]", i);
        if node.host.is_empty() {
            errors.push(err(field, "host must not be empty"));
        } else if Url::parse(&format!("http://{}:{}", node.host, node.port)).is_err() {
            errors.push(err(field, format!("invalid host {:?}", node.host)));
        }
    }

    check_patterns(&mut errors, "access.allow_from", &config.access.allow_from);
    check_patterns(
        &mut errors,
        "access.trusted_proxies",
        &config.access.trusted_proxies,
    );

    for (i, user) in config.access.users.iter().enumerate() {
        if user.name.is_empty() {
            errors.push(err(format!("access.users[{}].name", i), "must not be empty"));
        }
    }

    if config.cluster.cooldown_secs == 0 {
        errors.push(err("cluster.cooldown_secs", "must be greater than zero"));
    }
    if config.timeouts.forward_secs == 0 {
        errors.push(err("timeouts.forward_secs", "must be greater than zero"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(err("timeouts.request_secs", "must be greater than zero"));
    }
    if config.limits.max_body_size == 0 {
        errors.push(err("limits.max_body_size", "must be greater than zero"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_patterns(errors: &mut Vec<ValidationError>, field: &str, patterns: &[String]) {
    for raw in patterns {
        if let Err(e) = raw.parse::<HostPattern>() {
            errors.push(err(field, e.to_string()));
        }
    }
}
