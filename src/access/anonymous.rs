//! Anonymous access evaluation.
//!
//! An address on the allow-list may proceed to the authorizer without
//! first being challenged to authenticate. Eligibility only waives the
//! challenge, never the authorization check itself.

use crate::access::pattern::{any_match, ClientAddr, HostPattern};

/// Whether the effective client address may skip the authentication
/// challenge. Uses the same `host[:port]` matching rule as the
/// trusted-proxy list.
pub fn is_anonymous_eligible(effective: &ClientAddr, allow_list: &[HostPattern]) -> bool {
    any_match(allow_list, effective)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_is_never_eligible() {
        assert!(!is_anonymous_eligible(
            &ClientAddr::new("127.0.0.1", 1234),
            &[]
        ));
    }

    #[test]
    fn listed_host_is_eligible_on_any_port() {
        let allow: Vec<HostPattern> = vec!["192.0.2.7".parse().unwrap()];
        assert!(is_anonymous_eligible(&ClientAddr::new("192.0.2.7", 1), &allow));
        assert!(is_anonymous_eligible(
            &ClientAddr::new("192.0.2.7", 65000),
            &allow
        ));
        assert!(!is_anonymous_eligible(
            &ClientAddr::new("192.0.2.8", 1),
            &allow
        ));
    }
}
