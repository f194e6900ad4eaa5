//! Peer addresses with weak (parameter-insensitive) comparison.
//!
//! Message grouping and participant lookups compare addresses weakly:
//! two SIP URIs refer to the same peer if they agree on scheme, user,
//! host, and port, regardless of URI parameters (`;transport=tls` and
//! friends). Host comparison is case-insensitive per RFC 3261.

use std::fmt;

/// A peer address (SIP URI or bare `user@host` form).
///
/// Strict equality ([`PartialEq`]) compares the raw string; use
/// [`PeerAddress::weak_eq`] wherever "same person" is the question.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerAddress(String);

impl PeerAddress {
    /// Create an address from its string form.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Raw address string as given at construction.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URI with parameters stripped (everything up to the first `;`).
    fn base(&self) -> &str {
        self.0.split(';').next().unwrap_or(&self.0).trim()
    }

    /// Weak address comparison: same base URI, ignoring parameters.
    ///
    /// The user part is compared exactly, the host part (after the last
    /// `@`) case-insensitively.
    pub fn weak_eq(&self, other: &Self) -> bool {
        let a = self.base();
        let b = other.base();
        match (a.rsplit_once('@'), b.rsplit_once('@')) {
            (Some((user_a, host_a)), Some((user_b, host_b))) => {
                user_a == user_b && host_a.eq_ignore_ascii_case(host_b)
            },
            (None, None) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerAddress {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}
