//! Backend node abstraction.
//!
//! # Responsibilities
//! - Represent a single search backend node (host, port)
//! - Track availability state (Available/Unavailable)
//! - Record when the node was marked unavailable
//!
//! Availability is mutated only through the health tracker; the node
//! exposes read access plus crate-private setters.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use url::Url;

/// Availability state (0=Available, 1=Unavailable).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available = 0,
    Unavailable = 1,
}

impl From<u8> for Availability {
    fn from(val: u8) -> Self {
        match val {
            1 => Availability::Unavailable,
            _ => Availability::Available,
        }
    }
}

/// A single backend node of the search cluster.
#[derive(Debug)]
pub struct Node {
    /// Configured host name or address.
    pub host: String,
    /// Configured port.
    pub port: u16,
    /// Pre-calculated base URL for request rewriting.
    pub base_url: Url,

    /// Current availability (0=Available, 1=Unavailable).
    state: AtomicU8,
    /// Milliseconds since the tracker's anchor instant at which the node
    /// was marked unavailable. Only meaningful while Unavailable.
    marked_unavailable_at: AtomicU64,
}

impl Node {
    /// Create a new node. Nodes start out Available.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, url::ParseError> {
        let host = host.into();
        let base_url = Url::parse(&format!("http://{}:{}", host, port))?;
        Ok(Self {
            host,
            port,
            base_url,
            state: AtomicU8::new(Availability::Available as u8),
            marked_unavailable_at: AtomicU64::new(0),
        })
    }

    /// The `host:port` authority used when rewriting request URIs.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn availability(&self) -> Availability {
        self.state.load(Ordering::Relaxed).into()
    }

    /// Mark Available and return the previous state.
    pub(crate) fn set_available(&self) -> Availability {
        self.marked_unavailable_at.store(0, Ordering::Relaxed);
        self.state
            .swap(Availability::Available as u8, Ordering::Relaxed)
            .into()
    }

    /// Mark Unavailable at the given tracker timestamp and return the
    /// previous state. Last writer wins on the timestamp.
    pub(crate) fn set_unavailable(&self, at_millis: u64) -> Availability {
        self.marked_unavailable_at.store(at_millis, Ordering::Relaxed);
        self.state
            .swap(Availability::Unavailable as u8, Ordering::Relaxed)
            .into()
    }

    pub(crate) fn marked_unavailable_at_millis(&self) -> u64 {
        self.marked_unavailable_at.load(Ordering::Relaxed)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
