//! Backend cluster subsystem.
//!
//! # Data Flow
//! ```text
//! config (ordered node list)
//!     → pool.rs (NodePool, fixed order: primary + secondaries)
//!     → health.rs (HealthTracker: availability + cooldown)
//!     → per request: pool.candidates() consulted by the dispatcher
//!     → forwarding outcome reported back via the tracker
//! ```
//!
//! # Design Decisions
//! - Cooldown is lazy-evaluated on read, no background probe loop
//! - Per-node atomics, no pool-wide lock
//! - A fully-down pool still yields the primary as a last resort

pub mod health;
pub mod node;
pub mod pool;

pub use health::{HealthTracker, DEFAULT_COOLDOWN};
pub use node::{Availability, Node};
pub use pool::NodePool;
