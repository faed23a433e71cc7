//! Authorization-enforcing reverse proxy for clustered search backends.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌────────────────────────────────────────────────┐
//!                 │                  SEARCHGATE                     │
//!  Client ────────┼─▶ net (TLS?) ─▶ http/server ─▶ access          │
//!                 │                     │        trust + allow-list │
//!                 │                     │        + authorizer       │
//!                 │                     ▼                           │
//!                 │                  cluster                        │
//!                 │        pool (primary + secondaries)             │
//!                 │        health (cooldown failover)               │
//!                 │                     │                           │
//!  Client ◀───────┼── relayed response ◀┴──▶ backend nodes ─────────┼──▶
//!                 │                                                 │
//!                 │  cross-cutting: config, observability,          │
//!                 │                 lifecycle, error taxonomy       │
//!                 └────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod access;
pub mod cluster;
pub mod config;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::ProxyConfig;
pub use error::RequestError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
